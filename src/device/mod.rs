pub mod accessor;
pub mod error;
pub mod session;
