pub mod cancel;
pub mod config;
pub mod context;
pub mod controller;
pub mod hooks;
pub mod scroll;
pub mod session;
pub mod store;
