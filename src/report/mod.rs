pub mod console;
pub mod stats;
