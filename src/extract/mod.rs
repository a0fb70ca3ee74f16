pub mod field_spec;
pub mod strategy;
