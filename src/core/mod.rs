pub mod convert;
pub mod types;
