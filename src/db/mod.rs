pub mod column_def;
pub mod factory;
pub mod metadata;
pub mod reader;
pub mod row;
