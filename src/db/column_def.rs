use crate::core::types::DataType;

/// One entry of a result set's column listing.
///
/// Carries the column name exactly as the data source reported it, which
/// may differ from the name the caller asked for (aggregates, casts and
/// other function calls get relabeled by the store).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// The column name reported by the result set.
    pub name: String,

    /// The column type reported by the result set.
    pub data_type: DataType,
}

impl ColumnDef {
    /// Creates a new column definition.
    pub fn new(name: &str, data_type: impl Into<DataType>) -> Self {
        Self {
            name: name.to_owned(),
            data_type: data_type.into(),
        }
    }
}
