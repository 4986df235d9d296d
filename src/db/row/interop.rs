use std::{fmt, slice, sync::Arc, vec};

use super::{ColumnKey, RowData, native::Row};
use crate::{
    RowError,
    core::types::{DataType, Value},
    db::metadata::RowMetadata,
};

/// A decoded row for callers that describe target types at runtime.
///
/// Same data as [`Row`], but conversions take a [`DataType`] instead of a
/// Rust type parameter, and the row can be iterated value by value.
#[derive(Debug, Clone, PartialEq)]
pub struct InteropRow {
    data: RowData,
}

impl InteropRow {
    pub fn new(metadata: Arc<RowMetadata>, values: Vec<Value>) -> Result<Self, RowError> {
        RowData::new(metadata, values).map(Self::from)
    }

    pub fn metadata(&self) -> &Arc<RowMetadata> {
        self.data.metadata()
    }

    pub fn size(&self) -> usize {
        self.data.column_count()
    }

    pub fn column_names(&self) -> &[String] {
        self.data.column_names()
    }

    pub fn get_object(&self, key: impl ColumnKey) -> Result<&Value, RowError> {
        self.data.value(key)
    }

    /// Converts the column to `target`, failing on null.
    pub fn get_as(&self, key: impl ColumnKey, target: &DataType) -> Result<Value, RowError> {
        self.data.get_as(key, target)
    }

    pub fn get_opt_as(
        &self,
        key: impl ColumnKey,
        target: &DataType,
    ) -> Result<Option<Value>, RowError> {
        self.data.get_opt_as(key, target)
    }

    /// Values in column order. Each call starts from the first column.
    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.data.values().iter()
    }

    pub fn to_list(&self) -> Vec<Value> {
        self.data.values().to_vec()
    }

    pub fn into_data(self) -> RowData {
        self.data
    }

    pub fn into_native(self) -> Row {
        Row::from(self.data)
    }
}

impl From<RowData> for InteropRow {
    fn from(data: RowData) -> Self {
        Self { data }
    }
}

impl From<Row> for InteropRow {
    fn from(row: Row) -> Self {
        Self::from(row.into_data())
    }
}

impl<'a> IntoIterator for &'a InteropRow {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for InteropRow {
    type Item = Value;
    type IntoIter = vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_values().into_iter()
    }
}

impl fmt::Display for InteropRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::core::types::ScalarType;

    fn sample() -> InteropRow {
        let metadata = Arc::new(
            RowMetadata::new(["id", "ids", "note"])
                .with_result_names(["id", "ids", "note"])
                .unwrap(),
        );
        InteropRow::new(
            metadata,
            vec![
                Value::Text(Uuid::nil().to_string()),
                Value::list([3i64, 1, 3]),
                Value::Null,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_get_object() {
        let row = sample();
        assert_eq!(row.get_object(2).unwrap(), &Value::Null);
        assert_eq!(row.get_object("ids").unwrap(), &Value::list([3i64, 1, 3]));
    }

    #[test]
    fn test_get_as_descriptor() {
        let row = sample();

        assert_eq!(
            row.get_as("id", &ScalarType::Uuid.into()).unwrap(),
            Value::Uuid(Uuid::nil())
        );
        assert_eq!(
            row.get_as("ids", &DataType::set(ScalarType::Int)).unwrap(),
            Value::set([3, 1])
        );
        assert_eq!(
            row.get_as("ids", &DataType::list(ScalarType::Text)).unwrap(),
            Value::list(["3", "1", "3"])
        );
    }

    #[test]
    fn test_get_opt_as_null() {
        let row = sample();

        assert_eq!(row.get_opt_as("note", &ScalarType::Text.into()).unwrap(), None);
        assert!(matches!(
            row.get_as("note", &ScalarType::Text.into()),
            Err(RowError::NullValue { .. })
        ));
    }

    #[test]
    fn test_iteration_restarts() {
        let row = sample();

        let first: Vec<&Value> = row.iter().collect();
        let second: Vec<&Value> = (&row).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), row.size());

        assert_eq!((&row).into_iter().count(), 3);

        let owned: Vec<Value> = row.clone().into_iter().collect();
        assert_eq!(owned, row.to_list());
    }

    #[test]
    fn test_into_native() {
        let row = sample();
        let native = row.clone().into_native();

        assert_eq!(native.column_names(), row.column_names());
        assert_eq!(native.get::<Uuid>("id").unwrap(), Uuid::nil());
        assert_eq!(InteropRow::from(native), row);
    }
}
