use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use super::metadata::RowMetadata;
use crate::{
    RowError,
    core::{
        convert::{FromValue, convert},
        types::{DataType, Value},
    },
};

pub mod interop;
pub mod native;

/// Something that picks out one column of a row: a position or a name.
///
/// Names resolve through [`RowMetadata::index_of_or_fail`]; positions are
/// bounds-checked against the row.
pub trait ColumnKey: fmt::Display {
    fn resolve(&self, metadata: &RowMetadata) -> Result<usize, RowError>;
}

impl ColumnKey for usize {
    fn resolve(&self, metadata: &RowMetadata) -> Result<usize, RowError> {
        if *self < metadata.column_count() {
            Ok(*self)
        } else {
            Err(RowError::IndexOutOfRange {
                index: *self,
                column_count: metadata.column_count(),
            })
        }
    }
}

impl ColumnKey for str {
    fn resolve(&self, metadata: &RowMetadata) -> Result<usize, RowError> {
        metadata.index_of_or_fail(self)
    }
}

impl ColumnKey for String {
    fn resolve(&self, metadata: &RowMetadata) -> Result<usize, RowError> {
        metadata.index_of_or_fail(self)
    }
}

impl<K: ColumnKey + ?Sized> ColumnKey for &K {
    fn resolve(&self, metadata: &RowMetadata) -> Result<usize, RowError> {
        (**self).resolve(metadata)
    }
}

/// The immutable record both row views wrap.
///
/// Holds a shared reference to the query's metadata and exclusively owns
/// the row's values, position-aligned with the declared names.
#[derive(Debug, Clone)]
pub struct RowData {
    metadata: Arc<RowMetadata>,
    values: Vec<Value>,
}

impl RowData {
    /// Pairs `values` with `metadata`, checking they have the same width.
    pub fn new(metadata: Arc<RowMetadata>, values: Vec<Value>) -> Result<Self, RowError> {
        if values.len() != metadata.column_count() {
            return Err(RowError::LengthMismatch {
                what: "row values",
                expected: metadata.column_count(),
                actual: values.len(),
            });
        }
        Ok(Self { metadata, values })
    }

    /// Pairs values with metadata the caller built from the same source.
    pub(crate) fn from_parts(metadata: Arc<RowMetadata>, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), metadata.column_count());
        Self { metadata, values }
    }

    pub fn metadata(&self) -> &Arc<RowMetadata> {
        &self.metadata
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn column_count(&self) -> usize {
        self.metadata.column_count()
    }

    pub fn column_names(&self) -> &[String] {
        self.metadata.declared_names()
    }

    /// The stored value, whatever it is.
    pub fn value(&self, key: impl ColumnKey) -> Result<&Value, RowError> {
        let index = key.resolve(&self.metadata)?;
        self.values.get(index).ok_or(RowError::IndexOutOfRange {
            index,
            column_count: self.values.len(),
        })
    }

    pub fn is_null_at(&self, key: impl ColumnKey) -> Result<bool, RowError> {
        self.value(key).map(Value::is_null)
    }

    /// Extracts a Rust value, failing on null.
    pub fn get<T: FromValue>(&self, key: impl ColumnKey) -> Result<T, RowError> {
        let value = self.non_null(&key)?;
        Ok(T::from_value(value)?)
    }

    /// Extracts a Rust value, mapping null to `None`.
    pub fn get_opt<T: FromValue>(&self, key: impl ColumnKey) -> Result<Option<T>, RowError> {
        match self.value(key)? {
            Value::Null => Ok(None),
            value => Ok(Some(T::from_value(value)?)),
        }
    }

    /// Converts the stored value to a runtime-described type, failing on null.
    pub fn get_as(&self, key: impl ColumnKey, target: &DataType) -> Result<Value, RowError> {
        let value = self.non_null(&key)?;
        Ok(convert(value, target)?)
    }

    /// Converts the stored value to a runtime-described type, mapping null to `None`.
    pub fn get_opt_as(
        &self,
        key: impl ColumnKey,
        target: &DataType,
    ) -> Result<Option<Value>, RowError> {
        match self.value(key)? {
            Value::Null => Ok(None),
            value => Ok(Some(convert(value, target)?)),
        }
    }

    fn non_null(&self, key: &impl ColumnKey) -> Result<&Value, RowError> {
        match self.value(key)? {
            Value::Null => Err(RowError::NullValue {
                column: key.to_string(),
            }),
            value => Ok(value),
        }
    }

    /// Name of the column at `index`, as declared.
    pub fn name_of(&self, index: usize) -> Result<&str, RowError> {
        self.metadata
            .declared_names()
            .get(index)
            .map(String::as_str)
            .ok_or(RowError::IndexOutOfRange {
                index,
                column_count: self.column_count(),
            })
    }

    /// Declared name to value, in column order.
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.column_names()
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl PartialEq for RowData {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.metadata, &other.metadata) || self.metadata == other.metadata)
            && self.values == other.values
    }
}

impl fmt::Display for RowData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row{{")?;
        for (idx, (name, value)) in self.column_names().iter().zip(&self.values).enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}
