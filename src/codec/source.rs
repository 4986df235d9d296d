use super::Codec;
use crate::{RowError, core::types::Value};

/// Positional access to one driver-produced row.
///
/// Rows are always read by position. Implementations that know their
/// column labels can report them through [`RawSource::column_name`] so the
/// layout can be checked against the query's metadata.
pub trait RawSource {
    fn column_count(&self) -> usize;

    /// Extracts the raw value at `index`.
    fn decode(&self, index: usize) -> Result<Value, RowError>;

    /// Extracts the value at `index` through a pre-resolved column codec.
    fn decode_with(&self, index: usize, codec: &dyn Codec) -> Result<Value, RowError> {
        codec.decode(self.decode(index)?)
    }

    /// Label of the column at `index`, if the source knows it.
    fn column_name(&self, _index: usize) -> Option<&str> {
        None
    }
}

/// A raw source backed by an in-memory vector of values.
#[derive(Debug, Clone, PartialEq)]
pub struct VecSource {
    values: Vec<Value>,
    names: Option<Vec<String>>,
}

impl VecSource {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            names: None,
        }
    }

    /// Creates a source that also reports its column labels.
    pub fn with_names<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        values: Vec<Value>,
    ) -> Result<Self, RowError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != values.len() {
            return Err(RowError::LengthMismatch {
                what: "source column names",
                expected: values.len(),
                actual: names.len(),
            });
        }

        Ok(Self {
            values,
            names: Some(names),
        })
    }
}

impl RawSource for VecSource {
    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn decode(&self, index: usize) -> Result<Value, RowError> {
        self.values
            .get(index)
            .cloned()
            .ok_or(RowError::IndexOutOfRange {
                index,
                column_count: self.values.len(),
            })
    }

    fn column_name(&self, index: usize) -> Option<&str> {
        self.names.as_ref()?.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::TypeCodec, core::types::ScalarType};

    #[test]
    fn test_vec_source_decode() {
        let source = VecSource::new(vec![Value::Int(1), Value::from("x")]);

        assert_eq!(source.column_count(), 2);
        assert_eq!(source.decode(1).unwrap(), Value::from("x"));
        assert_eq!(source.column_name(0), None);
    }

    #[test]
    fn test_vec_source_out_of_range() {
        let source = VecSource::new(vec![Value::Int(1)]);
        let result = source.decode(3);
        assert_eq!(
            result,
            Err(RowError::IndexOutOfRange {
                index: 3,
                column_count: 1
            })
        );
    }

    #[test]
    fn test_vec_source_decode_with_codec() {
        let source = VecSource::new(vec![Value::BigInt(7)]);
        let codec = TypeCodec::new(ScalarType::Int.into());
        assert_eq!(source.decode_with(0, &codec).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_vec_source_names() {
        let source = VecSource::with_names(["id", "name"], vec![Value::Int(1), Value::from("a")]).unwrap();
        assert_eq!(source.column_name(1), Some("name"));
        assert_eq!(source.column_name(2), None);

        let result = VecSource::with_names(["id"], vec![]);
        assert!(matches!(result, Err(RowError::LengthMismatch { .. })));
    }
}
