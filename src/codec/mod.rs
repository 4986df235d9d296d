use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    RowError,
    core::{convert::convert, types::{DataType, Value}},
};

pub mod source;

/// Per-column decode capability.
///
/// A codec is resolved once per query from the column's reported type and
/// then reused for that column in every row, so no type information is
/// re-derived per value.
pub trait Codec: fmt::Debug + Send + Sync {
    /// The column type this codec produces.
    fn data_type(&self) -> &DataType;

    /// Turns a raw driver value into the column's in-memory value.
    fn decode(&self, raw: Value) -> Result<Value, RowError>;
}

/// Maps a source-reported column type to its codec.
pub trait CodecRegistry {
    fn codec_for(&self, data_type: &DataType) -> Result<Arc<dyn Codec>, RowError>;

    /// Resolves a codec from a driver type name such as `list<int>`.
    fn codec_for_name(&self, type_name: &str) -> Result<Arc<dyn Codec>, RowError> {
        self.codec_for(&type_name.parse()?)
    }
}

/// Codec that normalizes raw values to a fixed column type.
///
/// Values that already have the column's shape pass through untouched;
/// anything else goes through [`convert`], so a driver that reports UUIDs
/// as text or sets as lists still yields properly typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCodec {
    data_type: DataType,
}

impl TypeCodec {
    pub fn new(data_type: DataType) -> Self {
        Self { data_type }
    }
}

impl Codec for TypeCodec {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn decode(&self, raw: Value) -> Result<Value, RowError> {
        if raw.conforms_to(&self.data_type) {
            return Ok(raw);
        }
        Ok(convert(&raw, &self.data_type)?)
    }
}

/// Registry handing out one shared [`TypeCodec`] per distinct column type.
#[derive(Debug, Default)]
pub struct DefaultCodecRegistry {
    codecs: RwLock<HashMap<DataType, Arc<dyn Codec>>>,
}

impl DefaultCodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct column types resolved so far.
    pub fn len(&self) -> usize {
        let guard = match self.codecs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("codec registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CodecRegistry for DefaultCodecRegistry {
    fn codec_for(&self, data_type: &DataType) -> Result<Arc<dyn Codec>, RowError> {
        {
            let guard = match self.codecs.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("codec registry read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(codec) = guard.get(data_type) {
                return Ok(Arc::clone(codec));
            }
        }

        let mut guard = match self.codecs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("codec registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let codec = guard
            .entry(data_type.clone())
            .or_insert_with(|| {
                tracing::debug!(%data_type, "registered codec");
                Arc::new(TypeCodec::new(data_type.clone())) as Arc<dyn Codec>
            });
        Ok(Arc::clone(codec))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::core::types::ScalarType;

    #[test]
    fn test_type_codec_passes_conforming_values() {
        let codec = TypeCodec::new(ScalarType::Int.into());
        assert_eq!(codec.decode(Value::Int(4)).unwrap(), Value::Int(4));
        assert_eq!(codec.decode(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_type_codec_normalizes_raw_values() {
        let codec = TypeCodec::new(ScalarType::Uuid.into());
        let uuid = Uuid::nil();

        let decoded = codec.decode(Value::Text(uuid.to_string())).unwrap();
        assert_eq!(decoded, Value::Uuid(uuid));

        let codec = TypeCodec::new(DataType::set(ScalarType::Int));
        let decoded = codec.decode(Value::list([2i64, 2, 1])).unwrap();
        assert_eq!(decoded, Value::set([2, 1]));
    }

    #[test]
    fn test_type_codec_rejects_incompatible_values() {
        let codec = TypeCodec::new(ScalarType::Boolean.into());
        let result = codec.decode(Value::Double(0.5));
        assert!(matches!(result, Err(RowError::TypeConversion { .. })));
    }

    #[test]
    fn test_registry_shares_codecs_per_type() {
        let registry = DefaultCodecRegistry::new();
        assert!(registry.is_empty());

        let first = registry.codec_for(&ScalarType::Text.into()).unwrap();
        let second = registry.codec_for_name("VARCHAR").unwrap();
        let other = registry.codec_for_name("list<text>").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(other.data_type(), &DataType::list(ScalarType::Text));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_unknown_type_name() {
        let registry = DefaultCodecRegistry::new();
        let result = registry.codec_for_name("geometry");
        assert!(matches!(result, Err(RowError::UnknownType(_))));
    }
}
