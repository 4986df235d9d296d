//! Value coercion.
//!
//! [`convert`] is the closed rule table used for runtime targets (codecs and
//! the interop row view). [`FromValue`] is the static side used by the
//! native row view: each implementation names its target and extracts a Rust
//! value, retargeting collections into whatever container the caller asks for.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    fmt,
    hash::Hash,
    ops::Deref,
};

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use super::types::{DataType, ScalarType, Value};

/// A value had no coercion path to the requested target.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value} ({source_type}) to {target_type}")]
pub struct ConversionFailure {
    /// The rendered source value.
    pub value: String,
    pub source_type: &'static str,
    pub target_type: String,
}

impl ConversionFailure {
    pub fn new(value: &Value, target: impl fmt::Display) -> Self {
        Self {
            value: value.to_string(),
            source_type: value.runtime_type(),
            target_type: target.to_string(),
        }
    }
}

/// Converts `value` to the shape described by `target`.
///
/// Null converts to null for every target; deciding whether null is
/// acceptable is left to the caller.
pub fn convert(value: &Value, target: &DataType) -> Result<Value, ConversionFailure> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match target {
        DataType::Scalar(scalar) => convert_scalar(value, *scalar),
        DataType::List(element) => convert_elements(value, element, target).map(Value::List),
        DataType::Set(element) => {
            convert_elements(value, element, target).map(|items| Value::Set(distinct(items)))
        }
        DataType::Map(key, val) => {
            let entries = entries(value).ok_or_else(|| ConversionFailure::new(value, target))?;
            entries
                .into_iter()
                .map(|(k, v)| Ok::<_, ConversionFailure>((convert(k, key)?, convert(v, val)?)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Map)
        }
    }
}

fn convert_elements(
    value: &Value,
    element: &DataType,
    target: &DataType,
) -> Result<Vec<Value>, ConversionFailure> {
    elements(value)
        .ok_or_else(|| ConversionFailure::new(value, target))?
        .iter()
        .map(|item| convert(item, element))
        .collect()
}

/// Keeps the first occurrence of each element.
fn distinct(items: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn elements(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) | Value::Set(items) => Some(items),
        _ => None,
    }
}

/// Map entries, also accepting a list of two-element lists.
fn entries(value: &Value) -> Option<Vec<(&Value, &Value)>> {
    match value {
        Value::Map(entries) => Some(entries.iter().map(|(k, v)| (k, v)).collect()),
        Value::List(items) | Value::Set(items) => items
            .iter()
            .map(|item| match elements(item) {
                Some([k, v]) => Some((k, v)),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn convert_scalar(value: &Value, target: ScalarType) -> Result<Value, ConversionFailure> {
    if value.is_null() {
        return Err(ConversionFailure::new(value, target));
    }

    let converted = match target {
        ScalarType::SmallInt => integer(value)
            .and_then(|i| i16::try_from(i).ok())
            .map(Value::SmallInt),
        ScalarType::Int => integer(value)
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int),
        ScalarType::BigInt => match value {
            Value::Timestamp(ts) => Some(Value::BigInt(ts.timestamp_millis())),
            _ => integer(value).map(Value::BigInt),
        },
        ScalarType::Float => match value {
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Text(s) => s.trim().parse::<f32>().ok().map(Value::Float),
            _ => float(value)
                .filter(|f| (*f as f32).is_finite() == f.is_finite())
                .map(|f| Value::Float(f as f32)),
        },
        ScalarType::Double => float(value).map(Value::Double),
        ScalarType::Boolean => match value {
            Value::Boolean(b) => Some(Value::Boolean(*b)),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(Value::Boolean(true)),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("false") => {
                Some(Value::Boolean(false))
            }
            _ => None,
        },
        ScalarType::Text => Some(match value {
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }),
        ScalarType::Blob => match value {
            Value::Blob(bytes) => Some(Value::Blob(bytes.clone())),
            Value::Text(s) => Some(Value::Blob(s.as_bytes().to_vec())),
            _ => None,
        },
        ScalarType::Uuid => match value {
            Value::Uuid(uuid) => Some(Value::Uuid(*uuid)),
            Value::Text(s) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
            _ => None,
        },
        ScalarType::Timestamp => timestamp(value).map(Value::Timestamp),
        ScalarType::Date => match value {
            Value::Date(date) => Some(Value::Date(*date)),
            Value::Timestamp(ts) => Some(Value::Date(ts.date_naive())),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            _ => None,
        },
        ScalarType::Decimal => decimal(value).map(Value::Decimal),
    };

    converted.ok_or_else(|| ConversionFailure::new(value, target))
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::SmallInt(i) => Some(i64::from(*i)),
        Value::Int(i) => Some(i64::from(*i)),
        Value::BigInt(i) => Some(*i),
        Value::Decimal(d) if d.is_integer() => d.to_i64(),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::SmallInt(i) => Some(f64::from(*i)),
        Value::Int(i) => Some(f64::from(*i)),
        Value::BigInt(i) => Some(*i as f64),
        Value::Float(f) => Some(f64::from(*f)),
        Value::Double(f) => Some(*f),
        Value::Decimal(d) => d.to_f64(),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Date(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
        Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
            integer(value).and_then(DateTime::<Utc>::from_timestamp_millis)
        }
        Value::Text(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                })
        }
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Decimal(d) => Some(d.clone()),
        Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => integer(value).map(BigDecimal::from),
        // f64's Display never uses exponent notation, so finite values parse back exactly.
        Value::Float(_) | Value::Double(_) => float(value)
            .filter(|f| f.is_finite())
            .and_then(|f| f.to_string().parse().ok()),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extraction of a Rust value from a stored [`Value`].
///
/// Implementations never see null at the row getters (those report
/// [`RowError::NullValue`](crate::RowError::NullValue) or return `None`
/// first), but nested nulls inside collections do reach them; use
/// `Option<T>` as the element type for collections that may hold nulls.
pub trait FromValue: Sized {
    /// Human-readable target name used in conversion failures.
    fn target_name() -> String;

    fn from_value(value: &Value) -> Result<Self, ConversionFailure>;
}

impl FromValue for Value {
    fn target_name() -> String {
        "value".to_owned()
    }

    fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn target_name() -> String {
        T::target_name()
    }

    fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! scalar_from_value {
    ($($ty:ty => $scalar:ident :: $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn target_name() -> String {
                    ScalarType::$scalar.to_string()
                }

                fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
                    match convert_scalar(value, ScalarType::$scalar)? {
                        Value::$variant(v) => Ok(v),
                        _ => Err(ConversionFailure::new(value, ScalarType::$scalar)),
                    }
                }
            }
        )*
    };
}

scalar_from_value! {
    i16 => SmallInt::SmallInt,
    i32 => Int::Int,
    i64 => BigInt::BigInt,
    f32 => Float::Float,
    f64 => Double::Double,
    bool => Boolean::Boolean,
    String => Text::Text,
    Uuid => Uuid::Uuid,
    DateTime<Utc> => Timestamp::Timestamp,
    NaiveDate => Date::Date,
    BigDecimal => Decimal::Decimal,
}

/// Raw bytes extracted from a column.
///
/// `Vec<u8>` already means "list of small integers" to [`FromValue`], so
/// byte extraction goes through this wrapper instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromValue for Bytes {
    fn target_name() -> String {
        ScalarType::Blob.to_string()
    }

    fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
        match convert_scalar(value, ScalarType::Blob)? {
            Value::Blob(bytes) => Ok(Bytes(bytes)),
            _ => Err(ConversionFailure::new(value, ScalarType::Blob)),
        }
    }
}

impl FromValue for u8 {
    fn target_name() -> String {
        "tinyint".to_owned()
    }

    fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
        integer(value)
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| ConversionFailure::new(value, Self::target_name()))
    }
}

macro_rules! sequence_from_value {
    ($($container:ident <T $(: $bound:ident $(+ $more:ident)*)?> => $shape:literal),* $(,)?) => {
        $(
            impl<T: FromValue $(+ $bound $(+ $more)*)?> FromValue for $container<T> {
                fn target_name() -> String {
                    format!("{}<{}>", $shape, T::target_name())
                }

                fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
                    elements(value)
                        .ok_or_else(|| ConversionFailure::new(value, Self::target_name()))?
                        .iter()
                        .map(T::from_value)
                        .collect()
                }
            }
        )*
    };
}

sequence_from_value! {
    Vec<T> => "list",
    VecDeque<T> => "list",
    HashSet<T: Eq + Hash> => "set",
    BTreeSet<T: Ord> => "set",
}

macro_rules! mapping_from_value {
    ($($container:ident <K $(: $bound:ident $(+ $more:ident)*)?>),* $(,)?) => {
        $(
            impl<K: FromValue $(+ $bound $(+ $more)*)?, V: FromValue> FromValue for $container<K, V> {
                fn target_name() -> String {
                    format!("map<{}, {}>", K::target_name(), V::target_name())
                }

                fn from_value(value: &Value) -> Result<Self, ConversionFailure> {
                    entries(value)
                        .ok_or_else(|| ConversionFailure::new(value, Self::target_name()))?
                        .into_iter()
                        .map(|(k, v)| Ok::<_, ConversionFailure>((K::from_value(k)?, V::from_value(v)?)))
                        .collect()
                }
            }
        )*
    };
}

mapping_from_value! {
    HashMap<K: Eq + Hash>,
    BTreeMap<K: Ord>,
    IndexMap<K: Eq + Hash>,
}
