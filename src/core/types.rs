use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::RowError;

/// Non-collection column types reported by the store.
///
/// Parsed case-insensitively from the type names a driver reports, so
/// `"VARCHAR"` and `"text"` both resolve to [`ScalarType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScalarType {
    /// 16-bit signed integer.
    SmallInt,

    /// 32-bit signed integer.
    Int,

    /// 64-bit signed integer.
    #[strum(to_string = "bigint", serialize = "counter")]
    BigInt,

    /// 32-bit floating point number.
    Float,

    /// 64-bit floating point number.
    Double,

    Boolean,

    /// UTF-8 text.
    #[strum(to_string = "text", serialize = "varchar", serialize = "ascii")]
    Text,

    /// Opaque bytes.
    Blob,

    #[strum(to_string = "uuid", serialize = "timeuuid")]
    Uuid,

    /// Instant with millisecond precision, always UTC.
    Timestamp,

    /// Calendar date without a time zone.
    Date,

    /// Arbitrary precision decimal.
    Decimal,
}

/// Column type descriptor, including collection types.
///
/// Also serves as the target descriptor for runtime conversions, see
/// [`convert`](crate::convert).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Scalar(ScalarType),
    List(Box<DataType>),
    Set(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
}

impl DataType {
    pub fn list(element: impl Into<DataType>) -> Self {
        DataType::List(Box::new(element.into()))
    }

    pub fn set(element: impl Into<DataType>) -> Self {
        DataType::Set(Box::new(element.into()))
    }

    pub fn map(key: impl Into<DataType>, value: impl Into<DataType>) -> Self {
        DataType::Map(Box::new(key.into()), Box::new(value.into()))
    }
}

impl From<ScalarType> for DataType {
    fn from(value: ScalarType) -> Self {
        DataType::Scalar(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(scalar) => write!(f, "{scalar}"),
            DataType::List(element) => write!(f, "list<{element}>"),
            DataType::Set(element) => write!(f, "set<{element}>"),
            DataType::Map(key, value) => write!(f, "map<{key}, {value}>"),
        }
    }
}

impl FromStr for DataType {
    type Err = RowError;

    /// Parses driver type names such as `int`, `list<text>` or
    /// `map<text, set<uuid>>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unknown = || RowError::UnknownType(s.to_owned());

        let Some(open) = s.find('<') else {
            return ScalarType::from_str(s)
                .map(DataType::Scalar)
                .map_err(|_| unknown());
        };

        let inner = s[open + 1..].strip_suffix('>').ok_or_else(unknown)?;
        let outer = s[..open].trim();

        if outer.eq_ignore_ascii_case("list") {
            Ok(DataType::list(inner.parse::<DataType>()?))
        } else if outer.eq_ignore_ascii_case("set") {
            Ok(DataType::set(inner.parse::<DataType>()?))
        } else if outer.eq_ignore_ascii_case("map") {
            let (key, value) = split_type_arguments(inner).ok_or_else(unknown)?;
            Ok(DataType::map(
                key.parse::<DataType>()?,
                value.parse::<DataType>()?,
            ))
        } else {
            Err(unknown())
        }
    }
}

/// Splits `k, v` at the comma that is not nested inside angle brackets.
fn split_type_arguments(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&s[..idx], &s[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// A decoded column value.
///
/// Collections keep their elements in source order. A `Set` is not
/// deduplicated by construction; conversions that target a set are.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Text(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Decimal(BigDecimal),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's runtime shape, for diagnostics.
    pub fn runtime_type(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Decimal(_) => "decimal",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    /// Checks whether this value already has the exact shape of `data_type`.
    ///
    /// Null conforms to every type.
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::List(items), DataType::List(element))
            | (Value::Set(items), DataType::Set(element)) => {
                items.iter().all(|item| item.conforms_to(element))
            }
            (Value::Map(entries), DataType::Map(key, value)) => entries
                .iter()
                .all(|(k, v)| k.conforms_to(key) && v.conforms_to(value)),
            (value, DataType::Scalar(scalar)) => value.scalar_type() == Some(*scalar),
            _ => false,
        }
    }

    fn scalar_type(&self) -> Option<ScalarType> {
        let scalar = match self {
            Value::SmallInt(_) => ScalarType::SmallInt,
            Value::Int(_) => ScalarType::Int,
            Value::BigInt(_) => ScalarType::BigInt,
            Value::Float(_) => ScalarType::Float,
            Value::Double(_) => ScalarType::Double,
            Value::Boolean(_) => ScalarType::Boolean,
            Value::Text(_) => ScalarType::Text,
            Value::Blob(_) => ScalarType::Blob,
            Value::Uuid(_) => ScalarType::Uuid,
            Value::Timestamp(_) => ScalarType::Timestamp,
            Value::Date(_) => ScalarType::Date,
            Value::Decimal(_) => ScalarType::Decimal,
            Value::Null | Value::List(_) | Value::Set(_) | Value::Map(_) => return None,
        };
        Some(scalar)
    }

    /// Builds a loosely typed value from JSON.
    ///
    /// Integers become `BigInt`, other numbers `Double`, objects become maps
    /// with text keys. Column codecs narrow these to the declared types.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(i) => Value::BigInt(i),
                None => number.as_f64().map_or(Value::Null, Value::Double),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (Value::Text(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::SmallInt(i) => write!(f, "{i}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::BigInt(i) => write!(f, "{i}"),
            Value::Float(fl) => write!(f, "{fl}"),
            Value::Double(fl) => write!(f, "{fl}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(bytes) => {
                write!(f, "0x")?;
                bytes.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
            Value::Uuid(uuid) => write!(f, "{uuid}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Date(date) => write!(f, "{date}"),
            Value::Decimal(decimal) => write!(f, "{decimal}"),
            Value::List(items) => write_items(f, "[", items, "]"),
            Value::Set(items) => write_items(f, "{", items, "}"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    bool => Boolean,
    String => Text,
    Vec<u8> => Blob,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    BigDecimal => Decimal,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_types() {
        assert_eq!("int".parse::<DataType>().unwrap(), ScalarType::Int.into());
        assert_eq!("VARCHAR".parse::<DataType>().unwrap(), ScalarType::Text.into());
        assert_eq!("timeuuid".parse::<DataType>().unwrap(), ScalarType::Uuid.into());
        assert_eq!("counter".parse::<DataType>().unwrap(), ScalarType::BigInt.into());
    }

    #[test]
    fn test_parse_collection_types() {
        assert_eq!(
            "list<int>".parse::<DataType>().unwrap(),
            DataType::list(ScalarType::Int)
        );
        assert_eq!(
            "map<text, set<uuid>>".parse::<DataType>().unwrap(),
            DataType::map(ScalarType::Text, DataType::set(ScalarType::Uuid))
        );
        assert_eq!(
            "map<map<int, int>, text>".parse::<DataType>().unwrap(),
            DataType::map(
                DataType::map(ScalarType::Int, ScalarType::Int),
                ScalarType::Text
            )
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        assert!(matches!(
            "tinyblob".parse::<DataType>(),
            Err(RowError::UnknownType(_))
        ));
        assert!("list<int".parse::<DataType>().is_err());
        assert!("map<int>".parse::<DataType>().is_err());
        assert!("tuple<int, int>".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_display_round_trips() {
        let data_type = DataType::map(ScalarType::Text, DataType::list(ScalarType::BigInt));
        assert_eq!(data_type.to_string(), "map<text, list<bigint>>");
        assert_eq!(data_type.to_string().parse::<DataType>().unwrap(), data_type);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![0xca, 0xfe]).to_string(), "0xcafe");
        assert_eq!(Value::list([1, 2, 3]).to_string(), "[1, 2, 3]");
        assert_eq!(Value::set(["a", "b"]).to_string(), "{a, b}");
        assert_eq!(Value::map([("k", 1)]).to_string(), "{k: 1}");
    }

    #[test]
    fn test_value_conforms_to() {
        assert!(Value::Int(1).conforms_to(&ScalarType::Int.into()));
        assert!(!Value::BigInt(1).conforms_to(&ScalarType::Int.into()));
        assert!(Value::Null.conforms_to(&DataType::list(ScalarType::Text)));
        assert!(Value::list([1, 2]).conforms_to(&DataType::list(ScalarType::Int)));
        assert!(!Value::list([1, 2]).conforms_to(&DataType::set(ScalarType::Int)));
        assert!(!Value::list([1i64]).conforms_to(&DataType::list(ScalarType::Int)));
    }

    #[test]
    fn test_value_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"id": 7, "score": 1.5, "tags": ["a"], "none": null}"#).unwrap();

        assert_eq!(
            Value::from_json(&json),
            Value::Map(vec![
                (Value::from("id"), Value::BigInt(7)),
                (Value::from("none"), Value::Null),
                (Value::from("score"), Value::Double(1.5)),
                (Value::from("tags"), Value::list(["a"])),
            ])
        );
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }
}
