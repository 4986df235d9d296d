use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    hash::Hash,
    sync::Arc,
};

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use super::{ColumnKey, RowData, interop::InteropRow};
use crate::{
    RowError,
    core::{
        convert::{Bytes, FromValue},
        types::Value,
    },
    db::metadata::RowMetadata,
};

/// A decoded row with statically typed getters.
///
/// Every getter takes a [`ColumnKey`]: a `usize` position or a column
/// name. Name lookups go through the shared metadata, so the name map is
/// built once per query no matter how many rows read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    data: RowData,
}

impl Row {
    pub fn new(metadata: Arc<RowMetadata>, values: Vec<Value>) -> Result<Self, RowError> {
        RowData::new(metadata, values).map(Self::from)
    }

    pub fn data(&self) -> &RowData {
        &self.data
    }

    pub fn metadata(&self) -> &Arc<RowMetadata> {
        self.data.metadata()
    }

    pub fn values(&self) -> &[Value] {
        self.data.values()
    }

    pub fn column_count(&self) -> usize {
        self.data.column_count()
    }

    pub fn column_names(&self) -> &[String] {
        self.data.column_names()
    }

    /// Whether `name` resolves to a column of this row.
    pub fn contains(&self, name: &str) -> bool {
        self.metadata().contains(name)
    }

    pub fn name_of(&self, index: usize) -> Result<&str, RowError> {
        self.data.name_of(index)
    }

    pub fn get_value(&self, key: impl ColumnKey) -> Result<&Value, RowError> {
        self.data.value(key)
    }

    pub fn is_null_at(&self, key: impl ColumnKey) -> Result<bool, RowError> {
        self.data.is_null_at(key)
    }

    /// Reads the column as `T`.
    ///
    /// Fails with [`RowError::NullValue`] when the column holds null; use
    /// [`Row::get_opt`] for nullable columns.
    pub fn get<T: FromValue>(&self, key: impl ColumnKey) -> Result<T, RowError> {
        self.data.get(key)
    }

    pub fn get_opt<T: FromValue>(&self, key: impl ColumnKey) -> Result<Option<T>, RowError> {
        self.data.get_opt(key)
    }

    pub fn get_i32(&self, key: impl ColumnKey) -> Result<i32, RowError> {
        self.get(key)
    }

    pub fn get_i64(&self, key: impl ColumnKey) -> Result<i64, RowError> {
        self.get(key)
    }

    pub fn get_f64(&self, key: impl ColumnKey) -> Result<f64, RowError> {
        self.get(key)
    }

    pub fn get_bool(&self, key: impl ColumnKey) -> Result<bool, RowError> {
        self.get(key)
    }

    pub fn get_string(&self, key: impl ColumnKey) -> Result<String, RowError> {
        self.get(key)
    }

    pub fn get_bytes(&self, key: impl ColumnKey) -> Result<Vec<u8>, RowError> {
        self.get::<Bytes>(key).map(Bytes::into_inner)
    }

    pub fn get_uuid(&self, key: impl ColumnKey) -> Result<Uuid, RowError> {
        self.get(key)
    }

    pub fn get_date(&self, key: impl ColumnKey) -> Result<NaiveDate, RowError> {
        self.get(key)
    }

    pub fn get_timestamp(&self, key: impl ColumnKey) -> Result<DateTime<Utc>, RowError> {
        self.get(key)
    }

    pub fn get_decimal(&self, key: impl ColumnKey) -> Result<BigDecimal, RowError> {
        self.get(key)
    }

    pub fn get_list<T: FromValue>(&self, key: impl ColumnKey) -> Result<Vec<T>, RowError> {
        self.get(key)
    }

    pub fn get_set<T: FromValue + Ord>(&self, key: impl ColumnKey) -> Result<BTreeSet<T>, RowError> {
        self.get(key)
    }

    pub fn get_map<K, V>(&self, key: impl ColumnKey) -> Result<HashMap<K, V>, RowError>
    where
        K: FromValue + Eq + Hash,
        V: FromValue,
    {
        self.get(key)
    }

    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.data.to_map()
    }

    pub fn into_data(self) -> RowData {
        self.data
    }

    pub fn into_interop(self) -> InteropRow {
        InteropRow::from(self.data)
    }
}

impl From<RowData> for Row {
    fn from(data: RowData) -> Self {
        Self { data }
    }
}

impl From<InteropRow> for Row {
    fn from(row: InteropRow) -> Self {
        Self::from(row.into_data())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet, VecDeque};

    use super::*;

    fn user_row() -> Row {
        let metadata = Arc::new(RowMetadata::new([
            "id", "name", "score", "active", "tags", "attrs", "avatar", "email",
        ]));
        Row::new(
            metadata,
            vec![
                Value::Int(7),
                Value::from("Alice"),
                Value::Double(9.5),
                Value::Boolean(true),
                Value::list(["b", "a", "b"]),
                Value::map([("k1", 1i64), ("k2", 2)]),
                Value::Blob(vec![0xde, 0xad]),
                Value::Null,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_typed_getters() {
        let row = user_row();

        assert_eq!(row.get_i32("id").unwrap(), 7);
        assert_eq!(row.get_i64(0).unwrap(), 7);
        assert_eq!(row.get_string("name").unwrap(), "Alice");
        assert_eq!(row.get_f64("score").unwrap(), 9.5);
        assert!(row.get_bool("active").unwrap());
        assert_eq!(row.get_bytes("avatar").unwrap(), vec![0xde, 0xad]);
        assert_eq!(row.get_string("id").unwrap(), "7");
    }

    #[test]
    fn test_collection_getters() {
        let row = user_row();

        assert_eq!(row.get_list::<String>("tags").unwrap(), vec!["b", "a", "b"]);
        assert_eq!(
            row.get_set::<String>("tags").unwrap(),
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );

        let attrs = row.get_map::<String, i64>("attrs").unwrap();
        assert_eq!(attrs.get("k2"), Some(&2));
    }

    #[test]
    fn test_container_retargeting_is_consistent() {
        let row = user_row();

        let as_vec: Vec<String> = row.get("tags").unwrap();
        let as_deque: VecDeque<String> = row.get("tags").unwrap();
        assert_eq!(as_vec, as_deque.into_iter().collect::<Vec<_>>());

        let as_hash: HashSet<String> = row.get("tags").unwrap();
        let as_btree: BTreeSet<String> = row.get("tags").unwrap();
        assert_eq!(as_hash.into_iter().collect::<BTreeSet<_>>(), as_btree);

        let as_index: IndexMap<String, i64> = row.get("attrs").unwrap();
        let as_sorted: BTreeMap<String, i64> = row.get("attrs").unwrap();
        assert_eq!(as_index.into_iter().collect::<BTreeMap<_, _>>(), as_sorted);
    }

    #[test]
    fn test_null_column() {
        let row = user_row();

        assert!(row.is_null_at("email").unwrap());
        assert_eq!(row.get_opt::<String>("email").unwrap(), None);
        assert_eq!(row.get_opt::<String>("name").unwrap(), Some("Alice".to_string()));
        assert!(matches!(
            row.get_string("email"),
            Err(RowError::NullValue { .. })
        ));
    }

    #[test]
    fn test_unknown_column() {
        let row = user_row();

        assert!(!row.contains("phone"));
        assert!(row.contains("email"));
        match row.get_i32("phone") {
            Err(RowError::ColumnNotFound { name, available }) => {
                assert_eq!(name, "phone");
                assert_eq!(available.len(), 8);
            }
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_view_conversions_keep_the_core() {
        let row = user_row();
        let metadata = Arc::clone(row.metadata());

        let interop = row.clone().into_interop();
        assert!(Arc::ptr_eq(interop.metadata(), &metadata));

        let back = Row::from(interop);
        assert_eq!(back, row);
    }

    #[test]
    fn test_display() {
        let metadata = Arc::new(RowMetadata::new(["a", "b"]));
        let row = Row::new(metadata, vec![Value::Int(1), Value::from("x")]).unwrap();
        assert_eq!(row.to_string(), "Row{a: 1, b: x}");
    }
}
