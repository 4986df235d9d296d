//! Row-level access over positional query results.
//!
//! A query builds one [`RowMetadata`] describing its columns. Every [`Row`]
//! the query produces holds a shared reference to it, so name resolution
//! and per-column codecs are worked out once per query rather than once per
//! row. Rows come in two views over the same data: [`Row`] with statically
//! typed getters, and [`InteropRow`] for callers that describe target types
//! at runtime and iterate values directly.
//!
//! ```
//! use std::sync::Arc;
//!
//! use scuttle_rows::{Row, RowFactory, RowMetadata, Value, VecSource};
//!
//! let metadata = Arc::new(RowMetadata::new(["id", "name"]));
//! let source = VecSource::new(vec![Value::Int(1), Value::from("Alice")]);
//!
//! let row = Row::from_source(&source, &metadata).unwrap();
//! assert_eq!(row.get::<String>("name").unwrap(), "Alice");
//! assert_eq!(row.get_opt::<i64>(0).unwrap(), Some(1));
//! ```

pub(crate) mod codec;
pub(crate) mod common;
pub(crate) mod core;
pub(crate) mod db;

pub use codec::{
    Codec, CodecRegistry, DefaultCodecRegistry, TypeCodec,
    source::{RawSource, VecSource},
};
pub use common::{
    config::{LayoutCheck, ReaderConfig},
    error::RowError,
};
pub use crate::core::{
    convert::{Bytes, ConversionFailure, FromValue, convert},
    types::{DataType, ScalarType, Value},
};
pub use db::{
    column_def::ColumnDef,
    factory::RowFactory,
    metadata::RowMetadata,
    reader::RowReader,
    row::{ColumnKey, RowData, interop::InteropRow, native::Row},
};
