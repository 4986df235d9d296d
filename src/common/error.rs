use miette::Diagnostic;
use thiserror::Error;

use crate::core::convert::ConversionFailure;

/// Errors raised while building or reading rows.
///
/// Every variant describes a caller error: nothing here is retried or
/// recovered internally, and no partial row is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum RowError {
    /// A name-based lookup used a name the result set does not carry.
    #[error("Column not found: {name} (available: {})", .available.join(", "))]
    #[diagnostic(
        code(scuttle_rows::column_not_found),
        help("names resolve against the column names reported by the result set")
    )]
    ColumnNotFound { name: String, available: Vec<String> },

    /// An index-based lookup went past the end of the row.
    #[error("Index {index} out of range for a row of {column_count} column(s)")]
    #[diagnostic(code(scuttle_rows::index_out_of_range))]
    IndexOutOfRange { index: usize, column_count: usize },

    /// The stored value has no coercion path to the requested type.
    #[error("Cannot convert {value} ({source_type}) to {target_type}")]
    #[diagnostic(code(scuttle_rows::type_conversion))]
    TypeConversion {
        value: String,
        source_type: String,
        target_type: String,
    },

    /// A non-optional getter hit a null column.
    #[error("Column {column} is null")]
    #[diagnostic(
        code(scuttle_rows::null_value),
        help("use an optional getter for columns that may be null")
    )]
    NullValue { column: String },

    /// Parallel sequences handed to a constructor disagree in length.
    #[error("{what} has {actual} entries, expected {expected}")]
    #[diagnostic(code(scuttle_rows::length_mismatch))]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The raw source is narrower than the row the metadata describes.
    #[error("Raw source has {actual} column(s) but the row declares {expected}")]
    #[diagnostic(code(scuttle_rows::source_layout))]
    SourceLayout { expected: usize, actual: usize },

    /// The raw source labels a position differently than the metadata does.
    #[error("Raw source column {index} is `{actual}`, metadata expects `{expected}`")]
    #[diagnostic(
        code(scuttle_rows::source_column_mismatch),
        help("declared columns must list a prefix of the source columns, in order")
    )]
    SourceColumnMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Unknown column type: {0}")]
    #[diagnostic(code(scuttle_rows::unknown_type))]
    UnknownType(String),

    #[error("Invalid reader configuration: {0}")]
    #[diagnostic(code(scuttle_rows::config))]
    Config(String),
}

impl From<ConversionFailure> for RowError {
    fn from(value: ConversionFailure) -> Self {
        Self::TypeConversion {
            value: value.value,
            source_type: value.source_type.to_owned(),
            target_type: value.target_type,
        }
    }
}

impl From<serde_json::Error> for RowError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}
