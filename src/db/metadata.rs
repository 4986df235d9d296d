use std::{collections::HashMap, sync::{Arc, OnceLock}};

use super::column_def::ColumnDef;
use crate::{
    RowError,
    codec::{Codec, CodecRegistry, source::RawSource},
};

/// Shared description of a query's columns.
///
/// Built once per query and referenced by every row that query produces.
/// Name lookups are served from maps that are computed on first use and
/// kept for the lifetime of the metadata, so a result stream of any length
/// resolves each name map exactly once.
///
/// Two names may exist per position:
/// - *declared* names, the logical schema the caller asked for;
/// - *result* names, the labels the data source actually reported.
///
/// When result names are present they are authoritative for name-based
/// access ("unaliasing"); otherwise the declared names stand in for them.
#[derive(Debug, Clone)]
pub struct RowMetadata {
    declared_names: Vec<String>,
    result_names: Option<Vec<String>>,
    codecs: Option<Vec<Arc<dyn Codec>>>,

    /// Declared name to position, last duplicate wins.
    name_index: OnceLock<HashMap<String, usize>>,

    /// Unaliased name to position.
    strict_index: OnceLock<HashMap<String, usize>>,
}

impl RowMetadata {
    /// Creates metadata with declared names only: no aliasing, no codecs.
    pub fn new<S: Into<String>>(declared_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            declared_names: declared_names.into_iter().map(Into::into).collect(),
            result_names: None,
            codecs: None,
            name_index: OnceLock::new(),
            strict_index: OnceLock::new(),
        }
    }

    /// Attaches the names the data source reported for the same positions.
    pub fn with_result_names<S: Into<String>>(
        mut self,
        result_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, RowError> {
        let result_names: Vec<String> = result_names.into_iter().map(Into::into).collect();
        self.check_len("result names", result_names.len())?;
        self.result_names = Some(result_names);
        self.strict_index = OnceLock::new();
        Ok(self)
    }

    /// Attaches one pre-resolved codec per column.
    pub fn with_codecs(mut self, codecs: Vec<Arc<dyn Codec>>) -> Result<Self, RowError> {
        self.check_len("codecs", codecs.len())?;
        self.codecs = Some(codecs);
        Ok(self)
    }

    /// Builds metadata for a query from its result-set column listing.
    ///
    /// `declared_names` are the names the caller asked for, position-aligned
    /// with `columns`. Codecs are resolved here, once, through `registry`.
    pub fn from_columns<S: Into<String>>(
        declared_names: impl IntoIterator<Item = S>,
        columns: &[ColumnDef],
        registry: &dyn CodecRegistry,
    ) -> Result<Self, RowError> {
        let codecs = columns
            .iter()
            .map(|column| registry.codec_for(&column.data_type))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(declared_names)
            .with_result_names(columns.iter().map(|column| column.name.as_str()))?
            .with_codecs(codecs)
    }

    /// Builds metadata whose declared names are the reported names.
    pub fn from_column_defs(
        columns: &[ColumnDef],
        registry: &dyn CodecRegistry,
    ) -> Result<Self, RowError> {
        let codecs = columns
            .iter()
            .map(|column| registry.codec_for(&column.data_type))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(columns.iter().map(|column| column.name.as_str())).with_codecs(codecs)
    }

    fn check_len(&self, what: &'static str, actual: usize) -> Result<(), RowError> {
        if actual == self.declared_names.len() {
            Ok(())
        } else {
            Err(RowError::LengthMismatch {
                what,
                expected: self.declared_names.len(),
                actual,
            })
        }
    }

    pub fn column_count(&self) -> usize {
        self.declared_names.len()
    }

    pub fn declared_names(&self) -> &[String] {
        &self.declared_names
    }

    pub fn result_names(&self) -> Option<&[String]> {
        self.result_names.as_deref()
    }

    pub fn codecs(&self) -> Option<&[Arc<dyn Codec>]> {
        self.codecs.as_deref()
    }

    /// The names that name-based access resolves against: result names when
    /// present, declared names otherwise.
    pub fn unaliased_names(&self) -> &[String] {
        self.result_names.as_deref().unwrap_or(&self.declared_names)
    }

    /// Tolerant lookup against the declared names.
    ///
    /// Returns `None` for unknown names. With duplicate declared names the
    /// last position wins.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index
            .get_or_init(|| {
                tracing::debug!(columns = self.declared_names.len(), "building declared name index");
                index_names(&self.declared_names)
            })
            .get(name)
            .copied()
    }

    /// Strict lookup against the unaliased names.
    ///
    /// This is the lookup every name-based row accessor goes through.
    pub fn index_of_or_fail(&self, name: &str) -> Result<usize, RowError> {
        self.strict_index()
            .get(name)
            .copied()
            .ok_or_else(|| RowError::ColumnNotFound {
                name: name.to_owned(),
                available: self.declared_names.clone(),
            })
    }

    /// Whether `name` resolves under [`RowMetadata::index_of_or_fail`].
    pub fn contains(&self, name: &str) -> bool {
        self.strict_index().contains_key(name)
    }

    fn strict_index(&self) -> &HashMap<String, usize> {
        self.strict_index.get_or_init(|| {
            tracing::debug!(
                columns = self.declared_names.len(),
                aliased = self.result_names.is_some(),
                "building result name index"
            );
            index_names(self.unaliased_names())
        })
    }

    /// Fails unless `source` is at least as wide as this row.
    pub fn check_column_count(&self, source: &dyn RawSource) -> Result<(), RowError> {
        let actual = source.column_count();
        if actual < self.declared_names.len() {
            return Err(RowError::SourceLayout {
                expected: self.declared_names.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Checks that this metadata describes a prefix of `source`'s columns.
    ///
    /// Sources that do not report column labels are only checked for width.
    pub fn validate_source(&self, source: &dyn RawSource) -> Result<(), RowError> {
        self.check_column_count(source)?;

        for (index, expected) in self.unaliased_names().iter().enumerate() {
            match source.column_name(index) {
                Some(actual) if actual != expected => {
                    return Err(RowError::SourceColumnMismatch {
                        index,
                        expected: expected.clone(),
                        actual: actual.to_owned(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn index_names(names: &[String]) -> HashMap<String, usize> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect()
}

impl PartialEq for RowMetadata {
    fn eq(&self, other: &Self) -> bool {
        let codec_types = |m: &Self| {
            m.codecs
                .as_ref()
                .map(|codecs| codecs.iter().map(|c| c.data_type().clone()).collect::<Vec<_>>())
        };

        self.declared_names == other.declared_names
            && self.result_names == other.result_names
            && codec_types(self) == codec_types(other)
    }
}
