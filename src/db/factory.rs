use std::sync::Arc;

use super::{
    metadata::RowMetadata,
    row::{RowData, interop::InteropRow, native::Row},
};
use crate::{RowError, codec::source::RawSource, core::types::Value};

/// Construction paths shared by both row views.
pub trait RowFactory: Sized {
    fn from_data(data: RowData) -> Self;

    /// Decodes one row from a driver-produced source.
    ///
    /// Columns are read by position only: the first
    /// `metadata.column_count()` positions of `source` are taken to be the
    /// declared columns, in order. A source narrower than the metadata is
    /// rejected; wider sources are fine and their trailing columns are
    /// never touched. The per-column codecs are used when the metadata
    /// carries them.
    fn from_source(source: &dyn RawSource, metadata: &Arc<RowMetadata>) -> Result<Self, RowError> {
        let values = decode_values(source, metadata)?;
        Ok(Self::from_data(RowData::new(Arc::clone(metadata), values)?))
    }

    /// Builds a standalone row from name/value pairs, in iteration order.
    ///
    /// The row gets fresh metadata with no aliasing and no codecs.
    fn from_association<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let (names, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .unzip();

        // names and values come from the same pairs, so lengths always agree
        Self::from_data(RowData::from_parts(Arc::new(RowMetadata::new(names)), values))
    }
}

impl RowFactory for Row {
    fn from_data(data: RowData) -> Self {
        Row::from(data)
    }
}

impl RowFactory for InteropRow {
    fn from_data(data: RowData) -> Self {
        InteropRow::from(data)
    }
}

fn decode_values(source: &dyn RawSource, metadata: &RowMetadata) -> Result<Vec<Value>, RowError> {
    metadata.check_column_count(source)?;

    match metadata.codecs() {
        Some(codecs) => codecs
            .iter()
            .enumerate()
            .map(|(idx, codec)| source.decode_with(idx, codec.as_ref()))
            .collect(),
        None => (0..metadata.column_count())
            .map(|idx| source.decode(idx))
            .collect(),
    }
}
