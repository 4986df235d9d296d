use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use super::{
    factory::RowFactory,
    metadata::RowMetadata,
    row::{interop::InteropRow, native::Row},
};
use crate::{
    RowError,
    codec::source::RawSource,
    common::config::{LayoutCheck, ReaderConfig},
};

/// Turns one query's raw result stream into rows.
///
/// The reader owns the query's metadata, so every row it produces shares
/// the same name maps and codecs. Layout validation runs according to the
/// configured [`LayoutCheck`].
#[derive(Debug)]
pub struct RowReader {
    metadata: Arc<RowMetadata>,
    config: ReaderConfig,
    validated: AtomicBool,
    rows_read: AtomicU64,
}

impl RowReader {
    pub fn new(metadata: Arc<RowMetadata>, config: ReaderConfig) -> Self {
        Self {
            metadata,
            config,
            validated: AtomicBool::new(false),
            rows_read: AtomicU64::new(0),
        }
    }

    pub fn metadata(&self) -> &Arc<RowMetadata> {
        &self.metadata
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Number of rows successfully decoded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read.load(Ordering::Relaxed)
    }

    pub fn read(&self, source: &dyn RawSource) -> Result<Row, RowError> {
        self.read_as(source)
    }

    pub fn read_interop(&self, source: &dyn RawSource) -> Result<InteropRow, RowError> {
        self.read_as(source)
    }

    /// Decodes one source into either row view.
    pub fn read_as<R: RowFactory>(&self, source: &dyn RawSource) -> Result<R, RowError> {
        self.check_layout(source)?;

        let row = R::from_source(source, &self.metadata)?;
        let count = self.rows_read.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(row = count, columns = self.metadata.column_count(), "decoded row");
        Ok(row)
    }

    /// Decodes every source in order. Each item fails or succeeds on its own.
    pub fn read_all<S, I>(&self, sources: I) -> impl Iterator<Item = Result<Row, RowError>>
    where
        S: RawSource,
        I: IntoIterator<Item = S>,
    {
        sources.into_iter().map(move |source| self.read(&source))
    }

    fn check_layout(&self, source: &dyn RawSource) -> Result<(), RowError> {
        let check = match self.config.layout_check {
            LayoutCheck::None => false,
            LayoutCheck::FirstRow => !self.validated.load(Ordering::Acquire),
            LayoutCheck::EveryRow => true,
        };
        if !check {
            return Ok(());
        }

        if let Err(err) = self.metadata.validate_source(source) {
            tracing::warn!(error = %err, "raw source does not match row metadata");
            return Err(err);
        }

        // an unlabeled source only proves its width, keep checking names
        if self.metadata.column_count() > 0 && source.column_name(0).is_none() {
            return Ok(());
        }

        if !self.validated.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                columns = self.metadata.column_count(),
                mode = %self.config.layout_check,
                "validated raw source layout"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{DefaultCodecRegistry, source::VecSource},
        core::types::{ScalarType, Value},
        db::column_def::ColumnDef,
    };

    fn reader(layout_check: LayoutCheck) -> RowReader {
        let registry = DefaultCodecRegistry::new();
        let columns = vec![
            ColumnDef::new("id", ScalarType::Int),
            ColumnDef::new("name", ScalarType::Text),
        ];
        let metadata = RowMetadata::from_column_defs(&columns, &registry).unwrap();
        RowReader::new(
            Arc::new(metadata),
            ReaderConfig::default().with_layout_check(layout_check),
        )
    }

    fn source(names: [&str; 2], id: i64) -> VecSource {
        VecSource::with_names(names, vec![Value::BigInt(id), Value::from("x")]).unwrap()
    }

    #[test]
    fn test_read_decodes_through_codecs() {
        let reader = reader(LayoutCheck::FirstRow);

        let row = reader.read(&source(["id", "name"], 4)).unwrap();

        assert_eq!(row.get_value("id").unwrap(), &Value::Int(4));
        assert!(Arc::ptr_eq(row.metadata(), reader.metadata()));
        assert_eq!(reader.rows_read(), 1);
    }

    #[test]
    fn test_first_row_mode_rejects_bad_first_source() {
        let reader = reader(LayoutCheck::FirstRow);

        let result = reader.read(&source(["name", "id"], 1));

        assert!(matches!(result, Err(RowError::SourceColumnMismatch { index: 0, .. })));
        assert_eq!(reader.rows_read(), 0);
    }

    #[test]
    fn test_first_row_mode_checks_names_once() {
        let reader = reader(LayoutCheck::FirstRow);

        assert!(reader.read(&source(["id", "name"], 1)).is_ok());
        assert!(reader.read(&source(["other", "name"], 2)).is_ok());
        assert_eq!(reader.rows_read(), 2);
    }

    #[test]
    fn test_first_row_mode_keeps_checking_after_unlabeled_source() {
        let reader = reader(LayoutCheck::FirstRow);
        let unlabeled = VecSource::new(vec![Value::BigInt(1), Value::from("x"), Value::Null]);

        assert!(reader.read(&unlabeled).is_ok());
        let result = reader.read(&source(["name", "id"], 2));
        assert!(matches!(result, Err(RowError::SourceColumnMismatch { index: 0, .. })));

        assert!(reader.read(&source(["id", "name"], 3)).is_ok());
        assert!(reader.read(&source(["other", "name"], 4)).is_ok());
        assert_eq!(reader.rows_read(), 3);
    }

    #[test]
    fn test_every_row_mode_checks_each_source() {
        let reader = reader(LayoutCheck::EveryRow);

        assert!(reader.read(&source(["id", "name"], 1)).is_ok());
        let result = reader.read(&source(["other", "name"], 2));
        assert!(matches!(result, Err(RowError::SourceColumnMismatch { .. })));
    }

    #[test]
    fn test_none_mode_still_checks_width() {
        let reader = reader(LayoutCheck::None);

        assert!(reader.read(&source(["name", "id"], 1)).is_ok());
        let narrow = VecSource::new(vec![Value::Int(1)]);
        assert_eq!(
            reader.read(&narrow),
            Err(RowError::SourceLayout {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_read_all() {
        let reader = reader(LayoutCheck::FirstRow);
        let sources = vec![
            source(["id", "name"], 1),
            VecSource::new(vec![Value::from("two"), Value::from("y")]),
            source(["id", "name"], 3),
        ];

        let results: Vec<_> = reader.read_all(sources).collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().get_i32("id").unwrap(), 1);
        assert!(matches!(results[1], Err(RowError::TypeConversion { .. })));
        assert_eq!(results[2].as_ref().unwrap().get_i32(0).unwrap(), 3);
        assert_eq!(reader.rows_read(), 2);
    }

    #[test]
    fn test_read_interop() {
        let reader = reader(LayoutCheck::EveryRow);

        let row = reader.read_interop(&source(["id", "name"], 9)).unwrap();

        assert_eq!(row.to_list(), vec![Value::Int(9), Value::from("x")]);
    }
}
