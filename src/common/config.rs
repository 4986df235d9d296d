use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::error::RowError;

/// How a [`RowReader`](crate::RowReader) checks that raw sources line up
/// with the query's metadata before decoding them positionally.
///
/// Decoding always verifies that a source is at least as wide as the row.
/// The name check additionally compares the source's reported column names,
/// when it reports any, against the metadata's result names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LayoutCheck {
    /// Width check only.
    None,

    /// Name check on the first source of a query, width check afterwards.
    #[default]
    FirstRow,

    /// Name check on every source.
    EveryRow,
}

/// Options for reading one query's result stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub layout_check: LayoutCheck,
}

impl ReaderConfig {
    /// Parses a reader configuration from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, RowError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_layout_check(mut self, layout_check: LayoutCheck) -> Self {
        self.layout_check = layout_check;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::from_json("{}").unwrap();
        assert_eq!(config.layout_check, LayoutCheck::FirstRow);
        assert_eq!(config, ReaderConfig::default());
    }

    #[test]
    fn test_config_layout_check() {
        let config = ReaderConfig::from_json(r#"{"layout_check": "every_row"}"#).unwrap();
        assert_eq!(config.layout_check, LayoutCheck::EveryRow);
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        let result = ReaderConfig::from_json(r#"{"layout_check": "sometimes"}"#);
        assert!(matches!(result, Err(RowError::Config(_))));
    }

    #[test]
    fn test_layout_check_names() {
        assert_eq!(LayoutCheck::FirstRow.to_string(), "first_row");
        assert_eq!(LayoutCheck::from_str("EVERY_ROW").unwrap(), LayoutCheck::EveryRow);
    }
}
