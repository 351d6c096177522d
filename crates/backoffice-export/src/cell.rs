//! Rendering of row values into export cells.

use chrono::DateTime;
use serde_json::{Number, Value};

use backoffice_core::config::ExportConfig;

/// A rendered cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing or null value.
    Empty,
    /// A number, kept numeric where the format allows it.
    Number(Number),
    /// Text.
    Text(String),
}

impl Cell {
    /// Text form used by text-only formats.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// JSON form used by the JSON exporter.
    pub fn into_json(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Number(n) => Value::Number(n),
            Self::Text(s) => Value::String(s),
        }
    }
}

/// How row values are turned into cells.
#[derive(Debug, Clone)]
pub struct CellFormat {
    true_label: String,
    false_label: String,
}

impl CellFormat {
    /// Create a formatter with explicit boolean labels.
    pub fn new(true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        Self {
            true_label: true_label.into(),
            false_label: false_label.into(),
        }
    }

    /// Create a formatter from export configuration.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.true_label.clone(), config.false_label.clone())
    }

    /// Render one value.
    ///
    /// Booleans become the yes/no labels, arrays are joined with `", "` and
    /// RFC 3339 timestamps are shown as `YYYY-MM-DD HH:MM:SS`.
    pub fn render(&self, value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(true) => Cell::Text(self.true_label.clone()),
            Value::Bool(false) => Cell::Text(self.false_label.clone()),
            Value::Number(n) => Cell::Number(n.clone()),
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Cell::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
                Err(_) => Cell::Text(s.clone()),
            },
            Value::Array(items) => Cell::Text(
                items
                    .iter()
                    .map(|item| self.render(item).as_text())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Value::Object(_) => Cell::Text(value.to_string()),
        }
    }
}

impl Default for CellFormat {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booleans_use_labels() {
        let format = CellFormat::default();
        assert_eq!(format.render(&json!(true)), Cell::Text("Activo".into()));
        assert_eq!(format.render(&json!(false)), Cell::Text("Inactivo".into()));
    }

    #[test]
    fn test_arrays_are_joined() {
        let cell = CellFormat::default().render(&json!(["admin", "editor"]));
        assert_eq!(cell.as_text(), "admin, editor");
    }

    #[test]
    fn test_timestamps_are_shortened() {
        let cell = CellFormat::default().render(&json!("2025-03-04T05:06:07.123Z"));
        assert_eq!(cell.as_text(), "2025-03-04 05:06:07");
    }

    #[test]
    fn test_null_is_empty() {
        assert_eq!(CellFormat::default().render(&Value::Null).as_text(), "");
    }
}
