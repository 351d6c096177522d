//! Built-in exporters.

pub mod csv;
pub mod json;
pub mod pdf;
pub mod xlsx;

pub use self::csv::CsvExporter;
pub use self::json::JsonExporter;
pub use self::pdf::PdfExporter;
pub use self::xlsx::XlsxExporter;

use serde_json::Value;

use backoffice_core::types::Row;

use crate::cell::{Cell, CellFormat};

/// Render the `keys` of a row in order. Missing keys render empty.
pub(crate) fn render_row(cells: &CellFormat, keys: &[String], row: &Row) -> Vec<Cell> {
    keys.iter()
        .map(|key| cells.render(row.get(key).unwrap_or(&Value::Null)))
        .collect()
}
