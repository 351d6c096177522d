//! CSV exporter.

use std::io;

use bytes::Bytes;
use futures::{StreamExt, future, stream};

use backoffice_core::types::{Columns, ExportFormat};

use crate::cell::CellFormat;
use crate::exporter::{ByteStream, Exporter, RowStream};
use crate::formats::render_row;

/// Writes RFC 4180 CSV, one chunk per row, UTF-8 without a byte-order mark.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    cells: CellFormat,
}

impl CsvExporter {
    /// Create a CSV exporter.
    pub fn new(cells: CellFormat) -> Self {
        Self { cells }
    }
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn stream(&self, rows: RowStream, columns: Columns) -> ByteStream {
        let cells = self.cells.clone();
        let keys: Vec<String> = columns.keys().map(str::to_string).collect();
        let header = encode_record(columns.labels());

        let body = rows.map(move |row| {
            let row = row.map_err(io::Error::other)?;
            encode_record(render_row(&cells, &keys, &row).iter().map(|c| c.as_text()))
        });

        Box::pin(stream::once(future::ready(header)).chain(body))
    }
}

fn encode_record<I, S>(fields: I) -> io::Result<Bytes>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields).map_err(io::Error::other)?;
    writer
        .into_inner()
        .map(Bytes::from)
        .map_err(|e| io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::testing;
    use serde_json::json;

    #[tokio::test]
    async fn test_header_uses_labels_and_booleans_use_status_labels() {
        let exporter = CsvExporter::default();
        let body = exporter.stream(testing::rows(testing::sample_rows(2)), testing::columns());
        let text = String::from_utf8(testing::collect(body).await.unwrap()).unwrap();

        assert_eq!(
            text,
            "#,Nombre,Estado\n1,Usuario 1,Activo\n2,Usuario 2,Inactivo\n"
        );
    }

    #[tokio::test]
    async fn test_empty_export_is_header_only() {
        let body = CsvExporter::default().stream(testing::rows(vec![]), testing::columns());
        let bytes = testing::collect(body).await.unwrap();
        assert_eq!(bytes, b"#,Nombre,Estado\n");
    }

    #[tokio::test]
    async fn test_values_with_commas_are_quoted() {
        let row = json!({"id": 1, "name": "Pérez, Ana", "is_active": true})
            .as_object()
            .cloned()
            .unwrap();
        let body = CsvExporter::default().stream(testing::rows(vec![row]), testing::columns());
        let text = String::from_utf8(testing::collect(body).await.unwrap()).unwrap();
        assert!(text.ends_with("1,\"Pérez, Ana\",Activo\n"));
        assert!(!text.starts_with('\u{feff}'));
    }

    #[tokio::test]
    async fn test_row_error_ends_stream_with_error() {
        let first = testing::sample_rows(1).remove(0);
        let body = CsvExporter::default().stream(testing::failing_rows(first), testing::columns());
        assert!(testing::collect(body).await.is_err());
    }
}
