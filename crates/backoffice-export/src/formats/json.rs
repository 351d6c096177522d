//! JSON exporter.

use std::io;

use bytes::Bytes;
use futures::{StreamExt, future, stream};
use serde_json::{Map, Value};

use backoffice_core::types::{Columns, ExportFormat};

use crate::cell::CellFormat;
use crate::exporter::{ByteStream, Exporter, RowStream};
use crate::formats::render_row;

/// Writes a JSON array of objects keyed by column label.
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    cells: CellFormat,
}

impl JsonExporter {
    /// Create a JSON exporter.
    pub fn new(cells: CellFormat) -> Self {
        Self { cells }
    }
}

impl Exporter for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn stream(&self, rows: RowStream, columns: Columns) -> ByteStream {
        let cells = self.cells.clone();
        let keys: Vec<String> = columns.keys().map(str::to_string).collect();
        let labels: Vec<String> = columns.labels().map(str::to_string).collect();

        let body = rows.enumerate().map(move |(index, row)| {
            let row = row.map_err(io::Error::other)?;
            let object: Map<String, Value> = labels
                .iter()
                .cloned()
                .zip(render_row(&cells, &keys, &row).into_iter().map(|c| c.into_json()))
                .collect();

            let mut chunk = if index == 0 { Vec::new() } else { b",".to_vec() };
            serde_json::to_writer(&mut chunk, &object).map_err(io::Error::other)?;
            Ok(Bytes::from(chunk))
        });

        Box::pin(
            stream::once(future::ready(Ok(Bytes::from_static(b"["))))
                .chain(body)
                .chain(stream::once(future::ready(Ok(Bytes::from_static(b"]"))))),
        )
    }
}
