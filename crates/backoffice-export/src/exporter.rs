//! The exporter strategy trait.

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;

use backoffice_core::result::AppResult;
use backoffice_core::types::{Columns, ExportFormat, Row};

/// Rows to export, already projected onto the selected columns.
pub type RowStream = BoxStream<'static, AppResult<Row>>;

/// Encoded file content, produced incrementally.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Writes one export format.
pub trait Exporter: Send + Sync {
    /// Format produced by this exporter.
    fn format(&self) -> ExportFormat;

    /// Encode `rows` under a header made of the `columns` labels.
    ///
    /// The row stream is consumed lazily as the returned stream is polled.
    /// A failing row ends the byte stream with an I/O error.
    fn stream(&self, rows: RowStream, columns: Columns) -> ByteStream;
}
