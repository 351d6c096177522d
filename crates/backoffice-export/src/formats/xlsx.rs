//! XLSX exporter.
//!
//! The workbook is a zip archive, so it cannot be emitted front to back.
//! Rows are handed to a blocking writer that deflates them straight into an
//! anonymous temporary file; once the archive is finished the file is
//! streamed back to the client. Memory use stays bounded by the channel
//! depth regardless of row count.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

use futures::{StreamExt, TryStreamExt, stream};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use backoffice_core::types::{Columns, ExportFormat};

use crate::cell::{Cell, CellFormat};
use crate::exporter::{ByteStream, Exporter, RowStream};
use crate::formats::render_row;

const CHANNEL_DEPTH: usize = 256;
const SHEET_NAME: &str = "Export";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const SHEET_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#;

const SHEET_CLOSE: &str = "</sheetData></worksheet>";

/// Writes a single-sheet Office Open XML workbook.
#[derive(Debug, Clone, Default)]
pub struct XlsxExporter {
    cells: CellFormat,
}

impl XlsxExporter {
    /// Create an XLSX exporter.
    pub fn new(cells: CellFormat) -> Self {
        Self { cells }
    }
}

impl Exporter for XlsxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn stream(&self, mut rows: RowStream, columns: Columns) -> ByteStream {
        let cells = self.cells.clone();
        let keys: Vec<String> = columns.keys().map(str::to_string).collect();
        let labels: Vec<String> = columns.labels().map(str::to_string).collect();

        let build = async move {
            let (tx, rx) = mpsc::channel::<Vec<Cell>>(CHANNEL_DEPTH);
            let writer = tokio::task::spawn_blocking(move || write_workbook(rx, &labels));

            let mut failure = None;
            while let Some(row) = rows.next().await {
                match row {
                    Ok(row) => {
                        if tx.send(render_row(&cells, &keys, &row)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            drop(tx);

            let file = writer.await.map_err(io::Error::other)??;
            if let Some(e) = failure {
                tracing::warn!(error = %e, "XLSX export aborted");
                return Err(io::Error::other(e));
            }
            Ok(ReaderStream::new(tokio::fs::File::from_std(file)))
        };

        Box::pin(stream::once(build).try_flatten())
    }
}

fn write_workbook(mut rx: mpsc::Receiver<Vec<Cell>>, labels: &[String]) -> io::Result<File> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(tempfile::tempfile()?);

    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
    ] {
        zip.start_file(name, options).map_err(io::Error::other)?;
        zip.write_all(body.as_bytes())?;
    }

    zip.start_file("xl/workbook.xml", options)
        .map_err(io::Error::other)?;
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )?;

    zip.start_file("xl/worksheets/sheet1.xml", options)
        .map_err(io::Error::other)?;
    zip.write_all(SHEET_OPEN.as_bytes())?;

    let header: Vec<Cell> = labels.iter().cloned().map(Cell::Text).collect();
    write_row(&mut zip, 1, &header)?;

    let mut index = 1;
    while let Some(cells) = rx.blocking_recv() {
        index += 1;
        write_row(&mut zip, index, &cells)?;
    }

    zip.write_all(SHEET_CLOSE.as_bytes())?;

    let mut file = zip.finish().map_err(io::Error::other)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

fn write_row<W: Write>(out: &mut W, index: usize, cells: &[Cell]) -> io::Result<()> {
    write!(out, r#"<row r="{index}">"#)?;
    for cell in cells {
        match cell {
            Cell::Empty => out.write_all(b"<c/>")?,
            Cell::Number(n) => write!(out, "<c><v>{n}</v></c>")?,
            Cell::Text(text) => write!(
                out,
                r#"<c t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                escape_xml(text)
            )?,
        }
    }
    out.write_all(b"</row>")
}

/// Escape markup characters and drop control characters XML 1.0 forbids.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' | '\n' | '\r' => escaped.push(ch),
            c if c < ' ' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::formats::testing;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    #[tokio::test]
    async fn test_workbook_contains_header_and_rows() {
        let body = XlsxExporter::default()
            .stream(testing::rows(testing::sample_rows(3)), testing::columns());
        let bytes = testing::collect(body).await.unwrap();

        assert!(bytes.starts_with(b"PK"));
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<row r="1"><c t="inlineStr"><is><t xml:space="preserve">#</t>"#));
        assert!(sheet.contains(r#"<row r="4"><c><v>3</v></c>"#));
        assert!(sheet.contains("Usuario 2"));
        assert!(sheet.contains("Inactivo"));
        assert!(sheet.ends_with(SHEET_CLOSE));
        assert!(read_entry(&bytes, "xl/workbook.xml").contains(r#"name="Export""#));
    }

    #[tokio::test]
    async fn test_empty_export_still_has_header_row() {
        let body = XlsxExporter::default().stream(testing::rows(vec![]), testing::columns());
        let bytes = testing::collect(body).await.unwrap();
        let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<row r="1">"#));
        assert!(!sheet.contains(r#"<row r="2">"#));
    }

    #[tokio::test]
    async fn test_row_error_fails_export() {
        let first = testing::sample_rows(1).remove(0);
        let body =
            XlsxExporter::default().stream(testing::failing_rows(first), testing::columns());
        assert!(testing::collect(body).await.is_err());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\"\u{1}"), "a&lt;b &amp; &quot;c&quot;");
    }
}
