//! PDF exporter.
//!
//! Produces a plain tabular report on landscape A4 pages using the standard
//! Helvetica fonts, so no font data is embedded. Each page is emitted as
//! soon as its rows have been read; the page tree and cross-reference table
//! are written at the end once every object offset is known.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;

use bytes::Bytes;
use futures::{StreamExt, stream};

use backoffice_core::types::{Columns, ExportFormat};

use crate::cell::CellFormat;
use crate::exporter::{ByteStream, Exporter, RowStream};
use crate::formats::render_row;

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
const MARGIN: f32 = 36.0;
const FONT_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 12.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const CATALOG_ID: u32 = 1;
const PAGES_ID: u32 = 2;
const FONT_ID: u32 = 3;
const BOLD_FONT_ID: u32 = 4;
const FIRST_PAGE_ID: u32 = 5;

/// Writes a paginated PDF table.
#[derive(Debug, Clone)]
pub struct PdfExporter {
    cells: CellFormat,
    lines_per_page: usize,
}

impl PdfExporter {
    /// Create a PDF exporter printing `lines_per_page` rows under each header.
    pub fn new(cells: CellFormat, lines_per_page: usize) -> Self {
        Self {
            cells,
            lines_per_page: lines_per_page.max(1),
        }
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new(CellFormat::default(), 40)
    }
}

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn stream(&self, rows: RowStream, columns: Columns) -> ByteStream {
        let state = Document {
            rows,
            keys: columns.keys().map(str::to_string).collect(),
            labels: columns.labels().map(str::to_string).collect(),
            cells: self.cells.clone(),
            lines_per_page: self.lines_per_page,
            out: PdfWriter::default(),
            pages: Vec::new(),
            phase: Phase::Start,
        };

        Box::pin(stream::unfold(state, |mut doc| async move {
            match doc.phase {
                Phase::Done => None,
                Phase::Start | Phase::Body => {
                    let chunk = doc.next_chunk().await;
                    Some((chunk, doc))
                }
            }
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Body,
    Done,
}

struct Document {
    rows: RowStream,
    keys: Vec<String>,
    labels: Vec<String>,
    cells: CellFormat,
    lines_per_page: usize,
    out: PdfWriter,
    pages: Vec<u32>,
    phase: Phase,
}

impl Document {
    /// Read up to one page of rows and return the bytes written for it.
    async fn next_chunk(&mut self) -> io::Result<Bytes> {
        if self.phase == Phase::Start {
            self.write_preamble();
            self.phase = Phase::Body;
        }

        let mut lines = Vec::with_capacity(self.lines_per_page);
        let mut exhausted = false;
        while lines.len() < self.lines_per_page {
            match self.rows.next().await {
                Some(Ok(row)) => lines.push(
                    render_row(&self.cells, &self.keys, &row)
                        .iter()
                        .map(|c| c.as_text())
                        .collect::<Vec<_>>(),
                ),
                Some(Err(e)) => {
                    self.phase = Phase::Done;
                    tracing::warn!(error = %e, "PDF export aborted");
                    return Err(io::Error::other(e));
                }
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        if !lines.is_empty() || self.pages.is_empty() {
            self.write_page(&lines);
        }
        if exhausted {
            self.write_trailer();
            self.phase = Phase::Done;
        }
        Ok(self.out.take())
    }

    fn write_preamble(&mut self) {
        self.out.raw(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        self.out.object(
            CATALOG_ID,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
        );
        self.out.object(FONT_ID, font("Helvetica").as_bytes());
        self.out.object(BOLD_FONT_ID, font("Helvetica-Bold").as_bytes());
    }

    fn write_page(&mut self, lines: &[Vec<String>]) {
        let content_id = FIRST_PAGE_ID + 2 * self.pages.len() as u32;
        let page_id = content_id + 1;

        let columns = self.labels.len().max(1);
        let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
        let max_chars = ((column_width - 4.0) / (FONT_SIZE * GLYPH_WIDTH)).max(1.0) as usize;

        let mut content = String::new();
        let mut y = PAGE_HEIGHT - MARGIN - FONT_SIZE;
        write_line(&mut content, "/F2", &self.labels, y, column_width, max_chars);
        let rule = y - 3.0;
        let _ = writeln!(
            content,
            "0.5 w {MARGIN} {rule} m {} {rule} l S",
            PAGE_WIDTH - MARGIN
        );
        for line in lines {
            y -= LINE_HEIGHT;
            write_line(&mut content, "/F1", line, y, column_width, max_chars);
        }

        let mut body = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\nendstream");
        self.out.object(content_id, &body);

        self.out.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 {FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> >> \
                 /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );
        self.pages.push(page_id);
    }

    fn write_trailer(&mut self) {
        let kids = self
            .pages
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        self.out.object(
            PAGES_ID,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                self.pages.len()
            )
            .as_bytes(),
        );
        self.out.xref();
    }
}

/// Emit one table line, each cell positioned with an absolute text matrix.
fn write_line(
    content: &mut String,
    font: &str,
    cells: &[String],
    y: f32,
    column_width: f32,
    max_chars: usize,
) {
    let _ = write!(content, "BT {font} {FONT_SIZE} Tf");
    for (index, text) in cells.iter().enumerate() {
        let x = MARGIN + index as f32 * column_width;
        let _ = write!(
            content,
            " 1 0 0 1 {x} {y} Tm ({}) Tj",
            pdf_string(&truncate(text, max_chars))
        );
    }
    content.push_str(" ET\n");
}

fn font(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Escape a literal string body. Characters outside Latin-1 become `?`;
/// octal escapes keep the content stream ASCII.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c < ' ' => out.push(' '),
            c if c.is_ascii() => out.push(c),
            c if (c as u32) <= 0xFF => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Byte-offset bookkeeping for objects written across several chunks.
#[derive(Default)]
struct PdfWriter {
    buf: Vec<u8>,
    emitted: usize,
    offsets: BTreeMap<u32, usize>,
}

impl PdfWriter {
    fn position(&self) -> usize {
        self.emitted + self.buf.len()
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn object(&mut self, id: u32, body: &[u8]) {
        self.offsets.insert(id, self.position());
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn xref(&mut self) {
        let start = self.position();
        let size = self.offsets.keys().next_back().copied().unwrap_or(0) + 1;

        let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for id in 1..size {
            match self.offsets.get(&id) {
                Some(offset) => {
                    let _ = write!(table, "{offset:010} 00000 n \n");
                }
                None => table.push_str("0000000000 65535 f \n"),
            }
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {size} /Root {CATALOG_ID} 0 R >>\nstartxref\n{start}\n%%EOF\n"
        );
        self.buf.extend_from_slice(table.as_bytes());
    }

    fn take(&mut self) -> Bytes {
        let chunk = std::mem::take(&mut self.buf);
        self.emitted += chunk.len();
        Bytes::from(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::testing;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    async fn render(rows: usize, lines_per_page: usize) -> Vec<u8> {
        let exporter = PdfExporter::new(CellFormat::default(), lines_per_page);
        let body = exporter.stream(testing::rows(testing::sample_rows(rows)), testing::columns());
        testing::collect(body).await.unwrap()
    }

    #[tokio::test]
    async fn test_document_is_framed() {
        let bytes = render(3, 40).await;
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(find(&bytes, b"(Nombre) Tj").is_some());
        assert!(find(&bytes, b"(Inactivo) Tj").is_some());
        assert!(find(&bytes, b"/Count 1").is_some());
    }

    #[tokio::test]
    async fn test_rows_split_across_pages() {
        let bytes = render(5, 2).await;
        assert!(find(&bytes, b"/Count 3").is_some());
        assert!(find(&bytes, b"/Kids [6 0 R 8 0 R 10 0 R]").is_some());
    }

    #[tokio::test]
    async fn test_empty_export_has_one_page() {
        let bytes = render(0, 40).await;
        assert!(find(&bytes, b"/Count 1").is_some());
        assert!(find(&bytes, b"(Estado) Tj").is_some());
    }

    #[tokio::test]
    async fn test_xref_offsets_point_at_objects() {
        let bytes = render(4, 3).await;

        let marker = b"startxref\n";
        let at = bytes.windows(marker.len()).rposition(|w| w == marker).unwrap();
        let tail = std::str::from_utf8(&bytes[at + marker.len()..]).unwrap();
        let startxref: usize = tail.lines().next().unwrap().parse().unwrap();

        let table = std::str::from_utf8(&bytes[startxref..]).unwrap();
        assert!(table.starts_with("xref\n0 9\n"));
        for (index, entry) in table.lines().skip(3).take(8).enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            let expected = format!("{} 0 obj", index + 1);
            assert!(bytes[offset..].starts_with(expected.as_bytes()), "object {}", index + 1);
        }
    }

    #[tokio::test]
    async fn test_row_error_fails_export() {
        let first = testing::sample_rows(1).remove(0);
        let body = PdfExporter::default().stream(testing::failing_rows(first), testing::columns());
        assert!(testing::collect(body).await.is_err());
    }

    #[test]
    fn test_pdf_string_escapes_and_encodes() {
        assert_eq!(pdf_string("a(b)\\"), "a\\(b\\)\\\\");
        assert_eq!(pdf_string("Pérez"), "P\\351rez");
        assert_eq!(pdf_string("日"), "?");
    }

    #[test]
    fn test_truncate_long_cells() {
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        assert_eq!(truncate("abc", 6), "abc");
    }
}
