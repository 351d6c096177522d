//! Export file formats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A downloadable export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Office Open XML spreadsheet.
    Xlsx,
    /// Portable Document Format.
    Pdf,
    /// JSON array of row objects.
    Json,
}

impl ExportFormat {
    /// Every supported format.
    pub const ALL: [ExportFormat; 4] = [Self::Csv, Self::Xlsx, Self::Pdf, Self::Json];

    /// Parse a `format` query value. Matching is case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=UTF-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ExportFormat::parse("XLSX"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("docx"), None);
    }

    #[test]
    fn test_csv_content_type_declares_utf8() {
        assert_eq!(ExportFormat::Csv.content_type(), "text/csv; charset=UTF-8");
        assert_eq!(ExportFormat::Pdf.to_string(), "pdf");
    }
}
