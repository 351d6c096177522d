//! Export configuration.

use serde::{Deserialize, Serialize};

/// File export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Format used when the requested one is missing or not allowed.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Label written for `true` boolean cells.
    #[serde(default = "default_true_label")]
    pub true_label: String,
    /// Label written for `false` boolean cells.
    #[serde(default = "default_false_label")]
    pub false_label: String,
    /// Body lines per PDF page.
    #[serde(default = "default_pdf_lines")]
    pub pdf_lines_per_page: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            true_label: default_true_label(),
            false_label: default_false_label(),
            pdf_lines_per_page: default_pdf_lines(),
        }
    }
}

fn default_format() -> String {
    "csv".to_string()
}

fn default_true_label() -> String {
    "Activo".to_string()
}

fn default_false_label() -> String {
    "Inactivo".to_string()
}

fn default_pdf_lines() -> usize {
    40
}
