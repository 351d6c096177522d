//! Lookup of exporters by format.

use std::collections::HashMap;
use std::sync::Arc;

use backoffice_core::config::ExportConfig;
use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::ExportFormat;

use crate::cell::CellFormat;
use crate::exporter::Exporter;
use crate::formats::{CsvExporter, JsonExporter, PdfExporter, XlsxExporter};

/// Exporters available to the application, keyed by format.
#[derive(Clone, Default)]
pub struct ExporterRegistry {
    exporters: HashMap<ExportFormat, Arc<dyn Exporter>>,
}

impl ExporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in exporter, configured from `config`.
    pub fn from_config(config: &ExportConfig) -> Self {
        let cells = CellFormat::from_config(config);
        let mut registry = Self::new();
        registry.register(Arc::new(CsvExporter::new(cells.clone())));
        registry.register(Arc::new(XlsxExporter::new(cells.clone())));
        registry.register(Arc::new(PdfExporter::new(
            cells.clone(),
            config.pdf_lines_per_page,
        )));
        registry.register(Arc::new(JsonExporter::new(cells)));
        registry
    }

    /// Register an exporter, replacing any previous one for its format.
    pub fn register(&mut self, exporter: Arc<dyn Exporter>) {
        self.exporters.insert(exporter.format(), exporter);
    }

    /// The exporter for `format`.
    pub fn get(&self, format: ExportFormat) -> AppResult<Arc<dyn Exporter>> {
        self.exporters
            .get(&format)
            .cloned()
            .ok_or_else(|| AppError::export(format!("No exporter registered for {format}")))
    }

    /// Formats with a registered exporter.
    pub fn formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|f| self.exporters.contains_key(f))
            .collect()
    }
}

impl std::fmt::Debug for ExporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_every_format() {
        let registry = ExporterRegistry::from_config(&ExportConfig::default());
        assert_eq!(registry.formats(), ExportFormat::ALL.to_vec());
        for format in ExportFormat::ALL {
            assert_eq!(registry.get(format).unwrap().format(), format);
        }
    }

    #[test]
    fn test_missing_exporter_is_an_export_error() {
        let registry = ExporterRegistry::new();
        let err = registry.get(ExportFormat::Pdf).err().unwrap();
        assert_eq!(err.kind, backoffice_core::error::ErrorKind::Export);
    }
}
