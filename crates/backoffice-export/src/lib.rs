//! # backoffice-export
//!
//! Format-specific writers that turn a lazy, single-pass row stream into a
//! downloadable byte stream without holding the whole file in memory.
//!
//! Every exporter writes a header built from the human column labels and
//! renders booleans with the configured yes/no labels.

pub mod cell;
pub mod exporter;
pub mod formats;
pub mod registry;

pub use cell::{Cell, CellFormat};
pub use exporter::{ByteStream, Exporter, RowStream};
pub use registry::ExporterRegistry;
