//! Core type definitions used across the backoffice workspace.

pub mod export_format;
pub mod filter;
pub mod list_query;
pub mod pagination;
pub mod row;
pub mod sorting;

pub use export_format::ExportFormat;
pub use filter::{FilterKind, FilterSpec, FilterValue, ListSpec};
pub use list_query::ListQuery;
pub use pagination::{Page, PageMeta, PageResult};
pub use row::{Columns, Row};
pub use sorting::SortDirection;
