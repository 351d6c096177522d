//! # backoffice-core
//!
//! Core crate for the backoffice. Contains configuration schemas, the
//! listing query model (search, filters, sorting, pagination), row and
//! column types shared by listings and exports, the read-side repository
//! port, and the unified error system.
//!
//! This crate has **no** internal dependencies on other backoffice crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
