//! Core traits defined in `backoffice-core` and implemented by other crates.

pub mod repository;

pub use repository::ResourceReader;
