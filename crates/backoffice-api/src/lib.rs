//! # backoffice-api
//!
//! HTTP layer for the backoffice built on Axum.
//!
//! Serves the role and user pages, the generic index/export/bulk/selected
//! pipeline, flash-message redirects, middleware (sessions, request ids,
//! access log, CORS, compression), extractors, DTOs and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod page;
pub mod pipeline;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use state::AppState;
