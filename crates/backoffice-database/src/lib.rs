//! # backoffice-database
//!
//! PostgreSQL connection management, migrations, the shared listing SQL
//! builder and the concrete role, user and permission repositories.

pub mod connection;
pub mod migration;
pub mod query;
pub mod repositories;
pub mod writer;

pub use connection::DatabasePool;
pub use writer::{RecordKey, RecordKeys, ResourceWriter};
