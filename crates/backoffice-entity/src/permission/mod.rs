//! Permission catalog entries.

pub mod model;

pub use model::{Permission, PermissionRef};
