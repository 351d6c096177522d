//! Role domain entities.

pub mod listing;
pub mod model;

pub use listing::ROLE_LIST_SPEC;
pub use model::{CreateRole, Role, RoleStats, UpdateRole};
