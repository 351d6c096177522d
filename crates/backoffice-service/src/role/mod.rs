//! Role management.

pub mod guard;
pub mod profile;
pub mod service;

pub use guard::DeletionGuard;
pub use profile::RoleProfile;
pub use service::{
    PermissionOption, RoleBulkOutcome, RoleFormOptions, RoleIndexExtras, RoleInput, RoleService,
};
