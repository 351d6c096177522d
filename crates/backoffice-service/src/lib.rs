//! # backoffice-service
//!
//! Business logic for the backoffice. [`BaseService`] implements the
//! generic listing, export and bulk pipeline over any repository; the role
//! and user services add the rules specific to each resource.
//!
//! Services follow constructor injection: every dependency is handed over
//! at construction time via `Arc` references.

pub mod base;
pub mod context;
pub mod profile;
pub mod resource;
pub mod role;
pub mod user;

pub use base::{BaseService, PageCursor, UnitOfWork};
pub use context::RequestContext;
pub use profile::ResourceProfile;
pub use resource::{BulkAction, ExportDownload, ResourceService};
pub use role::{
    DeletionGuard, PermissionOption, RoleBulkOutcome, RoleFormOptions, RoleIndexExtras, RoleInput,
    RoleProfile, RoleService,
};
pub use user::{NewUser, UserChanges, UserFormOptions, UserProfile, UserService};
