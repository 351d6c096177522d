//! # backoffice-auth
//!
//! Authorization and credential handling for the backoffice.
//!
//! ## Modules
//!
//! - `rbac`: permission catalog, (resource, ability) mapping and enforcement
//! - `principal`: the authenticated user and how it is loaded
//! - `password`: Argon2id password hashing and policy enforcement

pub mod password;
pub mod principal;
pub mod rbac;

pub use password::{PasswordHasher, PasswordValidator};
pub use principal::{PgPrincipalResolver, Principal, PrincipalResolver};
pub use rbac::{Ability, Permission, RbacEnforcer, Resource};
