//! User management.

pub mod profile;
pub mod service;

pub use profile::UserProfile;
pub use service::{NewUser, UserChanges, UserFormOptions, UserService};
