//! User domain entities.

pub mod listing;
pub mod model;

pub use listing::USER_LIST_SPEC;
pub use model::{CreateUser, RoleRef, UpdateUser, User};
