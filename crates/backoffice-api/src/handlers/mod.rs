//! Route handlers organized by resource.

pub mod health;
pub mod resource;
pub mod roles;
pub mod users;
