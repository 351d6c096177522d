//! # backoffice-entity
//!
//! Domain entity models for the backoffice. Every struct in this crate
//! represents a database table row or a write payload. Database entities
//! derive `sqlx::FromRow`; each resource also publishes the sort and filter
//! allow-lists its listing accepts.

pub mod permission;
pub mod role;
pub mod user;
