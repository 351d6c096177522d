//! Database-backed integration tests.
//!
//! Run with a disposable Postgres:
//! `DATABASE_URL=postgres://... cargo test --test integration -- --ignored`

mod helpers;

mod export_test;
mod http_test;
mod role_test;
mod user_test;
