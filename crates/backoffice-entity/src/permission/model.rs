//! Permission entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named permission granted through roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Primary key.
    pub id: i64,
    /// Dotted name, e.g. `roles.update`.
    pub name: String,
    /// Guard the permission belongs to.
    pub guard_name: String,
    /// Human description shown in role forms.
    pub description: Option<String>,
    /// When the permission was created.
    pub created_at: DateTime<Utc>,
}

/// `{id, name}` reference embedded in show views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PermissionRef {
    /// Primary key.
    pub id: i64,
    /// Name.
    pub name: String,
}
