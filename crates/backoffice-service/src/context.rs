//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context for the current authenticated request.
///
/// Built by the HTTP layer from the resolved principal and passed into
/// service methods whose rules depend on *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's primary key.
    pub user_id: i64,
    /// Request correlation id, when the caller supplied or generated one.
    pub request_id: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: i64, request_id: Option<String>) -> Self {
        Self {
            user_id,
            request_id,
            request_time: Utc::now(),
        }
    }

    /// Whether the request acts on the user's own record.
    pub fn is_self(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}
