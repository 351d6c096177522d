//! Listing allow-lists for users.

use backoffice_core::types::filter::{FilterKind, FilterSpec, ListSpec, STATUS_FILTER, TRASHED_FILTER};

/// Sort columns and filters accepted by the users index.
pub const USER_LIST_SPEC: ListSpec = ListSpec {
    sortable: &["id", "name", "email", "is_active", "roles_count", "created_at"],
    filters: &[
        STATUS_FILTER,
        TRASHED_FILTER,
        FilterSpec {
            key: "role",
            kind: FilterKind::Text,
        },
    ],
};
