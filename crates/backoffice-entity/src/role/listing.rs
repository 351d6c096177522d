//! Listing allow-lists for roles.

use backoffice_core::types::filter::{FilterKind, FilterSpec, ListSpec, STATUS_FILTER, TRASHED_FILTER};

/// Sort columns and filters accepted by the roles index.
pub const ROLE_LIST_SPEC: ListSpec = ListSpec {
    sortable: &[
        "id",
        "name",
        "guard_name",
        "is_active",
        "permissions_count",
        "created_at",
    ],
    filters: &[
        STATUS_FILTER,
        TRASHED_FILTER,
        FilterSpec {
            key: "guard_name",
            kind: FilterKind::Text,
        },
    ],
};
