//! Listing and pagination limits.

use serde::{Deserialize, Serialize};

/// Page-size bounds for list, selected and export queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page size used when the request does not specify one.
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
    /// Upper bound for `perPage` on index listings.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
    /// Upper bound for `perPage` on the selected-rows listing.
    #[serde(default = "default_max_per_page")]
    pub selected_max_per_page: u32,
    /// Rows fetched per round trip while streaming an export.
    #[serde(default = "default_export_page_size")]
    pub export_page_size: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            selected_max_per_page: default_max_per_page(),
            export_page_size: default_export_page_size(),
        }
    }
}

fn default_per_page() -> u32 {
    15
}

fn default_max_per_page() -> u32 {
    100
}

fn default_export_page_size() -> u32 {
    1000
}
