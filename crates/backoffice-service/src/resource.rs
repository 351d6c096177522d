//! The listing/export/bulk port consumed by the HTTP layer.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use backoffice_core::result::AppResult;
use backoffice_core::types::{ExportFormat, ListQuery, PageResult};
use backoffice_export::ByteStream;

/// A bulk lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Soft delete.
    Delete,
    /// Clear the soft-delete tombstone.
    Restore,
    /// Permanent removal.
    ForceDelete,
    /// Set the active flag to the given value.
    SetActive(bool),
}

impl BulkAction {
    /// Accepted `action` values, as sent by the index page.
    pub const NAMES: [&'static str; 4] = ["delete", "restore", "forceDelete", "setActive"];

    /// Parse an `action` value. `active` only matters for `setActive`.
    pub fn parse(action: &str, active: bool) -> Option<Self> {
        match action {
            "delete" => Some(Self::Delete),
            "restore" => Some(Self::Restore),
            "forceDelete" => Some(Self::ForceDelete),
            "setActive" => Some(Self::SetActive(active)),
            _ => None,
        }
    }

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::ForceDelete => "forceDelete",
            Self::SetActive(_) => "setActive",
        }
    }

    /// Plural past participle used in result messages.
    pub fn past_participle(&self) -> &'static str {
        match self {
            Self::Delete => "eliminados",
            Self::Restore => "restaurados",
            Self::ForceDelete => "eliminados permanentemente",
            Self::SetActive(true) => "activados",
            Self::SetActive(false) => "desactivados",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A streamed export ready to be sent as an attachment.
pub struct ExportDownload {
    /// Attachment filename, including the extension.
    pub filename: String,
    /// Encoded format.
    pub format: ExportFormat,
    /// File content.
    pub body: ByteStream,
}

impl ExportDownload {
    /// `Content-Type` of the body.
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

impl fmt::Debug for ExportDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportDownload")
            .field("filename", &self.filename)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Resource operations behind the generic index, export, bulk and selected
/// endpoints.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// One page of rows matching the query.
    async fn list(&self, query: &ListQuery) -> AppResult<PageResult>;

    /// One page of the given records, always ordered by id descending.
    async fn list_by_ids_desc(&self, ids: &[i64], page: u32, per_page: u32)
    -> AppResult<PageResult>;

    /// Stream every row matching the query in `format`.
    async fn export(&self, query: &ListQuery, format: ExportFormat) -> AppResult<ExportDownload>;

    /// Apply `action` to records addressed by primary key. Returns affected rows.
    async fn bulk_by_ids(&self, action: BulkAction, ids: &[i64]) -> AppResult<u64>;

    /// Apply `action` to records addressed by uuid. Returns affected rows.
    async fn bulk_by_uuids(&self, action: BulkAction, uuids: &[Uuid]) -> AppResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        for name in BulkAction::NAMES {
            assert_eq!(BulkAction::parse(name, true).map(|a| a.name()), Some(name));
        }
        assert_eq!(BulkAction::parse("archive", true), None);
    }

    #[test]
    fn test_set_active_participle_follows_flag() {
        assert_eq!(BulkAction::SetActive(true).past_participle(), "activados");
        assert_eq!(BulkAction::SetActive(false).past_participle(), "desactivados");
    }
}
