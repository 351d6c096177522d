//! Per-resource shaping hooks.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use backoffice_core::types::{Columns, ExportFormat, Row};

/// Resource-specific pieces plugged into [`BaseService`](crate::BaseService).
///
/// [`to_row`](ResourceProfile::to_row) is the single row shape used by the
/// index table, the selected listing and every export format; exports only
/// narrow it to the chosen columns.
pub trait ResourceProfile: Send + Sync + 'static {
    /// Entity the rows are built from.
    type Entity: Send + Sync + 'static;

    /// Route and permission prefix, also the export filename stem.
    const RESOURCE: &'static str;

    /// Flatten an entity into a row.
    fn to_row(entity: &Self::Entity) -> Row;

    /// Columns exported when the caller does not choose any.
    fn export_columns() -> Columns;

    /// Download filename, e.g. `users_export_20250101_093000.csv`.
    fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
        format!(
            "{}_export_{}.{}",
            Self::RESOURCE,
            now.format("%Y%m%d_%H%M%S"),
            format.extension()
        )
    }
}

/// Timestamp in the list/export row shape (microsecond precision, `Z`).
pub(crate) fn row_timestamp(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Timestamp in the show-view shape (millisecond precision, `Z`).
pub(crate) fn item_timestamp(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Widgets;

    impl ResourceProfile for Widgets {
        type Entity = ();
        const RESOURCE: &'static str = "widgets";

        fn to_row(_: &()) -> Row {
            Row::new()
        }

        fn export_columns() -> Columns {
            Columns::default()
        }
    }

    #[test]
    fn test_default_filename_pattern() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            Widgets::export_filename(ExportFormat::Xlsx, now),
            "widgets_export_20250309_140507.xlsx"
        );
    }

    #[test]
    fn test_timestamp_shapes() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(row_timestamp(&ts), "2025-01-02T03:04:05.000000Z");
        assert_eq!(item_timestamp(&ts), "2025-01-02T03:04:05.000Z");
    }
}
