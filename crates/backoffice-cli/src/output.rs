//! Table and JSON output for CLI commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled};

use backoffice_core::error::AppError;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print rows as a table or a JSON array
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table if items.is_empty() => println!("No results found."),
        OutputFormat::Table => println!("{}", Table::new(items)),
        OutputFormat::Json => match serde_json::to_string_pretty(items) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("✗ Failed to encode output: {e}"),
        },
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error to stderr, followed by its field errors
pub fn report_error(err: &AppError) {
    eprintln!("✗ {}", err.message);
    for line in field_error_lines(err) {
        eprintln!("{line}");
    }
}

fn field_error_lines(err: &AppError) -> Vec<String> {
    err.fields
        .iter()
        .flatten()
        .flat_map(|(field, messages)| {
            messages
                .iter()
                .map(move |message| format!("  {:<16} {message}", format!("{field}:")))
        })
        .collect()
}

/// `Sí`/`No` for table cells
pub fn yes_no(value: bool) -> String {
    if value { "Sí" } else { "No" }.to_string()
}

/// Minute-precision UTC timestamp for table cells
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use backoffice_core::error::FieldErrors;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_field_errors_are_listed_per_message() {
        let mut fields = FieldErrors::new();
        fields.insert(
            "password".into(),
            vec!["Too short.".into(), "Too common.".into()],
        );
        let lines = field_error_lines(&AppError::validation_fields(fields));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("password:"));
        assert!(lines[1].ends_with("Too common."));
    }

    #[test]
    fn test_cells() {
        assert_eq!(yes_no(true), "Sí");
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 59).unwrap();
        assert_eq!(timestamp(&at), "2026-03-01 09:05");
    }
}
