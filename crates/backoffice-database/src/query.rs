//! Shared SQL fragments for listing queries.
//!
//! Repositories start a [`QueryBuilder`] with `... WHERE TRUE` and append
//! the clauses below. Sort columns are mapped through a fixed table of SQL
//! expressions, so a request can never inject an arbitrary column name.

use sqlx::{Postgres, QueryBuilder};

use backoffice_core::types::{FilterValue, ListQuery, SortDirection};

/// Map from public sort key to the SQL expression it orders by.
pub type SortColumns = &'static [(&'static str, &'static str)];

/// Apply the `trashed` filter. Without it, soft-deleted rows are hidden.
pub fn push_trashed(builder: &mut QueryBuilder<'_, Postgres>, alias: &str, query: &ListQuery) {
    match query.filter("trashed").and_then(FilterValue::as_text) {
        Some("with") => {}
        Some("only") => {
            builder.push(format!(" AND {alias}.deleted_at IS NOT NULL"));
        }
        _ => {
            builder.push(format!(" AND {alias}.deleted_at IS NULL"));
        }
    }
}

/// Apply the `status` filter (`active` / `inactive`) to `is_active`.
pub fn push_status(builder: &mut QueryBuilder<'_, Postgres>, alias: &str, query: &ListQuery) {
    let wanted = match query.filter("status") {
        Some(FilterValue::Text(s)) if s == "active" => Some(true),
        Some(FilterValue::Text(s)) if s == "inactive" => Some(false),
        Some(FilterValue::Bool(b)) => Some(*b),
        _ => None,
    };
    if let Some(active) = wanted {
        builder.push(format!(" AND {alias}.is_active = "));
        builder.push_bind(active);
    }
}

/// Apply a case-insensitive substring search over `columns`.
pub fn push_search(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], query: &ListQuery) {
    let Some(q) = query.q() else {
        return;
    };
    if columns.is_empty() {
        return;
    }
    let pattern = format!("%{}%", escape_like(q));
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(format!("{column} ILIKE "));
        builder.push_bind(pattern.clone());
    }
    builder.push(")");
}

/// Append `ORDER BY` using the allow-listed sort key, falling back to
/// `default_expr`, with the primary key as tie-breaker.
pub fn push_order(
    builder: &mut QueryBuilder<'_, Postgres>,
    columns: SortColumns,
    default_expr: &str,
    primary_key: &str,
    query: &ListQuery,
) {
    let expr = query
        .sort()
        .and_then(|key| columns.iter().find(|(k, _)| *k == key))
        .map(|(_, expr)| *expr)
        .unwrap_or(default_expr);
    let dir = query.direction().as_sql();
    builder.push(format!(" ORDER BY {expr} {dir}"));
    if expr != primary_key {
        builder.push(format!(", {primary_key} {}", SortDirection::Desc.as_sql()));
    }
}

/// Append `LIMIT`/`OFFSET` for the query's page.
pub fn push_page(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    builder.push(" LIMIT ");
    builder.push_bind(query.limit());
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
}

/// Escape `%`, `_` and `\` so user input matches literally in `LIKE`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
