//! Filter and sort allow-lists for listing queries.
//!
//! Each resource declares a [`ListSpec`] naming the columns that may be
//! sorted on and the filters it understands. The HTTP boundary rejects
//! other sort columns and drops other filter keys, so repositories only ever
//! see keys they know how to translate into SQL.

use serde::{Deserialize, Serialize};

/// A parsed filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A string value.
    Text(String),
}

impl FilterValue {
    /// Borrow the value as text, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// How a raw filter parameter is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `1|0|true|false|on|off|yes|no`.
    Boolean,
    /// A signed integer.
    Integer,
    /// Free text, trimmed.
    Text,
    /// One of a fixed set of lowercase choices.
    Choice(&'static [&'static str]),
}

/// A filter a resource accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    /// Parameter key, e.g. `status` for `filter.status`.
    pub key: &'static str,
    /// Value interpretation.
    pub kind: FilterKind,
}

impl FilterSpec {
    /// Parse a raw value according to this filter's kind.
    ///
    /// Empty values yield `Ok(None)` so blank form inputs are ignored.
    pub fn parse(&self, raw: &str) -> Result<Option<FilterValue>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match self.kind {
            FilterKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(Some(FilterValue::Bool(true))),
                "0" | "false" | "off" | "no" => Ok(Some(FilterValue::Bool(false))),
                _ => Err(format!("The {} filter must be true or false.", self.key)),
            },
            FilterKind::Integer => raw
                .parse::<i64>()
                .map(|v| Some(FilterValue::Int(v)))
                .map_err(|_| format!("The {} filter must be an integer.", self.key)),
            FilterKind::Text => Ok(Some(FilterValue::Text(raw.to_string()))),
            FilterKind::Choice(choices) => {
                let lowered = raw.to_ascii_lowercase();
                if choices.contains(&lowered.as_str()) {
                    Ok(Some(FilterValue::Text(lowered)))
                } else {
                    Err(format!(
                        "The {} filter must be one of: {}.",
                        self.key,
                        choices.join(", ")
                    ))
                }
            }
        }
    }
}

/// Sort and filter allow-lists for a resource.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    /// Columns accepted by the `sort` parameter.
    pub sortable: &'static [&'static str],
    /// Filters accepted as `filter.<key>` / `filter[<key>]`.
    pub filters: &'static [FilterSpec],
}

impl ListSpec {
    /// Whether `field` may be sorted on.
    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.contains(&field)
    }

    /// Look up a filter by key.
    pub fn filter(&self, key: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.key == key)
    }
}

/// `filter.status`: active or inactive rows.
pub const STATUS_FILTER: FilterSpec = FilterSpec {
    key: "status",
    kind: FilterKind::Choice(&["active", "inactive"]),
};

/// `filter.trashed`: include (`with`) or restrict to (`only`) soft-deleted rows.
pub const TRASHED_FILTER: FilterSpec = FilterSpec {
    key: "trashed",
    kind: FilterKind::Choice(&["with", "only"]),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_is_case_insensitive() {
        assert_eq!(
            STATUS_FILTER.parse("Active"),
            Ok(Some(FilterValue::Text("active".into())))
        );
        assert!(STATUS_FILTER.parse("archived").is_err());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        assert_eq!(TRASHED_FILTER.parse("  "), Ok(None));
    }

    #[test]
    fn test_boolean_and_integer_kinds() {
        let flag = FilterSpec {
            key: "flag",
            kind: FilterKind::Boolean,
        };
        assert_eq!(flag.parse("on"), Ok(Some(FilterValue::Bool(true))));
        assert!(flag.parse("maybe").is_err());

        let num = FilterSpec {
            key: "n",
            kind: FilterKind::Integer,
        };
        assert_eq!(num.parse("42"), Ok(Some(FilterValue::Int(42))));
        assert!(num.parse("4x").is_err());
    }
}
