//! Row maps and export column selections.

use serde_json::Value;

/// A flat column-name to value mapping produced from an entity.
pub type Row = serde_json::Map<String, Value>;

/// An ordered column-key to header-label selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Columns {
    entries: Vec<(String, String)>,
}

impl Columns {
    /// Build a selection from `(key, label)` pairs, keeping their order.
    pub fn new<K, L>(entries: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, l)| (k.into(), l.into()))
                .collect(),
        }
    }

    /// Keep only the given keys, in this selection's order. Unknown keys are
    /// ignored.
    pub fn restrict<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keys.iter().any(|wanted| wanted.as_ref() == k))
                .cloned()
                .collect(),
        }
    }

    /// Column keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Header labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, l)| l.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no column is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Project a row onto the selected columns, in column order. Columns the
    /// row lacks are emitted as `null`.
    pub fn project(&self, row: &Row) -> Row {
        self.entries
            .iter()
            .map(|(k, _)| (k.clone(), row.get(k).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Row {
        json!({"id": 7, "name": "Ana", "email": "ana@example.com", "is_active": true})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_project_keeps_only_selected_columns_in_order() {
        let columns = Columns::new([("name", "Nombre"), ("id", "#")]);
        let projected = columns.project(&row());
        let keys: Vec<&String> = projected.keys().collect();
        assert_eq!(keys, ["name", "id"]);
        assert!(!projected.contains_key("email"));
    }

    #[test]
    fn test_missing_column_projects_null() {
        let columns = Columns::new([("roles_count", "Roles")]);
        assert_eq!(columns.project(&row())["roles_count"], Value::Null);
    }

    #[test]
    fn test_restrict_ignores_unknown_keys() {
        let columns = Columns::new([("id", "#"), ("name", "Nombre"), ("email", "Email")]);
        let picked = columns.restrict(&["email", "password", "id"]);
        assert_eq!(picked.keys().collect::<Vec<_>>(), ["id", "email"]);
        assert_eq!(picked.labels().collect::<Vec<_>>(), ["#", "Email"]);
    }
}
