//! Query string parsing for listing endpoints.
//!
//! Query strings carry repeated keys (`ids[]=1&ids[]=2`) and bracketed
//! filter names (`filter[status]=active`), so they are read as raw pairs and
//! checked by hand against the resource's [`ListSpec`].
//! axum-extra's `Query` needs a fixed target struct, and bracketed filter
//! keys are open-ended, so it would not cover these.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;

use backoffice_core::config::ListingConfig;
use backoffice_core::error::{AppError, FieldErrors};
use backoffice_core::result::AppResult;
use backoffice_core::types::{ListQuery, ListSpec, SortDirection};

use crate::error::ApiError;

/// Raw query string pairs in request order. Repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(pub Vec<(String, String)>);

impl<S> FromRequestParts<S> for QueryPairs
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(Self(pairs))
    }
}

impl QueryPairs {
    /// Build from literal pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a list parameter: `key`, `key[]` and `key[n]`.
    pub fn list(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| is_list_key(k, key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// `filter.<name>` and `filter[<name>]` parameters.
    fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(k, v)| {
            let name = k
                .strip_prefix("filter.")
                .or_else(|| k.strip_prefix("filter[").and_then(|rest| rest.strip_suffix(']')))?;
            Some((name, v.as_str()))
        })
    }
}

fn is_list_key(candidate: &str, key: &str) -> bool {
    match candidate.strip_prefix(key) {
        Some("") | Some("[]") => true,
        Some(rest) => rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .is_some_and(|index| index.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

fn add(errors: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    errors.entry(field.into()).or_default().push(message.into());
}

fn parse_bounded(
    pairs: &QueryPairs,
    keys: &[&str],
    label: &str,
    min: u32,
    max: u32,
    errors: &mut FieldErrors,
) -> Option<u32> {
    let (key, raw) = keys
        .iter()
        .find_map(|k| pairs.get(k).map(|v| (*k, v.trim())))?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(v) if (min..=max).contains(&v) => Some(v),
        Ok(_) if max == u32::MAX => {
            add(errors, key, format!("The {label} field must be at least {min}."));
            None
        }
        Ok(_) => {
            add(errors, key, format!("The {label} field must be between {min} and {max}."));
            None
        }
        Err(_) => {
            add(errors, key, format!("The {label} field must be an integer."));
            None
        }
    }
}

/// Build the listing query for a resource.
///
/// Accepts `q`, `page`, `perPage` (or `per_page`), `sort`, `dir` and
/// `filter.*`. Unknown filter names are dropped; every other invalid value
/// is reported as a field error.
pub fn list_query(pairs: &QueryPairs, spec: &ListSpec, listing: &ListingConfig) -> AppResult<ListQuery> {
    let mut errors = FieldErrors::new();

    let page = parse_bounded(pairs, &["page"], "page", 1, u32::MAX, &mut errors).unwrap_or(1);
    let per_page = parse_bounded(
        pairs,
        &["perPage", "per_page"],
        "per page",
        1,
        listing.max_per_page,
        &mut errors,
    )
    .unwrap_or(listing.default_per_page);

    let q = pairs.get("q").map(str::to_string);
    if q.as_deref().is_some_and(|q| q.chars().count() > 255) {
        add(&mut errors, "q", "The q field must not be greater than 255 characters.");
    }

    let sort = pairs
        .get("sort")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(field) = &sort {
        if !spec.is_sortable(field) {
            add(&mut errors, "sort", "The selected sort is invalid.");
        }
    }

    let direction = match pairs.get("dir").map(str::trim).filter(|d| !d.is_empty()) {
        None => SortDirection::default(),
        Some(raw) => SortDirection::parse(raw).unwrap_or_else(|| {
            add(&mut errors, "dir", "The selected dir is invalid.");
            SortDirection::default()
        }),
    };

    let mut query = ListQuery::new(page, per_page)
        .with_search(q)
        .with_sort(sort, direction);

    for (name, raw) in pairs.filters() {
        let Some(filter) = spec.filter(name) else {
            continue;
        };
        match filter.parse(raw) {
            Ok(Some(value)) => query = query.with_filter(filter.key, value),
            Ok(None) => {}
            Err(message) => add(&mut errors, format!("filter.{name}"), message),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::validation_fields(errors));
    }
    Ok(query)
}

/// Parameters of the "selected rows" listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedParams {
    /// Requested primary keys.
    pub ids: Vec<i64>,
    /// Page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
}

/// Parse `ids[]` (required) together with optional `page` and `perPage`.
pub fn selected_params(pairs: &QueryPairs, listing: &ListingConfig) -> AppResult<SelectedParams> {
    let mut errors = FieldErrors::new();

    let raw_ids = pairs.list("ids");
    if raw_ids.is_empty() {
        add(&mut errors, "ids", "The ids field is required.");
    }
    let mut ids = Vec::with_capacity(raw_ids.len());
    for (i, raw) in raw_ids.iter().enumerate() {
        match raw.trim().parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => add(&mut errors, format!("ids.{i}"), format!("The ids.{i} field must be an integer.")),
        }
    }

    let page = parse_bounded(pairs, &["page"], "page", 1, u32::MAX, &mut errors).unwrap_or(1);
    let per_page = parse_bounded(
        pairs,
        &["perPage", "per_page"],
        "per page",
        1,
        listing.selected_max_per_page,
        &mut errors,
    )
    .unwrap_or(listing.default_per_page);

    if !errors.is_empty() {
        return Err(AppError::validation_fields(errors));
    }
    Ok(SelectedParams { ids, page, per_page })
}

#[cfg(test)]
mod tests {
    use backoffice_core::types::filter::{STATUS_FILTER, TRASHED_FILTER};
    use backoffice_core::types::FilterValue;

    use super::*;

    const SPEC: ListSpec = ListSpec {
        sortable: &["id", "name", "created_at"],
        filters: &[STATUS_FILTER, TRASHED_FILTER],
    };

    fn listing() -> ListingConfig {
        ListingConfig::default()
    }

    #[test]
    fn test_defaults() {
        let query = list_query(&QueryPairs::default(), &SPEC, &listing()).unwrap();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 15);
        assert_eq!(query.sort(), None);
        assert_eq!(query.direction(), SortDirection::Desc);
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_full_query() {
        let pairs = QueryPairs::from_pairs([
            ("q", " ana "),
            ("page", "3"),
            ("perPage", "50"),
            ("sort", "name"),
            ("dir", "ASC"),
            ("filter.status", "active"),
            ("filter[trashed]", "with"),
            ("filter.unknown", "x"),
        ]);
        let query = list_query(&pairs, &SPEC, &listing()).unwrap();
        assert_eq!(query.q(), Some("ana"));
        assert_eq!(query.page(), 3);
        assert_eq!(query.per_page(), 50);
        assert_eq!(query.sort(), Some("name"));
        assert_eq!(query.direction(), SortDirection::Asc);
        assert_eq!(query.filter("status"), Some(&FilterValue::Text("active".into())));
        assert_eq!(query.filter("trashed"), Some(&FilterValue::Text("with".into())));
        assert_eq!(query.filter("unknown"), None);
    }

    #[test]
    fn test_invalid_values_are_collected() {
        let pairs = QueryPairs::from_pairs([
            ("page", "0"),
            ("perPage", "101"),
            ("sort", "password"),
            ("dir", "sideways"),
            ("filter.status", "archived"),
        ]);
        let err = list_query(&pairs, &SPEC, &listing()).unwrap_err();
        let fields = err.fields.unwrap();
        assert_eq!(fields["page"], ["The page field must be at least 1."]);
        assert_eq!(fields["perPage"], ["The per page field must be between 1 and 100."]);
        assert_eq!(fields["sort"], ["The selected sort is invalid."]);
        assert_eq!(fields["dir"], ["The selected dir is invalid."]);
        assert!(fields.contains_key("filter.status"));
    }

    #[test]
    fn test_selected_reads_every_list_form() {
        let pairs = QueryPairs::from_pairs([("ids[]", "3"), ("ids[1]", "9"), ("ids", "4"), ("perPage", "2")]);
        let params = selected_params(&pairs, &listing()).unwrap();
        assert_eq!(params.ids, [3, 9, 4]);
        assert_eq!(params.per_page, 2);
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_selected_requires_ids_and_caps_per_page() {
        let err = selected_params(&QueryPairs::from_pairs([("perPage", "500")]), &listing()).unwrap_err();
        let fields = err.fields.unwrap();
        assert_eq!(fields["ids"], ["The ids field is required."]);
        assert!(fields.contains_key("perPage"));

        let err = selected_params(&QueryPairs::from_pairs([("ids[]", "x")]), &listing()).unwrap_err();
        assert!(err.fields.unwrap().contains_key("ids.0"));
    }

    #[test]
    fn test_list_key_matching() {
        assert!(is_list_key("ids", "ids"));
        assert!(is_list_key("ids[]", "ids"));
        assert!(is_list_key("ids[12]", "ids"));
        assert!(!is_list_key("idsx", "ids"));
        assert!(!is_list_key("ids[a]", "ids"));
    }
}
