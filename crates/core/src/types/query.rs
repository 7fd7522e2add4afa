//! Paging and filtering parameters for list endpoints.

use serde::{Deserialize, Serialize};

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Optional page/limit/search/sort parameters for `GET /users` and
/// `GET /posts`.
///
/// The API follows json-server conventions, so the wire names are `_page`,
/// `_limit`, `q`, `_sort` and `_order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl QueryParams {
    /// Parameters limiting a list to its first `limit` records.
    #[must_use]
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Whether no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.limit.is_none()
            && self.search.is_none()
            && self.sort.is_none()
            && self.order.is_none()
    }

    /// Query-string pairs in a stable order, skipping unset values.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("_page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("_limit", limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("q", search.to_string()));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("_sort", sort.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("_order", order.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_produce_no_pairs() {
        let params = QueryParams::default();
        assert!(params.is_empty());
        assert!(params.to_query_pairs().is_empty());
    }

    #[test]
    fn test_pairs_use_api_names_in_order() {
        let params = QueryParams {
            page: Some(2),
            limit: Some(5),
            search: Some("lorem".to_string()),
            sort: Some("title".to_string()),
            order: Some(SortOrder::Desc),
        };
        assert_eq!(
            params.to_query_pairs(),
            vec![
                ("_page", "2".to_string()),
                ("_limit", "5".to_string()),
                ("q", "lorem".to_string()),
                ("_sort", "title".to_string()),
                ("_order", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_skipped() {
        let params = QueryParams {
            search: Some(String::new()),
            ..QueryParams::limit(3)
        };
        assert_eq!(params.to_query_pairs(), vec![("_limit", "3".to_string())]);
    }
}
