//! Query-string parsing and pagination maths shared by every list endpoint.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Search terms shorter than this are ignored and the full set is returned.
pub const MIN_SEARCH_CHARS: usize = 2;

/// Raw `search` / `page` / `limit` query parameters.
///
/// Numbers are kept as strings so that garbage input degrades to the defaults
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A normalized page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    search: Option<String>,
    page: i64,
    limit: i64,
}

impl PageRequest {
    pub fn new(search: Option<String>, page: i64, limit: i64) -> Self {
        let page = if page < 1 { DEFAULT_PAGE } else { page };
        let limit = if limit < 1 {
            DEFAULT_LIMIT
        } else {
            limit.min(MAX_LIMIT)
        };
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| s.chars().count() >= MIN_SEARCH_CHARS);
        Self {
            search,
            page,
            limit,
        }
    }

    pub fn from_query(query: &ListQuery) -> Self {
        let parse = |value: &Option<String>, default: i64| {
            value
                .as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };
        Self::new(
            query.search.clone(),
            parse(&query.page, DEFAULT_PAGE),
            parse(&query.limit, DEFAULT_LIMIT),
        )
    }

    /// The effective search term, present only when it is long enough to filter on.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Lowercased `%term%` with LIKE wildcards escaped (escape character `\`).
    ///
    /// Matched against the lowercased `search_text` column each table keeps.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let mut escaped = String::with_capacity(term.len() + 2);
            escaped.push('%');
            for c in term.to_lowercase().chars() {
                if matches!(c, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('%');
            escaped
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Stable key used by the list caches.
    pub fn cache_key(&self) -> String {
        format!(
            "search={}&page={}&limit={}",
            self.search.as_deref().unwrap_or(""),
            self.page,
            self.limit
        )
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, request: &PageRequest) -> Self {
        let limit = request.limit();
        Self {
            total,
            page: request.page(),
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// One page of records plus its summary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            pagination: Pagination::new(total, request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: Option<&str>, page: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            search: search.map(str::to_string),
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_to_missing_and_garbage_values() {
        let request = PageRequest::from_query(&query(None, Some("abc"), Some("-4")));
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn limit_is_capped() {
        let request = PageRequest::from_query(&query(None, Some("3"), Some("5000")));
        assert_eq!(request.limit(), MAX_LIMIT);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn single_character_search_does_not_filter() {
        assert_eq!(PageRequest::from_query(&query(Some("P"), None, None)).search(), None);
        assert_eq!(PageRequest::from_query(&query(Some("  "), None, None)).search(), None);
        assert_eq!(
            PageRequest::from_query(&query(Some(" Ph "), None, None)).search(),
            Some("Ph")
        );
    }

    #[test]
    fn multibyte_terms_count_characters() {
        // "Ư" is two bytes but one character
        assert_eq!(PageRequest::new(Some("Ư".into()), 1, 10).search(), None);
        assert_eq!(PageRequest::new(Some("Ưu".into()), 1, 10).search(), Some("Ưu"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let request = PageRequest::new(Some("50%_Off".into()), 1, 10);
        assert_eq!(request.like_pattern().as_deref(), Some("%50\\%\\_off%"));
        let request = PageRequest::new(Some("PHƯỜNG".into()), 1, 10);
        assert_eq!(request.like_pattern().as_deref(), Some("%phường%"));
    }

    #[test]
    fn total_pages_is_ceiling() {
        let request = PageRequest::new(None, 1, 10);
        assert_eq!(Pagination::new(0, &request).total_pages, 0);
        assert_eq!(Pagination::new(10, &request).total_pages, 1);
        assert_eq!(Pagination::new(11, &request).total_pages, 2);
        assert_eq!(Pagination::new(25, &PageRequest::new(None, 1, 7)).total_pages, 4);
    }
}
