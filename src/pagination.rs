use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Shared `page`/`limit`/`search` query parameters accepted by every list
/// endpoint. Entity-specific filters live in per-route query structs that
/// flatten this one. The numeric fields are kept as strings because flattened
/// urlencoded values always arrive as strings; parsing happens in `clamp`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    /// Clamps `page` to >= 1 and `limit` to [1, MAX_LIMIT], falling back to
    /// the defaults when absent or non-numeric.
    pub fn clamp(&self) -> (i64, i64) {
        let page = parse_param(&self.page).unwrap_or(DEFAULT_PAGE).max(1);
        let limit = parse_param(&self.limit)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        (page, limit)
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.clamp();
        (page - 1) * limit
    }

    /// Trimmed, non-empty search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn parse_param(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|raw| raw.trim().parse().ok())
}

/// Query-string flag: `true`/`1` (any case) means set.
pub fn flag_param(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1"
    )
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Escapes LIKE metacharacters so a user-supplied search term always matches
/// literally. Wildcards in the input are data, not pattern syntax.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
            search: None,
        }
    }

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(params(Some("0"), Some("1000")).clamp(), (1, MAX_LIMIT));
        assert_eq!(params(None, None).clamp(), (DEFAULT_PAGE, DEFAULT_LIMIT));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        assert_eq!(
            params(Some("abc"), Some("ten")).clamp(),
            (DEFAULT_PAGE, DEFAULT_LIMIT)
        );
    }

    #[test]
    fn computes_offset_from_clamped_values() {
        assert_eq!(params(Some("3"), Some("10")).offset(), 20);
    }

    #[test]
    fn parses_boolean_flags() {
        assert!(flag_param(&Some("true".to_string())));
        assert!(flag_param(&Some("1".to_string())));
        assert!(!flag_param(&Some("false".to_string())));
        assert!(!flag_param(&None));
    }

    #[test]
    fn rounds_pages_up() {
        assert_eq!(Pagination::new(1, 10, 25).pages, 3);
        assert_eq!(Pagination::new(1, 10, 30).pages, 3);
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn ignores_blank_search() {
        let params = ListParams {
            search: Some("   ".to_string()),
            ..ListParams::default()
        };
        assert_eq!(params.search_term(), None);
    }
}
