//! Page/limit normalisation for list endpoints.
//!
//! Parsing is total: any input, however malformed, yields a valid window.
//! Zero and non-numeric values count as absent and fall back to the
//! defaults, matching how the platform's list endpoints read `page`/`limit`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw, caller-supplied pagination parameters as they arrive on a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn new(page: impl ToString, limit: impl ToString) -> Self {
        Self {
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub page: u32,
    pub limit: u32,
    pub skip: u64,
}

impl PaginationQuery {
    pub fn first_page(limit: u32) -> Self {
        parse(&PageParams::new(DEFAULT_PAGE, limit))
    }

    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// List endpoint envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Lenient integer read: plain integers, then decimals truncated toward
/// zero. Anything else, and zero itself, is treated as missing.
fn lenient_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let value = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })?;
    (value != 0).then_some(value)
}

pub fn parse(params: &PageParams) -> PaginationQuery {
    let page = lenient_int(params.page.as_deref())
        .unwrap_or(i64::from(DEFAULT_PAGE))
        .clamp(1, i64::from(u32::MAX)) as u32;
    let limit = lenient_int(params.limit.as_deref())
        .unwrap_or(i64::from(DEFAULT_LIMIT))
        .clamp(1, i64::from(MAX_LIMIT)) as u32;

    PaginationQuery {
        page,
        limit,
        skip: u64::from(page - 1) * u64::from(limit),
    }
}

/// Parses a raw `page=2&limit=20` query string. Unknown keys are ignored;
/// when a key repeats the first occurrence wins.
pub fn parse_query_string(query: &str) -> PaginationQuery {
    let mut params = PageParams::default();
    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            "page" if params.page.is_none() => params.page = Some(value.into_owned()),
            "limit" if params.limit.is_none() => params.limit = Some(value.into_owned()),
            _ => {}
        }
    }
    parse(&params)
}

pub fn build_meta(page: u32, limit: u32, total: u64) -> PaginationMeta {
    let total_pages = total.div_ceil(u64::from(limit.max(1)));
    PaginationMeta {
        page,
        limit,
        total,
        total_pages,
        has_next_page: u64::from(page) < total_pages,
        has_prev_page: page > 1,
    }
}

/// Serves one page of an in-memory list.
pub fn paginate<T: Clone>(items: &[T], query: PaginationQuery) -> Paginated<T> {
    let start = usize::try_from(query.skip).unwrap_or(usize::MAX).min(items.len());
    let end = start.saturating_add(query.limit as usize).min(items.len());
    Paginated {
        data: items[start..end].to_vec(),
        pagination: build_meta(query.page, query.limit, items.len() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_params() {
        let query = parse(&PageParams::default());
        assert_eq!(
            query,
            PaginationQuery {
                page: 1,
                limit: 10,
                skip: 0
            }
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let query = parse(&PageParams::new(-5, 9999));
        assert_eq!(
            query,
            PaginationQuery {
                page: 1,
                limit: 100,
                skip: 0
            }
        );
    }

    #[test]
    fn non_numeric_and_zero_fall_back_to_defaults() {
        assert_eq!(parse(&PageParams::new("abc", "")).limit, DEFAULT_LIMIT);
        assert_eq!(parse(&PageParams::new(0, 0)), parse(&PageParams::default()));
        assert_eq!(parse(&PageParams::new("3.9", "-2")).page, 3);
        assert_eq!(parse(&PageParams::new("3.9", "-2")).limit, 1);
    }

    #[test]
    fn skip_follows_page_and_limit() {
        let query = parse(&PageParams::new(4, 25));
        assert_eq!(query.skip, 75);
        assert_eq!(parse_query_string("?page=3&limit=20&sort=views").skip, 40);
        assert_eq!(parse_query_string("limit=5&limit=50").limit, 5);
    }

    #[test]
    fn meta_for_empty_total() {
        let meta = build_meta(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn meta_pages_match_ceiling_division() {
        for total in 0..=250u64 {
            for limit in [1u32, 3, 10, 100] {
                for page in [1u32, 2, 5] {
                    let meta = build_meta(page, limit, total);
                    let expected = (total + u64::from(limit) - 1) / u64::from(limit);
                    assert_eq!(meta.total_pages, expected);
                    assert_eq!(meta.has_next_page, u64::from(page) < expected);
                    assert_eq!(meta.has_prev_page, page > 1);
                }
            }
        }
    }

    #[test]
    fn paginate_slices_and_reports_meta() {
        let items: Vec<u32> = (1..=23).collect();

        let page = paginate(&items, parse(&PageParams::new(3, 10)));
        assert_eq!(page.data, vec![21, 22, 23]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(!page.pagination.has_next_page);

        let past_end = paginate(&items, parse(&PageParams::new(9, 10)));
        assert!(past_end.data.is_empty());
        assert!(past_end.pagination.has_prev_page);
    }
}
