use reqwest::header::{HeaderMap, LINK};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

pub const DEFAULT_PER_PAGE: u32 = 100;

/// One page of a listing plus what the server told us about the rest.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Items on this page
    pub count: usize,
    pub total_count: Option<u64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub total_pages: Option<u32>,
    /// Verbatim `rel="next"` URL, `None` once the listing is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Where this page was fetched from, query string included
    #[serde(skip)]
    pub url: Option<String>,
}

impl PaginationMeta {
    pub fn from_headers(headers: &HeaderMap, count: usize) -> Self {
        let total_count = header_number::<u64>(headers, "x-total");
        let page = header_number::<u32>(headers, "x-page");
        let per_page = header_number::<u32>(headers, "x-per-page");
        let total_pages = header_number::<u32>(headers, "x-total-pages").or_else(|| {
            match (total_count, per_page) {
                (Some(total), Some(per)) if per > 0 => {
                    Some(total.div_ceil(u64::from(per)) as u32)
                }
                _ => None,
            }
        });

        let next = headers
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| find_link(value, "next"));

        Self {
            count,
            total_count,
            page,
            per_page,
            total_pages,
            next,
            url: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Forward-only position in a paginated listing.
///
/// A `next` link is refused when its `page` parameter is not past the current
/// page or when its URL was already fetched. A fetched page is refused when its
/// `X-Page` does not move forward.
#[derive(Debug)]
pub struct PageCursor {
    visited: HashSet<String>,
    current: u32,
}

impl PageCursor {
    pub fn new(first: &PaginationMeta) -> Self {
        let mut visited = HashSet::new();
        if let Some(url) = &first.url {
            visited.insert(url.clone());
        }
        Self {
            visited,
            current: first.page.unwrap_or(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// The link to follow after `meta`, or `None` once the listing is over.
    pub fn next_link(&mut self, meta: &PaginationMeta) -> Option<String> {
        let next = meta.next.as_deref()?;
        if link_page(next).is_some_and(|page| page <= self.current) {
            tracing::warn!(url = %next, current = self.current, "Pagination link goes backwards, stopping");
            return None;
        }
        if !self.visited.insert(next.to_string()) {
            tracing::warn!(url = %next, "Pagination link points to an already fetched page");
            return None;
        }
        Some(next.to_string())
    }

    /// Records a fetched page. Returns `false` if it does not advance the listing.
    pub fn accept(&mut self, meta: &PaginationMeta) -> bool {
        let page = meta.page.unwrap_or(self.current + 1);
        if page <= self.current {
            tracing::warn!(page, current = self.current, "Server returned an earlier page, stopping");
            return false;
        }
        self.current = page;
        if let Some(url) = &meta.url {
            self.visited.insert(url.clone());
        }
        true
    }
}

fn link_page(link: &str) -> Option<u32> {
    let url = Url::parse(link).ok()?;
    let (_, page) = url.query_pairs().find(|(key, _)| key == "page")?;
    page.parse().ok()
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Finds the target of the link with the given `rel` in an RFC 8288 `Link` value.
///
/// Targets are delimited by angle brackets, so commas inside a URL
/// (e.g. `range[level]=6,9`) do not split an entry.
pub fn find_link(header: &str, rel: &str) -> Option<String> {
    let mut rest = header;
    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let close = after_open.find('>')?;
        let target = &after_open[..close];
        let params_start = &after_open[close + 1..];
        let params_end = params_start.find('<').unwrap_or(params_start.len());
        let params = &params_start[..params_end];

        let matches = params
            .split(';')
            .filter_map(|param| param.trim().split_once('='))
            .any(|(key, value)| {
                key.trim().eq_ignore_ascii_case("rel")
                    && value
                        .trim()
                        .trim_matches('"')
                        .split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case(rel))
            });
        if matches {
            return Some(target.to_string());
        }
        rest = &params_start[params_end..];
    }
    None
}
