//! Cursor pagination
//!
//! List endpoints called with `_metaData=true` wrap their rows as
//! `{ "data": [...], "links": { "next": url?, "previous": url? } }`. Each
//! link's query string is an opaque token set that fetches the adjacent
//! page when sent back verbatim.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::descriptor::RequestDescriptor;
use crate::error::{RestError, RestResult};

/// Page sizes the venue accepts
pub const PAGE_SIZE_TIERS: [u32; 4] = [5, 25, 50, 100];

/// Which way a cursor moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorDirection {
    Next,
    Previous,
}

/// Opaque token set taken from a pagination link
///
/// A cursor always carries at least one pair; an exhausted direction is
/// represented by `None` rather than an empty cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    direction: CursorDirection,
    token: BTreeMap<String, String>,
}

impl PageCursor {
    /// Parse the query string of `link`
    ///
    /// Returns `None` when the link has no query or the query is empty.
    pub fn from_link(direction: CursorDirection, link: &str) -> Option<Self> {
        let (_, query) = link.split_once('?')?;
        let query = query.split('#').next().unwrap_or_default();
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        let token: BTreeMap<String, String> = pairs.into_iter().collect();

        if token.is_empty() {
            None
        } else {
            Some(Self { direction, token })
        }
    }

    pub fn direction(&self) -> CursorDirection {
        self.direction
    }

    pub fn token(&self) -> &BTreeMap<String, String> {
        &self.token
    }

    /// Value of one token entry, e.g. `_nextPage`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.token.get(key).map(String::as_str)
    }
}

/// Cursors for both directions of one response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLinks {
    pub previous: Option<PageCursor>,
    pub next: Option<PageCursor>,
}

impl PageLinks {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Build cursors from a `links` object
///
/// Missing, `null` or non-string links yield `None`.
pub fn build_cursor(links: &Value) -> PageLinks {
    let cursor = |key: &str, direction| {
        links
            .get(key)
            .and_then(Value::as_str)
            .and_then(|link| PageCursor::from_link(direction, link))
    };

    PageLinks {
        previous: cursor("previous", CursorDirection::Previous),
        next: cursor("next", CursorDirection::Next),
    }
}

/// Round a requested page size up to the next accepted tier
///
/// `None` means "emit no page-size parameter".
pub fn page_size_for(requested: Option<u32>) -> Option<u32> {
    let requested = requested?;
    Some(
        PAGE_SIZE_TIERS
            .iter()
            .copied()
            .find(|tier| requested <= *tier)
            .unwrap_or(PAGE_SIZE_TIERS[PAGE_SIZE_TIERS.len() - 1]),
    )
}

/// Pagination parameters for a list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested rows per page, normalised by [`page_size_for`]
    pub page_size: Option<u32>,
    /// Lower bound on `createdAtTimestamp`, in milliseconds
    pub since: Option<u64>,
    /// Cursor from a previous page
    pub cursor: Option<PageCursor>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_since(mut self, since_ms: u64) -> Self {
        self.since = Some(since_ms);
        self
    }

    pub fn with_cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Add the pagination parameters to `descriptor`
    ///
    /// Cursor pairs are applied last so they override anything else.
    pub fn apply(&self, descriptor: RequestDescriptor) -> RequestDescriptor {
        let mut descriptor = descriptor
            .param("_metaData", "true")
            .param_opt("_pageSize", page_size_for(self.page_size))
            .param_opt("createdAtTimestamp[gte]", self.since);

        if let Some(cursor) = &self.cursor {
            for (key, value) in cursor.token() {
                descriptor = descriptor.param(key, value.as_str());
            }
        }
        descriptor
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
}

impl Page<Value> {
    /// Split a `_metaData=true` response into rows and cursors
    pub fn from_response(response: Value) -> RestResult<Self> {
        let links = response
            .get("links")
            .map(build_cursor)
            .unwrap_or_default();

        let data = match response {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => rows,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(RestError::Parse(format!(
                        "expected an array under 'data', got {other}"
                    )))
                }
            },
            // Without metadata the venue answers with the bare array
            Value::Array(rows) => rows,
            other => {
                return Err(RestError::Parse(format!(
                    "expected a paginated object, got {other}"
                )))
            }
        };

        Ok(Self { data, links })
    }
}

impl<T> Page<T> {
    /// Request for the following page, keeping `base`'s other settings
    pub fn next_request(&self, base: &PageRequest) -> Option<PageRequest> {
        self.links.next.clone().map(|cursor| PageRequest {
            cursor: Some(cursor),
            ..base.clone()
        })
    }

    /// Request for the preceding page
    pub fn previous_request(&self, base: &PageRequest) -> Option<PageRequest> {
        self.links.previous.clone().map(|cursor| PageRequest {
            cursor: Some(cursor),
            ..base.clone()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint;
    use serde_json::json;

    #[test]
    fn test_page_size_tiers() {
        assert_eq!(page_size_for(Some(1)), Some(5));
        assert_eq!(page_size_for(Some(5)), Some(5));
        assert_eq!(page_size_for(Some(6)), Some(25));
        assert_eq!(page_size_for(Some(25)), Some(25));
        assert_eq!(page_size_for(Some(26)), Some(50));
        assert_eq!(page_size_for(Some(50)), Some(50));
        assert_eq!(page_size_for(Some(51)), Some(100));
        assert_eq!(page_size_for(Some(1_000)), Some(100));
        assert_eq!(page_size_for(None), None);
    }

    #[test]
    fn test_build_cursor_next_only() {
        let links = build_cursor(&json!({ "next": "https://x/orders?_nextPage=abc123" }));

        let next = links.next.expect("next cursor");
        assert_eq!(next.direction(), CursorDirection::Next);
        assert_eq!(next.token().len(), 1);
        assert_eq!(next.get("_nextPage"), Some("abc123"));
        assert!(links.previous.is_none());
    }

    #[test]
    fn test_build_cursor_ignores_empty_links() {
        let links = build_cursor(&json!({
            "next": null,
            "previous": "https://x/orders",
        }));
        assert_eq!(links, PageLinks::default());

        let links = build_cursor(&json!({ "next": "https://x/orders?" }));
        assert!(!links.has_next());
    }

    #[test]
    fn test_cursor_decodes_query() {
        let cursor = PageCursor::from_link(
            CursorDirection::Previous,
            "/trading-api/v2/orders?_previousPage=a%2Bb&_pageSize=25&symbol=BTCUSDC",
        )
        .unwrap();
        assert_eq!(cursor.get("_previousPage"), Some("a+b"));
        assert_eq!(cursor.get("_pageSize"), Some("25"));
        assert_eq!(cursor.get("symbol"), Some("BTCUSDC"));
    }

    #[test]
    fn test_page_request_apply() {
        let cursor =
            PageCursor::from_link(CursorDirection::Next, "https://x/orders?_nextPage=abc").unwrap();
        let request = PageRequest::new()
            .with_page_size(30)
            .with_since(1_700_000_000_000)
            .with_cursor(cursor);

        let desc = request.apply(RequestDescriptor::for_endpoint(endpoint::ORDERS));
        let params = &desc.parts().params;
        assert_eq!(params["_metaData"], json!("true"));
        assert_eq!(params["_pageSize"], json!(50));
        assert_eq!(params["createdAtTimestamp[gte]"], json!(1_700_000_000_000u64));
        assert_eq!(params["_nextPage"], json!("abc"));
    }

    #[test]
    fn test_page_without_size_emits_no_size() {
        let desc = PageRequest::new().apply(RequestDescriptor::for_endpoint(endpoint::TRADES));
        assert!(!desc.parts().params.contains_key("_pageSize"));
    }

    #[test]
    fn test_page_from_response() {
        let page = Page::from_response(json!({
            "data": [{ "orderId": "1" }, { "orderId": "2" }],
            "links": { "next": "https://x/orders?_nextPage=n2", "previous": null }
        }))
        .unwrap();

        assert_eq!(page.len(), 2);
        let base = PageRequest::new().with_page_size(25);
        let next = page.next_request(&base).unwrap();
        assert_eq!(next.page_size, Some(25));
        assert_eq!(next.cursor.unwrap().get("_nextPage"), Some("n2"));
        assert!(page.previous_request(&base).is_none());
    }

    #[test]
    fn test_page_from_bare_array() {
        let page = Page::from_response(json!([{ "id": 1 }])).unwrap();
        assert_eq!(page.len(), 1);
        assert!(!page.links.has_next());

        assert!(matches!(
            Page::from_response(json!({ "data": "oops" })),
            Err(RestError::Parse(_))
        ));
    }
}
