//! Paged access to list endpoints.
//!
//! The Web API pages with `p` (1-based) and `ps`, and reports a `paging`
//! block (`pageIndex`, `pageSize`, `total`). Some older endpoints report
//! `p`, `ps` and `total` at the top level instead; both shapes are read.

use crate::error::{ApiError, ApiResult};
use crate::transport::{BackendRequest, HttpTransport};
use serde_json::{json, Value};

/// Page size used when aggregating a full result set.
pub const AGGREGATION_PAGE_SIZE: u32 = 100;

/// A single page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Index one past the last item this page can contain.
    pub fn window_end(&self) -> u64 {
        self.page.saturating_mul(u64::from(self.page_size))
    }

    /// Reject pages that reach past the item cap.
    pub fn check_cap(&self, cap: usize) -> ApiResult<()> {
        if self.window_end() > cap as u64 {
            return Err(ApiError::ResultTooLarge {
                total: self.window_end(),
                cap,
            });
        }
        Ok(())
    }

    /// Attach `p`/`ps` to a request.
    pub fn apply(&self, request: BackendRequest) -> BackendRequest {
        request.param("p", self.page).param("ps", self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// Paging information reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Paging {
    fn from_body(body: &Value) -> Option<Self> {
        let (block, index, size) = match body.get("paging") {
            Some(paging) => (paging, "pageIndex", "pageSize"),
            None => (body, "p", "ps"),
        };

        Some(Self {
            page_index: u32::try_from(block.get(index)?.as_u64()?).ok()?,
            page_size: u32::try_from(block.get(size)?.as_u64()?).ok()?,
            total: block.get("total")?.as_u64()?,
        })
    }
}

/// One decoded page.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub paging: Option<Paging>,
}

impl Page {
    pub fn from_body(body: &Value, items_key: &str) -> ApiResult<Self> {
        let items = match body.get(items_key) {
            Some(Value::Array(items)) => items.clone(),
            Some(_) | None => {
                return Err(ApiError::BackendUnavailable {
                    status: None,
                    message: format!("response has no '{}' list", items_key),
                })
            }
        };

        Ok(Self {
            items,
            paging: Paging::from_body(body),
        })
    }

    fn is_last(&self) -> bool {
        match self.paging {
            Some(paging) => {
                self.items.is_empty()
                    || u64::from(paging.page_index) * u64::from(paging.page_size) >= paging.total
            }
            None => true,
        }
    }
}

/// Lazy, finite, restartable sequence of pages over one list endpoint.
pub struct Pages {
    transport: HttpTransport,
    request: BackendRequest,
    items_key: &'static str,
    page_size: u32,
    next: Option<u64>,
}

impl Pages {
    pub fn new(
        transport: HttpTransport,
        request: BackendRequest,
        items_key: &'static str,
        page_size: u32,
    ) -> Self {
        Self {
            transport,
            request,
            items_key,
            page_size,
            next: Some(1),
        }
    }

    /// Fetch the next page, or `None` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> ApiResult<Option<Page>> {
        let Some(index) = self.next else {
            return Ok(None);
        };

        let request = PageRequest::new(index, self.page_size).apply(self.request.clone());
        let body = self.transport.get_json(request).await?;
        let page = Page::from_body(&body, self.items_key)?;

        self.next = if page.is_last() { None } else { Some(index + 1) };
        Ok(Some(page))
    }

    /// Start again from the first page.
    pub fn reset(&mut self) {
        self.next = Some(1);
    }

    /// Walk every page from the start and gather all items, failing as soon
    /// as the reported total exceeds `cap`.
    pub async fn collect_all(&mut self, cap: usize) -> ApiResult<Vec<Value>> {
        self.reset();
        let mut items = Vec::new();

        while let Some(page) = self.next_page().await? {
            let total = page
                .paging
                .map(|p| p.total)
                .unwrap_or((items.len() + page.items.len()) as u64);
            if total > cap as u64 {
                return Err(ApiError::ResultTooLarge { total, cap });
            }
            items.extend(page.items);
        }

        Ok(items)
    }

    /// Aggregate everything into `{"total": n, "<items_key>": [...]}`.
    pub async fn collect_json(&mut self, cap: usize) -> ApiResult<Value> {
        let items = self.collect_all(cap).await?;
        let mut body = json!({ "total": items.len() });
        body[self.items_key] = Value::Array(items);
        Ok(body)
    }
}
