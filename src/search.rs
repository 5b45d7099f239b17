use tracing::warn;

use crate::error::{DictionaryError, DictionaryResult};
use crate::lookup::{LookupQuery, LookupSource};
use crate::model::LookupResponse;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const SEARCH_FAILED: &str = "Failed to fetch data. Please try again.";

/// Handle for one issued lookup; only the latest ticket may apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
    pub query: LookupQuery,
}

impl SearchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Query text, paging and the last applied results of the search view.
#[derive(Debug, Clone)]
pub struct SearchController {
    page_size: u32,
    query: Option<String>,
    page: u32,
    results: Option<LookupResponse>,
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl SearchController {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            query: None,
            page: 1,
            results: None,
            loading: false,
            error: None,
            issued: 0,
        }
    }

    /// Last submitted query text.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn results(&self) -> Option<&LookupResponse> {
        self.results.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Registers a request for `text` at `page` and returns its ticket.
    pub fn begin(&mut self, text: &str, page: u32) -> DictionaryResult<SearchTicket> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DictionaryError::validation("Search text is required"));
        }
        if page == 0 {
            return Err(DictionaryError::validation("Page must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(DictionaryError::validation("Page size must be positive"));
        }
        self.issued += 1;
        self.query = Some(text.to_string());
        self.page = page;
        self.loading = true;
        self.error = None;
        Ok(SearchTicket {
            seq: self.issued,
            query: LookupQuery::new(text).page(page).page_size(self.page_size),
        })
    }

    /// Applies the outcome of `ticket`; returns false when a newer request
    /// superseded it and the outcome was dropped.
    pub fn complete(
        &mut self,
        ticket: &SearchTicket,
        outcome: &DictionaryResult<LookupResponse>,
    ) -> bool {
        if ticket.seq != self.issued {
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(response) => {
                self.results = Some(response.clone());
                self.error = None;
            }
            Err(err) => {
                warn!(text = %ticket.query.text, error = %err, "Search failed");
                self.error = Some(SEARCH_FAILED.to_string());
            }
        }
        true
    }

    /// Runs one lookup end to end.
    pub async fn search<S>(
        &mut self,
        source: &S,
        text: &str,
        page: u32,
    ) -> DictionaryResult<LookupResponse>
    where
        S: LookupSource + ?Sized,
    {
        let ticket = self.begin(text, page)?;
        let outcome = source.lookup(&ticket.query).await;
        self.complete(&ticket, &outcome);
        outcome
    }

    /// New query text always starts from the first page.
    pub async fn submit<S>(&mut self, source: &S, text: &str) -> DictionaryResult<LookupResponse>
    where
        S: LookupSource + ?Sized,
    {
        self.search(source, text, 1).await
    }

    /// Re-runs the last submitted text at `page`.
    pub async fn go_to_page<S>(&mut self, source: &S, page: u32) -> DictionaryResult<LookupResponse>
    where
        S: LookupSource + ?Sized,
    {
        let text = self
            .query
            .clone()
            .ok_or_else(|| DictionaryError::validation("Search text is required"))?;
        self.search(source, &text, page).await
    }

    /// `None` when there is no following page.
    pub async fn next_page<S>(&mut self, source: &S) -> Option<DictionaryResult<LookupResponse>>
    where
        S: LookupSource + ?Sized,
    {
        let pagination = self.results.as_ref()?.pagination;
        if self.page >= pagination.total_pages {
            return None;
        }
        Some(self.go_to_page(source, self.page + 1).await)
    }

    /// `None` on the first page.
    pub async fn previous_page<S>(
        &mut self,
        source: &S,
    ) -> Option<DictionaryResult<LookupResponse>>
    where
        S: LookupSource + ?Sized,
    {
        if self.page <= 1 || self.query.is_none() {
            return None;
        }
        Some(self.go_to_page(source, self.page - 1).await)
    }
}
