//! Paginated search state.
//!
//! A [`SearchSession`] owns the query, page cursor and accumulated results.
//! Fetching is split into [`SearchSession::begin`], which decides what to
//! request without touching the visible state, and [`SearchSession::complete`],
//! which commits a finished request. The TUI calls the two halves around a
//! spawned task; [`SearchSession::fetch_page`] runs them back to back.
//!
//! A new search supersedes whatever is outstanding. Completions for any
//! request other than the outstanding one are dropped, so a slow "load more"
//! from an old query can never land after the reset.
//!
//! "Load more" always continues the search whose results are on screen, even
//! if the query has been edited since or a later new search failed.

use anyhow::{Result, bail};
use tracing::{error, info, warn};

use crate::constants::constants;
use crate::dailymotion::{FetchError, SearchPage, VideoSearch, VideoSummary};

/// Observable search state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
  pub query_terms: String,
  /// Last page successfully fetched (1-indexed).
  pub current_page: u32,
  pub has_more_results: bool,
  pub results: Vec<VideoSummary>,
}

impl Default for SearchState {
  fn default() -> Self {
    Self {
      query_terms: constants().default_search.clone(),
      current_page: 1,
      has_more_results: true,
      results: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
  NewSearch,
  LoadMore,
}

/// A single outstanding page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub generation: u64,
  pub kind: FetchKind,
  pub page: u32,
  /// Effective search terms (default applied).
  pub terms: String,
}

/// What a completion did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  /// Results replaced or extended by `added` items.
  Page { added: usize },
  /// Request failed; state untouched.
  Failed,
  /// Request was superseded; state untouched.
  Stale,
}

#[derive(Debug, Default)]
pub struct SearchSession {
  state: SearchState,
  generation: u64,
  in_flight: Option<PageRequest>,
  /// Terms of the last new search that was applied.
  committed_terms: Option<String>,
}

impl SearchSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_query(query: impl Into<String>) -> Self {
    let mut session = Self::new();
    session.set_query(query);
    session
  }

  pub fn state(&self) -> &SearchState {
    &self.state
  }

  pub fn results(&self) -> &[VideoSummary] {
    &self.state.results
  }

  pub fn is_fetching(&self) -> bool {
    self.in_flight.is_some()
  }

  pub fn in_flight(&self) -> Option<&PageRequest> {
    self.in_flight.as_ref()
  }

  /// Set the terms used by the next new search. Does not fetch.
  pub fn set_query(&mut self, query: impl Into<String>) {
    self.state.query_terms = query.into();
  }

  /// Terms actually sent: the query, or the default search when blank.
  pub fn effective_terms(&self) -> String {
    let trimmed = self.state.query_terms.trim();
    if trimmed.is_empty() { constants().default_search.clone() } else { trimmed.to_string() }
  }

  /// Plan the next request and mark it outstanding.
  ///
  /// Returns `None` when there is nothing to do: the results are exhausted,
  /// or a "load more" is asked for while another fetch is outstanding.
  pub fn begin(&mut self, is_new_search: bool) -> Option<PageRequest> {
    let request = if is_new_search {
      self.generation += 1;
      if let Some(old) = self.in_flight.take() {
        info!(page = old.page, "superseding outstanding request");
      }
      PageRequest { generation: self.generation, kind: FetchKind::NewSearch, page: 1, terms: self.effective_terms() }
    } else {
      if !self.state.has_more_results {
        info!(query = %self.state.query_terms, "no more results");
        return None;
      }
      if self.in_flight.is_some() {
        return None;
      }
      PageRequest {
        generation: self.generation,
        kind: FetchKind::LoadMore,
        page: self.state.current_page + 1,
        terms: self.committed_terms.clone().unwrap_or_else(|| self.effective_terms()),
      }
    };
    self.in_flight = Some(request.clone());
    Some(request)
  }

  /// Commit the outcome of `request`.
  pub fn complete(&mut self, request: &PageRequest, outcome: Result<SearchPage, FetchError>) -> Applied {
    if self.in_flight.as_ref() != Some(request) {
      warn!(page = request.page, generation = request.generation, "dropping response for superseded request");
      return Applied::Stale;
    }
    self.in_flight = None;

    match outcome {
      Ok(page) => {
        let added = page.list.len();
        match request.kind {
          FetchKind::NewSearch => {
            self.state.results = page.list;
            self.committed_terms = Some(request.terms.clone());
          }
          FetchKind::LoadMore => self.state.results.extend(page.list),
        }
        self.state.current_page = request.page;
        self.state.has_more_results = page.has_more;
        info!(
          terms = %request.terms,
          page = request.page,
          added,
          total = self.state.results.len(),
          has_more = page.has_more,
          "search page applied"
        );
        Applied::Page { added }
      }
      Err(e) => {
        error!(terms = %request.terms, page = request.page, err = %e, "search page fetch failed");
        Applied::Failed
      }
    }
  }

  /// Forget `request` without a response (its task died). The state is
  /// left as is, like a failed fetch.
  pub fn abandon(&mut self, request: &PageRequest) {
    if self.in_flight.as_ref() == Some(request) {
      warn!(page = request.page, "search request abandoned");
      self.in_flight = None;
    }
  }

  /// Fetch one page through `backend`: a new search (`true`) or the next
  /// page of the current one (`false`).
  ///
  /// Returns `None` if no request was issued.
  pub async fn fetch_page<B: VideoSearch>(&mut self, backend: &B, is_new_search: bool) -> Option<Applied> {
    let request = self.begin(is_new_search)?;
    let outcome = backend.search_page(&request.terms, request.page).await;
    Some(self.complete(&request, outcome))
  }

  /// Run a new search and follow it for up to `pages` pages, handing every
  /// newly added result to `emit` in order. Stops early once the results are
  /// exhausted. Returns how many results were emitted.
  pub async fn walk_pages<B, F>(&mut self, backend: &B, pages: u32, mut emit: F) -> Result<usize>
  where
    B: VideoSearch,
    F: FnMut(&VideoSummary) -> Result<()>,
  {
    let mut emitted = 0;
    for n in 0..pages {
      match self.fetch_page(backend, n == 0).await {
        Some(Applied::Page { .. }) => {}
        Some(Applied::Failed) => bail!("search failed on page {} (see log output)", n + 1),
        Some(Applied::Stale) | None => break,
      }
      for video in &self.state.results[emitted..] {
        emit(video)?;
      }
      emitted = self.state.results.len();
    }
    Ok(emitted)
  }
}
