use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

use crate::constants::constants;

/// Characters escaped inside a single search term. Whitespace never reaches
/// this set since terms are split on it and rejoined with `+`.
const TERM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// A single entry from a search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
  pub id: String,
  pub title: String,
  /// HTML as served by the API. `null` becomes an empty string.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub description: String,
  #[serde(rename = "duration", default)]
  pub duration_seconds: u64,
}

/// One page of the `/videos` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchPage {
  pub list: Vec<VideoSummary>,
  pub has_more: bool,
}

/// Everything that can go wrong fetching a page. All variants are the same
/// failure to the session: state stays put and the error is logged.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} answered with HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("malformed response: {0}")]
  Malformed(String),
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Collapse whitespace runs and join the terms with `+`, the endpoint's
/// convention for spaces. Each term is percent-encoded on its own so a
/// literal `+` or `&` survives.
pub fn encode_terms(query: &str) -> String {
  query.split_whitespace().map(|term| utf8_percent_encode(term, TERM_ESCAPE).to_string()).collect::<Vec<_>>().join("+")
}

/// Build the JSONP search URL for `terms` at `page` (1-indexed).
pub fn search_url(terms: &str, page: u32) -> String {
  let c = constants();
  format!(
    "{}?fields={}&sort={}&limit={}&page={}&search={}&callback={}",
    c.api_base,
    c.fields,
    c.sort,
    c.page_size,
    page,
    encode_terms(terms),
    c.jsonp_callback
  )
}

/// Build the embeddable player URL for a video.
pub fn embed_url(video_id: &str, autoplay: bool) -> String {
  format!("{}/{}?autoPlay={}", constants().player_base, video_id, u8::from(autoplay))
}

/// Unwrap a JSONP body of the form `callback({...});`.
///
/// Plain JSON passes through untouched, so the parser also works when the
/// API ignores the callback parameter. Leading `/**/` guards are tolerated.
pub fn strip_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str, FetchError> {
  let trimmed = body.trim().trim_start_matches("/**/").trim_start();
  if trimmed.starts_with('{') {
    return Ok(trimmed);
  }
  let inner = trimmed
    .strip_prefix(callback)
    .map(str::trim_start)
    .and_then(|s| s.strip_prefix('('))
    .ok_or_else(|| FetchError::Malformed(format!("expected JSON or a `{}(...)` wrapper", callback)))?;
  let inner = inner.trim_end().trim_end_matches(';').trim_end();
  inner.strip_suffix(')').map(str::trim).ok_or_else(|| FetchError::Malformed("unterminated JSONP wrapper".to_string()))
}

/// Parse a raw response body into a page.
pub fn parse_search_page(body: &str) -> Result<SearchPage, FetchError> {
  let json = strip_jsonp(body, &constants().jsonp_callback)?;
  serde_json::from_str(json).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// The one outbound collaborator of a search session.
pub trait VideoSearch {
  fn search_page(&self, terms: &str, page: u32) -> impl Future<Output = Result<SearchPage, FetchError>> + Send;
}

/// Dailymotion data API backend.
#[derive(Debug, Clone)]
pub struct DailymotionClient {
  http: Client,
}

impl DailymotionClient {
  pub fn new(http: Client) -> Self {
    Self { http }
  }
}

impl VideoSearch for DailymotionClient {
  async fn search_page(&self, terms: &str, page: u32) -> Result<SearchPage, FetchError> {
    let url = search_url(terms, page);
    debug!(url = %url, "requesting search page");

    let response =
      self.http.get(&url).send().await.map_err(|source| FetchError::Transport { url: url.clone(), source })?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status { url, status: status.as_u16() });
    }
    let body = response.text().await.map_err(|source| FetchError::Transport { url: url.clone(), source })?;
    parse_search_page(&body)
  }
}
