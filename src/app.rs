use ratatui::widgets::ListState;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::info;

use crate::config::Config;
use crate::constants::constants;
use crate::dailymotion::{DailymotionClient, FetchError, SearchPage, VideoSearch, VideoSummary};
use crate::player::Player;
use crate::session::{Applied, FetchKind, PageRequest, SearchSession};
use crate::theme::{THEMES, Theme, theme_index};

// --- Types ---

pub type FetchResult = Result<SearchPage, FetchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

/// A spawned page fetch waiting for its answer.
pub(crate) struct PendingFetch {
  pub(crate) request: PageRequest,
  pub(crate) rx: oneshot::Receiver<FetchResult>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub session: SearchSession,
  pub list_state: ListState,
  pub player: Player,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message — shown with info icon, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  client: DailymotionClient,
  /// Every fetch still running, including ones a newer search superseded.
  /// Their answers still pass through the session, which drops stale ones.
  pub(crate) pending: Vec<PendingFetch>,
  /// When the last error was set — used for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(config: &Config, client: DailymotionClient, initial_query: Option<String>) -> Self {
    let input = initial_query.unwrap_or_default();
    let cursor_position = input.chars().count();

    Self {
      session: SearchSession::with_query(input.clone()),
      input,
      cursor_position,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index: theme_index(config.theme_name.as_deref()),
      list_state: ListState::default(),
      player: Player::new(config.autoplay()),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      client,
      pending: Vec::new(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and by theme_index() on initialization.
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  fn save_config(&self) {
    let config = Config { theme_name: Some(self.theme().name.to_string()), autoplay: Some(self.player.autoplay) };
    config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn results(&self) -> &[VideoSummary] {
    self.session.results()
  }

  pub fn selected_video(&self) -> Option<&VideoSummary> {
    self.list_state.selected().and_then(|i| self.results().get(i))
  }

  // --- Searching ---

  /// Start a new search for the current input. Blank input searches the
  /// default terms.
  pub fn trigger_search(&mut self) {
    self.session.set_query(self.input.trim());
    self.clear_error();
    self.info_message = None;

    if let Some(request) = self.session.begin(true) {
      info!(query = %request.terms, "search triggered");
      self.status_message = Some(format!("Searching '{}'…", request.terms));
      self.spawn_fetch(request);
    }
  }

  /// Fetch the next page of the current search, if there is one and
  /// nothing else is outstanding.
  pub fn trigger_load_more(&mut self) {
    if self.session.is_fetching() {
      return;
    }
    match self.session.begin(false) {
      Some(request) => {
        self.status_message = Some(format!("Loading page {}…", request.page));
        self.spawn_fetch(request);
      }
      None => {
        if !self.results().is_empty() {
          self.info_message = Some(format!("No more results ({} loaded)", self.results().len()));
        }
      }
    }
  }

  /// The near-bottom event: fire "load more" once `index` is within the
  /// threshold of the last loaded result.
  pub fn on_selection_moved(&mut self, index: usize) {
    if is_near_bottom(index, self.results().len(), constants().load_more_threshold) {
      self.trigger_load_more();
    }
  }

  fn spawn_fetch(&mut self, request: PageRequest) {
    let client = self.client.clone();
    let terms = request.terms.clone();
    let page = request.page;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.search_page(&terms, page).await);
    });
    self.pending.push(PendingFetch { request, rx });
  }

  /// Poll every outstanding fetch and fold finished ones into the session.
  pub fn check_pending(&mut self) {
    let mut still_pending = Vec::with_capacity(self.pending.len());
    for mut fetch in std::mem::take(&mut self.pending) {
      match fetch.rx.try_recv() {
        Ok(outcome) => self.apply_outcome(&fetch.request, outcome),
        Err(oneshot::error::TryRecvError::Empty) => still_pending.push(fetch),
        Err(oneshot::error::TryRecvError::Closed) => {
          if self.session.in_flight() == Some(&fetch.request) {
            self.status_message = None;
            self.set_error("Search task failed.".to_string());
          }
          self.session.abandon(&fetch.request);
        }
      }
    }
    self.pending = still_pending;
  }

  fn apply_outcome(&mut self, request: &PageRequest, outcome: FetchResult) {
    let failure = outcome.as_ref().err().map(|e| e.to_string());
    match self.session.complete(request, outcome) {
      Applied::Page { added } => {
        self.status_message = None;
        if request.kind == FetchKind::NewSearch {
          if added == 0 {
            self.list_state.select(None);
            self.set_error("No results found.".to_string());
          } else {
            self.list_state.select(Some(0));
            self.mode = AppMode::Results;
          }
        }
      }
      Applied::Failed => {
        self.status_message = None;
        let msg = failure.unwrap_or_default();
        match request.kind {
          FetchKind::NewSearch => self.set_error(format!("Search failed: {}", msg)),
          FetchKind::LoadMore => self.set_error(format!("Failed to load more: {}", msg)),
        }
      }
      Applied::Stale => {}
    }
  }

  // --- Playback ---

  /// Make the selected result the current video and open it.
  pub fn play_selected(&mut self) {
    let Some(video) = self.selected_video() else { return };
    let (id, title) = (video.id.clone(), video.title.clone());
    self.player.play_video(&id, Some(&title));
    self.open_current();
  }

  pub fn open_current(&mut self) {
    if let Err(e) = self.player.open_in_browser() {
      self.set_error(format!("{:#}", e));
    }
  }
}

/// True when `index` is within `threshold` rows of the end of a list of
/// `len` items.
pub fn is_near_bottom(index: usize, len: usize, threshold: usize) -> bool {
  len > 0 && index + threshold >= len.saturating_sub(1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::Client;

  fn app() -> App {
    App::new(&Config::default(), DailymotionClient::new(Client::new()), Some("daft punk".to_string()))
  }

  fn video(n: usize) -> VideoSummary {
    VideoSummary { id: format!("v{}", n), title: format!("Video {}", n), description: String::new(), duration_seconds: 1 }
  }

  fn page(range: std::ops::RangeInclusive<usize>, has_more: bool) -> FetchResult {
    Ok(SearchPage { list: range.map(video).collect(), has_more })
  }

  /// Register `request` as pending with a channel the test controls.
  fn track(app: &mut App, request: PageRequest) -> oneshot::Sender<FetchResult> {
    let (tx, rx) = oneshot::channel();
    app.pending.push(PendingFetch { request, rx });
    tx
  }

  // --- is_near_bottom ---

  #[test]
  fn near_bottom_threshold() {
    assert!(!is_near_bottom(0, 12, 3));
    assert!(!is_near_bottom(7, 12, 3));
    assert!(is_near_bottom(8, 12, 3));
    assert!(is_near_bottom(11, 12, 3));
  }

  #[test]
  fn near_bottom_short_and_empty_lists() {
    assert!(is_near_bottom(0, 2, 3));
    assert!(!is_near_bottom(0, 0, 3));
  }

  // --- pending fetches ---

  #[test]
  fn new_search_result_selects_first_row() {
    let mut app = app();
    let request = app.session.begin(true).unwrap();
    let tx = track(&mut app, request);

    app.check_pending();
    assert_eq!(app.pending.len(), 1);

    tx.send(page(1..=12, true)).unwrap();
    app.check_pending();
    assert!(app.pending.is_empty());
    assert_eq!(app.results().len(), 12);
    assert_eq!(app.list_state.selected(), Some(0));
    assert_eq!(app.mode, AppMode::Results);
  }

  #[test]
  fn empty_new_search_reports_no_results() {
    let mut app = app();
    let request = app.session.begin(true).unwrap();
    track(&mut app, request).send(page(1..=0, false)).unwrap();

    app.check_pending();
    assert_eq!(app.last_error.as_deref(), Some("No results found."));
    assert_eq!(app.mode, AppMode::Input);
  }

  #[test]
  fn load_more_keeps_selection() {
    let mut app = app();
    let first = app.session.begin(true).unwrap();
    track(&mut app, first).send(page(1..=12, true)).unwrap();
    app.check_pending();
    app.list_state.select(Some(10));

    let more = app.session.begin(false).unwrap();
    track(&mut app, more).send(page(13..=24, false)).unwrap();
    app.check_pending();

    assert_eq!(app.results().len(), 24);
    assert_eq!(app.list_state.selected(), Some(10));
    assert_eq!(app.session.state().current_page, 2);
  }

  #[test]
  fn failed_load_more_sets_error_and_keeps_results() {
    let mut app = app();
    let first = app.session.begin(true).unwrap();
    track(&mut app, first).send(page(1..=12, true)).unwrap();
    app.check_pending();

    let more = app.session.begin(false).unwrap();
    track(&mut app, more).send(Err(FetchError::Malformed("bad json".to_string()))).unwrap();
    app.check_pending();

    assert_eq!(app.results().len(), 12);
    assert_eq!(app.last_error.as_deref(), Some("Failed to load more: malformed response: bad json"));
    assert!(!app.session.is_fetching());
  }

  #[test]
  fn superseded_page_never_lands() {
    let mut app = app();
    let first = app.session.begin(true).unwrap();
    track(&mut app, first).send(page(1..=12, true)).unwrap();
    app.check_pending();

    let stale = app.session.begin(false).unwrap();
    let stale_tx = track(&mut app, stale);
    let fresh = app.session.begin(true).unwrap();
    let fresh_tx = track(&mut app, fresh);

    fresh_tx.send(page(100..=101, true)).unwrap();
    app.check_pending();
    stale_tx.send(page(13..=24, true)).unwrap();
    app.check_pending();

    assert_eq!(app.results(), &[video(100), video(101)]);
    assert!(app.pending.is_empty());
    assert!(app.last_error.is_none());
  }

  #[test]
  fn dropped_task_frees_session() {
    let mut app = app();
    let request = app.session.begin(true).unwrap();
    drop(track(&mut app, request));

    app.check_pending();
    assert!(!app.session.is_fetching());
    assert_eq!(app.last_error.as_deref(), Some("Search task failed."));
  }

  #[test]
  fn exhausted_load_more_sets_info() {
    let mut app = app();
    let first = app.session.begin(true).unwrap();
    track(&mut app, first).send(page(1..=3, false)).unwrap();
    app.check_pending();

    app.trigger_load_more();
    assert!(app.pending.is_empty());
    assert_eq!(app.info_message.as_deref(), Some("No more results (3 loaded)"));
  }

  #[test]
  fn selected_video_follows_list_state() {
    let mut app = app();
    let first = app.session.begin(true).unwrap();
    track(&mut app, first).send(page(1..=3, false)).unwrap();
    app.check_pending();

    app.list_state.select(Some(2));
    assert_eq!(app.selected_video().map(|v| v.id.as_str()), Some("v3"));
    app.list_state.select(Some(9));
    assert!(app.selected_video().is_none());
  }
}
