use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

/// Rows moved by PageUp/PageDown in the results list.
const PAGE_JUMP: usize = 10;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
    app.open_current();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.results().is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if !app.results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  let count = app.results().len();
  match key.code {
    KeyCode::Enter => {
      app.play_selected();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| (i + 1).min(count - 1));
        select(app, i);
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        app.list_state.select(Some(i));
      }
    }
    KeyCode::PageDown => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| (i + PAGE_JUMP).min(count - 1));
        select(app, i);
      }
    }
    KeyCode::PageUp => {
      if count > 0 {
        let i = app.list_state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        app.list_state.select(Some(i));
      }
    }
    KeyCode::End | KeyCode::Char('G') => {
      if count > 0 {
        select(app, count - 1);
      }
    }
    KeyCode::Home | KeyCode::Char('g') => {
      if count > 0 {
        app.list_state.select(Some(0));
      }
    }
    KeyCode::Esc | KeyCode::Char('/') | KeyCode::Tab => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

/// Move the selection down to `i` and fire "load more" near the bottom.
fn select(app: &mut App, i: usize) {
  app.list_state.select(Some(i));
  app.on_selection_moved(i);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::dailymotion::{DailymotionClient, SearchPage, VideoSummary};
  use crate::session::FetchKind;
  use ratatui::crossterm::event::KeyEvent;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app() -> App {
    App::new(&Config::default(), DailymotionClient::new(reqwest::Client::new()), None)
  }

  /// An app in results mode showing one applied page of `n` videos.
  fn app_with_results(n: usize, has_more: bool) -> App {
    let mut app = app();
    let request = app.session.begin(true).unwrap();
    let list = (1..=n)
      .map(|i| VideoSummary { id: format!("v{}", i), title: format!("Video {}", i), description: String::new(), duration_seconds: 60 })
      .collect();
    app.session.complete(&request, Ok(SearchPage { list, has_more }));
    app.mode = AppMode::Results;
    app.list_state.select(Some(0));
    app
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- input editing ---

  #[test]
  fn typing_and_editing() {
    let mut app = app();
    for c in "daft".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c)));
    }
    handle_key_event(&mut app, key(KeyCode::Left));
    handle_key_event(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.input, "dat");
    assert_eq!(app.cursor_position, 2);

    handle_key_event(&mut app, key(KeyCode::Home));
    handle_key_event(&mut app, key(KeyCode::Delete));
    assert_eq!(app.input, "at");
  }

  #[test]
  fn esc_clears_then_quits() {
    let mut app = app();
    handle_key_event(&mut app, key(KeyCode::Char('x')));
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(app.input.is_empty());
    assert!(!app.should_quit);
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_c_quits_from_any_mode() {
    let mut app = app();
    app.mode = AppMode::Results;
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[test]
  fn down_without_results_stays_in_input() {
    let mut app = app();
    handle_key_event(&mut app, key(KeyCode::Down));
    assert_eq!(app.mode, AppMode::Input);
  }

  // --- near-bottom load more ---

  #[tokio::test]
  async fn end_key_requests_next_page() {
    let mut app = app_with_results(12, true);
    handle_key_event(&mut app, key(KeyCode::End));

    assert_eq!(app.list_state.selected(), Some(11));
    let request = app.session.in_flight().unwrap();
    assert_eq!((request.kind, request.page), (FetchKind::LoadMore, 2));
    assert_eq!(app.pending.len(), 1);
    assert_eq!(app.pending[0].request.kind, FetchKind::LoadMore);
  }

  #[tokio::test]
  async fn stepping_down_fires_load_more_only_near_the_bottom() {
    let mut app = app_with_results(12, true);
    for _ in 0..7 {
      handle_key_event(&mut app, key(KeyCode::Char('j')));
    }
    assert_eq!(app.list_state.selected(), Some(7));
    assert!(app.pending.is_empty());

    handle_key_event(&mut app, key(KeyCode::Char('j')));
    assert_eq!(app.list_state.selected(), Some(8));
    assert_eq!(app.pending.len(), 1);
    assert_eq!(app.pending[0].request.page, 2);
  }

  #[test]
  fn end_key_on_exhausted_results_reports_no_more() {
    let mut app = app_with_results(4, false);
    handle_key_event(&mut app, key(KeyCode::Char('G')));

    assert_eq!(app.list_state.selected(), Some(3));
    assert!(app.pending.is_empty());
    assert_eq!(app.info_message.as_deref(), Some("No more results (4 loaded)"));
  }

  #[test]
  fn results_navigation_on_empty_list_is_inert() {
    let mut app = app();
    app.mode = AppMode::Results;
    handle_key_event(&mut app, key(KeyCode::Down));
    handle_key_event(&mut app, key(KeyCode::End));
    assert_eq!(app.list_state.selected(), None);
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert_eq!(app.mode, AppMode::Input);
  }
}
