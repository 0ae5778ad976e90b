use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::format::{format_duration, html_to_text, truncate_str};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

fn panel(theme: &Theme, title: impl Into<Line<'static>>) -> Block<'static> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, player_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_player(frame, app, player_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ motion ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.results().is_empty() {
    render_welcome(frame, app.theme(), area);
    return;
  }
  let [list_area, detail_area] =
    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
  render_results(frame, app, list_area);
  render_detail(frame, app, detail_area);
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  Welcome to motion", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search Dailymotion from the terminal.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a query below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = app
    .results()
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let duration = format_duration(video.duration_seconds);
      let right_w = duration.chars().count();
      let title = truncate_str(&video.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);

      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(duration, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let state = app.session.state();
  let suffix = if app.session.is_fetching() {
    " (loading…)"
  } else if !state.has_more_results {
    " (end)"
  } else {
    ""
  };
  let title = format!(" Results — {} · page {}{} ", state.results.len(), state.current_page, suffix);

  let list = List::new(items)
    .block(panel(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = panel(theme, " Details ").padding(Padding::horizontal(1));

  let Some(video) = app.selected_video() else {
    frame.render_widget(block, area);
    return;
  };

  let mut lines = vec![
    Line::from(Span::styled(video.title.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(vec![
      Span::styled("Duration  ", Style::default().fg(theme.muted)),
      Span::styled(format_duration(video.duration_seconds), Style::default().fg(theme.fg)),
    ]),
    Line::from(vec![
      Span::styled("Id        ", Style::default().fg(theme.muted)),
      Span::styled(video.id.clone(), Style::default().fg(theme.fg)),
    ]),
    Line::from(""),
  ];
  lines.extend(
    html_to_text(&video.description).lines().map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.fg)))),
  );

  let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
  frame.render_widget(paragraph, area);
}

fn render_player(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = panel(theme, " Now Playing ").padding(Padding::horizontal(1));
  let inner_w = area.width.saturating_sub(4) as usize;

  let url = app.player.embed_url();
  let mut spans = Vec::new();
  if let Some(title) = &app.player.current_title {
    let title_w = inner_w.saturating_sub(url.chars().count() + 2);
    spans.push(Span::styled(truncate_str(title, title_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)));
    spans.push(Span::raw("  "));
  }
  spans.push(Span::styled(
    truncate_str(&url, inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  ));

  frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search Dailymotion ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let paragraph = if app.input.is_empty() && app.mode == AppMode::Input {
    let hint = app.session.effective_terms();
    Paragraph::new(hint).style(Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC))
  } else {
    let visible: String = app
      .input
      .chars()
      .scan(0usize, |col, c| {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= app.input_scroll)
      .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.results().is_empty();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("^o", "Open"), ("^t", "Theme")];
      if has_results {
        k.push(("↓", "Results"));
        k.push(("Esc", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Results => {
      vec![("Enter", "Play"), ("j/k", "Navigate"), ("^o", "Open"), ("^t", "Theme"), ("Esc", "Search")]
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
