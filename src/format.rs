//! Text helpers for result rows and the detail pane.

use scraper::{ElementRef, Html, node::Node};

/// Format seconds as `HH:MM:SS`. Hours are not capped at 24 or 99.
pub fn format_duration(total_secs: u64) -> String {
  let hours = total_secs / 3600;
  let minutes = (total_secs % 3600) / 60;
  let seconds = total_secs % 60;
  format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Flatten a description's HTML into plain text.
///
/// Text nodes are kept with entities decoded by the parser. `<br>` and the
/// end of each `<p>` become line breaks.
pub fn html_to_text(html: &str) -> String {
  let fragment = Html::parse_fragment(html);
  let mut out = String::with_capacity(html.len());
  push_text(fragment.root_element(), &mut out);

  out.replace('\u{a0}', " ").lines().map(str::trim_end).collect::<Vec<_>>().join("\n").trim().to_string()
}

/// Recursively append text nodes below `element`.
fn push_text(element: ElementRef, out: &mut String) {
  for child in element.children() {
    match child.value() {
      Node::Text(text) => out.push_str(text),
      Node::Element(el) if el.name() == "br" => out.push('\n'),
      Node::Element(el) => {
        if let Some(child_element) = ElementRef::wrap(child) {
          push_text(child_element, out);
        }
        if el.name() == "p" {
          out.push('\n');
        }
      }
      _ => {}
    }
  }
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}
