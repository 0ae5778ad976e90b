use ratatui::style::Color;

/// A named colour palette for the whole UI.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Dusk",
    bg: Color::Rgb(24, 24, 32),
    fg: Color::Rgb(220, 220, 230),
    accent: Color::Rgb(0, 170, 255),
    muted: Color::Rgb(120, 120, 140),
    border: Color::Rgb(60, 60, 80),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(0, 90, 160),
    stripe_bg: Color::Rgb(30, 30, 40),
    status: Color::Rgb(250, 200, 90),
    error: Color::Rgb(240, 90, 90),
    key_fg: Color::Rgb(24, 24, 32),
    key_bg: Color::Rgb(0, 170, 255),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(0, 102, 204),
    muted: Color::Rgb(130, 130, 120),
    border: Color::Rgb(200, 196, 184),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(0, 102, 204),
    stripe_bg: Color::Rgb(240, 237, 226),
    status: Color::Rgb(170, 110, 0),
    error: Color::Rgb(190, 30, 30),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(40, 40, 40),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    status: Color::Yellow,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_index_by_name() {
    assert_eq!(theme_index(Some("Paper")), 1);
    assert_eq!(theme_index(Some("Terminal")), 2);
  }

  #[test]
  fn theme_index_unknown_or_missing() {
    assert_eq!(theme_index(Some("nope")), 0);
    assert_eq!(theme_index(None), 0);
  }

  #[test]
  fn theme_names_unique() {
    for (i, a) in THEMES.iter().enumerate() {
      assert!(THEMES.iter().skip(i + 1).all(|b| b.name != a.name));
    }
  }
}
