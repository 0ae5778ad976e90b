//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Dailymotion data API
  pub api_base: String,
  pub player_base: String,
  pub fields: String,
  pub sort: String,
  pub page_size: u32,
  pub jsonp_callback: String,

  // Startup state
  pub default_search: String,
  pub default_video_id: String,

  /// Rows from the end of the loaded results at which "load more" fires.
  pub load_more_threshold: usize,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.page_size, 12);
    assert_eq!(c.fields, "duration,title,id,description");
    assert_eq!(c.sort, "relevance");
    assert_eq!(c.default_search, "Daft punk veridis quo");
    assert_eq!(c.default_video_id, "x172fd");
  }
}
