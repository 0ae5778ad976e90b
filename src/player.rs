use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::info;

use crate::constants::constants;
use crate::dailymotion::embed_url;

/// The "now playing" slot. Playback itself happens in the embedding
/// surface (the system browser); this tracks which video it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
  pub current_video_id: String,
  pub autoplay: bool,
  /// Title of the current video, when it was picked from the results.
  pub current_title: Option<String>,
}

impl Player {
  pub fn new(autoplay: bool) -> Self {
    Self { current_video_id: constants().default_video_id.clone(), autoplay, current_title: None }
  }

  /// Switch to `video_id`. Picking a video always autoplays it.
  pub fn play_video(&mut self, video_id: &str, title: Option<&str>) {
    info!(video_id, "play video");
    self.autoplay = true;
    self.current_video_id = video_id.to_string();
    self.current_title = title.map(str::to_string);
  }

  pub fn embed_url(&self) -> String {
    embed_url(&self.current_video_id, self.autoplay)
  }

  /// Hand the embed URL to the platform's default browser.
  pub fn open_in_browser(&self) -> Result<()> {
    let url = self.embed_url();
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(target_os = "windows")]
    let cmd = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let cmd = "xdg-open";

    let mut child = Command::new(cmd)
      .arg(&url)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()
      .with_context(|| format!("Failed to launch {} for {}", cmd, url))?;
    info!(url = %url, "opened embed in browser");
    // Reap the child in a background thread to avoid zombie processes.
    std::thread::spawn(move || {
      let _ = child.wait();
    });
    Ok(())
  }
}
