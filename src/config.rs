use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User preferences persisted to `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Start embedded playback immediately. Defaults to on.
  pub autoplay: Option<bool>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "motion")
}

/// Directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|dirs| dirs.data_local_dir().join("logs"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file) {
        return Self::parse(&content);
      }
    }
    Self::default()
  }

  /// Parse preferences, falling back to defaults on malformed input.
  pub fn parse(content: &str) -> Self {
    match toml::from_str(content) {
      Ok(config) => config,
      Err(e) => {
        tracing::warn!(err = %e, "ignoring malformed prefs.toml");
        Self::default()
      }
    }
  }

  pub fn autoplay(&self) -> bool {
    self.autoplay.unwrap_or(true)
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }
}
