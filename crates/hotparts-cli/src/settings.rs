//! Runtime settings: built-in defaults, overlaid by an optional TOML file,
//! overlaid by `HOTPARTS__*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use hotparts_core::{merge::DEFAULT_CHUNK_SIZE, sampler::SampleRequest};
use hotparts_workbook::DocumentRules;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Sampler defaults; each can be overridden per run on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
  pub count:             usize,
  pub min_price:         Decimal,
  pub max_manufacturers: usize,
}

impl Default for SamplerSettings {
  fn default() -> Self {
    Self { count: 10, min_price: Decimal::TEN, max_manufacturers: 5 }
  }
}

impl SamplerSettings {
  pub fn request(&self) -> SampleRequest {
    SampleRequest {
      count:             self.count,
      min_price:         Some(self.min_price),
      max_manufacturers: self.max_manufacturers,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:       PathBuf,
  pub merge_chunk_size: usize,
  pub documents:        DocumentRules,
  pub sampler:          SamplerSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:       PathBuf::from("hotparts.db"),
      merge_chunk_size: DEFAULT_CHUNK_SIZE,
      documents:        DocumentRules::default(),
      sampler:          SamplerSettings::default(),
    }
  }
}

impl Settings {
  /// Load settings. A missing file is not an error.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("HOTPARTS")
          .prefix_separator("__")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
