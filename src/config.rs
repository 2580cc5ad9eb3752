//! Persisted settings: page size, step size, preload radius, texture
//! ceiling. Stored as JSON under the platform config dir; a missing or
//! malformed file falls back to defaults so the tool always starts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::debug::dbg_log;
use crate::texture::MAX_TEXTURE_SIZE;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SwipeConfig {
    /// Images shown per page.
    pub page_size: usize,
    /// Queue positions moved per advance/retreat.
    pub step_size: usize,
    /// Look-ahead/look-behind radius kept decoded around the page.
    pub preload_radius: usize,
    /// Per-image decode resolution ceiling (width, height).
    pub max_texture: (u32, u32),
    /// Decode the radius on background threads instead of inline.
    pub background_decode: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        SwipeConfig {
            page_size: 1,
            step_size: 1,
            preload_radius: 3,
            max_texture: MAX_TEXTURE_SIZE,
            background_decode: true,
        }
    }
}

/// Location of the config file on this platform, if one can be determined.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "swipe").map(|d| d.config_dir().join("config.json"))
}

impl SwipeConfig {
    /// Load from the platform config dir, defaults when absent or broken.
    pub fn load() -> SwipeConfig {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => SwipeConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> SwipeConfig {
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(_) => return SwipeConfig::default(),
        };
        match serde_json::from_str(&data) {
            Ok(cfg) => cfg,
            Err(e) => {
                dbg_log!("config: ignoring malformed {}: {}", path.display(), e);
                SwipeConfig::default()
            }
        }
    }

    /// Write to the platform config dir.
    pub fn save(&self) -> Result<()> {
        let path = config_path().context("no config directory for this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
