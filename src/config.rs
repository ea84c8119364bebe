// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user settings

use crate::constants::{app_info, pipeline, volume};
use crate::display::DisplayOptions;
use crate::errors::SessionResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name inside the per-user configuration directory
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where recordings are written
    pub recording_path: PathBuf,
    /// Recording gain, clamped to the supported range on load
    pub record_volume: f64,
    /// Last selected capture device
    pub last_device_index: Option<u32>,
    /// Mirror the preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Filter when scaling the preview
    pub smooth_scaling: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recording_path: default_recording_path(),
            record_volume: volume::DEFAULT,
            last_device_index: None,
            mirror_preview: true,
            smooth_scaling: true,
        }
    }
}

impl Config {
    /// Location of the configuration file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No configuration directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or malformed file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&text) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                config.sanitized()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Save to the default location
    pub fn save(&self) -> SessionResult<()> {
        let path = Self::default_path().ok_or_else(|| {
            crate::errors::SessionError::Config("no configuration directory".to_string())
        })?;
        self.save_to(&path)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            mirror_horizontally: self.mirror_preview,
            smooth_scaling: self.smooth_scaling,
        }
    }

    fn sanitized(mut self) -> Self {
        self.record_volume = if self.record_volume.is_nan() {
            volume::DEFAULT
        } else {
            self.record_volume.clamp(volume::MIN, volume::MAX)
        };
        if self.recording_path.as_os_str().is_empty() {
            self.recording_path = default_recording_path();
        }
        self
    }
}

/// Default recording file in the user's video directory
pub fn default_recording_path() -> PathBuf {
    match dirs::video_dir() {
        Some(dir) => dir
            .join(app_info::APP_DIR)
            .join(pipeline::DEFAULT_RECORDING_FILE),
        None => PathBuf::from(pipeline::DEFAULT_RECORDING_FILE),
    }
}

/// Timestamped recording path next to `base`
///
/// `recording_20260101_120000.mkv` in the directory of `base`.
pub fn timestamped_recording_path(base: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let name = format!("recording_{}.mkv", timestamp);
    match base.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
