//! Settings for the ToneMeter CLI.
//!
//! Settings live in a TOML file under the data directory; the API key can
//! also come from the environment (`TONEMETER_API_KEY` or `OPENAI_API_KEY`,
//! including via a `.env` file loaded at startup).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm::ToneClientConfig;
use crate::ocr::OcrAccuracy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory could be determined; pass --data-dir")]
    NoDataDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// OCR settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language set.
    #[serde(default = "default_ocr_languages")]
    pub languages: String,
    /// Accuracy tier: `"fast"` or `"accurate"`.
    #[serde(default = "default_ocr_accuracy")]
    pub accuracy: String,
    /// Minimum per-line confidence, 0.0-1.0.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_ocr_languages() -> String {
    "kor+eng".to_string()
}
fn default_ocr_accuracy() -> String {
    "accurate".to_string()
}
fn default_min_confidence() -> f32 {
    0.5
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            languages: default_ocr_languages(),
            accuracy: default_ocr_accuracy(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl OcrSettings {
    pub fn accuracy_tier(&self) -> OcrAccuracy {
        match self.accuracy.as_str() {
            "fast" => OcrAccuracy::Fast,
            _ => OcrAccuracy::Accurate,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ToneClientConfig,
    #[serde(default)]
    pub ocr: OcrSettings,
}

impl Settings {
    /// Resolve the data directory: explicit flag, else the platform data dir.
    pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = explicit {
            return Ok(dir);
        }
        dirs::data_dir()
            .map(|d| d.join("tonemeter"))
            .ok_or(ConfigError::NoDataDir)
    }

    /// Load settings from `<data_dir>/config.toml`, falling back to defaults
    /// when the file does not exist. Environment API keys override the file.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join("config.toml");
        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            debug!("no config file at {}, using defaults", path.display());
            Self::default()
        };

        if let Some(key) = env_api_key() {
            settings.api.api_key = key;
        }
        Ok(settings)
    }

    /// Write the current settings to `<data_dir>/config.toml`.
    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        let path = data_dir.join("config.toml");
        let serialized =
            toml::to_string_pretty(self).expect("settings always serialize to TOML");
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("tonemeter.db")
    }

    pub fn images_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("images")
    }
}

fn env_api_key() -> Option<String> {
    ["TONEMETER_API_KEY", "OPENAI_API_KEY"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.is_empty())
}
