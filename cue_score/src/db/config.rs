//! Storage configuration module.

use std::{env, path::PathBuf};

/// Default directory for the JSON documents, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./cue_score_data";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one JSON document per key
    pub data_dir: PathBuf,

    /// Indent stored JSON for human reading
    pub pretty_json: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            pretty_json: false,
        }
    }
}

impl StoreConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `CUE_SCORE_DATA_DIR`: Storage directory (default: `./cue_score_data`)
    /// - `CUE_SCORE_PRETTY_JSON`: `true` to indent stored JSON (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env::var("CUE_SCORE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            pretty_json: env::var("CUE_SCORE_PRETTY_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pretty_json),
        }
    }
}
