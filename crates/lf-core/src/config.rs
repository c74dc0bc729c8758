//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the HTTP server, the playlist muxer, and the ingest
//! endpoints. Every section defaults sensibly so a completely empty `{}` file
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::{MuxerVariant, StorageKind};
use crate::Error;

/// Number of gap segments an LL-HLS window is bootstrapped with.
pub const LOW_LATENCY_BOOTSTRAP_GAPS: usize = 7;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub muxer: MuxerConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.muxer.segment_count == 0 {
            warnings.push("muxer.segment_count is 0; it will be treated as 1".into());
        }

        if self.muxer.variant == MuxerVariant::LowLatency
            && self.muxer.segment_count < LOW_LATENCY_BOOTSTRAP_GAPS
        {
            warnings.push(format!(
                "muxer.segment_count is {} but low-latency clients expect at least {} segments",
                self.muxer.segment_count, LOW_LATENCY_BOOTSTRAP_GAPS
            ));
        }

        if self.muxer.variant == MuxerVariant::Fmp4 && self.muxer.segment_count < 2 {
            warnings.push(
                "muxer.segment_count < 2 with fmp4; the playlist will never have content".into(),
            );
        }

        if self.muxer.playlist_name.contains('/') || !self.muxer.playlist_name.ends_with(".m3u8")
        {
            warnings.push(format!(
                "muxer.playlist_name '{}' should be a bare file name ending in .m3u8",
                self.muxer.playlist_name
            ));
        }

        if self.muxer.storage == StorageKind::Disk && self.muxer.directory.is_none() {
            warnings.push(
                "muxer.storage is disk but no directory is set; the system temp dir is used"
                    .into(),
            );
        }

        if self.ingest.enabled && self.ingest.api_key.is_none() {
            warnings.push("ingest is enabled without an api_key; anyone can publish".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8888,
        }
    }
}

/// Playlist engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxerConfig {
    /// Delivery variant.
    pub variant: MuxerVariant,
    /// Number of segments retained in the sliding window.
    #[serde(default = "default_segment_count")]
    pub segment_count: usize,
    /// File name under which the media playlist is served.
    #[serde(default = "default_playlist_name")]
    pub playlist_name: String,
    /// Id given to the first ingested segment.
    pub start_segment_id: u64,
    /// Advertise `#EXT-X-PRELOAD-HINT` even before the hinted part exists.
    /// Some widely deployed players loop without it.
    #[serde(default = "default_true")]
    pub always_preload_hint: bool,
    /// Payload storage backend.
    pub storage: StorageKind,
    /// Spool directory for [`StorageKind::Disk`].
    pub directory: Option<PathBuf>,
}

fn default_segment_count() -> usize {
    7
}

fn default_playlist_name() -> String {
    "stream.m3u8".into()
}

fn default_true() -> bool {
    true
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            variant: MuxerVariant::default(),
            segment_count: default_segment_count(),
            playlist_name: default_playlist_name(),
            start_segment_id: 0,
            always_preload_hint: default_true(),
            storage: StorageKind::default(),
            directory: None,
        }
    }
}

/// Settings for the HTTP ingest endpoints used by external packagers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub enabled: bool,
    /// Bearer token required on ingest requests when set.
    pub api_key: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
        }
    }
}
