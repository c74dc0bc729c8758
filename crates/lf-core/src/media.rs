//! Media-domain enums for delivery variants and segment storage.
//!
//! All enums serialize in snake_case and implement `Display` manually for
//! consistent string representation (config files, logs, status JSON).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// MuxerVariant
// ---------------------------------------------------------------------------

/// HLS delivery variant served by a playlist engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxerVariant {
    /// One MPEG-TS file per segment (`.ts`), protocol version 3.
    MpegTs,
    /// Fragmented MP4 segments (`.mp4`) with an init segment.
    Fmp4,
    /// Fragmented MP4 with partial segments, blocking reload and delta updates.
    LowLatency,
}

impl MuxerVariant {
    /// File extension (including the dot) of segment and part URIs.
    pub fn extension(self) -> &'static str {
        match self {
            Self::MpegTs => ".ts",
            Self::Fmp4 | Self::LowLatency => ".mp4",
        }
    }

    /// `Content-Type` of segment and part bodies.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::MpegTs => "video/MP2T",
            Self::Fmp4 | Self::LowLatency => "video/mp4",
        }
    }

    /// Whether segments are fragmented MP4 (and therefore need `init.mp4`).
    pub fn is_fmp4(self) -> bool {
        !matches!(self, Self::MpegTs)
    }
}

impl Default for MuxerVariant {
    fn default() -> Self {
        Self::LowLatency
    }
}

impl fmt::Display for MuxerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MpegTs => write!(f, "mpeg_ts"),
            Self::Fmp4 => write!(f, "fmp4"),
            Self::LowLatency => write!(f, "low_latency"),
        }
    }
}

impl FromStr for MuxerVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mpeg_ts" | "mpegts" | "ts" => Ok(Self::MpegTs),
            "fmp4" => Ok(Self::Fmp4),
            "low_latency" | "lowlatency" | "ll" => Ok(Self::LowLatency),
            other => Err(format!("unknown muxer variant '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageKind
// ---------------------------------------------------------------------------

/// Where segment and part payloads are kept while they are in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Payloads live in RAM.
    #[default]
    Memory,
    /// Payloads are spooled to files in a directory and deleted on release.
    Disk,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_display_and_serde() {
        assert_eq!(MuxerVariant::MpegTs.to_string(), "mpeg_ts");
        assert_eq!(MuxerVariant::LowLatency.to_string(), "low_latency");
        let json = serde_json::to_string(&MuxerVariant::Fmp4).unwrap();
        assert_eq!(json, r#""fmp4""#);
        let back: MuxerVariant = serde_json::from_str(r#""low_latency""#).unwrap();
        assert_eq!(back, MuxerVariant::LowLatency);
    }

    #[test]
    fn variant_from_str_accepts_aliases() {
        assert_eq!("mpegts".parse::<MuxerVariant>().unwrap(), MuxerVariant::MpegTs);
        assert_eq!("low-latency".parse::<MuxerVariant>().unwrap(), MuxerVariant::LowLatency);
        assert_eq!("FMP4".parse::<MuxerVariant>().unwrap(), MuxerVariant::Fmp4);
        assert!("webm".parse::<MuxerVariant>().is_err());
    }

    #[test]
    fn variant_extension_and_content_type() {
        assert_eq!(MuxerVariant::MpegTs.extension(), ".ts");
        assert_eq!(MuxerVariant::MpegTs.content_type(), "video/MP2T");
        assert_eq!(MuxerVariant::LowLatency.extension(), ".mp4");
        assert_eq!(MuxerVariant::Fmp4.content_type(), "video/mp4");
        assert!(!MuxerVariant::MpegTs.is_fmp4());
        assert!(MuxerVariant::LowLatency.is_fmp4());
    }

    #[test]
    fn storage_kind_default_is_memory() {
        assert_eq!(StorageKind::default(), StorageKind::Memory);
        assert_eq!(StorageKind::Disk.to_string(), "disk");
    }
}
