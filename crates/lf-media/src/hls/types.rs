//! HLS playlist types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `#EXT-X-SERVER-CONTROL` attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerControl {
    /// Server supports `_HLS_msn` / `_HLS_part` blocking reload.
    pub can_block_reload: bool,
    /// Recommended distance from the live edge when playing parts.
    pub part_hold_back: Option<Duration>,
    /// Delta updates may skip segments older than this from the live edge.
    pub can_skip_until: Option<Duration>,
}

/// `#EXT-X-PART-INF` attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInf {
    pub part_target: Duration,
}

/// A partial segment line (`#EXT-X-PART`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPart {
    pub duration: Duration,
    pub uri: String,
    pub independent: bool,
}

/// A single segment in a media playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSegment {
    /// Emit `#EXT-X-GAP` before the segment.
    pub gap: bool,
    /// Optional `#EXT-X-PROGRAM-DATE-TIME`.
    pub date_time: Option<DateTime<Utc>>,
    /// Parts of this segment, listed before its `#EXTINF`.
    pub parts: Vec<MediaPart>,
    /// Segment duration.
    pub duration: Duration,
    /// URI for this segment.
    pub uri: String,
}

/// An HLS media playlist describing a sliding window of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaylist {
    /// `#EXT-X-VERSION`.
    pub version: u32,
    /// `#EXT-X-ALLOW-CACHE`; only emitted when set.
    pub allow_cache: Option<bool>,
    /// Maximum segment duration in integer seconds (rounded up).
    pub target_duration: u64,
    /// Sequence number of the first segment, skipped ones included.
    pub media_sequence: u64,
    pub server_control: Option<ServerControl>,
    pub part_inf: Option<PartInf>,
    /// URI of the initialization segment (`#EXT-X-MAP`).
    pub map_uri: Option<String>,
    /// `#EXT-X-SKIP:SKIPPED-SEGMENTS`; set on delta updates.
    pub skipped_segments: Option<usize>,
    /// Ordered list of segments.
    pub segments: Vec<MediaSegment>,
    /// Parts of the segment that is still being assembled.
    pub parts: Vec<MediaPart>,
    /// URI of the next expected part (`#EXT-X-PRELOAD-HINT`).
    pub preload_hint: Option<String>,
}
