//! lf-media: segment model, payload storage, HLS media playlist generation,
//! and the retention window.
//!
//! # Modules
//!
//! - [`storage`] - In-memory or spooled-to-disk segment and part payloads
//! - [`segment`] - MPEG-TS, fMP4 and gap segments plus LL-HLS parts
//! - [`hls`] - HLS media playlist types and the M3U8 text generator
//! - [`window`] - The sliding window of retained segments, its indices and
//!   the playlist renderer

pub mod hls;
pub mod segment;
pub mod storage;
pub mod window;

// Re-export commonly used items at the crate root.
pub use hls::{generate_media_playlist, MediaPart, MediaPlaylist, MediaSegment};
pub use segment::{part_name, segment_name, Fmp4Segment, GapSegment, MpegTsSegment, Part, Segment};
pub use storage::{ByteReader, Storage};
pub use window::{Bandwidth, Eviction, Window, WindowStats};
