//! HLS media playlist generation.
//!
//! [`MediaPlaylist`] is a plain description of one rendering of the window;
//! [`generate_media_playlist`] turns it into M3U8 text, including the LL-HLS
//! tags (server control, part info, parts, skip and preload hint).

mod generator;
mod types;

pub use generator::{format_duration, generate_media_playlist};
pub use types::{MediaPart, MediaPlaylist, MediaSegment, PartInf, ServerControl};
