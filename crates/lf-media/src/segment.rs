//! Segments and partial segments retained by the playlist window.
//!
//! [`Segment`] is a tagged union over the three kinds of window entries:
//! an MPEG-TS segment, an fMP4 segment (which owns its LL-HLS parts), and a
//! gap placeholder that only carries a duration. Release takes the value by
//! move, so a segment can be released at most once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use lf_core::{PartId, SegmentId};

use crate::storage::Storage;

/// Name of the segment with the given id, without extension.
pub fn segment_name(id: SegmentId) -> String {
    format!("seg{id}")
}

/// Name of the part with the given id, without extension.
pub fn part_name(id: PartId) -> String {
    format!("part{id}")
}

// ---------------------------------------------------------------------------
// Part
// ---------------------------------------------------------------------------

/// A finalized LL-HLS partial segment.
#[derive(Debug)]
pub struct Part {
    pub id: PartId,
    pub duration: Duration,
    /// Decodable without any earlier part (starts with a key frame).
    pub independent: bool,
    storage: Storage,
}

impl Part {
    pub fn new(id: PartId, duration: Duration, independent: bool, storage: Storage) -> Self {
        Self {
            id,
            duration,
            independent,
            storage,
        }
    }

    pub fn name(&self) -> String {
        part_name(self.id)
    }

    pub fn size(&self) -> u64 {
        self.storage.size()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

// ---------------------------------------------------------------------------
// Segment variants
// ---------------------------------------------------------------------------

/// A complete MPEG-TS segment.
#[derive(Debug)]
pub struct MpegTsSegment {
    pub id: SegmentId,
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
    pub storage: Storage,
}

/// A complete fragmented-MP4 segment and the parts it was assembled from.
#[derive(Debug)]
pub struct Fmp4Segment {
    pub id: SegmentId,
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
    pub parts: Vec<Arc<Part>>,
    pub storage: Storage,
}

/// Placeholder entry with no payload.
#[derive(Debug, Clone, Copy)]
pub struct GapSegment {
    pub duration: Duration,
}

/// An entry of the retention window.
#[derive(Debug)]
pub enum Segment {
    MpegTs(MpegTsSegment),
    Fmp4(Fmp4Segment),
    Gap(GapSegment),
}

impl Segment {
    pub fn duration(&self) -> Duration {
        match self {
            Segment::MpegTs(seg) => seg.duration,
            Segment::Fmp4(seg) => seg.duration,
            Segment::Gap(gap) => gap.duration,
        }
    }

    /// Payload size in bytes; always 0 for gaps.
    pub fn size(&self) -> u64 {
        match self {
            Segment::MpegTs(seg) => seg.storage.size(),
            Segment::Fmp4(seg) => seg.storage.size(),
            Segment::Gap(_) => 0,
        }
    }

    pub fn id(&self) -> Option<SegmentId> {
        match self {
            Segment::MpegTs(seg) => Some(seg.id),
            Segment::Fmp4(seg) => Some(seg.id),
            Segment::Gap(_) => None,
        }
    }

    /// Index name (`seg{id}`); gaps are never indexed.
    pub fn name(&self) -> Option<String> {
        self.id().map(segment_name)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Segment::MpegTs(seg) => Some(seg.start_time),
            Segment::Fmp4(seg) => Some(seg.start_time),
            Segment::Gap(_) => None,
        }
    }

    pub fn storage(&self) -> Option<&Storage> {
        match self {
            Segment::MpegTs(seg) => Some(&seg.storage),
            Segment::Fmp4(seg) => Some(&seg.storage),
            Segment::Gap(_) => None,
        }
    }

    pub fn parts(&self) -> &[Arc<Part>] {
        match self {
            Segment::Fmp4(seg) => &seg.parts,
            _ => &[],
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, Segment::Gap(_))
    }

    /// Free the payload. Parts are shared with the part index, so their
    /// storage goes away once the index drops them too.
    pub fn release(self) {
        match self {
            Segment::MpegTs(seg) => seg.storage.release(),
            Segment::Fmp4(seg) => {
                drop(seg.parts);
                seg.storage.release();
            }
            Segment::Gap(_) => {}
        }
    }
}
