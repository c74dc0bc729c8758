//! The retention window: the bounded, ordered set of segments a media
//! playlist currently advertises, the name indices used to serve them, and
//! the renderer turning that state into a [`MediaPlaylist`].
//!
//! `Window` is plain state with no locking of its own. The playlist engine
//! wraps it in a mutex and is responsible for waking waiters after each
//! mutation.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use lf_core::config::{MuxerConfig, LOW_LATENCY_BOOTSTRAP_GAPS};
use lf_core::{MuxerVariant, PartId, SegmentId};

use crate::hls::{MediaPart, MediaPlaylist, MediaSegment, PartInf, ServerControl};
use crate::segment::{part_name, segment_name, GapSegment, Part, Segment};
use crate::storage::Storage;

/// URI advertised for gap segments.
pub const GAP_URI: &str = "gap.mp4";
/// URI of the fMP4 initialization segment.
pub const INIT_URI: &str = "init.mp4";

/// Number of window entries, counted from the live edge, that carry a
/// program date-time and (LL-HLS) their parts.
const RECENT_SEGMENTS: usize = 2;

/// Estimated bitrates of the window in bits per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bandwidth {
    pub peak: u64,
    pub average: u64,
}

/// A segment removed from the front of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    /// `None` for gap placeholders.
    pub segment_id: Option<SegmentId>,
    pub duration: Duration,
}

/// Snapshot of window counters for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStats {
    pub variant: MuxerVariant,
    pub closed: bool,
    pub segments: usize,
    pub gaps: usize,
    pub pending_parts: usize,
    pub media_sequence: u64,
    pub next_segment_id: SegmentId,
    pub next_part_id: PartId,
    pub target_duration: u64,
    pub retained_bytes: u64,
    pub has_init: bool,
}

/// Sliding window of retained segments and parts.
#[derive(Debug)]
pub struct Window {
    variant: MuxerVariant,
    segment_count: usize,
    always_preload_hint: bool,
    closed: bool,
    segments: VecDeque<Segment>,
    segments_by_name: HashMap<String, Storage>,
    parts_by_name: HashMap<String, Arc<Part>>,
    segment_delete_count: u64,
    next_segment_id: SegmentId,
    next_part_id: PartId,
    next_segment_parts: Vec<Arc<Part>>,
    init: Option<Storage>,
}

impl Window {
    /// Create an empty window retaining at most `segment_count` segments.
    pub fn new(variant: MuxerVariant, segment_count: usize) -> Self {
        Self {
            variant,
            segment_count: segment_count.max(1),
            always_preload_hint: true,
            closed: false,
            segments: VecDeque::new(),
            segments_by_name: HashMap::new(),
            parts_by_name: HashMap::new(),
            segment_delete_count: 0,
            next_segment_id: SegmentId::default(),
            next_part_id: PartId::default(),
            next_segment_parts: Vec::new(),
            init: None,
        }
    }

    pub fn from_config(config: &MuxerConfig) -> Self {
        let mut window = Self::new(config.variant, config.segment_count);
        window.always_preload_hint = config.always_preload_hint;
        window.next_segment_id = SegmentId::new(config.start_segment_id);
        window
    }

    // -- Mutation ------------------------------------------------------------

    /// Append a finalized segment and evict from the front as needed.
    ///
    /// The first segment of an LL-HLS window is preceded by gap segments of
    /// the same duration; that call performs no eviction so the first reload
    /// shows every gap.
    pub fn on_segment_finalized(&mut self, segment: Segment) -> Vec<Eviction> {
        if self.closed {
            segment.release();
            return Vec::new();
        }

        let bootstrap = self.variant == MuxerVariant::LowLatency && self.segments.is_empty();
        if bootstrap {
            let gap = GapSegment {
                duration: segment.duration(),
            };
            self.segments
                .extend((0..LOW_LATENCY_BOOTSTRAP_GAPS).map(|_| Segment::Gap(gap)));
        }

        if let (Some(name), Some(storage)) = (segment.name(), segment.storage()) {
            self.segments_by_name.insert(name, storage.clone());
        }
        if let Segment::Fmp4(ref seg) = segment {
            self.next_segment_id = seg.id.next();
        }
        self.next_segment_parts.clear();
        self.segments.push_back(segment);

        let mut evicted = Vec::new();
        if !bootstrap {
            while self.segments.len() > self.segment_count {
                match self.evict_oldest() {
                    Some(eviction) => evicted.push(eviction),
                    None => break,
                }
            }
        }
        evicted
    }

    /// Register a finalized part of the segment currently being assembled.
    pub fn on_part_finalized(&mut self, part: Arc<Part>) {
        if self.closed {
            return;
        }
        self.parts_by_name.insert(part.name(), part.clone());
        self.next_part_id = part.id.next();
        self.next_segment_parts.push(part);
    }

    /// Replace the initialization segment.
    pub fn set_init(&mut self, storage: Storage) {
        if self.closed {
            storage.release();
            return;
        }
        if let Some(previous) = self.init.replace(storage) {
            previous.release();
        }
    }

    /// Mark the window closed and release everything it holds. Returns
    /// `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        self.segments_by_name.clear();
        self.parts_by_name.clear();
        self.next_segment_parts.clear();
        for segment in self.segments.drain(..) {
            segment.release();
        }
        if let Some(init) = self.init.take() {
            init.release();
        }
        true
    }

    fn evict_oldest(&mut self) -> Option<Eviction> {
        let oldest = self.segments.pop_front()?;

        if let Some(name) = oldest.name() {
            self.segments_by_name.remove(&name);
        }
        for part in oldest.parts() {
            self.parts_by_name.remove(&part.name());
        }

        let eviction = Eviction {
            segment_id: oldest.id(),
            duration: oldest.duration(),
        };
        oldest.release();
        self.segment_delete_count += 1;

        Some(eviction)
    }

    // -- Queries -------------------------------------------------------------

    pub fn variant(&self) -> MuxerVariant {
        self.variant
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Media sequence number of the first retained segment.
    pub fn segment_delete_count(&self) -> u64 {
        self.segment_delete_count
    }

    pub fn next_segment_id(&self) -> SegmentId {
        self.next_segment_id
    }

    pub fn next_part_id(&self) -> PartId {
        self.next_part_id
    }

    /// Parts finalized since the last segment, in order.
    pub fn pending_parts(&self) -> &[Arc<Part>] {
        &self.next_segment_parts
    }

    /// Whether a playlist can be rendered. fMP4 windows need two segments
    /// so `#EXT-X-MAP` always has a stable reference segment.
    pub fn has_content(&self) -> bool {
        match self.variant {
            MuxerVariant::Fmp4 => self.segments.len() >= 2,
            _ => !self.segments.is_empty(),
        }
    }

    /// Whether part `part_id` of segment `segment_id` can be delivered.
    ///
    /// A part index past the last part of a finalized segment means part 0
    /// of the following segment.
    pub fn has_part(&self, segment_id: SegmentId, part_id: u64) -> bool {
        if !self.has_content() {
            return false;
        }

        let mut segment_id = segment_id;
        let mut part_id = part_id;

        for segment in &self.segments {
            let Segment::Fmp4(seg) = segment else {
                continue;
            };
            if seg.id != segment_id {
                continue;
            }
            if part_id >= seg.parts.len() as u64 {
                segment_id = segment_id.next();
                part_id = 0;
                continue;
            }
            return true;
        }

        segment_id == self.next_segment_id && part_id < self.next_segment_parts.len() as u64
    }

    /// Storage of the segment named `name` (without extension).
    pub fn segment(&self, name: &str) -> Option<Storage> {
        self.segments_by_name.get(name).cloned()
    }

    /// Storage of the part named `name` (without extension).
    pub fn part(&self, name: &str) -> Option<Storage> {
        self.parts_by_name.get(name).map(|part| part.storage().clone())
    }

    pub fn init(&self) -> Option<Storage> {
        self.init.clone()
    }

    /// Name of the part advertised by `#EXT-X-PRELOAD-HINT`, if any.
    pub fn preload_hint(&self) -> Option<String> {
        if self.variant != MuxerVariant::LowLatency {
            return None;
        }
        if self.always_preload_hint || !self.next_segment_parts.is_empty() {
            Some(part_name(self.next_part_id))
        } else {
            None
        }
    }

    /// Ceiling of the longest segment duration, in seconds.
    pub fn target_duration(&self) -> u64 {
        let max = self
            .segments
            .iter()
            .map(|s| s.duration().as_nanos())
            .max()
            .unwrap_or(0);
        max.div_ceil(1_000_000_000) as u64
    }

    /// Longest part duration across retained and in-progress parts.
    pub fn part_target_duration(&self) -> Duration {
        self.segments
            .iter()
            .flat_map(|s| s.parts())
            .chain(self.next_segment_parts.iter())
            .map(|p| p.duration)
            .max()
            .unwrap_or_default()
    }

    /// Peak and average bitrate over the non-gap segments.
    pub fn bandwidth(&self) -> Bandwidth {
        let mut peak: u128 = 0;
        let mut sizes: u128 = 0;
        let mut durations: u128 = 0;

        for segment in self.segments.iter().filter(|s| !s.is_gap()) {
            let nanos = segment.duration().as_nanos();
            if nanos == 0 {
                continue;
            }
            let size = u128::from(segment.size());
            peak = peak.max(8 * size * 1_000_000_000 / nanos);
            sizes += size;
            durations += nanos;
        }

        if durations == 0 {
            return Bandwidth::default();
        }

        Bandwidth {
            peak: peak as u64,
            average: (8 * sizes * 1_000_000_000 / durations) as u64,
        }
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats {
            variant: self.variant,
            closed: self.closed,
            segments: self.segments.len(),
            gaps: self.segments.iter().filter(|s| s.is_gap()).count(),
            pending_parts: self.next_segment_parts.len(),
            media_sequence: self.segment_delete_count,
            next_segment_id: self.next_segment_id,
            next_part_id: self.next_part_id,
            target_duration: self.target_duration(),
            retained_bytes: self.segments.iter().map(Segment::size).sum(),
            has_init: self.init.is_some(),
        }
    }

    // -- Rendering -----------------------------------------------------------

    /// Render the current window. `delta` requests an `#EXT-X-SKIP` update
    /// and only applies to LL-HLS.
    pub fn render(&self, delta: bool) -> MediaPlaylist {
        match self.variant {
            MuxerVariant::MpegTs => self.render_mpegts(),
            MuxerVariant::Fmp4 | MuxerVariant::LowLatency => self.render_fmp4(delta),
        }
    }

    fn render_mpegts(&self) -> MediaPlaylist {
        let extension = self.variant.extension();
        let segments = self
            .segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::MpegTs(seg) => Some(MediaSegment {
                    gap: false,
                    date_time: Some(seg.start_time),
                    parts: Vec::new(),
                    duration: seg.duration,
                    uri: format!("{}{}", segment_name(seg.id), extension),
                }),
                _ => None,
            })
            .collect();

        MediaPlaylist {
            version: 3,
            allow_cache: Some(false),
            target_duration: self.target_duration(),
            media_sequence: self.segment_delete_count,
            server_control: None,
            part_inf: None,
            map_uri: None,
            skipped_segments: None,
            segments,
            parts: Vec::new(),
            preload_hint: None,
        }
    }

    fn render_fmp4(&self, delta: bool) -> MediaPlaylist {
        let low_latency = self.variant == MuxerVariant::LowLatency;
        let delta = delta && low_latency;
        let extension = self.variant.extension();
        let target_duration = self.target_duration();
        let skip_boundary = Duration::from_secs(target_duration * 6);

        let mut playlist = MediaPlaylist {
            version: 9,
            allow_cache: None,
            target_duration,
            media_sequence: self.segment_delete_count,
            server_control: None,
            part_inf: None,
            map_uri: None,
            skipped_segments: None,
            segments: Vec::new(),
            parts: Vec::new(),
            preload_hint: None,
        };

        if low_latency {
            let part_target = self.part_target_duration();
            playlist.server_control = Some(ServerControl {
                can_block_reload: true,
                part_hold_back: Some(part_target * 25 / 10),
                can_skip_until: Some(skip_boundary),
            });
            playlist.part_inf = Some(PartInf { part_target });
        }

        let skipped = if delta {
            let skipped = self.skipped_segments(skip_boundary);
            playlist.skipped_segments = Some(skipped);
            skipped
        } else {
            playlist.map_uri = Some(INIT_URI.to_string());
            0
        };

        let len = self.segments.len();
        for (i, segment) in self.segments.iter().enumerate().skip(skipped) {
            let recent = len - i <= RECENT_SEGMENTS;
            match segment {
                Segment::Fmp4(seg) => {
                    let parts = if low_latency && recent {
                        seg.parts.iter().map(|p| media_part(p, extension)).collect()
                    } else {
                        Vec::new()
                    };
                    playlist.segments.push(MediaSegment {
                        gap: false,
                        date_time: recent.then_some(seg.start_time),
                        parts,
                        duration: seg.duration,
                        uri: format!("{}{}", segment_name(seg.id), extension),
                    });
                }
                Segment::Gap(gap) => playlist.segments.push(MediaSegment {
                    gap: true,
                    date_time: None,
                    parts: Vec::new(),
                    duration: gap.duration,
                    uri: GAP_URI.to_string(),
                }),
                Segment::MpegTs(_) => {}
            }
        }

        if low_latency {
            playlist.parts = self
                .next_segment_parts
                .iter()
                .map(|p| media_part(p, extension))
                .collect();
            playlist.preload_hint = self
                .preload_hint()
                .map(|name| format!("{name}{extension}"));
        }

        playlist
    }

    /// Number of oldest segments a delta update omits: the longest prefix
    /// whose cumulative duration stays below `boundary`, provided the next
    /// segment reaches it. Windows shorter than the boundary skip nothing.
    fn skipped_segments(&self, boundary: Duration) -> usize {
        let mut total = Duration::ZERO;
        for (i, segment) in self.segments.iter().enumerate() {
            total += segment.duration();
            if total >= boundary {
                return i;
            }
        }
        0
    }
}

fn media_part(part: &Part, extension: &str) -> MediaPart {
    MediaPart {
        duration: part.duration,
        uri: format!("{}{}", part.name(), extension),
        independent: part.independent,
    }
}
