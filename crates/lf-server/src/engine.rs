//! The media playlist engine.
//!
//! [`PlaylistEngine`] is a monitor around the retention [`Window`]: a single
//! `parking_lot` mutex guards all window state and a [`Notify`] wakes every
//! parked request after each mutation. Requests re-check their predicate on
//! every wake, under the lock, and never hold the lock across an `.await`.

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Notify;

use lf_core::config::MuxerConfig;
use lf_core::events::{EventBus, EventPayload};
use lf_core::{Error, MuxerVariant, Result, SegmentId};
use lf_media::window::INIT_URI;
use lf_media::{generate_media_playlist, Bandwidth, ByteReader, Part, Segment, Storage, Window, WindowStats};

/// `Content-Type` of media playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/x-mpegURL";

/// LL-HLS reload parameters taken from the playlist query string.
///
/// Values are kept as strings so malformed numbers surface as a client
/// error from the engine rather than as an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReloadParams {
    #[serde(rename = "_HLS_msn")]
    pub msn: Option<String>,
    #[serde(rename = "_HLS_part")]
    pub part: Option<String>,
    #[serde(rename = "_HLS_skip")]
    pub skip: Option<String>,
}

impl ReloadParams {
    /// Whether a delta update (`#EXT-X-SKIP`) was requested.
    pub fn wants_skip(&self) -> bool {
        matches!(self.skip.as_deref(), Some("YES") | Some("v2"))
    }
}

/// Outcome of [`PlaylistEngine::handle_request`].
pub enum Delivery {
    /// Rendered playlist text.
    Playlist(Bytes),
    /// Segment, part or init segment bytes.
    Content {
        content_type: &'static str,
        size: u64,
        reader: ByteReader,
    },
    /// Nothing by that name is available.
    NotFound,
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::Playlist(bytes) => f.debug_tuple("Playlist").field(&bytes.len()).finish(),
            Delivery::Content {
                content_type, size, ..
            } => f
                .debug_struct("Content")
                .field("content_type", content_type)
                .field("size", size)
                .finish_non_exhaustive(),
            Delivery::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Result of looking up a part by name under the lock.
enum PartLookup {
    Found(Storage),
    /// Not there yet, but advertised as the preload hint.
    Hinted(u64),
    Missing,
}

/// Shared playlist engine. One instance per stream, held in an `Arc`.
pub struct PlaylistEngine {
    variant: MuxerVariant,
    playlist_name: String,
    window: Mutex<Window>,
    notify: Notify,
    events: Arc<EventBus>,
}

impl PlaylistEngine {
    pub fn new(config: &MuxerConfig, events: Arc<EventBus>) -> Self {
        Self {
            variant: config.variant,
            playlist_name: config.playlist_name.clone(),
            window: Mutex::new(Window::from_config(config)),
            notify: Notify::new(),
            events,
        }
    }

    pub fn variant(&self) -> MuxerVariant {
        self.variant
    }

    pub fn playlist_name(&self) -> &str {
        &self.playlist_name
    }

    pub fn is_closed(&self) -> bool {
        self.window.lock().is_closed()
    }

    // -- Producers -----------------------------------------------------------

    /// Append a finalized segment to the window and wake all waiters.
    pub fn on_segment_finalized(&self, segment: Segment) {
        let id = segment.id();
        let duration = segment.duration();
        let size = segment.size();
        let parts = segment.parts().len();

        let evicted = {
            let mut window = self.window.lock();
            if window.is_closed() {
                drop(window);
                tracing::debug!(segment_id = ?id, "Dropping segment finalized after close");
                segment.release();
                return;
            }
            window.on_segment_finalized(segment)
        };
        self.notify.notify_waiters();

        if let Some(segment_id) = id {
            tracing::debug!(
                segment_id = %segment_id,
                duration_secs = duration.as_secs_f64(),
                size,
                parts,
                "Segment finalized"
            );
            self.events.broadcast(EventPayload::SegmentFinalized {
                segment_id,
                duration_secs: duration.as_secs_f64(),
                size,
                parts,
            });
        }

        for eviction in evicted {
            tracing::trace!(segment_id = ?eviction.segment_id, "Segment evicted");
            self.events.broadcast(EventPayload::SegmentEvicted {
                segment_id: eviction.segment_id,
                gap: eviction.segment_id.is_none(),
            });
        }
    }

    /// Register a finalized part of the segment being assembled.
    pub fn on_part_finalized(&self, part: Arc<Part>) {
        let part_id = part.id;
        let duration = part.duration;
        let independent = part.independent;

        {
            let mut window = self.window.lock();
            if window.is_closed() {
                return;
            }
            window.on_part_finalized(part);
        }
        self.notify.notify_waiters();

        tracing::trace!(part_id = %part_id, independent, "Part finalized");
        self.events.broadcast(EventPayload::PartFinalized {
            part_id,
            duration_secs: duration.as_secs_f64(),
            independent,
        });
    }

    /// Replace the fMP4 initialization segment served as `init.mp4`.
    pub fn set_init_segment(&self, storage: Storage) {
        let size = storage.size();
        self.window.lock().set_init(storage);
        self.notify.notify_waiters();

        tracing::debug!(size, "Init segment updated");
        self.events
            .broadcast(EventPayload::InitSegmentUpdated { size });
    }

    /// Close the engine: release every retained segment and fail all parked
    /// requests. Idempotent.
    pub fn close(&self) {
        let closed_now = self.window.lock().close();
        self.notify.notify_waiters();

        if closed_now {
            tracing::info!("Playlist engine closed");
            self.events.broadcast(EventPayload::EngineClosed);
        }
    }

    // -- Queries -------------------------------------------------------------

    pub fn bandwidth(&self) -> Bandwidth {
        self.window.lock().bandwidth()
    }

    pub fn stats(&self) -> WindowStats {
        self.window.lock().stats()
    }

    /// Parts of the segment being assembled. Empty once closed.
    pub fn pending_parts(&self) -> Vec<Arc<Part>> {
        self.window.lock().pending_parts().to_vec()
    }

    // -- Consumers -----------------------------------------------------------

    /// Resolve a request for `name`: the playlist, a segment, a part or the
    /// init segment.
    ///
    /// Playlist requests and requests for the hinted part may block until the
    /// content exists. A close while blocked yields [`Error::Closed`].
    pub async fn handle_request(&self, name: &str, params: &ReloadParams) -> Result<Delivery> {
        if name == self.playlist_name {
            return self.handle_playlist(params).await;
        }

        if name == INIT_URI && self.variant.is_fmp4() {
            let init = self.window.lock().init();
            return self.deliver(init).await;
        }

        let Some(base) = name.strip_suffix(self.variant.extension()) else {
            return Ok(Delivery::NotFound);
        };

        if base.starts_with("seg") {
            let storage = self.window.lock().segment(base);
            return self.deliver(storage).await;
        }

        if self.variant == MuxerVariant::LowLatency && base.starts_with("part") {
            return self.handle_part(base).await;
        }

        Ok(Delivery::NotFound)
    }

    async fn handle_playlist(&self, params: &ReloadParams) -> Result<Delivery> {
        let mut delta = false;

        if self.variant == MuxerVariant::LowLatency {
            delta = params.wants_skip();

            let msn = parse_reload_param("_HLS_msn", params.msn.as_deref())?;
            let part = parse_reload_param("_HLS_part", params.part.as_deref())?;

            if let Some(msn) = msn {
                let target = SegmentId::new(msn);
                let part = part.unwrap_or(0);

                // Clients may ask at most one segment past the one being
                // assembled. The limit only grows, so one check suffices.
                let next_segment_id = self.window.lock().next_segment_id();
                if msn > next_segment_id.get() + 1 {
                    return Err(Error::validation(format!(
                        "_HLS_msn {msn} is too far ahead of {next_segment_id}"
                    )));
                }

                let playlist = self
                    .wait_until(|window| {
                        window
                            .has_part(target, part)
                            .then(|| Ok(render(window, delta)))
                    })
                    .await?;
                return Ok(Delivery::Playlist(playlist));
            }

            if part.is_some() {
                return Err(Error::validation("_HLS_part requires _HLS_msn"));
            }
        }

        let playlist = self
            .wait_until(|window| window.has_content().then(|| Ok(render(window, delta))))
            .await?;
        Ok(Delivery::Playlist(playlist))
    }

    async fn handle_part(&self, base: &str) -> Result<Delivery> {
        let lookup = {
            let window = self.window.lock();
            match window.part(base) {
                Some(storage) => PartLookup::Found(storage),
                None if window.preload_hint().as_deref() == Some(base) => {
                    PartLookup::Hinted(window.next_part_id().get())
                }
                None => PartLookup::Missing,
            }
        };

        let storage = match lookup {
            PartLookup::Found(storage) => Some(storage),
            PartLookup::Missing => None,
            PartLookup::Hinted(part_id) => {
                tracing::trace!(part = base, "Waiting for hinted part");
                self.wait_until(|window| {
                    (window.next_part_id().get() > part_id).then(|| Ok(window.part(base)))
                })
                .await?
            }
        };

        self.deliver(storage).await
    }

    async fn deliver(&self, storage: Option<Storage>) -> Result<Delivery> {
        let Some(storage) = storage else {
            return Ok(Delivery::NotFound);
        };
        let reader = storage.reader().await?;
        Ok(Delivery::Content {
            content_type: self.variant.content_type(),
            size: storage.size(),
            reader,
        })
    }

    /// Park until `check` yields a result or the engine closes.
    ///
    /// The `Notified` future is created before the predicate is evaluated so
    /// a wake-up between the check and the await is not lost.
    async fn wait_until<T>(
        &self,
        mut check: impl FnMut(&Window) -> Option<Result<T>>,
    ) -> Result<T> {
        loop {
            let notified = self.notify.notified();
            {
                let window = self.window.lock();
                if window.is_closed() {
                    return Err(Error::Closed);
                }
                if let Some(result) = check(&window) {
                    return result;
                }
            }
            notified.await;
        }
    }
}

fn render(window: &Window, delta: bool) -> Bytes {
    Bytes::from(generate_media_playlist(&window.render(delta)))
}

/// Parse an optional numeric reload parameter. An empty value counts as
/// absent.
fn parse_reload_param(name: &str, value: Option<&str>) -> Result<Option<u64>> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| Error::validation(format!("invalid {name}: '{raw}'"))),
    }
}
