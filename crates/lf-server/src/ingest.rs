//! HTTP ingest adapter.
//!
//! [`Ingest`] plays the producer role for the playlist engine: an external
//! packager uploads the init segment, parts and complete segments, and the
//! adapter assigns ids in arrival order, stores the payloads, groups parts
//! into their parent segment and hands everything to the engine.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use lf_core::config::MuxerConfig;
use lf_core::{Error, MuxerVariant, PartId, Result, SegmentId, StorageKind};
use lf_media::{Fmp4Segment, MpegTsSegment, Part, Segment, Storage};

use crate::engine::PlaylistEngine;

/// Producer-side counters. Held across payload writes so uploads are
/// finalized in the order they were accepted.
///
/// In-progress parts are owned by the engine's window alone, so closing the
/// engine releases them.
#[derive(Debug, Default)]
struct IngestState {
    next_segment_id: SegmentId,
    next_part_id: PartId,
}

pub struct Ingest {
    engine: Arc<PlaylistEngine>,
    variant: MuxerVariant,
    storage: StorageKind,
    directory: Option<PathBuf>,
    state: Mutex<IngestState>,
}

impl Ingest {
    pub fn new(config: &MuxerConfig, engine: Arc<PlaylistEngine>) -> Self {
        Self {
            engine,
            variant: config.variant,
            storage: config.storage,
            directory: config.directory.clone(),
            state: Mutex::new(IngestState {
                next_segment_id: SegmentId::new(config.start_segment_id),
                ..IngestState::default()
            }),
        }
    }

    /// Store a new `init.mp4`.
    pub async fn put_init(&self, data: Bytes) -> Result<()> {
        if !self.variant.is_fmp4() {
            return Err(Error::validation(format!(
                "init segments are not used by the {} variant",
                self.variant
            )));
        }
        self.ensure_open()?;

        let storage = self.store(data).await?;
        self.engine.set_init_segment(storage);
        Ok(())
    }

    /// Finalize a part of the segment currently being assembled.
    pub async fn push_part(
        &self,
        data: Bytes,
        duration: Duration,
        independent: bool,
    ) -> Result<PartId> {
        if self.variant != MuxerVariant::LowLatency {
            return Err(Error::validation(format!(
                "parts require the low_latency variant, not {}",
                self.variant
            )));
        }
        self.ensure_open()?;

        let mut state = self.state.lock().await;
        let storage = self.store(data).await?;

        let id = state.next_part_id;
        let part = Arc::new(Part::new(id, duration, independent, storage));
        state.next_part_id = id.next();

        self.engine.on_part_finalized(part);
        Ok(id)
    }

    /// Finalize a complete segment. For fMP4 variants the parts uploaded
    /// since the previous segment become its parts.
    pub async fn push_segment(
        &self,
        data: Bytes,
        duration: Duration,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<SegmentId> {
        self.ensure_open()?;

        let mut state = self.state.lock().await;
        let storage = self.store(data).await?;

        let id = state.next_segment_id;
        let start_time = start_time.unwrap_or_else(|| {
            Utc::now()
                - chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
        });

        let segment = match self.variant {
            MuxerVariant::MpegTs => Segment::MpegTs(MpegTsSegment {
                id,
                start_time,
                duration,
                storage,
            }),
            MuxerVariant::Fmp4 | MuxerVariant::LowLatency => Segment::Fmp4(Fmp4Segment {
                id,
                start_time,
                duration,
                parts: self.engine.pending_parts(),
                storage,
            }),
        };
        state.next_segment_id = id.next();

        self.engine.on_segment_finalized(segment);
        Ok(id)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.engine.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    async fn store(&self, data: Bytes) -> Result<Storage> {
        if data.is_empty() {
            return Err(Error::validation("payload is empty"));
        }
        match self.storage {
            StorageKind::Memory => Ok(Storage::memory(data)),
            StorageKind::Disk => {
                let directory = self.directory.clone();
                tokio::task::spawn_blocking(move || {
                    Storage::store(StorageKind::Disk, directory.as_deref(), data)
                })
                .await
                .map_err(|e| Error::Internal(format!("spool task failed: {e}")))?
            }
        }
    }
}

/// Parse a duration given in (fractional) seconds.
pub fn parse_duration_secs(name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::validation(format!("{name} must be a positive number of seconds")));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::validation(format!("invalid {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Delivery, ReloadParams};
    use lf_core::events::EventBus;

    fn setup(config: MuxerConfig) -> (Arc<PlaylistEngine>, Ingest) {
        let engine = Arc::new(PlaylistEngine::new(&config, Arc::new(EventBus::default())));
        let ingest = Ingest::new(&config, engine.clone());
        (engine, ingest)
    }

    fn config(variant: MuxerVariant) -> MuxerConfig {
        MuxerConfig {
            variant,
            ..MuxerConfig::default()
        }
    }

    async fn playlist(engine: &PlaylistEngine) -> String {
        match engine
            .handle_request("stream.m3u8", &ReloadParams::default())
            .await
            .unwrap()
        {
            Delivery::Playlist(bytes) => String::from_utf8(bytes.to_vec()).unwrap(),
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[tokio::test]
    async fn assigns_ids_from_start_segment_id() {
        let (engine, ingest) = setup(MuxerConfig {
            variant: MuxerVariant::MpegTs,
            start_segment_id: 100,
            ..MuxerConfig::default()
        });

        let first = ingest
            .push_segment(Bytes::from_static(b"a"), Duration::from_secs(1), None)
            .await
            .unwrap();
        let second = ingest
            .push_segment(Bytes::from_static(b"b"), Duration::from_secs(1), None)
            .await
            .unwrap();

        assert_eq!(first, SegmentId::new(100));
        assert_eq!(second, SegmentId::new(101));
        let text = playlist(&engine).await;
        assert!(text.contains("seg100.ts\n"));
        assert!(text.contains("seg101.ts\n"));
    }

    #[tokio::test]
    async fn parts_are_grouped_into_next_segment() {
        let (engine, ingest) = setup(config(MuxerVariant::LowLatency));

        for i in 0..3 {
            let id = ingest
                .push_part(Bytes::from_static(b"moof"), Duration::from_millis(333), i == 0)
                .await
                .unwrap();
            assert_eq!(id, PartId::new(i));
        }
        ingest
            .push_segment(Bytes::from_static(b"segment"), Duration::from_secs(1), None)
            .await
            .unwrap();
        ingest
            .push_part(Bytes::from_static(b"moof"), Duration::from_millis(333), true)
            .await
            .unwrap();

        let text = playlist(&engine).await;
        let seg0 = text.find("seg0.mp4").unwrap();
        for name in ["part0.mp4", "part1.mp4", "part2.mp4"] {
            assert!(text.find(name).unwrap() < seg0, "{name} must precede seg0");
        }
        assert!(text.find("part3.mp4").unwrap() > seg0);
        assert!(text.contains("#EXT-X-PRELOAD-HINT:TYPE=PART,URI=\"part4.mp4\""));
        assert_eq!(engine.stats().pending_parts, 1);
    }

    #[tokio::test]
    async fn parts_need_low_latency() {
        let (_engine, ingest) = setup(config(MuxerVariant::Fmp4));
        let err = ingest
            .push_part(Bytes::from_static(b"moof"), Duration::from_millis(200), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn init_needs_fmp4() {
        let (_engine, ingest) = setup(config(MuxerVariant::MpegTs));
        let err = ingest.put_init(Bytes::from_static(b"ftyp")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let (_engine, ingest) = setup(config(MuxerVariant::MpegTs));
        let err = ingest
            .push_segment(Bytes::new(), Duration::from_secs(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn ingest_after_close_fails() {
        let (engine, ingest) = setup(config(MuxerVariant::MpegTs));
        engine.close();
        let err = ingest
            .push_segment(Bytes::from_static(b"a"), Duration::from_secs(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Closed));
    }

    #[tokio::test]
    async fn disk_storage_spools_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, ingest) = setup(MuxerConfig {
            variant: MuxerVariant::MpegTs,
            storage: StorageKind::Disk,
            directory: Some(dir.path().to_path_buf()),
            segment_count: 1,
            ..MuxerConfig::default()
        });

        ingest
            .push_segment(Bytes::from_static(b"first"), Duration::from_secs(1), None)
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        // Evicting the first segment deletes its spool file.
        ingest
            .push_segment(Bytes::from_static(b"second"), Duration::from_secs(1), None)
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        engine.close();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn close_releases_spooled_in_progress_parts() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, ingest) = setup(MuxerConfig {
            variant: MuxerVariant::LowLatency,
            storage: StorageKind::Disk,
            directory: Some(dir.path().to_path_buf()),
            ..MuxerConfig::default()
        });

        ingest
            .push_part(Bytes::from_static(b"partdata"), Duration::from_millis(200), true)
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(engine.pending_parts().len(), 1);

        engine.close();
        assert!(engine.pending_parts().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn parse_duration_rejects_non_positive() {
        assert_eq!(
            parse_duration_secs("duration", 1.5).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(parse_duration_secs("duration", 0.0).is_err());
        assert!(parse_duration_secs("duration", -2.0).is_err());
        assert!(parse_duration_secs("duration", f64::NAN).is_err());
        assert!(parse_duration_secs("duration", f64::INFINITY).is_err());
    }
}
