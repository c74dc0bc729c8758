//! Benchmarks for playlist rendering.
//!
//! Every playlist request renders the window from scratch under the engine
//! lock, so this is the hot path for blocking reloads.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lf_core::{MuxerVariant, PartId, SegmentId};
use lf_media::{generate_media_playlist, Fmp4Segment, Part, Segment, Storage, Window};
use std::sync::Arc;
use std::time::Duration;

const PARTS_PER_SEGMENT: u64 = 4;

/// Build a low-latency window holding `segments` segments of four parts each.
fn low_latency_window(segments: usize) -> Window {
    let mut window = Window::new(MuxerVariant::LowLatency, segments);
    let mut next_part = 0;

    // The first call bootstraps gaps; keep pushing until they are evicted.
    for id in 0..(segments + 7) as u64 {
        let parts: Vec<Arc<Part>> = (0..PARTS_PER_SEGMENT)
            .map(|i| {
                let part = Arc::new(Part::new(
                    PartId::new(next_part + i),
                    Duration::from_millis(500),
                    i == 0,
                    Storage::memory(vec![0u8; 16 * 1024]),
                ));
                window.on_part_finalized(part.clone());
                part
            })
            .collect();
        next_part += PARTS_PER_SEGMENT;

        window.on_segment_finalized(Segment::Fmp4(Fmp4Segment {
            id: SegmentId::new(id),
            start_time: Utc::now(),
            duration: Duration::from_secs(2),
            parts,
            storage: Storage::memory(vec![0u8; 64 * 1024]),
        }));
    }
    window
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("playlist_render");

    for segments in [7, 30, 120] {
        let window = low_latency_window(segments);

        group.bench_function(format!("full_{segments}"), |b| {
            b.iter(|| black_box(generate_media_playlist(&window.render(false))))
        });

        group.bench_function(format!("delta_{segments}"), |b| {
            b.iter(|| black_box(generate_media_playlist(&window.render(true))))
        });
    }

    group.finish();
}

fn bench_bandwidth(c: &mut Criterion) {
    let window = low_latency_window(30);
    c.bench_function("bandwidth_30", |b| b.iter(|| black_box(window.bandwidth())));
}

criterion_group!(benches, bench_render, bench_bandwidth);
criterion_main!(benches);
