//! Benchmark tests for showreel-core operations
//!
//! Run with: cargo bench -p showreel-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use showreel_core::manifest::{parse_master_playlist, select_highest};
use showreel_core::scrub::track_fraction;
use showreel_core::sim::{SimHost, SimSurface};
use showreel_core::{format_time, ActiveVideoRegistry, PlayerConfig, TrackBounds, VideoPlayer};

const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
720p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p.m3u8
";

fn mounted(host: &SimHost, registry: &ActiveVideoRegistry) -> VideoPlayer<SimSurface> {
    host.set_media_duration(Some(600.0));
    let mut player = VideoPlayer::interactive(
        "/video/bench.m3u8",
        PlayerConfig::interactive(),
        host.env(),
        registry.clone(),
    )
    .unwrap();
    host.pump(&mut [&mut player]);
    player
}

fn bench_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("time");

    group.bench_function("format_time", |b| {
        b.iter(|| format_time(black_box(3_725.4)))
    });

    group.bench_function("track_fraction", |b| {
        let bounds = TrackBounds::new(120.0, 960.0);
        b.iter(|| track_fraction(black_box(517.0), bounds))
    });

    group.finish();
}

fn bench_manifest(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest");

    group.bench_function("parse_master", |b| {
        b.iter(|| parse_master_playlist(black_box(MASTER)))
    });

    let levels = parse_master_playlist(MASTER).unwrap();
    group.bench_function("select_highest", |b| {
        b.iter(|| select_highest(black_box(&levels)))
    });

    group.finish();
}

fn bench_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag");
    let bounds = TrackBounds::new(0.0, 1000.0);

    for moves in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("moves_per_frame", moves), &moves, |b, &moves| {
            let host = SimHost::new();
            let registry = ActiveVideoRegistry::new();
            let mut player = mounted(&host, &registry);

            b.iter(|| {
                player.begin_drag().unwrap();
                for i in 0..moves {
                    player.drag_move((i % 1000) as f64, bounds).unwrap();
                }
                host.pump(&mut [&mut player]);
                player.end_drag().unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_time, bench_manifest, bench_drag);
criterion_main!(benches);
