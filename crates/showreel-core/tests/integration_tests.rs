//! Integration tests for Showreel Core

use showreel_core::{
    format_time, sim::{SimHost, SimSurface}, ActiveVideoRegistry, Error, MediaEvent, MediaSurface,
    PlaybackState, PlayerConfig, TrackBounds, VideoPlayer,
};
use std::time::Duration;

const TRACK: TrackBounds = TrackBounds { left: 100.0, width: 800.0 };

fn interactive(host: &SimHost, registry: &ActiveVideoRegistry, source: &str) -> VideoPlayer<SimSurface> {
    let mut player =
        VideoPlayer::interactive(source, PlayerConfig::interactive(), host.env(), registry.clone())
            .unwrap();
    host.pump(&mut [&mut player]);
    player
}

fn page(duration: Option<f64>) -> (SimHost, ActiveVideoRegistry) {
    let host = SimHost::new();
    host.set_media_duration(duration);
    (host, ActiveVideoRegistry::new())
}

// =============================================================================
// Time Formatting
// =============================================================================

#[test]
fn test_format_time_examples() {
    assert_eq!(format_time(65.0), "01:05");
    assert_eq!(format_time(0.0), "00:00");
    assert_eq!(format_time(3599.0), "59:59");
    assert_eq!(format_time(59.9), "00:59");
}

// =============================================================================
// Hover & Unknown Duration
// =============================================================================

#[test]
fn test_hover_maps_pointer_to_time() {
    let (host, registry) = page(Some(200.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    // 300 px into an 800 px track
    player.track_hover(400.0, TRACK).unwrap();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.tooltip_fraction, 0.375);
    assert_eq!(snapshot.tooltip_time, 75.0);

    // Clamped outside the track
    player.track_hover(2_000.0, TRACK).unwrap();
    assert_eq!(player.snapshot().tooltip_time, 200.0);
}

#[test]
fn test_unknown_duration_hides_handle() {
    let (host, registry) = page(None);
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    player.track_hover(500.0, TRACK).unwrap();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.progress, 0.0);
    assert_eq!(snapshot.duration_label, "00:00");
    assert!(!snapshot.tooltip_visible);
    assert!(!snapshot.handle_visible);

    assert!(!player.begin_drag().unwrap());
    assert_eq!(host.listener_count(), 0);
}

#[test]
fn test_zero_duration_hides_handle() {
    let (host, registry) = page(Some(0.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");
    assert_eq!(player.duration(), Some(0.0));

    player.track_hover(500.0, TRACK).unwrap();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.progress, 0.0);
    assert_eq!(snapshot.tooltip_time, 0.0);
    assert!(!snapshot.tooltip_visible);
    assert!(!snapshot.handle_visible);

    assert!(!player.begin_drag().unwrap());
    assert!(!player.is_dragging());
    assert_eq!(host.listener_count(), 0);
}

// =============================================================================
// Drag Scrubbing
// =============================================================================

#[test]
fn test_drag_owns_position() {
    let (host, registry) = page(Some(120.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");
    player.toggle_play().unwrap();

    assert!(player.begin_drag().unwrap());
    assert!(player.surface().is_paused());
    assert!(player.is_playing());
    assert_eq!(host.listener_count(), 1);

    player.drag_move(500.0, TRACK).unwrap();
    assert_eq!(player.current_time(), 60.0);
    assert!(player.has_pending_seek());

    // Native time updates are ignored while dragging
    player.surface().set_playhead(5.0);
    player.handle_event(MediaEvent::TimeUpdate);
    host.pump(&mut [&mut player]);
    assert_eq!(player.current_time(), 60.0);
    assert_eq!(player.surface().current_time(), 60.0);
    assert!(!player.has_pending_seek());
}

#[test]
fn test_drag_seeks_coalesce_per_frame() {
    let (host, registry) = page(Some(120.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    assert!(player.begin_drag().unwrap());
    player.drag_move(200.0, TRACK).unwrap();
    player.drag_move(300.0, TRACK).unwrap();
    player.drag_move(500.0, TRACK).unwrap();
    assert_eq!(host.pending_frame_count(), 1);

    host.pump(&mut [&mut player]);
    assert_eq!(player.surface().seeks(), vec![60.0]);
}

#[test]
fn test_resume_after_settle_delay() {
    let (host, registry) = page(Some(120.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");
    player.toggle_play().unwrap();

    player.begin_drag().unwrap();
    player.drag_move(300.0, TRACK).unwrap();
    player.end_drag().unwrap();
    assert_eq!(host.listener_count(), 0);

    host.run_for(Duration::from_millis(49), &mut [&mut player]);
    assert!(player.surface().is_paused());

    host.run_for(Duration::from_millis(1), &mut [&mut player]);
    assert!(!player.surface().is_paused());
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn test_no_resume_when_paused_before_drag() {
    let (host, registry) = page(Some(120.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    player.begin_drag().unwrap();
    player.drag_move(700.0, TRACK).unwrap();
    player.end_drag().unwrap();

    assert_eq!(host.pending_timer_count(), 0);
    host.run_for(Duration::from_millis(100), &mut [&mut player]);
    assert!(player.surface().is_paused());
    assert_eq!(player.current_time(), 90.0);
}

#[test]
fn test_no_resume_after_deactivation_mid_drag() {
    let (host, registry) = page(Some(120.0));
    let mut a = interactive(&host, &registry, "/video/a.m3u8");
    let mut b = interactive(&host, &registry, "/video/b.m3u8");
    a.toggle_play().unwrap();

    a.begin_drag().unwrap();
    b.toggle_play().unwrap();
    host.pump(&mut [&mut a, &mut b]);
    assert_eq!(a.state(), PlaybackState::Paused);

    a.end_drag().unwrap();
    host.run_for(Duration::from_millis(100), &mut [&mut a, &mut b]);
    assert!(a.surface().is_paused());
    assert!(b.is_playing());
}

#[test]
fn test_unmount_mid_drag_releases_listeners() {
    let (host, registry) = page(Some(120.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");
    player.toggle_play().unwrap();
    player.begin_drag().unwrap();
    player.drag_move(600.0, TRACK).unwrap();
    assert_eq!(host.listener_count(), 1);

    player.unmount();
    assert_eq!(host.listener_count(), 0);
    assert_eq!(host.pending_frame_count(), 0);
    assert_eq!(host.pending_timer_count(), 0);
    assert_eq!(host.live_session_count(), 0);
    assert_eq!(registry.active(), None);
}

// =============================================================================
// Single Active Video
// =============================================================================

#[test]
fn test_only_one_player_plays() {
    let (host, registry) = page(Some(60.0));
    let mut a = interactive(&host, &registry, "/video/a.m3u8");
    let mut b = interactive(&host, &registry, "/video/b.m3u8");
    let mut c = interactive(&host, &registry, "/video/c.m3u8");

    a.toggle_play().unwrap();
    b.toggle_play().unwrap();
    host.pump(&mut [&mut a, &mut b, &mut c]);

    assert_eq!(a.state(), PlaybackState::Paused);
    assert!(a.surface().is_paused());
    assert!(b.is_playing());
    assert_eq!(c.state(), PlaybackState::Unstarted);
    assert_eq!(registry.active().as_deref(), Some("/video/b.m3u8"));

    c.activate().unwrap();
    host.pump(&mut [&mut a, &mut b, &mut c]);
    let playing: Vec<&str> = [&a, &b, &c]
        .into_iter()
        .filter(|p| p.is_playing())
        .map(|p| p.source())
        .collect();
    assert_eq!(playing, vec!["/video/c.m3u8"]);
}

#[test]
fn test_parent_observes_active_video() {
    let (host, registry) = page(Some(60.0));
    let mut watch = registry.subscribe();
    let mut a = interactive(&host, &registry, "/video/a.m3u8");

    a.toggle_play().unwrap();
    assert_eq!(watch.take_change(), Some(Some("/video/a.m3u8".to_string())));
    a.toggle_play().unwrap();
    assert_eq!(watch.take_change(), Some(None));
}

#[test]
fn test_second_player_takes_fullscreen() {
    let (host, registry) = page(Some(60.0));
    let mut a = interactive(&host, &registry, "/video/a.m3u8");
    let mut b = interactive(&host, &registry, "/video/b.m3u8");

    a.activate().unwrap();
    b.activate().unwrap();
    host.pump(&mut [&mut a, &mut b]);

    assert!(!a.is_fullscreen());
    assert!(b.is_fullscreen());
    assert!(!a.is_playing());
}

// =============================================================================
// Ended & Rejection
// =============================================================================

#[test]
fn test_ended_rewinds_and_releases() {
    let (host, registry) = page(Some(30.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");
    player.toggle_play().unwrap();
    player.track_click(800.0, TRACK).unwrap();

    host.emit(player.surface(), MediaEvent::Ended);
    host.pump(&mut [&mut player]);

    assert_eq!(player.state(), PlaybackState::Ended);
    assert_eq!(player.current_time(), 0.0);
    assert_eq!(player.surface().current_time(), 0.0);
    assert_eq!(registry.active(), None);
    assert!(!player.snapshot().is_playing);
}

#[test]
fn test_blocked_play_reverts() {
    let (host, registry) = page(Some(30.0));
    host.set_autoplay_blocked(true);
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    player.toggle_play().unwrap();
    assert!(player.is_playing());
    host.pump(&mut [&mut player]);

    assert_eq!(player.state(), PlaybackState::Paused);
    assert_eq!(registry.active(), None);
}

#[test]
fn test_refused_fullscreen_keeps_playing() {
    let (host, registry) = page(Some(30.0));
    host.set_fullscreen_allowed(false);
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    player.activate().unwrap();
    assert!(!player.is_fullscreen());
    assert!(player.is_playing());
}

// =============================================================================
// Background Player
// =============================================================================

#[test]
fn test_background_autoplays_muted() {
    let (host, registry) = page(Some(12.0));
    let mut hero = VideoPlayer::background("/video/hero.m3u8", PlayerConfig::background(), host.env()).unwrap();
    host.pump(&mut [&mut hero]);

    assert!(hero.is_playing());
    assert!(hero.surface().is_muted());
    assert!(!hero.surface().is_paused());
    assert_eq!(registry.active(), None);
    assert!(matches!(hero.toggle_play(), Err(Error::NotInteractive)));
    assert!(matches!(hero.begin_drag(), Err(Error::NotInteractive)));
}

#[test]
fn test_background_autoplay_on_native_path() {
    let (host, _registry) = page(Some(12.0));
    host.set_engine_supported(false);
    let mut hero = VideoPlayer::background("/video/hero.m3u8", PlayerConfig::background(), host.env()).unwrap();
    assert!(!hero.is_playing());

    host.pump(&mut [&mut hero]);
    assert!(hero.is_playing());
    assert_eq!(hero.surface().src().as_deref(), Some("/video/hero.m3u8"));
}

#[test]
fn test_background_does_not_silence_interactive() {
    let (host, registry) = page(Some(12.0));
    let mut slide = interactive(&host, &registry, "/video/a.m3u8");
    slide.toggle_play().unwrap();

    let mut hero = VideoPlayer::background("/video/hero.m3u8", PlayerConfig::background(), host.env()).unwrap();
    host.pump(&mut [&mut slide, &mut hero]);

    assert!(slide.is_playing());
    assert!(hero.is_playing());
    assert_eq!(registry.active().as_deref(), Some("/video/a.m3u8"));
}

// =============================================================================
// Stream Loading
// =============================================================================

#[test]
fn test_unplayable_source_mounts_silently() {
    let (host, registry) = page(Some(12.0));
    host.set_engine_supported(false);
    host.set_native_hls(false);
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    assert_eq!(player.duration(), None);
    assert_eq!(host.live_session_count(), 0);
    assert!(player.surface().src().is_none());
    assert_eq!(player.snapshot().duration_label, "00:00");
    player.track_leave().unwrap();
}

#[test]
fn test_sources_swap_one_session_at_a_time() {
    let (host, registry) = page(Some(12.0));
    let mut player = interactive(&host, &registry, "/video/a.m3u8");

    for source in ["/video/b.m3u8", "/video/c.m3u8", "/video/d.m3u8"] {
        player.set_source(source);
        host.pump(&mut [&mut player]);
        assert_eq!(host.live_session_count(), 1);
    }
    assert_eq!(host.destroyed_session_count(), 3);
    assert_eq!(player.source(), "/video/d.m3u8");
}

#[test]
fn test_config_from_json() {
    let config = PlayerConfig::from_json(r#"{ "resume_settle_delay_ms": 120 }"#).unwrap();
    assert_eq!(config.settle_delay(), Duration::from_millis(120));
    assert!(!config.autoplay);
    assert!(PlayerConfig::from_json(r#"{ "resume_settle_delay_ms": 5000 }"#).is_err());
}
