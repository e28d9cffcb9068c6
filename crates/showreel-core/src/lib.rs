//! Showreel Core - Slide-Deck Video Player Library
//!
//! This crate provides the headless core of the showreel video players:
//! - Stream loading through an adaptive engine with native fallback
//! - Play/pause state and the single-active-video registry
//! - Hover preview, click-to-seek and drag scrubbing on the progress track
//! - Fullscreen coordination with the browser
//! - Background (ambient, muted, autoplaying) players
//!
//! Everything the browser provides is reached through host traits
//! ([`MediaSurface`], [`StreamEngine`], [`FrameScheduler`], [`TimerScheduler`],
//! [`DocumentHost`], [`FullscreenHost`]); asynchronous notifications come back
//! through [`VideoPlayer::handle_event`]. The [`sim`] module implements every
//! host trait in memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         VideoPlayer                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │    Stream    │  │   Playback   │  │    Scrub     │          │
//! │  │    Loader    │  │  Controller  │  │    Engine    │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         │          ┌──────┴──────┐          │                   │
//! │         │          │   Active    │          │                   │
//! │         │          │  Registry   │          │                   │
//! │         │          └─────────────┘          │                   │
//! │         │                                   │                   │
//! │  ┌──────┴───────────────────────────────────┴──────┐           │
//! │  │  Host: surface, engine, frames, timers, document │           │
//! │  └──────────────────────────────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod time;
pub mod config;
pub mod registry;
pub mod scheduler;
pub mod surface;
pub mod manifest;
pub mod stream;
pub mod fullscreen;
pub mod playback;
pub mod scrub;
pub mod player;
pub mod sim;

pub use error::{Error, Result};
pub use types::*;
pub use time::format_time;
pub use config::PlayerConfig;
pub use registry::{ActiveVideoRegistry, RegistryWatch};
pub use scheduler::{FrameHandle, FrameScheduler, TimerHandle, TimerScheduler};
pub use surface::{MediaEvent, MediaSurface};
pub use manifest::{detect_manifest_type, parse_master_playlist, ManifestType};
pub use stream::{StreamAttachment, StreamEngine, StreamLoader, StreamSession};
pub use fullscreen::FullscreenHost;
pub use scrub::{DocumentHost, ListenerId};
pub use player::{PlayerEnv, VideoPlayer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library
pub fn init() {
    tracing::info!(version = VERSION, "Showreel Core initialized");
}
