//! Playback surface abstraction and the events it reports

use crate::scheduler::{FrameHandle, TimerHandle};
use serde::{Deserialize, Serialize};

/// A media element the player drives (`<video>` in the browser)
pub trait MediaSurface {
    /// Request playback. A rejection (autoplay policy) is reported later as
    /// [`MediaEvent::PlayRejected`].
    fn play(&self);
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Direct source assignment, for runtimes that play the manifest natively
    fn set_src(&self, url: &str);
    fn can_play_type(&self, mime: &str) -> bool;
    fn set_muted(&self, muted: bool);
}

/// Host notifications delivered to a player, in browser event order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    /// Streaming engine finished parsing the manifest
    ManifestParsed,
    LoadedMetadata { duration: f64 },
    TimeUpdate,
    Ended,
    /// A play request was refused by the browser
    PlayRejected { reason: String },
    /// Document fullscreen element changed; `active` is true when it is this
    /// player's container
    FullscreenChange { active: bool },
    AnimationFrame(FrameHandle),
    Timeout(TimerHandle),
}
