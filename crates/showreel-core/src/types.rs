//! Core types for Showreel

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a player participates on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMode {
    /// Autoplaying, muted, no controls, never registered as active
    Background,
    /// Manual controls, scrubber, fullscreen, single-active coordination
    Interactive,
}

impl std::fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerMode::Background => write!(f, "background"),
            PlayerMode::Interactive => write!(f, "interactive"),
        }
    }
}

/// Playback state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Mounted, never played
    Unstarted,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Reached the end; position already reset to 0
    Ended,
}

impl PlaybackState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, target),
            (Unstarted, Playing) | (Unstarted, Paused) |
            (Playing, Paused) | (Playing, Ended) |
            (Paused, Playing) |
            (Ended, Paused)
        )
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Unstarted => write!(f, "unstarted"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Ended => write!(f, "ended"),
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One rendition ("level") of an adaptive stream, in engine order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Video resolution, if advertised
    pub resolution: Option<Resolution>,
    /// Variant playlist URI as written in the manifest
    #[serde(default)]
    pub uri: String,
}

impl Rendition {
    pub fn new(bandwidth: u64, resolution: Option<Resolution>) -> Self {
        Self {
            bandwidth,
            resolution,
            uri: String::new(),
        }
    }

    /// Tier name for logs ("1080p", or the bitrate when no resolution is known)
    pub fn label(&self) -> String {
        match self.resolution {
            Some(r) => r.quality_name().to_string(),
            None => format!("{}kbps", self.bandwidth / 1000),
        }
    }
}

/// Horizontal extent of the scrub track in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackBounds {
    pub left: f64,
    pub width: f64,
}

impl TrackBounds {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

impl Default for TrackBounds {
    fn default() -> Self {
        Self { left: 0.0, width: 1000.0 }
    }
}

/// Read-only view of a player, handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub source: String,
    pub mode: PlayerMode,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub current_time: f64,
    /// `None` until metadata has loaded
    pub duration: Option<f64>,
    /// Fraction of the track filled, 0 when duration is unknown
    pub progress: f64,
    pub is_fullscreen: bool,
    pub is_dragging: bool,
    pub was_playing_before_drag: bool,
    pub tooltip_time: f64,
    pub tooltip_fraction: f64,
    pub tooltip_visible: bool,
    /// Handle is hidden when duration is unknown or zero
    pub handle_visible: bool,
    pub has_ever_been_activated: bool,
    pub current_label: String,
    pub duration_label: String,
    pub tooltip_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_transitions() {
        assert!(PlaybackState::Unstarted.can_transition_to(PlaybackState::Playing));
        assert!(PlaybackState::Playing.can_transition_to(PlaybackState::Paused));
        assert!(PlaybackState::Paused.can_transition_to(PlaybackState::Playing));
        assert!(PlaybackState::Playing.can_transition_to(PlaybackState::Ended));
        assert!(PlaybackState::Ended.can_transition_to(PlaybackState::Paused));

        assert!(!PlaybackState::Ended.can_transition_to(PlaybackState::Playing));
        assert!(!PlaybackState::Paused.can_transition_to(PlaybackState::Unstarted));
        assert!(!PlaybackState::Paused.can_transition_to(PlaybackState::Ended));
    }

    #[test]
    fn test_rendition_label() {
        let hd = Rendition::new(5_000_000, Some(Resolution::new(1920, 1080)));
        assert_eq!(hd.label(), "1080p");
        let audio_only = Rendition::new(128_000, None);
        assert_eq!(audio_only.label(), "128kbps");
    }
}
