//! Player configuration

use crate::{Error, PlayerMode, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest settle delay accepted before resuming after a drag
const MAX_SETTLE_DELAY_MS: u64 = 1_000;

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Background or interactive
    pub mode: PlayerMode,
    /// Request playback as soon as the stream is ready
    pub autoplay: bool,
    /// Start with audio muted
    pub muted: bool,
    /// Force the highest-bitrate rendition once the manifest is parsed
    pub force_highest_quality: bool,
    /// Delay between drag end and resuming playback (milliseconds)
    pub resume_settle_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl PlayerConfig {
    /// Slide-deck player: manual play, sound on
    pub fn interactive() -> Self {
        Self {
            mode: PlayerMode::Interactive,
            autoplay: false,
            muted: false,
            force_highest_quality: true,
            resume_settle_delay_ms: 50,
        }
    }

    /// Full-screen hero video: autoplay, muted, no controls
    pub fn background() -> Self {
        Self {
            mode: PlayerMode::Background,
            autoplay: true,
            muted: true,
            force_highest_quality: true,
            resume_settle_delay_ms: 50,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.resume_settle_delay_ms)
    }

    /// Parse from a JSON document, then validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resume_settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(Error::InvalidConfig(format!(
                "resume_settle_delay_ms must be at most {MAX_SETTLE_DELAY_MS}, got {}",
                self.resume_settle_delay_ms
            )));
        }
        if self.mode == PlayerMode::Background && !self.muted && self.autoplay {
            return Err(Error::InvalidConfig(
                "background autoplay requires muted audio".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let interactive = PlayerConfig::interactive();
        assert_eq!(interactive.mode, PlayerMode::Interactive);
        assert!(!interactive.autoplay);
        assert_eq!(interactive.settle_delay(), Duration::from_millis(50));

        let background = PlayerConfig::background();
        assert!(background.autoplay && background.muted);
        assert!(background.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = PlayerConfig::from_json(r#"{ "resume_settle_delay_ms": 80 }"#).unwrap();
        assert_eq!(config.resume_settle_delay_ms, 80);
        assert_eq!(config.mode, PlayerMode::Interactive);
        assert!(config.force_highest_quality);
    }

    #[test]
    fn test_rejects_long_settle_delay() {
        let err = PlayerConfig::from_json(r#"{ "resume_settle_delay_ms": 5000 }"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_rejects_unmuted_background_autoplay() {
        let config = PlayerConfig {
            muted: false,
            ..PlayerConfig::background()
        };
        assert!(config.validate().is_err());
    }
}
