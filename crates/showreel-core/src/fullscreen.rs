//! Fullscreen Coordinator
//!
//! State is set optimistically on request and then re-synchronized from the
//! browser's fullscreen-change notification, so exits the player did not
//! initiate (Esc) are still reflected.

use crate::Result;
use tracing::{info, warn};

/// Fullscreen API for the player's container element
pub trait FullscreenHost {
    /// Ask for the container to go fullscreen. An immediate refusal is an
    /// error; a later refusal shows up as a change notification.
    fn request_fullscreen(&self) -> Result<()>;
    fn exit_fullscreen(&self) -> Result<()>;
}

pub struct FullscreenCoordinator {
    is_fullscreen: bool,
}

impl FullscreenCoordinator {
    pub fn new() -> Self {
        Self { is_fullscreen: false }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn toggle(&mut self, host: &dyn FullscreenHost) {
        if self.is_fullscreen {
            self.exit(host);
        } else {
            self.request(host);
        }
    }

    pub fn request(&mut self, host: &dyn FullscreenHost) {
        match host.request_fullscreen() {
            Ok(()) => self.is_fullscreen = true,
            Err(e) => {
                warn!(error = %e, "Fullscreen request refused");
                self.is_fullscreen = false;
            }
        }
    }

    pub fn exit(&mut self, host: &dyn FullscreenHost) {
        if let Err(e) = host.exit_fullscreen() {
            warn!(error = %e, "Fullscreen exit failed");
        }
        self.is_fullscreen = false;
    }

    /// Browser notification; always wins over the optimistic state
    pub fn on_change(&mut self, active: bool) {
        if self.is_fullscreen != active {
            info!(fullscreen = active, "Fullscreen state synchronized");
        }
        self.is_fullscreen = active;
    }
}

impl Default for FullscreenCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
