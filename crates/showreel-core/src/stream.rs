//! Stream Loader - binds a manifest URL to a playback surface
//!
//! Prefers the adaptive-streaming engine (hls.js in the browser) and falls back
//! to native manifest playback. Exactly one engine session exists per loader;
//! attaching a new source destroys the previous session first.

use crate::{
    manifest::{detect_manifest_type, select_highest},
    surface::MediaSurface,
    Error, Rendition, Result, SessionId,
};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Adaptive-streaming engine
pub trait StreamEngine<S: ?Sized> {
    /// Whether the runtime can host the engine (MSE available)
    fn is_supported(&self) -> bool;

    /// Create a session, load `source` and attach it to `surface`. The host
    /// reports [`MediaEvent::ManifestParsed`](crate::MediaEvent) once the
    /// manifest is available.
    fn create_session(&self, source: &str, surface: &S) -> Box<dyn StreamSession>;
}

/// Engine resources bound to one source and one surface
pub trait StreamSession {
    /// Renditions in engine order
    fn levels(&self) -> Vec<Rendition>;
    fn set_current_level(&mut self, index: usize);
    /// Release decoder and network resources
    fn destroy(&mut self);
}

/// How the current source reached the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAttachment {
    /// Nothing attached yet, or detached
    Detached,
    /// Through an engine session
    Engine,
    /// Manifest assigned directly as the surface source
    Native,
}

/// Engine session that is destroyed when dropped
struct ActiveSession {
    id: SessionId,
    session: Box<dyn StreamSession>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        debug!(session_id = %self.id, "Destroying stream session");
        self.session.destroy();
    }
}

/// Stream loader for one player
pub struct StreamLoader<S: ?Sized> {
    engine: Rc<dyn StreamEngine<S>>,
    force_highest_quality: bool,
    source: Option<String>,
    session: Option<ActiveSession>,
    attachment: StreamAttachment,
    selected_level: Option<usize>,
}

impl<S: MediaSurface + ?Sized> StreamLoader<S> {
    pub fn new(engine: Rc<dyn StreamEngine<S>>, force_highest_quality: bool) -> Self {
        Self {
            engine,
            force_highest_quality,
            source: None,
            session: None,
            attachment: StreamAttachment::Detached,
            selected_level: None,
        }
    }

    /// Attach `source` to `surface`, disposing whatever was attached before.
    /// Fails with [`Error::StreamUnsupported`] when neither the engine nor the
    /// surface can play the manifest; the caller treats that as unplayable media.
    pub fn attach(&mut self, source: &str, surface: &S) -> Result<StreamAttachment> {
        self.detach();
        self.source = Some(source.to_string());

        if self.engine.is_supported() {
            let id = SessionId::new();
            let session = self.engine.create_session(source, surface);
            info!(session_id = %id, source, "Stream session created");
            self.session = Some(ActiveSession { id, session });
            self.attachment = StreamAttachment::Engine;
        } else {
            let mime = detect_manifest_type(source).mime_type();
            if !surface.can_play_type(mime) {
                warn!(source, mime, "No playback path for source");
                return Err(Error::StreamUnsupported {
                    source_url: source.to_string(),
                });
            }
            surface.set_src(source);
            info!(source, mime, "Using native manifest playback");
            self.attachment = StreamAttachment::Native;
        }

        Ok(self.attachment)
    }

    /// Apply the quality policy once the engine has parsed the manifest.
    /// Returns the forced level index, if any.
    pub fn on_manifest_parsed(&mut self) -> Option<usize> {
        if !self.force_highest_quality {
            return None;
        }
        let active = self.session.as_mut()?;
        let levels = active.session.levels();
        let index = select_highest(&levels)?;

        active.session.set_current_level(index);
        self.selected_level = Some(index);
        info!(
            session_id = %active.id,
            level = index,
            quality = %levels[index].label(),
            bandwidth = levels[index].bandwidth,
            "Forced highest rendition"
        );
        Some(index)
    }

    /// Destroy the engine session, if any
    pub fn detach(&mut self) {
        self.session = None;
        self.selected_level = None;
        self.attachment = StreamAttachment::Detached;
    }

    pub fn attachment(&self) -> StreamAttachment {
        self.attachment
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn selected_level(&self) -> Option<usize> {
        self.selected_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimHost;
    use crate::Resolution;

    fn ladder() -> Vec<Rendition> {
        vec![
            Rendition::new(800_000, Some(Resolution::new(640, 360))),
            Rendition::new(2_800_000, Some(Resolution::new(1280, 720))),
            Rendition::new(5_000_000, Some(Resolution::new(1920, 1080))),
        ]
    }

    #[test]
    fn test_engine_path_forces_highest_level() {
        let host = SimHost::new();
        host.set_levels(ladder());
        let surface = host.surface();
        let mut loader = StreamLoader::new(host.engine(), true);

        assert_eq!(loader.attach("/video/rul.m3u8", &*surface).unwrap(), StreamAttachment::Engine);
        assert_eq!(host.live_session_count(), 1);

        assert_eq!(loader.on_manifest_parsed(), Some(2));
        assert_eq!(host.selected_level(), Some(2));
    }

    #[test]
    fn test_quality_left_to_engine_when_not_forced() {
        let host = SimHost::new();
        host.set_levels(ladder());
        let surface = host.surface();
        let mut loader = StreamLoader::new(host.engine(), false);

        loader.attach("/video/rul.m3u8", &*surface).unwrap();
        assert_eq!(loader.on_manifest_parsed(), None);
        assert_eq!(host.selected_level(), None);
    }

    #[test]
    fn test_source_change_disposes_previous_session() {
        let host = SimHost::new();
        let surface = host.surface();
        let mut loader = StreamLoader::new(host.engine(), true);

        loader.attach("/video/a.m3u8", &*surface).unwrap();
        let first = loader.session_id();
        loader.attach("/video/b.m3u8", &*surface).unwrap();

        assert_ne!(loader.session_id(), first);
        assert_eq!(host.live_session_count(), 1);
        assert_eq!(host.destroyed_session_count(), 1);
        assert_eq!(loader.source(), Some("/video/b.m3u8"));
    }

    #[test]
    fn test_native_fallback_assigns_src() {
        let host = SimHost::new();
        host.set_engine_supported(false);
        let surface = host.surface();
        let mut loader = StreamLoader::new(host.engine(), true);

        assert_eq!(loader.attach("/video/rul.m3u8", &*surface).unwrap(), StreamAttachment::Native);
        assert_eq!(surface.src().as_deref(), Some("/video/rul.m3u8"));
        assert_eq!(host.live_session_count(), 0);
    }

    #[test]
    fn test_no_playback_path() {
        let host = SimHost::new();
        host.set_engine_supported(false);
        host.set_native_hls(false);
        let surface = host.surface();
        let mut loader = StreamLoader::new(host.engine(), true);

        let err = loader.attach("/video/rul.m3u8", &*surface).unwrap_err();
        assert_eq!(err.error_code(), "STREAM_UNSUPPORTED");
        assert_eq!(loader.attachment(), StreamAttachment::Detached);
    }

    #[test]
    fn test_drop_destroys_session() {
        let host = SimHost::new();
        let surface = host.surface();
        {
            let mut loader = StreamLoader::new(host.engine(), true);
            loader.attach("/video/a.m3u8", &*surface).unwrap();
        }
        assert_eq!(host.live_session_count(), 0);
        assert_eq!(host.destroyed_session_count(), 1);
    }
}
