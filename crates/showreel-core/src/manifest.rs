//! Manifest detection and HLS master-playlist inspection

use crate::{Error, Rendition, Resolution, Result};
use m3u8_rs::MasterPlaylist;
use tracing::debug;
use url::Url;

/// Manifest types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestType {
    Hls,
    Dash,
}

impl ManifestType {
    /// MIME type probed with `canPlayType` for native playback
    pub fn mime_type(&self) -> &'static str {
        match self {
            ManifestType::Hls => "application/vnd.apple.mpegurl",
            ManifestType::Dash => "application/dash+xml",
        }
    }
}

/// Detect manifest type from the source path. Relative sources
/// ("/video/intro.m3u8") are resolved against a dummy origin, and query
/// strings are ignored.
pub fn detect_manifest_type(source: &str) -> ManifestType {
    let path = Url::parse(source)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(source)))
        .map(|url| url.path().to_lowercase())
        .unwrap_or_else(|_| source.to_lowercase());

    if cfg!(feature = "dash") && path.ends_with(".mpd") {
        return ManifestType::Dash;
    }

    // Default to HLS
    ManifestType::Hls
}

/// Parse the variants of an HLS master playlist, in manifest order
pub fn parse_master_playlist(content: &str) -> Result<Vec<Rendition>> {
    let master: MasterPlaylist = m3u8_rs::parse_master_playlist_res(content.as_bytes())
        .map_err(|e| Error::ManifestParse(format!("Failed to parse HLS master: {:?}", e)))?;

    let renditions: Vec<Rendition> = master
        .variants
        .iter()
        .filter(|v| !v.is_i_frame)
        .map(|v| Rendition {
            bandwidth: v.bandwidth,
            resolution: v.resolution.map(|r| Resolution::new(r.width as u32, r.height as u32)),
            uri: v.uri.clone(),
        })
        .collect();

    if renditions.is_empty() {
        return Err(Error::ManifestParse("master playlist has no variants".to_string()));
    }

    debug!(variants = renditions.len(), "Master playlist parsed");
    Ok(renditions)
}

/// Index of the highest-bitrate rendition. Ties go to the later entry, which
/// matches engines that list levels in ascending order.
pub fn select_highest(renditions: &[Rendition]) -> Option<usize> {
    renditions
        .iter()
        .enumerate()
        .max_by_key(|(_, r)| r.bandwidth)
        .map(|(index, _)| index)
}
