//! Scenario scripts: a page of players driven through the simulation host

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use showreel_core::{
    manifest::parse_master_playlist, sim::{SimHost, SimSurface}, ActiveVideoRegistry, MediaEvent,
    PlayerConfig, PlayerMode, PlayerSnapshot, Rendition, TrackBounds, VideoPlayer,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// A scripted page
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Media duration every source reports on load; `null` for unknown
    #[serde(default = "default_duration")]
    pub duration: Option<f64>,
    /// Master playlist whose variants the simulated engine reports
    #[serde(default)]
    pub master_playlist: Option<String>,
    #[serde(default)]
    pub page: PageSettings,
    #[serde(default)]
    pub track: TrackBounds,
    pub players: Vec<PlayerSpec>,
    pub steps: Vec<Step>,
}

fn default_duration() -> Option<f64> {
    Some(120.0)
}

/// Browser capabilities for the run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub engine_supported: bool,
    pub native_hls: bool,
    pub autoplay_blocked: bool,
    pub fullscreen_allowed: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            engine_supported: true,
            native_hls: true,
            autoplay_blocked: false,
            fullscreen_allowed: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSpec {
    pub id: String,
    pub source: String,
    #[serde(default = "default_mode")]
    pub mode: PlayerMode,
}

fn default_mode() -> PlayerMode {
    PlayerMode::Interactive
}

/// One user or browser action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    TogglePlay { player: String },
    Activate { player: String },
    ToggleFullscreen { player: String },
    Hover { player: String, x: f64 },
    Leave { player: String },
    Click { player: String, x: f64 },
    DragStart { player: String },
    DragMove { player: String, x: f64 },
    DragEnd { player: String },
    /// Decoding reached `seconds`; reported as a time update
    Playhead { player: String, seconds: f64 },
    Ended { player: String },
    SetSource { player: String, source: String },
    Unmount { player: String },
    /// User leaves fullscreen with Esc
    Escape,
    Wait { ms: u64 },
    Snapshot { player: String },
}

impl Step {
    pub fn describe(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or_default();
        let action = value["action"].as_str().unwrap_or("?").to_string();
        match value["player"].as_str() {
            Some(player) => format!("{action} {player}"),
            None => action,
        }
    }
}

/// What one step did
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PlayerSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub active: Option<String>,
    pub players: Vec<(String, PlayerSnapshot)>,
    pub elapsed_ms: u128,
}

struct Page {
    host: SimHost,
    registry: ActiveVideoRegistry,
    players: Vec<(String, VideoPlayer<SimSurface>)>,
}

impl Page {
    fn pump(&mut self) {
        let mut players: Vec<_> = self.players.iter_mut().map(|(_, p)| p).collect();
        self.host.pump(&mut players);
    }

    fn wait(&mut self, elapsed: Duration) {
        let mut players: Vec<_> = self.players.iter_mut().map(|(_, p)| p).collect();
        self.host.run_for(elapsed, &mut players);
    }

    fn player(&mut self, id: &str) -> anyhow::Result<&mut VideoPlayer<SimSurface>> {
        self.players
            .iter_mut()
            .find(|(player_id, _)| player_id == id)
            .map(|(_, player)| player)
            .with_context(|| format!("no mounted player '{id}'"))
    }
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        if scenario.players.is_empty() {
            bail!("scenario mounts no players");
        }
        Ok(scenario)
    }

    fn levels(&self) -> anyhow::Result<Vec<Rendition>> {
        match &self.master_playlist {
            Some(content) => Ok(parse_master_playlist(content)?),
            None => Ok(Vec::new()),
        }
    }

    /// Mount every player, run the steps, and report
    pub fn run(&self, config: &PlayerConfig) -> anyhow::Result<Report> {
        let host = SimHost::new();
        host.set_media_duration(self.duration);
        host.set_levels(self.levels()?);
        host.set_engine_supported(self.page.engine_supported);
        host.set_native_hls(self.page.native_hls);
        host.set_autoplay_blocked(self.page.autoplay_blocked);
        host.set_fullscreen_allowed(self.page.fullscreen_allowed);

        let mut page = Page {
            host,
            registry: ActiveVideoRegistry::new(),
            players: Vec::new(),
        };

        for entry in &self.players {
            let env = page.host.env();
            let player = match entry.mode {
                PlayerMode::Interactive => {
                    VideoPlayer::interactive(&entry.source, config.clone(), env, page.registry.clone())?
                }
                PlayerMode::Background => {
                    VideoPlayer::background(&entry.source, PlayerConfig::background(), env)?
                }
            };
            page.players.push((entry.id.clone(), player));
        }
        page.pump();
        info!(players = page.players.len(), "Page mounted");

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, step = %step.describe(), "Step");
            let (result, snapshot) = match self.apply(&mut page, step) {
                Ok(snapshot) => (Ok(()), snapshot),
                Err(e) => (Err(e), None),
            };
            page.pump();
            outcomes.push(StepOutcome {
                index: index + 1,
                step: step.describe(),
                ok: result.is_ok(),
                error: result.err().map(|e| format!("{e:#}")),
                snapshot,
            });
        }

        Ok(Report {
            steps: outcomes,
            active: page.registry.active(),
            players: page
                .players
                .iter()
                .map(|(id, player)| (id.clone(), player.snapshot()))
                .collect(),
            elapsed_ms: page.host.clock().as_millis(),
        })
    }

    fn apply(&self, page: &mut Page, step: &Step) -> anyhow::Result<Option<PlayerSnapshot>> {
        let track = self.track;
        match step {
            Step::TogglePlay { player } => page.player(player)?.toggle_play()?,
            Step::Activate { player } => page.player(player)?.activate()?,
            Step::ToggleFullscreen { player } => page.player(player)?.toggle_fullscreen()?,
            Step::Hover { player, x } => page.player(player)?.track_hover(*x, track)?,
            Step::Leave { player } => page.player(player)?.track_leave()?,
            Step::Click { player, x } => page.player(player)?.track_click(*x, track)?,
            Step::DragStart { player } => {
                if !page.player(player)?.begin_drag()? {
                    bail!("drag not started: duration unknown or already dragging");
                }
            }
            Step::DragMove { player, x } => page.player(player)?.drag_move(*x, track)?,
            Step::DragEnd { player } => page.player(player)?.end_drag()?,
            Step::Playhead { player, seconds } => {
                let player = page.player(player)?;
                player.surface().set_playhead(*seconds);
                player.handle_event(MediaEvent::TimeUpdate);
            }
            Step::Ended { player } => page.player(player)?.handle_event(MediaEvent::Ended),
            Step::SetSource { player, source } => page.player(player)?.set_source(source),
            Step::Unmount { player } => {
                let position = page
                    .players
                    .iter()
                    .position(|(id, _)| id == player)
                    .with_context(|| format!("no mounted player '{player}'"))?;
                let (_, removed) = page.players.remove(position);
                removed.unmount();
            }
            Step::Escape => page.host.press_escape(),
            Step::Wait { ms } => page.wait(Duration::from_millis(*ms)),
            Step::Snapshot { player } => {
                page.pump();
                return Ok(Some(page.player(player)?.snapshot()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showreel_core::PlaybackState;

    const TWO_SLIDES: &str = r#"{
        "duration": 100.0,
        "players": [
            { "id": "a", "source": "/video/a.m3u8" },
            { "id": "b", "source": "/video/b.m3u8" }
        ],
        "steps": [
            { "action": "toggle_play", "player": "a" },
            { "action": "toggle_play", "player": "b" },
            { "action": "snapshot", "player": "a" }
        ]
    }"#;

    #[test]
    fn test_second_player_silences_first() {
        let scenario = Scenario::from_json(TWO_SLIDES).unwrap();
        let report = scenario.run(&PlayerConfig::interactive()).unwrap();

        assert!(report.steps.iter().all(|s| s.ok));
        let a = report.steps[2].snapshot.as_ref().unwrap();
        assert_eq!(a.state, PlaybackState::Paused);
        assert_eq!(report.active.as_deref(), Some("/video/b.m3u8"));
    }

    #[test]
    fn test_drag_then_resume() {
        let json = r#"{
            "players": [{ "id": "a", "source": "/video/a.m3u8" }],
            "steps": [
                { "action": "toggle_play", "player": "a" },
                { "action": "drag_start", "player": "a" },
                { "action": "drag_move", "player": "a", "x": 500 },
                { "action": "drag_end", "player": "a" },
                { "action": "wait", "ms": 50 },
                { "action": "snapshot", "player": "a" }
            ]
        }"#;
        let report = Scenario::from_json(json)
            .unwrap()
            .run(&PlayerConfig::interactive())
            .unwrap();

        let a = report.steps[5].snapshot.as_ref().unwrap();
        assert!(a.is_playing);
        assert_eq!(a.current_time, 60.0);
        assert_eq!(report.elapsed_ms, 50);
    }

    #[test]
    fn test_background_rejects_controls() {
        let json = r#"{
            "players": [{ "id": "hero", "source": "/video/hero.m3u8", "mode": "background" }],
            "steps": [{ "action": "toggle_play", "player": "hero" }]
        }"#;
        let report = Scenario::from_json(json)
            .unwrap()
            .run(&PlayerConfig::interactive())
            .unwrap();

        assert!(!report.steps[0].ok);
        assert!(report.players[0].1.is_playing);
    }

    #[test]
    fn test_unknown_player_is_a_step_error() {
        let json = r#"{
            "players": [{ "id": "a", "source": "/video/a.m3u8" }],
            "steps": [{ "action": "leave", "player": "zz" }]
        }"#;
        let report = Scenario::from_json(json)
            .unwrap()
            .run(&PlayerConfig::interactive())
            .unwrap();
        assert_eq!(report.steps[0].step, "leave zz");
        assert!(report.steps[0].error.as_deref().unwrap().contains("zz"));
    }

    #[test]
    fn test_empty_page_is_rejected() {
        assert!(Scenario::from_json(r#"{ "players": [], "steps": [] }"#).is_err());
    }
}
