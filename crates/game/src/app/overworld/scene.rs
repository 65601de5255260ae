use std::time::Duration;

use link_engine::app::{ActiveMapState, InputSnapshot, Scene, SceneCommand, SceneLoadError};
use link_engine::content::MapSource;
use link_engine::transition::{LayoutConfig, MapSession, TransitionConfig, TransitionOutcome};
use tracing::{error, info, warn};

use super::movement::movement_delta;

/// Walks the player around the active map and through gates.
pub(crate) struct OverworldScene<S: MapSource> {
    store: Option<S>,
    start_map: String,
    layout: LayoutConfig,
    transitions: TransitionConfig,
    player_speed_px_per_second: f32,
    session: Option<MapSession<S>>,
    transitions_taken: u32,
    reported_gate: Option<i64>,
}

impl<S: MapSource> OverworldScene<S> {
    pub(crate) fn new(
        store: S,
        start_map: impl Into<String>,
        layout: LayoutConfig,
        transitions: TransitionConfig,
        player_speed_px_per_second: f32,
    ) -> Self {
        Self {
            store: Some(store),
            start_map: start_map.into(),
            layout,
            transitions,
            player_speed_px_per_second,
            session: None,
            transitions_taken: 0,
            reported_gate: None,
        }
    }

    pub(crate) fn transitions_taken(&self) -> u32 {
        self.transitions_taken
    }

    fn handle_outcome(&mut self, outcome: TransitionOutcome, now: Duration) -> SceneCommand {
        match outcome {
            TransitionOutcome::Stay => {}
            TransitionOutcome::Transitioned { from, to } => {
                self.transitions_taken = self.transitions_taken.saturating_add(1);
                self.reported_gate = None;
                info!(
                    from = %from,
                    to = %to,
                    transitions_taken = self.transitions_taken,
                    "overworld_map_changed"
                );
            }
            TransitionOutcome::NoPartner { gate_id } => {
                if self.reported_gate != Some(gate_id) {
                    warn!(gate_id, "overworld_gate_unlinked");
                    self.reported_gate = Some(gate_id);
                }
            }
            TransitionOutcome::Stranded { gate_id } => {
                warn!(gate_id, "overworld_stranded_reloading");
                return self.recover(now);
            }
        }
        SceneCommand::None
    }

    /// Reactivates the map the player was on. Quits when even that fails.
    fn recover(&mut self, now: Duration) -> SceneCommand {
        let Some(session) = self.session.as_mut() else {
            return SceneCommand::None;
        };
        let map = session.state().map_name().to_string();
        match session.reload(&map, now) {
            Ok(()) => SceneCommand::None,
            Err(error) => {
                error!(map = %map, error = %error, "overworld_recovery_failed");
                SceneCommand::Quit
            }
        }
    }
}

impl<S: MapSource> Scene for OverworldScene<S> {
    fn load(&mut self) -> Result<(), SceneLoadError> {
        let store = match (self.store.take(), self.session.take()) {
            (Some(store), _) => store,
            (None, Some(session)) => session.into_store(),
            (None, None) => return Err("overworld scene has no map store".into()),
        };
        let session = MapSession::start(
            store,
            &self.start_map,
            self.layout.clone(),
            self.transitions,
        )?;
        info!(
            map = %session.state().map_name(),
            entity_count = session.state().entity_count(),
            "overworld_loaded"
        );
        self.session = Some(session);
        self.transitions_taken = 0;
        self.reported_gate = None;
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt: Duration,
        elapsed: Duration,
        input: &InputSnapshot,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        let delta = movement_delta(input, self.player_speed_px_per_second, fixed_dt);
        let Some(session) = self.session.as_mut() else {
            return SceneCommand::None;
        };

        let state = session.state_mut();
        if let Some(player) = state.player_mut() {
            player.step(delta);
        }
        state.update_frames();

        match session.tick(elapsed) {
            Ok(outcome) => self.handle_outcome(outcome, elapsed),
            Err(error) => {
                let cleared = session.state().is_cleared();
                let gate_id = session.state().active_gate().id;
                if self.reported_gate != Some(gate_id) || cleared {
                    warn!(gate_id, error = %error, "overworld_transition_failed");
                    self.reported_gate = Some(gate_id);
                }
                if cleared {
                    self.recover(elapsed)
                } else {
                    SceneCommand::None
                }
            }
        }
    }

    fn active_map(&self) -> Option<&ActiveMapState> {
        self.session.as_ref().map(MapSession::state)
    }

    fn unload(&mut self) {
        if let Some(session) = self.session.take() {
            self.store = Some(session.into_store());
        }
        info!(transitions_taken = self.transitions_taken, "overworld_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        let state = self.session.as_ref()?.state();
        Some(format!(
            "Link GE | {} | gate {} | transitions {}",
            state.map_name(),
            state.active_gate().id,
            self.transitions_taken
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use link_engine::app::{ContainerKind, InputAction, Vec2};
    use link_engine::content::{CachedMapStore, DirMapStore};
    use link_engine::transition::ClearOrder;
    use tempfile::TempDir;

    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn maps_dir(files: &[(&str, String)]) -> TempDir {
        let temp = TempDir::new().expect("tempdir");
        for (name, body) in files {
            fs::write(temp.path().join(name), body).expect("write fixture");
        }
        temp
    }

    fn map_json(name: &str, gate_id: i64, x: f32, y: f32) -> String {
        format!(
            r#"{{"name":"{name}","image":"maps/{name}.png",
                "gates":{{"gate 1":{{"id":{gate_id},"coords":{{"x":{x},"y":{y}}}}}}}}}"#
        )
    }

    /// A small viewport puts the player at (32, 32), touching the corner of a gate at (0, 0).
    fn layout() -> LayoutConfig {
        LayoutConfig {
            viewport: link_engine::app::Viewport {
                width: 64,
                height: 64,
            },
            ..LayoutConfig::default()
        }
    }

    fn scene_for(temp: &TempDir, clear_order: ClearOrder) -> OverworldScene<DirMapStore> {
        OverworldScene::new(
            DirMapStore::new(temp.path()),
            "town",
            layout(),
            TransitionConfig {
                clear_order,
                ..TransitionConfig::default()
            },
            100.0,
        )
    }

    fn walk_left(scene: &mut OverworldScene<DirMapStore>, elapsed: Duration) -> SceneCommand {
        let input = InputSnapshot::empty().with_action_down(InputAction::MoveLeft, true);
        scene.update(TICK, elapsed, &input)
    }

    #[test]
    fn load_activates_the_start_map() {
        let temp = maps_dir(&[("town meta.json", map_json("town", 7, 0.0, 0.0))]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        scene.load().expect("load");

        let state = scene.active_map().expect("active map");
        assert_eq!(state.map_name(), "town");
        assert_eq!(state.player().expect("player").position(), Vec2::new(32.0, 32.0));
        assert_eq!(
            scene.debug_title().as_deref(),
            Some("Link GE | town | gate 7 | transitions 0")
        );
    }

    #[test]
    fn missing_start_map_fails_to_load() {
        let temp = maps_dir(&[]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        assert!(scene.load().is_err());
        assert!(scene.active_map().is_none());
    }

    #[test]
    fn walking_into_a_linked_gate_changes_map() {
        // Ten pixels to the left keeps both facing edge pairs within tolerance.
        let temp = maps_dir(&[
            ("town meta.json", map_json("town", 7, 0.0, 0.0)),
            ("forest meta.json", map_json("forest", 7, 500.0, 500.0)),
        ]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        scene.load().expect("load");

        assert_eq!(walk_left(&mut scene, Duration::from_secs(2)), SceneCommand::None);
        let state = scene.active_map().expect("active map");
        assert_eq!(state.map_name(), "forest");
        assert_eq!(scene.transitions_taken(), 1);
        assert_eq!(
            state.container(ContainerKind::Background).entities()[0].position(),
            Vec2::new(500.0, 500.0)
        );
    }

    #[test]
    fn a_gate_can_be_taken_on_the_first_tick() {
        let temp = maps_dir(&[
            ("town meta.json", map_json("town", 7, 0.0, 0.0)),
            ("forest meta.json", map_json("forest", 7, 500.0, 500.0)),
        ]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        scene.load().expect("load");

        walk_left(&mut scene, TICK);
        assert_eq!(scene.active_map().expect("map").map_name(), "forest");
        assert_eq!(scene.transitions_taken(), 1);
    }

    #[test]
    fn standing_still_on_a_gate_does_nothing() {
        let temp = maps_dir(&[
            ("town meta.json", map_json("town", 7, 0.0, 0.0)),
            ("forest meta.json", map_json("forest", 7, 500.0, 500.0)),
        ]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        scene.load().expect("load");

        scene.update(TICK, Duration::from_secs(2), &InputSnapshot::empty());
        assert_eq!(scene.active_map().expect("map").map_name(), "town");
    }

    #[test]
    fn stranded_clear_first_scene_reloads_the_current_map() {
        let temp = maps_dir(&[("town meta.json", map_json("town", 7, 0.0, 0.0))]);
        let mut scene = scene_for(&temp, ClearOrder::ClearFirst);
        scene.load().expect("load");

        assert_eq!(walk_left(&mut scene, Duration::from_secs(2)), SceneCommand::None);
        let state = scene.active_map().expect("active map");
        assert_eq!(state.map_name(), "town");
        assert!(!state.is_cleared());
        assert_eq!(scene.transitions_taken(), 0);
    }

    #[test]
    fn quit_input_stops_the_scene() {
        let temp = maps_dir(&[("town meta.json", map_json("town", 7, 0.0, 0.0))]);
        let mut scene = scene_for(&temp, ClearOrder::ResolveFirst);
        scene.load().expect("load");
        let input = InputSnapshot::empty().with_quit_requested(true);
        assert_eq!(scene.update(TICK, TICK, &input), SceneCommand::Quit);
    }

    #[test]
    fn unload_then_load_starts_over() {
        let temp = maps_dir(&[("town meta.json", map_json("town", 7, 0.0, 0.0))]);
        let mut scene = OverworldScene::new(
            CachedMapStore::new(DirMapStore::new(temp.path())),
            "town",
            layout(),
            TransitionConfig::default(),
            100.0,
        );
        scene.load().expect("load");
        scene.unload();
        assert!(scene.active_map().is_none());
        scene.load().expect("reload");
        assert_eq!(scene.active_map().expect("map").map_name(), "town");
    }
}
