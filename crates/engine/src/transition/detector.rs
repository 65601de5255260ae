use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::{ActiveMapState, Rect};
use crate::content::{MapSource, MapStoreError};

use super::activate::{activate, ActivationError};
use super::instantiate::LayoutConfig;
use super::links::resolve_link;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);
pub const DEFAULT_TOLERANCE: f32 = 10.0;

/// When the outgoing map's containers are emptied relative to partner resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearOrder {
    /// Resolve and activate the partner first; the old world is only cleared once the new
    /// one exists.
    #[default]
    ResolveFirst,
    /// Clear every container before resolving. A missing partner strands the player on
    /// an empty map.
    ClearFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionConfig {
    pub cooldown: Duration,
    pub tolerance: f32,
    pub clear_order: ClearOrder,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            tolerance: DEFAULT_TOLERANCE,
            clear_order: ClearOrder::default(),
        }
    }
}

/// Absolute distances between facing edges of the player and gate rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDistances {
    pub left_to_right: f32,
    pub right_to_left: f32,
    pub top_to_bottom: f32,
    pub bottom_to_top: f32,
}

impl EdgeDistances {
    pub fn between(player: Rect, gate: Rect) -> Self {
        Self {
            left_to_right: (player.left - gate.right()).abs(),
            right_to_left: (player.right() - gate.left).abs(),
            top_to_bottom: (player.top - gate.bottom()).abs(),
            bottom_to_top: (player.bottom() - gate.top).abs(),
        }
    }
}

/// Edge-proximity heuristic: one horizontal and one vertical edge pair within
/// `tolerance`, inclusive. Not an overlap test; a player centered on the gate does
/// not count as touching it.
pub fn gate_contact(player: Rect, gate: Rect, tolerance: f32) -> bool {
    let d = EdgeDistances::between(player, gate);
    (d.left_to_right <= tolerance || d.right_to_left <= tolerance)
        && (d.top_to_bottom <= tolerance || d.bottom_to_top <= tolerance)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectorPhase {
    #[default]
    Idle,
    Transitioning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Nothing fired this frame.
    Stay,
    Transitioned { from: String, to: String },
    /// The gate has no partner; the current map was left untouched.
    NoPartner { gate_id: i64 },
    /// The gate has no partner and the containers were already cleared.
    Stranded { gate_id: i64 },
}

impl TransitionOutcome {
    pub fn new_map(&self) -> Option<&str> {
        match self {
            TransitionOutcome::Transitioned { to, .. } => Some(to),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("failed to resolve partner of gate {gate_id} on map '{map}': {source}")]
    Resolve {
        gate_id: i64,
        map: String,
        #[source]
        source: MapStoreError,
    },
    #[error("failed to activate '{target}' through gate {gate_id}: {source}")]
    Activate {
        gate_id: i64,
        target: String,
        #[source]
        source: ActivationError,
    },
}

#[derive(Debug, Default)]
pub struct TransitionDetector {
    config: TransitionConfig,
    phase: DetectorPhase,
}

impl TransitionDetector {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            config,
            phase: DetectorPhase::Idle,
        }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Movement, cooldown and proximity checks, with no side effects.
    ///
    /// `last_transition` is `None` until the first map change, so no cooldown applies yet.
    pub fn should_trigger(
        &self,
        state: &ActiveMapState,
        now: Duration,
        last_transition: Option<Duration>,
    ) -> bool {
        let (Some(player), Some(gate)) = (state.player(), state.gate_entity()) else {
            return false;
        };
        if !player.has_moved() {
            return false;
        }
        if let Some(last) = last_transition {
            if now.saturating_sub(last) < self.config.cooldown {
                return false;
            }
        }
        gate_contact(player.rect(), gate.rect(), self.config.tolerance)
    }

    /// Runs one frame of the detector against `state`.
    ///
    /// On `Transitioned` the old containers have been cleared and `state` holds the
    /// partner map; the caller stamps its cooldown with `now`.
    pub fn evaluate<S: MapSource + ?Sized>(
        &mut self,
        store: &S,
        layout: &LayoutConfig,
        state: &mut ActiveMapState,
        now: Duration,
        last_transition: Option<Duration>,
    ) -> Result<TransitionOutcome, TransitionError> {
        if !self.should_trigger(state, now, last_transition) {
            return Ok(TransitionOutcome::Stay);
        }

        self.phase = DetectorPhase::Transitioning;
        let result = match self.config.clear_order {
            ClearOrder::ResolveFirst => transition_resolve_first(store, layout, state),
            ClearOrder::ClearFirst => transition_clear_first(store, layout, state),
        };
        self.phase = DetectorPhase::Idle;
        result
    }
}

fn transition_resolve_first<S: MapSource + ?Sized>(
    store: &S,
    layout: &LayoutConfig,
    state: &mut ActiveMapState,
) -> Result<TransitionOutcome, TransitionError> {
    let gate_id = state.active_gate().id;
    let from = state.map_name().to_string();

    let Some(target) = partner_of(store, gate_id, &from)? else {
        debug!(gate_id, map = %from, "gate_partner_missing");
        return Ok(TransitionOutcome::NoPartner { gate_id });
    };
    let next = activate_partner(store, layout, gate_id, &target)?;

    let mut previous = std::mem::replace(state, next);
    let cleared = previous.clear_all();
    info!(gate_id, from = %from, to = %target, cleared, "map_transition");
    Ok(TransitionOutcome::Transitioned { from, to: target })
}

fn transition_clear_first<S: MapSource + ?Sized>(
    store: &S,
    layout: &LayoutConfig,
    state: &mut ActiveMapState,
) -> Result<TransitionOutcome, TransitionError> {
    let gate_id = state.active_gate().id;
    let from = state.map_name().to_string();
    let cleared = state.clear_all();

    let Some(target) = partner_of(store, gate_id, &from)? else {
        warn!(gate_id, map = %from, cleared, "map_transition_stranded");
        return Ok(TransitionOutcome::Stranded { gate_id });
    };
    *state = activate_partner(store, layout, gate_id, &target)?;

    info!(gate_id, from = %from, to = %target, cleared, "map_transition");
    Ok(TransitionOutcome::Transitioned { from, to: target })
}

fn partner_of<S: MapSource + ?Sized>(
    store: &S,
    gate_id: i64,
    map: &str,
) -> Result<Option<String>, TransitionError> {
    resolve_link(store, gate_id, map).map_err(|source| TransitionError::Resolve {
        gate_id,
        map: map.to_string(),
        source,
    })
}

fn activate_partner<S: MapSource + ?Sized>(
    store: &S,
    layout: &LayoutConfig,
    gate_id: i64,
    target: &str,
) -> Result<ActiveMapState, TransitionError> {
    activate(store, target, layout).map_err(|source| TransitionError::Activate {
        gate_id,
        target: target.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::app::{ContainerKind, Vec2};
    use crate::content::DirMapStore;

    const TOWN_JSON: &str = r#"{
        "name": "town",
        "image": "maps/town.png",
        "gates": { "gate 1": { "id": 7, "coords": { "x": 100, "y": 50 } } },
        "NPC's": { "npc 1": { "coords": { "x": 10, "y": 20 }, "image": "sprites/npc.png" } },
        "Obstacles": { "rock 1": { "coords": { "x": 40, "y": 0 }, "image": "sprites/rock.png" } }
    }"#;
    const FOREST_JSON: &str = r#"{
        "name": "forest",
        "image": "maps/forest.png",
        "gates": { "gate 1": { "id": 7, "coords": { "x": 10, "y": 10 } } }
    }"#;

    fn rect(left: f32, top: f32) -> Rect {
        Rect {
            left,
            top,
            width: 32.0,
            height: 32.0,
        }
    }

    fn store_with(files: &[(&str, &str)]) -> (TempDir, DirMapStore) {
        let temp = TempDir::new().expect("tempdir");
        for (name, body) in files {
            fs::write(temp.path().join(name), body).expect("write fixture");
        }
        let store = DirMapStore::new(temp.path());
        (temp, store)
    }

    /// Moves the player so its bottom-right corner sits on the gate's top-left corner.
    fn walk_onto_gate(state: &mut ActiveMapState) {
        let gate = state.gate_entity().expect("gate").rect();
        let player = state.player_mut().expect("player");
        let size = player.size();
        let current = player.position();
        player.step(Vec2::new(
            gate.left - size.x - current.x,
            gate.top - size.y - current.y,
        ));
    }

    const LATER: Duration = Duration::from_secs(5);

    #[test]
    fn contact_is_inclusive_at_the_tolerance_boundary() {
        let gate = rect(100.0, 50.0);
        assert!(gate_contact(rect(58.0, 8.0), gate, 10.0));
        assert!(!gate_contact(rect(57.0, 8.0), gate, 10.0));
        assert!(!gate_contact(rect(58.0, 7.0), gate, 10.0));
    }

    #[test]
    fn contact_needs_both_axes() {
        let gate = rect(100.0, 50.0);
        assert!(gate_contact(rect(132.0, 82.0), gate, 0.0));
        assert!(!gate_contact(rect(132.0, 300.0), gate, 10.0));
        assert!(!gate_contact(rect(100.0, 50.0), gate, 10.0));
    }

    #[test]
    fn edge_distances_are_absolute() {
        let d = EdgeDistances::between(rect(0.0, 0.0), rect(100.0, 50.0));
        assert_eq!(d.left_to_right, 132.0);
        assert_eq!(d.right_to_left, 68.0);
        assert_eq!(d.top_to_bottom, 82.0);
        assert_eq!(d.bottom_to_top, 18.0);
    }

    #[test]
    fn stationary_player_never_triggers() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);
        state.player_mut().expect("player").step(Vec2::ZERO);

        let detector = TransitionDetector::default();
        assert!(!detector.should_trigger(&state, LATER, None));
    }

    #[test]
    fn cooldown_blocks_triggers_regardless_of_proximity() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let detector = TransitionDetector::default();
        let last = Duration::from_secs(10);
        let stamp = Some(last);
        assert!(!detector.should_trigger(&state, last + Duration::from_millis(999), stamp));
        assert!(detector.should_trigger(&state, last + DEFAULT_COOLDOWN, stamp));
    }

    #[test]
    fn no_previous_transition_means_no_cooldown() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let detector = TransitionDetector::default();
        assert!(detector.should_trigger(&state, Duration::ZERO, None));
        assert!(!detector.should_trigger(&state, Duration::ZERO, Some(Duration::ZERO)));
    }

    #[test]
    fn far_from_gate_stays() {
        let (_temp, store) = store_with(&[
            ("town meta.json", TOWN_JSON),
            ("forest meta.json", FOREST_JSON),
        ]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        state.player_mut().expect("player").step(Vec2::new(1.0, 0.0));

        let mut detector = TransitionDetector::default();
        let outcome = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect("evaluate");
        assert_eq!(outcome, TransitionOutcome::Stay);
        assert_eq!(state.map_name(), "town");
    }

    #[test]
    fn walking_through_a_gate_replaces_the_map() {
        let (_temp, store) = store_with(&[
            ("town meta.json", TOWN_JSON),
            ("forest meta.json", FOREST_JSON),
        ]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let mut detector = TransitionDetector::default();
        let outcome = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect("evaluate");

        assert_eq!(outcome.new_map(), Some("forest"));
        assert_eq!(detector.phase(), DetectorPhase::Idle);
        assert_eq!(state.map_name(), "forest");
        assert_eq!(
            state.backdrop().expect("backdrop").position(),
            Vec2::new(10.0, 10.0)
        );
        assert!(state.container(ContainerKind::Npc).is_empty());
        assert!(state.container(ContainerKind::Obstacle).is_empty());
        assert_eq!(state.container(ContainerKind::Player).len(), 1);
    }

    #[test]
    fn resolve_first_keeps_the_world_when_no_partner_exists() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);
        let before = state.entity_count();

        let mut detector = TransitionDetector::default();
        let outcome = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect("evaluate");

        assert_eq!(outcome, TransitionOutcome::NoPartner { gate_id: 7 });
        assert_eq!(outcome.new_map(), None);
        assert_eq!(state.map_name(), "town");
        assert_eq!(state.entity_count(), before);
    }

    #[test]
    fn clear_first_strands_the_player_when_no_partner_exists() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let mut detector = TransitionDetector::new(TransitionConfig {
            clear_order: ClearOrder::ClearFirst,
            ..TransitionConfig::default()
        });
        let outcome = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect("evaluate");

        assert_eq!(outcome, TransitionOutcome::Stranded { gate_id: 7 });
        assert!(state.is_cleared());
        assert_eq!(state.map_name(), "town");
        assert_eq!(detector.phase(), DetectorPhase::Idle);
    }

    #[test]
    fn clear_first_also_transitions_on_success() {
        let (_temp, store) = store_with(&[
            ("town meta.json", TOWN_JSON),
            ("forest meta.json", FOREST_JSON),
        ]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let mut detector = TransitionDetector::new(TransitionConfig {
            clear_order: ClearOrder::ClearFirst,
            ..TransitionConfig::default()
        });
        let outcome = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect("evaluate");
        assert_eq!(
            outcome,
            TransitionOutcome::Transitioned {
                from: "town".to_string(),
                to: "forest".to_string()
            }
        );
        assert_eq!(state.map_name(), "forest");
    }

    // "cave meta.json" calls itself "grotto", so the resolver finds it but activating
    // "grotto" looks for a file that does not exist.
    const MISNAMED_JSON: &str = r#"{
        "name": "grotto",
        "image": "maps/cave.png",
        "gates": { "gate 1": { "id": 7, "coords": { "x": 0, "y": 0 } } }
    }"#;

    #[test]
    fn resolve_first_activation_failure_keeps_the_old_state() {
        let (_temp, store) = store_with(&[
            ("town meta.json", TOWN_JSON),
            ("cave meta.json", MISNAMED_JSON),
        ]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);
        let before = state.entity_count();

        let mut detector = TransitionDetector::default();
        let error = detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .expect_err("activation fails");

        match error {
            TransitionError::Activate { target, source, .. } => {
                assert_eq!(target, "grotto");
                assert!(source.is_not_found());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(detector.phase(), DetectorPhase::Idle);
        assert_eq!(state.map_name(), "town");
        assert_eq!(state.entity_count(), before);
    }

    #[test]
    fn clear_first_activation_failure_leaves_containers_empty() {
        let (_temp, store) = store_with(&[
            ("town meta.json", TOWN_JSON),
            ("cave meta.json", MISNAMED_JSON),
        ]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);

        let mut detector = TransitionDetector::new(TransitionConfig {
            clear_order: ClearOrder::ClearFirst,
            ..TransitionConfig::default()
        });
        assert!(detector
            .evaluate(&store, &layout, &mut state, LATER, None)
            .is_err());
        assert!(state.is_cleared());
        assert_eq!(detector.phase(), DetectorPhase::Idle);
    }

    #[test]
    fn cleared_state_never_triggers() {
        let (_temp, store) = store_with(&[("town meta.json", TOWN_JSON)]);
        let layout = LayoutConfig::default();
        let mut state = activate(&store, "town", &layout).expect("activate");
        walk_onto_gate(&mut state);
        state.clear_all();
        assert!(!TransitionDetector::default().should_trigger(&state, LATER, None));
    }
}
