use std::time::Duration;

use tracing::info;

use crate::app::ActiveMapState;
use crate::content::MapSource;

use super::activate::{activate, ActivationError};
use super::detector::{
    DetectorPhase, TransitionConfig, TransitionDetector, TransitionError, TransitionOutcome,
};
use super::instantiate::LayoutConfig;

/// Owns the active map, the detector and the cooldown timestamp for one play session.
///
/// Times are offsets from the start of the session. Until the first map change there is
/// no cooldown, so a gate can be taken on the very first tick.
#[derive(Debug)]
pub struct MapSession<S: MapSource> {
    store: S,
    layout: LayoutConfig,
    detector: TransitionDetector,
    state: ActiveMapState,
    last_transition: Option<Duration>,
}

impl<S: MapSource> MapSession<S> {
    pub fn start(
        store: S,
        initial_map: &str,
        layout: LayoutConfig,
        transitions: TransitionConfig,
    ) -> Result<Self, ActivationError> {
        let state = activate(&store, initial_map, &layout)?;
        info!(map = %state.map_name(), "map_session_started");
        Ok(Self {
            store,
            layout,
            detector: TransitionDetector::new(transitions),
            state,
            last_transition: None,
        })
    }

    /// One detector evaluation. Stamps the cooldown when the map changes.
    pub fn tick(&mut self, now: Duration) -> Result<TransitionOutcome, TransitionError> {
        let outcome = self.detector.evaluate(
            &self.store,
            &self.layout,
            &mut self.state,
            now,
            self.last_transition,
        )?;
        if outcome.new_map().is_some() {
            self.last_transition = Some(now);
        }
        Ok(outcome)
    }

    /// Replaces the active map with a fresh activation of `map_id` and restarts the
    /// cooldown. On failure the current state is kept.
    pub fn reload(&mut self, map_id: &str, now: Duration) -> Result<(), ActivationError> {
        let next = activate(&self.store, map_id, &self.layout)?;
        let mut previous = std::mem::replace(&mut self.state, next);
        let cleared = previous.clear_all();
        self.last_transition = Some(now);
        info!(map = %self.state.map_name(), cleared, "map_reloaded");
        Ok(())
    }

    pub fn state(&self) -> &ActiveMapState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ActiveMapState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn transitions(&self) -> &TransitionConfig {
        self.detector.config()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.detector.phase()
    }

    pub fn last_transition(&self) -> Option<Duration> {
        self.last_transition
    }

    /// Ends the session, clearing the active map, and hands the store back.
    pub fn into_store(mut self) -> S {
        let cleared = self.state.clear_all();
        info!(map = %self.state.map_name(), cleared, "map_session_ended");
        self.store
    }
}
