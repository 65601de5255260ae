use std::path::PathBuf;

use link_engine::app::{LoopConfig, Scene};
use link_engine::content::{CachedMapStore, DirMapStore, MapSource};
use link_engine::{resolve_app_paths, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_game_config, ConfigError, GameConfig};
use super::overworld::OverworldScene;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) assets_dir: PathBuf,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Link GE Startup ===");

    let paths = resolve_app_paths()?;
    let game_config = load_game_config(&paths.config_dir)?;
    info!(
        root = %paths.root.display(),
        maps_dir = %paths.maps_dir.display(),
        start_map = %game_config.start_map,
        cache_metadata = game_config.cache_metadata,
        clear_order = ?game_config.transition.clear_order,
        "startup"
    );

    let store = DirMapStore::new(&paths.maps_dir);
    let scene = if game_config.cache_metadata {
        overworld_scene(CachedMapStore::new(store), &game_config)
    } else {
        overworld_scene(store, &game_config)
    };

    Ok(AppWiring {
        config: game_config.loop_config(),
        assets_dir: paths.assets_dir,
        scene,
    })
}

fn overworld_scene<S: MapSource + 'static>(store: S, config: &GameConfig) -> Box<dyn Scene> {
    Box::new(OverworldScene::new(
        store,
        config.start_map.clone(),
        config.layout_config(),
        config.transition_config(),
        config.player.speed_px_per_second,
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
