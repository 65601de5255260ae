use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use link_engine::app::{LoopConfig, Vec2, Viewport};
use link_engine::transition::{
    ClearOrder, LayoutConfig, TransitionConfig, DEFAULT_ANIMATION_FRAMES, DEFAULT_PLAYER_IMAGE,
    DEFAULT_TICKS_PER_ANIMATION_FRAME, DEFAULT_TILE_SIZE_PX, DEFAULT_TOLERANCE,
};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "LINKGE_CONFIG";
pub(crate) const START_MAP_ENV_VAR: &str = "LINKGE_START_MAP";
pub(crate) const CONFIG_FILE_NAME: &str = "game.json";
const DEFAULT_START_MAP: &str = "twinleaf";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path} at {field_path}: {message}")]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("invalid config value {field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ClearOrderSetting {
    ResolveFirst,
    ClearFirst,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct WindowSettings {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            title: loop_defaults.window_title,
            width: loop_defaults.window_width,
            height: loop_defaults.window_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct PlayerSettings {
    pub(crate) image: String,
    pub(crate) speed_px_per_second: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            image: DEFAULT_PLAYER_IMAGE.to_string(),
            speed_px_per_second: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct TransitionSettings {
    pub(crate) cooldown_ms: u64,
    pub(crate) tolerance_px: f32,
    pub(crate) clear_order: ClearOrderSetting,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            tolerance_px: DEFAULT_TOLERANCE,
            clear_order: ClearOrderSetting::ResolveFirst,
        }
    }
}

/// `config/game.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct GameConfig {
    pub(crate) start_map: String,
    pub(crate) target_tps: u32,
    pub(crate) tile_size_px: f32,
    pub(crate) animation_frames: u32,
    pub(crate) ticks_per_animation_frame: u32,
    pub(crate) cache_metadata: bool,
    pub(crate) window: WindowSettings,
    pub(crate) player: PlayerSettings,
    pub(crate) transition: TransitionSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_map: DEFAULT_START_MAP.to_string(),
            target_tps: LoopConfig::default().target_tps,
            tile_size_px: DEFAULT_TILE_SIZE_PX,
            animation_frames: DEFAULT_ANIMATION_FRAMES,
            ticks_per_animation_frame: DEFAULT_TICKS_PER_ANIMATION_FRAME,
            cache_metadata: true,
            window: WindowSettings::default(),
            player: PlayerSettings::default(),
            transition: TransitionSettings::default(),
        }
    }
}

impl GameConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.start_map.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "start_map",
                message: "must not be empty",
            });
        }
        if self.target_tps == 0 {
            return Err(ConfigError::Invalid {
                field: "target_tps",
                message: "must be greater than zero",
            });
        }
        if !(self.tile_size_px.is_finite() && self.tile_size_px > 0.0) {
            return Err(ConfigError::Invalid {
                field: "tile_size_px",
                message: "must be a positive number",
            });
        }
        if !(self.transition.tolerance_px.is_finite() && self.transition.tolerance_px >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "transition.tolerance_px",
                message: "must be zero or a positive number",
            });
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                message: "width and height must be greater than zero",
            });
        }
        Ok(())
    }

    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            target_tps: self.target_tps,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            viewport: Viewport {
                width: self.window.width,
                height: self.window.height,
            },
            tile_size: Vec2::new(self.tile_size_px, self.tile_size_px),
            player_image: self.player.image.clone(),
            animation_frames: self.animation_frames,
            ticks_per_animation_frame: self.ticks_per_animation_frame,
        }
    }

    pub(crate) fn transition_config(&self) -> TransitionConfig {
        TransitionConfig {
            cooldown: Duration::from_millis(self.transition.cooldown_ms),
            tolerance: self.transition.tolerance_px,
            clear_order: match self.transition.clear_order {
                ClearOrderSetting::ResolveFirst => ClearOrder::ResolveFirst,
                ClearOrderSetting::ClearFirst => ClearOrder::ClearFirst,
            },
        }
    }
}

/// Reads the config named by `LINKGE_CONFIG`, else `<config_dir>/game.json` if present,
/// then applies `LINKGE_START_MAP`.
pub(crate) fn load_game_config(config_dir: &Path) -> Result<GameConfig, ConfigError> {
    let mut config = match read_env_var(CONFIG_ENV_VAR)? {
        Some(path) => load_config_file(Path::new(&path))?,
        None => {
            let default_path = config_dir.join(CONFIG_FILE_NAME);
            if default_path.is_file() {
                load_config_file(&default_path)?
            } else {
                GameConfig::default()
            }
        }
    };
    apply_start_map_override(&mut config, read_env_var(START_MAP_ENV_VAR)?);
    config.validate()?;
    Ok(config)
}

pub(crate) fn load_config_file(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_game_config(path, &raw)
}

pub(crate) fn parse_game_config(path: &Path, raw: &str) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
        let field_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field_path: if field_path.is_empty() {
                ".".to_string()
            } else {
                field_path
            },
            message: error.into_inner().to_string(),
        }
    })
}

pub(crate) fn apply_start_map_override(config: &mut GameConfig, start_map: Option<String>) {
    if let Some(start_map) = start_map.filter(|value| !value.trim().is_empty()) {
        config.start_map = start_map;
    }
}

fn read_env_var(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { var, source }),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(raw: &str) -> Result<GameConfig, ConfigError> {
        parse_game_config(Path::new("game.json"), raw)
    }

    #[test]
    fn empty_object_gives_defaults() {
        let config = parse("{}").expect("parse");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.transition_config(), TransitionConfig::default());
    }

    #[test]
    fn nested_fields_override_defaults() {
        let config = parse(
            r#"{
                "start_map": "route 201",
                "tile_size_px": 16,
                "window": { "width": 640, "height": 480 },
                "transition": { "cooldown_ms": 250, "clear_order": "clear_first" }
            }"#,
        )
        .expect("parse");

        assert_eq!(config.start_map, "route 201");
        let layout = config.layout_config();
        assert_eq!(layout.viewport.center(), Vec2::new(320.0, 240.0));
        assert_eq!(layout.tile_size, Vec2::new(16.0, 16.0));

        let transitions = config.transition_config();
        assert_eq!(transitions.cooldown, Duration::from_millis(250));
        assert_eq!(transitions.clear_order, ClearOrder::ClearFirst);
        assert_eq!(transitions.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.window.title, LoopConfig::default().window_title);
    }

    #[test]
    fn unknown_fields_are_rejected_with_their_path() {
        match parse(r#"{ "transition": { "cooldown": 5 } }"#) {
            Err(ConfigError::Parse { field_path, message, .. }) => {
                assert!(field_path.starts_with("transition"), "field_path={field_path}");
                assert!(message.contains("cooldown"), "message={message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn wrong_types_report_the_field_path() {
        match parse(r#"{ "window": { "width": "wide" } }"#) {
            Err(ConfigError::Parse { field_path, .. }) => assert_eq!(field_path, "window.width"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_nonsense_values() {
        let mut config = GameConfig::default();
        config.tile_size_px = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tile_size_px",
                ..
            })
        ));

        let mut config = GameConfig::default();
        config.start_map = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn start_map_override_ignores_blank_values() {
        let mut config = GameConfig::default();
        apply_start_map_override(&mut config, Some("  ".to_string()));
        assert_eq!(config.start_map, DEFAULT_START_MAP);
        apply_start_map_override(&mut config, Some("lake".to_string()));
        assert_eq!(config.start_map, "lake");
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "cache_metadata": false }"#).expect("write");

        let config = load_config_file(&path).expect("load");
        assert!(!config.cache_metadata);

        let missing = load_config_file(&temp.path().join("nope.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
