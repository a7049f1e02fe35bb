use crate::episode::{
    CaptureRule, EpisodeSettings, GameMode, DEFAULT_AGENT_DELAY, DEFAULT_CAPTURE_RADIUS,
    DEFAULT_COLS, DEFAULT_PLAYER_DELAY, DEFAULT_ROWS,
};
use crate::mapgen::{
    MapSettings, MapStrategy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAZE_ORIGIN, DEFAULT_OBSTACLE_DENSITY,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub pursuers: PursuersConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    /// Rendering only
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_delay")]
    pub move_delay: u32,
}

#[derive(Debug, Deserialize)]
pub struct PursuersConfig {
    #[serde(default = "default_agent_delay")]
    pub move_delay: u32,
}

#[derive(Debug, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_obstacle_density")]
    pub obstacle_density: f32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Random seed when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_capture")]
    pub capture: String,
    #[serde(default = "default_capture_radius")]
    pub capture_radius: f32,
    /// Simulation ticks per second
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// Frames between facing-indicator animation steps
    #[serde(default = "default_anim_delay")]
    pub anim_delay: u32,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default values
fn default_cols() -> i32 { DEFAULT_COLS }
fn default_rows() -> i32 { DEFAULT_ROWS }
fn default_cell_size() -> f32 { 64.0 }
fn default_player_delay() -> u32 { DEFAULT_PLAYER_DELAY }
fn default_agent_delay() -> u32 { DEFAULT_AGENT_DELAY }
fn default_strategy() -> String { "scatter".to_string() }
fn default_obstacle_density() -> f32 { DEFAULT_OBSTACLE_DENSITY }
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_mode() -> String { "chase".to_string() }
fn default_capture() -> String { "exact".to_string() }
fn default_capture_radius() -> f32 { DEFAULT_CAPTURE_RADIUS }
fn default_tick_rate() -> u32 { 30 }
fn default_window_title() -> String { "Grid Chase".to_string() }
fn default_anim_delay() -> u32 { 6 }
fn default_log_filter() -> String { "info".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_delay: default_player_delay(),
        }
    }
}

impl Default for PursuersConfig {
    fn default() -> Self {
        Self {
            move_delay: default_agent_delay(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            obstacle_density: default_obstacle_density(),
            max_attempts: default_max_attempts(),
            seed: None,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            capture: default_capture(),
            capture_radius: default_capture_radius(),
            tick_rate: default_tick_rate(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            anim_delay: default_anim_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from config.toml, or use defaults if it is missing or malformed
    pub fn load() -> Self {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse configuration, using defaults");
                    Config::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no configuration file found, using defaults");
                Config::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn strategy(&self) -> MapStrategy {
        match self.map.strategy.to_ascii_lowercase().as_str() {
            "scatter" => MapStrategy::Scatter,
            "maze" => MapStrategy::Maze,
            other => {
                warn!(strategy = other, "unknown map strategy, using scatter");
                MapStrategy::Scatter
            }
        }
    }

    pub fn mode(&self) -> GameMode {
        match self.game.mode.to_ascii_lowercase().as_str() {
            "chase" => GameMode::Chase,
            "race" => GameMode::Race,
            other => {
                warn!(mode = other, "unknown game mode, using chase");
                GameMode::Chase
            }
        }
    }

    pub fn capture(&self) -> CaptureRule {
        match self.game.capture.to_ascii_lowercase().as_str() {
            "exact" => CaptureRule::Exact,
            "proximity" => CaptureRule::Proximity {
                radius: self.game.capture_radius,
            },
            other => {
                warn!(capture = other, "unknown capture rule, using exact");
                CaptureRule::Exact
            }
        }
    }

    /// Core settings described by this configuration
    pub fn episode_settings(&self) -> EpisodeSettings {
        EpisodeSettings {
            rows: self.grid.rows,
            cols: self.grid.cols,
            mode: self.mode(),
            capture: self.capture(),
            player_delay: self.player.move_delay,
            agent_delay: self.pursuers.move_delay,
            map: MapSettings {
                strategy: self.strategy(),
                obstacle_density: self.map.obstacle_density,
                max_attempts: self.map.max_attempts,
                maze_origin: DEFAULT_MAZE_ORIGIN,
            },
            anchors: None,
        }
    }
}
