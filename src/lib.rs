pub mod agent;
pub mod config;
pub mod episode;
pub mod error;
pub mod grid;
pub mod logging;
pub mod mapgen;
pub mod pathfinding;

pub use agent::{Agent, Cadence, Direction, Role};
pub use config::Config;
pub use episode::{Anchors, CaptureRule, Episode, EpisodeSettings, EpisodeSnapshot, GameMode, Outcome};
pub use error::GenerationError;
pub use grid::{Cell, Grid, Tile};
pub use mapgen::{generate_map, MapGenerator, MapRequest, MapSettings, MapStrategy};
pub use pathfinding::{find_path, Path};
