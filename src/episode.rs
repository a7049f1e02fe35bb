use crate::agent::{Agent, Direction, Role};
use crate::error::GenerationError;
use crate::grid::{Cell, Grid};
use crate::mapgen::{generate_map, MapRequest, MapSettings};
use crate::pathfinding::{find_path, first_step_direction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_ROWS: i32 = 12;
pub const DEFAULT_COLS: i32 = 16;
pub const DEFAULT_PLAYER_DELAY: u32 = 2;
pub const DEFAULT_AGENT_DELAY: u32 = 15;
pub const DEFAULT_CAPTURE_RADIUS: f32 = 0.8;

/// How non-player agents choose their target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Pursuers chase the player, who runs for the exit
    Chase,
    /// One racer and the player both head for the goal
    Race,
}

/// When a pursuer counts as having caught the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CaptureRule {
    /// Same cell
    Exact,
    /// Euclidean distance in cell units strictly below `radius`
    Proximity { radius: f32 },
}

impl CaptureRule {
    pub fn is_caught(&self, pursuer: Cell, player: Cell) -> bool {
        match *self {
            CaptureRule::Exact => pursuer == player,
            CaptureRule::Proximity { radius } => pursuer.distance(&player) < radius,
        }
    }
}

/// Episode state machine: Running until one terminal outcome, then frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Running,
    /// Player reached the exit
    Escaped,
    /// A pursuer reached the player
    Caught,
    /// The racer reached the goal first
    AgentWon,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Running
    }
}

/// Spawn and goal cells of an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    pub player_start: Cell,
    pub goal: Cell,
    /// One spawn per pursuer or racer
    pub agent_spawns: Vec<Cell>,
}

impl Anchors {
    /// Player in the top-left room, goal bottom-right.
    /// Chase spawns pursuers in the other two corners; the racer shares the player's start.
    pub fn standard(rows: i32, cols: i32, mode: GameMode) -> Self {
        let player_start = Cell::new(1, 1);
        let goal = Cell::new(cols - 2, rows - 2);
        let agent_spawns = match mode {
            GameMode::Chase => vec![Cell::new(1, rows - 2), Cell::new(cols - 2, 1)],
            GameMode::Race => vec![player_start],
        };
        Anchors {
            player_start,
            goal,
            agent_spawns,
        }
    }

    /// Generation constraints: every anchor free, and the routes each mode needs connected
    pub fn map_request(&self, rows: i32, cols: i32, mode: GameMode) -> MapRequest {
        let mut request = MapRequest::new(rows, cols)
            .protect(self.player_start)
            .protect(self.goal);
        for &spawn in &self.agent_spawns {
            request = request.protect(spawn);
        }

        request = request.require_path(self.player_start, self.goal);
        for &spawn in &self.agent_spawns {
            request = match mode {
                GameMode::Chase => request.require_path(spawn, self.player_start),
                GameMode::Race => request.require_path(spawn, self.goal),
            };
        }
        request
    }
}

/// Everything needed to start an episode besides the seed
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSettings {
    pub rows: i32,
    pub cols: i32,
    pub mode: GameMode,
    pub capture: CaptureRule,
    pub player_delay: u32,
    pub agent_delay: u32,
    pub map: MapSettings,
    /// Standard anchors for the grid size when `None`
    pub anchors: Option<Anchors>,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        EpisodeSettings {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            mode: GameMode::Chase,
            capture: CaptureRule::Exact,
            player_delay: DEFAULT_PLAYER_DELAY,
            agent_delay: DEFAULT_AGENT_DELAY,
            map: MapSettings::default(),
            anchors: None,
        }
    }
}

impl EpisodeSettings {
    pub fn anchors(&self) -> Anchors {
        self.anchors
            .clone()
            .unwrap_or_else(|| Anchors::standard(self.rows, self.cols, self.mode))
    }
}

/// Read-only view of one agent for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: usize,
    pub role: Role,
    pub position: Cell,
    pub facing: Direction,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        AgentView {
            id: agent.id,
            role: agent.role,
            position: agent.position,
            facing: agent.facing,
        }
    }
}

/// Read-only view of the whole episode after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub tick: u64,
    pub layout: Vec<String>,
    pub goal: Cell,
    pub player: AgentView,
    pub agents: Vec<AgentView>,
    pub outcome: Outcome,
}

/// Owns the grid and every agent, and advances them one tick at a time
#[derive(Debug, Clone)]
pub struct Episode {
    grid: Grid,
    player: Agent,
    agents: Vec<Agent>,
    goal: Cell,
    mode: GameMode,
    capture: CaptureRule,
    outcome: Outcome,
    ticks: u64,
}

impl Episode {
    /// Generate a fresh grid from `seed` and place the agents on their anchors
    pub fn new(settings: &EpisodeSettings, seed: u64) -> Result<Self, GenerationError> {
        let anchors = settings.anchors();
        let request = anchors.map_request(settings.rows, settings.cols, settings.mode);
        let grid = generate_map(&settings.map, &request, seed)?;

        info!(
            seed,
            mode = ?settings.mode,
            strategy = ?settings.map.strategy,
            agents = anchors.agent_spawns.len(),
            "episode started"
        );

        Ok(Self::from_grid(grid, &anchors, settings))
    }

    /// Build an episode on an existing grid. Anchors are used as given.
    pub fn from_grid(grid: Grid, anchors: &Anchors, settings: &EpisodeSettings) -> Self {
        let player = Agent::new(0, Role::Player, anchors.player_start, settings.player_delay);
        let role = match settings.mode {
            GameMode::Chase => Role::Pursuer,
            GameMode::Race => Role::Racer,
        };
        let agents = anchors
            .agent_spawns
            .iter()
            .enumerate()
            .map(|(i, &spawn)| Agent::new(i + 1, role, spawn, settings.agent_delay))
            .collect();

        Episode {
            grid,
            player,
            agents,
            goal: anchors.goal,
            mode: settings.mode,
            capture: settings.capture,
            outcome: Outcome::Running,
            ticks: 0,
        }
    }

    /// Advance the simulation by one tick.
    ///
    /// The player moves first, then every other agent in spawn order. Termination is
    /// checked afterwards in a fixed order: the player on the goal wins (Escaped) even
    /// if a pursuer arrived on the same tick, then capture (Caught, chase only), then a
    /// racer on the goal (AgentWon, race only). Once terminal, ticking does nothing.
    pub fn tick(&mut self, intent: Option<Direction>) -> Outcome {
        if self.outcome.is_terminal() {
            return self.outcome;
        }
        self.ticks += 1;

        self.player.step_player(&self.grid, intent);

        let target = match self.mode {
            GameMode::Chase => self.player.position,
            GameMode::Race => self.goal,
        };
        for agent in &mut self.agents {
            agent.step_toward(&self.grid, target);
        }

        self.outcome = self.evaluate();
        if self.outcome.is_terminal() {
            info!(outcome = ?self.outcome, ticks = self.ticks, "episode finished");
        }
        self.outcome
    }

    fn evaluate(&self) -> Outcome {
        let player = self.player.position;
        if player == self.goal {
            return Outcome::Escaped;
        }

        match self.mode {
            GameMode::Chase => {
                if let Some(agent) = self
                    .agents
                    .iter()
                    .find(|agent| self.capture.is_caught(agent.position, player))
                {
                    debug!(pursuer = agent.id, cell = %agent.position, "player caught");
                    return Outcome::Caught;
                }
            }
            GameMode::Race => {
                if self.agents.iter().any(|agent| agent.position == self.goal) {
                    return Outcome::AgentWon;
                }
            }
        }

        Outcome::Running
    }

    /// Direction of the player's next step on a shortest path to the goal
    pub fn autopilot_intent(&self) -> Option<Direction> {
        let path = find_path(&self.grid, self.player.position, self.goal);
        first_step_direction(self.player.position, &path)
    }

    pub fn snapshot(&self) -> EpisodeSnapshot {
        EpisodeSnapshot {
            tick: self.ticks,
            layout: self.grid.layout_rows(),
            goal: self.goal,
            player: AgentView::from(&self.player),
            agents: self.agents.iter().map(AgentView::from).collect(),
            outcome: self.outcome,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Agent {
        &self.player
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
