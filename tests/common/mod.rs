#![allow(dead_code)]

use gridchase::{Anchors, CaptureRule, Cell, Episode, EpisodeSettings, GameMode, Grid};

/// Parsed text fixture
///
/// Format:
/// - ■ or #: blocked cell
/// - □ or .: free cell
/// - S: player start
/// - G: goal
/// - Z: pursuer or racer spawn (in reading order)
pub struct Fixture {
    pub grid: Grid,
    pub start: Option<Cell>,
    pub goal: Option<Cell>,
    pub spawns: Vec<Cell>,
}

pub fn parse_fixture(layout: &str) -> Result<Fixture, String> {
    let grid = Grid::from_layout(layout)?;
    let mut start = None;
    let mut goal = None;
    let mut spawns = Vec::new();

    let rows = layout
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty());

    for (row, line) in rows.enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let cell = Cell::new(col as i32, row as i32);
            match ch {
                'S' => start = Some(cell),
                'G' => goal = Some(cell),
                'Z' => spawns.push(cell),
                _ => {}
            }
        }
    }

    Ok(Fixture {
        grid,
        start,
        goal,
        spawns,
    })
}

/// Build an episode on a fixture layout. The layout must mark S and G.
pub fn fixture_episode(
    layout: &str,
    mode: GameMode,
    capture: CaptureRule,
    player_delay: u32,
    agent_delay: u32,
) -> Episode {
    let fixture = parse_fixture(layout).unwrap();
    let anchors = Anchors {
        player_start: fixture.start.expect("fixture needs S"),
        goal: fixture.goal.expect("fixture needs G"),
        agent_spawns: fixture.spawns,
    };
    let settings = EpisodeSettings {
        rows: fixture.grid.rows,
        cols: fixture.grid.cols,
        mode,
        capture,
        player_delay,
        agent_delay,
        anchors: Some(anchors.clone()),
        ..EpisodeSettings::default()
    };
    Episode::from_grid(fixture.grid, &anchors, &settings)
}

/// Panic unless `path` is a walk of unit steps over free cells from `start` to `goal`
pub fn assert_valid_walk(grid: &Grid, start: Cell, goal: Cell, path: &[Cell]) {
    let mut current = start;
    for &next in path {
        assert_eq!(current.manhattan(&next), 1, "{} -> {} is not a unit step", current, next);
        assert!(grid.is_free(next), "path crosses blocked cell {}", next);
        current = next;
    }
    assert_eq!(current, goal, "path ends at {} instead of {}", current, goal);
}

/// Visualize a path on a grid
pub fn visualize_path(grid: &Grid, path: &[Cell], start: Cell, goal: Cell) -> String {
    let mut result = String::new();
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let cell = Cell::new(col, row);
            let symbol = if cell == start {
                'S'
            } else if cell == goal {
                'G'
            } else if path.contains(&cell) {
                '*'
            } else if grid.is_blocked(cell) {
                '█'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}
