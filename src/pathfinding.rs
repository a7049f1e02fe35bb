use crate::agent::Direction;
use crate::grid::{Cell, Grid};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::trace;

/// Cells from (but excluding) the start up to and including the goal.
/// Empty when no route exists or start equals goal.
pub type Path = Vec<Cell>;

/// A frontier entry in the search
#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: Cell,
    /// Estimated total cost f = g + h
    priority: i32,
    /// Cost so far g
    cost: i32,
    /// Discovery sequence number, used to break priority ties
    order: u64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.order == other.order
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .priority
            .cmp(&self.priority)
            // Tie-breaker: earliest discovered cell comes out first
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Find the shortest 4-connected path from `start` to `goal`.
///
/// A* with unit step cost and a Manhattan heuristic. The search stops as soon as
/// the goal is popped from the frontier. Expansion begins from the neighbors of
/// `start` whether or not `start` itself is free; a blocked goal is never reached.
pub fn find_path(grid: &Grid, start: Cell, goal: Cell) -> Path {
    if start == goal {
        return Vec::new();
    }

    let mut frontier: BinaryHeap<PathNode> = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut cost_so_far: HashMap<Cell, i32> = HashMap::new();
    let mut closed: HashSet<Cell> = HashSet::new();
    let mut discovered: u64 = 0;

    cost_so_far.insert(start, 0);
    frontier.push(PathNode {
        cell: start,
        priority: start.manhattan(&goal),
        cost: 0,
        order: discovered,
    });

    let mut expanded = 0usize;
    while let Some(node) = frontier.pop() {
        if node.cell == goal {
            let path = reconstruct(&came_from, start, goal);
            trace!(%start, %goal, expanded, steps = path.len(), "path found");
            return path;
        }

        // Stale entry for a cell already expanded at lower cost
        if !closed.insert(node.cell) {
            continue;
        }
        expanded += 1;

        for next in grid.neighbors4(node.cell) {
            let new_cost = node.cost + 1;
            let improves = match cost_so_far.get(&next) {
                Some(&best) => new_cost < best,
                None => true,
            };

            if improves {
                cost_so_far.insert(next, new_cost);
                came_from.insert(next, node.cell);
                discovered += 1;
                frontier.push(PathNode {
                    cell: next,
                    priority: new_cost + next.manhattan(&goal),
                    cost: new_cost,
                    order: discovered,
                });
            }
        }
    }

    trace!(%start, %goal, expanded, "no path");
    Vec::new()
}

/// Walk predecessor links from the goal back to the start, then reverse
fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Path {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(&prev) => current = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Direction of the first step along `path` when leaving `from`
pub fn first_step_direction(from: Cell, path: &[Cell]) -> Option<Direction> {
    path.first().and_then(|&next| Direction::between(from, next))
}

/// Format path for display
pub fn format_path(path: &[Cell]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    let mut result = String::new();
    for (i, cell) in path.iter().enumerate() {
        if i > 0 {
            result.push_str(" -> ");
        }
        result.push_str(&cell.to_string());
    }
    result
}
