use crate::grid::Cell;

/// Map generation could not produce a usable grid
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Every attempt left some required anchor pair unreachable.
    #[error("no valid map after {attempts} attempts")]
    Exhausted { attempts: u32 },
    /// Rows or columns are not positive.
    #[error("invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: i32, cols: i32 },
    /// A protected cell, reachability endpoint or maze origin lies outside the grid.
    #[error("anchor cell out of bounds: {0}")]
    AnchorOutOfBounds(Cell),
}
