use thiserror::Error;

use crate::maze::OperationKind;

/// Errors produced by the maze engine.
///
/// None of these terminate the process. Operations running on the background
/// worker convert them to `success = false` in their completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    /// A row/column pair outside `[0, height) x [0, width)`.
    #[error("cell ({row}, {col}) is out of bounds for a {width}x{height} maze")]
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    /// Another generation, solve, or fill is still running on this maze.
    #[error("cannot start {requested}: {active} is already active")]
    OperationAlreadyActive {
        requested: OperationKind,
        active: OperationKind,
    },
    /// The running operation observed a stop request at a checkpoint.
    #[error("operation stopped by user")]
    StoppedByUser,
    /// The solver exhausted every reachable cell without reaching the goal.
    #[error("no path found from start to goal")]
    NoPathFound,
    /// Mazes need at least one cell in each dimension.
    #[error("invalid maze dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}
