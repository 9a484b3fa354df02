//! A maze engine that generates and solves mazes step by step on a background
//! worker, while a renderer watches the cells change.
//!
//! [`Maze`] is the entry point. Generation, solving and flood fill each run on
//! their own worker thread, one at a time, and can be paused, resumed and
//! stopped from any thread. Renderers read cells through a [`CellBuffer`].

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fill;
pub mod generators;
pub mod maze;
pub mod solvers;

pub use config::{AlgorithmKind, AnimationPolicy, MazeConfig};
pub use error::MazeError;
pub use generators::Generator;
pub use maze::{Cell, CellBuffer, Direction, Grid, Maze, OperationKind};
pub use solvers::Solver;
