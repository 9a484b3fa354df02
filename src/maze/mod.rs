pub mod cell;
mod grid;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use rand::{SeedableRng, rngs::StdRng};

pub use cell::{Cell, CellRef, Coord, Direction};
pub use grid::{CellBuffer, Grid};

use crate::{
    config::{AlgorithmKind, AnimationPolicy, MazeConfig},
    control::RunControl,
    error::MazeError,
    fill::flood_fill,
    generators::{Generator, generate_maze, get_rng},
    solvers::{Solver, solve_maze},
};

/// The three mutually exclusive operations a maze can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Generation,
    Solving,
    Fill,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Generation => write!(f, "generation"),
            OperationKind::Solving => write!(f, "solving"),
            OperationKind::Fill => write!(f, "fill"),
        }
    }
}

type Completion = Box<dyn FnOnce(bool) + Send + 'static>;

/// A single maze and the background worker that generates, solves or floods it.
///
/// Every method takes `&self`, so a controller can share the maze between an
/// input thread and a render thread. At most one operation runs at a time. Each
/// start method hands its completion callback a single `bool`, exactly once:
/// immediately with `false` if the start is refused, otherwise from the worker
/// after it has stopped.
///
/// The worker is the only writer of cell state. Renderers read it through
/// [`Maze::cell_buffer`] without further synchronization and may see a frame
/// in which a step is half drawn.
pub struct Maze {
    grid: Mutex<Arc<Grid>>,
    generation: Arc<RunControl>,
    solving: Arc<RunControl>,
    filling: Arc<RunControl>,
    animation: Mutex<AnimationPolicy>,
    rng: Mutex<StdRng>,
    /// Serializes operation starts and resizes. Holds every worker that may
    /// still be running, including one that is only running its callback.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Every lock in here guards plain data that is valid after a panic elsewhere.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for Maze {
    fn default() -> Self {
        Maze::new(MazeConfig::default())
    }
}

/// A usable size has at least one cell per side and a cell count that fits in
/// a `usize`.
fn check_dimensions(width: usize, height: usize) -> Result<(), MazeError> {
    match width.checked_mul(height) {
        Some(len) if len > 0 => Ok(()),
        _ => Err(MazeError::InvalidDimensions { width, height }),
    }
}

impl Maze {
    /// Builds an idle maze with a fully walled grid.
    ///
    /// A configured size that [`Maze::resize`] would refuse (a zero side, or a
    /// cell count overflowing `usize`) is replaced by the default size.
    pub fn new(config: MazeConfig) -> Self {
        let (width, height) = match check_dimensions(config.width, config.height) {
            Ok(()) => (config.width, config.height),
            Err(err) => {
                let fallback = MazeConfig::default();
                tracing::warn!(%err, width = fallback.width, height = fallback.height, "using default size");
                (fallback.width, fallback.height)
            }
        };
        Maze {
            grid: Mutex::new(Arc::new(Grid::new(width, height))),
            generation: Arc::new(RunControl::new()),
            solving: Arc::new(RunControl::new()),
            filling: Arc::new(RunControl::new()),
            animation: Mutex::new(config.animation),
            rng: Mutex::new(get_rng(config.seed)),
            workers: Mutex::new(Vec::new()),
        }
    }

    fn current_grid(&self) -> Arc<Grid> {
        Arc::clone(&lock(&self.grid))
    }

    /// Returns the width of the maze in cells.
    pub fn width(&self) -> usize {
        lock(&self.grid).width()
    }

    /// Returns the height of the maze in cells.
    pub fn height(&self) -> usize {
        lock(&self.grid).height()
    }

    fn control(&self, op: OperationKind) -> &Arc<RunControl> {
        match op {
            OperationKind::Generation => &self.generation,
            OperationKind::Solving => &self.solving,
            OperationKind::Fill => &self.filling,
        }
    }

    /// The operation currently running, if any.
    pub fn active_operation(&self) -> Option<OperationKind> {
        [
            OperationKind::Generation,
            OperationKind::Solving,
            OperationKind::Fill,
        ]
        .into_iter()
        .find(|&op| self.control(op).is_active())
    }

    pub fn is_paused(&self, op: OperationKind) -> bool {
        self.control(op).is_paused()
    }

    /// The pacing `kind` would run with, including any override.
    pub fn animation_delay(&self, kind: AlgorithmKind) -> Duration {
        lock(&self.animation).delay_for(kind)
    }

    /// Read-only view of the cells for a renderer. Goes stale after a resize.
    pub fn cell_buffer(&self) -> CellBuffer {
        CellBuffer::new(&lock(&self.grid))
    }

    /// Number of open passages in the current grid.
    pub fn open_connections(&self) -> usize {
        self.current_grid().open_connections()
    }

    /// Whether every cell can reach every other through open walls.
    pub fn is_fully_connected(&self) -> bool {
        self.current_grid().is_fully_connected()
    }

    /// Replaces the grid with a cleared one of the new size.
    ///
    /// Returns `false` without touching anything if the size is unchanged, has
    /// a zero dimension or too many cells, or an operation is running.
    pub fn resize(&self, width: usize, height: usize) -> bool {
        let _workers = lock(&self.workers);
        if let Some(active) = self.active_operation() {
            tracing::warn!(width, height, %active, "refusing to resize while an operation is active");
            return false;
        }
        if let Err(err) = check_dimensions(width, height) {
            tracing::warn!(%err, "refusing to resize");
            return false;
        }
        let mut grid = lock(&self.grid);
        if (grid.width(), grid.height()) == (width, height) {
            return false;
        }
        *grid = Arc::new(Grid::new(width, height));
        tracing::info!(width, height, "maze resized");
        true
    }

    /// Sets (or with `None`, clears) the pacing override for one algorithm.
    /// Applies immediately if that algorithm is running.
    pub fn set_animation_delay(&self, kind: AlgorithmKind, delay: Option<Duration>) {
        let effective = {
            let mut animation = lock(&self.animation);
            animation.set(kind, delay);
            animation.delay_for(kind)
        };
        for control in [&self.generation, &self.solving, &self.filling] {
            control.retime(kind, effective);
        }
    }

    /// Clears the maze and carves a new one on the background worker.
    pub fn generate(
        &self,
        generator: Generator,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), MazeError> {
        self.launch(
            OperationKind::Generation,
            AlgorithmKind::Generate(generator),
            Box::new(on_complete),
            || {
                // Each accepted run gets its own generator drawn from the
                // maze's seeded stream, so refused starts leave it untouched
                let mut rng = StdRng::from_rng(&mut *lock(&self.rng));
                move |grid: &Grid, control: &RunControl| -> Result<usize, MazeError> {
                    generate_maze(grid, generator, &mut rng, control)?;
                    Ok(grid.open_connections())
                }
            },
        )
    }

    pub fn pause_generation(&self) -> bool {
        self.generation.pause()
    }

    pub fn resume_generation(&self) -> bool {
        self.generation.resume()
    }

    pub fn stop_generation(&self) -> bool {
        self.generation.stop()
    }

    /// Searches for a shortest path from the top-left to the bottom-right cell.
    /// Completes with `false` if there is none.
    pub fn start_solve(
        &self,
        solver: Solver,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), MazeError> {
        self.launch(
            OperationKind::Solving,
            AlgorithmKind::Solve(solver),
            Box::new(on_complete),
            || move |grid: &Grid, control: &RunControl| solve_maze(grid, solver, control),
        )
    }

    pub fn pause_solving(&self) -> bool {
        self.solving.pause()
    }

    pub fn resume_solving(&self) -> bool {
        self.solving.resume()
    }

    pub fn stop_solving(&self) -> bool {
        self.solving.stop()
    }

    /// Floods outward from `(row, col)`, marking every reachable cell.
    pub fn fill(
        &self,
        row: usize,
        col: usize,
        on_complete: impl FnOnce(bool) + Send + 'static,
    ) -> Result<(), MazeError> {
        if let Err(err) = self.current_grid().get(row, col) {
            tracing::warn!(%err, "refusing to start fill");
            on_complete(false);
            return Err(err);
        }
        self.launch(
            OperationKind::Fill,
            AlgorithmKind::Fill,
            Box::new(on_complete),
            || move |grid: &Grid, control: &RunControl| flood_fill(grid, (row, col), control),
        )
    }

    pub fn pause_fill(&self) -> bool {
        self.filling.pause()
    }

    pub fn resume_fill(&self) -> bool {
        self.filling.resume()
    }

    pub fn stop_fill(&self) -> bool {
        self.filling.stop()
    }

    /// Blocks until every worker has exited, including its completion
    /// callback and any operation such a callback started. A worker calling
    /// this skips itself.
    pub fn wait_for_idle(&self) {
        self.join_workers(false);
    }

    /// Joins workers until none but the calling thread remain. With `stop`,
    /// every control is stopped before each round, so operations chained
    /// from callbacks are stopped too.
    fn join_workers(&self, stop: bool) {
        let current = std::thread::current().id();
        loop {
            if stop {
                for control in [&self.generation, &self.solving, &self.filling] {
                    control.stop();
                }
            }
            let mut handles = std::mem::take(&mut *lock(&self.workers));
            if let Some(own) = handles
                .iter()
                .position(|handle| handle.thread().id() == current)
            {
                let own = handles.swap_remove(own);
                lock(&self.workers).push(own);
            }
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if handle.join().is_err() {
                    tracing::error!("maze worker panicked");
                }
            }
        }
    }

    /// Claims the operation's control and runs the task built by `prepare` on
    /// a new worker thread. `prepare` is only called once the start has been
    /// accepted. The task returns a count summarizing its result, for logging.
    fn launch<P, F>(
        &self,
        op: OperationKind,
        kind: AlgorithmKind,
        on_complete: Completion,
        prepare: P,
    ) -> Result<(), MazeError>
    where
        P: FnOnce() -> F,
        F: FnOnce(&Grid, &RunControl) -> Result<usize, MazeError> + Send + 'static,
    {
        let mut workers = lock(&self.workers);
        let control = self.control(op);
        let delay = lock(&self.animation).delay_for(kind);
        // Idle-to-active only fails if another start got past the active check,
        // which the workers lock rules out
        let refusal = match self.active_operation() {
            Some(active) => Some(active),
            None if !control.begin(kind, delay) => Some(op),
            None => None,
        };
        if let Some(active) = refusal {
            // The callback may call back into the maze, so it runs unlocked
            drop(workers);
            tracing::warn!(%op, algorithm = %kind, %active, "refusing to start");
            on_complete(false);
            return Err(MazeError::OperationAlreadyActive {
                requested: op,
                active,
            });
        }

        let task = prepare();
        let grid = self.current_grid();
        let control = Arc::clone(control);
        tracing::info!(%op, algorithm = %kind, width = grid.width(), height = grid.height(), ?delay, "started");
        let handle = std::thread::spawn(move || {
            let started = Instant::now();
            let result = task(&grid, &control);
            // Idle before the callback, so the callback may start the next operation
            control.finish();
            let elapsed = started.elapsed();
            let success = match result {
                Ok(count) => {
                    tracing::info!(%op, algorithm = %kind, count, ?elapsed, "completed");
                    true
                }
                Err(MazeError::StoppedByUser) => {
                    tracing::info!(%op, algorithm = %kind, ?elapsed, "stopped by user");
                    false
                }
                Err(err) => {
                    tracing::info!(%op, algorithm = %kind, %err, ?elapsed, "finished without success");
                    false
                }
            };
            on_complete(success);
        });

        // Reap workers that have fully exited; the rest are at most running
        // their callback and are joined by `wait_for_idle`
        let (finished, running): (Vec<_>, Vec<_>) =
            workers.drain(..).partition(|worker| worker.is_finished());
        *workers = running;
        workers.push(handle);
        drop(workers);
        for worker in finished {
            if worker.join().is_err() {
                tracing::error!("maze worker panicked");
            }
        }
        Ok(())
    }
}

impl Drop for Maze {
    fn drop(&mut self) {
        self.join_workers(true);
    }
}
