use std::{
    sync::mpsc::{self, Sender},
    time::{Duration, Instant},
};

use mazeworks::{AnimationPolicy, Generator, Maze, MazeConfig, MazeError, Solver};
use tracing_subscriber::EnvFilter;

/// Starts one operation through `start`, then blocks until its worker exits.
/// Returns whether it succeeded and how long it took.
fn timed(
    maze: &Maze,
    start: impl FnOnce(Sender<bool>) -> Result<(), MazeError>,
) -> (bool, Duration) {
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();
    if let Err(err) = start(tx) {
        tracing::error!(%err, "could not start");
        return (false, started.elapsed());
    }
    let ok = rx.recv().unwrap_or(false);
    maze.wait_for_idle();
    (ok, started.elapsed())
}

/// Headless run of every generator and solver pair at full speed.
///
/// Usage: `profile [width] [height] [iterations]`
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let mut next_arg = |default: usize| {
        args.next()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(default)
    };
    let width = next_arg(u8::MAX as usize);
    let height = next_arg(u8::MAX as usize);
    let iterations = next_arg(1).max(1);

    let maze = Maze::new(
        MazeConfig::default()
            .with_size(width, height)
            .with_seed(0)
            .with_animation(AnimationPolicy::uniform(Duration::ZERO)),
    );

    for generator in Generator::ALL {
        for solver in Solver::ALL {
            let mut generated = Duration::ZERO;
            let mut solved = Duration::ZERO;
            let mut path_found = 0;
            for _ in 0..iterations {
                let (ok, elapsed) = timed(&maze, |tx| {
                    maze.generate(generator, move |ok| {
                        tx.send(ok).ok();
                    })
                });
                generated += elapsed;
                if !ok || !maze.is_fully_connected() {
                    tracing::error!(%generator, "generation did not produce a perfect maze");
                    continue;
                }

                let (ok, elapsed) = timed(&maze, |tx| {
                    maze.start_solve(solver, move |ok| {
                        tx.send(ok).ok();
                    })
                });
                solved += elapsed;
                path_found += usize::from(ok);
            }
            tracing::info!(%generator, %solver, path_found, iterations, "profiled");
            println!(
                "{width}x{height} {:<24} {:<28} generate {:>10.3?}  solve {:>10.3?}  paths {path_found}/{iterations}",
                generator.to_string(),
                solver.to_string(),
                generated / iterations as u32,
                solved / iterations as u32,
            );
        }
    }
}
