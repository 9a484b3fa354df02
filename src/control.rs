//! Pause, resume and stop coordination between a controller and the worker
//! running an algorithm.
//!
//! Each operation type (generation, solving, fill) owns one [`RunControl`]. The
//! algorithm calls [`Checkpoint::checkpoint`] after every atomic step; that call
//! parks the worker while paused, paces it by the animation delay, and turns a
//! stop request into [`MazeError::StoppedByUser`] so the algorithm unwinds with `?`.

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{config::AlgorithmKind, error::MazeError};

/// Cooperative cancellation point called by the maze algorithms.
pub trait Checkpoint {
    /// Called after a step that changes what a renderer would draw.
    /// Blocks while paused and sleeps for the animation delay.
    fn checkpoint(&self) -> Result<(), MazeError>;

    /// Observes pause and stop without pacing. Used inside long scans.
    fn poll(&self) -> Result<(), MazeError>;
}

/// A checkpoint that never pauses, never stops and never sleeps.
/// Runs an algorithm synchronously at full speed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

impl Checkpoint for Unthrottled {
    fn checkpoint(&self) -> Result<(), MazeError> {
        Ok(())
    }

    fn poll(&self) -> Result<(), MazeError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RunState {
    is_active: bool,
    is_paused: bool,
    should_stop: bool,
    kind: Option<AlgorithmKind>,
    delay: Duration,
}

/// Run-control flags for one operation type, guarded by a single mutex and
/// condition variable.
///
/// `Idle -> Active -> {Paused <-> Active} -> Idle`. Every transition method is
/// safe to call from any thread at any time; invalid transitions are no-ops
/// that return `false`.
#[derive(Debug, Default)]
pub struct RunControl {
    state: Mutex<RunState>,
    signal: Condvar,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flags are plain booleans, so a poisoned lock still holds usable state.
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active
    }

    pub fn is_paused(&self) -> bool {
        self.lock().is_paused
    }

    /// `Idle -> Active`. Fails if already active.
    pub(crate) fn begin(&self, kind: AlgorithmKind, delay: Duration) -> bool {
        let mut state = self.lock();
        if state.is_active {
            return false;
        }
        *state = RunState {
            is_active: true,
            is_paused: false,
            should_stop: false,
            kind: Some(kind),
            delay,
        };
        true
    }

    /// Changes the pacing of a running operation if it is running `kind`.
    pub(crate) fn retime(&self, kind: AlgorithmKind, delay: Duration) {
        let mut state = self.lock();
        if state.kind == Some(kind) {
            state.delay = delay;
            self.signal.notify_all();
        }
    }

    /// `Active -> Paused`.
    pub fn pause(&self) -> bool {
        let mut state = self.lock();
        if !state.is_active || state.is_paused || state.should_stop {
            return false;
        }
        state.is_paused = true;
        tracing::debug!(kind = ?state.kind, "paused");
        true
    }

    /// `Paused -> Active`, waking the worker.
    pub fn resume(&self) -> bool {
        let mut state = self.lock();
        if !state.is_paused {
            return false;
        }
        state.is_paused = false;
        self.signal.notify_all();
        tracing::debug!(kind = ?state.kind, "resumed");
        true
    }

    /// Requests a stop from `Active` or `Paused`. A paused worker is woken so it
    /// can observe the request. The state only returns to `Idle` once the
    /// worker has exited and called `finish`.
    pub fn stop(&self) -> bool {
        let mut state = self.lock();
        if !state.is_active || state.should_stop {
            return false;
        }
        state.should_stop = true;
        self.signal.notify_all();
        tracing::debug!(kind = ?state.kind, paused = state.is_paused, "stop requested");
        true
    }

    /// Back to `Idle`. Called by the worker after the algorithm has returned.
    pub(crate) fn finish(&self) {
        let mut state = self.lock();
        *state = RunState::default();
        self.signal.notify_all();
    }

    /// Blocks until this control is `Idle`.
    pub fn wait_until_idle(&self) {
        let state = self.lock();
        let _idle = self
            .signal
            .wait_while(state, |state| state.is_active)
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn wait_turn(&self, paced: bool) -> Result<(), MazeError> {
        let mut state = self.lock();
        let mut deadline = None;
        loop {
            if state.should_stop {
                return Err(MazeError::StoppedByUser);
            }
            if state.is_paused {
                state = self
                    .signal
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }
            if !paced || state.delay.is_zero() {
                return Ok(());
            }
            // Sleep on the condvar so stop and pause cut the delay short
            let deadline = *deadline.get_or_insert_with(|| Instant::now() + state.delay);
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl Checkpoint for RunControl {
    fn checkpoint(&self) -> Result<(), MazeError> {
        self.wait_turn(true)
    }

    fn poll(&self) -> Result<(), MazeError> {
        self.wait_turn(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::Generator;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    const KIND: AlgorithmKind = AlgorithmKind::Generate(Generator::Kruskal);

    #[test]
    fn test_begin_rejects_second_start() {
        let control = RunControl::new();
        assert!(control.begin(KIND, Duration::ZERO));
        assert!(!control.begin(KIND, Duration::ZERO));
        control.finish();
        assert!(control.begin(KIND, Duration::ZERO));
    }

    #[test]
    fn test_transitions_when_idle_are_noops() {
        let control = RunControl::new();
        assert!(!control.pause());
        assert!(!control.resume());
        assert!(!control.stop());
        assert!(!control.is_active());
        assert!(control.checkpoint().is_ok());
    }

    #[test]
    fn test_pause_only_from_active() {
        let control = RunControl::new();
        control.begin(KIND, Duration::ZERO);
        assert!(!control.resume());
        assert!(control.pause());
        assert!(!control.pause());
        assert!(control.is_paused());
        assert!(control.resume());
        assert!(!control.is_paused());
    }

    #[test]
    fn test_stop_wakes_paused_worker() {
        let control = Arc::new(RunControl::new());
        control.begin(KIND, Duration::ZERO);
        control.pause();

        let steps = Arc::new(AtomicUsize::new(0));
        let worker = {
            let control = control.clone();
            let steps = steps.clone();
            thread::spawn(move || {
                let result = (0..).try_for_each(|_| {
                    control.checkpoint()?;
                    steps.fetch_add(1, Ordering::Relaxed);
                    Ok::<_, MazeError>(())
                });
                control.finish();
                result
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(steps.load(Ordering::Relaxed), 0);
        assert!(control.stop());
        assert_eq!(
            worker.join().expect("worker panicked"),
            Err(MazeError::StoppedByUser)
        );
        assert_eq!(steps.load(Ordering::Relaxed), 0);
        assert!(!control.is_active());
    }

    #[test]
    fn test_stop_interrupts_long_delay() {
        let control = Arc::new(RunControl::new());
        control.begin(KIND, Duration::from_secs(60));
        let worker = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint())
        };
        thread::sleep(Duration::from_millis(20));
        control.stop();
        assert_eq!(
            worker.join().expect("worker panicked"),
            Err(MazeError::StoppedByUser)
        );
    }

    #[test]
    fn test_wait_until_idle() {
        let control = Arc::new(RunControl::new());
        control.begin(KIND, Duration::ZERO);
        let finisher = {
            let control = control.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                control.finish();
            })
        };
        control.wait_until_idle();
        assert!(!control.is_active());
        finisher.join().expect("finisher panicked");
    }
}
