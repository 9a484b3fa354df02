use std::{collections::HashMap, time::Duration};

use crate::{generators::Generator, solvers::Solver};

/// Every algorithm the engine can run, used as the key for animation pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    Generate(Generator),
    Solve(Solver),
    Fill,
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlgorithmKind::Generate(generator) => write!(f, "{}", generator),
            AlgorithmKind::Solve(solver) => write!(f, "{}", solver),
            AlgorithmKind::Fill => write!(f, "Flood Fill"),
        }
    }
}

/// Delay applied at each paced checkpoint.
///
/// Only a throttle for visual feedback: results never depend on it.
#[derive(Debug, Clone, Default)]
pub struct AnimationPolicy {
    overrides: HashMap<AlgorithmKind, Duration>,
}

impl AnimationPolicy {
    /// Built-in pacing per algorithm.
    pub fn default_delay(kind: AlgorithmKind) -> Duration {
        let micros = match kind {
            AlgorithmKind::Generate(Generator::Wilson) => 2_000,
            AlgorithmKind::Generate(_) => 4_000,
            AlgorithmKind::Solve(Solver::AStar) => 12_000,
            AlgorithmKind::Solve(_) => 8_000,
            AlgorithmKind::Fill => 6_000,
        };
        Duration::from_micros(micros)
    }

    pub fn delay_for(&self, kind: AlgorithmKind) -> Duration {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| AnimationPolicy::default_delay(kind))
    }

    /// Sets an override, or removes it with `None` to fall back to the default.
    pub fn set(&mut self, kind: AlgorithmKind, delay: Option<Duration>) {
        match delay {
            Some(delay) => {
                self.overrides.insert(kind, delay);
            }
            None => {
                self.overrides.remove(&kind);
            }
        }
    }

    /// Overrides every algorithm with the same delay.
    pub fn uniform(delay: Duration) -> Self {
        let overrides = Generator::ALL
            .into_iter()
            .map(AlgorithmKind::Generate)
            .chain(Solver::ALL.into_iter().map(AlgorithmKind::Solve))
            .chain([AlgorithmKind::Fill])
            .map(|kind| (kind, delay))
            .collect();
        AnimationPolicy { overrides }
    }
}

/// Construction-time settings for a [`Maze`](crate::Maze).
#[derive(Debug, Clone)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    /// Fixed seed for reproducible generation. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub animation: AnimationPolicy,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            seed: None,
            animation: AnimationPolicy::default(),
        }
    }
}

impl MazeConfig {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_animation(mut self, animation: AnimationPolicy) -> Self {
        self.animation = animation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_and_reset() {
        let kind = AlgorithmKind::Solve(Solver::Bfs);
        let mut policy = AnimationPolicy::default();
        assert_eq!(policy.delay_for(kind), AnimationPolicy::default_delay(kind));
        policy.set(kind, Some(Duration::ZERO));
        assert_eq!(policy.delay_for(kind), Duration::ZERO);
        policy.set(kind, None);
        assert_eq!(policy.delay_for(kind), AnimationPolicy::default_delay(kind));
    }

    #[test]
    fn test_uniform_covers_everything() {
        let policy = AnimationPolicy::uniform(Duration::from_millis(1));
        assert_eq!(
            policy.delay_for(AlgorithmKind::Generate(Generator::Sidewinder)),
            Duration::from_millis(1)
        );
        assert_eq!(policy.delay_for(AlgorithmKind::Fill), Duration::from_millis(1));
    }
}
