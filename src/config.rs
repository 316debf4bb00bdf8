//! Search configuration.

use std::time::{Duration, Instant};

use crate::constants::{
    EXPLORATION_CONSTANT, ITERATION_GOAL, MAX_ROLLOUT_DEPTH, NUM_SHARDS, SEED, TIME_LIMIT_MS,
};

/// Parameters for one MCTS search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// UCT exploration constant.
    pub exploration: f64,
    /// Wall-clock budget for the whole search, shared by every shard.
    pub time_limit: Duration,
    /// Maximum plies per rollout.
    pub max_depth: u32,
    /// Iterations across all shards.
    pub iteration_goal: u32,
    pub shards: usize,
    /// Shard `k` is seeded with `seed + k`.
    pub seed: u64,
    /// Split the root's actions between shards instead of every shard
    /// searching all of them.
    pub partition_root: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION_CONSTANT,
            time_limit: Duration::from_millis(TIME_LIMIT_MS),
            max_depth: MAX_ROLLOUT_DEPTH,
            iteration_goal: ITERATION_GOAL,
            shards: NUM_SHARDS,
            seed: SEED,
            partition_root: true,
        }
    }
}

impl SearchConfig {
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_iteration_goal(mut self, iteration_goal: u32) -> Self {
        self.iteration_goal = iteration_goal;
        self
    }

    /// Number of shards; at least one.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_partition_root(mut self, partition_root: bool) -> Self {
        self.partition_root = partition_root;
        self
    }

    /// The instant a search started now must stop by.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.time_limit
    }

    /// Iteration budget of a single shard.
    pub fn shard_iterations(&self) -> u32 {
        let shards = self.shards.max(1) as u32;
        (self.iteration_goal / shards).max(1)
    }

    /// The half-open slice of `n` root actions owned by `shard`.
    ///
    /// Every shard owns everything when partitioning is off.
    pub fn root_slice(&self, shard: usize, n: usize) -> std::ops::Range<usize> {
        if !self.partition_root {
            return 0..n;
        }
        let per_shard = n.div_ceil(self.shards.max(1));
        let start = (shard * per_shard).min(n);
        let end = (start + per_shard).min(n);
        start..end
    }
}
