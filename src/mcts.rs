//! Monte Carlo Tree Search (MCTS) over combat states.
//!
//! This module implements MCTS with:
//! - UCT for child selection
//! - One random untried action expanded per iteration
//! - Uniform random rollouts scored for the AI
//! - Independent shards run in parallel and merged by [`best_action`]
//!
//! Nodes live in an arena ([`SearchTree`]) and refer to each other by
//! [`NodeId`]. Children are owned through the arena; the parent index is only
//! followed during backpropagation.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::action::Action;
use crate::config::SearchConfig;
use crate::playout::{Rollout, rollout};
use crate::state::State;

/// Index of a node in its [`SearchTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// State reached after `action`
    pub state: State,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Action leading here from the parent (`None` at the root)
    pub action: Option<Action>,
    /// Number of visits
    pub visits: u32,
    /// Number of AI wins
    pub wins: u32,
    /// Total rollout plies over all visits
    pub turns: u64,
    /// Actions not yet expanded
    untried: Vec<Action>,
}

impl TreeNode {
    fn new(state: State, parent: Option<NodeId>, action: Option<Action>) -> Self {
        let untried = state.possible_actions();
        Self {
            state,
            parent,
            children: Vec::new(),
            action,
            visits: 0,
            wins: 0,
            turns: 0,
            untried,
        }
    }

    /// AI win rate over the visits of this node.
    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.visits > 0 {
            self.wins as f64 / self.visits as f64
        } else {
            0.0
        }
    }

    pub fn untried(&self) -> &[Action] {
        &self.untried
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    fn uct(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        self.winrate() + exploration * ((parent_visits as f64).ln() / visits).sqrt()
    }
}

/// Arena of tree nodes rooted at [`NodeId::ROOT`].
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub fn new(root: State) -> Self {
        Self {
            nodes: vec![TreeNode::new(root, None, None)],
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn root(&self) -> &TreeNode {
        self.node(NodeId::ROOT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep only the slice of the root's untried actions owned by `shard`.
    fn restrict_root(&mut self, config: &SearchConfig, shard: usize) {
        let root = &mut self.nodes[NodeId::ROOT.0];
        let slice = config.root_slice(shard, root.untried.len());
        root.untried = root.untried[slice].to_vec();
    }

    /// Descend by UCT from the root to a node that still has untried
    /// actions, is terminal, or has no children.
    pub fn select(&self, exploration: f64) -> NodeId {
        let mut id = NodeId::ROOT;
        loop {
            let node = self.node(id);
            if node.state.is_terminal() || !node.is_fully_expanded() || node.children.is_empty() {
                return id;
            }
            let mut best = node.children[0];
            let mut best_score = f64::NEG_INFINITY;
            for &child in &node.children {
                let score = self.node(child).uct(node.visits, exploration);
                if score > best_score {
                    best = child;
                    best_score = score;
                }
            }
            id = best;
        }
    }

    /// Expand one untried action of `id`, chosen uniformly at random.
    ///
    /// Returns `id` itself when nothing is left to expand.
    pub fn expand(&mut self, id: NodeId, rng: &mut fastrand::Rng) -> NodeId {
        let node = &mut self.nodes[id.0];
        if node.untried.is_empty() || node.state.is_terminal() {
            return id;
        }
        let action = node.untried.swap_remove(rng.usize(..node.untried.len()));
        let mut state = node.state.clone();
        state.execute_action(action, rng);

        let child = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::new(state, Some(id), Some(action)));
        self.nodes[id.0].children.push(child);
        child
    }

    /// Add a rollout result to `id` and all of its ancestors.
    pub fn backpropagate(&mut self, id: NodeId, result: Rollout) {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &mut self.nodes[id.0];
            node.visits += 1;
            node.wins += result.reward;
            node.turns += result.depth as u64;
            current = node.parent;
        }
    }

    /// Statistics of the root's children, in expansion order.
    pub fn root_stats(&self) -> Vec<ActionStats> {
        self.root()
            .children
            .iter()
            .filter_map(|&child| {
                let node = self.node(child);
                node.action.map(|action| ActionStats {
                    action,
                    wins: node.wins,
                    visits: node.visits,
                    turns: node.turns,
                })
            })
            .collect()
    }
}

// =============================================================================
// Shards and merge
// =============================================================================

/// Accumulated statistics for one root action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActionStats {
    pub action: Action,
    pub wins: u32,
    pub visits: u32,
    pub turns: u64,
}

/// What a shard reports back after its budget runs out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShardReport {
    pub stats: Vec<ActionStats>,
    pub iterations: u32,
}

/// The chosen action and its merged statistics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: Action,
    pub win_rate: f64,
    pub average_turns: f64,
    /// `average_turns / win_rate`; infinite when the action never won.
    pub fast_win: f64,
}

/// Result of a full search.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub recommendation: Option<Recommendation>,
    pub iterations: u32,
    pub actions: Vec<ActionStats>,
}

/// Run the MCTS loop for one shard against a private clone of `root`.
///
/// The loop stops at the shard's iteration budget or at `deadline`,
/// whichever comes first, and reports whatever it has gathered. A shard
/// that starts after the deadline still completes one iteration.
pub fn run_shard(root: &State, config: &SearchConfig, shard: usize, deadline: Instant) -> ShardReport {
    let mut rng = fastrand::Rng::with_seed(config.seed.wrapping_add(shard as u64));
    let mut tree = SearchTree::new(root.clone());
    tree.restrict_root(config, shard);

    if tree.root().state.is_terminal() || tree.root().untried.is_empty() {
        debug!(shard, "nothing to search");
        return ShardReport::default();
    }

    let budget = config.shard_iterations();
    let mut iterations = 0;

    while iterations < budget && (iterations == 0 || Instant::now() < deadline) {
        let leaf = tree.select(config.exploration);
        let node = tree.expand(leaf, &mut rng);

        let mut state = tree.node(node).state.clone();
        let result = rollout(&mut state, config.max_depth, &mut rng);
        tree.backpropagate(node, result);

        iterations += 1;
        trace!(shard, iterations, reward = result.reward, depth = result.depth, "iteration");
    }

    debug!(shard, iterations, nodes = tree.len(), "shard finished");
    ShardReport {
        stats: tree.root_stats(),
        iterations,
    }
}

/// Sum per-action statistics across shards.
///
/// Actions keep the position of their first appearance, scanning shards in
/// order. Actions with no visits are dropped.
pub fn merge_reports(reports: &[ShardReport]) -> Vec<ActionStats> {
    let mut merged: Vec<ActionStats> = Vec::new();
    let mut index: HashMap<Action, usize> = HashMap::new();

    for stats in reports.iter().flat_map(|r| r.stats.iter()) {
        if stats.visits == 0 {
            continue;
        }
        match index.get(&stats.action) {
            Some(&i) => {
                merged[i].wins += stats.wins;
                merged[i].visits += stats.visits;
                merged[i].turns += stats.turns;
            }
            None => {
                index.insert(stats.action, merged.len());
                merged.push(*stats);
            }
        }
    }
    merged
}

fn recommendation(stats: &ActionStats) -> Recommendation {
    let win_rate = stats.wins as f64 / stats.visits as f64;
    let average_turns = stats.turns as f64 / stats.visits as f64;
    let fast_win = if stats.wins == 0 {
        f64::INFINITY
    } else {
        average_turns / win_rate
    };
    Recommendation {
        action: stats.action,
        win_rate,
        average_turns,
        fast_win,
    }
}

/// Pick the action that wins most reliably and quickly across shards.
///
/// Minimises `average_turns / win_rate` over the merged statistics; the
/// first minimum in merge order wins ties. If no action ever won, falls
/// back to the most-visited one. `None` only when nothing was visited.
pub fn best_action(reports: &[ShardReport]) -> Option<Recommendation> {
    choose(&merge_reports(reports))
}

fn choose(merged: &[ActionStats]) -> Option<Recommendation> {
    let mut best: Option<Recommendation> = None;
    for rec in merged.iter().map(recommendation) {
        if !rec.fast_win.is_finite() {
            continue;
        }
        if best.is_none_or(|b| rec.fast_win < b.fast_win) {
            best = Some(rec);
        }
    }
    if best.is_some() {
        return best;
    }

    // Nothing won: fall back to the most-visited action, first on ties.
    let mut most: Option<&ActionStats> = None;
    for stats in merged {
        if most.is_none_or(|m| stats.visits > m.visits) {
            most = Some(stats);
        }
    }
    most.map(recommendation)
}

/// Run every shard in parallel from `root` and merge the results.
///
/// All shards share one deadline, so the time limit bounds the whole
/// search however many threads the pool has.
pub fn search(root: &State, config: &SearchConfig) -> SearchReport {
    let deadline = config.deadline();
    let reports: Vec<ShardReport> = (0..config.shards.max(1))
        .into_par_iter()
        .map(|shard| run_shard(root, config, shard, deadline))
        .collect();

    let iterations = reports.iter().map(|r| r.iterations).sum();
    let actions = merge_reports(&reports);
    let recommendation = choose(&actions);

    match &recommendation {
        Some(rec) => info!(
            action = %rec.action,
            win_rate = rec.win_rate,
            average_turns = rec.average_turns,
            iterations,
            "search finished"
        ),
        None => info!(iterations, "search finished without a recommendation"),
    }

    SearchReport {
        recommendation,
        iterations,
        actions,
    }
}

/// Print root statistics to stderr.
pub fn dump_actions(actions: &[ActionStats]) {
    for stats in actions {
        eprintln!(
            "{} v={} w={} turns={}",
            stats.action, stats.visits, stats.wins, stats.turns
        );
    }
}
