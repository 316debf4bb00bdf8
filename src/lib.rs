//! Chess-Crawler: the combat core of a chess-board tactics game.
//!
//! This crate resolves turn-based combat on a fixed 8x8 board and picks AI
//! actions with Monte Carlo Tree Search (MCTS) run across parallel shards.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and search defaults
//! - [`geometry`] - Neighbour and sight-line tables
//! - [`bitboard`] - 64-bit square sets
//! - [`stats`], [`ability`], [`piece`] - What occupies a square and what it can do
//! - [`board`] - Pieces plus range and line-of-sight queries
//! - [`action`], [`state`] - Actions and the turn state machine
//! - [`playout`], [`mcts`], [`config`] - Search
//! - [`ingest`], [`session`], [`bridge`] - Host-facing entry points
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chess_crawler::ability::AbilityCatalog;
//! use chess_crawler::board::Board;
//! use chess_crawler::config::SearchConfig;
//! use chess_crawler::mcts::search;
//! use chess_crawler::piece::Piece;
//! use chess_crawler::state::{Actor, State};
//! use chess_crawler::stats::StatBlock;
//!
//! let catalog = Arc::new(AbilityCatalog::standard());
//! let hit = vec![catalog.lookup("weapon_hit").unwrap()];
//!
//! let mut board = Board::empty();
//! board.update_square(0, Piece::combatant("Knight", Actor::Player, 2, hit.clone(), StatBlock::with_health(20.0)));
//! board.update_square(18, Piece::combatant("Goblin", Actor::Ai, 1, hit, StatBlock::with_health(20.0)));
//!
//! let mut state = State::in_combat(board, catalog);
//! state.pass_turn();
//!
//! let config = SearchConfig::default().with_iteration_goal(200);
//! let report = search(&state, &config);
//! println!("{:?}", report.recommendation);
//! ```

pub mod ability;
pub mod action;
pub mod bitboard;
pub mod board;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod ingest;
pub mod mcts;
pub mod piece;
pub mod playout;
pub mod session;
pub mod state;
pub mod stats;
