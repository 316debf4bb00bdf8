//! Constants for board dimensions and search parameters.
//!
//! The board is a fixed 8x8 grid addressed by row-major square indices
//! in `0..64`. Square 0 is the top-left corner, square 63 the bottom-right.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of squares along one edge of the board.
pub const BOARD_WIDTH: usize = 8;

/// Total number of squares on the board.
pub const BOARD_SIZE: usize = BOARD_WIDTH * BOARD_WIDTH;

/// Maximum number of neighbours a square can have (8-directional adjacency).
pub const MAX_NEIGHBORS: usize = 8;

/// Upper bound on the number of squares strictly between two squares on a
/// sight line. A line crosses at most `dx + dy - 1` cells, and the two
/// endpoints are excluded.
pub const MAX_SIGHT_LINE: usize = 2 * (BOARD_WIDTH - 1);

/// Neighbour offsets as (row, column) deltas.
/// Order: North, NE, East, SE, South, SW, West, NW
pub const DIRECTIONS: [(i8, i8); MAX_NEIGHBORS] = [
    (-1, 0),  // North
    (-1, 1),  // NE
    (0, 1),   // East
    (1, 1),   // SE
    (1, 0),   // South
    (1, -1),  // SW
    (0, -1),  // West
    (-1, -1), // NW
];

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// UCT exploration constant.
pub const EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// Default wall-clock budget for one search, in milliseconds.
pub const TIME_LIMIT_MS: u64 = 1000;

/// Default maximum number of plies in a single rollout.
pub const MAX_ROLLOUT_DEPTH: u32 = 500;

/// Default total number of iterations, split evenly across shards.
pub const ITERATION_GOAL: u32 = 20_000;

/// Default number of independent search shards.
pub const NUM_SHARDS: usize = 4;

/// Default base seed. Shard `k` is seeded with `SEED + k`.
pub const SEED: u64 = 0x5eed_c0de;

// =============================================================================
// Square Categories (display glyphs)
// =============================================================================

pub const GLYPH_PLAYER: char = 'P';
pub const GLYPH_ENEMY: char = 'E';
pub const GLYPH_TERRAIN: char = '#';
pub const GLYPH_PLAYER_AREA: char = '+';
pub const GLYPH_EMPTY: char = '.';

// =============================================================================
// Ingestion Defaults
// =============================================================================

/// Movement range of a combatant whose descriptor omits `moveRange`.
pub const DEFAULT_MOVE_RANGE: u8 = 1;
