//! Pre-computed geometry tables for the fixed 8x8 board.
//!
//! This module contains:
//! - Neighbour lists for range flood fill (constant, 8-directional)
//! - Sight lines between every ordered pair of squares (built once, lazily)
//!
//! Both tables are immutable and shared read-only by every search shard.

use once_cell::sync::Lazy;

use crate::bitboard::Bitboard;
use crate::constants::{BOARD_SIZE, BOARD_WIDTH, DIRECTIONS, MAX_NEIGHBORS, MAX_SIGHT_LINE};

/// A square index in `0..64`.
pub type Square = u8;

/// Row of a square (0 = top).
#[inline(always)]
pub const fn row(sq: Square) -> usize {
    sq as usize / BOARD_WIDTH
}

/// Column of a square (0 = left).
#[inline(always)]
pub const fn col(sq: Square) -> usize {
    sq as usize % BOARD_WIDTH
}

/// Square at the given row and column.
#[inline(always)]
pub const fn square_at(row: usize, col: usize) -> Square {
    (row * BOARD_WIDTH + col) as Square
}

/// Chebyshev (king-move) distance between two squares.
pub const fn king_distance(a: Square, b: Square) -> usize {
    let dr = row(a).abs_diff(row(b));
    let dc = col(a).abs_diff(col(b));
    if dr > dc { dr } else { dc }
}

// =============================================================================
// Neighbours
// =============================================================================

/// In-board neighbours of one square, in [`DIRECTIONS`] order.
#[derive(Clone, Copy, Debug)]
pub struct Neighbors {
    squares: [Square; MAX_NEIGHBORS],
    len: u8,
}

impl Neighbors {
    const EMPTY: Neighbors = Neighbors {
        squares: [0; MAX_NEIGHBORS],
        len: 0,
    };

    #[inline]
    pub fn as_slice(&self) -> &[Square] {
        &self.squares[..self.len as usize]
    }
}

/// Pre-computed neighbours for each square (king moves).
pub static NEIGHBORS: [Neighbors; BOARD_SIZE] = {
    let mut table = [Neighbors::EMPTY; BOARD_SIZE];
    let mut sq = 0usize;
    while sq < BOARD_SIZE {
        let r = (sq / BOARD_WIDTH) as i8;
        let c = (sq % BOARD_WIDTH) as i8;
        let mut d = 0;
        while d < MAX_NEIGHBORS {
            let (dr, dc) = DIRECTIONS[d];
            let nr = r + dr;
            let nc = c + dc;
            if nr >= 0 && nr < BOARD_WIDTH as i8 && nc >= 0 && nc < BOARD_WIDTH as i8 {
                let len = table[sq].len as usize;
                table[sq].squares[len] = (nr as usize * BOARD_WIDTH + nc as usize) as Square;
                table[sq].len += 1;
            }
            d += 1;
        }
        sq += 1;
    }
    table
};

/// Neighbours of `sq`.
#[inline]
pub fn neighbors(sq: Square) -> &'static [Square] {
    NEIGHBORS[sq as usize].as_slice()
}

// =============================================================================
// Sight lines
// =============================================================================

/// The squares that must be clear for `origin` to see `target`.
///
/// The two sentinels are kept distinct from an empty path and from each
/// other. Both are visible whatever the blockers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SightLine {
    /// Origin and target coincide.
    SameSquare,
    /// Origin and target touch (orthogonally or diagonally).
    Adjacent,
    /// Squares strictly between origin and target, ordered from origin.
    Through {
        squares: [Square; MAX_SIGHT_LINE],
        len: u8,
        mask: Bitboard,
    },
}

impl SightLine {
    /// Intervening squares; empty for both sentinels.
    pub fn squares(&self) -> &[Square] {
        match self {
            SightLine::Through { squares, len, .. } => &squares[..*len as usize],
            SightLine::SameSquare | SightLine::Adjacent => &[],
        }
    }

    /// Intervening squares as a set; empty for both sentinels.
    #[inline]
    pub fn mask(&self) -> Bitboard {
        match self {
            SightLine::Through { mask, .. } => *mask,
            SightLine::SameSquare | SightLine::Adjacent => Bitboard::EMPTY,
        }
    }
}

/// Sight lines for every ordered pair, indexed `[origin * 64 + target]`.
static SIGHT_LINES: Lazy<Vec<SightLine>> = Lazy::new(|| {
    let mut table = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
    for origin in 0..BOARD_SIZE as Square {
        for target in 0..BOARD_SIZE as Square {
            table.push(compute_sight_line(origin, target));
        }
    }
    table
});

/// Sight line from `origin` to `target`.
#[inline]
pub fn sight_line(origin: Square, target: Square) -> &'static SightLine {
    &SIGHT_LINES[origin as usize * BOARD_SIZE + target as usize]
}

/// Build the sight line between two square centres.
///
/// A square is on the line when the segment crosses its open interior.
/// Working in doubled coordinates keeps the corners on integers, so the
/// test is exact and gives the same squares in both directions.
fn compute_sight_line(origin: Square, target: Square) -> SightLine {
    if origin == target {
        return SightLine::SameSquare;
    }
    if king_distance(origin, target) == 1 {
        return SightLine::Adjacent;
    }

    let (x0, y0) = (2 * col(origin) as i32, 2 * row(origin) as i32);
    let (x1, y1) = (2 * col(target) as i32, 2 * row(target) as i32);
    let (dx, dy) = (x1 - x0, y1 - y0);
    let side = |x: i32, y: i32| dy * (x - x0) - dx * (y - y0);

    let mut crossed: Vec<Square> = Vec::new();
    for r in row(origin).min(row(target))..=row(origin).max(row(target)) {
        for c in col(origin).min(col(target))..=col(origin).max(col(target)) {
            let sq = square_at(r, c);
            if sq == origin || sq == target {
                continue;
            }
            let (cx, cy) = (2 * c as i32, 2 * r as i32);
            let corners = [
                side(cx - 1, cy - 1),
                side(cx + 1, cy - 1),
                side(cx - 1, cy + 1),
                side(cx + 1, cy + 1),
            ];
            let above = corners.iter().any(|&s| s > 0);
            let below = corners.iter().any(|&s| s < 0);
            if above && below {
                crossed.push(sq);
            }
        }
    }

    // Order from origin by projection onto the line.
    crossed.sort_by_key(|&sq| {
        let px = 2 * col(sq) as i32 - x0;
        let py = 2 * row(sq) as i32 - y0;
        px * dx + py * dy
    });

    debug_assert!(crossed.len() <= MAX_SIGHT_LINE);
    let mut squares = [0; MAX_SIGHT_LINE];
    squares[..crossed.len()].copy_from_slice(&crossed);
    SightLine::Through {
        squares,
        len: crossed.len() as u8,
        mask: crossed.iter().copied().collect(),
    }
}
