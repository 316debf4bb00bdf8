//! The 64-square board: pieces, blocking bitboards and occupancy lists.
//!
//! The two bitboards and the two occupancy lists are derived from the piece
//! array. Every write goes through [`Board::update_square`] or
//! [`Board::switch_pieces`], which refresh the derived state of the touched
//! squares before returning, so no query can observe a stale bitboard.

use std::collections::VecDeque;
use std::fmt;

use crate::bitboard::Bitboard;
use crate::constants::{
    BOARD_SIZE, BOARD_WIDTH, GLYPH_EMPTY, GLYPH_ENEMY, GLYPH_PLAYER, GLYPH_PLAYER_AREA,
    GLYPH_TERRAIN,
};
use crate::geometry::{SightLine, Square, neighbors, sight_line};
use crate::piece::{Piece, PieceKind};
use crate::state::Actor;
use crate::stats::StatBlock;

#[derive(Clone, Debug)]
pub struct Board {
    squares: [Piece; BOARD_SIZE],
    move_blockers: Bitboard,
    sight_blockers: Bitboard,
    /// Squares holding player pieces, ascending.
    player_squares: Vec<Square>,
    /// Squares holding enemy pieces, ascending.
    enemy_squares: Vec<Square>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn new(squares: [Piece; BOARD_SIZE]) -> Self {
        let mut board = Self {
            squares: std::array::from_fn(|_| Piece::empty()),
            move_blockers: Bitboard::EMPTY,
            sight_blockers: Bitboard::EMPTY,
            player_squares: Vec::new(),
            enemy_squares: Vec::new(),
        };
        board.init_board(squares);
        board
    }

    /// A board of empty squares.
    pub fn empty() -> Self {
        Self::new(std::array::from_fn(|_| Piece::empty()))
    }

    /// Replace every square and rebuild all derived state from scratch.
    pub fn init_board(&mut self, squares: [Piece; BOARD_SIZE]) {
        self.squares = squares;
        self.move_blockers = Bitboard::EMPTY;
        self.sight_blockers = Bitboard::EMPTY;
        self.player_squares.clear();
        self.enemy_squares.clear();

        for (i, piece) in self.squares.iter().enumerate() {
            let sq = i as Square;
            self.move_blockers.assign(sq, piece.blocks_movement);
            self.sight_blockers.assign(sq, piece.blocks_los);
            match piece.side() {
                Some(Actor::Player) => self.player_squares.push(sq),
                Some(Actor::Ai) => self.enemy_squares.push(sq),
                None => {}
            }
        }
        debug_assert!(self.is_consistent());
    }

    #[inline]
    pub fn piece(&self, sq: Square) -> &Piece {
        &self.squares[sq as usize]
    }

    pub fn pieces(&self) -> &[Piece; BOARD_SIZE] {
        &self.squares
    }

    /// Mutable stats of the piece on `sq`. Kind and blocking flags stay
    /// read-only so the derived state cannot drift.
    #[inline]
    pub fn stats_mut(&mut self, sq: Square) -> &mut StatBlock {
        &mut self.squares[sq as usize].stats
    }

    #[inline]
    pub fn move_blockers(&self) -> Bitboard {
        self.move_blockers
    }

    #[inline]
    pub fn sight_blockers(&self) -> Bitboard {
        self.sight_blockers
    }

    pub fn player_squares(&self) -> &[Square] {
        &self.player_squares
    }

    pub fn enemy_squares(&self) -> &[Square] {
        &self.enemy_squares
    }

    /// Occupancy list for one side.
    pub fn squares_of(&self, actor: Actor) -> &[Square] {
        match actor {
            Actor::Player => &self.player_squares,
            Actor::Ai => &self.enemy_squares,
        }
    }

    /// Overwrite one square's occupant.
    pub fn update_square(&mut self, sq: Square, piece: Piece) {
        self.squares[sq as usize] = piece;
        self.refresh(sq);
    }

    /// Exchange the occupants of two squares.
    pub fn switch_pieces(&mut self, a: Square, b: Square) {
        self.squares.swap(a as usize, b as usize);
        self.refresh(a);
        self.refresh(b);
    }

    /// Clear `sq` back to an empty square.
    pub fn remove_piece(&mut self, sq: Square) {
        self.update_square(sq, Piece::empty());
    }

    /// Recompute bitboard flags and occupancy membership for one square.
    fn refresh(&mut self, sq: Square) {
        let piece = &self.squares[sq as usize];
        self.move_blockers.assign(sq, piece.blocks_movement);
        self.sight_blockers.assign(sq, piece.blocks_los);

        let side = piece.side();
        set_membership(&mut self.player_squares, sq, side == Some(Actor::Player));
        set_membership(&mut self.enemy_squares, sq, side == Some(Actor::Ai));
    }

    /// True if no sight blocker lies between `origin` and `target`.
    ///
    /// A square always sees itself and its neighbours, whatever the blockers.
    pub fn line_of_sight(&self, origin: Square, target: Square) -> bool {
        match sight_line(origin, target) {
            SightLine::SameSquare | SightLine::Adjacent => true,
            line => (line.mask() & self.sight_blockers).is_empty(),
        }
    }

    /// Squares reachable from `origin` within `max_range` king-move hops.
    ///
    /// Breadth-first flood fill over the neighbour table. In sight mode a
    /// square is accepted when `origin` can see it; in movement mode when it
    /// does not block movement. Accepted squares are expanded further. The
    /// origin itself is never returned. Squares are returned in the order
    /// they are first reached, which is deterministic for a given board.
    pub fn range(&self, origin: Square, max_range: u8, use_los: bool) -> Vec<Square> {
        let start = max_range as u16 + 1;
        // Best remaining range seen per square; the origin starts saturated.
        let mut best = [0u16; BOARD_SIZE];
        best[origin as usize] = start;

        let mut reached = Vec::new();
        let mut queue: VecDeque<(Square, u16)> = VecDeque::with_capacity(BOARD_SIZE);
        queue.push_back((origin, start));
        let mut pushes = 1usize;

        while let Some((sq, remaining)) = queue.pop_front() {
            let next = remaining - 1;
            if next == 0 {
                continue;
            }
            for &n in neighbors(sq) {
                if next <= best[n as usize] {
                    continue;
                }
                let accepted = if use_los {
                    self.line_of_sight(origin, n)
                } else {
                    !self.move_blockers.contains(n)
                };
                if !accepted {
                    continue;
                }
                if best[n as usize] == 0 {
                    reached.push(n);
                }
                best[n as usize] = next;
                queue.push_back((n, next));
                pushes += 1;
                debug_assert!(pushes <= BOARD_SIZE * start as usize);
            }
        }
        reached
    }

    /// True if the bitboards and occupancy lists match the piece array.
    pub fn is_consistent(&self) -> bool {
        let mut players = Vec::new();
        let mut enemies = Vec::new();
        for (i, piece) in self.squares.iter().enumerate() {
            let sq = i as Square;
            if self.move_blockers.contains(sq) != piece.blocks_movement
                || self.sight_blockers.contains(sq) != piece.blocks_los
            {
                return false;
            }
            match piece.side() {
                Some(Actor::Player) => players.push(sq),
                Some(Actor::Ai) => enemies.push(sq),
                None => {}
            }
        }
        players == self.player_squares && enemies == self.enemy_squares
    }
}

/// Insert or remove `sq` in a sorted square list.
fn set_membership(list: &mut Vec<Square>, sq: Square, present: bool) {
    match (list.binary_search(&sq), present) {
        (Err(pos), true) => list.insert(pos, sq),
        (Ok(pos), false) => {
            list.remove(pos);
        }
        _ => {}
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, piece) in self.squares.iter().enumerate() {
            let ch = match piece.kind {
                PieceKind::Player => GLYPH_PLAYER,
                PieceKind::Enemy => GLYPH_ENEMY,
                PieceKind::Terrain => GLYPH_TERRAIN,
                PieceKind::PlayerArea => GLYPH_PLAYER_AREA,
                PieceKind::Empty => GLYPH_EMPTY,
            };
            write!(f, "{ch}")?;
            if i % BOARD_WIDTH == BOARD_WIDTH - 1 {
                writeln!(f)?;
            } else {
                write!(f, " ")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::king_distance;

    fn soldier(side: Actor) -> Piece {
        Piece::combatant("Soldier", side, 2, vec![], StatBlock::with_health(10.0))
    }

    fn sorted(mut v: Vec<Square>) -> Vec<Square> {
        v.sort();
        v
    }

    #[test]
    fn test_init_board_derives_state() {
        let mut squares: [Piece; BOARD_SIZE] = std::array::from_fn(|_| Piece::empty());
        squares[3] = Piece::terrain();
        squares[10] = soldier(Actor::Player);
        squares[40] = soldier(Actor::Ai);
        squares[5] = soldier(Actor::Player);
        squares[60] = Piece::player_area();
        let board = Board::new(squares);

        assert!(board.is_consistent());
        assert_eq!(board.move_blockers(), [3u8, 5, 10, 40].into_iter().collect());
        assert_eq!(board.sight_blockers(), board.move_blockers());
        assert_eq!(board.player_squares(), &[5, 10]);
        assert_eq!(board.enemy_squares(), &[40]);
    }

    #[test]
    fn test_switch_pieces_updates_derived_state() {
        let mut board = Board::empty();
        board.update_square(0, soldier(Actor::Player));
        board.switch_pieces(0, 27);
        assert!(!board.move_blockers().contains(0));
        assert!(board.move_blockers().contains(27));
        assert_eq!(board.player_squares(), &[27]);
        assert!(board.is_consistent());
    }

    #[test]
    fn test_update_square_changes_side() {
        let mut board = Board::empty();
        board.update_square(12, soldier(Actor::Player));
        board.update_square(12, soldier(Actor::Ai));
        assert!(board.player_squares().is_empty());
        assert_eq!(board.enemy_squares(), &[12]);
        board.remove_piece(12);
        assert!(board.enemy_squares().is_empty());
        assert!(board.move_blockers().is_empty());
    }

    #[test]
    fn test_line_of_sight_blocked_by_terrain() {
        let mut board = Board::empty();
        assert!(board.line_of_sight(0, 3));
        board.update_square(2, Piece::terrain());
        assert!(!board.line_of_sight(0, 3));
        assert!(!board.line_of_sight(3, 0));
        // Adjacent squares always see each other, even a blocker.
        assert!(board.line_of_sight(1, 2));
        board.update_square(5, Piece::terrain());
        assert!(board.line_of_sight(5, 5));
    }

    #[test]
    fn test_line_of_sight_symmetric_with_blockers() {
        let mut board = Board::empty();
        for sq in [11u8, 19, 28, 34, 45, 52] {
            board.update_square(sq, Piece::terrain());
        }
        for a in 0..BOARD_SIZE as Square {
            for b in 0..BOARD_SIZE as Square {
                assert_eq!(board.line_of_sight(a, b), board.line_of_sight(b, a), "{a} <-> {b}");
            }
        }
    }

    #[test]
    fn test_range_open_board_is_king_distance() {
        let board = Board::empty();
        let origin = 27;
        let got = sorted(board.range(origin, 2, false));
        let expected: Vec<Square> = (0..BOARD_SIZE as Square)
            .filter(|&sq| sq != origin && king_distance(origin, sq) <= 2)
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_range_zero_is_empty() {
        let board = Board::empty();
        assert!(board.range(10, 0, false).is_empty());
        assert!(board.range(10, 0, true).is_empty());
    }

    #[test]
    fn test_range_never_contains_origin_or_duplicates() {
        let board = Board::empty();
        for origin in [0u8, 7, 27, 63] {
            let got = board.range(origin, 7, false);
            assert!(!got.contains(&origin));
            let mut dedup = got.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), got.len());
            assert_eq!(got.len(), BOARD_SIZE - 1);
        }
    }

    #[test]
    fn test_movement_range_walks_around_walls() {
        // A wall across column 1 except the bottom row.
        let mut board = Board::empty();
        for r in 0..7 {
            board.update_square((r * BOARD_WIDTH + 1) as Square, Piece::terrain());
        }
        let got = board.range(0, 2, false);
        assert!(!got.iter().any(|&sq| sq as usize % BOARD_WIDTH >= 1));
        assert_eq!(sorted(got), vec![8, 16]);
    }

    #[test]
    fn test_sight_range_includes_visible_blockers() {
        let mut board = Board::empty();
        board.update_square(2, soldier(Actor::Ai));
        let got = board.range(0, 3, true);
        assert!(got.contains(&2), "visible enemy should be targetable");
        assert!(!got.contains(&3), "square behind the enemy is hidden");
    }

    #[test]
    fn test_range_is_deterministic() {
        let mut board = Board::empty();
        board.update_square(20, Piece::terrain());
        board.update_square(21, Piece::terrain());
        let a = board.range(12, 4, true);
        let b = board.range(12, 4, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clone_isolation() {
        let mut original = Board::empty();
        original.update_square(9, soldier(Actor::Player));
        let mut copy = original.clone();

        copy.stats_mut(9).health.add_flat_bonus(-7.0);
        copy.switch_pieces(9, 30);
        copy.update_square(0, Piece::terrain());

        assert_eq!(original.piece(9).stats.health.total(), 10.0);
        assert_eq!(original.player_squares(), &[9]);
        assert!(!original.move_blockers().contains(0));
        assert!(!original.move_blockers().contains(30));
        assert_eq!(copy.piece(30).stats.health.total(), 3.0);
    }

    #[test]
    fn test_display_grid() {
        let mut board = Board::empty();
        board.update_square(0, soldier(Actor::Player));
        board.update_square(7, soldier(Actor::Ai));
        board.update_square(8, Piece::terrain());
        board.update_square(9, Piece::player_area());
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "P . . . . . . E");
        assert_eq!(lines[1], "# + . . . . . .");
    }
}
