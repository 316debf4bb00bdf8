//! Square occupants and their action generation.

use std::sync::Arc;

use crate::ability::{AbilityCatalog, AbilityId};
use crate::action::Action;
use crate::board::Board;
use crate::geometry::Square;
use crate::state::Actor;
use crate::stats::StatBlock;

/// What occupies a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Terrain,
    Player,
    Enemy,
    Empty,
    /// Empty square where the player may deploy before combat.
    PlayerArea,
}

/// The occupant of one square. Embedded by value in the board.
///
/// Name and ability list are immutable and shared between clones; the stat
/// block is copied, so mutating a cloned board never reaches the original.
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub name: Arc<str>,
    pub kind: PieceKind,
    pub blocks_movement: bool,
    pub blocks_los: bool,
    pub move_range: u8,
    pub abilities: Arc<[AbilityId]>,
    pub stats: StatBlock,
}

impl Default for Piece {
    fn default() -> Self {
        Self::empty()
    }
}

impl Piece {
    fn scenery(name: &str, kind: PieceKind, blocks: bool) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            blocks_movement: blocks,
            blocks_los: blocks,
            move_range: 0,
            abilities: Arc::from(Vec::<AbilityId>::new()),
            stats: StatBlock::default(),
        }
    }

    pub fn empty() -> Self {
        Self::scenery("Empty", PieceKind::Empty, false)
    }

    pub fn terrain() -> Self {
        Self::scenery("Terrain", PieceKind::Terrain, true)
    }

    pub fn player_area() -> Self {
        Self::scenery("PlayerArea", PieceKind::PlayerArea, false)
    }

    /// A player or enemy combatant. Combatants block movement and sight.
    pub fn combatant(
        name: &str,
        side: Actor,
        move_range: u8,
        abilities: Vec<AbilityId>,
        stats: StatBlock,
    ) -> Self {
        Self {
            name: Arc::from(name),
            kind: match side {
                Actor::Player => PieceKind::Player,
                Actor::Ai => PieceKind::Enemy,
            },
            blocks_movement: true,
            blocks_los: true,
            move_range,
            abilities: Arc::from(abilities),
            stats,
        }
    }

    /// The side controlling this piece, if any.
    #[inline]
    pub fn side(&self) -> Option<Actor> {
        match self.kind {
            PieceKind::Player => Some(Actor::Player),
            PieceKind::Enemy => Some(Actor::Ai),
            _ => None,
        }
    }

    /// Append one move action per square reachable within `move_range`.
    pub fn valid_moves(&self, origin: Square, board: &Board, out: &mut Vec<Action>) {
        out.extend(
            board
                .range(origin, self.move_range, false)
                .into_iter()
                .map(|target| Action::movement(origin, target)),
        );
    }

    /// Append one ability action per (ability, legal target) pair.
    ///
    /// Targets are squares in sight within the ability's range, filtered by
    /// the ability's targeting flags.
    pub fn valid_abilities(
        &self,
        origin: Square,
        board: &Board,
        catalog: &AbilityCatalog,
        out: &mut Vec<Action>,
    ) {
        let side = self.side();
        for &id in self.abilities.iter() {
            let Some(ability) = catalog.get(id) else {
                continue;
            };
            if ability.targets_self {
                out.push(Action::ability(origin, origin, id));
            }
            for target in board.range(origin, ability.range, true) {
                let allowed = if ability.targets_anything() {
                    true
                } else {
                    match (side, board.piece(target).side()) {
                        (Some(mine), Some(theirs)) => {
                            (ability.targets_friendly && mine == theirs)
                                || (ability.targets_enemy && mine != theirs)
                        }
                        _ => false,
                    }
                };
                if allowed {
                    out.push(Action::ability(origin, target, id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn catalog() -> AbilityCatalog {
        AbilityCatalog::standard()
    }

    #[test]
    fn test_scenery_blocking_flags() {
        assert!(Piece::terrain().blocks_movement && Piece::terrain().blocks_los);
        assert!(!Piece::empty().blocks_movement && !Piece::empty().blocks_los);
        assert!(!Piece::player_area().blocks_movement);
        assert_eq!(Piece::player_area().side(), None);
    }

    #[test]
    fn test_combatant_side() {
        let p = Piece::combatant("Knight", Actor::Player, 3, vec![], StatBlock::with_health(10.0));
        let e = Piece::combatant("Goblin", Actor::Ai, 2, vec![], StatBlock::with_health(10.0));
        assert_eq!(p.side(), Some(Actor::Player));
        assert_eq!(e.side(), Some(Actor::Ai));
        assert!(p.blocks_movement && p.blocks_los);
    }

    #[test]
    fn test_melee_targets_only_adjacent_enemies() {
        let catalog = catalog();
        let hit = catalog.lookup("weapon_hit").unwrap();
        let mut board = Board::empty();
        board.update_square(
            9,
            Piece::combatant("Knight", Actor::Player, 1, vec![hit], StatBlock::with_health(20.0)),
        );
        board.update_square(10, Piece::combatant("Goblin", Actor::Ai, 1, vec![], StatBlock::with_health(5.0)));
        board.update_square(0, Piece::combatant("Squire", Actor::Player, 1, vec![], StatBlock::with_health(5.0)));
        board.update_square(12, Piece::combatant("Orc", Actor::Ai, 1, vec![], StatBlock::with_health(5.0)));

        let mut actions = Vec::new();
        board.piece(9).valid_abilities(9, &board, &catalog, &mut actions);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Ability);
        assert_eq!(actions[0].target, 10);
        assert_eq!(actions[0].ability, Some(hit));
    }

    #[test]
    fn test_valid_moves_skip_blocked_squares() {
        let mut board = Board::empty();
        board.update_square(0, Piece::combatant("Knight", Actor::Player, 1, vec![], StatBlock::with_health(1.0)));
        board.update_square(1, Piece::terrain());
        let mut actions = Vec::new();
        board.piece(0).valid_moves(0, &board, &mut actions);
        let mut targets: Vec<Square> = actions.iter().map(|a| a.target).collect();
        targets.sort();
        assert_eq!(targets, vec![8, 9]);
        assert!(actions.iter().all(|a| a.kind == ActionKind::Move && a.origin == 0));
    }
}
