//! Monte Carlo rollouts (random combat simulation).
//!
//! A rollout plays uniformly random legal actions until the encounter ends
//! or the ply limit is reached, then scores the result for the AI.

use crate::state::{Outcome, State};

/// Result of one rollout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rollout {
    /// 1 if the AI won, else 0. Draws and unfinished rollouts score 0.
    pub reward: u32,
    /// Plies played, counting passes.
    pub depth: u32,
}

/// Play random actions from `state` for at most `max_depth` plies.
///
/// A side with no legal action passes. `state` is consumed in place; clone
/// first to keep it.
pub fn rollout(state: &mut State, max_depth: u32, rng: &mut fastrand::Rng) -> Rollout {
    let mut depth = 0;

    while depth < max_depth && !state.is_terminal() {
        let actions = state.possible_actions();
        if actions.is_empty() {
            state.pass_turn();
        } else {
            let action = actions[rng.usize(..actions.len())];
            state.execute_action(action, rng);
        }
        depth += 1;
    }

    let reward = match state.outcome() {
        Some(Outcome::AiWin) => 1,
        _ => 0,
    };
    Rollout { reward, depth }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ability::AbilityCatalog;
    use crate::board::Board;
    use crate::piece::Piece;
    use crate::state::Actor;
    use crate::stats::StatBlock;

    fn state_with(player_health: f64, enemy_health: f64) -> State {
        let catalog = Arc::new(AbilityCatalog::standard());
        let hit = vec![catalog.lookup("weapon_hit").unwrap()];
        let mut board = Board::empty();
        board.update_square(
            0,
            Piece::combatant("Knight", Actor::Player, 0, hit.clone(), StatBlock::with_health(player_health)),
        );
        board.update_square(
            1,
            Piece::combatant("Goblin", Actor::Ai, 0, hit, StatBlock::with_health(enemy_health)),
        );
        State::in_combat(board, catalog)
    }

    #[test]
    fn test_terminal_state_has_zero_depth() {
        let mut state = state_with(10.0, 10.0);
        let mut finished = state.clone();
        let mut rng = fastrand::Rng::with_seed(9);
        finished.execute_action(state.possible_actions()[0], &mut rng);
        assert!(finished.is_terminal());

        let result = rollout(&mut finished, 100, &mut rng);
        assert_eq!(result, Rollout { reward: 0, depth: 0 });

        // The player strikes first and wins, so the AI never scores.
        let result = rollout(&mut state, 100, &mut rng);
        assert_eq!(result, Rollout { reward: 0, depth: 1 });
    }

    #[test]
    fn test_ai_win_scores_one() {
        // Player cannot kill in one hit; the AI can.
        let mut state = state_with(10.0, 15.0);
        let mut rng = fastrand::Rng::with_seed(5);
        let result = rollout(&mut state, 100, &mut rng);
        assert_eq!(result, Rollout { reward: 1, depth: 2 });
    }

    #[test]
    fn test_depth_limit() {
        // Both sides stranded with nothing to do: only passes.
        let catalog = Arc::new(AbilityCatalog::standard());
        let mut board = Board::empty();
        board.update_square(0, Piece::combatant("K", Actor::Player, 0, vec![], StatBlock::with_health(5.0)));
        board.update_square(63, Piece::combatant("G", Actor::Ai, 0, vec![], StatBlock::with_health(5.0)));
        let mut state = State::in_combat(board, catalog);
        let mut rng = fastrand::Rng::with_seed(1);
        let result = rollout(&mut state, 7, &mut rng);
        assert_eq!(result, Rollout { reward: 0, depth: 7 });
        assert!(!state.is_terminal());
    }
}
