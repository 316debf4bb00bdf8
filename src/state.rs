//! Combat state and the turn phase machine.
//!
//! A [`State`] is mutated in place by [`State::execute_action`]. The search
//! clones it whenever it needs a hypothetical continuation.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::ability::{AbilityCatalog, EffectOutcome};
use crate::action::{Action, ActionKind};
use crate::board::Board;

/// The side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Actor {
    Player,
    Ai,
}

impl Actor {
    #[inline]
    pub fn opponent(self) -> Actor {
        match self {
            Actor::Player => Actor::Ai,
            Actor::Ai => Actor::Player,
        }
    }
}

/// Encounter lifecycle. `PostCombat` is final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CombatStage {
    SetupCombat,
    InCombat,
    PostCombat,
}

/// Sub-turn phase within `InCombat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TurnPhase {
    TurnStart,
    TurnAction,
    TurnEnd,
}

/// How a finished encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    PlayerWin,
    AiWin,
    /// Both sides were wiped out in the same turn.
    Draw,
}

#[derive(Clone, Debug)]
pub struct State {
    actor: Actor,
    turn: u32,
    phase: TurnPhase,
    stage: CombatStage,
    last_action: Option<Action>,
    board: Board,
    catalog: Arc<AbilityCatalog>,
}

impl State {
    /// A new encounter in `SetupCombat`, player to move first.
    pub fn new(board: Board, catalog: Arc<AbilityCatalog>) -> Self {
        Self {
            actor: Actor::Player,
            turn: 0,
            phase: TurnPhase::TurnStart,
            stage: CombatStage::SetupCombat,
            last_action: None,
            board,
            catalog,
        }
    }

    /// Shortcut for a state already in combat.
    pub fn in_combat(board: Board, catalog: Arc<AbilityCatalog>) -> Self {
        let mut state = Self::new(board, catalog);
        state.begin_combat();
        state
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn stage(&self) -> CombatStage {
        self.stage
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn catalog(&self) -> &Arc<AbilityCatalog> {
        &self.catalog
    }

    /// Leave setup. An encounter with a side already empty ends at once.
    pub fn begin_combat(&mut self) {
        if self.stage != CombatStage::SetupCombat {
            return;
        }
        self.stage = CombatStage::InCombat;
        self.phase = TurnPhase::TurnStart;
        if self.outcome().is_some() {
            self.stage = CombatStage::PostCombat;
        }
    }

    /// Step the phase machine once. No-op outside `InCombat`.
    pub fn advance_turn(&mut self) {
        if self.stage != CombatStage::InCombat {
            return;
        }
        match self.phase {
            TurnPhase::TurnStart => {
                self.turn += 1;
                self.phase = TurnPhase::TurnAction;
            }
            TurnPhase::TurnAction => self.phase = TurnPhase::TurnEnd,
            TurnPhase::TurnEnd => {
                self.actor = self.actor.opponent();
                self.phase = TurnPhase::TurnStart;
                if self.outcome().is_some() {
                    self.stage = CombatStage::PostCombat;
                }
            }
        }
    }

    /// True if `actor` has wiped out the other side.
    pub fn check_win_condition(&self, actor: Actor) -> bool {
        self.board.squares_of(actor.opponent()).is_empty()
    }

    /// The result once combat has started and a side is empty.
    ///
    /// Mutual annihilation is a draw.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.stage == CombatStage::SetupCombat {
            return None;
        }
        match (
            self.check_win_condition(Actor::Player),
            self.check_win_condition(Actor::Ai),
        ) {
            (true, true) => Some(Outcome::Draw),
            (true, false) => Some(Outcome::PlayerWin),
            (false, true) => Some(Outcome::AiWin),
            (false, false) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage == CombatStage::PostCombat || self.outcome().is_some()
    }

    /// Every legal action for the side to move, in square order, moves
    /// before abilities for each piece. Empty unless in combat.
    pub fn possible_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.stage != CombatStage::InCombat || self.is_terminal() {
            return actions;
        }
        for &sq in self.board.squares_of(self.actor) {
            let piece = self.board.piece(sq);
            piece.valid_moves(sq, &self.board, &mut actions);
            if !piece.abilities.is_empty() {
                piece.valid_abilities(sq, &self.board, &self.catalog, &mut actions);
            }
        }
        actions
    }

    /// Apply `action` as the current actor's turn and hand over to the
    /// other side.
    ///
    /// The caller is responsible for legality; see `possible_actions`.
    /// Returns the effect of an ability action. Outside `InCombat` this is
    /// a no-op returning `None`, like `pass_turn`.
    pub fn execute_action(&mut self, action: Action, rng: &mut fastrand::Rng) -> Option<EffectOutcome> {
        if self.stage != CombatStage::InCombat {
            return None;
        }
        if self.phase == TurnPhase::TurnStart {
            self.advance_turn();
        }

        let effect = match action.kind {
            ActionKind::Move => {
                self.board.switch_pieces(action.origin, action.target);
                None
            }
            ActionKind::Ability => self.resolve_ability(action, rng),
        };
        trace!(turn = self.turn, actor = ?self.actor, %action, ?effect, "executed action");
        self.last_action = Some(action);

        self.finish_turn();
        effect
    }

    /// End the current actor's turn without acting.
    pub fn pass_turn(&mut self) {
        if self.stage != CombatStage::InCombat {
            return;
        }
        if self.phase == TurnPhase::TurnStart {
            self.advance_turn();
        }
        self.finish_turn();
    }

    fn finish_turn(&mut self) {
        while self.stage == CombatStage::InCombat && self.phase != TurnPhase::TurnStart {
            self.advance_turn();
        }
    }

    /// Resolve an ability on its target. Only combatants are affected; a
    /// combatant whose health runs out is removed from the board.
    fn resolve_ability(&mut self, action: Action, rng: &mut fastrand::Rng) -> Option<EffectOutcome> {
        let id = action.ability?;
        let ability = self.catalog.get(id)?;
        if self.board.piece(action.target).side().is_none() {
            return Some(EffectOutcome::NoEffect);
        }

        let stats = self.board.stats_mut(action.target);
        let effect = ability.apply(stats, rng);
        if stats.health.is_depleted() {
            self.board.remove_piece(action.target);
        }
        Some(effect)
    }
}
