//! One game in progress.
//!
//! A [`Session`] owns everything a single encounter needs: the ability
//! catalog, search settings, the combat state and the player's current
//! selection. Sessions are plain values; running several at once just
//! means holding several.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::ability::{AbilityCatalog, EffectOutcome};
use crate::action::{Action, ActionKind};
use crate::config::SearchConfig;
use crate::constants::BOARD_SIZE;
use crate::geometry::Square;
use crate::ingest::{IngestError, load_board};
use crate::mcts::{SearchReport, search};
use crate::piece::{Piece, PieceKind};
use crate::state::{Actor, CombatStage, Outcome, State};

pub const REASON_NO_BOARD: &str = "No board loaded";
pub const REASON_INVALID_SQUARE: &str = "Invalid square";
pub const REASON_SETUP_ONLY_PLAYER_AREA: &str = "You can only select PlayerArea";
pub const REASON_ENEMY_WITHOUT_ACTOR: &str = "You can't select the Enemy";
pub const REASON_NO_LEGAL_TARGETS: &str = "No legal targets";
pub const REASON_NOT_YOUR_TURN: &str = "Not your turn";
pub const REASON_WRONG_PHASE: &str = "Invalid square for current phase";
pub const REASON_COMBAT_OVER: &str = "Combat is over";

/// Result of clicking a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SquareSelection {
    /// A deployment square during setup.
    DeploymentTarget,
    /// An enemy the selected actor can use an ability on.
    AttackTarget,
    /// A player piece, now the selected actor.
    ActorSelected,
    Rejected(&'static str),
}

impl fmt::Display for SquareSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareSelection::DeploymentTarget => f.write_str("PlayerArea"),
            SquareSelection::AttackTarget => f.write_str("Action chosen against Enemy"),
            SquareSelection::ActorSelected => f.write_str("PlayerPiece selected"),
            SquareSelection::Rejected(reason) => f.write_str(reason),
        }
    }
}

/// An operation that is not allowed right now. The session is unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("no board loaded")]
    NoBoard,

    #[error("combat is in {actual:?}, expected {expected:?}")]
    WrongStage {
        expected: CombatStage,
        actual: CombatStage,
    },

    #[error("illegal action: {0}")]
    IllegalAction(Action),

    #[error("square {0} is off the board")]
    InvalidSquare(usize),

    #[error("square {0} is not a deployment square")]
    NotDeploymentSquare(Square),

    #[error("only player pieces can be deployed")]
    NotPlayerPiece,

    #[error("it is not the AI's turn")]
    NotAiTurn,
}

pub struct Session {
    catalog: Arc<AbilityCatalog>,
    config: SearchConfig,
    state: Option<State>,
    selected: Option<Square>,
    rng: fastrand::Rng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AbilityCatalog::standard(), SearchConfig::default())
    }
}

impl Session {
    pub fn new(catalog: AbilityCatalog, config: SearchConfig) -> Self {
        let rng = fastrand::Rng::with_seed(config.seed);
        Self {
            catalog: Arc::new(catalog),
            config,
            state: None,
            selected: None,
            rng,
        }
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
    }

    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Replace the ability catalog. Any loaded board refers to the old
    /// catalog's ids, so it is dropped.
    pub fn set_catalog(&mut self, catalog: AbilityCatalog) {
        info!(abilities = catalog.len(), "catalog replaced");
        self.catalog = Arc::new(catalog);
        self.state = None;
        self.selected = None;
    }

    /// Ingest a board and start a new encounter in setup.
    pub fn load_board(&mut self, json: &str) -> Result<(), IngestError> {
        let board = load_board(json, &self.catalog)?;
        self.state = Some(State::new(board, Arc::clone(&self.catalog)));
        self.selected = None;
        info!("board loaded");
        Ok(())
    }

    fn state_ref(&self) -> Result<&State, ActionError> {
        self.state.as_ref().ok_or(ActionError::NoBoard)
    }

    /// The state, checked to be at `expected`.
    fn state_in(&mut self, expected: CombatStage) -> Result<&mut State, ActionError> {
        let state = self.state.as_mut().ok_or(ActionError::NoBoard)?;
        if state.stage() != expected {
            return Err(ActionError::WrongStage {
                expected,
                actual: state.stage(),
            });
        }
        Ok(state)
    }

    /// What clicking `sq` means in the current phase.
    ///
    /// Selecting one of the player's own pieces during combat makes it the
    /// acting piece for later target selection.
    pub fn select_square(&mut self, sq: usize) -> SquareSelection {
        let Some(state) = self.state.as_ref() else {
            return SquareSelection::Rejected(REASON_NO_BOARD);
        };
        if sq >= BOARD_SIZE {
            return SquareSelection::Rejected(REASON_INVALID_SQUARE);
        }
        let sq = sq as Square;
        let piece = state.board().piece(sq);

        match state.stage() {
            CombatStage::SetupCombat => {
                if piece.kind == PieceKind::PlayerArea {
                    SquareSelection::DeploymentTarget
                } else {
                    SquareSelection::Rejected(REASON_SETUP_ONLY_PLAYER_AREA)
                }
            }
            CombatStage::PostCombat => SquareSelection::Rejected(REASON_COMBAT_OVER),
            CombatStage::InCombat if state.actor() != Actor::Player => {
                SquareSelection::Rejected(REASON_NOT_YOUR_TURN)
            }
            CombatStage::InCombat => match piece.kind {
                PieceKind::Enemy => match self.selected {
                    None => SquareSelection::Rejected(REASON_ENEMY_WITHOUT_ACTOR),
                    Some(actor) => {
                        let legal = state.possible_actions().iter().any(|a| {
                            a.kind == ActionKind::Ability && a.origin == actor && a.target == sq
                        });
                        if legal {
                            SquareSelection::AttackTarget
                        } else {
                            SquareSelection::Rejected(REASON_NO_LEGAL_TARGETS)
                        }
                    }
                },
                PieceKind::Player => {
                    self.selected = Some(sq);
                    SquareSelection::ActorSelected
                }
                _ => SquareSelection::Rejected(REASON_WRONG_PHASE),
            },
        }
    }

    /// Place a player piece on a deployment square during setup.
    pub fn deploy(&mut self, sq: usize, piece: Piece) -> Result<(), ActionError> {
        if sq >= BOARD_SIZE {
            return Err(ActionError::InvalidSquare(sq));
        }
        let sq = sq as Square;
        if piece.side() != Some(Actor::Player) {
            return Err(ActionError::NotPlayerPiece);
        }
        let state = self.state_in(CombatStage::SetupCombat)?;
        if state.board().piece(sq).kind != PieceKind::PlayerArea {
            return Err(ActionError::NotDeploymentSquare(sq));
        }
        info!(square = sq, name = %piece.name, "piece deployed");
        state.board_mut().update_square(sq, piece);
        Ok(())
    }

    pub fn begin_combat(&mut self) -> Result<(), ActionError> {
        let state = self.state_in(CombatStage::SetupCombat)?;
        state.begin_combat();
        let stage = state.stage();
        self.selected = None;
        info!(?stage, "combat started");
        Ok(())
    }

    /// Legal actions of the side to move.
    pub fn legal_actions(&self) -> Result<Vec<Action>, ActionError> {
        Ok(self.state_ref()?.possible_actions())
    }

    /// Execute `action` if it is legal for the side to move.
    pub fn apply_action(&mut self, action: Action) -> Result<Option<EffectOutcome>, ActionError> {
        let state = self.state_in(CombatStage::InCombat)?;
        if !state.possible_actions().contains(&action) {
            return Err(ActionError::IllegalAction(action));
        }
        let mut rng = self.rng.fork();
        let state = self.state.as_mut().ok_or(ActionError::NoBoard)?;
        let effect = state.execute_action(action, &mut rng);
        let stage = state.stage();
        self.selected = None;
        info!(%action, ?effect, ?stage, "action applied");
        Ok(effect)
    }

    /// End the current side's turn without acting.
    pub fn pass_turn(&mut self) -> Result<(), ActionError> {
        let state = self.state_in(CombatStage::InCombat)?;
        state.pass_turn();
        self.selected = None;
        Ok(())
    }

    /// Search for the AI's best action.
    pub fn recommend(&self) -> Result<SearchReport, ActionError> {
        let state = self.state_ref()?;
        if state.stage() != CombatStage::InCombat {
            return Err(ActionError::WrongStage {
                expected: CombatStage::InCombat,
                actual: state.stage(),
            });
        }
        if state.actor() != Actor::Ai {
            return Err(ActionError::NotAiTurn);
        }
        Ok(search(state, &self.config))
    }

    /// Let the AI take its turn: search, then play the recommendation or
    /// pass when there is none.
    pub fn ai_turn(&mut self) -> Result<Option<Action>, ActionError> {
        let report = self.recommend()?;
        match report.recommendation {
            Some(rec) => {
                self.apply_action(rec.action)?;
                Ok(Some(rec.action))
            }
            None => {
                self.pass_turn()?;
                Ok(None)
            }
        }
    }

    /// One-line summary of the session.
    pub fn status(&self) -> String {
        let Some(state) = self.state.as_ref() else {
            return REASON_NO_BOARD.to_string();
        };
        let board = state.board();
        match state.stage() {
            CombatStage::SetupCombat => format!(
                "Setup: {} player pieces, {} enemies",
                board.player_squares().len(),
                board.enemy_squares().len()
            ),
            CombatStage::InCombat => {
                let side = match state.actor() {
                    Actor::Player => "player",
                    Actor::Ai => "AI",
                };
                format!("Turn {}: {side} to act", state.turn())
            }
            CombatStage::PostCombat => match state.outcome() {
                Some(Outcome::PlayerWin) => "Combat over: player wins".to_string(),
                Some(Outcome::AiWin) => "Combat over: AI wins".to_string(),
                Some(Outcome::Draw) | None => "Combat over: draw".to_string(),
            },
        }
    }
}
