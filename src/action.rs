//! Actions: a move between two squares or an ability used on a target.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::geometry::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Move,
    Ability,
}

/// A proposed or executed state transition.
///
/// Ability actions carry the catalog id of the ability, never a reference
/// into a particular piece, so an action stays valid against any clone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    pub kind: ActionKind,
    pub origin: Square,
    pub target: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityId>,
}

impl Action {
    pub fn movement(origin: Square, target: Square) -> Self {
        Self {
            kind: ActionKind::Move,
            origin,
            target,
            ability: None,
        }
    }

    pub fn ability(origin: Square, target: Square, ability: AbilityId) -> Self {
        Self {
            kind: ActionKind::Ability,
            origin,
            target,
            ability: Some(ability),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.ability) {
            (ActionKind::Move, _) => write!(f, "move {} -> {}", self.origin, self.target),
            (ActionKind::Ability, Some(id)) => {
                write!(f, "ability #{} {} -> {}", id.0, self.origin, self.target)
            }
            (ActionKind::Ability, None) => write!(f, "ability ? {} -> {}", self.origin, self.target),
        }
    }
}
