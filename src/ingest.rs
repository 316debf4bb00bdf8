//! Board ingestion from the host's JSON square descriptors.
//!
//! The host sends a JSON array of 64 entries. `false` (or `null`) is an
//! empty square; anything else must be an object with a `type` tag:
//!
//! ```text
//! false
//! {"type": "Terrain"}
//! {"type": "PlayerArea"}
//! {"type": "Enemy", "name": "Goblin", "moveRange": 1, "abilities": ["weapon_hit"],
//!  "stats": {"health": {"base": 20, "flatBonus": 0, "percentBonus": 0}}}
//! {"type": "PlayerPiece", ...same fields as Enemy...}
//! ```
//!
//! Every malformed entry is rejected with the offending square's index.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::ability::AbilityCatalog;
use crate::board::Board;
use crate::constants::{BOARD_SIZE, DEFAULT_MOVE_RANGE};
use crate::piece::Piece;
use crate::state::Actor;
use crate::stats::{StatBlock, StatBlockFields};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid board JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board must be a JSON array of {size} squares", size = BOARD_SIZE)]
    NotArray,

    #[error("board has {0} squares, expected {size}", size = BOARD_SIZE)]
    WrongLength(usize),

    #[error("square {index}: expected an object or false, got {found}")]
    BadEntry { index: usize, found: &'static str },

    #[error("square {index}: missing `type` tag")]
    MissingType { index: usize },

    #[error("square {index}: unknown category `{tag}`")]
    UnknownCategory { index: usize, tag: String },

    #[error("square {index}: {message}")]
    Malformed { index: usize, message: String },

    #[error("square {index}: unknown ability `{name}`")]
    UnknownAbility { index: usize, name: String },
}

/// Fields of a stat-bearing descriptor, minus the `type` tag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CombatantFields {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_move_range")]
    move_range: u8,
    #[serde(default)]
    abilities: Vec<String>,
    stats: StatBlockFields,
}

fn default_move_range() -> u8 {
    DEFAULT_MOVE_RANGE
}

/// Parse a full board.
pub fn load_board(json: &str, catalog: &AbilityCatalog) -> Result<Board, IngestError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(IngestError::NotArray);
    };
    if entries.len() != BOARD_SIZE {
        return Err(IngestError::WrongLength(entries.len()));
    }

    let mut squares: [Piece; BOARD_SIZE] = std::array::from_fn(|_| Piece::empty());
    for (index, entry) in entries.iter().enumerate() {
        squares[index] = parse_square(index, entry, catalog)?;
    }

    let board = Board::new(squares);
    debug!(
        players = board.player_squares().len(),
        enemies = board.enemy_squares().len(),
        blockers = board.move_blockers().popcount(),
        "board ingested"
    );
    Ok(board)
}

/// Parse one square descriptor. `index` is only used in error messages.
pub fn parse_square(
    index: usize,
    entry: &Value,
    catalog: &AbilityCatalog,
) -> Result<Piece, IngestError> {
    let map = match entry {
        Value::Bool(false) | Value::Null => return Ok(Piece::empty()),
        Value::Object(map) => map,
        other => {
            return Err(IngestError::BadEntry {
                index,
                found: json_kind(other),
            });
        }
    };

    let tag = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(IngestError::MissingType { index })?;

    match tag {
        "Terrain" => Ok(Piece::terrain()),
        "PlayerArea" => Ok(Piece::player_area()),
        "Enemy" => parse_combatant(index, map, Actor::Ai, catalog),
        "PlayerPiece" => parse_combatant(index, map, Actor::Player, catalog),
        other => Err(IngestError::UnknownCategory {
            index,
            tag: other.to_string(),
        }),
    }
}

fn parse_combatant(
    index: usize,
    map: &Map<String, Value>,
    side: Actor,
    catalog: &AbilityCatalog,
) -> Result<Piece, IngestError> {
    let mut fields = map.clone();
    fields.remove("type");
    let fields: CombatantFields =
        serde_json::from_value(Value::Object(fields)).map_err(|e| IngestError::Malformed {
            index,
            message: e.to_string(),
        })?;

    let abilities = fields
        .abilities
        .iter()
        .map(|name| {
            catalog.lookup(name).ok_or_else(|| IngestError::UnknownAbility {
                index,
                name: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let name = fields.name.unwrap_or_else(|| match side {
        Actor::Player => "PlayerPiece".to_string(),
        Actor::Ai => "Enemy".to_string(),
    });
    Ok(Piece::combatant(
        &name,
        side,
        fields.move_range,
        abilities,
        StatBlock::from(fields.stats),
    ))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::piece::PieceKind;

    fn board_json(overrides: &[(usize, Value)]) -> String {
        let mut squares = vec![json!(false); BOARD_SIZE];
        for (i, v) in overrides {
            squares[*i] = v.clone();
        }
        Value::Array(squares).to_string()
    }

    fn goblin() -> Value {
        json!({
            "type": "Enemy",
            "name": "Goblin",
            "moveRange": 2,
            "abilities": ["weapon_hit"],
            "stats": {"health": {"base": 20, "flatBonus": 0, "percentBonus": 0}}
        })
    }

    #[test]
    fn test_load_board() {
        let catalog = AbilityCatalog::standard();
        let json = board_json(&[
            (
                0,
                json!({"type": "PlayerPiece", "stats": {"health": {"base": 30, "flatBonus": 0, "percentBonus": 0}}}),
            ),
            (9, json!({"type": "Terrain"})),
            (56, json!({"type": "PlayerArea"})),
            (63, goblin()),
            (5, Value::Null),
        ]);
        let board = load_board(&json, &catalog).unwrap();

        assert_eq!(board.player_squares(), &[0]);
        assert_eq!(board.enemy_squares(), &[63]);
        assert_eq!(board.piece(9).kind, PieceKind::Terrain);
        assert_eq!(board.piece(56).kind, PieceKind::PlayerArea);
        assert_eq!(board.piece(5).kind, PieceKind::Empty);

        let goblin = board.piece(63);
        assert_eq!(&*goblin.name, "Goblin");
        assert_eq!(goblin.move_range, 2);
        assert_eq!(goblin.stats.health.total(), 20.0);
        assert_eq!(&*goblin.abilities, &[catalog.lookup("weapon_hit").unwrap()]);

        let hero = board.piece(0);
        assert_eq!(&*hero.name, "PlayerPiece");
        assert_eq!(hero.move_range, DEFAULT_MOVE_RANGE);
        assert!(hero.abilities.is_empty());
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let catalog = AbilityCatalog::standard();
        assert!(matches!(load_board("{}", &catalog), Err(IngestError::NotArray)));
        assert!(matches!(load_board("[false, false]", &catalog), Err(IngestError::WrongLength(2))));
        assert!(matches!(load_board("[false", &catalog), Err(IngestError::Json(_))));

        let json = board_json(&[(4, json!(true))]);
        assert!(matches!(
            load_board(&json, &catalog),
            Err(IngestError::BadEntry { index: 4, found: "a boolean" })
        ));
    }

    #[test]
    fn test_rejects_bad_tags() {
        let catalog = AbilityCatalog::standard();
        let json = board_json(&[(7, json!({"name": "x"}))]);
        assert!(matches!(load_board(&json, &catalog), Err(IngestError::MissingType { index: 7 })));

        let json = board_json(&[(8, json!({"type": "Dragon"}))]);
        match load_board(&json, &catalog) {
            Err(IngestError::UnknownCategory { index, tag }) => {
                assert_eq!(index, 8);
                assert_eq!(tag, "Dragon");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_missing_or_malformed_stats() {
        let catalog = AbilityCatalog::standard();
        let json = board_json(&[(3, json!({"type": "Enemy"}))]);
        let err = load_board(&json, &catalog).unwrap_err();
        assert!(matches!(err, IngestError::Malformed { index: 3, .. }));
        assert!(err.to_string().contains("stats"), "{err}");

        let mut enemy = goblin();
        enemy["stats"]["health"]["base"] = json!("lots");
        let json = board_json(&[(3, enemy)]);
        assert!(matches!(load_board(&json, &catalog), Err(IngestError::Malformed { index: 3, .. })));

        let mut enemy = goblin();
        enemy["mana"] = json!(4);
        let json = board_json(&[(3, enemy)]);
        assert!(matches!(load_board(&json, &catalog), Err(IngestError::Malformed { index: 3, .. })));
    }

    #[test]
    fn test_rejects_stat_without_bonuses() {
        let catalog = AbilityCatalog::standard();
        let json = board_json(&[(5, json!({"type": "Enemy", "stats": {"health": {"base": 20}}}))]);
        let err = load_board(&json, &catalog).unwrap_err();
        assert!(matches!(err, IngestError::Malformed { index: 5, .. }));
        assert!(err.to_string().contains("flatBonus"), "{err}");

        let mut enemy = goblin();
        enemy["stats"]["armor"] = json!({"base": 2, "flatBonus": 1});
        let json = board_json(&[(6, enemy)]);
        assert!(matches!(load_board(&json, &catalog), Err(IngestError::Malformed { index: 6, .. })));
    }

    #[test]
    fn test_rejects_unknown_ability() {
        let catalog = AbilityCatalog::standard();
        let mut enemy = goblin();
        enemy["abilities"] = json!(["fireball"]);
        let json = board_json(&[(10, enemy)]);
        match load_board(&json, &catalog) {
            Err(IngestError::UnknownAbility { index, name }) => {
                assert_eq!(index, 10);
                assert_eq!(name, "fireball");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
