//! Abilities and the shared ability catalog.
//!
//! Abilities are static data. Pieces refer to them by [`AbilityId`], an
//! index into an immutable [`AbilityCatalog`] that every cloned state shares,
//! so executing an action against a clone can never touch another state's
//! ability definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::StatBlock;

/// Index of an ability in its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u16);

/// One effect contributor. An ability composes any number of these.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "component", content = "value")]
pub enum EffectComponent {
    /// Damage dealt on a hit, before armor.
    PhysicalDamage(f64),
    /// Probability in `[0, 1]` that the ability hits.
    HitChance(f64),
    /// The ability always hits.
    HitGuaranteed,
}

/// A targeted ability definition.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Ability {
    pub name: String,
    pub range: u8,
    #[serde(default)]
    pub targets_self: bool,
    #[serde(default)]
    pub targets_friendly: bool,
    #[serde(default)]
    pub targets_enemy: bool,
    #[serde(default)]
    pub components: Vec<EffectComponent>,
}

/// What happened when an ability resolved against one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectOutcome {
    /// The ability has no damage component.
    NoEffect,
    Missed,
    Hit { damage: f64 },
}

impl Ability {
    /// True if no targeting flag is set, meaning any square in range is valid.
    pub fn targets_anything(&self) -> bool {
        !(self.targets_self || self.targets_friendly || self.targets_enemy)
    }

    fn damage(&self) -> Option<f64> {
        self.components.iter().fold(None, |acc, c| match c {
            EffectComponent::PhysicalDamage(amount) => Some(acc.unwrap_or(0.0) + amount),
            _ => acc,
        })
    }

    /// Combined hit probability, or `None` when the ability cannot miss.
    fn hit_chance(&self) -> Option<f64> {
        if self.components.contains(&EffectComponent::HitGuaranteed) {
            return None;
        }
        self.components.iter().find_map(|c| match c {
            EffectComponent::HitChance(p) => Some(*p),
            _ => None,
        })
    }

    /// Resolve the ability's components against `target`'s stats.
    ///
    /// A miss is rolled against `hit chance - dodge%`. A hit lowers health
    /// by the damage after armor, never below zero.
    pub fn apply(&self, target: &mut StatBlock, rng: &mut fastrand::Rng) -> EffectOutcome {
        let Some(damage) = self.damage() else {
            return EffectOutcome::NoEffect;
        };

        if let Some(chance) = self.hit_chance() {
            let effective = chance - target.dodge.total() / 100.0;
            if rng.f64() >= effective {
                return EffectOutcome::Missed;
            }
        }

        let dealt = (damage - target.armor.total()).max(0.0);
        target.health.add_flat_bonus(-dealt);
        EffectOutcome::Hit { damage: dealt }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid ability catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate ability name: {0}")]
    DuplicateName(String),

    #[error("ability catalog is full ({0} entries)")]
    TooLarge(usize),
}

/// Immutable list of abilities, shared by `Arc` across states and shards.
#[derive(Clone, Debug, Default)]
pub struct AbilityCatalog {
    abilities: Vec<Ability>,
    by_name: HashMap<String, AbilityId>,
}

impl AbilityCatalog {
    pub fn new(abilities: Vec<Ability>) -> Result<Self, CatalogError> {
        if abilities.len() > u16::MAX as usize {
            return Err(CatalogError::TooLarge(abilities.len()));
        }
        let mut by_name = HashMap::with_capacity(abilities.len());
        for (i, ability) in abilities.iter().enumerate() {
            if by_name.insert(ability.name.clone(), AbilityId(i as u16)).is_some() {
                return Err(CatalogError::DuplicateName(ability.name.clone()));
            }
        }
        Ok(Self { abilities, by_name })
    }

    /// Parse a JSON array of abilities.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let abilities: Vec<Ability> = serde_json::from_str(json)?;
        Self::new(abilities)
    }

    /// The built-in abilities.
    pub fn standard() -> Self {
        let abilities = vec![
            Ability {
                name: "weapon_hit".to_string(),
                range: 1,
                targets_self: false,
                targets_friendly: false,
                targets_enemy: true,
                components: vec![
                    EffectComponent::PhysicalDamage(10.0),
                    EffectComponent::HitChance(0.5),
                    EffectComponent::HitGuaranteed,
                ],
            },
            Ability {
                name: "bow_shot".to_string(),
                range: 5,
                targets_self: false,
                targets_friendly: false,
                targets_enemy: true,
                components: vec![
                    EffectComponent::PhysicalDamage(6.0),
                    EffectComponent::HitChance(0.75),
                ],
            },
        ];
        // Built-in names are distinct.
        let by_name = abilities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), AbilityId(i as u16)))
            .collect();
        Self { abilities, by_name }
    }

    #[inline]
    pub fn get(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(id.0 as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<AbilityId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_lookup() {
        let catalog = AbilityCatalog::standard();
        let id = catalog.lookup("weapon_hit").unwrap();
        assert_eq!(catalog.get(id).unwrap().range, 1);
        assert!(catalog.lookup("fireball").is_none());
    }

    #[test]
    fn test_guaranteed_hit_ignores_hit_chance() {
        let catalog = AbilityCatalog::standard();
        let hit = catalog.get(catalog.lookup("weapon_hit").unwrap()).unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut target = StatBlock::with_health(25.0);
        for _ in 0..3 {
            assert_eq!(hit.apply(&mut target, &mut rng), EffectOutcome::Hit { damage: 10.0 });
        }
        assert_eq!(target.health.total(), 0.0);
    }

    #[test]
    fn test_armor_reduces_damage() {
        let ability = Ability {
            name: "jab".to_string(),
            range: 1,
            targets_self: false,
            targets_friendly: false,
            targets_enemy: true,
            components: vec![EffectComponent::PhysicalDamage(4.0)],
        };
        let mut target = StatBlock::with_health(10.0);
        target.armor.add_flat_bonus(3.0);
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(ability.apply(&mut target, &mut rng), EffectOutcome::Hit { damage: 1.0 });
        assert_eq!(target.health.total(), 9.0);

        target.armor.add_flat_bonus(10.0);
        assert_eq!(ability.apply(&mut target, &mut rng), EffectOutcome::Hit { damage: 0.0 });
    }

    #[test]
    fn test_zero_hit_chance_always_misses() {
        let ability = Ability {
            name: "wild_swing".to_string(),
            range: 1,
            targets_self: false,
            targets_friendly: false,
            targets_enemy: true,
            components: vec![
                EffectComponent::PhysicalDamage(50.0),
                EffectComponent::HitChance(0.0),
            ],
        };
        let mut target = StatBlock::with_health(10.0);
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            assert_eq!(ability.apply(&mut target, &mut rng), EffectOutcome::Missed);
        }
        assert_eq!(target.health.total(), 10.0);
    }

    #[test]
    fn test_ability_without_damage_is_noop() {
        let ability = Ability {
            name: "taunt".to_string(),
            range: 3,
            targets_self: false,
            targets_friendly: false,
            targets_enemy: false,
            components: vec![EffectComponent::HitChance(0.9)],
        };
        assert!(ability.targets_anything());
        let mut target = StatBlock::with_health(10.0);
        let mut rng = fastrand::Rng::with_seed(3);
        assert_eq!(ability.apply(&mut target, &mut rng), EffectOutcome::NoEffect);
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = AbilityCatalog::from_json(
            r#"[
                {"name": "heal", "range": 2, "targetsFriendly": true, "targetsSelf": true},
                {"name": "stab", "range": 1, "targetsEnemy": true,
                 "components": [{"component": "PhysicalDamage", "value": 3},
                                {"component": "HitGuaranteed"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let stab = catalog.get(catalog.lookup("stab").unwrap()).unwrap();
        assert_eq!(stab.components.len(), 2);
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_unknown_components() {
        let dup = AbilityCatalog::from_json(r#"[{"name": "a", "range": 1}, {"name": "a", "range": 2}]"#);
        assert!(matches!(dup, Err(CatalogError::DuplicateName(name)) if name == "a"));

        let unknown = AbilityCatalog::from_json(
            r#"[{"name": "a", "range": 1, "components": [{"component": "Teleport"}]}]"#,
        );
        assert!(matches!(unknown, Err(CatalogError::Json(_))));
    }
}
