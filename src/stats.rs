//! Numeric piece attributes with flat and percent modifiers.
//!
//! A [`Stat`] caches its total. Every mutator recomputes it, so a stat read
//! after a bonus change never sees a stale value.

use serde::Deserialize;

/// How a stat's raw value is turned into its total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    /// Kept as computed.
    Flat,
    /// Rounded to the nearest whole number (whole-number percentages).
    Percent,
    /// Clamped at zero. Zero means the piece is dead.
    Health,
}

/// One attribute: `total = base * (1 + percent_bonus) + flat_bonus`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stat {
    pub kind: StatKind,
    base: f64,
    flat_bonus: f64,
    percent_bonus: f64,
    total: f64,
}

impl Stat {
    pub fn new(kind: StatKind, base: f64, flat_bonus: f64, percent_bonus: f64) -> Self {
        let mut stat = Self {
            kind,
            base,
            flat_bonus,
            percent_bonus,
            total: 0.0,
        };
        stat.calculate_total();
        stat
    }

    /// Stat of the given kind with no bonuses.
    pub fn with_base(kind: StatKind, base: f64) -> Self {
        Self::new(kind, base, 0.0, 0.0)
    }

    pub fn calculate_total(&mut self) {
        let raw = self.base * (1.0 + self.percent_bonus) + self.flat_bonus;
        self.total = match self.kind {
            StatKind::Flat => raw,
            StatKind::Percent => raw.round(),
            StatKind::Health => raw.max(0.0),
        };
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn add_flat_bonus(&mut self, amount: f64) {
        self.flat_bonus += amount;
        self.calculate_total();
    }

    pub fn add_percent_bonus(&mut self, amount: f64) {
        self.percent_bonus += amount;
        self.calculate_total();
    }

    /// True for a health stat that has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.kind == StatKind::Health && self.total <= 0.0
    }
}

/// Raw stat fields as delivered by the host.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatFields {
    pub base: f64,
    pub flat_bonus: f64,
    pub percent_bonus: f64,
}

impl StatFields {
    pub fn into_stat(self, kind: StatKind) -> Stat {
        Stat::new(kind, self.base, self.flat_bonus, self.percent_bonus)
    }
}

/// The stats carried by every combatant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatBlock {
    pub health: Stat,
    /// Flat damage reduction.
    pub armor: Stat,
    /// Chance to avoid a hit, in whole percent.
    pub dodge: Stat,
}

impl StatBlock {
    pub fn with_health(health: f64) -> Self {
        Self {
            health: Stat::with_base(StatKind::Health, health),
            armor: Stat::with_base(StatKind::Flat, 0.0),
            dodge: Stat::with_base(StatKind::Percent, 0.0),
        }
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::with_health(0.0)
    }
}

/// Stat block as delivered by the host. Only health is required.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatBlockFields {
    pub health: StatFields,
    #[serde(default)]
    pub armor: StatFields,
    #[serde(default)]
    pub dodge: StatFields,
}

impl From<StatBlockFields> for StatBlock {
    fn from(fields: StatBlockFields) -> Self {
        Self {
            health: fields.health.into_stat(StatKind::Health),
            armor: fields.armor.into_stat(StatKind::Flat),
            dodge: fields.dodge.into_stat(StatKind::Percent),
        }
    }
}
