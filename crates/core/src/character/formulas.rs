//! Per-archetype stat formulas, looked up by archetype instead of overridden per type.

use crate::types::{Archetype, StatKind};

pub const EXPERIENCE_PER_LEVEL: u32 = 10;
pub const MONSTER_HP_PER_LEVEL: f64 = 100.0;
pub const MANA_GROWTH: f64 = 1.10;
pub const STANDARD_GROWTH: f64 = 1.05;
pub const FAVORED_GROWTH: f64 = 1.10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    pub hp_base: f64,
    pub hp_per_level: f64,
    pub mana_base: f64,
    pub mana_per_level: f64,
    pub favored: [StatKind; 2],
}

const PROFILES: [ArchetypeProfile; 3] = [
    ArchetypeProfile {
        archetype: Archetype::Warrior,
        hp_base: 100.0,
        hp_per_level: 50.0,
        mana_base: 500.0,
        mana_per_level: 100.0,
        favored: [StatKind::Strength, StatKind::Agility],
    },
    ArchetypeProfile {
        archetype: Archetype::Sorcerer,
        hp_base: 80.0,
        hp_per_level: 40.0,
        mana_base: 1000.0,
        mana_per_level: 300.0,
        favored: [StatKind::Agility, StatKind::Dexterity],
    },
    ArchetypeProfile {
        archetype: Archetype::Paladin,
        hp_base: 90.0,
        hp_per_level: 45.0,
        mana_base: 700.0,
        mana_per_level: 150.0,
        favored: [StatKind::Strength, StatKind::Dexterity],
    },
];

pub fn profile(archetype: Archetype) -> &'static ArchetypeProfile {
    match archetype {
        Archetype::Warrior => &PROFILES[0],
        Archetype::Sorcerer => &PROFILES[1],
        Archetype::Paladin => &PROFILES[2],
    }
}

pub fn hero_max_hp(archetype: Archetype, level: u32) -> f64 {
    let profile = profile(archetype);
    profile.hp_base + profile.hp_per_level * f64::from(level)
}

pub fn hero_max_mana(archetype: Archetype, level: u32) -> f64 {
    let profile = profile(archetype);
    profile.mana_base + profile.mana_per_level * f64::from(level)
}

pub fn monster_max_hp(level: u32) -> f64 {
    MONSTER_HP_PER_LEVEL * f64::from(level)
}

pub fn growth_factor(archetype: Archetype, stat: StatKind) -> f64 {
    if profile(archetype).favored.contains(&stat) { FAVORED_GROWTH } else { STANDARD_GROWTH }
}

pub fn experience_threshold(level: u32) -> u32 {
    level.saturating_mul(EXPERIENCE_PER_LEVEL)
}
