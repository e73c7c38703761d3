//! Damage and dodge formulas. Pure functions of stats and rules.

use crate::rules::Rules;

/// Heroes can dodge at most `hero_dodge_cap` of incoming attacks, approached as
/// agility grows past the pivot.
pub fn hero_dodge_chance(agility: f64, rules: &Rules) -> f64 {
    if agility <= 0.0 {
        return 0.0;
    }
    (agility / (agility + rules.agility_dodge_pivot)).min(rules.hero_dodge_cap)
}

pub fn monster_dodge_chance(dodge_chance: f64, rules: &Rules) -> f64 {
    dodge_chance.min(rules.monster_dodge_cap).max(0.0)
}

pub fn hero_attack_damage(strength: f64, weapon_damage: f64, defense: f64, rules: &Rules) -> f64 {
    ((strength + weapon_damage) * rules.attack_scale - defense * rules.defense_scale).max(0.0)
}

/// Spells ignore dodge and defense and scale with dexterity.
pub fn spell_damage(base_damage: f64, dexterity: f64, rules: &Rules) -> f64 {
    (base_damage * (1.0 + dexterity / rules.spell_dexterity_divisor)).max(0.0)
}

pub fn monster_attack_damage(base_damage: f64, armor_reduction: f64, rules: &Rules) -> f64 {
    (base_damage - armor_reduction * rules.armor_mitigation).max(0.0)
}
