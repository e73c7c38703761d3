//! Tunable game constants.
//! Every field has a default so partial JSON overrides stay valid.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Chance that stepping onto open ground starts a battle.
    pub encounter_chance: f64,
    pub generation_attempts: u32,
    pub blocked_ratio: f64,
    pub market_ratio: f64,

    pub attack_scale: f64,
    pub defense_scale: f64,
    pub monster_dodge_cap: f64,
    pub hero_dodge_cap: f64,
    /// Agility at which a hero dodges half of all attacks before the cap.
    pub agility_dodge_pivot: f64,
    pub armor_mitigation: f64,
    pub spell_dexterity_divisor: f64,
    pub debuff_fraction: f64,

    pub regeneration_factor: f64,
    pub weapon_wear: f64,
    pub armor_wear: f64,

    pub gold_per_monster_level: f64,
    pub experience_per_monster_level: u32,
    pub resale_factor: f64,

    /// Free actions a hero may take before the turn is forfeited.
    pub max_actions_per_turn: u32,
    pub max_rounds: u32,

    /// Lane mode: fresh monsters arrive every this many rounds.
    pub lane_spawn_interval: u32,
    /// Lane mode: fraction of the base stat added while standing on a boost cell.
    pub terrain_boost: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            encounter_chance: 0.5,
            generation_attempts: 10,
            blocked_ratio: 0.20,
            market_ratio: 0.30,
            attack_scale: 0.05,
            defense_scale: 0.05,
            monster_dodge_cap: 0.20,
            hero_dodge_cap: 0.70,
            agility_dodge_pivot: 1000.0,
            armor_mitigation: 0.2,
            spell_dexterity_divisor: 10_000.0,
            debuff_fraction: 0.10,
            regeneration_factor: 1.10,
            weapon_wear: 1.5,
            armor_wear: 2.5,
            gold_per_monster_level: 100.0,
            experience_per_monster_level: 2,
            resale_factor: 0.5,
            max_actions_per_turn: 16,
            max_rounds: 500,
            lane_spawn_interval: 8,
            terrain_boost: 0.10,
        }
    }
}

impl Rules {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let rules = Rules::from_json(r#"{ "encounter_chance": 1.0, "max_rounds": 3 }"#).unwrap();
        assert_eq!(rules.encounter_chance, 1.0);
        assert_eq!(rules.max_rounds, 3);
        assert_eq!(rules.generation_attempts, Rules::default().generation_attempts);
        assert_eq!(rules.armor_wear, 2.5);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(Rules::from_json(r#"{ "max_rounds": "many" }"#).is_err());
    }
}
