//! Battle rewards and market transactions.
//! This module exists to keep gold and experience bookkeeping in one place.
//! It does not decide where a purchase is allowed; the session checks the terrain.

use crate::character::{Character, Roster};
use crate::equipment::Item;
use crate::error::ActionError;
use crate::rules::Rules;
use crate::types::{CharacterId, ItemId, LogEvent};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardPool {
    pub gold: f64,
    pub experience: u32,
}

impl RewardPool {
    pub fn from_monster_levels(levels: impl IntoIterator<Item = u32>, rules: &Rules) -> Self {
        let total: u32 = levels.into_iter().sum();
        Self {
            gold: f64::from(total) * rules.gold_per_monster_level,
            experience: total.saturating_mul(rules.experience_per_monster_level),
        }
    }
}

/// Every hero that did not faint in the battle gets the full pool.
/// Returns the heroes that were paid.
pub fn distribute(
    roster: &mut Roster,
    party: &[CharacterId],
    pool: RewardPool,
    log: &mut Vec<LogEvent>,
) -> Vec<CharacterId> {
    let mut paid = Vec::new();
    for &id in party {
        let Some(character) = roster.get_mut(id) else {
            continue;
        };
        let Some(hero) = character.hero_mut() else {
            continue;
        };
        if hero.fainted_in_battle {
            continue;
        }
        hero.gold += pool.gold;
        let levels = character.gain_experience(pool.experience);
        log.push(LogEvent::RewardsGranted { hero: id, gold: pool.gold, experience: pool.experience });
        if levels > 0 {
            log.push(LogEvent::LevelUp { hero: id, level: character.level() });
        }
        paid.push(id);
    }
    paid
}

pub fn purchase(hero: &mut Character, item: &Item) -> Result<ItemId, ActionError> {
    let level = hero.level();
    let state = hero.hero_mut().ok_or(ActionError::NotAHero)?;
    if level < item.min_level {
        return Err(ActionError::LevelTooLow { level, required: item.min_level });
    }
    if state.gold < item.price {
        return Err(ActionError::InsufficientGold { needed: item.price, available: state.gold });
    }
    state.gold -= item.price;
    Ok(state.inventory.add(item.clone()))
}

/// Removes the item and credits its resale value.
pub fn sell(hero: &mut Character, item: ItemId, rules: &Rules) -> Result<(Item, f64), ActionError> {
    let state = hero.hero_mut().ok_or(ActionError::NotAHero)?;
    let sold = state.inventory.remove(item).ok_or(ActionError::UnknownItem)?;
    let value = sold.resale_value(rules.resale_factor);
    state.gold += value;
    Ok((sold, value))
}
