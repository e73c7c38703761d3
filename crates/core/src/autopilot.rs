//! A fixed battle policy for headless runs and tests.
//! This module exists so simulations can play whole sessions without a person.
//! It does not shop or move; callers drive the session.

use crate::combat::{BattleAction, BattleView, EquipChoice, PartyCommander};
use crate::equipment::{EquipSlot, Inventory, Item, ItemKind};
use crate::types::{CharacterId, ItemId, StatKind};

pub const DEFAULT_HEAL_THRESHOLD: f64 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    Drink(ItemId),
    Equip(ItemId),
    Cast(ItemId),
    Attack,
}

/// Drinks a healing potion when badly hurt (once per turn), fills empty
/// equipment slots, casts the strongest spell it can afford, and otherwise
/// hits the weakest monster.
#[derive(Clone, Debug)]
pub struct AutoPilot {
    heal_threshold: f64,
    drank: Option<(u32, CharacterId)>,
    plan: Option<Plan>,
}

impl Default for AutoPilot {
    fn default() -> Self {
        Self::with_heal_threshold(DEFAULT_HEAL_THRESHOLD)
    }
}

impl AutoPilot {
    pub fn with_heal_threshold(fraction: f64) -> Self {
        Self { heal_threshold: fraction.clamp(0.0, 1.0), drank: None, plan: None }
    }

    fn plan_for(&self, view: &BattleView<'_>, hero: CharacterId) -> Plan {
        let Some(character) = view.character(hero) else {
            return Plan::Attack;
        };
        let Some(state) = character.hero() else {
            return Plan::Attack;
        };

        let wounded = character.hp() < character.max_hp() * self.heal_threshold;
        if wounded && self.drank != Some((view.round, hero)) {
            let healing = state
                .inventory
                .potions()
                .find(|(_, potion)| potion.affects.contains(&StatKind::Health));
            if let Some((id, _)) = healing {
                return Plan::Drink(id);
            }
        }

        for slot in [EquipSlot::Weapon, EquipSlot::Armor] {
            if state.inventory.equipped_id(slot).is_none()
                && let Some(id) = best_for_slot(&state.inventory, slot)
            {
                return Plan::Equip(id);
            }
        }

        let mana = state.mana();
        state
            .inventory
            .spells()
            .filter(|(_, spell)| spell.mana_cost <= mana)
            .max_by(|a, b| a.1.damage.total_cmp(&b.1.damage))
            .map_or(Plan::Attack, |(id, _)| Plan::Cast(id))
    }

    fn planned_index(&mut self, options: &[ItemId]) -> Option<usize> {
        let wanted = match self.plan.take()? {
            Plan::Drink(id) | Plan::Equip(id) | Plan::Cast(id) => id,
            Plan::Attack => return None,
        };
        options.iter().position(|&option| option == wanted)
    }
}

fn power(item: &Item) -> f64 {
    match &item.kind {
        ItemKind::Weapon(weapon) => weapon.effective_damage(),
        ItemKind::Armor(armor) => armor.effective_reduction(),
        ItemKind::Potion(_) | ItemKind::Spell(_) => 0.0,
    }
}

fn best_for_slot(inventory: &Inventory, slot: EquipSlot) -> Option<ItemId> {
    inventory
        .equippable()
        .filter(|(_, item)| item.slot() == Some(slot))
        .max_by(|a, b| power(a.1).total_cmp(&power(b.1)))
        .map(|(id, _)| id)
}

impl PartyCommander for AutoPilot {
    fn choose_action(&mut self, view: &BattleView<'_>, hero: CharacterId) -> BattleAction {
        let plan = self.plan_for(view, hero);
        self.plan = Some(plan);
        match plan {
            Plan::Drink(_) => {
                self.drank = Some((view.round, hero));
                BattleAction::UsePotion
            }
            Plan::Equip(_) => BattleAction::ChangeEquipment,
            Plan::Cast(_) => BattleAction::CastSpell,
            Plan::Attack => BattleAction::Attack,
        }
    }

    /// The living target with the least HP; ties go to the first listed.
    fn choose_target(
        &mut self,
        view: &BattleView<'_>,
        _hero: CharacterId,
        targets: &[CharacterId],
    ) -> Option<usize> {
        let hp = |id: CharacterId| view.character(id).map_or(f64::INFINITY, |target| target.hp());
        targets
            .iter()
            .enumerate()
            .min_by(|a, b| hp(*a.1).total_cmp(&hp(*b.1)))
            .map(|(index, _)| index)
    }

    fn choose_spell(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        spells: &[ItemId],
    ) -> Option<usize> {
        self.planned_index(spells)
    }

    fn choose_potion(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        potions: &[ItemId],
    ) -> Option<usize> {
        self.planned_index(potions)
    }

    fn choose_equip(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        options: &[EquipChoice],
    ) -> Option<usize> {
        let Some(Plan::Equip(wanted)) = self.plan.take() else {
            return None;
        };
        options.iter().position(|&option| option == EquipChoice::Equip(wanted))
    }
}
