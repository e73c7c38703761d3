//! The seam between the battle engine and whoever picks the party's moves.
//! Every prompt offers an option list and expects an index back; `None` means
//! backing out of the menu, which never consumes the turn.

use serde::{Deserialize, Serialize};

use crate::character::{Character, Roster};
use crate::equipment::{EquipSlot, ItemKind};
use crate::types::{CharacterId, ItemId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleAction {
    Attack,
    CastSpell,
    UsePotion,
    ChangeEquipment,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipChoice {
    Equip(ItemId),
    Unequip(EquipSlot),
}

/// Read-only snapshot of a battle handed to the commander.
pub struct BattleView<'a> {
    pub roster: &'a Roster,
    pub party: &'a [CharacterId],
    pub monsters: &'a [CharacterId],
    pub round: u32,
}

impl<'a> BattleView<'a> {
    pub fn character(&self, id: CharacterId) -> Option<&'a Character> {
        self.roster.get(id)
    }

    pub fn living_monsters(&self) -> Vec<CharacterId> {
        living(self.roster, self.monsters)
    }

    pub fn living_heroes(&self) -> Vec<CharacterId> {
        living(self.roster, self.party)
    }
}

pub(crate) fn living(roster: &Roster, ids: &[CharacterId]) -> Vec<CharacterId> {
    ids.iter()
        .copied()
        .filter(|&id| roster.get(id).is_some_and(|character| !character.is_defeated()))
        .collect()
}

pub(crate) fn spell_options(roster: &Roster, hero: CharacterId) -> Vec<ItemId> {
    roster
        .get(hero)
        .and_then(Character::hero)
        .map(|state| state.inventory.spells().map(|(id, _)| id).collect())
        .unwrap_or_default()
}

pub(crate) fn potion_options(roster: &Roster, hero: CharacterId) -> Vec<ItemId> {
    roster
        .get(hero)
        .and_then(Character::hero)
        .map(|state| state.inventory.potions().map(|(id, _)| id).collect())
        .unwrap_or_default()
}

/// Every weapon and armor piece, then an unequip entry per occupied slot.
pub(crate) fn equip_options(roster: &Roster, hero: CharacterId) -> Vec<EquipChoice> {
    let Some(state) = roster.get(hero).and_then(Character::hero) else {
        return Vec::new();
    };
    let mut options: Vec<EquipChoice> = state
        .inventory
        .iter()
        .filter(|(_, item)| matches!(item.kind, ItemKind::Weapon(_) | ItemKind::Armor(_)))
        .map(|(id, _)| EquipChoice::Equip(id))
        .collect();
    for slot in [EquipSlot::Weapon, EquipSlot::Armor] {
        if state.inventory.equipped_id(slot).is_some() {
            options.push(EquipChoice::Unequip(slot));
        }
    }
    options
}

/// Supplies the party's decisions. Implementations must not assume any
/// particular number of prompts per turn.
pub trait PartyCommander {
    fn choose_action(&mut self, view: &BattleView<'_>, hero: CharacterId) -> BattleAction;

    fn choose_target(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        targets: &[CharacterId],
    ) -> Option<usize>;

    fn choose_spell(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        spells: &[ItemId],
    ) -> Option<usize>;

    fn choose_potion(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        potions: &[ItemId],
    ) -> Option<usize>;

    fn choose_equip(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        options: &[EquipChoice],
    ) -> Option<usize>;
}
