//! Items, durability, and the per-hero inventory.
//! This module exists to own wear and equip bookkeeping.
//! It does not apply item effects to characters; combat and the session do that.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::ActionError;
use crate::types::{Element, ItemId, StatKind};

const MAX_DURABILITY: f64 = 100.0;
const BROKEN_FLOOR: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Durability(f64);

impl Durability {
    pub const FULL: Durability = Durability(MAX_DURABILITY);

    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, MAX_DURABILITY))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        self.0 / MAX_DURABILITY
    }

    pub fn is_broken(self) -> bool {
        self.0 <= 0.0
    }

    /// Durability never rises.
    pub fn wear(&mut self, step: f64) {
        self.0 = (self.0 - step.max(0.0)).max(0.0);
    }

    /// Scales a base stat between 25% (broken) and 100% (pristine).
    pub fn scale(self, base: f64) -> f64 {
        base * (BROKEN_FLOOR + (1.0 - BROKEN_FLOOR) * self.fraction())
    }
}

impl Default for Durability {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub base_damage: f64,
    pub hands: u8,
    #[serde(default)]
    pub durability: Durability,
}

impl Weapon {
    pub fn effective_damage(&self) -> f64 {
        self.durability.scale(self.base_damage)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub base_reduction: f64,
    #[serde(default)]
    pub durability: Durability,
}

impl Armor {
    pub fn effective_reduction(&self) -> f64 {
        self.durability.scale(self.base_reduction)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Potion {
    pub amount: f64,
    pub affects: Vec<StatKind>,
}

impl Potion {
    pub fn all(amount: f64) -> Self {
        Self { amount, affects: StatKind::ALL.to_vec() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub damage: f64,
    pub mana_cost: f64,
    pub element: Element,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon(Weapon),
    Armor(Armor),
    Potion(Potion),
    Spell(Spell),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: f64,
    pub min_level: u32,
    pub kind: ItemKind,
}

impl Item {
    pub fn slot(&self) -> Option<EquipSlot> {
        match self.kind {
            ItemKind::Weapon(_) => Some(EquipSlot::Weapon),
            ItemKind::Armor(_) => Some(EquipSlot::Armor),
            ItemKind::Potion(_) | ItemKind::Spell(_) => None,
        }
    }

    pub fn durability(&self) -> Option<Durability> {
        match &self.kind {
            ItemKind::Weapon(weapon) => Some(weapon.durability),
            ItemKind::Armor(armor) => Some(armor.durability),
            ItemKind::Potion(_) | ItemKind::Spell(_) => None,
        }
    }

    fn durability_mut(&mut self) -> Option<&mut Durability> {
        match &mut self.kind {
            ItemKind::Weapon(weapon) => Some(&mut weapon.durability),
            ItemKind::Armor(armor) => Some(&mut armor.durability),
            ItemKind::Potion(_) | ItemKind::Spell(_) => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.durability().is_some_and(Durability::is_broken)
    }

    /// Wearables lose resale value with their durability.
    pub fn resale_value(&self, factor: f64) -> f64 {
        let condition = self.durability().map_or(1.0, Durability::fraction);
        self.price * condition * factor
    }

    pub fn as_spell(&self) -> Option<&Spell> {
        match &self.kind {
            ItemKind::Spell(spell) => Some(spell),
            _ => None,
        }
    }

    pub fn as_potion(&self) -> Option<&Potion> {
        match &self.kind {
            ItemKind::Potion(potion) => Some(potion),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Inventory {
    items: SlotMap<ItemId, Item>,
    weapon: Option<ItemId>,
    armor: Option<ItemId>,
}

impl Inventory {
    pub fn add(&mut self, item: Item) -> ItemId {
        self.items.insert(item)
    }

    /// Removing an equipped item clears its slot.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        if self.weapon == Some(id) {
            self.weapon = None;
        }
        if self.armor == Some(id) {
            self.armor = None;
        }
        self.items.remove(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter()
    }

    pub fn spells(&self) -> impl Iterator<Item = (ItemId, &Spell)> {
        self.items.iter().filter_map(|(id, item)| item.as_spell().map(|spell| (id, spell)))
    }

    pub fn potions(&self) -> impl Iterator<Item = (ItemId, &Potion)> {
        self.items.iter().filter_map(|(id, item)| item.as_potion().map(|potion| (id, potion)))
    }

    /// Unbroken weapons and armor that are not currently equipped.
    pub fn equippable(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter().filter(move |(id, item)| {
            item.slot().is_some() && !item.is_broken() && !self.is_equipped(*id)
        })
    }

    pub fn equipped_id(&self, slot: EquipSlot) -> Option<ItemId> {
        match slot {
            EquipSlot::Weapon => self.weapon,
            EquipSlot::Armor => self.armor,
        }
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&Item> {
        self.equipped_id(slot).and_then(|id| self.items.get(id))
    }

    pub fn is_equipped(&self, id: ItemId) -> bool {
        self.weapon == Some(id) || self.armor == Some(id)
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<ItemId> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        }
    }

    /// Equips `id` in its slot, replacing whatever was there.
    pub fn equip(&mut self, id: ItemId) -> Result<EquipSlot, ActionError> {
        let item = self.items.get(id).ok_or(ActionError::UnknownItem)?;
        let slot = item.slot().ok_or(ActionError::WrongItemKind)?;
        if self.equipped_id(slot) == Some(id) {
            return Err(ActionError::AlreadyEquipped);
        }
        if item.is_broken() {
            return Err(ActionError::Broken);
        }
        *self.slot_mut(slot) = Some(id);
        Ok(slot)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Result<ItemId, ActionError> {
        self.slot_mut(slot).take().ok_or(ActionError::NothingEquipped)
    }

    pub fn weapon_damage(&self) -> f64 {
        match self.equipped(EquipSlot::Weapon).map(|item| &item.kind) {
            Some(ItemKind::Weapon(weapon)) => weapon.effective_damage(),
            _ => 0.0,
        }
    }

    pub fn armor_reduction(&self) -> f64 {
        match self.equipped(EquipSlot::Armor).map(|item| &item.kind) {
            Some(ItemKind::Armor(armor)) => armor.effective_reduction(),
            _ => 0.0,
        }
    }

    /// Wears down whatever sits in `slot`. Returns false when the slot is empty.
    pub fn wear(&mut self, slot: EquipSlot, step: f64) -> bool {
        let Some(id) = self.equipped_id(slot) else {
            return false;
        };
        match self.items.get_mut(id).and_then(Item::durability_mut) {
            Some(durability) => {
                durability.wear(step);
                true
            }
            None => false,
        }
    }

    /// Unequips broken items and returns their names. They stay in the inventory.
    pub fn unequip_broken(&mut self) -> Vec<String> {
        let mut broken = Vec::new();
        for slot in [EquipSlot::Weapon, EquipSlot::Armor] {
            let Some(id) = self.equipped_id(slot) else {
                continue;
            };
            if let Some(item) = self.items.get(id)
                && item.is_broken()
            {
                broken.push(item.name.clone());
                *self.slot_mut(slot) = None;
            }
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sword(base_damage: f64) -> Item {
        Item {
            name: "Sword".to_string(),
            price: 500.0,
            min_level: 1,
            kind: ItemKind::Weapon(Weapon {
                base_damage,
                hands: 1,
                durability: Durability::FULL,
            }),
        }
    }

    fn mail(base_reduction: f64) -> Item {
        Item {
            name: "Mail".to_string(),
            price: 400.0,
            min_level: 1,
            kind: ItemKind::Armor(Armor { base_reduction, durability: Durability::FULL }),
        }
    }

    #[test]
    fn effective_power_scales_with_durability() {
        let mut durability = Durability::FULL;
        assert_eq!(durability.scale(800.0), 800.0);
        durability.wear(50.0);
        assert_eq!(durability.scale(800.0), 500.0);
        durability.wear(500.0);
        assert!(durability.is_broken());
        assert_eq!(durability.value(), 0.0);
        assert_eq!(durability.scale(800.0), 200.0);
    }

    #[test]
    fn negative_wear_never_repairs() {
        let mut durability = Durability::new(40.0);
        durability.wear(-10.0);
        assert_eq!(durability.value(), 40.0);
    }

    #[test]
    fn equipping_the_equipped_item_changes_nothing() {
        let mut inventory = Inventory::default();
        let id = inventory.add(sword(700.0));
        assert_eq!(inventory.equip(id), Ok(EquipSlot::Weapon));
        let before = inventory.equipped_id(EquipSlot::Weapon);
        assert_eq!(inventory.equip(id), Err(ActionError::AlreadyEquipped));
        assert_eq!(inventory.equipped_id(EquipSlot::Weapon), before);
    }

    #[test]
    fn potions_cannot_be_equipped() {
        let mut inventory = Inventory::default();
        let id = inventory.add(Item {
            name: "Tonic".to_string(),
            price: 100.0,
            min_level: 1,
            kind: ItemKind::Potion(Potion::all(50.0)),
        });
        assert_eq!(inventory.equip(id), Err(ActionError::WrongItemKind));
        assert_eq!(inventory.potions().count(), 1);
        assert_eq!(inventory.potions().next().map(|(_, p)| p.affects.len()), Some(5));
    }

    #[test]
    fn broken_gear_is_unequipped_but_kept() {
        let mut inventory = Inventory::default();
        let weapon = inventory.add(sword(700.0));
        let armor = inventory.add(mail(200.0));
        inventory.equip(weapon).unwrap();
        inventory.equip(armor).unwrap();

        for _ in 0..40 {
            inventory.wear(EquipSlot::Armor, 2.5);
        }
        assert!(inventory.wear(EquipSlot::Weapon, 1.5));
        assert_eq!(inventory.unequip_broken(), vec!["Mail".to_string()]);
        assert_eq!(inventory.equipped_id(EquipSlot::Armor), None);
        assert_eq!(inventory.equipped_id(EquipSlot::Weapon), Some(weapon));
        assert!(inventory.get(armor).is_some());
        assert_eq!(inventory.equip(armor), Err(ActionError::Broken));
        assert_eq!(inventory.armor_reduction(), 0.0);
        assert!(!inventory.wear(EquipSlot::Armor, 2.5));
    }

    #[test]
    fn removing_equipped_item_clears_slot() {
        let mut inventory = Inventory::default();
        let weapon = inventory.add(sword(700.0));
        inventory.equip(weapon).unwrap();
        assert!(inventory.remove(weapon).is_some());
        assert_eq!(inventory.weapon_damage(), 0.0);
        assert_eq!(inventory.unequip(EquipSlot::Weapon), Err(ActionError::NothingEquipped));
    }

    #[test]
    fn resale_value_tracks_condition() {
        let mut item = sword(700.0);
        assert_eq!(item.resale_value(0.5), 250.0);
        if let ItemKind::Weapon(weapon) = &mut item.kind {
            weapon.durability = Durability::new(50.0);
        }
        assert_eq!(item.resale_value(0.5), 125.0);
    }

    proptest! {
        #[test]
        fn durability_is_non_increasing_and_floored(
            start in 0.0_f64..=100.0,
            steps in proptest::collection::vec(-5.0_f64..10.0, 0..64)
        ) {
            let mut durability = Durability::new(start);
            let base = 120.0;
            for step in steps {
                let before = durability.value();
                durability.wear(step);
                prop_assert!(durability.value() <= before);
                prop_assert!(durability.value() >= 0.0);
                prop_assert!(durability.scale(base) >= base * 0.25 - 1e-9);
            }
        }
    }
}
