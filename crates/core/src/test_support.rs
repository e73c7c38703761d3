//! Shared test fixtures for the unit test suites.
//! This module exists to avoid repeating roster and party setup across many tests.
//! It does not own production gameplay logic.

use crate::catalog::{Catalog, HeroTemplate, MonsterTemplate};
use crate::character::{Character, Roster};
use crate::combat::{BattleAction, BattleView, EquipChoice, PartyCommander};
use crate::equipment::Item;
use crate::types::{Archetype, CharacterId, ItemId, MonsterKind};

pub(crate) fn hero_from_builtin(name: &str) -> Character {
    let catalog = Catalog::builtin();
    let template = catalog.hero(name).unwrap_or_else(|| panic!("no builtin hero {name}"));
    Character::new_hero(template)
}

pub(crate) fn insert_hero(roster: &mut Roster, name: &str) -> CharacterId {
    roster.insert(hero_from_builtin(name))
}

/// A warrior with no agility, so monsters never dodge-roll against a nonzero chance.
pub(crate) fn flat_warrior(strength: f64) -> HeroTemplate {
    HeroTemplate {
        name: "Test_Warrior".to_string(),
        archetype: Archetype::Warrior,
        mana: 500.0,
        strength,
        agility: 0.0,
        dexterity: 0.0,
        gold: 0.0,
        experience: 0,
    }
}

pub(crate) fn monster_template(level: u32, damage: f64, defense: f64, dodge: f64) -> MonsterTemplate {
    MonsterTemplate {
        name: "Test_Dragon".to_string(),
        kind: MonsterKind::Dragon,
        level,
        damage,
        defense,
        dodge,
    }
}

pub(crate) fn give_item(roster: &mut Roster, hero: CharacterId, item_name: &str) -> ItemId {
    let catalog = Catalog::builtin();
    let item: Item = catalog
        .item(item_name)
        .cloned()
        .unwrap_or_else(|| panic!("no builtin item {item_name}"));
    roster[hero].hero_mut().map(|state| state.inventory.add(item)).expect("fixture hero")
}

/// Plays back a fixed list of actions, then attacks the first target forever.
/// Menu answers default to the first option.
#[derive(Default)]
pub(crate) struct ScriptCommander {
    pub actions: Vec<BattleAction>,
    pub picks: Vec<Option<usize>>,
    pub prompts: usize,
}

impl ScriptCommander {
    pub(crate) fn new(actions: Vec<BattleAction>) -> Self {
        Self { actions, ..Self::default() }
    }

    fn next_pick(&mut self) -> Option<usize> {
        self.prompts += 1;
        if self.picks.is_empty() { Some(0) } else { self.picks.remove(0) }
    }
}

impl PartyCommander for ScriptCommander {
    fn choose_action(&mut self, _view: &BattleView<'_>, _hero: CharacterId) -> BattleAction {
        if self.actions.is_empty() { BattleAction::Attack } else { self.actions.remove(0) }
    }

    fn choose_target(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _targets: &[CharacterId],
    ) -> Option<usize> {
        self.next_pick()
    }

    fn choose_spell(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _spells: &[ItemId],
    ) -> Option<usize> {
        self.next_pick()
    }

    fn choose_potion(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _potions: &[ItemId],
    ) -> Option<usize> {
        self.next_pick()
    }

    fn choose_equip(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _options: &[EquipChoice],
    ) -> Option<usize> {
        self.next_pick()
    }
}
