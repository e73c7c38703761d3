//! Heroes and monsters as one record with a role variant.
//! HP, mana, and experience change only through the methods here, which clamp.

pub mod formulas;

use slotmap::SlotMap;

use crate::catalog::{HeroTemplate, MonsterTemplate};
use crate::equipment::{Inventory, Item, Potion};
use crate::error::ActionError;
use crate::types::{Archetype, CharacterId, Element, ItemId, MonsterKind, StatKind};

use formulas::{
    MANA_GROWTH, experience_threshold, growth_factor, hero_max_hp, hero_max_mana,
    monster_max_hp,
};

pub type Roster = SlotMap<CharacterId, Character>;

/// A base value plus a transient boost that is cleared when a battle starts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stat {
    pub base: f64,
    pub boost: f64,
}

impl Stat {
    pub fn new(base: f64) -> Self {
        Self { base, boost: 0.0 }
    }

    pub fn value(self) -> f64 {
        self.base + self.boost
    }
}

#[derive(Clone, Debug)]
pub struct HeroState {
    pub archetype: Archetype,
    mana: f64,
    pub strength: Stat,
    pub agility: Stat,
    pub dexterity: Stat,
    pub gold: f64,
    experience: u32,
    pub fainted_in_battle: bool,
    pub inventory: Inventory,
}

impl HeroState {
    pub fn mana(&self) -> f64 {
        self.mana
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn stat(&self, stat: StatKind) -> Option<Stat> {
        match stat {
            StatKind::Strength => Some(self.strength),
            StatKind::Agility => Some(self.agility),
            StatKind::Dexterity => Some(self.dexterity),
            StatKind::Health | StatKind::Mana => None,
        }
    }

    fn stat_mut(&mut self, stat: StatKind) -> Option<&mut Stat> {
        match stat {
            StatKind::Strength => Some(&mut self.strength),
            StatKind::Agility => Some(&mut self.agility),
            StatKind::Dexterity => Some(&mut self.dexterity),
            StatKind::Health | StatKind::Mana => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonsterState {
    pub kind: MonsterKind,
    pub base_damage: f64,
    pub defense: f64,
    /// Probability in `[0, 1]`.
    pub dodge_chance: f64,
    pub lane: Option<usize>,
}

impl MonsterState {
    /// Lowers the stat tied to `element` by `fraction` of its current value.
    pub fn weaken(&mut self, element: Element, fraction: f64) {
        let stat = match element {
            Element::Ice => &mut self.base_damage,
            Element::Fire => &mut self.defense,
            Element::Lightning => &mut self.dodge_chance,
        };
        *stat = (*stat * (1.0 - fraction)).max(0.0);
    }
}

#[derive(Clone, Debug)]
pub enum Role {
    Hero(HeroState),
    Monster(MonsterState),
}

#[derive(Clone, Debug)]
pub struct Character {
    name: String,
    level: u32,
    hp: f64,
    pub role: Role,
}

impl Character {
    /// Template experience at or past the level 1 threshold is carried into levels.
    pub fn new_hero(template: &HeroTemplate) -> Self {
        let level = 1;
        let archetype = template.archetype;
        let mut hero = Self {
            name: template.name.clone(),
            level,
            hp: hero_max_hp(archetype, level),
            role: Role::Hero(HeroState {
                archetype,
                mana: template.mana.clamp(0.0, hero_max_mana(archetype, level)),
                strength: Stat::new(template.strength),
                agility: Stat::new(template.agility),
                dexterity: Stat::new(template.dexterity),
                gold: template.gold.max(0.0),
                experience: template.experience,
                fainted_in_battle: false,
                inventory: Inventory::default(),
            }),
        };
        hero.carry_experience();
        hero
    }

    /// Scales a template to `level`. Damage and defense grow with the level ratio,
    /// dodge stays as written, and HP is fixed by level.
    pub fn new_monster(template: &MonsterTemplate, level: u32) -> Self {
        let level = level.max(1);
        let ratio = f64::from(level) / f64::from(template.level.max(1));
        Self {
            name: template.name.clone(),
            level,
            hp: monster_max_hp(level),
            role: Role::Monster(MonsterState {
                kind: template.kind,
                base_damage: (template.damage * ratio).max(0.0),
                defense: (template.defense * ratio).max(0.0),
                dodge_chance: (template.dodge / 100.0).clamp(0.0, 1.0),
                lane: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn max_hp(&self) -> f64 {
        match &self.role {
            Role::Hero(hero) => hero_max_hp(hero.archetype, self.level),
            Role::Monster(_) => monster_max_hp(self.level),
        }
    }

    pub fn max_mana(&self) -> f64 {
        match &self.role {
            Role::Hero(hero) => hero_max_mana(hero.archetype, self.level),
            Role::Monster(_) => 0.0,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn hero(&self) -> Option<&HeroState> {
        match &self.role {
            Role::Hero(hero) => Some(hero),
            Role::Monster(_) => None,
        }
    }

    pub fn hero_mut(&mut self) -> Option<&mut HeroState> {
        match &mut self.role {
            Role::Hero(hero) => Some(hero),
            Role::Monster(_) => None,
        }
    }

    pub fn monster(&self) -> Option<&MonsterState> {
        match &self.role {
            Role::Monster(monster) => Some(monster),
            Role::Hero(_) => None,
        }
    }

    pub fn monster_mut(&mut self) -> Option<&mut MonsterState> {
        match &mut self.role {
            Role::Monster(monster) => Some(monster),
            Role::Hero(_) => None,
        }
    }

    pub fn is_hero(&self) -> bool {
        matches!(self.role, Role::Hero(_))
    }

    /// Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: f64) -> f64 {
        let dealt = amount.max(0.0).min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: f64) -> f64 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0.0)).min(self.max_hp());
        self.hp - before
    }

    pub fn restore_mana(&mut self, amount: f64) -> f64 {
        let max_mana = self.max_mana();
        let Some(hero) = self.hero_mut() else {
            return 0.0;
        };
        let before = hero.mana;
        hero.mana = (hero.mana + amount.max(0.0)).min(max_mana);
        hero.mana - before
    }

    pub fn spend_mana(&mut self, cost: f64) -> Result<(), ActionError> {
        let available = self.hero().map_or(0.0, HeroState::mana);
        let needed = cost.max(0.0);
        if available < needed {
            return Err(ActionError::InsufficientMana { needed, available });
        }
        if let Some(hero) = self.hero_mut() {
            hero.mana -= needed;
        }
        Ok(())
    }

    /// Multiplies HP and mana by `factor`, clamped to their maxima.
    pub fn regenerate(&mut self, factor: f64) {
        if self.is_defeated() {
            return;
        }
        self.hp = (self.hp * factor).clamp(0.0, self.max_hp());
        let max_mana = self.max_mana();
        if let Some(hero) = self.hero_mut() {
            hero.mana = (hero.mana * factor).clamp(0.0, max_mana);
        }
    }

    /// Half HP and no mana.
    pub fn revive(&mut self) {
        self.hp = self.max_hp() / 2.0;
        if let Some(hero) = self.hero_mut() {
            hero.mana = 0.0;
        }
    }

    pub fn add_boost(&mut self, stat: StatKind, amount: f64) {
        if let Some(stat) = self.hero_mut().and_then(|hero| hero.stat_mut(stat)) {
            stat.boost += amount;
        }
    }

    /// Health and mana are restored with clamping. Other stats gain a transient boost.
    pub fn drink(&mut self, potion: &Potion) {
        for &stat in &potion.affects {
            match stat {
                StatKind::Health => {
                    self.heal(potion.amount);
                }
                StatKind::Mana => {
                    self.restore_mana(potion.amount);
                }
                StatKind::Strength | StatKind::Dexterity | StatKind::Agility => {
                    self.add_boost(stat, potion.amount)
                }
            }
        }
    }

    /// Drinks a potion from the inventory, consuming it.
    pub fn use_potion(&mut self, item: ItemId) -> Result<Item, ActionError> {
        let hero = self.hero_mut().ok_or(ActionError::NotAHero)?;
        let potion = hero
            .inventory
            .get(item)
            .ok_or(ActionError::UnknownItem)?
            .as_potion()
            .cloned()
            .ok_or(ActionError::WrongItemKind)?;
        let used = hero.inventory.remove(item).ok_or(ActionError::UnknownItem)?;
        self.drink(&potion);
        Ok(used)
    }

    pub fn reset_boosts(&mut self) {
        if let Some(hero) = self.hero_mut() {
            for stat in [&mut hero.strength, &mut hero.agility, &mut hero.dexterity] {
                stat.boost = 0.0;
            }
        }
    }

    /// Adds experience and levels up as many times as it covers. Leftover carries.
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u32) -> u32 {
        let Some(hero) = self.hero_mut() else {
            return 0;
        };
        hero.experience = hero.experience.saturating_add(amount);
        self.carry_experience()
    }

    fn carry_experience(&mut self) -> u32 {
        let mut gained = 0;
        loop {
            let threshold = experience_threshold(self.level);
            let Some(hero) = self.hero_mut() else {
                break;
            };
            if hero.experience < threshold {
                break;
            }
            hero.experience -= threshold;
            self.level_up();
            gained += 1;
        }
        gained
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.hp = self.max_hp();
        let max_mana = self.max_mana();
        if let Some(hero) = self.hero_mut() {
            hero.mana = (hero.mana * MANA_GROWTH).min(max_mana);
            let archetype = hero.archetype;
            for kind in [StatKind::Strength, StatKind::Agility, StatKind::Dexterity] {
                if let Some(stat) = hero.stat_mut(kind) {
                    stat.base *= growth_factor(archetype, kind);
                }
            }
        }
    }
}
