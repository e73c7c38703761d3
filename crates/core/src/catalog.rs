//! Hero, monster, and item templates.
//! This module exists to hold already-parsed content and a small built-in pack.
//! It does not read files; callers hand over text or use `Catalog::builtin`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::equipment::{Armor, Durability, Item, ItemKind, Potion, Spell, Weapon};
use crate::error::CatalogError;
use crate::types::{Archetype, Element, MonsterKind, StatKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeroTemplate {
    pub name: String,
    pub archetype: Archetype,
    pub mana: f64,
    pub strength: f64,
    pub agility: f64,
    pub dexterity: f64,
    pub gold: f64,
    pub experience: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub name: String,
    pub kind: MonsterKind,
    pub level: u32,
    pub damage: f64,
    pub defense: f64,
    /// Percentage, 0 to 100.
    pub dodge: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub heroes: Vec<HeroTemplate>,
    pub monsters: Vec<MonsterTemplate>,
    pub items: Vec<Item>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let names = self
            .heroes
            .iter()
            .map(|hero| hero.name.as_str())
            .chain(self.monsters.iter().map(|monster| monster.name.as_str()))
            .chain(self.items.iter().map(|item| item.name.as_str()));
        for name in names {
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
        }
        if let Some(monster) = self.monsters.iter().find(|monster| monster.level == 0) {
            return Err(CatalogError::ZeroLevel(monster.name.clone()));
        }
        // Heroes and items are looked up by name, so the first match must be the only one.
        first_duplicate(self.heroes.iter().map(|hero| hero.name.as_str()))
            .or_else(|| first_duplicate(self.items.iter().map(|item| item.name.as_str())))
            .map_or(Ok(()), |name| Err(CatalogError::DuplicateName(name.to_string())))
    }

    pub fn hero(&self, name: &str) -> Option<&HeroTemplate> {
        self.heroes.iter().find(|hero| hero.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Stable digest of the content, recorded in journals.
    pub fn content_hash(&self) -> u64 {
        xxh3_64(&serde_json::to_vec(self).unwrap_or_default())
    }

    pub fn builtin() -> Self {
        Self { heroes: builtin_heroes(), monsters: builtin_monsters(), items: builtin_items() }
    }
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|name| !seen.insert(*name))
}

fn hero(
    name: &str,
    archetype: Archetype,
    [mana, strength, agility, dexterity]: [f64; 4],
    gold: f64,
    experience: u32,
) -> HeroTemplate {
    HeroTemplate {
        name: name.to_string(),
        archetype,
        mana,
        strength,
        agility,
        dexterity,
        gold,
        experience,
    }
}

fn builtin_heroes() -> Vec<HeroTemplate> {
    use Archetype::{Paladin, Sorcerer, Warrior};
    vec![
        hero("Gaerdal_Ironhand", Warrior, [100.0, 700.0, 500.0, 600.0], 1354.0, 7),
        hero("Sehanine_Monnbow", Warrior, [600.0, 700.0, 800.0, 500.0], 2500.0, 8),
        hero("Muamman_Duathall", Warrior, [300.0, 900.0, 500.0, 750.0], 2546.0, 6),
        hero("Rillifane_Rallathil", Sorcerer, [1300.0, 750.0, 450.0, 500.0], 2500.0, 9),
        hero("Segojan_Earthcaller", Sorcerer, [900.0, 800.0, 500.0, 650.0], 2500.0, 5),
        hero("Reign_Havoc", Sorcerer, [800.0, 800.0, 800.0, 800.0], 2500.0, 8),
        hero("Parzival", Paladin, [300.0, 750.0, 650.0, 700.0], 2500.0, 7),
        hero("Skoraeus_Stonebones", Paladin, [250.0, 650.0, 600.0, 350.0], 2500.0, 4),
        hero("Garl_Glittergold", Paladin, [100.0, 600.0, 500.0, 400.0], 2500.0, 5),
    ]
}

fn monster(
    name: &str,
    kind: MonsterKind,
    level: u32,
    [damage, defense, dodge]: [f64; 3],
) -> MonsterTemplate {
    MonsterTemplate { name: name.to_string(), kind, level, damage, defense, dodge }
}

fn builtin_monsters() -> Vec<MonsterTemplate> {
    use MonsterKind::{Dragon, Exoskeleton, Spirit};
    vec![
        monster("Natsunomeryu", Dragon, 1, [100.0, 200.0, 10.0]),
        monster("Chrysophylax", Dragon, 2, [200.0, 500.0, 20.0]),
        monster("Desghidorrah", Dragon, 3, [300.0, 400.0, 35.0]),
        monster("BigBad-Wolf", Exoskeleton, 1, [150.0, 250.0, 15.0]),
        monster("WickedWitch", Exoskeleton, 2, [250.0, 350.0, 25.0]),
        monster("Brandobaris", Exoskeleton, 3, [350.0, 450.0, 30.0]),
        monster("Aim-Haborym", Spirit, 1, [450.0, 350.0, 35.0]),
        monster("Andrealphus", Spirit, 2, [600.0, 500.0, 40.0]),
        monster("Andromalius", Spirit, 3, [550.0, 450.0, 25.0]),
    ]
}

fn item(name: &str, price: f64, min_level: u32, kind: ItemKind) -> Item {
    Item { name: name.to_string(), price, min_level, kind }
}

fn weapon(base_damage: f64, hands: u8) -> ItemKind {
    ItemKind::Weapon(Weapon { base_damage, hands, durability: Durability::FULL })
}

fn armor(base_reduction: f64) -> ItemKind {
    ItemKind::Armor(Armor { base_reduction, durability: Durability::FULL })
}

fn potion(amount: f64, affects: &[StatKind]) -> ItemKind {
    ItemKind::Potion(Potion { amount, affects: affects.to_vec() })
}

fn spell(damage: f64, mana_cost: f64, element: Element) -> ItemKind {
    ItemKind::Spell(Spell { damage, mana_cost, element })
}

fn builtin_items() -> Vec<Item> {
    use Element::{Fire, Ice, Lightning};
    use StatKind::{Agility, Health, Mana, Strength};
    vec![
        item("Dagger", 200.0, 1, weapon(250.0, 1)),
        item("Sword", 500.0, 1, weapon(800.0, 1)),
        item("Bow", 300.0, 2, weapon(500.0, 2)),
        item("Axe", 550.0, 5, weapon(850.0, 1)),
        item("Scythe", 1000.0, 6, weapon(1100.0, 2)),
        item("Platinum_Shield", 150.0, 1, armor(200.0)),
        item("Breastplate", 350.0, 3, armor(600.0)),
        item("Speed_Boots", 550.0, 4, armor(600.0)),
        item("Full_Body_Armor", 1000.0, 8, armor(1100.0)),
        item("Healing_Potion", 250.0, 1, potion(100.0, &[Health])),
        item("Strength_Potion", 200.0, 1, potion(75.0, &[Strength])),
        item("Magic_Potion", 350.0, 2, potion(100.0, &[Mana])),
        item("Luck_Elixir", 500.0, 4, potion(65.0, &[Agility])),
        item("Mermaid_Tears", 850.0, 5, potion(100.0, &[Health, Mana, Strength, Agility])),
        item("Ambrosia", 1000.0, 8, ItemKind::Potion(Potion::all(150.0))),
        item("Ice_Blade", 250.0, 1, spell(450.0, 100.0, Ice)),
        item("Snow_Cannon", 500.0, 2, spell(650.0, 250.0, Ice)),
        item("Breath_of_Fire", 350.0, 1, spell(450.0, 100.0, Fire)),
        item("Flame_Tornado", 700.0, 4, spell(850.0, 300.0, Fire)),
        item("Lightning_Dagger", 400.0, 1, spell(500.0, 150.0, Lightning)),
        item("Thunder_Blast", 750.0, 4, spell(950.0, 400.0, Lightning)),
    ]
}
