use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::error::ActionError;

new_key_type! {
    pub struct CharacterId;
    pub struct ItemId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const ORIGIN: Pos = Pos { y: 0, x: 0 };

    pub fn step(self, direction: Direction) -> Pos {
        match direction {
            Direction::North => Pos { y: self.y - 1, x: self.x },
            Direction::East => Pos { y: self.y, x: self.x + 1 },
            Direction::South => Pos { y: self.y + 1, x: self.x },
            Direction::West => Pos { y: self.y, x: self.x - 1 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Open,
    Blocked,
    Market,
    Nexus,
    BushBoost,
    CaveBoost,
    StrengthBoost,
    DestructibleObstacle,
}

impl TerrainKind {
    pub fn is_accessible(self) -> bool {
        !matches!(self, TerrainKind::Blocked | TerrainKind::DestructibleObstacle)
    }

    /// Stat raised while a hero stands on a boost cell of the lane board.
    pub fn boosted_stat(self) -> Option<StatKind> {
        match self {
            TerrainKind::BushBoost => Some(StatKind::Dexterity),
            TerrainKind::CaveBoost => Some(StatKind::Agility),
            TerrainKind::StrengthBoost => Some(StatKind::Strength),
            _ => None,
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            TerrainKind::Open => 0,
            TerrainKind::Blocked => 1,
            TerrainKind::Market => 2,
            TerrainKind::Nexus => 3,
            TerrainKind::BushBoost => 4,
            TerrainKind::CaveBoost => 5,
            TerrainKind::StrengthBoost => 6,
            TerrainKind::DestructibleObstacle => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Warrior,
    Sorcerer,
    Paladin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Dragon,
    Exoskeleton,
    Spirit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Ice,
    Fire,
    Lightning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Health,
    Mana,
    Strength,
    Dexterity,
    Agility,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Health,
        StatKind::Mana,
        StatKind::Strength,
        StatKind::Dexterity,
        StatKind::Agility,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    Quit,
    RoundLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Aborted(AbortReason),
}

/// How a lane game ends: a hero reaches the monster nexus or a monster reaches the heroes'.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneOutcome {
    HeroesWin,
    MonstersWin,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    WorldGenerated { attempts: u32, used_fallback: bool },
    PartyMoved { to: Pos },
    MarketEntered { at: Pos },
    EncounterTriggered { at: Pos },
    MonsterSpawned { monster: CharacterId, kind: MonsterKind, level: u32 },
    AttackDodged { attacker: CharacterId, defender: CharacterId },
    AttackHit { attacker: CharacterId, defender: CharacterId, damage: f64 },
    SpellCast { caster: CharacterId, target: CharacterId, element: Element, damage: f64 },
    DebuffApplied { target: CharacterId, element: Element },
    PotionUsed { hero: CharacterId, potion: String },
    ItemEquipped { hero: CharacterId, item: String },
    ItemUnequipped { hero: CharacterId, item: String },
    EquipmentBroke { hero: CharacterId, item: String },
    CharacterDefeated { character: CharacterId },
    ActionRejected { hero: CharacterId, reason: ActionError },
    TurnForfeited { hero: CharacterId },
    RoundCompleted { round: u32 },
    HeroRevived { hero: CharacterId },
    RewardsGranted { hero: CharacterId, gold: f64, experience: u32 },
    LevelUp { hero: CharacterId, level: u32 },
    BattleEnded { outcome: BattleOutcome, rounds: u32 },
    ItemPurchased { hero: CharacterId, item: String, price: f64 },
    ItemSold { hero: CharacterId, item: String, value: f64 },
    SessionEnded { steps: u64, battles: u32 },
    HeroMoved { hero: CharacterId, to: Pos },
    TerrainBoosted { hero: CharacterId, stat: StatKind, amount: f64 },
    ObstacleCleared { hero: CharacterId, at: Pos },
    HeroTeleported { hero: CharacterId, to: Pos },
    HeroRecalled { hero: CharacterId, to: Pos },
    MonsterAdvanced { monster: CharacterId, to: Pos },
    LaneSpawnBlocked { lane: usize },
    LaneGameDecided { outcome: LaneOutcome, rounds: u32 },
}
