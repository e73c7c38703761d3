//! Error types returned across the public API.
//! Rejected player actions are recoverable and never consume a turn.

use thiserror::Error;

use crate::types::{CharacterId, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("board size {0} is outside the supported range 4..=20")]
    InvalidSize(usize),
    #[error("position ({}, {}) lies outside the board", .0.y, .0.x)]
    OutOfBounds(Pos),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ActionError {
    #[error("no living monster to target")]
    NoTarget,
    #[error("the hero has nothing of that kind to use")]
    NoneAvailable,
    #[error("the hero carries no such item")]
    UnknownItem,
    #[error("that item cannot be used this way")]
    WrongItemKind,
    #[error("not enough mana: need {needed:.0}, have {available:.0}")]
    InsufficientMana { needed: f64, available: f64 },
    #[error("that item is already equipped")]
    AlreadyEquipped,
    #[error("nothing is equipped in that slot")]
    NothingEquipped,
    #[error("that item is broken")]
    Broken,
    #[error("not enough gold: need {needed:.0}, have {available:.0}")]
    InsufficientGold { needed: f64, available: f64 },
    #[error("hero level {level} is below the required level {required}")]
    LevelTooLow { level: u32, required: u32 },
    #[error("the party is not standing on a market")]
    NotAtMarket,
    #[error("this market does not stock that item")]
    NotInStock,
    #[error("the hero is defeated")]
    HeroDefeated,
    #[error("only heroes can do that")]
    NotAHero,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("the party has no members")]
    EmptyParty,
    #[error("character {0:?} is not a hero in the roster")]
    UnknownHero(CharacterId),
    #[error("the monster catalog is empty")]
    EmptyMonsterCatalog,
    #[error("every party member is already defeated")]
    PartyWipedOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("moving there would leave the board")]
    OffBoard,
    #[error("that cell is not accessible")]
    Blocked,
    #[error("the session is over")]
    SessionOver,
    #[error(transparent)]
    Combat(#[from] CombatError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("the lane game is already decided")]
    GameOver,
    #[error("hero index {0} is not in the party")]
    UnknownHero(usize),
    #[error("that hero is down until the round ends")]
    HeroDown,
    #[error("that hero already acted this round")]
    AlreadyActed,
    #[error("moving there would leave the board")]
    OffBoard,
    #[error("that cell is not accessible")]
    Blocked,
    #[error("another character stands there")]
    Occupied,
    #[error("a monster holds the lane ahead")]
    ZoneOfControl,
    #[error("there is no obstacle to clear there")]
    NoObstacle,
    #[error("no monster within reach")]
    NoTarget,
    #[error("teleporting must cross into another lane")]
    SameLane,
    #[error("no free cell beside that hero")]
    NoRoom,
    #[error("the nexus spawn is occupied")]
    SpawnBlocked,
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("a party needs between 1 and {max} heroes, got {got}")]
    PartySize { got: usize, max: usize },
    #[error("no hero template named {0:?}")]
    UnknownHeroTemplate(String),
    #[error("no item template named {0:?}")]
    UnknownItemTemplate(String),
    #[error("hero index {0} is not in the party")]
    UnknownPartyMember(usize),
    #[error("hero {hero} carries no item named {item:?}")]
    ItemNotCarried { hero: usize, item: String },
    #[error(transparent)]
    Combat(#[from] CombatError),
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("the journal was recorded with a different {0}")]
    Mismatch(&'static str),
    #[error("the journal ran out of recorded answers")]
    MissingInput,
    #[error("recorded input {seq} does not match the prompt it was replayed against")]
    UnexpectedInput { seq: u64 },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog entries need a non-blank name")]
    EmptyName,
    #[error("monster template {0:?} has level 0")]
    ZeroLevel(String),
    #[error("catalog names {0:?} more than once")]
    DuplicateName(String),
}
