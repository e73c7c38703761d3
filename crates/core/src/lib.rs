pub mod autopilot;
pub mod catalog;
pub mod character;
pub mod combat;
pub mod equipment;
pub mod error;
pub mod journal;
pub mod lane_session;
pub mod market;
pub mod progression;
pub mod replay;
pub mod rng;
pub mod rules;
pub mod session;
pub mod types;
pub mod world;

#[cfg(test)]
mod test_support;

pub use autopilot::AutoPilot;
pub use catalog::{Catalog, HeroTemplate, MonsterTemplate};
pub use character::{Character, Roster};
pub use combat::{BattleAction, BattleReport, BattleView, CombatEngine, EquipChoice, PartyCommander};
pub use error::*;
pub use journal::{InputJournal, InputPayload, InputRecord, RecordingCommander};
pub use lane_session::{LaneAction, LaneSession};
pub use replay::{ReplayResult, ScriptedCommander, replay_session};
pub use rng::{GameRng, RandomSource};
pub use rules::Rules;
pub use session::{Session, SessionCommand, SessionConfig, StepOutcome};
pub use types::*;
pub use world::{TerrainGrid, WorldGenerator};
