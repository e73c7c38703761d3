//! Party-versus-monsters battles.

pub mod actions;
mod engine;
pub mod resolve;


pub use actions::{BattleAction, BattleView, EquipChoice, PartyCommander};
pub(crate) use engine::apply_equip_choice;
pub use engine::{BattlePhase, BattleReport, CombatEngine, SpawnedMonster};
