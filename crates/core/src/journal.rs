use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::combat::{BattleAction, BattleView, EquipChoice, PartyCommander};
use crate::rules::Rules;
use crate::session::{SessionCommand, SessionConfig};
use crate::types::{CharacterId, ItemId};

/// Version 2 added the rules the session ran under.
pub const FORMAT_VERSION: u16 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub build_id: String,
    pub content_hash: u64,
    pub seed: u64,
    pub board_size: usize,
    pub party: Vec<String>,
    pub rules: Rules,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub payload: InputPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPayload {
    Command(SessionCommand),
    Action(BattleAction),
    /// Menu answer; `None` backed out.
    Pick(Option<usize>),
}

impl InputJournal {
    pub fn new(config: &SessionConfig, catalog: &Catalog) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            build_id: env!("CARGO_PKG_VERSION").to_string(),
            content_hash: catalog.content_hash(),
            seed: config.seed,
            board_size: config.board_size,
            party: config.party.clone(),
            rules: config.rules.clone(),
            inputs: Vec::new(),
        }
    }

    /// The configuration the journal was recorded under.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            seed: self.seed,
            board_size: self.board_size,
            party: self.party.clone(),
            rules: self.rules.clone(),
        }
    }

    pub fn append(&mut self, payload: InputPayload) {
        let seq = self.inputs.len() as u64;
        self.inputs.push(InputRecord { seq, payload });
    }

    pub fn append_command(&mut self, command: SessionCommand) {
        self.append(InputPayload::Command(command));
    }

    pub fn commands(&self) -> impl Iterator<Item = &SessionCommand> {
        self.inputs.iter().filter_map(|record| match &record.payload {
            InputPayload::Command(command) => Some(command),
            InputPayload::Action(_) | InputPayload::Pick(_) => None,
        })
    }
}

/// Passes prompts through to another commander and journals every answer.
pub struct RecordingCommander<C> {
    inner: C,
    journal: InputJournal,
}

impl<C: PartyCommander> RecordingCommander<C> {
    pub fn new(inner: C, journal: InputJournal) -> Self {
        Self { inner, journal }
    }

    pub fn record_command(&mut self, command: SessionCommand) {
        self.journal.append_command(command);
    }

    pub fn journal(&self) -> &InputJournal {
        &self.journal
    }

    pub fn into_journal(self) -> InputJournal {
        self.journal
    }

    fn pick(&mut self, pick: Option<usize>) -> Option<usize> {
        self.journal.append(InputPayload::Pick(pick));
        pick
    }
}

impl<C: PartyCommander> PartyCommander for RecordingCommander<C> {
    fn choose_action(&mut self, view: &BattleView<'_>, hero: CharacterId) -> BattleAction {
        let action = self.inner.choose_action(view, hero);
        self.journal.append(InputPayload::Action(action));
        action
    }

    fn choose_target(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        targets: &[CharacterId],
    ) -> Option<usize> {
        let pick = self.inner.choose_target(view, hero, targets);
        self.pick(pick)
    }

    fn choose_spell(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        spells: &[ItemId],
    ) -> Option<usize> {
        let pick = self.inner.choose_spell(view, hero, spells);
        self.pick(pick)
    }

    fn choose_potion(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        potions: &[ItemId],
    ) -> Option<usize> {
        let pick = self.inner.choose_potion(view, hero, potions);
        self.pick(pick)
    }

    fn choose_equip(
        &mut self,
        view: &BattleView<'_>,
        hero: CharacterId,
        options: &[EquipChoice],
    ) -> Option<usize> {
        let pick = self.inner.choose_equip(view, hero, options);
        self.pick(pick)
    }
}
