use std::slice;

use tracing::debug;

use crate::catalog::Catalog;
use crate::combat::{BattleAction, BattleView, EquipChoice, PartyCommander};
use crate::error::ReplayError;
use crate::journal::{FORMAT_VERSION, InputJournal, InputPayload, InputRecord};
use crate::session::{Session, SessionCommand, SessionConfig};
use crate::types::{CharacterId, ItemId};

#[derive(Debug, PartialEq)]
pub struct ReplayResult {
    pub final_snapshot_hash: u64,
    pub steps: u64,
    pub battles: u32,
    pub session_over: bool,
}

/// Answers prompts from a journal, in order. A wrong or missing record is kept
/// as a fault; once faulted it quits every battle and backs out of every menu.
pub struct ScriptedCommander<'j> {
    records: slice::Iter<'j, InputRecord>,
    fault: Option<ReplayError>,
}

impl<'j> ScriptedCommander<'j> {
    pub fn new(records: &'j [InputRecord]) -> Self {
        Self { records: records.iter(), fault: None }
    }

    /// Next stored command, or `None` at the end of the journal.
    pub fn next_command(&mut self) -> Result<Option<&'j SessionCommand>, ReplayError> {
        if let Some(fault) = self.fault.take() {
            return Err(fault);
        }
        match self.records.next() {
            None => Ok(None),
            Some(InputRecord { payload: InputPayload::Command(command), .. }) => Ok(Some(command)),
            Some(record) => Err(ReplayError::UnexpectedInput { seq: record.seq }),
        }
    }

    pub fn take_fault(&mut self) -> Option<ReplayError> {
        self.fault.take()
    }

    fn next_answer(&mut self) -> Option<&'j InputRecord> {
        if self.fault.is_some() {
            return None;
        }
        match self.records.next() {
            None => {
                self.fault = Some(ReplayError::MissingInput);
                None
            }
            Some(record @ InputRecord { payload: InputPayload::Command(_), .. }) => {
                self.fault = Some(ReplayError::UnexpectedInput { seq: record.seq });
                None
            }
            Some(record) => Some(record),
        }
    }

    fn action(&mut self) -> BattleAction {
        match self.next_answer() {
            Some(InputRecord { payload: InputPayload::Action(action), .. }) => *action,
            Some(record) => {
                self.fault = Some(ReplayError::UnexpectedInput { seq: record.seq });
                BattleAction::Quit
            }
            None => BattleAction::Quit,
        }
    }

    fn pick(&mut self) -> Option<usize> {
        match self.next_answer() {
            Some(InputRecord { payload: InputPayload::Pick(pick), .. }) => *pick,
            Some(record) => {
                self.fault = Some(ReplayError::UnexpectedInput { seq: record.seq });
                None
            }
            None => None,
        }
    }
}

impl PartyCommander for ScriptedCommander<'_> {
    fn choose_action(&mut self, _view: &BattleView<'_>, _hero: CharacterId) -> BattleAction {
        self.action()
    }

    fn choose_target(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _targets: &[CharacterId],
    ) -> Option<usize> {
        self.pick()
    }

    fn choose_spell(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _spells: &[ItemId],
    ) -> Option<usize> {
        self.pick()
    }

    fn choose_potion(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _potions: &[ItemId],
    ) -> Option<usize> {
        self.pick()
    }

    fn choose_equip(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        _options: &[EquipChoice],
    ) -> Option<usize> {
        self.pick()
    }
}

/// Rebuilds a session from `config` and feeds it the journal.
pub fn replay_session(
    catalog: &Catalog,
    config: &SessionConfig,
    journal: &InputJournal,
) -> Result<ReplayResult, ReplayError> {
    if journal.format_version != FORMAT_VERSION {
        return Err(ReplayError::Mismatch("format version"));
    }
    if journal.seed != config.seed
        || journal.board_size != config.board_size
        || journal.party != config.party
    {
        return Err(ReplayError::Mismatch("session config"));
    }
    if journal.rules != config.rules {
        return Err(ReplayError::Mismatch("rules"));
    }
    if journal.content_hash != catalog.content_hash() {
        return Err(ReplayError::Mismatch("catalog"));
    }

    let mut session = Session::new(config.clone(), catalog)?;
    let mut commander = ScriptedCommander::new(&journal.inputs);
    while let Some(command) = commander.next_command()? {
        let result = session.execute(command, &mut commander);
        if let Some(fault) = commander.take_fault() {
            return Err(fault);
        }
        // Commands rejected here were rejected the same way when recorded.
        if let Err(error) = result {
            debug!(%error, ?command, "replayed command was rejected");
        }
    }

    Ok(ReplayResult {
        final_snapshot_hash: session.snapshot_hash(),
        steps: session.steps(),
        battles: session.battles(),
        session_over: session.is_over(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::RecordingCommander;
    use crate::rules::Rules;
    use crate::test_support::ScriptCommander;
    use crate::types::Direction;

    const MAX_TEST_COMMANDS: usize = 200;

    fn walk(step: usize) -> Direction {
        match step % 12 {
            0..=4 => Direction::East,
            5 | 11 => Direction::South,
            _ => Direction::West,
        }
    }

    fn record(seed: u64) -> (SessionConfig, InputJournal, Session) {
        record_with(SessionConfig::new(seed, 6, &["Gaerdal_Ironhand", "Sehanine_Monnbow"]))
    }

    fn record_with(config: SessionConfig) -> (SessionConfig, InputJournal, Session) {
        let catalog = Catalog::builtin();
        let mut session = Session::new(config.clone(), &catalog).unwrap();
        let mut recorder = RecordingCommander::new(
            ScriptCommander::default(),
            InputJournal::new(&config, &catalog),
        );
        for step in 0..MAX_TEST_COMMANDS {
            if session.is_over() {
                break;
            }
            let command = SessionCommand::Move(walk(step));
            recorder.record_command(command.clone());
            let _ = session.execute(&command, &mut recorder);
        }
        (config, recorder.into_journal(), session)
    }

    fn answers(journal: &InputJournal) -> usize {
        journal.inputs.iter().filter(|record| matches!(record.payload, InputPayload::Action(_))).count()
    }

    #[test]
    fn replay_reproduces_recorded_session() {
        let (config, journal, session) = record(777);
        assert!(session.battles() > 0, "walk should meet at least one battle");

        let result = replay_session(&Catalog::builtin(), &config, &journal).unwrap();
        assert_eq!(result.final_snapshot_hash, session.snapshot_hash());
        assert_eq!(result.steps, session.steps());
        assert_eq!(result.battles, session.battles());
        assert_eq!(result.session_over, session.is_over());
    }

    #[test]
    fn truncated_journal_reports_missing_input() {
        let (config, mut journal, _) = record(777);
        assert!(answers(&journal) > 0);
        let last_action = journal
            .inputs
            .iter()
            .rposition(|record| matches!(record.payload, InputPayload::Action(_)))
            .unwrap();
        journal.inputs.truncate(last_action);

        assert_eq!(
            replay_session(&Catalog::builtin(), &config, &journal),
            Err(ReplayError::MissingInput)
        );
    }

    #[test]
    fn command_in_place_of_an_answer_is_unexpected() {
        let (config, mut journal, _) = record(777);
        let first_action = journal
            .inputs
            .iter()
            .position(|record| matches!(record.payload, InputPayload::Action(_)))
            .unwrap();
        journal.inputs.insert(
            first_action,
            InputRecord { seq: 9999, payload: InputPayload::Command(SessionCommand::Move(Direction::East)) },
        );

        assert_eq!(
            replay_session(&Catalog::builtin(), &config, &journal),
            Err(ReplayError::UnexpectedInput { seq: 9999 })
        );
    }

    #[test]
    fn journal_must_match_config_and_catalog() {
        let (config, journal, _) = record(5);
        let other_seed = SessionConfig { seed: 6, ..config.clone() };
        assert_eq!(
            replay_session(&Catalog::builtin(), &other_seed, &journal),
            Err(ReplayError::Mismatch("session config"))
        );

        let mut catalog = Catalog::builtin();
        catalog.items.pop();
        assert_eq!(
            replay_session(&catalog, &config, &journal),
            Err(ReplayError::Mismatch("catalog"))
        );
    }

    #[test]
    fn journal_replays_only_under_its_own_rules() {
        let mut config = SessionConfig::new(31, 6, &["Gaerdal_Ironhand", "Sehanine_Monnbow"]);
        config.rules =
            Rules { encounter_chance: 1.0, gold_per_monster_level: 5000.0, ..Rules::default() };
        let (config, journal, session) = record_with(config);
        assert!(session.battles() > 0);

        let default_rules = SessionConfig { rules: Rules::default(), ..config.clone() };
        assert_eq!(
            replay_session(&Catalog::builtin(), &default_rules, &journal),
            Err(ReplayError::Mismatch("rules"))
        );

        let result = replay_session(&Catalog::builtin(), &journal.config(), &journal).unwrap();
        assert_eq!(result.final_snapshot_hash, session.snapshot_hash());
        assert_eq!(result.battles, session.battles());
    }
}
