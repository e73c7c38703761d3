use legends_core::world::generate_lane_board;
use legends_core::{
    AutoPilot, Catalog, Direction, GameRng, InputJournal, LaneAction, LaneSession,
    RecordingCommander, Rules, Session, SessionCommand, SessionConfig, TerrainKind,
    replay_session,
};

const PARTY: [&str; 3] = ["Gaerdal_Ironhand", "Sehanine_Monnbow", "Parzival"];
const MAX_COMMANDS: usize = 300;

/// A boustrophedon sweep of the board with a shopping stop on every market.
fn script(session: &Session, step: usize) -> SessionCommand {
    let here = session.grid().terrain_at(session.position()).unwrap();
    let level = session.party_level();
    if here == TerrainKind::Market
        && step % 3 == 0
        && let Some(item) = session.market_stock().into_iter().find(|item| item.min_level <= level)
    {
        return SessionCommand::Purchase { hero: step % PARTY.len(), item: item.name.clone() };
    }
    let direction = match step % 16 {
        0..=6 => Direction::East,
        7 | 15 => Direction::South,
        _ => Direction::West,
    };
    SessionCommand::Move(direction)
}

fn play(seed: u64) -> (Session, InputJournal) {
    let catalog = Catalog::builtin();
    let config = SessionConfig::new(seed, 8, &PARTY);
    let mut session = Session::new(config.clone(), &catalog).expect("session should start");
    let mut recorder =
        RecordingCommander::new(AutoPilot::default(), InputJournal::new(&config, &catalog));
    for step in 0..MAX_COMMANDS {
        if session.is_over() {
            break;
        }
        let command = script(&session, step);
        recorder.record_command(command.clone());
        let _ = session.execute(&command, &mut recorder);
    }
    (session, recorder.into_journal())
}

#[test]
fn identical_seeds_produce_identical_logs_and_hashes() {
    let (left, left_journal) = play(12345);
    let (right, right_journal) = play(12345);

    assert_eq!(left.log(), right.log(), "same seed should produce the same event log");
    assert_eq!(left.snapshot_hash(), right.snapshot_hash());
    assert_eq!(left_journal, right_journal);
}

#[test]
fn different_seeds_produce_different_hashes() {
    let (left, _) = play(123);
    let (right, _) = play(456);
    assert_ne!(
        left.grid().fingerprint(),
        right.grid().fingerprint(),
        "different seeds should lay out different boards"
    );
    assert_ne!(left.snapshot_hash(), right.snapshot_hash());
}

#[test]
fn recorded_journal_replays_to_the_same_hash() {
    for seed in [1, 2, 3] {
        let (session, journal) = play(seed);
        let config = journal.config();
        assert_eq!(config, SessionConfig::new(seed, 8, &PARTY));

        // The journal is plain data: it survives a JSON round trip unchanged.
        let text = serde_json::to_string(&journal).unwrap();
        let journal: InputJournal = serde_json::from_str(&text).unwrap();

        let result = replay_session(&Catalog::builtin(), &config, &journal).expect("replay failed");
        assert_eq!(result.final_snapshot_hash, session.snapshot_hash(), "seed {seed}");
        assert_eq!(result.steps, session.steps());
        assert_eq!(result.battles, session.battles());
    }
}

#[test]
fn lane_board_depends_only_on_its_stream() {
    let first = generate_lane_board(&mut GameRng::stream(77, 1));
    let again = generate_lane_board(&mut GameRng::stream(77, 1));
    let other = generate_lane_board(&mut GameRng::stream(77, 2));
    assert_eq!(first.fingerprint(), again.fingerprint());
    assert_ne!(first.fingerprint(), other.fingerprint());
}

/// Every hero pushes north, clearing or striking whatever is in the way.
fn push_north(seed: u64) -> LaneSession {
    let mut lanes = LaneSession::new(seed, &PARTY, Rules::default(), &Catalog::builtin()).unwrap();
    while !lanes.is_over() && lanes.round() <= 80 {
        for hero in 0..lanes.party_len() {
            if lanes.is_over() || lanes.hero_position(hero).is_none() {
                continue;
            }
            let options = [
                LaneAction::Attack(0),
                LaneAction::Clear(Direction::North),
                LaneAction::Move(Direction::North),
                LaneAction::Pass,
            ];
            // Rejected actions leave the turn unspent, so the first legal option is taken.
            for action in options {
                if lanes.act(hero, action).is_ok() {
                    break;
                }
            }
        }
        if !lanes.is_over() {
            lanes.end_round().unwrap();
        }
    }
    lanes
}

#[test]
fn lane_game_replays_exactly_from_its_seed() {
    for seed in [3, 14, 15] {
        let first = push_north(seed);
        let again = push_north(seed);
        assert_eq!(first.log(), again.log());
        assert_eq!(first.outcome(), again.outcome());
        assert_eq!(first.grid().fingerprint(), again.grid().fingerprint());
    }
}
