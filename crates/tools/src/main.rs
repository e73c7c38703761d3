use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legends_core::{
    AutoPilot, Catalog, Direction, InputJournal, LaneAction, LaneSession, RecordingCommander,
    Rules, Session, SessionCommand, SessionConfig, TerrainGrid, TerrainKind, replay_session,
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Catalog JSON to use instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a session with the autopilot and report how it went
    Simulate {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 8)]
        size: usize,
        /// Hero template names, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "Gaerdal_Ironhand,Sehanine_Monnbow")]
        party: Vec<String>,
        #[arg(long, default_value_t = 500)]
        steps: usize,
        /// Rules JSON; missing fields keep their defaults
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write the input journal here
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
    /// Play a lane game where every hero pushes north and fights what it meets
    Lanes {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        /// Hero template names, one per lane, comma separated
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "Gaerdal_Ironhand,Sehanine_Monnbow,Reign_Havoc"
        )]
        party: Vec<String>,
        #[arg(long, default_value_t = 60)]
        rounds: u32,
        /// Rules JSON; missing fields keep their defaults
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Replay a recorded journal and print its final snapshot hash
    Replay {
        /// Path to the journal JSON file to replay
        #[arg(short, long)]
        journal: PathBuf,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {what} JSON"))
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    Catalog::from_json(&text).with_context(|| "Invalid catalog")
}

fn load_rules(path: Option<&Path>) -> Result<Rules> {
    path.map_or_else(|| Ok(Rules::default()), |path| read_json(path, "rules"))
}

/// Sweeps the board row by row and buys a usable potion now and then at markets.
fn next_command(session: &Session, step: usize) -> SessionCommand {
    let party = session.party().len().max(1);
    let level = session.party_level();
    if step % 3 == 0
        && let Some(potion) = session
            .market_stock()
            .into_iter()
            .find(|item| item.min_level <= level && item.as_potion().is_some())
    {
        return SessionCommand::Purchase { hero: step % party, item: potion.name.clone() };
    }
    let width = session.grid().width();
    let lap = 2 * width;
    let direction = match step % lap {
        turn if turn == width - 1 || turn == lap - 1 => Direction::South,
        east if east < width - 1 => Direction::East,
        _ => Direction::West,
    };
    SessionCommand::Move(direction)
}

fn simulate(
    catalog: &Catalog,
    config: SessionConfig,
    steps: usize,
    journal_path: Option<&Path>,
) -> Result<()> {
    let mut session = Session::new(config.clone(), catalog).context("Failed to start session")?;
    let mut recorder =
        RecordingCommander::new(AutoPilot::default(), InputJournal::new(&config, catalog));

    for step in 0..steps {
        if session.is_over() {
            break;
        }
        let command = next_command(&session, step);
        recorder.record_command(command.clone());
        match session.execute(&command, &mut recorder) {
            Ok(Some(report)) => {
                info!(outcome = ?report.outcome, rounds = report.rounds, "battle finished");
            }
            Ok(None) => {}
            Err(error) => warn!(%error, ?command, "command rejected"),
        }
    }

    println!("Simulation complete.");
    println!("Steps: {}", session.steps());
    println!("Battles: {}", session.battles());
    println!("Session over: {}", session.is_over());
    for (index, id) in session.party().iter().enumerate() {
        if let Some(hero) = session.hero(index) {
            println!(
                "Hero {index} ({id:?}): level {} hp {:.1}/{:.1}",
                hero.level(),
                hero.hp(),
                hero.max_hp()
            );
        }
    }
    println!("Snapshot Hash: {}", session.snapshot_hash());

    if let Some(path) = journal_path {
        let text = serde_json::to_string_pretty(recorder.journal())
            .context("Failed to serialize journal")?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write journal file: {}", path.display()))?;
        println!("Journal written to {}", path.display());
    }
    Ok(())
}

/// Strike first, then clear the way north, then walk it.
fn lane_action(lanes: &LaneSession, hero: usize) -> LaneAction {
    if !lanes.targets_in_range(hero).is_empty() {
        return LaneAction::Attack(0);
    }
    let ahead = lanes.hero_position(hero).map(|pos| pos.step(Direction::North));
    match ahead.and_then(|pos| lanes.grid().terrain_at(pos).ok()) {
        Some(TerrainKind::DestructibleObstacle) => LaneAction::Clear(Direction::North),
        _ => LaneAction::Move(Direction::North),
    }
}

fn play_lanes(
    catalog: &Catalog,
    seed: u64,
    party: &[String],
    rounds: u32,
    rules: Rules,
) -> Result<()> {
    let names: Vec<&str> = party.iter().map(String::as_str).collect();
    let mut lanes =
        LaneSession::new(seed, &names, rules, catalog).context("Failed to start lane game")?;
    println!("{}\n", render(lanes.grid()));

    while !lanes.is_over() && lanes.round() <= rounds {
        for hero in 0..lanes.party_len() {
            if lanes.is_over() || lanes.hero_position(hero).is_none() {
                continue;
            }
            let action = lane_action(&lanes, hero);
            if let Err(error) = lanes.act(hero, action) {
                warn!(%error, hero, ?action, "lane action rejected");
                lanes.act(hero, LaneAction::Pass)?;
            }
        }
        if !lanes.is_over() {
            lanes.end_round()?;
        }
    }

    println!("{}\n", render(lanes.grid()));
    match lanes.outcome() {
        Some(outcome) => println!("Outcome: {outcome:?} after {} rounds", lanes.round()),
        None => println!("Undecided after {rounds} rounds"),
    }
    for hero in 0..lanes.party_len() {
        if let Some(character) = lanes.hero(hero) {
            println!(
                "Hero {hero} ({}): level {} hp {:.1}/{:.1}",
                character.name(),
                character.level(),
                character.hp(),
                character.max_hp()
            );
        }
    }
    Ok(())
}

fn glyph(terrain: TerrainKind) -> char {
    match terrain {
        TerrainKind::Open => '.',
        TerrainKind::Blocked => '#',
        TerrainKind::Market => '$',
        TerrainKind::Nexus => 'N',
        TerrainKind::BushBoost => 'b',
        TerrainKind::CaveBoost => 'c',
        TerrainKind::StrengthBoost => 's',
        TerrainKind::DestructibleObstacle => 'o',
    }
}

fn render(grid: &TerrainGrid) -> String {
    let mut out = String::with_capacity(grid.width() * grid.height() + grid.height());
    let mut row = None;
    for pos in grid.positions() {
        if row.is_some_and(|y| y != pos.y) {
            out.push('\n');
        }
        row = Some(pos.y);
        out.push(grid.terrain_at(pos).map_or('?', glyph));
    }
    out
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("legends_core=info")),
        )
        .init();

    let args = Args::parse();
    let catalog = load_catalog(args.catalog.as_deref())?;

    match args.command {
        Command::Simulate { seed, size, party, steps, rules, journal } => {
            let rules = load_rules(rules.as_deref())?;
            let config = SessionConfig { seed, board_size: size, party, rules };
            simulate(&catalog, config, steps, journal.as_deref())
        }
        Command::Lanes { seed, party, rounds, rules } => {
            let rules = load_rules(rules.as_deref())?;
            play_lanes(&catalog, seed, &party, rounds, rules)
        }
        Command::Replay { journal } => {
            let journal: InputJournal = read_json(&journal, "journal")?;
            let result = replay_session(&catalog, &journal.config(), &journal)
                .map_err(|e| anyhow::anyhow!("Replay failed during execution: {:?}", e))?;

            println!("Replay complete.");
            println!("Steps: {}", result.steps);
            println!("Battles: {}", result.battles);
            println!("Session over: {}", result.session_over);
            println!("Snapshot Hash: {}", result.final_snapshot_hash);
            Ok(())
        }
    }
}
