use anyhow::{Result, bail};
use clap::Parser;
use legends_core::combat::{BattleAction, BattleView, EquipChoice, PartyCommander};
use legends_core::equipment::EquipSlot;
use legends_core::{
    Catalog, CharacterId, Direction, ItemId, Session, SessionCommand, SessionConfig,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

const PARTY: [&str; 3] = ["Gaerdal_Ironhand", "Sehanine_Monnbow", "Reign_Havoc"];
const ITEMS: [&str; 5] = ["Sword", "Breastplate", "Healing_Potion", "Ice_Blade", "Luck_Elixir"];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    commands: u32,
    #[arg(long, default_value_t = 8)]
    size: usize,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

struct RandomCommander {
    rng: ChaCha8Rng,
}

impl RandomCommander {
    fn pick(&mut self, len: usize) -> Option<usize> {
        // Occasionally back out or answer out of range.
        match self.rng.next_u64() % 10 {
            0 => None,
            1 => Some(len),
            _ => Some(self.rng.next_u64() as usize % len.max(1)),
        }
    }
}

impl PartyCommander for RandomCommander {
    fn choose_action(&mut self, _view: &BattleView<'_>, _hero: CharacterId) -> BattleAction {
        choose(
            &mut self.rng,
            &[
                BattleAction::Attack,
                BattleAction::Attack,
                BattleAction::Attack,
                BattleAction::CastSpell,
                BattleAction::UsePotion,
                BattleAction::ChangeEquipment,
            ],
        )
    }

    fn choose_target(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        targets: &[CharacterId],
    ) -> Option<usize> {
        self.pick(targets.len())
    }

    fn choose_spell(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        spells: &[ItemId],
    ) -> Option<usize> {
        self.pick(spells.len())
    }

    fn choose_potion(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        potions: &[ItemId],
    ) -> Option<usize> {
        self.pick(potions.len())
    }

    fn choose_equip(
        &mut self,
        _view: &BattleView<'_>,
        _hero: CharacterId,
        options: &[EquipChoice],
    ) -> Option<usize> {
        self.pick(options.len())
    }
}

fn random_command(rng: &mut ChaCha8Rng) -> SessionCommand {
    let hero = rng.next_u64() as usize % PARTY.len();
    let item = choose(rng, &ITEMS).to_string();
    match rng.next_u64() % 12 {
        0 => SessionCommand::Purchase { hero, item },
        1 => SessionCommand::Sell { hero, item },
        2 => SessionCommand::UsePotion { hero, item },
        3 => SessionCommand::Equip { hero, item },
        4 => SessionCommand::Unequip { hero, slot: choose(rng, &[EquipSlot::Weapon, EquipSlot::Armor]) },
        _ => SessionCommand::Move(choose(rng, &Direction::ALL)),
    }
}

fn check_invariants(session: &Session) -> Result<()> {
    if !session.grid().is_accessible(session.position()) {
        bail!("Invariant failed: party inside an inaccessible cell");
    }
    if session.roster().len() != session.party().len() {
        bail!("Invariant failed: monsters left on the roster after battle");
    }
    for &id in session.party() {
        let character = &session.roster()[id];
        if character.hp() < 0.0 || character.hp() > character.max_hp() {
            bail!("Invariant failed: HP {} outside [0, {}]", character.hp(), character.max_hp());
        }
        let Some(hero) = character.hero() else {
            bail!("Invariant failed: party member is not a hero");
        };
        if hero.mana() < 0.0 || hero.mana() > character.max_mana() {
            bail!("Invariant failed: mana {} outside [0, {}]", hero.mana(), character.max_mana());
        }
        if hero.gold < 0.0 {
            bail!("Invariant failed: negative gold");
        }
        for (item_id, item) in hero.inventory.iter() {
            if hero.inventory.is_equipped(item_id) && item.is_broken() {
                bail!("Invariant failed: broken {} still equipped", item.name);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting Fuzz harness on seed {} for max {} commands...", args.seed, args.commands);
    let catalog = Catalog::builtin();
    let config = SessionConfig::new(args.seed, args.size, &PARTY);
    let mut session = Session::new(config, &catalog)?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut commander = RandomCommander { rng: ChaCha8Rng::seed_from_u64(args.seed ^ 0x5eed) };

    let mut rejected = 0u32;
    for issued in 0..args.commands {
        if session.is_over() {
            println!("Session over after {issued} commands and {} battles", session.battles());
            break;
        }
        let command = random_command(&mut rng);
        if session.execute(&command, &mut commander).is_err() {
            rejected += 1;
        }
        check_invariants(&session)?;
    }

    println!(
        "Fuzzing completed successfully: {} steps, {} battles, {rejected} rejected commands.",
        session.steps(),
        session.battles()
    );
    Ok(())
}
