//! One playthrough: the board, the party, movement, encounters, and the market.
//! This module exists to own the shared mutable state and lend it to the generator
//! and the combat engine one operation at a time.
//! It does not pick moves; callers pass directions and a `PartyCommander`.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use xxhash_rust::xxh3::Xxh3;

use crate::catalog::Catalog;
use crate::character::{Character, Roster};
use crate::combat::{
    BattleReport, CombatEngine, EquipChoice, PartyCommander, actions::living, apply_equip_choice,
};
use crate::equipment::{EquipSlot, Item};
use crate::error::{ActionError, CombatError, MoveError, SessionError};
use crate::{market, progression};
use crate::rng::{GameRng, RandomSource};
use crate::rules::Rules;
use crate::types::{
    AbortReason, BattleOutcome, CharacterId, Direction, ItemId, LogEvent, Pos, TerrainKind,
};
use crate::world::{ENTRY, TerrainGrid, WorldGenerator};

pub const MAX_PARTY_SIZE: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub seed: u64,
    pub board_size: usize,
    /// Hero template names, at most `MAX_PARTY_SIZE`.
    pub party: Vec<String>,
    #[serde(default)]
    pub rules: Rules,
}

impl SessionConfig {
    pub fn new(seed: u64, board_size: usize, party: &[&str]) -> Self {
        Self {
            seed,
            board_size,
            party: party.iter().map(|name| name.to_string()).collect(),
            rules: Rules::default(),
        }
    }
}

/// A caller input that is not a battle prompt answer. Items are named so the
/// command can be stored and replayed against a fresh session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Move(Direction),
    UsePotion { hero: usize, item: String },
    Equip { hero: usize, item: String },
    Unequip { hero: usize, slot: EquipSlot },
    Purchase { hero: usize, item: String },
    Sell { hero: usize, item: String },
    /// Closes the session; later moves are refused.
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Moved,
    Market,
    Battle(BattleReport),
}

pub struct Session {
    seed: u64,
    rules: Rules,
    catalog: Catalog,
    grid: TerrainGrid,
    roster: Roster,
    party: Vec<CharacterId>,
    position: Pos,
    rng: GameRng,
    log: Vec<LogEvent>,
    steps: u64,
    battles: u32,
    ended: bool,
}

impl Session {
    pub fn new(config: SessionConfig, catalog: &Catalog) -> Result<Self, SessionError> {
        let SessionConfig { seed, board_size, party: names, rules } = config;
        if names.is_empty() || names.len() > MAX_PARTY_SIZE {
            return Err(SessionError::PartySize { got: names.len(), max: MAX_PARTY_SIZE });
        }
        if catalog.monsters.is_empty() {
            return Err(CombatError::EmptyMonsterCatalog.into());
        }

        let mut roster = Roster::with_key();
        let mut party = Vec::with_capacity(names.len());
        for name in &names {
            let template =
                catalog.hero(name).ok_or_else(|| SessionError::UnknownHeroTemplate(name.clone()))?;
            party.push(roster.insert(Character::new_hero(template)));
        }

        let mut rng = GameRng::seed_from_u64(seed);
        let world = WorldGenerator::new(&mut rng, &rules).generate_with_report(board_size)?;
        let mut grid = world.grid;
        grid.place_hero(ENTRY, party.first().copied())?;

        info!(seed, board_size, party = names.len(), "session started");
        Ok(Self {
            seed,
            rules,
            catalog: catalog.clone(),
            grid,
            roster,
            party,
            position: ENTRY,
            rng,
            log: vec![LogEvent::WorldGenerated {
                attempts: world.attempts,
                used_fallback: world.used_fallback,
            }],
            steps: 0,
            battles: 0,
            ended: false,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn party(&self) -> &[CharacterId] {
        &self.party
    }

    pub fn hero(&self, index: usize) -> Option<&Character> {
        self.party.get(index).and_then(|&id| self.roster.get(id))
    }

    pub fn position(&self) -> Pos {
        self.position
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn battles(&self) -> u32 {
        self.battles
    }

    /// Over once the caller ends it or every hero is down. Quitting a battle
    /// leaves the party where it stood, so the caller can keep going or call `end`.
    pub fn is_over(&self) -> bool {
        self.ended || living(&self.roster, &self.party).is_empty()
    }

    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.log.push(LogEvent::SessionEnded { steps: self.steps, battles: self.battles });
        info!(steps = self.steps, battles = self.battles, "session ended");
    }

    pub fn step(
        &mut self,
        direction: Direction,
        commander: &mut dyn PartyCommander,
    ) -> Result<StepOutcome, MoveError> {
        if self.is_over() {
            return Err(MoveError::SessionOver);
        }
        let target = self.position.step(direction);
        if !self.grid.in_bounds(target) {
            return Err(MoveError::OffBoard);
        }
        if !self.grid.is_accessible(target) {
            return Err(MoveError::Blocked);
        }

        let leader = self.party.first().copied();
        self.grid.place_hero(self.position, None).map_err(|_| MoveError::OffBoard)?;
        self.grid.place_hero(target, leader).map_err(|_| MoveError::OffBoard)?;
        self.position = target;
        self.steps += 1;
        self.log.push(LogEvent::PartyMoved { to: target });
        debug!(y = target.y, x = target.x, "party moved");

        match self.grid.terrain_at(target) {
            Ok(TerrainKind::Market) => {
                self.log.push(LogEvent::MarketEntered { at: target });
                Ok(StepOutcome::Market)
            }
            Ok(TerrainKind::Open) if self.rng.chance(self.rules.encounter_chance) => {
                self.log.push(LogEvent::EncounterTriggered { at: target });
                let report = self.run_encounter(commander)?;
                Ok(StepOutcome::Battle(report))
            }
            _ => Ok(StepOutcome::Moved),
        }
    }

    fn run_encounter(
        &mut self,
        commander: &mut dyn PartyCommander,
    ) -> Result<BattleReport, MoveError> {
        let report = CombatEngine::new(&self.rules, &mut self.rng, &mut self.log).run_battle(
            &mut self.roster,
            &self.party,
            &self.catalog.monsters,
            commander,
        )?;
        self.battles += 1;
        if report.outcome == BattleOutcome::Aborted(AbortReason::Quit) {
            debug!(rounds = report.rounds, "party withdrew from battle");
        }
        Ok(report)
    }

    fn member(&self, hero: usize) -> Result<CharacterId, SessionError> {
        self.party.get(hero).copied().ok_or(SessionError::UnknownPartyMember(hero))
    }

    /// First item in the hero's inventory carrying `name`.
    pub fn find_item(&self, hero: usize, name: &str) -> Option<ItemId> {
        let id = self.party.get(hero)?;
        let state = self.roster.get(*id)?.hero()?;
        state.inventory.iter().find(|(_, item)| item.name == name).map(|(id, _)| id)
    }

    fn named_item(&self, hero: usize, name: &str) -> Result<ItemId, SessionError> {
        self.find_item(hero, name)
            .ok_or_else(|| SessionError::ItemNotCarried { hero, item: name.to_string() })
    }

    fn at_market(&self) -> bool {
        self.grid.terrain_at(self.position) == Ok(TerrainKind::Market)
    }

    /// Highest level in the party, fainted heroes included.
    pub fn party_level(&self) -> u32 {
        self.party
            .iter()
            .filter_map(|&id| self.roster.get(id))
            .map(Character::level)
            .max()
            .unwrap_or(1)
    }

    /// Goods on sale where the party stands. Empty away from a market.
    pub fn market_stock(&self) -> Vec<&Item> {
        if !self.at_market() {
            return Vec::new();
        }
        market::stock(&self.catalog, self.seed, self.position, self.party_level())
    }

    pub fn use_potion(&mut self, hero: usize, item: ItemId) -> Result<(), SessionError> {
        let id = self.member(hero)?;
        let character = self.roster.get_mut(id).ok_or(ActionError::NotAHero)?;
        if character.is_defeated() {
            return Err(ActionError::HeroDefeated.into());
        }
        let used = character.use_potion(item)?;
        self.log.push(LogEvent::PotionUsed { hero: id, potion: used.name });
        Ok(())
    }

    pub fn equip(&mut self, hero: usize, choice: EquipChoice) -> Result<(), SessionError> {
        let id = self.member(hero)?;
        let character = self.roster.get_mut(id).ok_or(ActionError::NotAHero)?;
        let event = apply_equip_choice(character, id, choice)?;
        self.log.push(event);
        Ok(())
    }

    pub fn purchase(&mut self, hero: usize, item_name: &str) -> Result<ItemId, SessionError> {
        let id = self.member(hero)?;
        if !self.at_market() {
            return Err(ActionError::NotAtMarket.into());
        }
        let item = self
            .catalog
            .item(item_name)
            .ok_or_else(|| SessionError::UnknownItemTemplate(item_name.to_string()))?;
        let stock = market::stock(&self.catalog, self.seed, self.position, self.party_level());
        if !stock.iter().any(|stocked| stocked.name == item_name) {
            return Err(ActionError::NotInStock.into());
        }
        let character = self.roster.get_mut(id).ok_or(ActionError::NotAHero)?;
        let bought = progression::purchase(character, item)?;
        self.log.push(LogEvent::ItemPurchased {
            hero: id,
            item: item.name.clone(),
            price: item.price,
        });
        Ok(bought)
    }

    pub fn sell(&mut self, hero: usize, item: ItemId) -> Result<f64, SessionError> {
        let id = self.member(hero)?;
        if !self.at_market() {
            return Err(ActionError::NotAtMarket.into());
        }
        let character = self.roster.get_mut(id).ok_or(ActionError::NotAHero)?;
        let (sold, value) = progression::sell(character, item, &self.rules)?;
        self.log.push(LogEvent::ItemSold { hero: id, item: sold.name, value });
        Ok(value)
    }

    /// Runs a stored command. Movement that starts a battle returns its report.
    pub fn execute(
        &mut self,
        command: &SessionCommand,
        commander: &mut dyn PartyCommander,
    ) -> Result<Option<BattleReport>, SessionError> {
        match command {
            SessionCommand::Move(direction) => match self.step(*direction, commander)? {
                StepOutcome::Battle(report) => Ok(Some(report)),
                StepOutcome::Moved | StepOutcome::Market => Ok(None),
            },
            SessionCommand::UsePotion { hero, item } => {
                let item = self.named_item(*hero, item)?;
                self.use_potion(*hero, item).map(|_| None)
            }
            SessionCommand::Equip { hero, item } => {
                let item = self.named_item(*hero, item)?;
                self.equip(*hero, EquipChoice::Equip(item)).map(|_| None)
            }
            SessionCommand::Unequip { hero, slot } => {
                self.equip(*hero, EquipChoice::Unequip(*slot)).map(|_| None)
            }
            SessionCommand::Purchase { hero, item } => self.purchase(*hero, item).map(|_| None),
            SessionCommand::Sell { hero, item } => {
                let item = self.named_item(*hero, item)?;
                self.sell(*hero, item).map(|_| None)
            }
            SessionCommand::End => {
                self.end();
                Ok(None)
            }
        }
    }

    /// Stable digest of everything a replay must reproduce.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.grid.fingerprint());
        hasher.write_i32(self.position.y);
        hasher.write_i32(self.position.x);
        hasher.write_u64(self.steps);
        hasher.write_u32(self.battles);
        hasher.write_u8(u8::from(self.ended));
        hasher.write_u64(self.log.len() as u64);
        for &id in &self.party {
            if let Some(character) = self.roster.get(id) {
                hash_character(&mut hasher, character);
            }
        }
        hasher.finish()
    }
}

fn hash_character(hasher: &mut Xxh3, character: &Character) {
    hasher.write(character.name().as_bytes());
    hasher.write_u32(character.level());
    hasher.write_u64(character.hp().to_bits());
    let Some(hero) = character.hero() else {
        return;
    };
    hasher.write_u64(hero.mana().to_bits());
    hasher.write_u64(hero.gold.to_bits());
    hasher.write_u32(hero.experience());
    for stat in [hero.strength, hero.agility, hero.dexterity] {
        hasher.write_u64(stat.value().to_bits());
    }
    for (id, item) in hero.inventory.iter() {
        hasher.write(item.name.as_bytes());
        hasher.write_u8(u8::from(hero.inventory.is_equipped(id)));
        if let Some(durability) = item.durability() {
            hasher.write_u64(durability.value().to_bits());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::BattleAction;
    use crate::error::GridError;
    use crate::test_support::ScriptCommander;

    fn session(seed: u64) -> Session {
        let config = SessionConfig::new(seed, 8, &["Gaerdal_Ironhand", "Parzival"]);
        Session::new(config, &Catalog::builtin()).unwrap()
    }

    fn blank_board(session: &mut Session, terrain: TerrainKind) {
        let size = session.grid.width();
        session.grid = TerrainGrid::filled(size, size, terrain);
    }

    fn stocks(session: &Session, pos: Pos, name: &str) -> bool {
        market::stock(&session.catalog, session.seed, pos, session.party_level())
            .iter()
            .any(|item| item.name == name)
    }

    /// Turns every cell into a market and stands on one that sells everything in `wanted`.
    fn shop_for(session: &mut Session, wanted: &[&str]) {
        blank_board(session, TerrainKind::Market);
        let pos = session
            .grid
            .positions()
            .find(|&pos| wanted.iter().all(|name| stocks(session, pos, name)))
            .expect("some market should stock every wanted item");
        session.position = pos;
    }

    #[test]
    fn party_size_is_checked() {
        let catalog = Catalog::builtin();
        let empty = SessionConfig::new(1, 8, &[]);
        assert_eq!(
            Session::new(empty, &catalog).err(),
            Some(SessionError::PartySize { got: 0, max: 3 })
        );
        let crowded = SessionConfig::new(
            1,
            8,
            &["Gaerdal_Ironhand", "Parzival", "Reign_Havoc", "Garl_Glittergold"],
        );
        assert_eq!(
            Session::new(crowded, &catalog).err(),
            Some(SessionError::PartySize { got: 4, max: 3 })
        );
    }

    #[test]
    fn unknown_templates_and_sizes_are_rejected() {
        let catalog = Catalog::builtin();
        let stranger = SessionConfig::new(1, 8, &["Nobody"]);
        assert_eq!(
            Session::new(stranger, &catalog).err(),
            Some(SessionError::UnknownHeroTemplate("Nobody".to_string()))
        );
        let tiny = SessionConfig::new(1, 3, &["Parzival"]);
        assert_eq!(
            Session::new(tiny, &catalog).err(),
            Some(SessionError::Grid(GridError::InvalidSize(3)))
        );
    }

    #[test]
    fn new_session_starts_at_the_entry() {
        let session = session(5);
        assert_eq!(session.position(), ENTRY);
        assert_eq!(session.grid().cell(ENTRY).unwrap().hero, Some(session.party()[0]));
        assert!(matches!(session.log()[0], LogEvent::WorldGenerated { .. }));
        assert!(!session.is_over());
    }

    #[test]
    fn moves_off_the_board_or_into_walls_are_refused() {
        let mut session = session(5);
        let mut commander = ScriptCommander::default();
        assert_eq!(session.step(Direction::North, &mut commander), Err(MoveError::OffBoard));
        assert_eq!(session.step(Direction::West, &mut commander), Err(MoveError::OffBoard));

        session.grid.set_terrain(Pos { y: 0, x: 1 }, TerrainKind::Blocked).unwrap();
        assert_eq!(session.step(Direction::East, &mut commander), Err(MoveError::Blocked));
        assert_eq!(session.position(), ENTRY);
        assert_eq!(session.steps(), 0);
    }

    #[test]
    fn markets_never_start_battles() {
        let mut session = session(11);
        blank_board(&mut session, TerrainKind::Market);
        let mut commander = ScriptCommander::default();
        for _ in 0..6 {
            assert_eq!(session.step(Direction::East, &mut commander), Ok(StepOutcome::Market));
        }
        assert_eq!(session.battles(), 0);
        assert_eq!(session.grid().cell(session.position()).unwrap().hero, Some(session.party()[0]));
        assert_eq!(session.grid().cell(ENTRY).unwrap().hero, None);
    }

    #[test]
    fn open_ground_eventually_starts_a_battle() {
        let mut session = session(11);
        blank_board(&mut session, TerrainKind::Open);
        let mut commander = ScriptCommander::default();
        let mut battles = 0;
        for step in 0..40 {
            let direction = if (step / 7) % 2 == 0 { Direction::East } else { Direction::West };
            let direction = if step % 7 == 6 { Direction::South } else { direction };
            match session.step(direction, &mut commander) {
                Ok(StepOutcome::Battle(_)) => battles += 1,
                Ok(_) | Err(MoveError::OffBoard) => {}
                Err(other) => panic!("unexpected move error {other:?}"),
            }
            if session.is_over() {
                break;
            }
        }
        assert!(battles > 0);
        assert_eq!(session.battles(), battles);
        // Spawned monsters are cleaned up after every battle.
        assert_eq!(session.roster().len(), 2);
    }

    #[test]
    fn quitting_a_battle_leaves_the_session_to_the_caller() {
        let mut session = session(3);
        blank_board(&mut session, TerrainKind::Open);
        session.rules.encounter_chance = 1.0;
        let mut commander = ScriptCommander::new(vec![BattleAction::Quit; 4]);
        let before: Vec<f64> = (0..2).map(|index| session.hero(index).unwrap().hp()).collect();

        let Ok(StepOutcome::Battle(report)) = session.step(Direction::East, &mut commander) else {
            panic!("open ground should start a battle");
        };
        assert_eq!(report.outcome, BattleOutcome::Aborted(AbortReason::Quit));
        assert!(!session.is_over());
        let after: Vec<f64> = (0..2).map(|index| session.hero(index).unwrap().hp()).collect();
        assert_eq!(after, before);
        assert_eq!(session.roster().len(), 2);

        assert!(matches!(session.step(Direction::East, &mut commander), Ok(StepOutcome::Battle(_))));
        assert_eq!(session.position(), Pos { y: 0, x: 2 });

        assert_eq!(session.execute(&SessionCommand::End, &mut commander), Ok(None));
        assert!(session.is_over());
        assert_eq!(session.log().last(), Some(&LogEvent::SessionEnded { steps: 2, battles: 2 }));
        assert_eq!(session.step(Direction::South, &mut commander), Err(MoveError::SessionOver));
    }

    #[test]
    fn market_trades_require_a_market_cell() {
        let mut session = session(9);
        blank_board(&mut session, TerrainKind::Open);
        assert_eq!(
            session.purchase(0, "Sword"),
            Err(SessionError::Action(ActionError::NotAtMarket))
        );

        blank_board(&mut session, TerrainKind::Market);
        assert_eq!(
            session.purchase(0, "Excalibur"),
            Err(SessionError::UnknownItemTemplate("Excalibur".to_string()))
        );
        assert_eq!(session.purchase(5, "Sword"), Err(SessionError::UnknownPartyMember(5)));

        let bare = session.grid.positions().find(|&pos| !stocks(&session, pos, "Sword")).unwrap();
        session.position = bare;
        assert_eq!(session.purchase(0, "Sword"), Err(SessionError::Action(ActionError::NotInStock)));

        shop_for(&mut session, &["Sword"]);
        assert!(session.market_stock().iter().any(|item| item.name == "Sword"));
        let preview = session
            .market_stock()
            .into_iter()
            .find(|item| item.min_level > 1)
            .map(|item| item.name.clone())
            .unwrap();
        assert!(matches!(
            session.purchase(0, &preview),
            Err(SessionError::Action(ActionError::LevelTooLow { level: 1, .. }))
        ));

        let sword = session.purchase(0, "Sword").unwrap();
        assert_eq!(session.hero(0).unwrap().hero().unwrap().gold, 854.0);
        assert_eq!(session.sell(0, sword), Ok(250.0));
        assert_eq!(session.hero(0).unwrap().hero().unwrap().gold, 1104.0);
        assert!(matches!(session.log().last(), Some(LogEvent::ItemSold { value, .. }) if *value == 250.0));
    }

    #[test]
    fn commands_name_items_in_the_inventory() {
        let mut session = session(9);
        shop_for(&mut session, &["Healing_Potion", "Sword"]);
        let mut commander = ScriptCommander::default();
        let buy = SessionCommand::Purchase { hero: 0, item: "Healing_Potion".to_string() };
        session.execute(&buy, &mut commander).unwrap();

        let drink = SessionCommand::UsePotion { hero: 0, item: "Healing_Potion".to_string() };
        assert_eq!(session.execute(&drink, &mut commander), Ok(None));
        assert_eq!(
            session.execute(&drink, &mut commander),
            Err(SessionError::ItemNotCarried { hero: 0, item: "Healing_Potion".to_string() })
        );

        let buy = SessionCommand::Purchase { hero: 1, item: "Sword".to_string() };
        session.execute(&buy, &mut commander).unwrap();
        let equip = SessionCommand::Equip { hero: 1, item: "Sword".to_string() };
        session.execute(&equip, &mut commander).unwrap();
        assert_eq!(
            session.execute(&equip, &mut commander),
            Err(SessionError::Action(ActionError::AlreadyEquipped))
        );
        let unequip = SessionCommand::Unequip { hero: 1, slot: EquipSlot::Weapon };
        session.execute(&unequip, &mut commander).unwrap();
        assert_eq!(
            session.execute(&unequip, &mut commander),
            Err(SessionError::Action(ActionError::NothingEquipped))
        );
    }

    #[test]
    fn defeated_heroes_cannot_drink() {
        let mut session = session(9);
        shop_for(&mut session, &["Healing_Potion"]);
        let potion = session.purchase(0, "Healing_Potion").unwrap();
        let id = session.party()[0];
        session.roster.get_mut(id).unwrap().apply_damage(10_000.0);
        assert_eq!(
            session.use_potion(0, potion),
            Err(SessionError::Action(ActionError::HeroDefeated))
        );
    }

    #[test]
    fn snapshot_hash_tracks_state() {
        let mut first = session(21);
        let second = session(21);
        assert_eq!(first.snapshot_hash(), second.snapshot_hash());

        shop_for(&mut first, &["Dagger"]);
        let before = first.snapshot_hash();
        first.purchase(0, "Dagger").unwrap();
        assert_ne!(first.snapshot_hash(), before);
    }
}
