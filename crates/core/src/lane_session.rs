//! Three-lane skirmish on the fixed lane board.
//! Each hero holds a lane and acts once per round. Monsters march south down
//! their lane and strike any hero next to them. The heroes win by reaching the
//! monster nexus; the monsters win by reaching the hero nexus.
//! There is no market, no potion use, and no spellcasting in this mode.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, MonsterTemplate};
use crate::character::{Character, Roster};
use crate::combat::resolve;
use crate::equipment::EquipSlot;
use crate::error::{CombatError, GridError, LaneError, SessionError};
use crate::progression::{self, RewardPool};
use crate::rng::{GameRng, RandomSource};
use crate::rules::Rules;
use crate::types::{CharacterId, Direction, LaneOutcome, LogEvent, Pos};
use crate::world::TerrainGrid;
use crate::world::lanes::{
    HERO_NEXUS_ROW, LANE_COUNT, MONSTER_NEXUS_ROW, generate_lane_board, hero_spawn, lane_of_column,
    monster_spawn,
};

const LANE_BOARD_STREAM: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneAction {
    Move(Direction),
    /// Breaks the obstacle next to the hero without moving.
    Clear(Direction),
    /// Index into `targets_in_range`.
    Attack(usize),
    /// Joins the party member at this index, landing beside them in their lane.
    Teleport(usize),
    /// Back to the hero's own spawn cell.
    Recall,
    Pass,
}

#[derive(Clone, Copy, Debug)]
struct LaneHero {
    id: CharacterId,
    /// `None` while the hero is down or waiting for a free spawn.
    pos: Option<Pos>,
    lane: usize,
    acted: bool,
}

pub struct LaneSession {
    rules: Rules,
    monster_catalog: Vec<MonsterTemplate>,
    grid: TerrainGrid,
    roster: Roster,
    heroes: Vec<LaneHero>,
    monsters: Vec<(CharacterId, Pos)>,
    rng: GameRng,
    log: Vec<LogEvent>,
    round: u32,
    outcome: Option<LaneOutcome>,
}

impl LaneSession {
    /// One hero per lane, in party order, plus an opening wave of monsters.
    pub fn new(
        seed: u64,
        party: &[&str],
        rules: Rules,
        catalog: &Catalog,
    ) -> Result<Self, SessionError> {
        if party.is_empty() || party.len() > LANE_COUNT {
            return Err(SessionError::PartySize { got: party.len(), max: LANE_COUNT });
        }
        if catalog.monsters.is_empty() {
            return Err(CombatError::EmptyMonsterCatalog.into());
        }

        let mut grid = generate_lane_board(&mut GameRng::stream(seed, LANE_BOARD_STREAM));
        let mut roster = Roster::with_key();
        let mut heroes = Vec::with_capacity(party.len());
        for (lane, name) in party.iter().enumerate() {
            let template = catalog
                .hero(name)
                .ok_or_else(|| SessionError::UnknownHeroTemplate(name.to_string()))?;
            let spawn = hero_spawn(lane)
                .ok_or(SessionError::PartySize { got: party.len(), max: LANE_COUNT })?;
            let id = roster.insert(Character::new_hero(template));
            grid.place_hero(spawn, Some(id))?;
            heroes.push(LaneHero { id, pos: Some(spawn), lane, acted: false });
        }

        let mut session = Self {
            rules,
            monster_catalog: catalog.monsters.clone(),
            grid,
            roster,
            heroes,
            monsters: Vec::new(),
            rng: GameRng::seed_from_u64(seed),
            log: Vec::new(),
            round: 1,
            outcome: None,
        };
        session.spawn_wave()?;
        info!(seed, party = party.len(), "lane game started");
        Ok(session)
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn outcome(&self) -> Option<LaneOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn party_len(&self) -> usize {
        self.heroes.len()
    }

    pub fn hero(&self, index: usize) -> Option<&Character> {
        self.heroes.get(index).and_then(|slot| self.roster.get(slot.id))
    }

    pub fn hero_position(&self, index: usize) -> Option<Pos> {
        self.heroes.get(index).and_then(|slot| slot.pos)
    }

    pub fn monsters(&self) -> &[(CharacterId, Pos)] {
        &self.monsters
    }

    /// Monsters in the eight cells around the hero, in row-major order.
    pub fn targets_in_range(&self, hero: usize) -> Vec<CharacterId> {
        let Some(at) = self.hero_position(hero) else {
            return Vec::new();
        };
        let mut targets: Vec<(Pos, CharacterId)> = self
            .monsters
            .iter()
            .filter(|(_, pos)| in_reach(at, *pos))
            .map(|&(id, pos)| (pos, id))
            .collect();
        targets.sort_by_key(|(pos, _)| (pos.y, pos.x));
        targets.into_iter().map(|(_, id)| id).collect()
    }

    pub fn act(&mut self, hero: usize, action: LaneAction) -> Result<(), LaneError> {
        if self.is_over() {
            return Err(LaneError::GameOver);
        }
        let slot = *self.heroes.get(hero).ok_or(LaneError::UnknownHero(hero))?;
        let from = slot.pos.ok_or(LaneError::HeroDown)?;
        if slot.acted {
            return Err(LaneError::AlreadyActed);
        }

        match action {
            LaneAction::Move(direction) => self.advance(hero, from, direction)?,
            LaneAction::Clear(direction) => {
                let at = from.step(direction);
                if !self.grid.in_bounds(at) {
                    return Err(LaneError::OffBoard);
                }
                if !self.grid.destroy_obstacle(at)? {
                    return Err(LaneError::NoObstacle);
                }
                self.log.push(LogEvent::ObstacleCleared { hero: slot.id, at });
            }
            LaneAction::Attack(index) => {
                let target =
                    self.targets_in_range(hero).get(index).copied().ok_or(LaneError::NoTarget)?;
                self.strike(slot.id, target)?;
            }
            LaneAction::Teleport(other) => self.teleport(hero, other)?,
            LaneAction::Recall => {
                let spawn = hero_spawn(slot.lane).ok_or(LaneError::SpawnBlocked)?;
                if spawn != from {
                    if self.grid.cell(spawn)?.hero.is_some() {
                        return Err(LaneError::SpawnBlocked);
                    }
                    self.relocate(hero, spawn)?;
                    self.log.push(LogEvent::HeroRecalled { hero: slot.id, to: spawn });
                }
            }
            LaneAction::Pass => {}
        }

        if let Some(lane_hero) = self.heroes.get_mut(hero) {
            lane_hero.acted = true;
        }
        if self.hero_position(hero).is_some_and(|pos| pos.y == MONSTER_NEXUS_ROW) {
            self.decide(LaneOutcome::HeroesWin);
        }
        Ok(())
    }

    fn advance(&mut self, hero: usize, from: Pos, direction: Direction) -> Result<(), LaneError> {
        let to = from.step(direction);
        if !self.grid.in_bounds(to) {
            return Err(LaneError::OffBoard);
        }
        let lane = self.heroes.get(hero).map_or(usize::MAX, |slot| slot.lane);
        // A monster in the hero's lane holds every row beyond its own.
        let held = self.monsters.iter().any(|&(id, at)| {
            self.roster.get(id).and_then(Character::monster).and_then(|state| state.lane)
                == Some(lane)
                && at.y <= from.y
                && to.y < at.y
        });
        if held {
            return Err(LaneError::ZoneOfControl);
        }
        if !self.grid.is_accessible(to) {
            return Err(LaneError::Blocked);
        }
        if self.grid.cell(to)?.hero.is_some() {
            return Err(LaneError::Occupied);
        }
        self.relocate(hero, to)
    }

    fn teleport(&mut self, hero: usize, other: usize) -> Result<(), LaneError> {
        let slot = *self.heroes.get(hero).ok_or(LaneError::UnknownHero(hero))?;
        let partner = *self.heroes.get(other).ok_or(LaneError::UnknownHero(other))?;
        if other == hero || partner.lane == slot.lane {
            return Err(LaneError::SameLane);
        }
        let anchor = partner.pos.ok_or(LaneError::HeroDown)?;
        let landing = [Direction::West, Direction::East, Direction::South]
            .into_iter()
            .map(|direction| anchor.step(direction))
            .find(|&at| self.is_free(at))
            .ok_or(LaneError::NoRoom)?;

        self.relocate(hero, landing)?;
        if let Some(lane_hero) = self.heroes.get_mut(hero) {
            lane_hero.lane = partner.lane;
        }
        self.log.push(LogEvent::HeroTeleported { hero: slot.id, to: landing });
        Ok(())
    }

    fn is_free(&self, at: Pos) -> bool {
        self.grid.is_accessible(at)
            && self.grid.cell(at).is_ok_and(|cell| cell.hero.is_none() && cell.monster.is_none())
    }

    /// Moves the hero and swaps the terrain boost for the one under the new cell.
    fn relocate(&mut self, hero: usize, to: Pos) -> Result<(), LaneError> {
        let Some(slot) = self.heroes.get_mut(hero) else {
            return Err(LaneError::UnknownHero(hero));
        };
        let id = slot.id;
        if let Some(from) = slot.pos.replace(to) {
            self.grid.place_hero(from, None)?;
        }
        self.grid.place_hero(to, Some(id))?;
        self.log.push(LogEvent::HeroMoved { hero: id, to });

        let Some(character) = self.roster.get_mut(id) else {
            return Ok(());
        };
        character.reset_boosts();
        let boosted = self.grid.terrain_at(to)?.boosted_stat();
        let base = boosted.and_then(|stat| character.hero().and_then(|state| state.stat(stat)));
        if let (Some(stat), Some(value)) = (boosted, base) {
            let amount = value.base * self.rules.terrain_boost;
            character.add_boost(stat, amount);
            self.log.push(LogEvent::TerrainBoosted { hero: id, stat, amount });
        }
        Ok(())
    }

    fn strike(&mut self, attacker: CharacterId, target: CharacterId) -> Result<(), LaneError> {
        let (strength, weapon) = self
            .roster
            .get(attacker)
            .and_then(Character::hero)
            .map_or((0.0, 0.0), |hero| (hero.strength.value(), hero.inventory.weapon_damage()));
        let Some((defense, dodge)) = self
            .roster
            .get(target)
            .and_then(Character::monster)
            .map(|state| (state.defense, state.dodge_chance))
        else {
            return Ok(());
        };

        if self.rng.chance(resolve::monster_dodge_chance(dodge, &self.rules)) {
            self.log.push(LogEvent::AttackDodged { attacker, defender: target });
            return Ok(());
        }
        let damage = resolve::hero_attack_damage(strength, weapon, defense, &self.rules);
        let (dealt, defeated) = match self.roster.get_mut(target) {
            Some(monster) => (monster.apply_damage(damage), monster.is_defeated()),
            None => return Ok(()),
        };
        self.log.push(LogEvent::AttackHit { attacker, defender: target, damage: dealt });
        if defeated {
            self.slay(attacker, target)?;
        }
        Ok(())
    }

    /// The killer alone collects the bounty.
    fn slay(&mut self, killer: CharacterId, monster: CharacterId) -> Result<(), LaneError> {
        self.log.push(LogEvent::CharacterDefeated { character: monster });
        if let Some(index) = self.monsters.iter().position(|&(id, _)| id == monster) {
            let (_, at) = self.monsters.remove(index);
            self.grid.place_monster(at, None)?;
        }
        if let Some(slain) = self.roster.remove(monster) {
            let pool = RewardPool::from_monster_levels([slain.level()], &self.rules);
            progression::distribute(&mut self.roster, &[killer], pool, &mut self.log);
        }
        Ok(())
    }

    /// Monsters strike or march, heroes recover, and a new wave may arrive.
    /// Returns the outcome once the game is decided.
    pub fn end_round(&mut self) -> Result<Option<LaneOutcome>, LaneError> {
        if self.is_over() {
            return Err(LaneError::GameOver);
        }

        self.monsters_turn()?;
        if self.outcome.is_some() {
            return Ok(self.outcome);
        }
        self.recover()?;
        self.log.push(LogEvent::RoundCompleted { round: self.round });
        if self.rules.lane_spawn_interval > 0 && self.round % self.rules.lane_spawn_interval == 0 {
            self.spawn_wave()?;
        }

        self.round += 1;
        for slot in &mut self.heroes {
            slot.acted = false;
        }
        Ok(None)
    }

    fn monsters_turn(&mut self) -> Result<(), LaneError> {
        for index in 0..self.monsters.len() {
            let Some(&(monster, at)) = self.monsters.get(index) else {
                break;
            };
            let target = self
                .heroes
                .iter()
                .enumerate()
                .filter_map(|(slot, hero)| hero.pos.map(|pos| (slot, pos)))
                .filter(|&(_, pos)| in_reach(at, pos))
                .min_by_key(|&(_, pos)| (pos.y, pos.x))
                .map(|(slot, _)| slot);

            if let Some(slot) = target {
                self.monster_strike(monster, slot)?;
                continue;
            }
            let ahead = at.step(Direction::South);
            if self.grid.in_bounds(ahead)
                && self.grid.is_accessible(ahead)
                && self.grid.cell(ahead)?.monster.is_none()
            {
                self.grid.place_monster(at, None)?;
                self.grid.place_monster(ahead, Some(monster))?;
                if let Some(entry) = self.monsters.get_mut(index) {
                    entry.1 = ahead;
                }
                self.log.push(LogEvent::MonsterAdvanced { monster, to: ahead });
                if ahead.y == HERO_NEXUS_ROW {
                    self.decide(LaneOutcome::MonstersWin);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn monster_strike(&mut self, monster: CharacterId, slot: usize) -> Result<(), LaneError> {
        let Some(hero) = self.heroes.get(slot).copied() else {
            return Ok(());
        };
        let base_damage =
            self.roster.get(monster).and_then(Character::monster).map_or(0.0, |state| state.base_damage);
        let (agility, armor) = self
            .roster
            .get(hero.id)
            .and_then(Character::hero)
            .map_or((0.0, 0.0), |state| (state.agility.value(), state.inventory.armor_reduction()));

        if self.rng.chance(resolve::hero_dodge_chance(agility, &self.rules)) {
            self.log.push(LogEvent::AttackDodged { attacker: monster, defender: hero.id });
            return Ok(());
        }
        let damage = resolve::monster_attack_damage(base_damage, armor, &self.rules);
        let Some(character) = self.roster.get_mut(hero.id) else {
            return Ok(());
        };
        let dealt = character.apply_damage(damage);
        let defeated = character.is_defeated();
        if let Some(state) = character.hero_mut() {
            state.inventory.wear(EquipSlot::Armor, self.rules.armor_wear);
            for item in state.inventory.unequip_broken() {
                self.log.push(LogEvent::EquipmentBroke { hero: hero.id, item });
            }
        }
        self.log.push(LogEvent::AttackHit { attacker: monster, defender: hero.id, damage: dealt });

        if defeated {
            self.log.push(LogEvent::CharacterDefeated { character: hero.id });
            if let Some(pos) = hero.pos {
                self.grid.place_hero(pos, None)?;
            }
            if let Some(lane_hero) = self.heroes.get_mut(slot) {
                lane_hero.pos = None;
            }
            debug!(hero = ?hero.id, "hero fell in the lanes");
        }
        Ok(())
    }

    /// Standing heroes regenerate. Fallen ones revive at their spawn, or wait a
    /// round if someone else is standing on it.
    fn recover(&mut self) -> Result<(), LaneError> {
        for index in 0..self.heroes.len() {
            let Some(slot) = self.heroes.get(index).copied() else {
                break;
            };
            let Some(character) = self.roster.get_mut(slot.id) else {
                continue;
            };
            if slot.pos.is_some() {
                character.regenerate(self.rules.regeneration_factor);
                continue;
            }
            let Some(spawn) = hero_spawn(slot.lane) else {
                continue;
            };
            if self.grid.cell(spawn)?.hero.is_some() {
                continue;
            }
            if character.is_defeated() {
                character.revive();
                self.log.push(LogEvent::HeroRevived { hero: slot.id });
            }
            self.relocate(index, spawn)?;
            self.log.push(LogEvent::HeroRecalled { hero: slot.id, to: spawn });
        }
        Ok(())
    }

    /// One monster per lane at the monster nexus, leveled to the strongest hero.
    fn spawn_wave(&mut self) -> Result<(), GridError> {
        let level = self
            .heroes
            .iter()
            .filter_map(|slot| self.roster.get(slot.id))
            .map(Character::level)
            .max()
            .unwrap_or(1);
        for lane in 0..LANE_COUNT {
            let Some(spawn) = monster_spawn(lane) else {
                continue;
            };
            if self.grid.cell(spawn)?.monster.is_some() {
                self.log.push(LogEvent::LaneSpawnBlocked { lane });
                continue;
            }
            let pick = self.rng.below(self.monster_catalog.len());
            let Some(template) = self.monster_catalog.get(pick) else {
                continue;
            };
            let mut monster = Character::new_monster(template, level);
            if let Some(state) = monster.monster_mut() {
                state.lane = lane_of_column(spawn.x as usize);
            }
            let kind = template.kind;
            let id = self.roster.insert(monster);
            self.grid.place_monster(spawn, Some(id))?;
            self.monsters.push((id, spawn));
            self.log.push(LogEvent::MonsterSpawned { monster: id, kind, level });
        }
        Ok(())
    }

    fn decide(&mut self, outcome: LaneOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.log.push(LogEvent::LaneGameDecided { outcome, rounds: self.round });
        info!(?outcome, rounds = self.round, "lane game decided");
    }
}

/// True for the eight cells around `from`.
fn in_reach(from: Pos, to: Pos) -> bool {
    from != to && (from.y - to.y).abs() <= 1 && (from.x - to.x).abs() <= 1
}
