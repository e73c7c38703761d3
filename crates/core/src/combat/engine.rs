//! Battle state machine.
//! This module exists to sequence turns and apply their effects to the roster.
//! It does not perform I/O; every decision comes through `PartyCommander`.

use tracing::{debug, info, warn};

use super::actions::{
    BattleAction, BattleView, EquipChoice, PartyCommander, equip_options, living,
    potion_options, spell_options,
};
use super::resolve;
use crate::catalog::MonsterTemplate;
use crate::character::{Character, Roster};
use crate::equipment::{EquipSlot, Item};
use crate::error::{ActionError, CombatError};
use crate::progression::{self, RewardPool};
use crate::rng::RandomSource;
use crate::rules::Rules;
use crate::types::{AbortReason, BattleOutcome, CharacterId, LogEvent, MonsterKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    Spawning,
    HeroesTurn,
    VictoryCheck,
    MonstersTurn,
    DefeatCheck,
    Regeneration,
    Terminal(BattleOutcome),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnedMonster {
    pub id: CharacterId,
    pub name: String,
    pub kind: MonsterKind,
    pub level: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    pub rounds: u32,
    /// Spawned monsters. Their ids are gone from the roster once the battle ends.
    pub monsters: Vec<SpawnedMonster>,
    pub rewards: Option<RewardPool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    TurnUsed,
    Free,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TurnEnd {
    Done,
    Quit,
}

struct Battle<'r> {
    roster: &'r mut Roster,
    party: &'r [CharacterId],
    monsters: Vec<CharacterId>,
    spawned: Vec<SpawnedMonster>,
    round: u32,
}

impl Battle<'_> {
    fn view(&self) -> BattleView<'_> {
        BattleView {
            roster: self.roster,
            party: self.party,
            monsters: &self.monsters,
            round: self.round,
        }
    }

    fn living_monsters(&self) -> Vec<CharacterId> {
        living(self.roster, &self.monsters)
    }

    fn living_heroes(&self) -> Vec<CharacterId> {
        living(self.roster, self.party)
    }
}

pub struct CombatEngine<'a> {
    rules: &'a Rules,
    rng: &'a mut dyn RandomSource,
    log: &'a mut Vec<LogEvent>,
}

impl<'a> CombatEngine<'a> {
    pub fn new(rules: &'a Rules, rng: &'a mut dyn RandomSource, log: &'a mut Vec<LogEvent>) -> Self {
        Self { rules, rng, log }
    }

    /// Runs one battle to a terminal state. Spawned monsters never outlive the call.
    pub fn run_battle(
        &mut self,
        roster: &mut Roster,
        party: &[CharacterId],
        monster_catalog: &[MonsterTemplate],
        commander: &mut dyn PartyCommander,
    ) -> Result<BattleReport, CombatError> {
        validate(roster, party, monster_catalog)?;

        let mut battle =
            Battle { roster, party, monsters: Vec::new(), spawned: Vec::new(), round: 0 };
        let mut phase = BattlePhase::Spawning;
        let outcome = loop {
            debug!(?phase, round = battle.round, "battle phase");
            phase = match phase {
                BattlePhase::Spawning => {
                    self.spawn(&mut battle, monster_catalog);
                    BattlePhase::HeroesTurn
                }
                BattlePhase::HeroesTurn => match self.heroes_turn(&mut battle, commander) {
                    TurnEnd::Done => BattlePhase::VictoryCheck,
                    TurnEnd::Quit => BattlePhase::Terminal(BattleOutcome::Aborted(AbortReason::Quit)),
                },
                BattlePhase::VictoryCheck => {
                    if battle.living_monsters().is_empty() {
                        BattlePhase::Terminal(BattleOutcome::Victory)
                    } else {
                        BattlePhase::MonstersTurn
                    }
                }
                BattlePhase::MonstersTurn => {
                    self.monsters_turn(&mut battle);
                    BattlePhase::DefeatCheck
                }
                BattlePhase::DefeatCheck => {
                    if battle.living_heroes().is_empty() {
                        BattlePhase::Terminal(BattleOutcome::Defeat)
                    } else {
                        BattlePhase::Regeneration
                    }
                }
                BattlePhase::Regeneration => {
                    self.regenerate(&mut battle);
                    if battle.round >= self.rules.max_rounds {
                        BattlePhase::Terminal(BattleOutcome::Aborted(AbortReason::RoundLimit))
                    } else {
                        BattlePhase::HeroesTurn
                    }
                }
                BattlePhase::Terminal(outcome) => break outcome,
            };
        };

        let rewards = self.finish(&mut battle, outcome);
        Ok(BattleReport { outcome, rounds: battle.round, monsters: battle.spawned, rewards })
    }

    fn spawn(&mut self, battle: &mut Battle<'_>, catalog: &[MonsterTemplate]) {
        let mut target_level = 1;
        let mut standing = 0;
        for &id in battle.party {
            let Some(character) = battle.roster.get_mut(id) else {
                continue;
            };
            target_level = target_level.max(character.level());
            character.reset_boosts();
            let defeated = character.is_defeated();
            if let Some(hero) = character.hero_mut() {
                // Heroes already down when the battle starts count as fainted in it.
                hero.fainted_in_battle = defeated;
            }
            if !defeated {
                standing += 1;
            }
        }

        for _ in 0..standing {
            let Some(template) = catalog.get(self.rng.below(catalog.len())) else {
                continue;
            };
            let monster = Character::new_monster(template, target_level);
            let name = monster.name().to_string();
            let id = battle.roster.insert(monster);
            battle.monsters.push(id);
            battle.spawned.push(SpawnedMonster {
                id,
                name,
                kind: template.kind,
                level: target_level,
            });
            self.log.push(LogEvent::MonsterSpawned {
                monster: id,
                kind: template.kind,
                level: target_level,
            });
        }
    }

    fn heroes_turn(
        &mut self,
        battle: &mut Battle<'_>,
        commander: &mut dyn PartyCommander,
    ) -> TurnEnd {
        battle.round += 1;
        let party = battle.party;
        for &hero in party {
            if battle.living_monsters().is_empty() {
                break;
            }
            if battle.roster.get(hero).is_none_or(Character::is_defeated) {
                continue;
            }
            if self.hero_turn(battle, hero, commander) == TurnEnd::Quit {
                return TurnEnd::Quit;
            }
        }
        TurnEnd::Done
    }

    fn hero_turn(
        &mut self,
        battle: &mut Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> TurnEnd {
        let mut free_actions = 0;
        while free_actions < self.rules.max_actions_per_turn {
            let action = commander.choose_action(&battle.view(), hero);
            let result = match action {
                BattleAction::Attack => self.attack(battle, hero, commander),
                BattleAction::CastSpell => self.cast_spell(battle, hero, commander),
                BattleAction::UsePotion => self.use_potion(battle, hero, commander),
                BattleAction::ChangeEquipment => self.change_equipment(battle, hero, commander),
                BattleAction::Quit => return TurnEnd::Quit,
            };
            match result {
                Ok(Step::TurnUsed) => return TurnEnd::Done,
                Ok(Step::Free) => {}
                Err(reason) => self.log.push(LogEvent::ActionRejected { hero, reason }),
            }
            free_actions += 1;
        }

        warn!(?hero, free_actions, "forfeiting turn after too many free actions");
        self.log.push(LogEvent::TurnForfeited { hero });
        TurnEnd::Done
    }

    fn pick_target(
        &mut self,
        battle: &Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> Result<Option<CharacterId>, ActionError> {
        let targets = battle.living_monsters();
        if targets.is_empty() {
            return Err(ActionError::NoTarget);
        }
        match commander.choose_target(&battle.view(), hero, &targets) {
            Some(pick) => targets.get(pick).copied().map(Some).ok_or(ActionError::NoTarget),
            None => Ok(None),
        }
    }

    fn attack(
        &mut self,
        battle: &mut Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> Result<Step, ActionError> {
        let Some(target) = self.pick_target(battle, hero, commander)? else {
            return Ok(Step::Free);
        };
        let attacker = battle.roster.get(hero).and_then(Character::hero).ok_or(ActionError::NotAHero)?;
        let (strength, weapon) = (attacker.strength.value(), attacker.inventory.weapon_damage());
        let defender =
            battle.roster.get(target).and_then(Character::monster).ok_or(ActionError::NoTarget)?;
        let (defense, dodge) = (defender.defense, defender.dodge_chance);

        if self.rng.chance(resolve::monster_dodge_chance(dodge, self.rules)) {
            self.log.push(LogEvent::AttackDodged { attacker: hero, defender: target });
            return Ok(Step::TurnUsed);
        }
        let damage = resolve::hero_attack_damage(strength, weapon, defense, self.rules);
        self.strike(battle.roster, hero, target, damage);
        Ok(Step::TurnUsed)
    }

    fn cast_spell(
        &mut self,
        battle: &mut Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> Result<Step, ActionError> {
        let spells = spell_options(battle.roster, hero);
        if spells.is_empty() {
            return Err(ActionError::NoneAvailable);
        }
        let Some(pick) = commander.choose_spell(&battle.view(), hero, &spells) else {
            return Ok(Step::Free);
        };
        let spell_id = spells.get(pick).copied().ok_or(ActionError::UnknownItem)?;

        let caster = battle.roster.get(hero).and_then(Character::hero).ok_or(ActionError::NotAHero)?;
        let spell = caster
            .inventory
            .get(spell_id)
            .and_then(Item::as_spell)
            .cloned()
            .ok_or(ActionError::UnknownItem)?;
        let (mana, dexterity) = (caster.mana(), caster.dexterity.value());
        if mana < spell.mana_cost {
            return Err(ActionError::InsufficientMana { needed: spell.mana_cost, available: mana });
        }

        let Some(target) = self.pick_target(battle, hero, commander)? else {
            return Ok(Step::Free);
        };

        if let Some(caster) = battle.roster.get_mut(hero) {
            caster.spend_mana(spell.mana_cost)?;
            if let Some(state) = caster.hero_mut() {
                state.inventory.remove(spell_id);
            }
        }

        let damage = resolve::spell_damage(spell.damage, dexterity, self.rules);
        let Some(monster) = battle.roster.get_mut(target) else {
            return Err(ActionError::NoTarget);
        };
        let dealt = monster.apply_damage(damage);
        self.log.push(LogEvent::SpellCast {
            caster: hero,
            target,
            element: spell.element,
            damage: dealt,
        });
        if monster.is_defeated() {
            self.log.push(LogEvent::CharacterDefeated { character: target });
        } else if let Some(state) = monster.monster_mut() {
            state.weaken(spell.element, self.rules.debuff_fraction);
            self.log.push(LogEvent::DebuffApplied { target, element: spell.element });
        }
        Ok(Step::TurnUsed)
    }

    fn use_potion(
        &mut self,
        battle: &mut Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> Result<Step, ActionError> {
        let potions = potion_options(battle.roster, hero);
        if potions.is_empty() {
            return Err(ActionError::NoneAvailable);
        }
        let Some(pick) = commander.choose_potion(&battle.view(), hero, &potions) else {
            return Ok(Step::Free);
        };
        let potion = potions.get(pick).copied().ok_or(ActionError::UnknownItem)?;
        let character = battle.roster.get_mut(hero).ok_or(ActionError::NotAHero)?;
        let used = character.use_potion(potion)?;
        self.log.push(LogEvent::PotionUsed { hero, potion: used.name });
        Ok(Step::Free)
    }

    fn change_equipment(
        &mut self,
        battle: &mut Battle<'_>,
        hero: CharacterId,
        commander: &mut dyn PartyCommander,
    ) -> Result<Step, ActionError> {
        let options = equip_options(battle.roster, hero);
        if options.is_empty() {
            return Err(ActionError::NoneAvailable);
        }
        let Some(pick) = commander.choose_equip(&battle.view(), hero, &options) else {
            return Ok(Step::Free);
        };
        let choice = options.get(pick).copied().ok_or(ActionError::UnknownItem)?;
        let character = battle.roster.get_mut(hero).ok_or(ActionError::NotAHero)?;
        let event = apply_equip_choice(character, hero, choice)?;
        self.log.push(event);
        Ok(Step::Free)
    }

    fn strike(&mut self, roster: &mut Roster, attacker: CharacterId, defender: CharacterId, damage: f64) {
        let Some(target) = roster.get_mut(defender) else {
            return;
        };
        let dealt = target.apply_damage(damage);
        self.log.push(LogEvent::AttackHit { attacker, defender, damage: dealt });
        if target.is_defeated() {
            if let Some(hero) = target.hero_mut() {
                hero.fainted_in_battle = true;
            }
            self.log.push(LogEvent::CharacterDefeated { character: defender });
        }
    }

    fn monsters_turn(&mut self, battle: &mut Battle<'_>) {
        for monster in battle.living_monsters() {
            let heroes = battle.living_heroes();
            if heroes.is_empty() {
                break;
            }
            let Some(&target) = heroes.get(self.rng.below(heroes.len())) else {
                continue;
            };
            let base_damage = battle
                .roster
                .get(monster)
                .and_then(Character::monster)
                .map_or(0.0, |state| state.base_damage);
            let (agility, armor) = battle
                .roster
                .get(target)
                .and_then(Character::hero)
                .map_or((0.0, 0.0), |hero| (hero.agility.value(), hero.inventory.armor_reduction()));

            if self.rng.chance(resolve::hero_dodge_chance(agility, self.rules)) {
                self.log.push(LogEvent::AttackDodged { attacker: monster, defender: target });
                continue;
            }
            let damage = resolve::monster_attack_damage(base_damage, armor, self.rules);
            self.wear(battle.roster, target, EquipSlot::Armor, self.rules.armor_wear);
            self.strike(battle.roster, monster, target, damage);
        }
    }

    /// Broken gear comes off as soon as it breaks.
    fn wear(&mut self, roster: &mut Roster, id: CharacterId, slot: EquipSlot, step: f64) {
        let Some(hero) = roster.get_mut(id).and_then(Character::hero_mut) else {
            return;
        };
        hero.inventory.wear(slot, step);
        for item in hero.inventory.unequip_broken() {
            self.log.push(LogEvent::EquipmentBroke { hero: id, item });
        }
    }

    fn regenerate(&mut self, battle: &mut Battle<'_>) {
        for &id in battle.party {
            let Some(character) = battle.roster.get_mut(id) else {
                continue;
            };
            if character.is_defeated() {
                continue;
            }
            character.regenerate(self.rules.regeneration_factor);
            self.wear(battle.roster, id, EquipSlot::Weapon, self.rules.weapon_wear);
        }
        self.log.push(LogEvent::RoundCompleted { round: battle.round });
    }

    fn finish(&mut self, battle: &mut Battle<'_>, outcome: BattleOutcome) -> Option<RewardPool> {
        let rewards = (outcome == BattleOutcome::Victory).then(|| {
            for &id in battle.party {
                let Some(character) = battle.roster.get_mut(id) else {
                    continue;
                };
                if character.hero().is_some_and(|hero| hero.fainted_in_battle) {
                    character.revive();
                    self.log.push(LogEvent::HeroRevived { hero: id });
                }
            }
            let pool = RewardPool::from_monster_levels(
                battle.spawned.iter().map(|monster| monster.level),
                self.rules,
            );
            progression::distribute(battle.roster, battle.party, pool, self.log);
            pool
        });

        for id in battle.monsters.drain(..) {
            battle.roster.remove(id);
        }
        self.log.push(LogEvent::BattleEnded { outcome, rounds: battle.round });
        info!(?outcome, rounds = battle.round, "battle finished");
        rewards
    }
}

/// Applies an equip or unequip and returns the event describing it.
pub(crate) fn apply_equip_choice(
    character: &mut Character,
    id: CharacterId,
    choice: EquipChoice,
) -> Result<LogEvent, ActionError> {
    let hero = character.hero_mut().ok_or(ActionError::NotAHero)?;
    match choice {
        EquipChoice::Equip(item) => {
            let name = hero.inventory.get(item).ok_or(ActionError::UnknownItem)?.name.clone();
            hero.inventory.equip(item)?;
            Ok(LogEvent::ItemEquipped { hero: id, item: name })
        }
        EquipChoice::Unequip(slot) => {
            let name =
                hero.inventory.equipped(slot).ok_or(ActionError::NothingEquipped)?.name.clone();
            hero.inventory.unequip(slot)?;
            Ok(LogEvent::ItemUnequipped { hero: id, item: name })
        }
    }
}

fn validate(
    roster: &Roster,
    party: &[CharacterId],
    monster_catalog: &[MonsterTemplate],
) -> Result<(), CombatError> {
    if party.is_empty() {
        return Err(CombatError::EmptyParty);
    }
    if let Some(&unknown) = party.iter().find(|&&id| !roster.get(id).is_some_and(Character::is_hero)) {
        return Err(CombatError::UnknownHero(unknown));
    }
    if monster_catalog.is_empty() {
        return Err(CombatError::EmptyMonsterCatalog);
    }
    if living(roster, party).is_empty() {
        return Err(CombatError::PartyWipedOut);
    }
    Ok(())
}
