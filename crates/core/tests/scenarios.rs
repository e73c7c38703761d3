use legends_core::character::formulas::hero_max_hp;
use legends_core::progression::{RewardPool, distribute};
use legends_core::rng::FixedRolls;
use legends_core::world::grid::ENTRY;
use legends_core::world::lanes::WALL_COLUMNS;
use legends_core::world::{LANE_BOARD_SIZE, generate_lane_board};
use legends_core::{
    Archetype, BattleOutcome, Catalog, Character, CombatEngine, GameRng, HeroTemplate, LogEvent,
    MonsterKind, MonsterTemplate, Pos, Roster, Rules, TerrainKind, WorldGenerator,
};

fn hero_template(name: &str, archetype: Archetype, strength: f64, agility: f64) -> HeroTemplate {
    HeroTemplate {
        name: name.to_string(),
        archetype,
        mana: 100.0,
        strength,
        agility,
        dexterity: 100.0,
        gold: 0.0,
        experience: 0,
    }
}

#[test]
fn lane_walls_and_nexus_rows_hold_for_every_seed() {
    for seed in 0..64 {
        let board = generate_lane_board(&mut GameRng::seed_from_u64(seed));
        assert_eq!(board.width(), LANE_BOARD_SIZE);
        for pos in board.positions() {
            let terrain = board.terrain_at(pos).unwrap();
            let wall_column = WALL_COLUMNS.contains(&(pos.x as usize));
            assert_eq!(terrain == TerrainKind::Blocked, wall_column, "seed {seed} at {pos:?}");
            let nexus_row = !wall_column && (pos.y == 0 || pos.y == 7);
            assert_eq!(terrain == TerrainKind::Nexus, nexus_row, "seed {seed} at {pos:?}");
        }
    }
}

#[test]
fn open_worlds_stay_connected_for_every_size() {
    let rules = Rules::default();
    for size in 4..=20 {
        for seed in 0..8 {
            let mut rng = GameRng::seed_from_u64(seed);
            let grid = WorldGenerator::new(&mut rng, &rules).generate(size).unwrap();
            assert!(grid.is_connected_from(ENTRY), "size {size} seed {seed}");
            assert!(grid.is_accessible(ENTRY));
        }
    }
}

#[test]
fn warrior_health_grows_with_level() {
    let catalog = Catalog::builtin();
    let mut warrior = Character::new_hero(catalog.hero("Gaerdal_Ironhand").unwrap());
    assert_eq!(warrior.max_hp(), 150.0);
    assert_eq!(warrior.hp(), 150.0);

    // Starts with 7 experience; 3 more reaches the level 1 threshold exactly.
    assert_eq!(warrior.gain_experience(3), 1);
    assert_eq!(warrior.level(), 2);
    assert_eq!(warrior.max_hp(), hero_max_hp(Archetype::Warrior, 2));
    assert_eq!(warrior.max_hp(), 200.0);
    assert_eq!(warrior.hero().unwrap().experience(), 0);

    assert_eq!(warrior.gain_experience(25), 1);
    assert_eq!(warrior.level(), 3);
    assert_eq!(warrior.hero().unwrap().experience(), 5);
}

#[test]
fn mid_rolls_never_dodge_a_slow_hero_or_a_capped_monster() {
    let mut roster = Roster::with_key();
    let hero = roster.insert(Character::new_hero(&hero_template(
        "Slowpoke",
        Archetype::Warrior,
        400.0,
        0.0,
    )));
    let monster = MonsterTemplate {
        name: "Evasive".to_string(),
        kind: MonsterKind::Spirit,
        level: 1,
        damage: 5.0,
        defense: 0.0,
        dodge: 50.0,
    };
    let rules = Rules::default();
    let mut rng = FixedRolls::new(0.5);
    let mut log = Vec::new();
    let mut commander = legends_core::AutoPilot::default();

    let report = CombatEngine::new(&rules, &mut rng, &mut log)
        .run_battle(&mut roster, &[hero], &[monster], &mut commander)
        .unwrap();

    assert_eq!(report.outcome, BattleOutcome::Victory);
    assert!(!log.iter().any(|event| matches!(event, LogEvent::AttackDodged { .. })));
    let hero_hits = log
        .iter()
        .filter(|event| matches!(event, LogEvent::AttackHit { attacker, .. } if *attacker == hero))
        .count();
    // 20 damage a swing against 100 HP.
    assert_eq!(hero_hits, 5);
    let monster_hits = log
        .iter()
        .filter(|event| matches!(event, LogEvent::AttackHit { defender, .. } if *defender == hero))
        .count();
    assert_eq!(monster_hits, 4);
}

#[test]
fn rewards_sum_monster_levels_and_skip_the_fainted() {
    let rules = Rules::default();
    let pool = RewardPool::from_monster_levels([2, 2, 3], &rules);
    assert_eq!(pool, RewardPool { gold: 700.0, experience: 14 });

    let mut roster = Roster::with_key();
    let standing = roster.insert(Character::new_hero(&hero_template(
        "Standing",
        Archetype::Paladin,
        100.0,
        100.0,
    )));
    let fainted = roster.insert(Character::new_hero(&hero_template(
        "Fainted",
        Archetype::Sorcerer,
        100.0,
        100.0,
    )));
    roster[fainted].apply_damage(10_000.0);
    roster[fainted].hero_mut().unwrap().fainted_in_battle = true;
    roster[fainted].revive();

    let mut log = Vec::new();
    distribute(&mut roster, &[standing, fainted], pool, &mut log);

    let paid = roster[standing].hero().unwrap();
    assert_eq!(paid.gold, 700.0);
    // 14 experience: level 1 costs 10, 4 carries.
    assert_eq!(roster[standing].level(), 2);
    assert_eq!(paid.experience(), 4);

    let skipped = roster[fainted].hero().unwrap();
    assert_eq!(skipped.gold, 0.0);
    assert_eq!(skipped.experience(), 0);
    assert_eq!(roster[fainted].hp(), roster[fainted].max_hp() / 2.0);
}

#[test]
fn lane_spawns_sit_on_nexus_rows() {
    use legends_core::world::lanes::{hero_spawn, monster_spawn};
    let board = generate_lane_board(&mut GameRng::seed_from_u64(99));
    for lane in 0..3 {
        let hero = hero_spawn(lane).unwrap();
        let monster = monster_spawn(lane).unwrap();
        assert_eq!(board.terrain_at(hero).unwrap(), TerrainKind::Nexus);
        assert_eq!(board.terrain_at(monster).unwrap(), TerrainKind::Nexus);
        assert_eq!(hero.y, 7);
        assert_eq!(monster, Pos { y: 0, x: monster.x });
    }
    assert_eq!(hero_spawn(3), None);
}
