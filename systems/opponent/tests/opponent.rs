use std::time::Duration;

use turf_core::{ActionMode, CellCoord, Command, Difficulty, Event, Faction, UnitKind};
use turf_system_opponent::{best_attack_target, Config, Opponent};
use turf_world::{self as world, query, World, WorldConfig};

fn spawn_opponent_unit(world: &mut World, kind: UnitKind, cell: CellCoord) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnUnitAtCell {
            kind,
            cell,
            faction: Faction::Opponent,
            mode: ActionMode::Collect,
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::UnitSpawned { .. }]));
}

fn decide(opponent: &mut Opponent, world: &World, dt: Duration) -> Vec<Command> {
    let mut commands = Vec::new();
    opponent.handle(
        dt,
        &query::territory_view(world),
        &query::unit_view(world),
        &mut commands,
    );
    commands
}

#[test]
fn equal_seeds_make_equal_decisions() {
    let mut world = World::new();
    spawn_opponent_unit(&mut world, UnitKind::Balanced, CellCoord::new(2, 10));
    spawn_opponent_unit(&mut world, UnitKind::Forager, CellCoord::new(5, 11));

    for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
        let mut first = Opponent::new(Config::new(difficulty, 0x5eed));
        let mut second = Opponent::new(Config::new(difficulty, 0x5eed));
        for _ in 0..40 {
            let dt = Duration::from_millis(750);
            assert_eq!(
                decide(&mut first, &world, dt),
                decide(&mut second, &world, dt)
            );
        }
        assert_eq!(first.ledger(), second.ledger());
    }
}

#[test]
fn hard_assault_units_always_attack_best_target() {
    let mut world = World::new();
    let unit = CellCoord::new(4, 10);
    spawn_opponent_unit(&mut world, UnitKind::Assault, unit);
    let best = best_attack_target(&query::territory_view(&world)).expect("player cells");

    let mut opponent = Opponent::new(Config::new(Difficulty::Hard, 99));
    let commands = decide(&mut opponent, &world, Duration::from_millis(16));
    let id = query::unit_view(&world).iter().next().map(|unit| unit.id).expect("unit");
    assert_eq!(
        commands,
        vec![
            Command::SetUnitMode {
                unit: id,
                mode: ActionMode::Attack,
            },
            Command::SetUnitTarget {
                unit: id,
                cell: best,
            },
        ]
    );
}

fn first_unit(world: &World) -> turf_core::UnitId {
    query::unit_view(world)
        .iter()
        .next()
        .map(|unit| unit.id)
        .expect("unit")
}

#[test]
fn hard_balanced_units_attack_when_player_holds_much_ground() {
    // Two of four rows belong to the player.
    let config = WorldConfig::with_grid(2, 4);
    let mut world = World::with_config(config).expect("valid config");
    spawn_opponent_unit(&mut world, UnitKind::Balanced, CellCoord::new(0, 3));
    let territory = query::territory_view(&world);
    assert!(territory.share(Faction::Player) > turf_system_opponent::AGGRESSION_SHARE);
    let best = best_attack_target(&territory).expect("player cells");
    let id = first_unit(&world);

    for seed in 0..32 {
        let mut opponent = Opponent::new(Config::new(Difficulty::Hard, seed));
        assert_eq!(
            decide(&mut opponent, &world, Duration::from_millis(16)),
            vec![
                Command::SetUnitMode {
                    unit: id,
                    mode: ActionMode::Attack,
                },
                Command::SetUnitTarget {
                    unit: id,
                    cell: best,
                },
            ],
            "seed {seed}"
        );
    }
}

#[test]
fn hard_balanced_units_roll_when_player_holds_little_ground() {
    let mut world = World::new();
    spawn_opponent_unit(&mut world, UnitKind::Balanced, CellCoord::new(2, 10));
    let territory = query::territory_view(&world);
    assert!(territory.share(Faction::Player) <= turf_system_opponent::AGGRESSION_SHARE);
    let best = best_attack_target(&territory).expect("player cells");

    let mut modes = Vec::new();
    for seed in 0..64 {
        let mut opponent = Opponent::new(Config::new(Difficulty::Hard, seed));
        let commands = decide(&mut opponent, &world, Duration::from_millis(16));
        let [Command::SetUnitMode { mode, .. }, Command::SetUnitTarget { cell, .. }] =
            commands.as_slice()
        else {
            panic!("expected a mode and a target, got {commands:?}");
        };
        match mode {
            ActionMode::Attack => assert_eq!(*cell, best),
            ActionMode::Collect => {
                assert_eq!(territory.owner(*cell), Some(Faction::Opponent));
            }
        }
        modes.push(*mode);
    }
    assert!(modes.contains(&ActionMode::Attack));
    assert!(modes.contains(&ActionMode::Collect));
}

#[test]
fn easy_orders_only_retarget_to_random_cells() {
    let mut world = World::new();
    spawn_opponent_unit(&mut world, UnitKind::Balanced, CellCoord::new(2, 10));
    spawn_opponent_unit(&mut world, UnitKind::Assault, CellCoord::new(6, 11));

    for seed in 0..16 {
        let mut opponent = Opponent::new(Config::new(Difficulty::Easy, seed));
        let commands = decide(&mut opponent, &world, Duration::from_millis(16));
        assert_eq!(commands.len(), 2, "seed {seed}: {commands:?}");
        for command in &commands {
            let Command::SetUnitTarget { cell, .. } = command else {
                panic!("easy opponent changed more than the target: {command:?}");
            };
            assert!(query::cell(&world, *cell).is_some());
        }
    }
}

#[test]
fn normal_assault_units_always_attack_best_target() {
    let mut world = World::new();
    spawn_opponent_unit(&mut world, UnitKind::Assault, CellCoord::new(4, 10));
    let best = best_attack_target(&query::territory_view(&world)).expect("player cells");
    let id = first_unit(&world);

    for seed in 0..32 {
        let mut opponent = Opponent::new(Config::new(Difficulty::Normal, seed));
        assert_eq!(
            decide(&mut opponent, &world, Duration::from_millis(16)),
            vec![
                Command::SetUnitMode {
                    unit: id,
                    mode: ActionMode::Attack,
                },
                Command::SetUnitTarget {
                    unit: id,
                    cell: best,
                },
            ],
            "seed {seed}"
        );
    }
}

#[test]
fn hard_foragers_collect_while_poor() {
    let mut world = World::new();
    spawn_opponent_unit(&mut world, UnitKind::Forager, CellCoord::new(0, 11));
    let territory = query::territory_view(&world);

    // Spawn commands are never applied, so the ledger drains while the view stays fixed.
    let mut opponent = Opponent::new(Config::new(Difficulty::Hard, 4));
    let mut poor_rounds = 0;
    for _ in 0..120 {
        let commands = decide(&mut opponent, &world, Duration::from_secs(1));
        let modes: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                Command::SetUnitMode { mode, .. } => Some(*mode),
                _ => None,
            })
            .collect();
        if modes.is_empty() || opponent.ledger().balance() >= 20 {
            continue;
        }
        poor_rounds += 1;
        assert_eq!(modes, vec![ActionMode::Collect]);
        let target = commands.iter().find_map(|command| match command {
            Command::SetUnitTarget { cell, .. } => Some(*cell),
            _ => None,
        });
        assert_eq!(
            target.and_then(|cell| territory.owner(cell)),
            Some(Faction::Opponent)
        );
    }
    assert!(poor_rounds > 0, "ledger never dropped below the reserve");
}

#[test]
fn opponent_units_spawned_by_policy_enter_world() {
    let mut world = World::new();
    let mut opponent = Opponent::new(Config::new(Difficulty::Hard, 21));
    let commands = decide(&mut opponent, &world, Duration::from_secs(7));

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(query::unit_view(&world).owned_by(Faction::Opponent).count(), 1);
    let spawned = events
        .iter()
        .find_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("spawn event");
    let snapshot = query::unit(&world, spawned).expect("unit");
    let cell = query::cell_at_position(&world, snapshot.position).expect("on grid");
    assert_eq!(
        query::cell(&world, cell).map(|cell| cell.owner()),
        Some(Faction::Opponent)
    );
}
