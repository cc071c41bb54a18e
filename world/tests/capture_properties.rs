use std::time::Duration;

use proptest::prelude::*;
use turf_core::{ActionMode, CellCoord, Command, Faction, UnitKind};
use turf_world::{self as world, query, territory::TerritoryCell, World};

fn faction() -> impl Strategy<Value = Faction> {
    prop_oneof![
        Just(Faction::Neutral),
        Just(Faction::Player),
        Just(Faction::Opponent),
    ]
}

fn kind() -> impl Strategy<Value = UnitKind> {
    prop_oneof![
        Just(UnitKind::Balanced),
        Just(UnitKind::Assault),
        Just(UnitKind::Forager),
    ]
}

proptest! {
    #[test]
    fn capture_progress_stays_in_unit_interval(
        claims in prop::collection::vec((prop::num::f64::ANY, faction()), 0..64)
    ) {
        let mut cell = TerritoryCell::new(CellCoord::new(0, 0));
        for (amount, candidate) in claims {
            let previous = cell.owner();
            let captured = cell.progress_capture(amount, candidate);
            let progress = cell.capture_progress();
            prop_assert!((0.0..=1.0).contains(&progress), "progress {progress}");
            if captured {
                prop_assert_eq!(cell.owner(), candidate);
                prop_assert_ne!(previous, candidate);
                prop_assert_eq!(progress, 0.0);
            }
        }
    }

    #[test]
    fn scripted_battles_keep_cells_consistent(
        orders in prop::collection::vec(
            (kind(), 0u32..8, 0u32..12, any::<bool>(), 1u64..2_000),
            1..24,
        )
    ) {
        let mut world = World::new();
        let total = query::territory_view(&world).len();

        for (kind, column, row, attack, millis) in orders {
            let mut events = Vec::new();
            let faction = if row < 6 { Faction::Player } else { Faction::Opponent };
            let home = if faction == Faction::Player {
                CellCoord::new(column, 0)
            } else {
                CellCoord::new(column, 11)
            };
            let mode = if attack { ActionMode::Attack } else { ActionMode::Collect };
            world::apply(
                &mut world,
                Command::SpawnUnitAtCell { kind, cell: home, faction, mode },
                &mut events,
            );
            if let Some(unit) = query::unit_view(&world).iter().last().map(|unit| unit.id) {
                world::apply(
                    &mut world,
                    Command::SetUnitTarget { unit, cell: CellCoord::new(column, row) },
                    &mut events,
                );
            }
            world::apply(
                &mut world,
                Command::Tick { dt: Duration::from_millis(millis) },
                &mut events,
            );

            let grid = query::grid(&world);
            for cell in grid.iter() {
                prop_assert!((0.0..=1.0).contains(&cell.capture_progress()));
            }
            let view = query::territory_view(&world);
            prop_assert_eq!(
                view.count(Faction::Player) + view.count(Faction::Opponent) + view.count(Faction::Neutral),
                total
            );
        }
    }
}
