#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Opponent policy system that decides when to field units and where to send
//! them.
//!
//! The system is pure: it reads immutable territory and unit views, keeps its
//! own ledger and timers, and responds with command batches for the world to
//! execute. All randomness flows from a seeded [`ChaCha8Rng`], so equal seeds
//! and inputs produce equal decisions.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use turf_core::{
    ActionMode, CellCoord, Command, Difficulty, Event, Faction, ResourceLedger, TerritoryView,
    UnitKind, UnitSnapshot, UnitView,
};

/// Balance the opponent starts every game with.
pub const STARTING_RESOURCES: u32 = 30;
/// Player share of the grid above which hard Balanced units go all out.
pub const AGGRESSION_SHARE: f64 = 0.3;
/// Balance below which hard Foragers keep collecting.
pub const FORAGER_RESERVE: u32 = 20;

/// Timer and economy constants of one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyTuning {
    /// Seconds until the first spawn attempt.
    pub first_spawn: f64,
    /// Fixed part of the delay between spawn attempts.
    pub spawn_base: f64,
    /// Upper bound of the uniform jitter added to the spawn delay.
    pub spawn_jitter: f64,
    /// Fixed part of the delay between order rounds.
    pub order_base: f64,
    /// Upper bound of the uniform jitter added to the order delay.
    pub order_jitter: f64,
    /// Resource units gained per second.
    pub accrual_rate: f64,
    /// Chance that a probabilistic order chooses to attack.
    pub attack_probability: f64,
}

impl DifficultyTuning {
    /// Tuning used by the provided tier.
    #[must_use]
    pub const fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                first_spawn: 15.0,
                spawn_base: 12.0,
                spawn_jitter: 6.0,
                order_base: 3.0,
                order_jitter: 2.0,
                accrual_rate: 0.8,
                attack_probability: 0.3,
            },
            Difficulty::Normal => Self {
                first_spawn: 10.0,
                spawn_base: 8.0,
                spawn_jitter: 4.0,
                order_base: 3.0,
                order_jitter: 2.0,
                accrual_rate: 1.0,
                attack_probability: 0.5,
            },
            Difficulty::Hard => Self {
                first_spawn: 7.0,
                spawn_base: 5.0,
                spawn_jitter: 4.0,
                order_base: 3.0,
                order_jitter: 2.0,
                accrual_rate: 1.2,
                attack_probability: 0.7,
            },
        }
    }
}

/// Configuration parameters required to construct the opponent.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    difficulty: Difficulty,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration for the tier and seed.
    #[must_use]
    pub const fn new(difficulty: Difficulty, rng_seed: u64) -> Self {
        Self {
            difficulty,
            rng_seed,
        }
    }
}

/// Automated rival that spawns and orders units on independent timers.
#[derive(Debug)]
pub struct Opponent {
    difficulty: Difficulty,
    tuning: DifficultyTuning,
    ledger: ResourceLedger,
    spawn_timer: f64,
    order_timer: f64,
    rng: ChaCha8Rng,
}

impl Opponent {
    /// Creates an opponent with a full starting balance and fresh timers.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let tuning = DifficultyTuning::for_difficulty(config.difficulty);
        Self {
            difficulty: config.difficulty,
            tuning,
            ledger: ResourceLedger::new(STARTING_RESOURCES, tuning.accrual_rate, 0.0),
            spawn_timer: tuning.first_spawn,
            order_timer: 0.0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Tier the opponent plays at.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Opponent's own resource ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Seconds until the next spawn attempt.
    #[must_use]
    pub const fn spawn_timer(&self) -> f64 {
        self.spawn_timer
    }

    /// Seconds until the next order round.
    #[must_use]
    pub const fn order_timer(&self) -> f64 {
        self.order_timer
    }

    /// Advances the opponent by `dt` and emits the resulting commands.
    ///
    /// The ledger accrues first, then the spawn timer is serviced, then the
    /// order timer. Units spawned this call only receive orders on a later
    /// round because `units` predates the spawn.
    ///
    /// A spawn attempt picks its kind and cell before it debits the ledger.
    /// When the opponent holds no cell the attempt is dropped and nothing is
    /// spent; the spawn timer re-arms either way.
    pub fn handle(
        &mut self,
        dt: Duration,
        territory: &TerritoryView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        let _ = self.ledger.accrue(dt);
        let seconds = dt.as_secs_f64();

        self.spawn_timer -= seconds;
        if self.spawn_timer <= 0.0 {
            self.attempt_spawn(territory, out);
            let jitter = self.jitter(self.tuning.spawn_jitter);
            self.spawn_timer = self.tuning.spawn_base + jitter;
        }

        self.order_timer -= seconds;
        if self.order_timer <= 0.0 {
            for unit in units.owned_by(Faction::Opponent) {
                self.order(unit, territory, out);
            }
            let jitter = self.jitter(self.tuning.order_jitter);
            self.order_timer = self.tuning.order_base + jitter;
        }
    }

    /// Credits collections made by opponent units.
    pub fn observe(&mut self, events: &[Event]) {
        for event in events {
            if let Event::ResourcesCollected {
                faction: Faction::Opponent,
                amount,
                ..
            } = event
            {
                self.ledger.credit(*amount);
            }
        }
    }

    fn jitter(&mut self, upper: f64) -> f64 {
        if upper > 0.0 {
            self.rng.gen_range(0.0..=upper)
        } else {
            0.0
        }
    }

    fn attempt_spawn(&mut self, territory: &TerritoryView, out: &mut Vec<Command>) {
        let Some(&kind) = UnitKind::ALL.choose(&mut self.rng) else {
            return;
        };
        let owned: Vec<CellCoord> = territory.cells_owned_by(Faction::Opponent).collect();
        let Some(&cell) = owned.choose(&mut self.rng) else {
            log::debug!("opponent holds no cell to spawn {}", kind.display_name());
            return;
        };
        if !self.ledger.try_debit(kind.spawn_cost()) {
            log::debug!(
                "opponent cannot afford {} (balance {})",
                kind.display_name(),
                self.ledger.balance()
            );
            return;
        }

        let mode = if self.rng.gen::<bool>() {
            ActionMode::Attack
        } else {
            ActionMode::Collect
        };
        log::debug!(
            "opponent spawns {} at ({}, {}) in {:?} mode",
            kind.display_name(),
            cell.column(),
            cell.row(),
            mode
        );
        out.push(Command::SpawnUnitAtCell {
            kind,
            cell,
            faction: Faction::Opponent,
            mode,
        });
    }

    fn order(&mut self, unit: &UnitSnapshot, territory: &TerritoryView, out: &mut Vec<Command>) {
        match self.difficulty {
            Difficulty::Easy => {
                if let Some(cell) = self.random_cell(territory) {
                    push_target(unit, Some(cell), out);
                }
            }
            Difficulty::Normal => self.probabilistic_order(unit, territory, out),
            Difficulty::Hard => self.strategic_order(unit, territory, out),
        }
    }

    fn probabilistic_order(
        &mut self,
        unit: &UnitSnapshot,
        territory: &TerritoryView,
        out: &mut Vec<Command>,
    ) {
        if unit.kind == UnitKind::Assault {
            if let Some(cell) = best_attack_target(territory) {
                push_mode(unit, ActionMode::Attack, out);
                push_target(unit, Some(cell), out);
                return;
            }
        }

        if self.rng.gen::<f64>() < self.tuning.attack_probability {
            self.attack(unit, territory, out);
        } else {
            self.collect(unit, territory, out);
        }
    }

    fn strategic_order(
        &mut self,
        unit: &UnitSnapshot,
        territory: &TerritoryView,
        out: &mut Vec<Command>,
    ) {
        match unit.kind {
            UnitKind::Balanced if territory.share(Faction::Player) > AGGRESSION_SHARE => {
                self.attack(unit, territory, out);
            }
            UnitKind::Assault => self.attack(unit, territory, out),
            UnitKind::Forager if self.ledger.balance() < FORAGER_RESERVE => {
                self.collect(unit, territory, out);
            }
            UnitKind::Balanced | UnitKind::Forager => {
                self.probabilistic_order(unit, territory, out);
            }
        }
    }

    fn attack(&mut self, unit: &UnitSnapshot, territory: &TerritoryView, out: &mut Vec<Command>) {
        push_mode(unit, ActionMode::Attack, out);
        push_target(unit, best_attack_target(territory), out);
    }

    fn collect(&mut self, unit: &UnitSnapshot, territory: &TerritoryView, out: &mut Vec<Command>) {
        push_mode(unit, ActionMode::Collect, out);
        let cell = preferred_collection_target(territory, &mut self.rng);
        push_target(unit, cell, out);
    }

    fn random_cell(&mut self, territory: &TerritoryView) -> Option<CellCoord> {
        let (columns, rows) = territory.dimensions();
        if territory.is_empty() {
            return None;
        }
        let row = self.rng.gen_range(0..rows);
        let column = self.rng.gen_range(0..columns);
        Some(CellCoord::new(column, row))
    }
}

fn push_mode(unit: &UnitSnapshot, mode: ActionMode, out: &mut Vec<Command>) {
    out.push(Command::SetUnitMode {
        unit: unit.id,
        mode,
    });
}

fn push_target(unit: &UnitSnapshot, cell: Option<CellCoord>, out: &mut Vec<Command>) {
    match cell {
        Some(cell) => out.push(Command::SetUnitTarget {
            unit: unit.id,
            cell,
        }),
        None => log::debug!("no target available for opponent unit {}", unit.id.get()),
    }
}

/// Player cell most exposed to opponent territory.
///
/// Each player cell scores one plus the number of orthogonally adjacent
/// opponent cells; ties resolve to the first cell in row-major order.
#[must_use]
pub fn best_attack_target(territory: &TerritoryView) -> Option<CellCoord> {
    let mut best: Option<(CellCoord, usize)> = None;
    for cell in territory.cells_owned_by(Faction::Player) {
        let score = 1 + territory
            .orthogonal_neighbors(cell)
            .filter(|neighbor| territory.owner(*neighbor) == Some(Faction::Opponent))
            .count();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((cell, score));
        }
    }
    best.map(|(cell, _)| cell)
}

/// Random opponent cell, falling back to a random neutral cell.
pub fn preferred_collection_target<R: Rng>(
    territory: &TerritoryView,
    rng: &mut R,
) -> Option<CellCoord> {
    for faction in [Faction::Opponent, Faction::Neutral] {
        let cells: Vec<CellCoord> = territory.cells_owned_by(faction).collect();
        if let Some(&cell) = cells.choose(rng) {
            return Some(cell);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(columns: u32, rows: u32, owners: &[Faction]) -> TerritoryView {
        TerritoryView::new(columns, rows, owners.to_vec())
    }

    #[test]
    fn tiers_follow_the_tuning_table() {
        let easy = DifficultyTuning::for_difficulty(Difficulty::Easy);
        let hard = DifficultyTuning::for_difficulty(Difficulty::Hard);
        assert_eq!(easy.first_spawn, 15.0);
        assert_eq!(easy.attack_probability, 0.3);
        assert_eq!(hard.spawn_base, 5.0);
        assert_eq!(hard.accrual_rate, 1.2);
    }

    #[test]
    fn best_target_prefers_cells_bordering_opponent() {
        use Faction::{Neutral as N, Opponent as O, Player as P};
        // Row 0: P P N, row 1: N P O.
        let territory = view(3, 2, &[P, P, N, N, P, O]);
        assert_eq!(best_attack_target(&territory), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn best_target_ties_resolve_row_major() {
        use Faction::{Neutral as N, Player as P};
        let territory = view(2, 2, &[N, P, P, N]);
        assert_eq!(best_attack_target(&territory), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn no_player_cells_means_no_attack_target() {
        let territory = view(2, 1, &[Faction::Opponent, Faction::Neutral]);
        assert_eq!(best_attack_target(&territory), None);
    }

    #[test]
    fn collection_prefers_own_then_neutral_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let own = view(2, 1, &[Faction::Player, Faction::Opponent]);
        assert_eq!(
            preferred_collection_target(&own, &mut rng),
            Some(CellCoord::new(1, 0))
        );
        let neutral = view(2, 1, &[Faction::Player, Faction::Neutral]);
        assert_eq!(
            preferred_collection_target(&neutral, &mut rng),
            Some(CellCoord::new(1, 0))
        );
        let none = view(1, 1, &[Faction::Player]);
        assert_eq!(preferred_collection_target(&none, &mut rng), None);
    }

    #[test]
    fn first_tick_issues_orders_and_rearms_order_timer() {
        let mut opponent = Opponent::new(Config::new(Difficulty::Normal, 1));
        let territory = view(1, 2, &[Faction::Player, Faction::Opponent]);
        let mut out = Vec::new();
        opponent.handle(
            Duration::from_millis(16),
            &territory,
            &UnitView::default(),
            &mut out,
        );
        assert!(out.is_empty());
        assert!((3.0..=5.0).contains(&opponent.order_timer()));
        assert!((opponent.spawn_timer() - (10.0 - 0.016)).abs() < 1e-9);
    }

    #[test]
    fn spawn_is_skipped_without_owned_cells() {
        let mut opponent = Opponent::new(Config::new(Difficulty::Hard, 3));
        let territory = view(2, 1, &[Faction::Player, Faction::Neutral]);
        let mut out = Vec::new();
        opponent.handle(
            Duration::from_secs(7),
            &territory,
            &UnitView::default(),
            &mut out,
        );
        assert!(out.is_empty());
        // Seven seconds of accrual at 1.2 per second, nothing spent.
        assert_eq!(opponent.ledger().balance(), STARTING_RESOURCES + 8);
        assert!((5.0..=9.0).contains(&opponent.spawn_timer()));
    }

    #[test]
    fn spawn_debits_ledger_and_targets_owned_cell() {
        let mut opponent = Opponent::new(Config::new(Difficulty::Easy, 11));
        let territory = view(1, 2, &[Faction::Player, Faction::Opponent]);
        let mut out = Vec::new();
        opponent.handle(
            Duration::from_secs(15),
            &territory,
            &UnitView::default(),
            &mut out,
        );
        let [Command::SpawnUnitAtCell {
            kind,
            cell,
            faction,
            ..
        }] = out.as_slice()
        else {
            panic!("expected a single spawn, got {out:?}");
        };
        assert_eq!(*cell, CellCoord::new(0, 1));
        assert_eq!(*faction, Faction::Opponent);
        // Fifteen seconds at 0.8 per second accrues twelve.
        assert_eq!(
            opponent.ledger().balance(),
            STARTING_RESOURCES + 12 - kind.spawn_cost()
        );
    }

    #[test]
    fn observed_collections_credit_only_opponent() {
        let mut opponent = Opponent::new(Config::new(Difficulty::Normal, 5));
        opponent.observe(&[
            Event::ResourcesCollected {
                unit: turf_core::UnitId::new(0),
                faction: Faction::Player,
                amount: 4,
            },
            Event::ResourcesCollected {
                unit: turf_core::UnitId::new(1),
                faction: Faction::Opponent,
                amount: 2,
            },
        ]);
        assert_eq!(opponent.ledger().balance(), STARTING_RESOURCES + 2);
    }
}
