//! Consumable items and occupancy-rejection placement.

use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::config::GridConfig;
use super::state::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// +1 score, queued growth
    Primary,
    /// Removes trailing segments
    Shrink,
    /// +2 score, queued growth plus one immediate segment
    Bonus,
}

/// At most one item of each kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Items {
    pub primary: Option<Position>,
    pub shrink: Option<Position>,
    pub bonus: Option<Position>,
}

impl Items {
    pub fn get(&self, kind: ItemKind) -> Option<Position> {
        match kind {
            ItemKind::Primary => self.primary,
            ItemKind::Shrink => self.shrink,
            ItemKind::Bonus => self.bonus,
        }
    }

    pub fn slot_mut(&mut self, kind: ItemKind) -> &mut Option<Position> {
        match kind {
            ItemKind::Primary => &mut self.primary,
            ItemKind::Shrink => &mut self.shrink,
            ItemKind::Bonus => &mut self.bonus,
        }
    }

    /// Remove and return the item of `kind` if `head` is within `tolerance`
    pub fn take_near(
        &mut self,
        kind: ItemKind,
        head: Position,
        tolerance: i32,
    ) -> Option<Position> {
        let slot = self.slot_mut(kind);
        match *slot {
            Some(pos) if head.near(pos, tolerance) => slot.take(),
            _ => None,
        }
    }

    pub fn is_item_at(&self, pos: Position) -> bool {
        [self.primary, self.shrink, self.bonus].contains(&Some(pos))
    }
}

/// Pick a random cell for which `occupied` is false.
///
/// Rejection-samples up to `attempts` cells, then falls back to a uniform
/// choice among every free cell so placement only fails on a full grid.
pub fn place<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &GridConfig,
    attempts: usize,
    occupied: impl Fn(Position) -> bool,
) -> Option<Position> {
    if let Some(pos) = sample(rng, grid, attempts, &occupied) {
        return Some(pos);
    }
    grid.cells().filter(|pos| !occupied(*pos)).choose(rng)
}

/// Rejection-sample up to `attempts` cells; `None` when every try was occupied
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &GridConfig,
    attempts: usize,
    occupied: impl Fn(Position) -> bool,
) -> Option<Position> {
    for _ in 0..attempts {
        let column = rng.gen_range(0..grid.columns);
        let row = rng.gen_range(0..grid.rows);
        let pos = grid.cell(column, row);
        if !occupied(pos) {
            return Some(pos);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_take_near() {
        let mut items = Items {
            primary: Some(Position::new(100, 100)),
            ..Default::default()
        };

        assert_eq!(items.take_near(ItemKind::Primary, Position::new(120, 100), 10), None);
        assert!(items.primary.is_some());

        assert_eq!(
            items.take_near(ItemKind::Primary, Position::new(100, 100), 10),
            Some(Position::new(100, 100))
        );
        assert_eq!(items.primary, None);
        assert_eq!(items.take_near(ItemKind::Shrink, Position::new(100, 100), 10), None);
    }

    #[test]
    fn test_place_rejects_occupied_cells() {
        let grid = GridConfig {
            columns: 4,
            rows: 4,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let free = grid.cell(2, 3);

        for _ in 0..20 {
            let pos = place(&mut rng, &grid, 5, |pos| pos != free);
            assert_eq!(pos, Some(free));
        }
    }

    #[test]
    fn test_place_on_full_grid() {
        let grid = GridConfig {
            columns: 4,
            rows: 4,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(place(&mut rng, &grid, 50, |_| true), None);
    }

    #[test]
    fn test_sample_stays_on_grid() {
        let grid = GridConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let pos = sample(&mut rng, &grid, 1, |_| false).unwrap();
            assert!(grid.contains(pos));
            assert_eq!((pos.x - grid.origin_x) % grid.cell_size, 0);
            assert_eq!((pos.y - grid.origin_y) % grid.cell_size, 0);
        }
    }
}
