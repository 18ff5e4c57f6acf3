use rand::Rng;
use rand::seq::SliceRandom;

use crate::*;

/// Which cells around the first click are kept free of mines.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SafeZone {
    /// The clicked cell and all of its neighbors, so the first click opens a zero.
    Neighborhood,
    /// Only the clicked cell, used when the board is too crowded for a full zone.
    StartCell,
}

impl SafeZone {
    /// Picks the widest zone that still leaves room for every mine.
    pub fn fitting(config: BoardConfig, neighbor_count: usize) -> Self {
        let total = usize::from(config.total_cells());
        let mines = usize::from(config.mines);
        if mines + 1 + neighbor_count > total {
            log::warn!("Cannot make start cell zero, fallback to simple safe");
            Self::StartCell
        } else {
            Self::Neighborhood
        }
    }
}

/// Chooses `config.mines` distinct cells uniformly among the cells outside the
/// safe zone of `start`. Returned indexes are sorted.
pub fn place_mines<R: Rng + ?Sized>(
    rng: &mut R,
    config: BoardConfig,
    neighbors: &NeighborTable,
    start: CellIndex,
) -> Vec<CellIndex> {
    let around = neighbors.around(start);
    let zone = SafeZone::fitting(config, around.len());
    let is_excluded = |index: CellIndex| {
        index == start || (zone == SafeZone::Neighborhood && around.contains(&index))
    };

    let mut candidates: Vec<CellIndex> = (0..usize::from(config.total_cells()))
        .filter(|&index| !is_excluded(index))
        .collect();

    let wanted = usize::from(config.mines).min(candidates.len());
    let (chosen, _) = candidates.partial_shuffle(rng, wanted);
    let mut mines = chosen.to_vec();
    mines.sort_unstable();

    // double check mine count
    if mines.len() != usize::from(config.mines) {
        log::warn!(
            "Placed mine count mismatch, actual: {}, requested: {}",
            mines.len(),
            config.mines
        );
    }
    log::trace!("Placed {} mines avoiding {:?} of {}", mines.len(), zone, start);
    mines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn mines_avoid_first_click_neighborhood() {
        let config = BoardConfig::beginner();
        let table = NeighborTable::new(config.size());

        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mines = place_mines(&mut rng, config, &table, 40);

            assert_eq!(mines.len(), 10);
            for index in [30, 31, 32, 39, 40, 41, 48, 49, 50] {
                assert!(!mines.contains(&index), "seed {seed} put a mine at {index}");
            }
        }
    }

    #[test]
    fn mines_are_distinct() {
        let config = BoardConfig::new(5, 5, 16).unwrap();
        let table = NeighborTable::new(config.size());
        let mut rng = SmallRng::seed_from_u64(7);

        let mut mines = place_mines(&mut rng, config, &table, 0);
        mines.dedup();

        assert_eq!(mines.len(), 16);
    }

    #[test]
    fn crowded_board_only_protects_start_cell() {
        let config = BoardConfig::new(3, 3, 8).unwrap();
        let table = NeighborTable::new(config.size());
        let mut rng = SmallRng::seed_from_u64(1);

        let mines = place_mines(&mut rng, config, &table, 4);

        assert_eq!(mines, vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn zone_falls_back_when_neighborhood_does_not_fit() {
        let config = BoardConfig::new(4, 4, 7).unwrap();

        assert_eq!(SafeZone::fitting(config, 8), SafeZone::Neighborhood);
        assert_eq!(SafeZone::fitting(config, 3), SafeZone::Neighborhood);

        let crowded = BoardConfig::new(4, 4, 8).unwrap();
        assert_eq!(SafeZone::fitting(crowded, 8), SafeZone::StartCell);
    }
}
