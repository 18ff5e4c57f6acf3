use smallvec::SmallVec;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Flat cell index, `x + y * width`.
pub type CellIndex = usize;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Neighbors of a single cell, never more than eight.
pub type Neighbors = SmallVec<[CellIndex; 8]>;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    /// Grids are stored row-major, so the first axis is `y`.
    fn to_nd_index(self) -> Self::Output {
        [self.1.into(), self.0.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub const fn coords_to_index((x, y): Coord2, width: Coord) -> CellIndex {
    x as CellIndex + y as CellIndex * width as CellIndex
}

pub const fn index_to_coords(index: CellIndex, width: Coord) -> Coord2 {
    let width = width as CellIndex;
    ((index % width) as Coord, (index / width) as Coord)
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item =
                apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}

/// Lookup table of neighbor indexes for every cell of a board.
///
/// A cell's neighbor set only depends on the board dimensions, so the table is
/// built once per dimension change and shared by every game on that board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborTable {
    size: Coord2,
    entries: Vec<Neighbors>,
}

impl NeighborTable {
    pub fn new(size: Coord2) -> Self {
        let (width, height) = size;
        let mut entries = Vec::with_capacity(usize::from(mult(width, height)));
        for y in 0..height {
            for x in 0..width {
                entries.push(
                    NeighborIter::new((x, y), size)
                        .map(|pos| coords_to_index(pos, width))
                        .collect(),
                );
            }
        }
        log::trace!("Built neighbor table for {}x{}", width, height);
        Self { size, entries }
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn around(&self, index: CellIndex) -> &[CellIndex] {
        &self.entries[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_coords() {
        assert_eq!(coords_to_index((3, 2), 9), 21);
        assert_eq!(index_to_coords(21, 9), (3, 2));
        assert_eq!(index_to_coords(0, 1), (0, 0));
    }

    #[test]
    fn corner_has_three_neighbors() {
        let table = NeighborTable::new((3, 3));

        assert_eq!(table.around(0), &[1, 3, 4]);
        assert_eq!(table.around(8), &[4, 5, 7]);
    }

    #[test]
    fn center_has_eight_neighbors_in_reading_order() {
        let table = NeighborTable::new((3, 3));

        assert_eq!(table.around(4), &[0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn single_row_board_only_has_horizontal_neighbors() {
        let table = NeighborTable::new((4, 1));

        assert_eq!(table.size(), (4, 1));
        assert_eq!(table.around(0), &[1]);
        assert_eq!(table.around(2), &[1, 3]);
    }

    #[test]
    fn neighbor_iter_stays_in_bounds() {
        let neighbors: Vec<_> = NeighborIter::new((1, 0), (2, 2)).collect();

        assert_eq!(neighbors, vec![(0, 0), (0, 1), (1, 1)]);
    }
}
