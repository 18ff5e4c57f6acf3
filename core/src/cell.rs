use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Persisted per-cell bits, as stored in a snapshot's `cellBits`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CellBits: u8 {
        const OPEN = 0x1;
        const MINE = 0x2;
        const FLAG = 0x4;
    }
}

/// State of a single board cell.
///
/// `boom` marks the mine that ended a lost game and is never persisted.
/// `around_mine_count` is filled lazily and stays fixed once known, because
/// mines are placed exactly once per game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub open: bool,
    pub mine: bool,
    pub flag: bool,
    pub boom: bool,
    pub around_mine_count: Option<u8>,
}

impl Cell {
    pub const fn is_covered(&self) -> bool {
        !self.open
    }

    pub fn bits(&self) -> CellBits {
        let mut bits = CellBits::empty();
        bits.set(CellBits::OPEN, self.open);
        bits.set(CellBits::MINE, self.mine);
        bits.set(CellBits::FLAG, self.flag);
        bits
    }

    pub fn apply_bits(&mut self, bits: CellBits) {
        self.open = bits.contains(CellBits::OPEN);
        self.mine = bits.contains(CellBits::MINE);
        self.flag = bits.contains(CellBits::FLAG);
    }

    /// Re-covers the cell, keeping the mine and its cached count.
    pub(crate) fn cover(&mut self) {
        self.open = false;
        self.flag = false;
        self.boom = false;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_follow_open_mine_flag_order() {
        let cell = Cell {
            open: true,
            flag: true,
            ..Default::default()
        };

        assert_eq!(cell.bits().bits(), 0b101);
    }

    #[test]
    fn boom_and_count_are_not_encoded() {
        let cell = Cell {
            mine: true,
            boom: true,
            around_mine_count: Some(3),
            ..Default::default()
        };

        assert_eq!(cell.bits(), CellBits::MINE);
    }

    #[test]
    fn cover_keeps_mine_layout() {
        let mut cell = Cell {
            open: true,
            mine: true,
            flag: true,
            boom: true,
            around_mine_count: Some(2),
        };

        cell.cover();

        assert!(cell.is_covered());
        assert!(cell.mine);
        assert!(!cell.flag && !cell.boom);
        assert_eq!(cell.around_mine_count, Some(2));
    }
}
