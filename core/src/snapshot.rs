use serde::{Deserialize, Serialize};

use crate::*;

/// Compact persisted board state.
///
/// `cell_bits` lists `(index, bits)` only for cells with at least one of
/// open/mine/flag set, using the [`CellBits`] encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub width: Coord,
    pub height: Coord,
    pub mine_count: CellCount,
    #[serde(default)]
    pub cell_bits: Vec<(CellIndex, u8)>,
    /// Elapsed play time in milliseconds.
    #[serde(default)]
    pub duration: u64,
}

impl Snapshot {
    pub fn config(&self) -> Result<BoardConfig> {
        BoardConfig::new(self.width, self.height, self.mine_count)
    }

    pub fn is_blank(&self) -> bool {
        self.cell_bits.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Checks the snapshot can be replayed onto a board of `config`.
    pub fn validate(&self, config: BoardConfig) -> core::result::Result<(), SnapshotError> {
        if (self.width, self.height, self.mine_count) != (config.width, config.height, config.mines)
        {
            return Err(SnapshotError::ConfigMismatch);
        }

        let total = usize::from(config.total_cells());
        let mut seen = vec![false; total];
        let mut mines: CellCount = 0;

        for &(index, bits) in &self.cell_bits {
            if index >= total {
                return Err(SnapshotError::IndexOutOfRange(index));
            }
            let Some(decoded) = CellBits::from_bits(bits).filter(|b| !b.is_empty()) else {
                return Err(SnapshotError::InvalidBits { index, bits });
            };
            if core::mem::replace(&mut seen[index], true) {
                return Err(SnapshotError::DuplicateIndex(index));
            }
            if decoded.contains(CellBits::MINE) {
                mines = mines.saturating_add(1);
            }
        }

        if mines != config.mines {
            return Err(SnapshotError::MineCountMismatch {
                expected: config.mines,
                actual: mines,
            });
        }

        Ok(())
    }
}
