use thiserror::Error;

use crate::{CellCount, CellIndex};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board width and height must be positive")]
    InvalidDimensions,
    #[error("Board needs at least one mine")]
    NoMines,
    #[error("Too many mines, at least one cell must be safe")]
    TooManyMines,
    #[error("Cell index is outside the board")]
    InvalidCell,
}

pub type Result<T> = core::result::Result<T, BoardError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid store key {0:?}")]
    InvalidKey(String),
    #[error("Store I/O failed")]
    Io(#[from] std::io::Error),
    #[error("Could not encode snapshot")]
    Json(#[from] serde_json::Error),
}

/// Reasons a persisted snapshot is rejected during restore.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Snapshot was taken on a different board")]
    ConfigMismatch,
    #[error("Cell index {0} is outside the board")]
    IndexOutOfRange(CellIndex),
    #[error("Cell {index} has invalid bits {bits:#x}")]
    InvalidBits { index: CellIndex, bits: u8 },
    #[error("Cell {0} is listed more than once")]
    DuplicateIndex(CellIndex),
    #[error("Snapshot has {actual} mines, expected {expected}")]
    MineCountMismatch {
        expected: CellCount,
        actual: CellCount,
    },
}
