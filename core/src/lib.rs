use core::fmt;
use core::ops::BitOr;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use placement::*;
pub use session::*;
pub use snapshot::*;
pub use store::*;
pub use timer::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod placement;
mod session;
mod snapshot;
mod store;
mod timer;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    /// Validates the configuration, misuse is reported rather than clamped.
    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(width, height, mines);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BoardError::InvalidDimensions);
        }
        if self.mines == 0 {
            return Err(BoardError::NoMines);
        }
        if self.mines >= self.total_cells() {
            return Err(BoardError::TooManyMines);
        }
        Ok(())
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked(9, 9, 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked(16, 16, 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked(30, 16, 99)
    }

    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::beginner()
    }
}

/// Player action on a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellAction {
    Open,
    Flag,
    /// Chord: open every unflagged neighbor once the flags match the count.
    OpenAround,
}

impl CellAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Flag => "flag",
            Self::OpenAround => "open-around",
        }
    }
}

impl fmt::Display for CellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "flag" => Ok(Self::Flag),
            "open-around" => Ok(Self::OpenAround),
            other => Err(UnknownAction(other.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown cell action {0:?}")]
pub struct UnknownAction(pub String);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperateOutcome {
    NoChange,
    Changed,
    Lost,
    Won,
}

impl OperateOutcome {
    pub const fn has_update(self) -> bool {
        use OperateOutcome::*;
        match self {
            NoChange => false,
            Changed => true,
            Lost => true,
            Won => true,
        }
    }

    pub(crate) const fn from_update(updated: bool) -> Self {
        if updated { Self::Changed } else { Self::NoChange }
    }
}

/// Used to merge outcomes when opening several cells at once
impl BitOr for OperateOutcome {
    type Output = OperateOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use OperateOutcome::*;
        match (self, rhs) {
            (Lost, _) => Lost,
            (_, Lost) => Lost,
            (Won, _) => Won,
            (_, Won) => Won,
            (Changed, _) => Changed,
            (_, Changed) => Changed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for config in [
            BoardConfig::beginner(),
            BoardConfig::intermediate(),
            BoardConfig::expert(),
        ] {
            assert_eq!(config.validate(), Ok(()));
        }
        assert_eq!(BoardConfig::expert().total_cells(), 480);
    }

    #[test]
    fn config_rejects_misuse() {
        assert_eq!(BoardConfig::new(0, 9, 1), Err(BoardError::InvalidDimensions));
        assert_eq!(BoardConfig::new(9, 0, 1), Err(BoardError::InvalidDimensions));
        assert_eq!(BoardConfig::new(9, 9, 0), Err(BoardError::NoMines));
        assert_eq!(BoardConfig::new(3, 3, 9), Err(BoardError::TooManyMines));
        assert_eq!(BoardConfig::new(3, 3, 8).map(|c| c.safe_cell_count()), Ok(1));
    }

    #[test]
    fn actions_parse_from_wire_names() {
        for action in [CellAction::Open, CellAction::Flag, CellAction::OpenAround] {
            assert_eq!(action.as_str().parse(), Ok(action));
        }
        assert!("dig".parse::<CellAction>().is_err());
        assert_eq!(
            serde_json::to_string(&CellAction::OpenAround).unwrap(),
            "\"open-around\""
        );
    }

    #[test]
    fn merged_outcome_prefers_loss() {
        use OperateOutcome::*;

        assert_eq!(Changed | Lost, Lost);
        assert_eq!(Won | Changed, Won);
        assert_eq!(NoChange | Changed, Changed);
        assert_eq!(NoChange | NoChange, NoChange);
        assert!(!NoChange.has_update());
    }
}
