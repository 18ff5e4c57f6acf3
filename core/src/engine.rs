use ndarray::{Array2, ArrayView2};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::*;

/// Valid transitions:
/// - Ready -> Playing, on the first action
/// - Playing -> Won, when the last safe cell opens
/// - Playing -> Lost, when a mine opens
/// - any -> Ready, through `init`
/// - Playing/Won/Lost -> Playing, through `restart`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Mines are not placed yet
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl Stage {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Board state machine: cells, mine layout, flags, stage and timer.
#[derive(Clone, Debug)]
pub struct BoardEngine<C = SystemClock> {
    config: BoardConfig,
    cells: Array2<Cell>,
    neighbors: NeighborTable,
    mine_indexes: Vec<CellIndex>,
    flagged_indexes: BTreeSet<CellIndex>,
    unopened_safe: CellCount,
    stage: Stage,
    timer: Timer,
    rng: SmallRng,
    clock: C,
}

impl BoardEngine<SystemClock> {
    pub fn new(config: BoardConfig) -> Result<Self> {
        Self::from_parts(config, SmallRng::from_os_rng(), SystemClock)
    }

    pub fn with_seed(config: BoardConfig, seed: u64) -> Result<Self> {
        Self::from_parts(config, SmallRng::seed_from_u64(seed), SystemClock)
    }
}

impl<C: Clock> BoardEngine<C> {
    pub fn with_clock(config: BoardConfig, seed: u64, clock: C) -> Result<Self> {
        Self::from_parts(config, SmallRng::seed_from_u64(seed), clock)
    }

    fn from_parts(config: BoardConfig, rng: SmallRng, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cells: Array2::default(config.size().to_nd_index()),
            neighbors: NeighborTable::new(config.size()),
            mine_indexes: Vec::new(),
            flagged_indexes: BTreeSet::new(),
            unopened_safe: config.safe_cell_count(),
            stage: Stage::Ready,
            timer: Timer::default(),
            rng,
            clock,
        })
    }

    /// Resets the board to `config`, replaying `restore` when it holds any cells.
    ///
    /// The cell storage is only reallocated when the dimensions change. A
    /// snapshot that does not fit the board is ignored and the board stays ready.
    pub fn init(&mut self, config: BoardConfig, restore: Option<&Snapshot>) -> Result<()> {
        config.validate()?;

        if config.size() != self.config.size() {
            self.cells = Array2::default(config.size().to_nd_index());
            self.neighbors = NeighborTable::new(config.size());
        } else {
            self.cells.iter_mut().for_each(Cell::clear);
        }

        self.config = config;
        self.mine_indexes.clear();
        self.flagged_indexes.clear();
        self.unopened_safe = config.safe_cell_count();
        self.stage = Stage::Ready;
        self.timer.reset();
        log::debug!("Board initialized: {:?}", config);

        if let Some(snapshot) = restore.filter(|snapshot| !snapshot.is_blank()) {
            match snapshot.validate(config) {
                Ok(()) => self.replay(snapshot),
                Err(err) => log::warn!("Ignoring corrupted snapshot: {}", err),
            }
        }
        Ok(())
    }

    /// Re-initializes the board from a snapshot, taking the configuration from it.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.init(snapshot.config()?, Some(snapshot))
    }

    /// Covers every cell again and restarts the timer, keeping the mine layout.
    pub fn restart(&mut self) {
        if self.stage.is_ready() {
            return;
        }

        self.cells.iter_mut().for_each(Cell::cover);
        self.flagged_indexes.clear();
        self.unopened_safe = self.config.safe_cell_count();
        self.timer.reset();
        self.timer.start(self.clock.now_ms());
        self.stage = Stage::Playing;
        log::debug!("Board restarted");
    }

    pub fn dump(&self) -> Snapshot {
        let cell_bits = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let bits = cell.bits();
                (!bits.is_empty()).then_some((index, bits.bits()))
            })
            .collect();

        Snapshot {
            width: self.config.width,
            height: self.config.height,
            mine_count: self.config.mines,
            cell_bits,
            duration: self.elapsed_ms(),
        }
    }

    /// Applies a player action. The first action on a ready board places the
    /// mines around it and starts the game.
    ///
    /// With `allow_chord_fallback`, an `Open` or `Flag` that had no effect is
    /// retried as `OpenAround` on the same cell.
    pub fn operate(
        &mut self,
        index: CellIndex,
        action: CellAction,
        allow_chord_fallback: bool,
    ) -> Result<OperateOutcome> {
        let index = self.validate_index(index)?;

        if self.stage.is_finished() {
            log::debug!("Game already ended, ignoring {} at {}", action, index);
            return Ok(OperateOutcome::NoChange);
        }

        let started = self.stage.is_ready();
        if started {
            self.start_game(index);
        }

        let outcome = match action {
            CellAction::OpenAround => self.open_around(index),
            CellAction::Open => self.open(index),
            CellAction::Flag => self.toggle_flag(index),
        };

        let outcome = if !outcome.has_update()
            && allow_chord_fallback
            && action != CellAction::OpenAround
        {
            self.open_around(index)
        } else {
            outcome
        };

        Ok(outcome | OperateOutcome::from_update(started))
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_finished()
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms(self.clock.now_ms())
    }

    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.validate_index(index).ok().map(|index| self.cell_at(index))
    }

    /// All cells in flat index order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells as rows, shaped `height x width`.
    pub fn grid(&self) -> ArrayView2<'_, Cell> {
        self.cells.view()
    }

    /// Sorted mine indexes, empty until the first action.
    pub fn mine_indexes(&self) -> &[CellIndex] {
        &self.mine_indexes
    }

    pub fn flagged_indexes(&self) -> &BTreeSet<CellIndex> {
        &self.flagged_indexes
    }

    /// Mines minus flags, negative when the player over-flags.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flagged_indexes.len() as isize)
    }

    pub fn around_cells(&self, index: CellIndex) -> Result<&[CellIndex]> {
        let index = self.validate_index(index)?;
        Ok(self.neighbors.around(index))
    }

    pub fn index_to_coords(&self, index: CellIndex) -> Result<Coord2> {
        let index = self.validate_index(index)?;
        Ok(index_to_coords(index, self.config.width))
    }

    pub fn coords_to_index(&self, coords: Coord2) -> Result<CellIndex> {
        if coords.0 < self.config.width && coords.1 < self.config.height {
            Ok(coords_to_index(coords, self.config.width))
        } else {
            Err(BoardError::InvalidCell)
        }
    }

    /// Whether `OpenAround` on `index` would currently open anything.
    pub fn can_open_around(&self, index: CellIndex) -> bool {
        let Ok(index) = self.validate_index(index) else {
            return false;
        };
        let cell = self.cell_at(index);
        if self.stage.is_finished() || !cell.open {
            return false;
        }

        let flags = self.count_flagged_neighbors(index);
        flags != 0
            && Some(flags) == cell.around_mine_count
            && self
                .neighbors
                .around(index)
                .iter()
                .any(|&pos| self.cell_at(pos).is_covered() && !self.cell_at(pos).flag)
    }

    fn validate_index(&self, index: CellIndex) -> Result<CellIndex> {
        if index < usize::from(self.config.total_cells()) {
            Ok(index)
        } else {
            Err(BoardError::InvalidCell)
        }
    }

    fn cell_at(&self, index: CellIndex) -> &Cell {
        &self.cells[index_to_coords(index, self.config.width).to_nd_index()]
    }

    fn cell_at_mut(&mut self, index: CellIndex) -> &mut Cell {
        &mut self.cells[index_to_coords(index, self.config.width).to_nd_index()]
    }

    fn around_mine_count(&mut self, index: CellIndex) -> u8 {
        if let Some(count) = self.cell_at(index).around_mine_count {
            return count;
        }

        let count = self
            .neighbors
            .around(index)
            .iter()
            .filter(|&&pos| self.cell_at(pos).mine)
            .count()
            .try_into()
            .unwrap_or(u8::MAX);
        self.cell_at_mut(index).around_mine_count = Some(count);
        count
    }

    fn count_flagged_neighbors(&self, index: CellIndex) -> u8 {
        self.neighbors
            .around(index)
            .iter()
            .filter(|&&pos| self.cell_at(pos).flag)
            .count()
            .try_into()
            .unwrap_or(u8::MAX)
    }

    fn start_game(&mut self, first: CellIndex) {
        let mines = place_mines(&mut self.rng, self.config, &self.neighbors, first);
        for &index in &mines {
            self.cell_at_mut(index).mine = true;
        }
        self.mine_indexes = mines;
        self.stage = Stage::Playing;

        let now = self.clock.now_ms();
        self.timer.start(now);
        log::debug!("started at {} from cell {}", now, first);
    }

    /// Opens a covered, unflagged cell, flooding through zero-count regions.
    fn open(&mut self, index: CellIndex) -> OperateOutcome {
        if !self.is_openable(index) {
            return OperateOutcome::NoChange;
        }

        let mut to_visit = vec![index];
        while let Some(visit) = to_visit.pop() {
            if !self.is_openable(visit) {
                continue;
            }

            let cell = self.cell_at_mut(visit);
            cell.open = true;
            if cell.mine {
                cell.boom = true;
                self.end_game(false);
                return OperateOutcome::Lost;
            }

            self.unopened_safe = self.unopened_safe.saturating_sub(1);
            if self.unopened_safe == 0 {
                self.end_game(true);
                return OperateOutcome::Won;
            }

            let count = self.around_mine_count(visit);
            log::trace!("Open cell {}, mine count: {}", visit, count);

            // if this is zero we visit the neighbors
            if count == 0 {
                to_visit.extend(
                    self.neighbors
                        .around(visit)
                        .iter()
                        .copied()
                        .filter(|&pos| self.is_openable(pos)),
                );
            }
        }

        OperateOutcome::Changed
    }

    fn is_openable(&self, index: CellIndex) -> bool {
        let cell = self.cell_at(index);
        !cell.open && !cell.flag
    }

    fn toggle_flag(&mut self, index: CellIndex) -> OperateOutcome {
        let cell = self.cell_at_mut(index);
        if cell.open {
            return OperateOutcome::NoChange;
        }

        cell.flag = !cell.flag;
        if cell.flag {
            self.flagged_indexes.insert(index);
        } else {
            self.flagged_indexes.remove(&index);
        }
        OperateOutcome::Changed
    }

    fn open_around(&mut self, index: CellIndex) -> OperateOutcome {
        if !self.cell_at(index).open {
            return OperateOutcome::NoChange;
        }

        let flags = self.count_flagged_neighbors(index);
        if flags == 0 || flags != self.around_mine_count(index) {
            return OperateOutcome::NoChange;
        }

        let around: Neighbors = self.neighbors.around(index).into();
        let mut outcome = OperateOutcome::NoChange;
        for pos in around {
            outcome = outcome | self.open(pos);
            if self.stage.is_finished() {
                break;
            }
        }
        outcome
    }

    fn end_game(&mut self, won: bool) {
        if self.stage.is_finished() {
            return;
        }

        let now = self.clock.now_ms();
        self.timer.pause(now);

        if won {
            self.stage = Stage::Won;
            self.flagged_indexes.clear();
            for index in 0..usize::from(self.config.total_cells()) {
                if self.cell_at(index).mine {
                    self.cell_at_mut(index).flag = true;
                    self.flagged_indexes.insert(index);
                } else {
                    self.cell_at_mut(index).open = true;
                    self.around_mine_count(index);
                }
            }
        } else {
            self.stage = Stage::Lost;
            let revealed: Vec<CellIndex> = self
                .mine_indexes
                .iter()
                .chain(self.flagged_indexes.iter())
                .copied()
                .collect();
            for index in revealed {
                self.cell_at_mut(index).open = true;
            }
        }
        log::debug!("ended at {} as {:?}", now, self.stage);
    }

    fn replay(&mut self, snapshot: &Snapshot) {
        let mut opened = Vec::new();
        for &(index, bits) in &snapshot.cell_bits {
            let cell = self.cell_at_mut(index);
            cell.apply_bits(CellBits::from_bits_truncate(bits));
            let (open, mine, flag) = (cell.open, cell.mine, cell.flag);

            if open {
                opened.push(index);
            }
            if mine {
                self.mine_indexes.push(index);
            }
            if flag {
                self.flagged_indexes.insert(index);
            }
        }
        self.mine_indexes.sort_unstable();

        let mut exploded = false;
        for &index in &opened {
            if self.cell_at(index).mine {
                exploded = true;
            } else {
                self.unopened_safe = self.unopened_safe.saturating_sub(1);
            }
            self.around_mine_count(index);
        }

        self.timer = Timer::new(snapshot.duration);
        self.stage = if exploded {
            Stage::Lost
        } else if self.unopened_safe == 0 {
            Stage::Won
        } else {
            self.timer.start(self.clock.now_ms());
            Stage::Playing
        };
        log::debug!(
            "Restored {} cells, {} opened, stage {:?}",
            snapshot.cell_bits.len(),
            opened.len(),
            self.stage
        );
    }
}
