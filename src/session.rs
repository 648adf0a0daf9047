//! Session: turn sequence, countdown clock, pause and win/loss for one play-through.

use crate::GameConfig;
use crate::board::{Board, BoardError, Pos};
use crate::combo::{ComboTracker, Notice};
use crate::highscores::HighScoreStore;
use crate::matching::can_connect;
use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Won,
    Lost,
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub max_combo: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Paused { since: Instant },
    Finished(Outcome),
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Paused, finished, out of bounds, or an empty first pick.
    Ignored,
    Selected(Pos),
    Matched { first: Pos, second: Pos, combo: u32 },
    Rejected { first: Pos, second: Pos },
}

/// One visible cell: pattern on top (0 = empty) and how many layers are still stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileView {
    pub pattern: u8,
    pub depth: u8,
}

/// Everything the host needs to draw a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub size: usize,
    pub layers: usize,
    /// Row-major, `size * size` entries.
    pub tiles: Vec<TileView>,
    pub selection: Option<Pos>,
    /// Cosmetic wobble for the selected tile, in [-2, 2].
    pub shake: f32,
    pub combo_notice: Option<Notice>,
    pub miss_notice: Option<Notice>,
    pub combo_count: u32,
    pub max_combo_count: u32,
    pub highest_combo: u32,
    pub remaining: Duration,
    pub time_limit: Duration,
    pub paused: bool,
    pub outcome: Option<Outcome>,
    pub store_warning: Option<String>,
}

impl Snapshot {
    pub fn tile(&self, pos: Pos) -> TileView {
        if pos.row >= self.size || pos.col >= self.size {
            return TileView::default();
        }
        self.tiles[pos.row * self.size + pos.col]
    }
}

pub struct Session<S: HighScoreStore> {
    board: Board,
    selection: Option<Pos>,
    combo: ComboTracker,
    store: S,
    store_warning: Option<String>,
    created_at: Instant,
    start_time: Instant,
    time_limit: Duration,
    phase: Phase,
}

impl<S: HighScoreStore> Session<S> {
    /// Deal a new board and start the clock at `now`.
    pub fn new<R: Rng + ?Sized>(
        config: &GameConfig,
        rng: &mut R,
        store: S,
        now: Instant,
    ) -> Result<Self, BoardError> {
        let board = Board::create(config.board, rng)?;
        Ok(Self::with_board(board, config.time_limit, store, now))
    }

    /// Start a session on a prepared board. Reads the all-time best from `store`.
    pub fn with_board(board: Board, time_limit: Duration, store: S, now: Instant) -> Self {
        let mut session = Self {
            board,
            selection: None,
            combo: ComboTracker::new(0),
            store,
            store_warning: None,
            created_at: now,
            start_time: now,
            time_limit,
            phase: Phase::Running,
        };
        session.reset(now);
        session
    }

    /// Begin a fresh play-through on `board`, keeping the store.
    pub fn restart(&mut self, board: Board, now: Instant) {
        self.board = board;
        self.reset(now);
    }

    /// Restart the countdown at `now`, keeping the board and combo state.
    pub fn start_clock(&mut self, now: Instant) {
        self.created_at = now;
        self.start_time = now;
        self.phase = Phase::Running;
    }

    fn reset(&mut self, now: Instant) {
        self.selection = None;
        self.combo = ComboTracker::new(self.store.read());
        self.store_warning = None;
        self.start_clock(now);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn selection(&self) -> Option<Pos> {
        self.selection
    }

    #[cfg(test)]
    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused { .. })
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Finished(o) => Some(o),
            _ => None,
        }
    }

    /// Active play time; frozen while paused.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let until = match self.phase {
            Phase::Paused { since } => since,
            _ => now,
        };
        until.saturating_duration_since(self.start_time)
    }

    pub fn remaining_time(&self, now: Instant) -> Duration {
        self.time_limit.saturating_sub(self.elapsed(now))
    }

    /// Flip between running and paused. Resuming shifts the clock by the paused span.
    pub fn toggle_pause(&mut self, now: Instant) {
        self.phase = match self.phase {
            Phase::Running => Phase::Paused { since: now },
            Phase::Paused { since } => {
                self.start_time += now.saturating_duration_since(since);
                Phase::Running
            }
            finished @ Phase::Finished(_) => finished,
        };
    }

    /// Handle a click on grid cell `pos`.
    pub fn click(&mut self, pos: Pos, now: Instant) -> ClickOutcome {
        if self.phase != Phase::Running || !self.board.contains(pos) {
            return ClickOutcome::Ignored;
        }
        let Some(first) = self.selection.take() else {
            if self.board.top_pattern(pos) == 0 {
                return ClickOutcome::Ignored;
            }
            self.selection = Some(pos);
            return ClickOutcome::Selected(pos);
        };

        if !can_connect(&self.board, first, pos) {
            self.combo.record_miss(now);
            return ClickOutcome::Rejected { first, second: pos };
        }

        self.board.remove(first);
        self.board.remove(pos);
        let record = self.combo.record_match(now);
        if let Some(best) = record.new_record {
            self.persist_highest(best);
        }
        self.check_finished(now);
        ClickOutcome::Matched {
            first,
            second: pos,
            combo: record.combo,
        }
    }

    fn persist_highest(&mut self, best: u32) {
        match self.store.write(best) {
            Ok(()) => self.store_warning = None,
            Err(e) => self.store_warning = Some(e.to_string()),
        }
    }

    fn check_finished(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        let kind = if self.board.is_cleared() {
            OutcomeKind::Won
        } else if self.remaining_time(now).is_zero() {
            OutcomeKind::Lost
        } else {
            return;
        };
        self.selection = None;
        self.phase = Phase::Finished(Outcome {
            kind,
            max_combo: self.combo.max_combo_count(),
        });
    }

    /// Advance the clock: check for win/timeout, then describe the frame.
    pub fn tick(&mut self, now: Instant) -> Snapshot {
        self.check_finished(now);
        self.snapshot(now)
    }

    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let n = self.board.size();
        let tiles = (0..n)
            .flat_map(|row| (0..n).map(move |col| Pos::new(row, col)))
            .map(|pos| TileView {
                pattern: self.board.top_pattern(pos),
                depth: self.board.depth(pos).min(u8::MAX as usize) as u8,
            })
            .collect();
        let wobble = now.saturating_duration_since(self.created_at).as_secs_f32();
        Snapshot {
            size: n,
            layers: self.board.layers(),
            tiles,
            selection: self.selection,
            shake: (wobble * 20.0).sin() * 2.0,
            combo_notice: self.combo.combo_notice(now),
            miss_notice: self.combo.miss_notice(now),
            combo_count: self.combo.combo_count(),
            max_combo_count: self.combo.max_combo_count(),
            highest_combo: self.combo.highest_combo(),
            remaining: self.remaining_time(now),
            time_limit: self.time_limit,
            paused: self.is_paused(),
            outcome: self.outcome(),
            store_warning: self.store_warning.clone(),
        }
    }
}
