//! Board: square grid of cells, each holding a stack of layered pattern slots.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// Upper bound on distinct patterns (one glyph/colour each in the UI).
pub const MAX_PATTERNS: u8 = 16;
/// Largest board edge; keeps the drawn board within terminal coordinates.
pub const MAX_GRID_SIZE: usize = 64;
/// Deepest stack per cell.
pub const MAX_LAYERS: usize = 64;

/// Grid coordinate: `row` counts down from the top, `col` left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Board dimensions and pattern count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub grid_size: usize,
    pub layers: usize,
    pub pattern_count: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            grid_size: 8,
            layers: 3,
            pattern_count: 8,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("grid size and layer count must both be at least 1")]
    EmptyGrid,
    #[error("grid size must be at most {max}, got {0}", max = MAX_GRID_SIZE)]
    GridTooLarge(usize),
    #[error("layer count must be at most {max}, got {0}", max = MAX_LAYERS)]
    TooManyLayers(usize),
    #[error("pattern count must be in 1..={max}, got {0}", max = MAX_PATTERNS)]
    PatternCount(u8),
    #[error("{slots} slots cannot be split evenly across {patterns} patterns")]
    UnevenPool { slots: usize, patterns: u8 },
}

impl BoardConfig {
    /// Total number of slots (cells × layers).
    pub fn pool_size(&self) -> usize {
        self.grid_size
            .saturating_mul(self.grid_size)
            .saturating_mul(self.layers)
    }

    /// How many times each pattern id appears on a fresh board.
    pub fn copies_per_pattern(&self) -> usize {
        self.pool_size() / self.pattern_count.max(1) as usize
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.grid_size == 0 || self.layers == 0 {
            return Err(BoardError::EmptyGrid);
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(BoardError::GridTooLarge(self.grid_size));
        }
        if self.layers > MAX_LAYERS {
            return Err(BoardError::TooManyLayers(self.layers));
        }
        if self.pattern_count == 0 || self.pattern_count > MAX_PATTERNS {
            return Err(BoardError::PatternCount(self.pattern_count));
        }
        if self.pool_size() % self.pattern_count as usize != 0 {
            return Err(BoardError::UnevenPool {
                slots: self.pool_size(),
                patterns: self.pattern_count,
            });
        }
        Ok(())
    }
}

/// Layered tile grid. Slot value 0 is empty, otherwise a pattern id in `1..=pattern_count`.
///
/// Visibility follows scan order: the first non-zero slot from layer index 0 upward is
/// the visible, interactive tile of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    config: BoardConfig,
    /// slots[(row * size + col) * layers + layer]
    slots: Vec<u8>,
}

impl Board {
    /// Deal a fresh board: every pattern repeated equally, shuffled, then laid out
    /// layer 0 first and row-major within each layer.
    pub fn create<R: Rng + ?Sized>(config: BoardConfig, rng: &mut R) -> Result<Self, BoardError> {
        config.validate()?;
        let copies = config.copies_per_pattern();
        let mut pool: Vec<u8> = (1..=config.pattern_count)
            .flat_map(|p| std::iter::repeat_n(p, copies))
            .collect();
        pool.shuffle(rng);

        let mut board = Self {
            config,
            slots: vec![0; config.pool_size()],
        };
        let mut dealt = pool.into_iter();
        for layer in 0..config.layers {
            for row in 0..config.grid_size {
                for col in 0..config.grid_size {
                    let idx = board.slot_index(Pos::new(row, col), layer);
                    board.slots[idx] = dealt.next().unwrap_or(0);
                }
            }
        }
        Ok(board)
    }

    /// Build a board from explicit stacks, `stacks[row][col][layer]`.
    #[cfg(test)]
    pub fn from_stacks(config: BoardConfig, stacks: &[Vec<Vec<u8>>]) -> Self {
        let mut slots = Vec::with_capacity(config.pool_size());
        for row in stacks {
            for cell in row {
                assert_eq!(cell.len(), config.layers, "stack depth must match layer count");
                slots.extend_from_slice(cell);
            }
        }
        assert_eq!(slots.len(), config.pool_size(), "stacks must cover the whole grid");
        Self { config, slots }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.grid_size
    }

    #[inline]
    pub fn layers(&self) -> usize {
        self.config.layers
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.config.grid_size && pos.col < self.config.grid_size
    }

    #[inline]
    fn slot_index(&self, pos: Pos, layer: usize) -> usize {
        (pos.row * self.config.grid_size + pos.col) * self.config.layers + layer
    }

    fn stack(&self, pos: Pos) -> &[u8] {
        if !self.contains(pos) {
            return &[];
        }
        let start = self.slot_index(pos, 0);
        &self.slots[start..start + self.config.layers]
    }

    /// Visible pattern at `pos`: first non-zero slot in layer-index order, or 0.
    pub fn top_pattern(&self, pos: Pos) -> u8 {
        self.stack(pos).iter().copied().find(|&p| p != 0).unwrap_or(0)
    }

    /// Number of occupied layers at `pos`.
    pub fn depth(&self, pos: Pos) -> usize {
        self.stack(pos).iter().filter(|&&p| p != 0).count()
    }

    /// Clear the visible slot at `pos`. Returns the removed pattern, or `None` for an
    /// empty or out-of-bounds cell.
    pub fn remove(&mut self, pos: Pos) -> Option<u8> {
        if !self.contains(pos) {
            return None;
        }
        let start = self.slot_index(pos, 0);
        let slot = self.slots[start..start + self.config.layers]
            .iter_mut()
            .find(|p| **p != 0)?;
        Some(std::mem::take(slot))
    }

    /// True once every slot is empty.
    pub fn is_cleared(&self) -> bool {
        self.slots.iter().all(|&p| p == 0)
    }

    /// Count of non-empty slots.
    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.slots.iter().filter(|&&p| p != 0).count()
    }

    /// Occurrences of each pattern id; index 0 holds pattern 1.
    #[cfg(test)]
    pub fn pattern_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.config.pattern_count as usize];
        for &p in self.slots.iter().filter(|&&p| p != 0) {
            if let Some(c) = counts.get_mut(p as usize - 1) {
                *c += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small() -> BoardConfig {
        BoardConfig {
            grid_size: 2,
            layers: 3,
            pattern_count: 4,
        }
    }

    #[test]
    fn test_default_deal_has_24_of_each_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::create(BoardConfig::default(), &mut rng).unwrap();
        assert_eq!(board.remaining(), 192);
        assert_eq!(board.pattern_counts(), vec![24; 8]);
    }

    #[test]
    fn test_every_seed_deals_even_counts() {
        let config = BoardConfig {
            grid_size: 4,
            layers: 2,
            pattern_count: 4,
        };
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::create(config, &mut rng).unwrap();
            assert_eq!(board.pattern_counts(), vec![config.copies_per_pattern(); 4]);
            assert!(!board.is_cleared());
        }
    }

    #[test]
    fn test_same_seed_same_deal() {
        let a = Board::create(BoardConfig::default(), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = Board::create(BoardConfig::default(), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_uneven_pool_is_rejected() {
        let config = BoardConfig {
            grid_size: 3,
            layers: 1,
            pattern_count: 4,
        };
        let err = Board::create(config, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            BoardError::UnevenPool {
                slots: 9,
                patterns: 4
            }
        );
    }

    #[test]
    fn test_degenerate_configs_are_rejected() {
        let mut c = small();
        c.grid_size = 0;
        assert_eq!(c.validate(), Err(BoardError::EmptyGrid));
        let mut c = small();
        c.pattern_count = 0;
        assert_eq!(c.validate(), Err(BoardError::PatternCount(0)));
        let mut c = small();
        c.pattern_count = MAX_PATTERNS + 1;
        assert_eq!(c.validate(), Err(BoardError::PatternCount(MAX_PATTERNS + 1)));
    }

    #[test]
    fn test_oversized_configs_are_rejected_without_overflow() {
        let huge = BoardConfig {
            grid_size: 1 << 32,
            layers: 1,
            pattern_count: 1,
        };
        assert_eq!(huge.validate(), Err(BoardError::GridTooLarge(1 << 32)));
        assert_eq!(huge.pool_size(), usize::MAX);

        let deep = BoardConfig {
            layers: usize::MAX,
            ..small()
        };
        assert_eq!(deep.validate(), Err(BoardError::TooManyLayers(usize::MAX)));

        let edge = BoardConfig {
            grid_size: MAX_GRID_SIZE,
            layers: 1,
            pattern_count: 1,
        };
        assert_eq!(edge.validate(), Ok(()));
    }

    #[test]
    fn test_top_pattern_scans_from_layer_zero() {
        let board = Board::from_stacks(
            small(),
            &[
                vec![vec![0, 3, 4], vec![2, 0, 1]],
                vec![vec![0, 0, 0], vec![0, 0, 4]],
            ],
        );
        assert_eq!(board.top_pattern(Pos::new(0, 0)), 3);
        // Layer 0 wins even though later layers are occupied.
        assert_eq!(board.top_pattern(Pos::new(0, 1)), 2);
        assert_eq!(board.top_pattern(Pos::new(1, 0)), 0);
        assert_eq!(board.top_pattern(Pos::new(1, 1)), 4);
    }

    #[test]
    fn test_remove_clears_only_the_visible_slot() {
        let mut board = Board::from_stacks(
            small(),
            &[
                vec![vec![1, 2, 3], vec![0, 0, 4]],
                vec![vec![0, 0, 0], vec![1, 0, 2]],
            ],
        );
        assert_eq!(board.remove(Pos::new(0, 0)), Some(1));
        assert_eq!(board.top_pattern(Pos::new(0, 0)), 2);
        assert_eq!(board.depth(Pos::new(0, 0)), 2);

        assert_eq!(board.remove(Pos::new(1, 1)), Some(1));
        assert_eq!(board.top_pattern(Pos::new(1, 1)), 2);

        assert_eq!(board.remove(Pos::new(1, 0)), None);
        assert_eq!(board.remaining(), 4);
    }

    #[test]
    fn test_out_of_bounds_reads_as_empty() {
        let mut board = Board::create(small(), &mut StdRng::seed_from_u64(1)).unwrap();
        let before = board.clone();
        assert_eq!(board.top_pattern(Pos::new(2, 0)), 0);
        assert_eq!(board.depth(Pos::new(0, 9)), 0);
        assert_eq!(board.remove(Pos::new(5, 5)), None);
        assert_eq!(board, before);
    }

    #[test]
    fn test_is_cleared_after_removing_everything() {
        let mut board = Board::create(small(), &mut StdRng::seed_from_u64(3)).unwrap();
        for row in 0..2 {
            for col in 0..2 {
                while board.remove(Pos::new(row, col)).is_some() {}
            }
        }
        assert!(board.is_cleared());
        assert_eq!(board.remaining(), 0);
    }
}
