//! Match legality between two board cells.

use crate::board::{Board, Pos};

/// Two cells connect when they are distinct and show the same non-empty pattern.
pub fn can_connect(board: &Board, a: Pos, b: Pos) -> bool {
    let pattern = board.top_pattern(a);
    a != b && pattern != 0 && pattern == board.top_pattern(b)
}
