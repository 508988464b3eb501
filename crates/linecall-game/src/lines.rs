//! Win detection: which lines of a marking matrix are complete.

use serde::{Deserialize, Serialize};

use crate::Marks;

/// The orientation of a completed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Row,
    Column,
    Diagonal,
}

/// One completed line. For diagonals, index 0 is the main diagonal and
/// index 1 the anti-diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub index: usize,
}

/// Returns every completed row, column, and diagonal of `marks`.
///
/// Pure and deterministic: the same matrix always yields the same set,
/// regardless of the order in which cells were marked.
pub fn completed_lines(marks: &Marks) -> Vec<Line> {
    let n = marks.size();
    let mut lines = Vec::new();

    for i in 0..n {
        if (0..n).all(|j| marks.is_marked(i, j)) {
            lines.push(Line { kind: LineKind::Row, index: i });
        }
    }
    for j in 0..n {
        if (0..n).all(|i| marks.is_marked(i, j)) {
            lines.push(Line { kind: LineKind::Column, index: j });
        }
    }
    if (0..n).all(|i| marks.is_marked(i, i)) {
        lines.push(Line { kind: LineKind::Diagonal, index: 0 });
    }
    if (0..n).all(|i| marks.is_marked(i, n - 1 - i)) {
        lines.push(Line { kind: LineKind::Diagonal, index: 1 });
    }

    lines
}
