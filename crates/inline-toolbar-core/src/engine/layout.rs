use std::collections::HashMap;

use crate::engine::LineId;

/// Rendering-side measurement used to place the toolbar anchor.
pub trait LayoutQuery {
    /// Current top offset of the rendered line, in the surface's units
    fn measure_line_top(&self, line: LineId) -> f32;
}

impl<F> LayoutQuery for F
where
    F: Fn(LineId) -> f32,
{
    fn measure_line_top(&self, line: LineId) -> f32 {
        self(line)
    }
}

/// Layout for surfaces where every line has the same height (terminals, tests).
///
/// Rows are refreshed by the host after each render; unknown lines measure 0.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    rows: HashMap<LineId, usize>,
    line_height: f32,
}

impl RowLayout {
    pub fn new(line_height: f32) -> Self {
        Self {
            rows: HashMap::new(),
            line_height,
        }
    }

    /// Rebuild the row table from line ids in document order
    pub fn refresh(&mut self, lines: impl IntoIterator<Item = LineId>) {
        self.rows = lines
            .into_iter()
            .enumerate()
            .map(|(row, id)| (id, row))
            .collect();
    }

    pub fn row_of(&self, line: LineId) -> Option<usize> {
        self.rows.get(&line).copied()
    }
}

impl LayoutQuery for RowLayout {
    fn measure_line_top(&self, line: LineId) -> f32 {
        match self.row_of(line) {
            Some(row) => row as f32 * self.line_height,
            None => {
                log::warn!("No layout row for {line}, anchoring at top");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout_measures_by_row() {
        let ids = [LineId::new(), LineId::new(), LineId::new()];
        let mut layout = RowLayout::new(20.0);
        layout.refresh(ids);

        assert_eq!(layout.measure_line_top(ids[0]), 0.0);
        assert_eq!(layout.measure_line_top(ids[2]), 40.0);
        assert_eq!(layout.row_of(ids[1]), Some(1));
    }

    #[test]
    fn test_row_layout_unknown_line_measures_zero() {
        let layout = RowLayout::new(20.0);
        assert_eq!(layout.measure_line_top(LineId::new()), 0.0);
    }

    #[test]
    fn test_closure_is_a_layout() {
        let layout = |_line: LineId| 12.5;
        assert_eq!(layout.measure_line_top(LineId::new()), 12.5);
    }
}
