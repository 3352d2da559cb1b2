//! Puzzle sequencer: one container, a list of puzzles, shown one at a time.

use pp_core::NodeIndex;
use pp_core::config::WidgetConfig;
use pp_core::error::BoardError;
use pp_core::model::Board;
use pp_core::puzzle::Puzzle;
use pp_render::bucket::{setup_widget, teardown_widget};

#[derive(Debug, Clone)]
pub struct Sequencer {
    container: NodeIndex,
    puzzles: Vec<Puzzle>,
    current: Option<usize>,
}

impl Sequencer {
    pub fn new(container: NodeIndex, puzzles: Vec<Puzzle>) -> Self {
        Self {
            container,
            puzzles,
            current: None,
        }
    }

    pub fn container(&self) -> NodeIndex {
        self.container
    }

    /// Index of the puzzle on display.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Render the first puzzle. Returns false when there is nothing to show.
    pub fn present(&mut self, board: &mut Board, config: &WidgetConfig) -> Result<bool, BoardError> {
        self.show(board, config, 0)
    }

    /// Replace the current puzzle with the next one. Past the end the
    /// current widget stays in place and false is returned.
    pub fn advance(&mut self, board: &mut Board, config: &WidgetConfig) -> Result<bool, BoardError> {
        let next = self.current.map_or(0, |i| i + 1);
        if next >= self.puzzles.len() {
            log::info!("puzzle sequence finished after {} puzzles", self.puzzles.len());
            return Ok(false);
        }
        teardown_widget(board, self.container)?;
        self.show(board, config, next)
    }

    fn show(&mut self, board: &mut Board, config: &WidgetConfig, index: usize) -> Result<bool, BoardError> {
        let Some(puzzle) = self.puzzles.get(index) else {
            return Ok(false);
        };
        log::debug!("presenting puzzle {} of {}", index + 1, self.puzzles.len());
        setup_widget(board, self.container, puzzle.clone(), config)?;
        self.current = Some(index);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::id::ElementId;
    use pp_core::puzzle::parse_puzzle_list;
    use pp_render::bucket::{add_container, fragment_codes};

    fn sequencer(board: &mut Board) -> Sequencer {
        let container = add_container(board, ElementId::mint("widget")).unwrap();
        let puzzles =
            parse_puzzle_list(r#"[{"code": "one"}, {"code": "two\nthree"}]"#, "test").unwrap();
        Sequencer::new(container, puzzles)
    }

    #[test]
    fn present_then_advance_to_end() {
        let mut board = Board::new();
        let config = WidgetConfig::default();
        let mut seq = sequencer(&mut board);
        assert_eq!(seq.current(), None);

        assert!(seq.present(&mut board, &config).unwrap());
        assert_eq!(seq.current(), Some(0));
        let widget = board.widget(seq.container()).unwrap();
        assert_eq!(fragment_codes(&board, widget.source_bucket), vec!["one"]);

        assert!(seq.advance(&mut board, &config).unwrap());
        assert_eq!(seq.current(), Some(1));
        let widget = board.widget(seq.container()).unwrap();
        assert_eq!(widget.model.slot_count(), 2);

        assert!(!seq.advance(&mut board, &config).unwrap());
        assert_eq!(seq.current(), Some(1));
        assert!(board.widget(seq.container()).is_some());
    }

    #[test]
    fn empty_sequence_shows_nothing() {
        let mut board = Board::new();
        let container = add_container(&mut board, ElementId::mint("widget")).unwrap();
        let mut seq = Sequencer::new(container, Vec::new());
        assert!(seq.is_empty());
        assert!(!seq.present(&mut board, &WidgetConfig::default()).unwrap());
        assert!(board.children(container).is_empty());
    }
}
