//! Widget registry: container → widget state back-references.
//!
//! A widget's state hangs off its container element. Any element finds its
//! owning widget by walking up to the first ancestor carrying an attachment;
//! nothing points from a widget down to arbitrary descendants.

use crate::error::BoardError;
use crate::model::Board;
use crate::puzzle::{Puzzle, PuzzleModel};
use petgraph::graph::NodeIndex;

/// State of one puzzle instance.
#[derive(Debug, Clone)]
pub struct Widget {
    pub puzzle: Puzzle,
    pub model: PuzzleModel,
    pub source_bucket: NodeIndex,
    pub solution_bucket: NodeIndex,
    pub eval_button: Option<NodeIndex>,
    pub indicator: Option<NodeIndex>,
    /// One entry per test, in puzzle order.
    pub test_entries: Vec<NodeIndex>,
    pub solved: bool,
    /// Fragment codes of the last arrangement that solved the puzzle.
    pub last_solution: Option<Vec<String>>,
}

impl Widget {
    pub fn new(
        puzzle: Puzzle,
        model: PuzzleModel,
        source_bucket: NodeIndex,
        solution_bucket: NodeIndex,
    ) -> Self {
        Self {
            puzzle,
            model,
            source_bucket,
            solution_bucket,
            eval_button: None,
            indicator: None,
            test_entries: Vec::new(),
            solved: false,
            last_solution: None,
        }
    }
}

impl Board {
    /// Attach widget state to `container`, replacing any previous widget.
    pub fn attach(&mut self, container: NodeIndex, widget: Widget) -> Result<(), BoardError> {
        let element = self
            .get_mut(container)
            .ok_or(BoardError::Missing(container))?;
        element.widget = Some(Box::new(widget));
        Ok(())
    }

    /// Remove and return the widget attached to `container`.
    pub fn detach_widget(&mut self, container: NodeIndex) -> Option<Widget> {
        self.get_mut(container)?.widget.take().map(|w| *w)
    }

    /// The container owning `node`: the nearest ancestor-or-self carrying a
    /// widget. `None` when the walk reaches the root without finding one.
    pub fn owner_of(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.ancestors(node)
            .find(|&idx| self.get(idx).is_some_and(|e| e.widget.is_some()))
    }

    pub fn widget(&self, container: NodeIndex) -> Option<&Widget> {
        self.get(container)?.widget.as_deref()
    }

    pub fn widget_mut(&mut self, container: NodeIndex) -> Option<&mut Widget> {
        self.get_mut(container)?.widget.as_deref_mut()
    }

    /// The widget owning `node`, with its container.
    pub fn widget_of(&self, node: NodeIndex) -> Option<(NodeIndex, &Widget)> {
        let container = self.owner_of(node)?;
        self.widget(container).map(|w| (container, w))
    }

    /// True when both elements belong to the same attached widget. Elements
    /// outside every widget never match, not even each other.
    pub fn same_widget(&self, a: NodeIndex, b: NodeIndex) -> bool {
        match (self.owner_of(a), self.owner_of(b)) {
            (Some(wa), Some(wb)) => wa == wb,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;
    use crate::model::{Element, ElementKind};

    fn container(board: &mut Board, name: &str) -> (NodeIndex, NodeIndex, NodeIndex) {
        let root = board.root;
        let c = board
            .add_child(root, Element::new(ElementId::intern(name), ElementKind::Container))
            .unwrap();
        let src = board
            .add_child(c, Element::new(ElementId::mint("src"), ElementKind::SourceBucket))
            .unwrap();
        let soln = board
            .add_child(c, Element::new(ElementId::mint("soln"), ElementKind::SolutionBucket))
            .unwrap();
        let puzzle = Puzzle::demo();
        let model = PuzzleModel::from_puzzle(&puzzle);
        board.attach(c, Widget::new(puzzle, model, src, soln)).unwrap();
        (c, src, soln)
    }

    #[test]
    fn owner_is_found_from_any_descendant() {
        let mut board = Board::new();
        let (c, src, soln) = container(&mut board, "w1");
        let frag = board.add_child(src, Element::fragment("a")).unwrap();

        assert_eq!(board.owner_of(frag), Some(c));
        assert_eq!(board.owner_of(soln), Some(c));
        assert_eq!(board.owner_of(c), Some(c));
        assert_eq!(board.owner_of(board.root), None);
        assert!(board.same_widget(frag, soln));
    }

    #[test]
    fn different_widgets_do_not_match() {
        let mut board = Board::new();
        let (_, src_a, _) = container(&mut board, "wa");
        let (_, _, soln_b) = container(&mut board, "wb");
        let frag = board.add_child(src_a, Element::fragment("a")).unwrap();
        assert!(!board.same_widget(frag, soln_b));
    }

    #[test]
    fn unattached_elements_never_match() {
        let mut board = Board::new();
        let root = board.root;
        let loose_a = board.add_child(root, Element::slot()).unwrap();
        let loose_b = board.add_child(root, Element::slot()).unwrap();
        assert!(!board.same_widget(loose_a, loose_b));
    }

    #[test]
    fn detached_widget_stops_owning() {
        let mut board = Board::new();
        let (c, src, _) = container(&mut board, "wd");
        assert!(board.detach_widget(c).is_some());
        assert_eq!(board.owner_of(src), None);
    }
}
