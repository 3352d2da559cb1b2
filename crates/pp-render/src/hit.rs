//! Drop-target resolution: event target → Fragment/Slot.
//!
//! Drag events land on whatever element is under the pointer, which may be an
//! error note or text inside a fragment. Resolution walks up to the nearest
//! element with a droppable role.

use pp_core::NodeIndex;
use pp_core::model::Board;

/// What a drag event target resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Slot(NodeIndex),
    Fragment(NodeIndex),
    /// Anything else: buckets, controls, elements outside every widget.
    Other,
}

impl DropTarget {
    pub fn node(self) -> Option<NodeIndex> {
        match self {
            DropTarget::Slot(n) | DropTarget::Fragment(n) => Some(n),
            DropTarget::Other => None,
        }
    }
}

/// The fragment containing `node` (or `node` itself), if any.
pub fn fragment_of(board: &Board, node: NodeIndex) -> Option<NodeIndex> {
    board
        .ancestors(node)
        .find(|&idx| board.get(idx).is_some_and(|e| e.is_fragment()))
}

/// Classify an event target. Slots only match directly: they have no
/// children that could receive events.
pub fn resolve_target(board: &Board, target: NodeIndex) -> DropTarget {
    match board.get(target) {
        Some(el) if el.is_slot() => DropTarget::Slot(target),
        Some(_) => fragment_of(board, target).map_or(DropTarget::Other, DropTarget::Fragment),
        None => DropTarget::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::id::ElementId;
    use pp_core::model::{Element, ElementKind, ErrorNote};

    #[test]
    fn note_inside_fragment_resolves_to_fragment() {
        let mut board = Board::new();
        let root = board.root;
        let frag = board.add_child(root, Element::fragment("a = 1")).unwrap();
        let note = board
            .add_child(
                frag,
                Element::new(
                    ElementId::mint("err"),
                    ElementKind::ErrorNote(ErrorNote {
                        summary: "NameError".into(),
                        message: "NameError: a".into(),
                        excerpt: None,
                        caret: None,
                    }),
                ),
            )
            .unwrap();

        assert_eq!(fragment_of(&board, note), Some(frag));
        assert_eq!(resolve_target(&board, note), DropTarget::Fragment(frag));
        assert_eq!(resolve_target(&board, frag), DropTarget::Fragment(frag));
    }

    #[test]
    fn slots_and_other_elements() {
        let mut board = Board::new();
        let root = board.root;
        let bucket = board
            .add_child(root, Element::new(ElementId::mint("soln"), ElementKind::SolutionBucket))
            .unwrap();
        let slot = board.add_child(bucket, Element::slot()).unwrap();

        assert_eq!(resolve_target(&board, slot), DropTarget::Slot(slot));
        assert_eq!(resolve_target(&board, bucket), DropTarget::Other);
        assert_eq!(resolve_target(&board, root), DropTarget::Other);
        assert_eq!(DropTarget::Slot(slot).node(), Some(slot));
        assert_eq!(DropTarget::Other.node(), None);
    }

    #[test]
    fn removed_node_is_other() {
        let mut board = Board::new();
        let root = board.root;
        let frag = board.add_child(root, Element::fragment("x")).unwrap();
        board.destroy(frag).unwrap();
        assert_eq!(resolve_target(&board, frag), DropTarget::Other);
    }
}
