//! Drag-reorder engine.
//!
//! Owns the single drag session (the fragment currently being dragged) and
//! turns drag events into `BoardMutation`s: hover highlighting, filling an
//! empty slot, and swapping two fragments.
//!
//! ```text
//!   idle ──Start(fragment)──▶ dragging ──End──▶ idle
//! ```
//!
//! Every event other than `Start`, `End` and `Over` is ignored unless its
//! target belongs to the same widget as the dragged fragment.

use crate::input::{DragEvent, DragResponse, DropEffect};
use pp_core::NodeIndex;
use pp_core::error::BoardError;
use pp_core::model::*;
use pp_render::hit::{DropTarget, fragment_of, resolve_target};

pub struct DragEngine {
    dragged: Option<NodeIndex>,
    drag_opacity: f32,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl DragEngine {
    pub fn new(drag_opacity: f32) -> Self {
        Self {
            dragged: None,
            drag_opacity,
        }
    }

    /// The fragment being dragged, if a session is active.
    pub fn dragged(&self) -> Option<NodeIndex> {
        self.dragged
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }

    /// Handle an event and apply the resulting mutations to `board`.
    ///
    /// The session is cleared on `End` before anything else happens, so a
    /// failed drop can never leave a stuck drag behind.
    pub fn dispatch(
        &mut self,
        board: &mut Board,
        event: &DragEvent,
    ) -> Result<DragResponse, BoardError> {
        let response = self.handle(board, event);
        for mutation in &response.mutations {
            board.apply(mutation)?;
        }
        Ok(response)
    }

    /// Compute the response to an event against the current board, without
    /// applying it. Session state is updated.
    pub fn handle(&mut self, board: &Board, event: &DragEvent) -> DragResponse {
        match *event {
            DragEvent::Start { target } => self.start(board, target),
            DragEvent::End => self.end(board),
            DragEvent::Over => DragResponse::suppress(),
            DragEvent::Enter { target } => self.enter(board, target),
            DragEvent::Leave { target, related } => self.leave(board, target, related),
            DragEvent::Drop { target } => self.drop_on(board, target),
        }
    }

    // ─── Session ─────────────────────────────────────────────────────────

    fn start(&mut self, board: &Board, target: NodeIndex) -> DragResponse {
        let Some(element) = board.get(target).filter(|e| e.is_fragment()) else {
            return DragResponse::suppress();
        };

        let mut response = DragResponse::ignored();
        // A previous gesture whose `dragend` never arrived.
        if let Some(stale) = self.dragged.take()
            && let Some(id) = board.id_of(stale)
        {
            response.mutations.push(BoardMutation::SetOpacity {
                node: id,
                opacity: None,
            });
        }

        log::debug!("drag start: {}", element.id);
        self.dragged = Some(target);
        response.mutations.push(BoardMutation::SetOpacity {
            node: element.id,
            opacity: Some(self.drag_opacity),
        });
        response
    }

    fn end(&mut self, board: &Board) -> DragResponse {
        let mut response = DragResponse::suppress();
        if let Some(dragged) = self.dragged.take()
            && let Some(id) = board.id_of(dragged)
        {
            log::debug!("drag end: {id}");
            response.mutations.push(BoardMutation::SetOpacity {
                node: id,
                opacity: None,
            });
        }
        response
    }

    /// The dragged fragment, if `target` belongs to the same widget.
    fn session_for(&self, board: &Board, target: NodeIndex) -> Option<NodeIndex> {
        let dragged = self.dragged?;
        board.same_widget(target, dragged).then_some(dragged)
    }

    // ─── Hover ───────────────────────────────────────────────────────────

    fn enter(&self, board: &Board, target: NodeIndex) -> DragResponse {
        let Some(dragged) = self.session_for(board, target) else {
            return DragResponse::ignored();
        };
        let Some(node) = resolve_target(board, target).node() else {
            return DragResponse::ignored();
        };

        let mut response = DragResponse {
            drop_effect: Some(DropEffect::Move),
            ..DragResponse::ignored()
        };
        if node != dragged {
            response.mutations.extend(hover(board, node, true));
        }
        response
    }

    fn leave(&self, board: &Board, target: NodeIndex, related: Option<NodeIndex>) -> DragResponse {
        if self.session_for(board, target).is_none() {
            return DragResponse::ignored();
        }
        let Some(node) = resolve_target(board, target).node() else {
            return DragResponse::ignored();
        };
        // Moving between a fragment and its own children is not a leave.
        if related.and_then(|r| fragment_of(board, r)) == Some(node) {
            return DragResponse::ignored();
        }

        DragResponse {
            drop_effect: Some(DropEffect::None),
            mutations: hover(board, node, false).into_iter().collect(),
            ..DragResponse::ignored()
        }
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    fn drop_on(&self, board: &Board, target: NodeIndex) -> DragResponse {
        let mut response = DragResponse::suppress();
        let Some(dragged) = self.session_for(board, target) else {
            return response;
        };

        let moved = match resolve_target(board, target) {
            DropTarget::Slot(slot) => fill_slot(board, dragged, slot),
            DropTarget::Fragment(hit) if hit == dragged => {
                response.mutations.extend(hover(board, hit, false));
                return response;
            }
            DropTarget::Fragment(hit) => swap_positions(board, dragged, hit),
            DropTarget::Other => None,
        };

        if let Some(mutations) = moved {
            response.mutations = mutations;
            response.mutations.extend(mark_stale(board, dragged));
        }
        response
    }
}

fn hover(board: &Board, node: NodeIndex, on: bool) -> Option<BoardMutation> {
    let element = board.get(node)?;
    (element.has_marker(Marker::Hovered) != on).then(|| BoardMutation::SetMarker {
        node: element.id,
        marker: Marker::Hovered,
        on,
    })
}

/// Move `dragged` into the position held by `slot`. The slot itself takes
/// the place the fragment left, whichever bucket that is, so the element
/// count of both buckets is unchanged.
fn fill_slot(board: &Board, dragged: NodeIndex, slot: NodeIndex) -> Option<Vec<BoardMutation>> {
    swap_positions(board, dragged, slot)
}

/// Exchange the positions of two elements, each keeping the other's
/// neighbours. When `hit` directly follows `dragged`, it goes back before
/// `dragged` instead of before its own old successor.
fn swap_positions(board: &Board, dragged: NodeIndex, hit: NodeIndex) -> Option<Vec<BoardMutation>> {
    let dragged_id = board.id_of(dragged)?;
    let hit_id = board.id_of(hit)?;
    let dragged_parent = board.id_of(board.parent(dragged)?)?;
    let hit_parent = board.id_of(board.parent(hit)?)?;

    let mut dragged_next = board.next_sibling(dragged);
    if dragged_next == Some(hit) {
        dragged_next = Some(dragged);
    }
    let dragged_next = match dragged_next {
        Some(n) => Some(board.id_of(n)?),
        None => None,
    };

    let mut mutations = vec![
        BoardMutation::InsertBefore {
            node: dragged_id,
            parent: hit_parent,
            anchor: Some(hit_id),
        },
        BoardMutation::Detach { node: hit_id },
        BoardMutation::InsertBefore {
            node: hit_id,
            parent: dragged_parent,
            anchor: dragged_next,
        },
    ];
    mutations.extend(hover(board, dragged, false));
    mutations.extend(hover(board, hit, false));
    Some(mutations)
}

/// Mark every error note and test entry of the widget owning `node` stale.
fn mark_stale(board: &Board, node: NodeIndex) -> Vec<BoardMutation> {
    let Some(container) = board.owner_of(node) else {
        return Vec::new();
    };
    board
        .query(container, |k| {
            matches!(k, ElementKind::ErrorNote(_) | ElementKind::TestEntry { .. })
        })
        .into_iter()
        .filter_map(|n| board.get(n))
        .filter(|e| !e.has_marker(Marker::Stale))
        .map(|e| BoardMutation::SetMarker {
            node: e.id,
            marker: Marker::Stale,
            on: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::config::WidgetConfig;
    use pp_core::id::ElementId;
    use pp_core::puzzle::parse_puzzle;
    use pp_render::bucket::{add_container, fragment_codes, positions, setup_widget};
    use pretty_assertions::assert_eq;

    struct Fixture {
        board: Board,
        source: NodeIndex,
        solution: NodeIndex,
        engine: DragEngine,
    }

    fn fixture(json: &str) -> Fixture {
        let mut board = Board::new();
        let container = add_container(&mut board, ElementId::mint("widget")).unwrap();
        let puzzle = parse_puzzle(json).unwrap();
        setup_widget(&mut board, container, puzzle, &WidgetConfig::default()).unwrap();
        let widget = board.widget(container).unwrap();
        let (source, solution) = (widget.source_bucket, widget.solution_bucket);
        Fixture {
            board,
            source,
            solution,
            engine: DragEngine::default(),
        }
    }

    impl Fixture {
        fn send(&mut self, event: DragEvent) -> DragResponse {
            self.engine.dispatch(&mut self.board, &event).unwrap()
        }

        fn drag(&mut self, from: NodeIndex, to: NodeIndex) {
            self.send(DragEvent::Start { target: from });
            self.send(DragEvent::Enter { target: to });
            self.send(DragEvent::Drop { target: to });
            self.send(DragEvent::End);
        }
    }

    #[test]
    fn start_only_on_fragments() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let slot = positions(&f.board, f.solution)[0];
        let response = f.send(DragEvent::Start { target: slot });
        assert!(response.prevent_default);
        assert!(!f.engine.is_dragging());

        let frag = positions(&f.board, f.source)[0];
        f.send(DragEvent::Start { target: frag });
        assert_eq!(f.engine.dragged(), Some(frag));
        assert_eq!(f.board.get(frag).unwrap().opacity, Some(0.6));

        f.send(DragEvent::End);
        assert!(!f.engine.is_dragging());
        assert_eq!(f.board.get(frag).unwrap().opacity, None);
    }

    #[test]
    fn enter_and_leave_toggle_hover() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let frag = positions(&f.board, f.source)[0];
        let slot = positions(&f.board, f.solution)[0];
        f.send(DragEvent::Start { target: frag });

        let response = f.send(DragEvent::Enter { target: slot });
        assert_eq!(response.drop_effect, Some(DropEffect::Move));
        assert!(f.board.get(slot).unwrap().has_marker(Marker::Hovered));

        // The dragged fragment never highlights itself.
        f.send(DragEvent::Enter { target: frag });
        assert!(!f.board.get(frag).unwrap().has_marker(Marker::Hovered));

        let response = f.send(DragEvent::Leave { target: slot, related: None });
        assert_eq!(response.drop_effect, Some(DropEffect::None));
        assert!(!f.board.get(slot).unwrap().has_marker(Marker::Hovered));
    }

    #[test]
    fn drop_on_slot_fills_it_and_backfills_source() {
        let mut f = fixture(r#"{"code": "a\nb\nc"}"#);
        let frag = positions(&f.board, f.source)[1];
        let slot = positions(&f.board, f.solution)[2];
        f.drag(frag, slot);

        assert_eq!(positions(&f.board, f.solution)[2], frag);
        let source = positions(&f.board, f.source);
        assert_eq!(source.len(), 3);
        assert!(f.board.get(source[1]).unwrap().is_slot());
        assert_eq!(fragment_codes(&f.board, f.source), vec!["a", "c"]);
    }

    #[test]
    fn filled_slot_is_reused_as_backfill() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let frag = positions(&f.board, f.source)[0];
        let slot = positions(&f.board, f.solution)[1];
        let slot_id = f.board.id_of(slot).unwrap();
        let ids_before = f.board.query(f.board.root, |_| true).len();

        f.drag(frag, slot);
        assert_eq!(positions(&f.board, f.source)[0], slot);
        assert_eq!(f.board.index_of(slot_id), Some(slot));
        assert!(!f.board.get(slot).unwrap().has_marker(Marker::Hovered));

        f.drag(frag, positions(&f.board, f.solution)[0]);
        f.drag(frag, slot);
        assert_eq!(positions(&f.board, f.source)[0], frag);
        assert_eq!(f.board.query(f.board.root, |_| true).len(), ids_before);
    }

    #[test]
    fn swap_with_next_sibling_transposes() {
        let mut f = fixture(r#"{"code": "a\nb\nc"}"#);
        let p = positions(&f.board, f.source);
        f.drag(p[0], p[1]);
        assert_eq!(fragment_codes(&f.board, f.source), vec!["b", "a", "c"]);

        let p = positions(&f.board, f.source);
        f.drag(p[1], p[0]);
        assert_eq!(fragment_codes(&f.board, f.source), vec!["a", "b", "c"]);
    }

    #[test]
    fn swap_across_buckets_keeps_neighbours() {
        let mut f = fixture(r#"{"code": "a\nb\nc"}"#);
        let src = positions(&f.board, f.source);
        let slots = positions(&f.board, f.solution);
        f.drag(src[0], slots[1]);
        // Solution: [slot, a, slot]; source: [slot, b, c]
        let b = src[1];
        let a = src[0];
        f.drag(b, a);

        assert_eq!(positions(&f.board, f.solution)[1], b);
        assert_eq!(positions(&f.board, f.source)[1], a);
        assert!(!f.board.get(a).unwrap().has_marker(Marker::Hovered));
        assert!(!f.board.get(b).unwrap().has_marker(Marker::Hovered));
    }

    #[test]
    fn drop_on_self_is_a_no_op() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let before = positions(&f.board, f.source);
        f.drag(before[0], before[0]);
        assert_eq!(positions(&f.board, f.source), before);
    }

    #[test]
    fn drop_without_session_is_ignored() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let slot = positions(&f.board, f.solution)[0];
        let response = f.send(DragEvent::Drop { target: slot });
        assert!(response.mutations.is_empty());
        assert!(f.board.contains(slot));
    }

    #[test]
    fn drop_on_bucket_does_nothing() {
        let mut f = fixture(r#"{"code": "a\nb"}"#);
        let frag = positions(&f.board, f.source)[0];
        f.send(DragEvent::Start { target: frag });
        let response = f.send(DragEvent::Drop { target: f.solution });
        assert!(response.prevent_default);
        assert!(response.mutations.is_empty());
    }
}
