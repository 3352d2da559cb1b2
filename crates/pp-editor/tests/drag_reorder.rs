//! Integration tests: drag-reorder engine over rendered widgets
//! (pp-editor ↔ pp-render ↔ pp-core).

use pp_core::NodeIndex;
use pp_core::id::ElementId;
use pp_core::model::*;
use pp_core::puzzle::{parse_puzzle, parse_puzzle_list};
use pp_editor::{DragEvent, PageEngine};
use pp_render::bucket::{fragment_codes, positions};
use pretty_assertions::assert_eq;

struct Buckets {
    source: NodeIndex,
    solution: NodeIndex,
}

fn buckets(page: &PageEngine, container: NodeIndex) -> Buckets {
    let widget = page.board.widget(container).unwrap();
    Buckets {
        source: widget.source_bucket,
        solution: widget.solution_bucket,
    }
}

fn drag(page: &mut PageEngine, from: NodeIndex, to: NodeIndex) {
    for event in [
        DragEvent::Start { target: from },
        DragEvent::Enter { target: to },
        DragEvent::Over,
        DragEvent::Drop { target: to },
        DragEvent::End,
    ] {
        page.handle_drag(&event).unwrap();
    }
}

fn position_count(page: &PageEngine, b: &Buckets) -> usize {
    positions(&page.board, b.source).len() + positions(&page.board, b.solution).len()
}

fn mount(page: &mut PageEngine, json: &str) -> NodeIndex {
    let puzzle = parse_puzzle(json).unwrap();
    page.mount(ElementId::mint("widget"), puzzle).unwrap()
}

// ─── Setup ──────────────────────────────────────────────────────────────

#[test]
fn blank_lines_do_not_become_slots() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, include_str!("fixtures/area.json"));
    let b = buckets(&page, container);

    assert_eq!(positions(&page.board, b.solution).len(), 3);
    assert_eq!(
        fragment_codes(&page.board, b.source),
        vec!["a = 3;", "b = 4;", "c = a*b;"]
    );
}

// ─── Slot fill ──────────────────────────────────────────────────────────

#[test]
fn fill_every_slot_in_order() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, include_str!("fixtures/area.json"));
    let b = buckets(&page, container);

    for i in 0..3 {
        let frag = positions(&page.board, b.source)
            .into_iter()
            .find(|&n| page.board.get(n).unwrap().is_fragment())
            .unwrap();
        let slot = positions(&page.board, b.solution)[i];
        drag(&mut page, frag, slot);
    }

    assert_eq!(
        fragment_codes(&page.board, b.solution),
        vec!["a = 3;", "b = 4;", "c = a*b;"]
    );
    // The source pool is left holding three slots.
    let source = positions(&page.board, b.source);
    assert_eq!(source.len(), 3);
    assert!(source.iter().all(|&n| page.board.get(n).unwrap().is_slot()));
    assert!(!page.is_dragging());
}

#[test]
fn fill_slot_from_solution_leaves_slot_behind() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, include_str!("fixtures/area.json"));
    let b = buckets(&page, container);

    let frag = positions(&page.board, b.source)[0];
    let first = positions(&page.board, b.solution)[0];
    drag(&mut page, frag, first);
    let last = positions(&page.board, b.solution)[2];
    drag(&mut page, frag, last);

    let soln = positions(&page.board, b.solution);
    assert!(page.board.get(soln[0]).unwrap().is_slot());
    assert!(page.board.get(soln[1]).unwrap().is_slot());
    assert_eq!(soln[2], frag);
}

// ─── Swap ───────────────────────────────────────────────────────────────

#[test]
fn adjacent_swap_and_reverse_swap() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, r#"{"code": "p\nq\nr\ns"}"#);
    let b = buckets(&page, container);
    let p = positions(&page.board, b.source);

    drag(&mut page, p[1], p[2]);
    assert_eq!(fragment_codes(&page.board, b.source), vec!["p", "r", "q", "s"]);

    drag(&mut page, p[2], p[1]);
    assert_eq!(fragment_codes(&page.board, b.source), vec!["p", "q", "r", "s"]);
}

#[test]
fn swap_last_with_first() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, r#"{"code": "p\nq\nr"}"#);
    let b = buckets(&page, container);
    let p = positions(&page.board, b.source);

    drag(&mut page, p[2], p[0]);
    assert_eq!(fragment_codes(&page.board, b.source), vec!["r", "q", "p"]);
}

// ─── Conservation ───────────────────────────────────────────────────────

#[test]
fn positions_are_conserved_across_a_session() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, r#"{"code": "a\nb\nc\nd", "extra": "x\ny"}"#);
    let b = buckets(&page, container);
    let before = position_count(&page, &b);
    let slots_before = positions(&page.board, b.solution).len();

    // A fixed walk over every kind of move.
    for step in 0..12 {
        let src = positions(&page.board, b.source);
        let soln = positions(&page.board, b.solution);
        let (from, to) = match step % 4 {
            0 => (src[step % src.len()], soln[step % soln.len()]),
            1 => (soln[0], soln[soln.len() - 1]),
            2 => (src[0], src[src.len() - 1]),
            _ => (soln[1], src[2]),
        };
        drag(&mut page, from, to);
        assert_eq!(position_count(&page, &b), before, "step {step}");
        assert_eq!(positions(&page.board, b.solution).len(), slots_before, "step {step}");
    }
}

// ─── Widget isolation ───────────────────────────────────────────────────

#[test]
fn cross_widget_drop_changes_nothing() {
    let mut page = PageEngine::default();
    let puzzles = parse_puzzle_list(include_str!("fixtures/two_widgets.json"), "fixture").unwrap();
    let mut containers = Vec::new();
    for puzzle in puzzles {
        containers.push(page.mount(ElementId::mint("widget"), puzzle).unwrap());
    }
    let first = buckets(&page, containers[0]);
    let second = buckets(&page, containers[1]);
    let snapshot = |page: &PageEngine| {
        [first.source, first.solution, second.source, second.solution]
            .map(|bucket| page.board.children(bucket).to_vec())
    };
    let before = snapshot(&page);

    let frag = positions(&page.board, first.source)[0];
    let foreign_slot = positions(&page.board, second.solution)[0];
    let foreign_frag = positions(&page.board, second.source)[0];
    page.handle_drag(&DragEvent::Start { target: frag }).unwrap();
    let enter = page.handle_drag(&DragEvent::Enter { target: foreign_slot }).unwrap();
    assert!(enter.drop_effect.is_none());
    page.handle_drag(&DragEvent::Drop { target: foreign_slot }).unwrap();
    page.handle_drag(&DragEvent::Drop { target: foreign_frag }).unwrap();
    page.handle_drag(&DragEvent::End).unwrap();

    assert_eq!(snapshot(&page), before);
    assert!(!page.board.get(foreign_slot).unwrap().has_marker(Marker::Hovered));
}

#[test]
fn array_code_keeps_multiline_blocks() {
    let mut page = PageEngine::default();
    let puzzles = parse_puzzle_list(include_str!("fixtures/two_widgets.json"), "fixture").unwrap();
    let container = page
        .mount(ElementId::mint("widget"), puzzles[1].clone())
        .unwrap();
    let b = buckets(&page, container);
    assert_eq!(
        fragment_codes(&page.board, b.source),
        vec!["def f():", "    return 7"]
    );
}

// ─── Hover & stale ──────────────────────────────────────────────────────

#[test]
fn leave_into_own_error_note_keeps_highlight() {
    let mut page = PageEngine::default();
    let container = mount(&mut page, r#"{"code": "a\nb"}"#);
    let b = buckets(&page, container);
    let src = positions(&page.board, b.source);
    let note = page
        .board
        .add_child(
            src[1],
            Element::new(
                ElementId::mint("error"),
                ElementKind::ErrorNote(ErrorNote {
                    summary: "NameError".into(),
                    message: "NameError: b".into(),
                    excerpt: None,
                    caret: None,
                }),
            ),
        )
        .unwrap();

    page.handle_drag(&DragEvent::Start { target: src[0] }).unwrap();
    page.handle_drag(&DragEvent::Enter { target: src[1] }).unwrap();
    page.handle_drag(&DragEvent::Leave {
        target: src[1],
        related: Some(note),
    })
    .unwrap();
    assert!(page.board.get(src[1]).unwrap().has_marker(Marker::Hovered));

    page.handle_drag(&DragEvent::Drop { target: note }).unwrap();
    page.handle_drag(&DragEvent::End).unwrap();

    assert_eq!(fragment_codes(&page.board, b.source), vec!["b", "a"]);
    assert!(!page.board.get(src[1]).unwrap().has_marker(Marker::Hovered));
    assert!(page.board.get(note).unwrap().has_marker(Marker::Stale));
}
