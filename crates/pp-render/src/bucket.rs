//! Bucket/slot renderer: puzzle → widget structure on the board.
//!
//! A widget container gets, in order: instructions, the source bucket (one
//! fragment per pool entry), the solution bucket (one empty slot per correct
//! fragment, then the evaluate control), and the feedback panel.

use pp_core::config::WidgetConfig;
use pp_core::error::BoardError;
use pp_core::id::ElementId;
use pp_core::lint::{lint_puzzle, log_diagnostics};
use pp_core::model::*;
use pp_core::puzzle::{Puzzle, PuzzleModel};
use pp_core::registry::Widget;
use pp_core::NodeIndex;

// ─── Buckets ─────────────────────────────────────────────────────────────

/// Append a fresh source bucket holding one fragment per pool entry, in
/// pool order.
pub fn render_source_bucket(
    board: &mut Board,
    container: NodeIndex,
    pool: &[String],
) -> Result<NodeIndex, BoardError> {
    let bucket = board.add_child(
        container,
        Element::new(ElementId::mint("source"), ElementKind::SourceBucket),
    )?;
    for code in pool {
        add_fragment_to_bucket(board, bucket, code)?;
    }
    Ok(bucket)
}

/// Append a fresh solution bucket holding exactly `slot_count` empty slots.
pub fn render_solution_bucket(
    board: &mut Board,
    container: NodeIndex,
    slot_count: usize,
) -> Result<NodeIndex, BoardError> {
    let bucket = board.add_child(
        container,
        Element::new(ElementId::mint("solution"), ElementKind::SolutionBucket),
    )?;
    for _ in 0..slot_count {
        add_empty_slot_to_bucket(board, bucket)?;
    }
    Ok(bucket)
}

pub fn add_fragment_to_bucket(
    board: &mut Board,
    bucket: NodeIndex,
    code: &str,
) -> Result<NodeIndex, BoardError> {
    board.add_child(bucket, Element::fragment(code))
}

pub fn add_empty_slot_to_bucket(board: &mut Board, bucket: NodeIndex) -> Result<NodeIndex, BoardError> {
    board.add_child(bucket, Element::slot())
}

/// Fragments and slots of a bucket in order; other children are skipped.
pub fn positions(board: &Board, bucket: NodeIndex) -> Vec<NodeIndex> {
    board
        .children(bucket)
        .iter()
        .copied()
        .filter(|&c| board.get(c).is_some_and(|e| e.is_fragment() || e.is_slot()))
        .collect()
}

/// Original code of every fragment in the bucket, in order. Slots and other
/// children contribute nothing.
pub fn fragment_codes(board: &Board, bucket: NodeIndex) -> Vec<String> {
    board
        .children(bucket)
        .iter()
        .filter_map(|&c| board.get(c).and_then(Element::code))
        .map(str::to_string)
        .collect()
}

// ─── Controls & feedback ─────────────────────────────────────────────────

pub fn render_eval_button(
    board: &mut Board,
    solution_bucket: NodeIndex,
    label: &str,
) -> Result<NodeIndex, BoardError> {
    board.add_child(
        solution_bucket,
        Element::new(
            ElementId::mint("eval"),
            ElementKind::EvalButton {
                label: label.to_string(),
            },
        ),
    )
}

pub fn render_instructions(
    board: &mut Board,
    container: NodeIndex,
    puzzle: &Puzzle,
) -> Result<NodeIndex, BoardError> {
    board.add_child(
        container,
        Element::new(
            ElementId::mint("instructions"),
            ElementKind::Instructions {
                html: puzzle.instructions_html(),
            },
        ),
    )
}

/// Text the indicator shows before the first check.
pub fn initial_indicator_text(puzzle: &Puzzle) -> String {
    if puzzle.has_tests() {
        format!("? / {} tests passed", puzzle.tests.len())
    } else {
        "Click 'check' to run the code...".to_string()
    }
}

/// Feedback panel: indicator plus one entry per test. Returns the indicator
/// and the test entries in puzzle order.
pub fn render_feedback(
    board: &mut Board,
    container: NodeIndex,
    puzzle: &Puzzle,
) -> Result<(NodeIndex, Vec<NodeIndex>), BoardError> {
    let with_tests = puzzle.has_tests();
    let panel = board.add_child(
        container,
        Element::new(
            ElementId::mint("tests"),
            ElementKind::FeedbackPanel {
                collapsible: with_tests,
            },
        ),
    )?;
    let indicator = board.add_child(
        panel,
        Element::new(
            ElementId::mint("indicator"),
            ElementKind::Indicator {
                text: initial_indicator_text(puzzle),
                boolean: !with_tests,
            },
        ),
    )?;

    let tests = puzzle.full_tests();
    let mut entries = Vec::with_capacity(tests.len());
    let mut hidden = 0;
    for test in &tests {
        let expected = match &test.expect_error {
            Some(Some(err)) => err.clone(),
            Some(None) => "<no error>".to_string(),
            None => test.expected.clone(),
        };
        let mut entry = Element::new(
            ElementId::mint("test"),
            ElementKind::TestEntry {
                label: test.label.clone(),
                expression: test.expression.clone(),
                expected,
                value: "?".to_string(),
            },
        );
        if test.hidden {
            entry.set_marker(Marker::Hidden, true);
            hidden += 1;
        }
        if test.is_abstract {
            entry.set_marker(Marker::Abstract, true);
        }
        entries.push(board.add_child(panel, entry)?);
    }

    let note = if hidden > 0 && hidden == tests.len() {
        Some("(all tests are secret)".to_string())
    } else if hidden > 0 {
        Some(format!("(plus {hidden} secret tests)"))
    } else {
        None
    };
    if let Some(text) = note {
        board.add_child(
            panel,
            Element::new(ElementId::mint("note"), ElementKind::Note { text }),
        )?;
    }

    Ok((indicator, entries))
}

// ─── Widget setup ────────────────────────────────────────────────────────

/// Create an empty widget container under the page root.
pub fn add_container(board: &mut Board, id: ElementId) -> Result<NodeIndex, BoardError> {
    let root = board.root;
    board.add_child(root, Element::new(id, ElementKind::Container))
}

/// Build the full widget for `puzzle` inside `container` and attach its
/// state. Anything previously inside the container is destroyed.
pub fn setup_widget(
    board: &mut Board,
    container: NodeIndex,
    puzzle: Puzzle,
    config: &WidgetConfig,
) -> Result<(), BoardError> {
    board.clear_children(container)?;
    board.detach_widget(container);
    if let Some(el) = board.get_mut(container) {
        el.set_marker(Marker::Solved, false);
    }

    log_diagnostics(&lint_puzzle(&puzzle));
    let model = PuzzleModel::from_puzzle(&puzzle);

    render_instructions(board, container, &puzzle)?;
    let source = render_source_bucket(board, container, &model.pool)?;
    let solution = render_solution_bucket(board, container, model.slot_count())?;
    let eval_button = if config.show_eval_button {
        Some(render_eval_button(board, solution, &config.eval_label)?)
    } else {
        None
    };
    let (indicator, test_entries) = render_feedback(board, container, &puzzle)?;

    log::debug!(
        "widget {:?}: {} fragments in pool, {} slots",
        board.id_of(container),
        model.pool.len(),
        model.slot_count()
    );

    let mut widget = Widget::new(puzzle, model, source, solution);
    widget.eval_button = eval_button;
    widget.indicator = Some(indicator);
    widget.test_entries = test_entries;
    board.attach(container, widget)
}

/// Remove a widget's structure and state, leaving the container empty.
pub fn teardown_widget(board: &mut Board, container: NodeIndex) -> Result<Option<Widget>, BoardError> {
    board.clear_children(container)?;
    Ok(board.detach_widget(container))
}
