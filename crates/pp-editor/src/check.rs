//! Check runner: evaluate the arranged solution and report on it.
//!
//! A check clears old feedback, runs the assembled program, attaches any
//! error to the fragment that caused it, runs the puzzle's tests and updates
//! the indicator. All feedback is expressed as `BoardMutation`s so the DOM
//! mirror can replay it.

use crate::eval::{EvalFailure, Evaluator, Transcript, assemble_code};
use pp_core::NodeIndex;
use pp_core::error::BoardError;
use pp_core::id::ElementId;
use pp_core::model::*;
use pp_core::puzzle::PuzzleTest;
use pp_render::bucket::fragment_codes;

pub const EMPTY_SOLUTION_PROMPT: &str =
    "Click 'check' to run the code... (drag some code to the right side first)";

/// Result of one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub passed: bool,
    /// Rendered value, or `<error>` when the expression failed.
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub indicator: String,
    pub solved: bool,
    pub error: Option<EvalFailure>,
    pub pretest_error: Option<EvalFailure>,
    pub transcript: Transcript,
    /// One per test, in puzzle order; empty unless the tests ran.
    pub outcomes: Vec<TestOutcome>,
    /// Feedback edits, already applied to the board.
    pub mutations: Vec<BoardMutation>,
}

/// Check the widget in `container`. Returns `None` when the container has no
/// widget attached.
pub fn check(
    board: &mut Board,
    container: NodeIndex,
    evaluator: &mut dyn Evaluator,
) -> Result<Option<CheckReport>, BoardError> {
    let Some(widget) = board.widget(container) else {
        log::warn!("check requested on {container:?}, which has no widget");
        return Ok(None);
    };
    let solution_bucket = widget.solution_bucket;
    let source_bucket = widget.source_bucket;
    let indicator = widget.indicator;
    let entries = widget.test_entries.clone();
    let tests = widget.puzzle.full_tests();
    let language = widget.puzzle.language.clone();
    let pretest = widget.puzzle.pretest.clone();

    let mut report = CheckReport::default();
    report.mutations = reset_feedback(board, container, &entries)?;

    // ─── Run ─────────────────────────────────────────────────────────────

    evaluator.reset();
    let code = assemble_code(board, solution_bucket);
    match evaluator.evaluate(&code, &language) {
        Ok(transcript) => report.transcript = transcript,
        Err(failure) => {
            log::warn!("solution failed: {failure}");
            report
                .mutations
                .extend(attach_failure(board, solution_bucket, &failure)?);
            report.error = Some(failure);
        }
    }
    report.transcript.log();

    if report.error.is_none()
        && let Some(pretest) = pretest.as_deref()
        && let Err(failure) = evaluator.evaluate(pretest, &language)
    {
        log::error!("pretest failed: {failure}");
        report.pretest_error = Some(failure);
    }

    // ─── Tests ───────────────────────────────────────────────────────────

    let solution = fragment_codes(board, solution_bucket);
    let mut feedback = Vec::new();
    if tests.is_empty() {
        let source_empty = fragment_codes(board, source_bucket).is_empty();
        report.indicator = if report.error.is_some() {
            "Error running code.".to_string()
        } else if report.pretest_error.is_some() {
            "Error preparing tests. We could not check your solution, but it is probably not correct."
                .to_string()
        } else if solution.is_empty() {
            EMPTY_SOLUTION_PROMPT.to_string()
        } else if source_empty {
            report.solved = true;
            "Puzzle solved!".to_string()
        } else {
            "No errors so far; use all blocks to solve puzzle.".to_string()
        };
    } else if report.error.is_some() {
        report.indicator = format!("? / {} tests passed (error running code)", tests.len());
    } else if report.pretest_error.is_some() {
        report.indicator = format!(
            "? / {} tests passed (Error preparing tests. Your code itself does not have an \
             error, but we could not set up for the tests, so your solution is probably not \
             correct.)",
            tests.len()
        );
    } else {
        report.outcomes = tests.iter().map(|t| run_test(evaluator, t)).collect();
        let passed = report.outcomes.iter().filter(|o| o.passed).count();
        report.indicator = format!("{passed} / {} tests passed", tests.len());
        if passed == tests.len() {
            report.solved = true;
            report.indicator.push_str(" (puzzle solved!)");
        }
        for (&entry, outcome) in entries.iter().zip(&report.outcomes) {
            feedback.extend(record_outcome(board, entry, outcome));
        }
    }

    if let Some(id) = indicator.and_then(|i| board.id_of(i)) {
        feedback.push(BoardMutation::SetText {
            node: id,
            text: report.indicator.clone(),
        });
    }
    if report.solved
        && let Some(id) = board.id_of(container)
    {
        feedback.push(BoardMutation::SetMarker {
            node: id,
            marker: Marker::Solved,
            on: true,
        });
    }

    apply_all(board, &feedback)?;
    report.mutations.extend(feedback);
    if report.solved {
        mark_solved(board, container, solution);
    }
    log::info!("check: {}", report.indicator);
    Ok(Some(report))
}

/// Remove error notes and clear test results from the previous check.
fn reset_feedback(
    board: &mut Board,
    container: NodeIndex,
    entries: &[NodeIndex],
) -> Result<Vec<BoardMutation>, BoardError> {
    let mut mutations: Vec<BoardMutation> = board
        .query(container, |k| matches!(k, ElementKind::ErrorNote(_)))
        .into_iter()
        .filter_map(|n| board.id_of(n))
        .map(|node| BoardMutation::Discard { node })
        .collect();
    for &entry in entries {
        let Some(element) = board.get(entry) else {
            continue;
        };
        for marker in [Marker::Stale, Marker::Passed, Marker::Failed] {
            if element.has_marker(marker) {
                mutations.push(BoardMutation::SetMarker {
                    node: element.id,
                    marker,
                    on: false,
                });
            }
        }
    }
    apply_all(board, &mutations)?;
    Ok(mutations)
}

/// Attach `failure` to the fragment responsible for its line.
fn attach_failure(
    board: &mut Board,
    solution_bucket: NodeIndex,
    failure: &EvalFailure,
) -> Result<Vec<BoardMutation>, BoardError> {
    let Some(line) = failure.line else {
        log::warn!("error has no line number; not attached to any block");
        return Ok(Vec::new());
    };
    let fragments: Vec<NodeIndex> = board
        .children(solution_bucket)
        .iter()
        .copied()
        .filter(|&c| board.get(c).is_some_and(Element::is_fragment))
        .collect();
    let codes: Vec<&str> = fragments
        .iter()
        .filter_map(|&f| board.get(f).and_then(Element::code))
        .collect();

    let Some((index, local_line)) = locate_line(&codes, line) else {
        log::error!(
            "ran out of code lines trying to find responsible block (blocks: {}, target line: {line})",
            codes.len()
        );
        return Ok(Vec::new());
    };
    let note = error_note(codes[index], local_line, failure);
    let parent = board
        .id_of(fragments[index])
        .ok_or(BoardError::Missing(fragments[index]))?;
    // One note per fragment at most, so its id follows the fragment's.
    let mutations = vec![BoardMutation::Append {
        parent,
        element: Box::new(Element::new(
            ElementId::intern(&format!("{parent}_error")),
            ElementKind::ErrorNote(note),
        )),
    }];
    apply_all(board, &mutations)?;
    Ok(mutations)
}

fn apply_all(board: &mut Board, mutations: &[BoardMutation]) -> Result<(), BoardError> {
    mutations.iter().try_for_each(|m| board.apply(m))
}

/// Find the fragment holding 1-based `line` of the assembled program and the
/// 0-based line within it. A line just past the end belongs to the last line
/// of the last fragment (e.g. an error reported on a trailing blank line).
pub fn locate_line(codes: &[&str], line: usize) -> Option<(usize, usize)> {
    if line == 0 {
        return None;
    }
    let mut so_far = 0;
    let mut last = None;
    for (index, code) in codes.iter().enumerate() {
        let lines = code.split('\n').count();
        if so_far + lines >= line {
            return Some((index, line - 1 - so_far));
        }
        so_far += lines;
        last = Some((index, lines - 1));
    }
    if line == so_far + 1 { last } else { None }
}

/// Build the note shown inside a fragment. Syntax errors (those with an
/// offset) and multi-line fragments quote the offending line.
pub fn error_note(code: &str, line: usize, failure: &EvalFailure) -> ErrorNote {
    let excerpt = (failure.offset.is_some() || code.contains('\n'))
        .then(|| code.split('\n').nth(line).unwrap_or_default().to_string());
    ErrorNote {
        summary: failure.kind.clone(),
        message: failure.to_string(),
        excerpt,
        caret: failure.offset,
    }
}

fn run_test(evaluator: &mut dyn Evaluator, test: &PuzzleTest) -> TestOutcome {
    let result = evaluator.probe(&test.expression);
    let value = match &result {
        Ok(v) => v.clone(),
        Err(e) => {
            log::debug!("test '{}' raised {e}", test.label);
            "<error>".to_string()
        }
    };
    let passed = match &test.expect_error {
        None => match (&result, evaluator.probe(&test.expected)) {
            (Ok(actual), Ok(expected)) => *actual == expected,
            (_, Err(e)) => {
                log::error!("could not evaluate expected value of '{}': {e}", test.label);
                false
            }
            _ => false,
        },
        Some(None) => result.is_ok(),
        Some(Some(expected)) => matches!(&result, Err(e) if e.to_string() == *expected),
    };
    let value = match (&test.expect_error, &result) {
        (Some(_), Err(e)) => e.to_string(),
        (Some(None), Ok(_)) => "<no error>".to_string(),
        _ => value,
    };
    TestOutcome { passed, value }
}

fn record_outcome(board: &Board, entry: NodeIndex, outcome: &TestOutcome) -> Vec<BoardMutation> {
    let Some(id) = board.id_of(entry) else {
        return Vec::new();
    };
    vec![
        BoardMutation::SetText {
            node: id,
            text: outcome.value.clone(),
        },
        BoardMutation::SetMarker {
            node: id,
            marker: if outcome.passed {
                Marker::Passed
            } else {
                Marker::Failed
            },
            on: true,
        },
    ]
}

/// Flag the widget as solved and remember the arrangement that solved it.
fn mark_solved(board: &mut Board, container: NodeIndex, solution: Vec<String>) {
    if let Some(widget) = board.widget_mut(container) {
        widget.solved = true;
        widget.last_solution = Some(solution);
    }
}
