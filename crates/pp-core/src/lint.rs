//! Lint diagnostics for puzzle definitions.
//!
//! Reports authoring problems without changing the puzzle. The bridge logs
//! them when a widget is set up.

use crate::puzzle::{Language, Puzzle};
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// The puzzle cannot be solved as intended.
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "no-fragments", "duplicate-fragment").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over a puzzle.
#[must_use]
pub fn lint_puzzle(puzzle: &Puzzle) -> Vec<LintDiagnostic> {
    let correct = puzzle.fragments();
    let distractors = puzzle
        .extra
        .as_ref()
        .map(|e| e.fragments())
        .unwrap_or_default();

    let mut diags = Vec::new();
    lint_no_fragments(&correct, &mut diags);
    lint_duplicates(&correct, &mut diags);
    lint_distractor_overlap(&correct, &distractors, &mut diags);
    lint_language(&puzzle.language, &mut diags);
    lint_hidden_tests(puzzle, &mut diags);
    diags
}

/// Log every diagnostic at a level matching its severity.
pub fn log_diagnostics(diags: &[LintDiagnostic]) {
    for d in diags {
        match d.severity {
            LintSeverity::Warning => log::warn!("[{}] {}", d.rule, d.message),
            LintSeverity::Info => log::info!("[{}] {}", d.rule, d.message),
        }
    }
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn lint_no_fragments(correct: &[String], diags: &mut Vec<LintDiagnostic>) {
    if correct.is_empty() {
        diags.push(LintDiagnostic {
            message: "Puzzle has no code fragments; the solution area will have no slots."
                .to_string(),
            severity: LintSeverity::Warning,
            rule: "no-fragments",
        });
    }
}

/// Identical fragments make several arrangements equivalent.
fn lint_duplicates(correct: &[String], diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for fragment in correct {
        if !seen.insert(fragment.trim()) && reported.insert(fragment.trim()) {
            diags.push(LintDiagnostic {
                message: format!("Fragment `{}` appears more than once.", fragment.trim()),
                severity: LintSeverity::Info,
                rule: "duplicate-fragment",
            });
        }
    }
}

fn lint_distractor_overlap(
    correct: &[String],
    distractors: &[String],
    diags: &mut Vec<LintDiagnostic>,
) {
    let correct: HashSet<&str> = correct.iter().map(|s| s.trim()).collect();
    for d in distractors {
        if correct.contains(d.trim()) {
            diags.push(LintDiagnostic {
                message: format!(
                    "Distractor `{}` is identical to a correct fragment.",
                    d.trim()
                ),
                severity: LintSeverity::Warning,
                rule: "distractor-overlap",
            });
        }
    }
}

fn lint_language(language: &Language, diags: &mut Vec<LintDiagnostic>) {
    if let Language::Other(tag) = language {
        diags.push(LintDiagnostic {
            message: format!("Unknown language `{tag}`; it is passed to the evaluator as-is."),
            severity: LintSeverity::Info,
            rule: "unknown-language",
        });
    }
}

fn lint_hidden_tests(puzzle: &Puzzle, diags: &mut Vec<LintDiagnostic>) {
    let tests = puzzle.full_tests();
    if !tests.is_empty() && tests.iter().all(|t| t.hidden) {
        diags.push(LintDiagnostic {
            message: "Every test is hidden; learners get only a pass count.".to_string(),
            severity: LintSeverity::Info,
            rule: "all-tests-hidden",
        });
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(json: &str) -> Vec<&'static str> {
        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        lint_puzzle(&puzzle).into_iter().map(|d| d.rule).collect()
    }

    #[test]
    fn clean_puzzle_has_no_findings() {
        assert!(rules(r#"{"code": "a = 1\nb = 2", "extra": "c = 3"}"#).is_empty());
    }

    #[test]
    fn empty_code_is_flagged() {
        assert_eq!(rules(r#"{"code": "\n  \n"}"#), vec!["no-fragments"]);
    }

    #[test]
    fn duplicates_reported_once() {
        assert_eq!(
            rules(r#"{"code": "x += 1\nx += 1\n  x += 1"}"#),
            vec!["duplicate-fragment"]
        );
    }

    #[test]
    fn overlap_and_language() {
        assert_eq!(
            rules(r#"{"code": "a", "extra": "a", "language": "cobol"}"#),
            vec!["distractor-overlap", "unknown-language"]
        );
    }

    #[test]
    fn all_hidden_tests() {
        assert_eq!(
            rules(
                r#"{"code": "a = 1", "tests": [{"label": "l", "expression": "a", "expected": "1", "hidden": true}]}"#
            ),
            vec!["all-tests-hidden"]
        );
    }
}
