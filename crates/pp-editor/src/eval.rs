//! Evaluator interface.
//!
//! The widget never runs code itself. An `Evaluator` is injected by the host
//! (a sandboxed interpreter, a remote runner) and reports what happened as a
//! transcript or a failure.

use pp_core::NodeIndex;
use pp_core::model::Board;
use pp_core::puzzle::Language;
use pp_render::bucket::fragment_codes;
use thiserror::Error;

/// Console-style output captured while running code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    /// Forward every captured line to the log.
    pub fn log(&self) {
        for line in &self.messages {
            log::info!("{line}");
        }
        for line in &self.warnings {
            log::warn!("{line}");
        }
        for line in &self.errors {
            log::error!("{line}");
        }
    }
}

/// An error raised by evaluated code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct EvalFailure {
    /// Error class name, e.g. `SyntaxError`.
    pub kind: String,
    pub message: String,
    /// 1-based line in the evaluated code.
    pub line: Option<usize>,
    /// Column within that line; only syntax errors carry one.
    pub offset: Option<usize>,
}

impl EvalFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            line: None,
            offset: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// A language runtime for one widget at a time.
///
/// Every check starts with `reset`; after that, definitions made by
/// `evaluate` stay visible to the later `evaluate` and `probe` calls of the
/// same check.
pub trait Evaluator {
    /// Discard all definitions so the next program runs in a fresh
    /// environment.
    fn reset(&mut self);

    /// Run a program in the current environment.
    fn evaluate(&mut self, code: &str, language: &Language) -> Result<Transcript, EvalFailure>;

    /// Evaluate a single expression in the current environment and render
    /// its value for display and comparison.
    fn probe(&mut self, expression: &str) -> Result<String, EvalFailure>;
}

/// Evaluator for hosts without a runtime: every program succeeds silently
/// and expressions cannot be probed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvaluator;

impl Evaluator for NullEvaluator {
    fn reset(&mut self) {}

    fn evaluate(&mut self, code: &str, language: &Language) -> Result<Transcript, EvalFailure> {
        log::debug!(
            "no evaluator for {}; skipping {} lines",
            language.as_str(),
            code.lines().count()
        );
        Ok(Transcript::default())
    }

    fn probe(&mut self, expression: &str) -> Result<String, EvalFailure> {
        Err(EvalFailure::new(
            "EvaluatorUnavailable",
            format!("cannot evaluate '{expression}' without an evaluator"),
        ))
    }
}

/// The program currently arranged in a solution bucket: fragment codes in
/// order, one per line. Slots and other children contribute nothing.
pub fn assemble_code(board: &Board, solution_bucket: NodeIndex) -> String {
    fragment_codes(board, solution_bucket).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::id::ElementId;
    use pp_core::model::{Element, ElementKind};

    #[test]
    fn assembly_skips_slots() {
        let mut board = Board::new();
        let root = board.root;
        let bucket = board
            .add_child(root, Element::new(ElementId::mint("soln"), ElementKind::SolutionBucket))
            .unwrap();
        board.add_child(bucket, Element::fragment("x = 1")).unwrap();
        board.add_child(bucket, Element::slot()).unwrap();
        board.add_child(bucket, Element::fragment("if x:\n\ty = 2")).unwrap();

        assert_eq!(assemble_code(&board, bucket), "x = 1\nif x:\n\ty = 2");
    }

    #[test]
    fn failure_display() {
        let failure = EvalFailure::new("NameError", "name 'q' is not defined").at_line(3);
        assert_eq!(failure.to_string(), "NameError: name 'q' is not defined");
        assert_eq!(failure.line, Some(3));
        assert_eq!(failure.offset, None);
    }

    #[test]
    fn null_evaluator() {
        let mut eval = NullEvaluator;
        assert!(eval.evaluate("a = 1", &Language::Python).unwrap().is_empty());
        assert!(eval.probe("a").is_err());
    }
}
