pub mod check;
pub mod drag;
pub mod eval;
pub mod input;
pub mod page;
pub mod sequencer;

pub use check::{CheckReport, TestOutcome, check};
pub use drag::DragEngine;
pub use eval::{EvalFailure, Evaluator, NullEvaluator, Transcript};
pub use input::{DragEvent, DragResponse, DropEffect};
pub use page::{CheckOutcome, PageEngine};
pub use sequencer::Sequencer;
