pub mod config;
pub mod emitter;
pub mod error;
pub mod id;
pub mod lint;
pub mod model;
pub mod puzzle;
pub mod registry;
pub mod resource;

pub use config::{BootMode, WidgetConfig};
pub use emitter::{display_html, emit_html};
pub use error::{BoardError, PuzzleError};
pub use id::ElementId;
pub use lint::{LintDiagnostic, LintSeverity, lint_puzzle};
pub use model::*;
pub use puzzle::{Puzzle, PuzzleModel};
pub use registry::Widget;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
