//! Error types shared by the puzzle crates.

use crate::id::ElementId;
use petgraph::graph::NodeIndex;
use thiserror::Error;

/// Failures while reading puzzle definitions.
#[derive(Debug, Error)]
pub enum PuzzleError {
    /// The JSON text could not be parsed into the expected shape.
    #[error("malformed JSON in {context}: {source}")]
    MalformedJson {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A puzzle list parsed fine but contained nothing to present.
    #[error("puzzle list from {context} is empty")]
    EmptyPuzzleList { context: String },

    /// The puzzle resource request did not succeed.
    #[error("failed to load puzzles from '{url}' (status {status})")]
    LoadFailed { url: String, status: u16 },
}

/// Failures of structural edits on the element tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("no element with id '{0}'")]
    UnknownId(ElementId),

    #[error("element {0:?} does not exist")]
    Missing(NodeIndex),

    /// The element exists but has no parent, so it has no position.
    #[error("element {0:?} is not attached to a parent")]
    Detached(NodeIndex),

    /// The id is taken by an element that is not a widget container.
    #[error("'{0}' names an element that is not a widget container")]
    NotAContainer(ElementId),

    #[error("anchor {anchor:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeIndex, anchor: NodeIndex },
}
