//! Input abstraction layer.
//!
//! Normalizes the browser's HTML5 drag-and-drop events into a `DragEvent`
//! enum consumed by the drag engine. Targets are board nodes; the bridge
//! resolves DOM elements to nodes before building an event.

use pp_core::NodeIndex;
use pp_core::model::BoardMutation;

/// A normalized drag gesture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    /// `dragstart` on the element the user picked up.
    Start { target: NodeIndex },
    /// `dragend`, including a cancelled gesture (Escape).
    End,
    Enter { target: NodeIndex },
    /// `dragleave`; `related` is the element the pointer moved into, if the
    /// browser reported one.
    Leave {
        target: NodeIndex,
        related: Option<NodeIndex>,
    },
    Over,
    Drop { target: NodeIndex },
}

impl DragEvent {
    /// Build an event from a DOM event type name. Returns `None` for types
    /// the engine does not handle, or when a required target is missing.
    pub fn from_dom(
        event_type: &str,
        target: Option<NodeIndex>,
        related: Option<NodeIndex>,
    ) -> Option<Self> {
        match event_type {
            "dragstart" => target.map(|target| Self::Start { target }),
            "dragend" => Some(Self::End),
            "dragenter" => target.map(|target| Self::Enter { target }),
            "dragleave" => target.map(|target| Self::Leave { target, related }),
            "dragover" => Some(Self::Over),
            "drop" => target.map(|target| Self::Drop { target }),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<NodeIndex> {
        match self {
            Self::Start { target }
            | Self::Enter { target }
            | Self::Leave { target, .. }
            | Self::Drop { target } => Some(*target),
            Self::End | Self::Over => None,
        }
    }
}

/// Drop affordance shown by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Move,
    None,
}

impl DropEffect {
    /// Value for `DataTransfer.dropEffect`.
    pub fn as_str(self) -> &'static str {
        match self {
            DropEffect::Move => "move",
            DropEffect::None => "none",
        }
    }
}

/// What the bridge must do with the DOM event after the engine handled it.
#[derive(Debug, Clone, Default)]
pub struct DragResponse {
    pub prevent_default: bool,
    pub drop_effect: Option<DropEffect>,
    /// Board edits, already applied when returned from `DragEngine::dispatch`.
    pub mutations: Vec<BoardMutation>,
}

impl DragResponse {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn suppress() -> Self {
        Self {
            prevent_default: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_event_names() {
        let n = NodeIndex::new(3);
        assert_eq!(
            DragEvent::from_dom("dragstart", Some(n), None),
            Some(DragEvent::Start { target: n })
        );
        assert_eq!(DragEvent::from_dom("dragend", None, None), Some(DragEvent::End));
        assert_eq!(
            DragEvent::from_dom("dragleave", Some(n), None),
            Some(DragEvent::Leave { target: n, related: None })
        );
        assert_eq!(DragEvent::from_dom("drop", None, None), None);
        assert_eq!(DragEvent::from_dom("click", Some(n), None), None);
    }

    #[test]
    fn target_extraction() {
        let n = NodeIndex::new(1);
        assert_eq!(DragEvent::Drop { target: n }.target(), Some(n));
        assert_eq!(DragEvent::Over.target(), None);
        assert_eq!(DropEffect::Move.as_str(), "move");
    }
}
