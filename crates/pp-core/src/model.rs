//! Element tree for puzzle widgets.
//!
//! The board is a tree of elements standing in for the browser DOM: a page
//! root, widget containers, the two buckets, and the fragments and slots
//! inside them. Edges go parent → child; sibling order is kept explicitly per
//! parent so `insert_before` has exact DOM semantics. The board is the state
//! of record for a widget once it is rendered; the wasm bridge mirrors every
//! `BoardMutation` onto the real DOM.

use crate::error::BoardError;
use crate::id::ElementId;
use crate::registry::Widget;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Role markers ────────────────────────────────────────────────────────

/// Stable class names shared by rendering and interaction code.
pub mod class {
    pub const CONTAINER: &str = "procedural_widget";
    pub const BUCKET: &str = "code_bucket";
    pub const SOURCE: &str = "code_source";
    pub const SOLUTION: &str = "soln_list";
    pub const FRAGMENT: &str = "code_block";
    pub const SLOT: &str = "code_slot";
    pub const HOVERED: &str = "hovered";
    pub const EVAL_BUTTON: &str = "eval-button";
    pub const INSTRUCTIONS: &str = "instructions";
    pub const TESTS: &str = "tests";
    pub const INDICATOR: &str = "test_indicator";
    pub const BOOLEAN: &str = "boolean";
    pub const TEST_FEEDBACK: &str = "test_feedback";
    pub const ERROR: &str = "error";
    pub const STALE: &str = "stale";
    pub const PASSED: &str = "passed";
    pub const FAILED: &str = "failed";
    pub const HIDDEN: &str = "hidden";
    pub const ABSTRACT: &str = "abstract";
    pub const SOLVED: &str = "solved";
}

/// Toggleable state classes carried by an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Hovered,
    Stale,
    Passed,
    Failed,
    Hidden,
    Abstract,
    Solved,
}

impl Marker {
    pub fn class_name(self) -> &'static str {
        match self {
            Marker::Hovered => class::HOVERED,
            Marker::Stale => class::STALE,
            Marker::Passed => class::PASSED,
            Marker::Failed => class::FAILED,
            Marker::Hidden => class::HIDDEN,
            Marker::Abstract => class::ABSTRACT,
            Marker::Solved => class::SOLVED,
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// An error attached to a fragment after a failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNote {
    /// Short error kind shown as the summary (e.g. `SyntaxError`).
    pub summary: String,
    /// Full `Kind: message` text.
    pub message: String,
    /// The offending source line, when the fragment spans several lines or
    /// the error is a syntax error.
    pub excerpt: Option<String>,
    /// Column of a syntax error within `excerpt`.
    pub caret: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Page,
    Container,
    SourceBucket,
    SolutionBucket,
    /// A draggable code fragment. `code` is the original text, never the
    /// display form.
    Fragment {
        code: String,
    },
    Slot,
    EvalButton {
        label: String,
    },
    Instructions {
        html: String,
    },
    /// Feedback area below the buckets; collapsible when the puzzle has tests.
    FeedbackPanel {
        collapsible: bool,
    },
    Indicator {
        text: String,
        /// No tests: success means error-free use of every fragment.
        boolean: bool,
    },
    TestEntry {
        label: String,
        expression: String,
        expected: String,
        value: String,
    },
    ErrorNote(ErrorNote),
    Note {
        text: String,
    },
}

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub markers: SmallVec<[Marker; 2]>,
    /// Inline opacity override (set while a fragment is being dragged).
    pub opacity: Option<f32>,
    /// Registry back-reference; only ever set on widget containers.
    pub widget: Option<Box<Widget>>,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            markers: SmallVec::new(),
            opacity: None,
            widget: None,
        }
    }

    /// An empty slot with a fresh id.
    pub fn slot() -> Self {
        Self::new(ElementId::mint("slot"), ElementKind::Slot)
    }

    pub fn fragment(code: impl Into<String>) -> Self {
        Self::new(
            ElementId::mint("block"),
            ElementKind::Fragment { code: code.into() },
        )
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, ElementKind::Fragment { .. })
    }

    pub fn is_slot(&self) -> bool {
        matches!(self.kind, ElementKind::Slot)
    }

    /// Original code of a fragment; `None` for every other element.
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Fragment { code } => Some(code),
            _ => None,
        }
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// Add or remove a marker. Returns true if the element changed.
    pub fn set_marker(&mut self, marker: Marker, on: bool) -> bool {
        let present = self.has_marker(marker);
        if on && !present {
            self.markers.push(marker);
            true
        } else if !on && present {
            self.markers.retain(|m| *m != marker);
            true
        } else {
            false
        }
    }

    /// Role classes followed by marker classes, in a stable order.
    pub fn classes(&self) -> SmallVec<[&'static str; 4]> {
        let mut out: SmallVec<[&'static str; 4]> = SmallVec::new();
        match &self.kind {
            ElementKind::Page | ElementKind::Note { .. } => {}
            ElementKind::Container => out.push(class::CONTAINER),
            ElementKind::SourceBucket => {
                out.push(class::BUCKET);
                out.push(class::SOURCE);
            }
            ElementKind::SolutionBucket => {
                out.push(class::BUCKET);
                out.push(class::SOLUTION);
            }
            ElementKind::Fragment { .. } => out.push(class::FRAGMENT),
            ElementKind::Slot => out.push(class::SLOT),
            ElementKind::EvalButton { .. } => out.push(class::EVAL_BUTTON),
            ElementKind::Instructions { .. } => out.push(class::INSTRUCTIONS),
            ElementKind::FeedbackPanel { .. } => out.push(class::TESTS),
            ElementKind::Indicator { boolean, .. } => {
                out.push(class::INDICATOR);
                if *boolean {
                    out.push(class::BOOLEAN);
                }
            }
            ElementKind::TestEntry { .. } => out.push(class::TEST_FEEDBACK),
            ElementKind::ErrorNote(_) => out.push(class::ERROR),
        }
        out.extend(self.markers.iter().map(|m| m.class_name()));
        out
    }

    /// HTML tag used when this element is emitted or mounted.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            ElementKind::Fragment { .. } => "code",
            ElementKind::EvalButton { .. } => "input",
            ElementKind::FeedbackPanel { collapsible: true } => "details",
            ElementKind::Indicator { boolean: false, .. } => "summary",
            ElementKind::Indicator { boolean: true, .. } | ElementKind::Note { .. } => "span",
            ElementKind::ErrorNote(_) => "details",
            _ => "div",
        }
    }
}

// ─── Mutations ───────────────────────────────────────────────────────────

/// A structural or visual edit to the board, addressed by element id so it
/// can be replayed on the DOM mirror.
#[derive(Debug, Clone)]
pub enum BoardMutation {
    /// Move `node` under `parent`, before `anchor` (or at the end).
    InsertBefore {
        node: ElementId,
        parent: ElementId,
        anchor: Option<ElementId>,
    },
    /// Detach `node` from its parent, keeping it alive for reinsertion.
    Detach { node: ElementId },
    /// Detach `node` and drop its whole subtree.
    Discard { node: ElementId },
    /// Append a new element (with no children) under `parent`.
    Append {
        parent: ElementId,
        element: Box<Element>,
    },
    SetMarker {
        node: ElementId,
        marker: Marker,
        on: bool,
    },
    SetOpacity {
        node: ElementId,
        opacity: Option<f32>,
    },
    /// Replace the text of an indicator or the value of a test entry.
    SetText { node: ElementId, text: String },
}

// ─── Board ───────────────────────────────────────────────────────────────

/// The element tree. Sibling order lives in `child_order`; the petgraph edges
/// carry parentage.
#[derive(Debug, Clone)]
pub struct Board {
    pub graph: StableDiGraph<Element, ()>,
    pub root: NodeIndex,
    pub id_index: HashMap<ElementId, NodeIndex>,
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Board {
    /// Create an empty board with a page root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = ElementId::intern("page");
        let root = graph.add_node(Element::new(root_id, ElementKind::Page));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Add an element with no parent. Returns its index.
    pub fn create(&mut self, element: Element) -> NodeIndex {
        let id = element.id;
        let idx = self.graph.add_node(element);
        self.id_index.insert(id, idx);
        idx
    }

    /// Create an element and append it under `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, element: Element) -> Result<NodeIndex, BoardError> {
        if !self.contains(parent) {
            return Err(BoardError::Missing(parent));
        }
        let idx = self.create(element);
        self.insert_before(parent, idx, None)?;
        Ok(idx)
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Element> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        self.graph.node_weight_mut(idx)
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> Option<ElementId> {
        self.get(idx).map(|e| e.id)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn next_sibling(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let parent = self.parent(idx)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&s| s == idx)?;
        siblings.get(pos + 1).copied()
    }

    /// The element itself followed by each ancestor up to the root.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(
            self.contains(idx).then_some(idx),
            move |&current| self.parent(current),
        )
    }

    /// All elements below `idx` in pre-order, excluding `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(idx).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Insert `child` under `parent` before `anchor` (append when `None`).
    /// The child is first detached from wherever it was, so this moves.
    pub fn insert_before(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
        anchor: Option<NodeIndex>,
    ) -> Result<(), BoardError> {
        for idx in [parent, child] {
            if !self.contains(idx) {
                return Err(BoardError::Missing(idx));
            }
        }
        if let Some(anchor) = anchor
            && self.parent(anchor) != Some(parent)
        {
            return Err(BoardError::NotAChild { parent, anchor });
        }
        if self.parent(child).is_some() {
            self.detach(child)?;
        }

        let order = self.child_order.entry(parent).or_default();
        let pos = match anchor {
            Some(anchor) => order
                .iter()
                .position(|&s| s == anchor)
                .ok_or(BoardError::NotAChild { parent, anchor })?,
            None => order.len(),
        };
        order.insert(pos, child);
        self.graph.add_edge(parent, child, ());
        Ok(())
    }

    /// Remove `child` from its parent without destroying it.
    pub fn detach(&mut self, child: NodeIndex) -> Result<(), BoardError> {
        if !self.contains(child) {
            return Err(BoardError::Missing(child));
        }
        let parent = self.parent(child).ok_or(BoardError::Detached(child))?;
        if let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
        if let Some(order) = self.child_order.get_mut(&parent) {
            order.retain(|&s| s != child);
        }
        Ok(())
    }

    /// Detach `idx` (if attached) and remove it with its whole subtree.
    pub fn destroy(&mut self, idx: NodeIndex) -> Result<(), BoardError> {
        if !self.contains(idx) {
            return Err(BoardError::Missing(idx));
        }
        if self.parent(idx).is_some() {
            self.detach(idx)?;
        }
        let mut doomed = self.descendants(idx);
        doomed.push(idx);
        for node in doomed {
            self.child_order.remove(&node);
            if let Some(removed) = self.graph.remove_node(node) {
                self.id_index.remove(&removed.id);
            }
        }
        Ok(())
    }

    /// Destroy every child of `idx`, leaving `idx` itself in place.
    pub fn clear_children(&mut self, idx: NodeIndex) -> Result<(), BoardError> {
        for child in self.children(idx).to_vec() {
            self.destroy(child)?;
        }
        Ok(())
    }

    /// Elements below `idx` whose kind satisfies `pred`, in document order.
    pub fn query(&self, idx: NodeIndex, pred: impl Fn(&ElementKind) -> bool) -> Vec<NodeIndex> {
        self.descendants(idx)
            .into_iter()
            .filter(|&n| pred(&self.graph[n].kind))
            .collect()
    }

    /// Apply a mutation. Ids are resolved against the current board.
    pub fn apply(&mut self, mutation: &BoardMutation) -> Result<(), BoardError> {
        match mutation {
            BoardMutation::InsertBefore {
                node,
                parent,
                anchor,
            } => {
                let node = self.resolve(*node)?;
                let parent = self.resolve(*parent)?;
                let anchor = anchor.map(|a| self.resolve(a)).transpose()?;
                self.insert_before(parent, node, anchor)
            }
            BoardMutation::Detach { node } => {
                let node = self.resolve(*node)?;
                self.detach(node)
            }
            BoardMutation::Discard { node } => {
                let node = self.resolve(*node)?;
                self.destroy(node)
            }
            BoardMutation::Append { parent, element } => {
                let parent = self.resolve(*parent)?;
                self.add_child(parent, element.as_ref().clone()).map(|_| ())
            }
            BoardMutation::SetMarker { node, marker, on } => {
                let node = self.resolve(*node)?;
                self.graph[node].set_marker(*marker, *on);
                Ok(())
            }
            BoardMutation::SetOpacity { node, opacity } => {
                let node = self.resolve(*node)?;
                self.graph[node].opacity = *opacity;
                Ok(())
            }
            BoardMutation::SetText { node, text } => {
                let node = self.resolve(*node)?;
                match &mut self.graph[node].kind {
                    ElementKind::Indicator { text: t, .. } => *t = text.clone(),
                    ElementKind::TestEntry { value, .. } => *value = text.clone(),
                    ElementKind::Note { text: t } => *t = text.clone(),
                    other => log::warn!("SetText ignored on {other:?}"),
                }
                Ok(())
            }
        }
    }

    fn resolve(&self, id: ElementId) -> Result<NodeIndex, BoardError> {
        self.index_of(id).ok_or(BoardError::UnknownId(id))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
