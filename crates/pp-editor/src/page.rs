//! Page engine: the board plus everything that acts on it.
//!
//! Holds the element tree as the single source of truth, the drag session,
//! and the puzzle sequence (if the page runs one). The wasm bridge owns one
//! of these and mirrors its mutations onto the DOM.

use crate::check::{CheckReport, check};
use crate::drag::DragEngine;
use crate::eval::Evaluator;
use crate::input::{DragEvent, DragResponse};
use crate::sequencer::Sequencer;
use pp_core::NodeIndex;
use pp_core::config::WidgetConfig;
use pp_core::error::{BoardError, PuzzleError};
use pp_core::id::ElementId;
use pp_core::model::{Board, ElementKind};
use pp_core::puzzle::{Puzzle, puzzle_or_demo};
use pp_render::bucket::{add_container, setup_widget};

/// What a check did to the page.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: CheckReport,
    /// The sequence moved on; the container was rebuilt from scratch.
    pub advanced: bool,
}

pub struct PageEngine {
    pub board: Board,
    pub config: WidgetConfig,
    drag: DragEngine,
    sequencer: Option<Sequencer>,
}

impl PageEngine {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            board: Board::new(),
            drag: DragEngine::new(config.drag_opacity),
            config,
            sequencer: None,
        }
    }

    /// Find or create the container with the given id. An id already held
    /// by any other kind of element is refused.
    pub fn container(&mut self, id: ElementId) -> Result<NodeIndex, BoardError> {
        let Some(idx) = self.board.index_of(id) else {
            return add_container(&mut self.board, id);
        };
        match self.board.get(idx).map(|e| &e.kind) {
            Some(ElementKind::Container) => Ok(idx),
            _ => Err(BoardError::NotAContainer(id)),
        }
    }

    /// Set up a widget from its inline attribute text. Missing or malformed
    /// text falls back to the demo puzzle.
    pub fn mount_inline(&mut self, id: ElementId, attribute: Option<&str>) -> Result<NodeIndex, BoardError> {
        self.mount(id, puzzle_or_demo(attribute))
    }

    pub fn mount(&mut self, id: ElementId, puzzle: Puzzle) -> Result<NodeIndex, BoardError> {
        let container = self.container(id)?;
        setup_widget(&mut self.board, container, puzzle, &self.config)?;
        Ok(container)
    }

    /// Start presenting `puzzles` in the container with the given id.
    /// Returns false (and shows nothing) for an empty list.
    pub fn start_sequence(&mut self, id: ElementId, puzzles: Vec<Puzzle>) -> Result<bool, BoardError> {
        let container = self.container(id)?;
        let mut sequencer = Sequencer::new(container, puzzles);
        let shown = sequencer.present(&mut self.board, &self.config)?;
        self.sequencer = Some(sequencer);
        Ok(shown)
    }

    /// Start a sequence from the outcome of loading the puzzle resource. A
    /// failed load is logged and leaves the container empty.
    pub fn start_loaded_sequence(
        &mut self,
        id: ElementId,
        loaded: Result<Vec<Puzzle>, PuzzleError>,
    ) -> Result<bool, BoardError> {
        match loaded {
            Ok(puzzles) => self.start_sequence(id, puzzles),
            Err(e) => {
                log::error!("{e}; nothing to show in '{id}'");
                self.container(id)?;
                Ok(false)
            }
        }
    }

    pub fn sequencer(&self) -> Option<&Sequencer> {
        self.sequencer.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn handle_drag(&mut self, event: &DragEvent) -> Result<DragResponse, BoardError> {
        self.drag.dispatch(&mut self.board, event)
    }

    /// Check the widget owning `node` (usually its evaluate control). A
    /// solved puzzle in a sequenced container moves the sequence on.
    pub fn check(
        &mut self,
        node: NodeIndex,
        evaluator: &mut dyn Evaluator,
    ) -> Result<Option<CheckOutcome>, BoardError> {
        let Some(container) = self.board.owner_of(node) else {
            return Ok(None);
        };
        let Some(report) = check(&mut self.board, container, evaluator)? else {
            return Ok(None);
        };

        let mut advanced = false;
        if report.solved
            && let Some(seq) = self.sequencer.as_mut()
            && seq.container() == container
        {
            advanced = seq.advance(&mut self.board, &self.config)?;
        }
        Ok(Some(CheckOutcome { report, advanced }))
    }
}

impl Default for PageEngine {
    fn default() -> Self {
        Self::new(WidgetConfig::default())
    }
}
