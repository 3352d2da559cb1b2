//! WASM bridge for procedural puzzles: mounts widgets into the page DOM.
//!
//! Compiled via `wasm-pack build --target web`. The page calls [`init`]
//! once; every widget container then gets its own event listeners, and all
//! edits flow board → `BoardMutation` → DOM.

mod console;
mod dom;
mod evaluator;
mod loader;

use console::{console_error_panic_hook_setup, init_logging};
use dom::{DomMirror, ID_ATTRIBUTE};
use evaluator::JsEvaluator;
use pp_core::NodeIndex;
use pp_core::config::{BootMode, WidgetConfig};
use pp_core::error::PuzzleError;
use pp_core::emitter::emit_html;
use pp_core::id::ElementId;
use pp_core::model::{BoardMutation, ElementKind};
use pp_core::puzzle::Puzzle;
use pp_editor::{DragEvent, Evaluator, NullEvaluator, PageEngine};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, EventTarget, Node};

const DRAG_EVENTS: [&str; 6] = ["dragstart", "dragend", "dragenter", "dragleave", "dragover", "drop"];

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Board ids taken from DOM ids carry this prefix. Generated ids are
/// `role_N`, so the two never meet.
const DOM_ID_PREFIX: &str = "dom-";

/// Id for a page container: its existing mirror id, else one derived from
/// its DOM id, else a fresh one.
fn container_id(mirror_id: Option<String>, dom_id: &str) -> ElementId {
    match mirror_id.filter(|s| !s.is_empty()) {
        Some(id) => ElementId::intern(&id),
        None if !dom_id.is_empty() => ElementId::intern(&format!("{DOM_ID_PREFIX}{dom_id}")),
        None => ElementId::mint("widget"),
    }
}

// ─── Controller ──────────────────────────────────────────────────────────

struct Controller {
    page: PageEngine,
    dom: DomMirror,
    evaluator: Box<dyn Evaluator>,
    /// Containers that already have listeners.
    wired: HashSet<ElementId>,
}

type Shared = Rc<RefCell<Controller>>;

impl Controller {
    /// Board node for an event target: the nearest tagged element.
    fn node_for(&self, target: Option<EventTarget>) -> Option<NodeIndex> {
        let element = match target?.dyn_into::<Element>() {
            Ok(element) => element,
            Err(other) => other.dyn_into::<Node>().ok()?.parent_element()?,
        };
        let tagged = element.closest(&format!("[{ID_ATTRIBUTE}]")).ok()??;
        let id = ElementId::lookup(&tagged.get_attribute(ID_ATTRIBUTE)?)?;
        self.page.board.index_of(id)
    }

    fn replay(&mut self, mutations: &[BoardMutation]) {
        for mutation in mutations {
            if let Err(e) = self.dom.replay(&self.page.board, mutation) {
                log::warn!("DOM out of step with board at {mutation:?}: {e:?}");
            }
        }
    }

    fn remount(&mut self, container: NodeIndex) -> Result<(), JsValue> {
        self.dom.remount(&self.page.board, container)
    }
}

fn on_drag(shared: &Shared, ev: &web_sys::DragEvent) -> Result<(), JsValue> {
    let mut ctrl = shared
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str("controller busy"))?;
    let target = ctrl.node_for(ev.target());
    let related = ctrl.node_for(ev.related_target());
    let Some(event) = DragEvent::from_dom(&ev.type_(), target, related) else {
        return Ok(());
    };

    let response = ctrl.page.handle_drag(&event).map_err(js_err)?;
    if response.prevent_default {
        ev.prevent_default();
    }
    if let (Some(effect), Some(transfer)) = (response.drop_effect, ev.data_transfer()) {
        transfer.set_drop_effect(effect.as_str());
    }
    ctrl.replay(&response.mutations);
    Ok(())
}

fn on_click(shared: &Shared, ev: &web_sys::MouseEvent) -> Result<(), JsValue> {
    let mut guard = shared
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str("controller busy"))?;
    let ctrl = &mut *guard;
    let Some(node) = ctrl.node_for(ev.target()) else {
        return Ok(());
    };
    if !matches!(
        ctrl.page.board.get(node).map(|e| &e.kind),
        Some(ElementKind::EvalButton { .. })
    ) {
        return Ok(());
    }

    let Some(outcome) = ctrl
        .page
        .check(node, ctrl.evaluator.as_mut())
        .map_err(js_err)?
    else {
        return Ok(());
    };
    if outcome.advanced {
        if let Some(container) = ctrl.page.sequencer().map(|s| s.container()) {
            ctrl.remount(container)?;
        }
    } else {
        ctrl.replay(&outcome.report.mutations);
    }
    Ok(())
}

fn wire_events(shared: &Shared, container: &Element) -> Result<(), JsValue> {
    for name in DRAG_EVENTS {
        let handle = shared.clone();
        let closure = Closure::<dyn FnMut(web_sys::DragEvent)>::wrap(Box::new(move |ev| {
            if let Err(e) = on_drag(&handle, &ev) {
                log::error!("{} handler failed: {e:?}", ev.type_());
            }
        }));
        container.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    let handle = shared.clone();
    let closure = Closure::<dyn FnMut(web_sys::MouseEvent)>::wrap(Box::new(move |ev| {
        if let Err(e) = on_click(&handle, &ev) {
            log::error!("check failed: {e:?}");
        }
    }));
    container.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Register a page container with the board and the mirror, wiring its
/// listeners the first time it is seen.
fn adopt_container(shared: &Shared, element: &Element) -> Result<(ElementId, NodeIndex), JsValue> {
    let id = container_id(element.get_attribute(ID_ATTRIBUTE), &element.id());
    let first_time = {
        let mut ctrl = shared.borrow_mut();
        let idx = ctrl.page.container(id).map_err(js_err)?;
        ctrl.dom.adopt(id, element.clone())?;
        if ctrl.wired.insert(id) {
            Some(idx)
        } else {
            return Ok((id, idx));
        }
    };
    wire_events(shared, element)?;
    first_time.map(|idx| (id, idx)).ok_or_else(|| js_err("container lost"))
}

fn start_sequence(
    shared: &Shared,
    id: ElementId,
    loaded: Result<Vec<Puzzle>, PuzzleError>,
) -> Result<(), JsValue> {
    let mut ctrl = shared.borrow_mut();
    if !ctrl.page.start_loaded_sequence(id, loaded).map_err(js_err)? {
        return Ok(());
    }
    let container = ctrl
        .page
        .board
        .index_of(id)
        .ok_or_else(|| js_err(format!("container '{id}' vanished")))?;
    ctrl.remount(container)
}

// ─── JS surface ──────────────────────────────────────────────────────────

/// Controller for every puzzle widget on a page.
#[wasm_bindgen]
pub struct PuzzleWidgets {
    inner: Shared,
}

#[wasm_bindgen]
impl PuzzleWidgets {
    /// Create a controller from a JSON `WidgetConfig` (empty text for the
    /// defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PuzzleWidgets, JsValue> {
        console_error_panic_hook_setup();
        init_logging(log::LevelFilter::Info);

        let config = if config_json.trim().is_empty() {
            WidgetConfig::default()
        } else {
            WidgetConfig::from_json_or_default(config_json)
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| js_err("no document"))?;
        let dom = DomMirror::new(document, config.tab_width);

        Ok(Self {
            inner: Rc::new(RefCell::new(Controller {
                page: PageEngine::new(config),
                dom,
                evaluator: Box::new(NullEvaluator),
                wired: HashSet::new(),
            })),
        })
    }

    /// Set up the page's containers according to the configured boot mode.
    pub fn boot(&self) -> Result<(), JsValue> {
        let (document, class, boot, url) = {
            let ctrl = self.inner.borrow();
            let config = &ctrl.page.config;
            (
                ctrl.dom.document().clone(),
                config.container_class.clone(),
                config.boot,
                config.puzzles_url.clone(),
            )
        };
        let nodes = document.query_selector_all(&format!(".{class}"))?;
        let containers: Vec<Element> = (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect();
        log::info!("found {} .{class} containers", containers.len());

        match boot {
            BootMode::Inline => {
                for container in &containers {
                    self.mount_inline(container)?;
                }
            }
            BootMode::Sequence => match containers.first() {
                Some(first) => self.load_sequence(first, &url)?,
                None => log::warn!("no .{class} container to sequence puzzles into"),
            },
        }
        Ok(())
    }

    /// Set up one container from its inline puzzle attribute.
    pub fn mount_inline(&self, container: &Element) -> Result<(), JsValue> {
        let (id, _) = adopt_container(&self.inner, container)?;
        let mut ctrl = self.inner.borrow_mut();
        let attribute = container.get_attribute(&ctrl.page.config.puzzle_attribute);
        let idx = ctrl
            .page
            .mount_inline(id, attribute.as_deref())
            .map_err(js_err)?;
        ctrl.remount(idx)
    }

    /// Load the puzzle list at `url` and present it in `container`, one
    /// puzzle at a time.
    pub fn load_sequence(&self, container: &Element, url: &str) -> Result<(), JsValue> {
        let (id, _) = adopt_container(&self.inner, container)?;
        let shared = self.inner.clone();
        loader::load_puzzles(url, move |loaded| {
            if let Err(e) = start_sequence(&shared, id, loaded) {
                log::error!("could not present puzzles: {e:?}");
            }
        })
    }

    /// Route evaluation to JavaScript: `evaluate(code, language)`,
    /// `probe(expression)` and `reset()`, called before every check.
    pub fn set_evaluator(
        &self,
        evaluate: js_sys::Function,
        probe: js_sys::Function,
        reset: js_sys::Function,
    ) {
        self.inner.borrow_mut().evaluator = Box::new(JsEvaluator::new(evaluate, probe, reset));
    }

    /// Static HTML of a mounted widget's content.
    pub fn widget_html(&self, container: &Element) -> Option<String> {
        let ctrl = self.inner.borrow();
        let id = ElementId::lookup(&container.get_attribute(ID_ATTRIBUTE)?)?;
        let idx = ctrl.page.board.index_of(id)?;
        let board = &ctrl.page.board;
        Some(
            board
                .children(idx)
                .iter()
                .map(|&c| emit_html(board, c, ctrl.page.config.tab_width))
                .collect(),
        )
    }
}

/// Create a controller and boot the page in one call.
#[wasm_bindgen]
pub fn init(config_json: &str) -> Result<PuzzleWidgets, JsValue> {
    let widgets = PuzzleWidgets::new(config_json)?;
    widgets.boot()?;
    Ok(widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn container_ids_prefer_existing_tags() {
        assert_eq!(
            container_id(Some("kept".into()), "dom"),
            ElementId::intern("kept")
        );
        assert_eq!(container_id(None, "puzzle-1"), ElementId::intern("dom-puzzle-1"));
        assert_eq!(container_id(Some(String::new()), "x"), ElementId::intern("dom-x"));
        assert!(container_id(None, "").as_str().starts_with("widget_"));
    }

    #[test]
    fn dom_ids_never_match_board_ids() {
        for dom_id in ["page", "widget_0", "slot_5", "source_3"] {
            assert_ne!(container_id(None, dom_id), ElementId::intern(dom_id));
        }
    }
}
