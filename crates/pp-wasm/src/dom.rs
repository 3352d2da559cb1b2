//! DOM mirror: keeps the page's elements in step with the board.
//!
//! Whole widgets are (re)built from emitted HTML; after that, every
//! `BoardMutation` is replayed as the matching DOM call. Elements are found
//! by their `data-pp-id` attribute.

use pp_core::NodeIndex;
use pp_core::emitter::emit_html;
use pp_core::id::ElementId;
use pp_core::model::{Board, BoardMutation, ElementKind};
use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

pub(crate) const ID_ATTRIBUTE: &str = "data-pp-id";

/// Where `SetText` writes for an element of this kind: a descendant
/// selector, or `None` for the element itself.
pub(crate) fn text_selector(kind: &ElementKind) -> Option<&'static str> {
    match kind {
        ElementKind::TestEntry { .. } => Some(".test_value"),
        _ => None,
    }
}

fn missing(what: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("no DOM element for {what}"))
}

pub(crate) struct DomMirror {
    document: Document,
    elements: HashMap<ElementId, Element>,
    tab_width: usize,
}

impl DomMirror {
    pub fn new(document: Document, tab_width: usize) -> Self {
        Self {
            document,
            elements: HashMap::new(),
            tab_width,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Register an existing page element (a widget container) under `id`.
    pub fn adopt(&mut self, id: ElementId, element: Element) -> Result<(), JsValue> {
        element.set_attribute(ID_ATTRIBUTE, id.as_str())?;
        self.elements.insert(id, element);
        Ok(())
    }

    fn lookup(&self, id: ElementId) -> Result<Element, JsValue> {
        self.elements.get(&id).cloned().ok_or_else(|| missing(id))
    }

    /// Replace the DOM content of `container` with the board's.
    pub fn remount(&mut self, board: &Board, container: NodeIndex) -> Result<(), JsValue> {
        let id = board
            .id_of(container)
            .ok_or_else(|| missing(format_args!("{container:?}")))?;
        let dom = self.lookup(id)?;
        self.forget_below(&dom)?;
        let html: String = board
            .children(container)
            .iter()
            .map(|&child| emit_html(board, child, self.tab_width))
            .collect();
        dom.set_inner_html(&html);
        self.index_below(&dom)
    }

    fn tagged_below(root: &Element) -> Result<Vec<Element>, JsValue> {
        let nodes = root.query_selector_all(&format!("[{ID_ATTRIBUTE}]"))?;
        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect())
    }

    fn index_below(&mut self, root: &Element) -> Result<(), JsValue> {
        for element in Self::tagged_below(root)? {
            if let Some(id) = element.get_attribute(ID_ATTRIBUTE) {
                self.elements.insert(ElementId::intern(&id), element);
            }
        }
        Ok(())
    }

    fn forget_below(&mut self, root: &Element) -> Result<(), JsValue> {
        for element in Self::tagged_below(root)? {
            if let Some(id) = element.get_attribute(ID_ATTRIBUTE).and_then(|s| ElementId::lookup(&s)) {
                self.elements.remove(&id);
            }
        }
        Ok(())
    }

    /// Create the DOM for a board element and everything below it.
    fn build(&mut self, board: &Board, id: ElementId) -> Result<Element, JsValue> {
        let idx = board.index_of(id).ok_or_else(|| missing(id))?;
        let holder = self.document.create_element("div")?;
        holder.set_inner_html(&emit_html(board, idx, self.tab_width));
        let element = holder.first_element_child().ok_or_else(|| missing(id))?;
        self.index_below(&holder)?;
        Ok(element)
    }

    /// Replay a mutation that has already been applied to `board`.
    pub fn replay(&mut self, board: &Board, mutation: &BoardMutation) -> Result<(), JsValue> {
        match mutation {
            BoardMutation::InsertBefore {
                node,
                parent,
                anchor,
            } => {
                let node = self.lookup(*node)?;
                let parent = self.lookup(*parent)?;
                let anchor = anchor.map(|a| self.lookup(a)).transpose()?;
                let anchor: Option<&Node> = anchor.as_ref().map(|a| a.as_ref());
                parent.insert_before(&node, anchor)?;
            }
            BoardMutation::Detach { node } => self.lookup(*node)?.remove(),
            BoardMutation::Discard { node } => {
                let element = self.lookup(*node)?;
                self.forget_below(&element)?;
                element.remove();
                self.elements.remove(node);
            }
            BoardMutation::Append { parent, element } => {
                let parent = self.lookup(*parent)?;
                let child = self.build(board, element.id)?;
                parent.append_child(&child)?;
            }
            BoardMutation::SetMarker { node, marker, on } => {
                self.lookup(*node)?
                    .class_list()
                    .toggle_with_force(marker.class_name(), *on)?;
            }
            BoardMutation::SetOpacity { node, opacity } => {
                let element = self.lookup(*node)?;
                if let Some(html) = element.dyn_ref::<HtmlElement>() {
                    let style = html.style();
                    match opacity {
                        Some(o) => style.set_property("opacity", &o.to_string())?,
                        None => {
                            style.remove_property("opacity")?;
                        }
                    }
                }
            }
            BoardMutation::SetText { node, text } => {
                let element = self.lookup(*node)?;
                let selector = board
                    .index_of(*node)
                    .and_then(|idx| board.get(idx))
                    .and_then(|e| text_selector(&e.kind));
                let target = match selector {
                    Some(selector) => element
                        .query_selector(selector)?
                        .ok_or_else(|| missing(selector))?,
                    None => element,
                };
                target.set_text_content(Some(text));
            }
        }
        Ok(())
    }
}
