//! Element ids.
//!
//! Every element on the board has an id that is unique on the page. The
//! wasm bridge writes it into the element's `data-pp-id` attribute and reads
//! it back from event targets, so an id is also the key that maps a DOM node
//! to its board element.
//!
//! Ids are interned page-wide. Generated ids have the form `role_N`.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Suffix counter shared by every role.
static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// The id spelled `s`, interning it on first use.
    pub fn intern(s: &str) -> Self {
        ElementId(IDS.get_or_intern(s))
    }

    /// The id spelled `s`, if any element has ever used it. Attribute text
    /// from the page goes through here so foreign values are not interned.
    pub fn lookup(s: &str) -> Option<Self> {
        IDS.get(s).map(ElementId)
    }

    pub fn as_str(&self) -> &str {
        IDS.resolve(&self.0)
    }

    /// A fresh id for an element playing `role` (`slot`, `source`, ...).
    pub fn mint(role: &str) -> Self {
        let n = NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{role}_{n}"))
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_spelling_same_id() {
        let a = ElementId::intern("widget_main");
        assert_eq!(a, ElementId::intern("widget_main"));
        assert_eq!(a.to_string(), "widget_main");
        assert_eq!(format!("{a:?}"), "#widget_main");
        assert_eq!(ElementId::lookup("widget_main"), Some(a));
    }

    #[test]
    fn minted_ids_carry_their_role() {
        let a = ElementId::mint("slot");
        let b = ElementId::mint("slot");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("slot_"));
    }

    #[test]
    fn attribute_text_is_not_interned_by_lookup() {
        assert_eq!(ElementId::lookup("data-pp-id never written"), None);
        assert_eq!(ElementId::lookup("data-pp-id never written"), None);
    }
}
