//! Widget configuration.

use serde::{Deserialize, Serialize};

/// How widgets on a page get their puzzles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootMode {
    /// Every container is set up from its own puzzle attribute.
    Inline,
    /// The puzzle list is loaded and sequenced into the first container.
    #[default]
    Sequence,
}

/// Configuration for widget setup and interaction.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Opacity applied to a fragment while it is dragged. Default: **0.6**.
    pub drag_opacity: f32,
    /// Non-breaking spaces shown per tab character. Default: **4**.
    pub tab_width: usize,
    /// Puzzle list, relative to the page. Default: `puzzles.json`.
    pub puzzles_url: String,
    /// Add the evaluate control to the solution bucket. Default: **true**.
    pub show_eval_button: bool,
    pub eval_label: String,
    /// Class marking widget containers on the page.
    pub container_class: String,
    /// Attribute carrying an inline puzzle.
    pub puzzle_attribute: String,
    pub boot: BootMode,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            drag_opacity: 0.6,
            tab_width: 4,
            puzzles_url: "puzzles.json".to_string(),
            show_eval_button: true,
            eval_label: "check".to_string(),
            container_class: crate::model::class::CONTAINER.to_string(),
            puzzle_attribute: "data-puzzle".to_string(),
            boot: BootMode::Sequence,
        }
    }
}

impl WidgetConfig {
    /// Parse a JSON configuration, keeping defaults for missing fields.
    /// Malformed JSON is logged and yields the default configuration.
    pub fn from_json_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::error!("Malformed widget configuration ({e}): {json}");
            Self::default()
        })
    }
}
