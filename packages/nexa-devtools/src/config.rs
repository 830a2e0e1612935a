use serde::{Deserialize, Serialize};

use crate::error::{DevtoolsError, Result};
use crate::host::{HighlightStyle, LineStyle};

/// How many toggle visualizations may be on screen at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusivity {
    /// Showing one toggle hides every other toggle of the same devtool.
    #[default]
    SingleActive,
    /// Every trigger manages its own visibility.
    Independent,
}

/// Display order for view stacks. Adapters always report views outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOrder {
    #[default]
    InnermostFirst,
    OutermostFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: String,
    pub color: String,
}

impl Palette {
    fn new(background: &str, color: &str) -> Self {
        Self {
            background: background.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palettes {
    pub trigger: Palette,
    pub target: Palette,
    pub rendering: Palette,
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            trigger: Palette::new("lavender", "blueviolet"),
            target: Palette::new("lightcyan", "darkcyan"),
            rendering: Palette::new("lightyellow", "chocolate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Highlights {
    /// Applied to every trigger while its devtool is enabled.
    pub passive: HighlightStyle,
    pub target: HighlightStyle,
    pub rendering: HighlightStyle,
}

impl Default for Highlights {
    fn default() -> Self {
        Self {
            passive: HighlightStyle::dashed("blueviolet", "2px"),
            target: HighlightStyle::dashed("darkcyan", "-2px"),
            rendering: HighlightStyle::dashed("chocolate", "3px"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoolsConfig {
    /// Connector-line and drag library bundle, loaded in order.
    pub library_urls: Vec<String>,
    pub hide_debounce_ms: u32,
    pub connector_z_index: i32,
    pub exclusivity: Exclusivity,
    pub view_order: ViewOrder,
    /// Horizontal gap between the rendering element and its tooltip.
    pub rendering_gap: f64,
    /// Line width for the tooltip-to-tooltip links.
    pub link_size: f64,
    pub line: LineStyle,
    pub palettes: Palettes,
    pub highlights: Highlights,
    /// Framework lifecycle events that dismiss open visualizations.
    pub navigation_events: Vec<String>,
    pub event_prefix: String,
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            library_urls: vec![
                "https://cdn.jsdelivr.net/npm/leader-line@1.0.7/leader-line.min.js".to_string(),
                "https://cdn.jsdelivr.net/npm/plain-draggable@2.5.14/plain-draggable.min.js"
                    .to_string(),
            ],
            hide_debounce_ms: 25,
            connector_z_index: 100_000,
            exclusivity: Exclusivity::default(),
            view_order: ViewOrder::default(),
            rendering_gap: 100.0,
            link_size: 2.1,
            line: LineStyle::default(),
            palettes: Palettes::default(),
            highlights: Highlights::default(),
            navigation_events: vec![
                "nexa:navigate".to_string(),
                "nexa:route-load".to_string(),
                "nexa:update-complete".to_string(),
            ],
            event_prefix: "nexa-devtools".to_string(),
        }
    }
}

impl DevtoolsConfig {
    /// Parses a (possibly partial) JSON document; missing keys keep their defaults.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| DevtoolsError::Config(e.to_string()))
    }

    /// Fully qualified DOM event name, e.g. `nexa-devtools:devtool-enable`.
    pub fn event_name(&self, kind: &str) -> String {
        format!("{}:{}", self.event_prefix, kind)
    }
}
