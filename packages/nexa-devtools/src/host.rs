//! Contracts between the devtool core and the page it decorates.
//!
//! The core never touches the DOM directly. Everything it needs (lookups,
//! highlights, layout, tooltip nodes, connector lines, timers) goes through
//! [`OverlayHost`], and everything it needs to know about a framework node goes
//! through [`FrameworkAdapter`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticTable;
use crate::error::Result;
use crate::highlight::HighlightLayers;

/// Viewport-space bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightStyle {
    pub outline: String,
    pub outline_offset: String,
}

impl HighlightStyle {
    pub fn dashed(color: &str, offset: &str) -> Self {
        Self {
            outline: format!("3px dashed {color}"),
            outline_offset: offset.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dash {
    pub animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DropShadow {
    pub opacity: f64,
}

/// Connector line options, serialized in the shape the line library expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineStyle {
    pub color: String,
    pub size: f64,
    pub dash: Dash,
    pub drop_shadow: DropShadow,
    pub start_plug: String,
    pub start_plug_size: f64,
    pub end_plug: String,
    pub end_plug_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_label: Option<String>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: "blueviolet".to_string(),
            size: 3.0,
            dash: Dash { animation: true },
            drop_shadow: DropShadow { opacity: 0.3 },
            start_plug: "disc".to_string(),
            start_plug_size: 1.0,
            end_plug: "arrow3".to_string(),
            end_plug_size: 1.7,
            middle_label: None,
        }
    }
}

/// Identifies the devtool instance that owns an overlay node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipKind {
    Rendering,
    Target,
    Trigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
}

/// Where a tooltip line is rendered. Shared views sort above unshared ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntrySlot {
    Content,
    Shared,
    Unshared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipEntry {
    pub text: String,
    pub slot: EntrySlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipSpec {
    pub owner: OwnerId,
    pub kind: TooltipKind,
    pub title: String,
    pub entries: Vec<TooltipEntry>,
    pub background: String,
    pub color: String,
    pub placement: Placement,
}

/// Rendering cause reported for a node: which element was re-rendered and by
/// which partial.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderingInfo {
    pub id: Option<String>,
    pub partial: Option<String>,
}

/// Framework metadata for a trigger or target node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Id of the element this trigger is bound to.
    pub controls: Option<String>,
    pub partial: Option<String>,
    pub id: Option<String>,
    /// Views enclosing the node, outermost first.
    pub view_stack: Vec<String>,
    pub shared_views: Vec<String>,
    pub rendering: RenderingInfo,
}

/// Reads framework metadata off an element.
pub trait FrameworkAdapter<E> {
    fn describe(&self, element: &E) -> NodeDescription;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(pub i32);

pub trait ConnectorLine {
    /// Recomputes the line after either endpoint moved.
    fn position(&self);
    fn remove(&self);
}

pub trait DragHandle {
    /// Replaces the move callback.
    fn on_move(&self, callback: Box<dyn FnMut()>);
    fn remove(&self);
}

pub trait OverlayHost {
    type Element: Clone + PartialEq + fmt::Debug + 'static;
    type Line: ConnectorLine + 'static;
    type Drag: DragHandle + 'static;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Live layout of `element`; never cached.
    fn coordinates(&self, element: &Self::Element) -> Rect;

    /// Paints `style` over the element. Repeated calls repaint without
    /// forgetting the element's own style.
    fn add_highlight(&self, element: &Self::Element, style: &HighlightStyle);

    /// Strips only what `add_highlight` introduced.
    fn remove_highlight(&self, element: &Self::Element);

    /// Shared by every devtool drawing on this host.
    fn highlight_layers(&self) -> &HighlightLayers<Self::Element>;

    /// Appends a tooltip node tagged with `spec.owner`.
    fn append_tooltip(&self, spec: &TooltipSpec) -> Result<Self::Element>;

    fn move_to(&self, element: &Self::Element, position: Position);

    fn remove_element(&self, element: &Self::Element);

    /// Only called once the connector dependency is ready.
    fn connect(
        &self,
        from: &Self::Element,
        to: &Self::Element,
        style: &LineStyle,
    ) -> Result<Self::Line>;

    /// Only called once the connector dependency is ready.
    fn draggable(&self, element: &Self::Element) -> Result<Self::Drag>;

    /// Lifts every connector line above the rest of the overlay chrome.
    fn raise_connectors(&self, z_index: i32);

    /// `None` when the host could not schedule and already ran `callback`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<TimeoutHandle>;

    fn clear_timeout(&self, handle: TimeoutHandle);

    fn log_table(&self, table: &DiagnosticTable);
}
