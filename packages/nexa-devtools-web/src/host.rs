use std::cell::RefCell;
use std::rc::Rc;

use nexa_devtools::host::{
    EntrySlot, HighlightStyle, LineStyle, Placement, Position, TimeoutHandle, TooltipEntry,
};
use nexa_devtools::{
    DevtoolsConfig, DevtoolsError, DiagnosticTable, HighlightLayers, OverlayHost, Rect, Result,
    TooltipSpec,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Window};

use crate::bindings::{LeaderLine, PlainDraggable, WebDrag, WebLine};
use crate::host_error;

pub const TOOLTIP_TAG: &str = "nexa-devtools-tooltip";
pub const OWNER_ATTR: &str = "data-nexa-devtools-owner";
/// Holds the outline the element had before it was highlighted.
pub const HIGHLIGHT_ATTR: &str = "data-nexa-devtools-highlight";

/// `OverlayHost` backed by the live document.
pub struct WebHost {
    window: Window,
    document: Document,
    config: Rc<DevtoolsConfig>,
    layers: HighlightLayers<Element>,
}

impl WebHost {
    pub fn new(config: Rc<DevtoolsConfig>) -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| DevtoolsError::Host("no global `window` exists".into()))?;
        let document = window
            .document()
            .ok_or_else(|| DevtoolsError::Host("window has no document".into()))?;
        Ok(Self {
            window,
            document,
            config,
            layers: HighlightLayers::default(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn entry_element(&self, entry: &TooltipEntry) -> Result<Element> {
        let div = self.document.create_element("div").map_err(host_error)?;
        let slot = match entry.slot {
            EntrySlot::Content => "content",
            EntrySlot::Shared => "content-top",
            EntrySlot::Unshared => "content-bottom",
        };
        div.set_attribute("slot", slot).map_err(host_error)?;
        div.set_text_content(Some(&entry.text));
        if let Some(div) = div.dyn_ref::<HtmlElement>() {
            let style = div.style();
            match entry.slot {
                EntrySlot::Shared => set_style(&style, "font-weight", "600"),
                EntrySlot::Unshared => set_style(&style, "opacity", "0.55"),
                EntrySlot::Content => {}
            }
        }
        Ok(div)
    }
}

fn set_style(style: &web_sys::CssStyleDeclaration, property: &str, value: &str) {
    if let Err(err) = style.set_property(property, value) {
        tracing::warn!("Failed to set {}: {:?}", property, err);
    }
}

impl OverlayHost for WebHost {
    type Element = Element;
    type Line = WebLine;
    type Drag = WebDrag;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn coordinates(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect {
            top: rect.top(),
            left: rect.left(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn add_highlight(&self, element: &Element, style: &HighlightStyle) {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        let css = html.style();
        if !element.has_attribute(HIGHLIGHT_ATTR) {
            let previous = HighlightStyle {
                outline: css.get_property_value("outline").unwrap_or_default(),
                outline_offset: css.get_property_value("outline-offset").unwrap_or_default(),
            };
            let saved = serde_json::to_string(&previous).unwrap_or_default();
            if let Err(err) = element.set_attribute(HIGHLIGHT_ATTR, &saved) {
                tracing::warn!("Failed to mark highlight: {:?}", err);
                return;
            }
        }
        set_style(&css, "outline", &style.outline);
        set_style(&css, "outline-offset", &style.outline_offset);
    }

    fn remove_highlight(&self, element: &Element) {
        let Some(saved) = element.get_attribute(HIGHLIGHT_ATTR) else {
            return;
        };
        let _ = element.remove_attribute(HIGHLIGHT_ATTR);
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        let previous: HighlightStyle = serde_json::from_str(&saved).unwrap_or(HighlightStyle {
            outline: String::new(),
            outline_offset: String::new(),
        });
        let css = html.style();
        for (property, value) in [
            ("outline", previous.outline),
            ("outline-offset", previous.outline_offset),
        ] {
            if value.is_empty() {
                let _ = css.remove_property(property);
            } else {
                set_style(&css, property, &value);
            }
        }
    }

    fn highlight_layers(&self) -> &HighlightLayers<Element> {
        &self.layers
    }

    fn append_tooltip(&self, spec: &TooltipSpec) -> Result<Element> {
        let tooltip = self.document.create_element(TOOLTIP_TAG).map_err(host_error)?;
        tooltip
            .set_attribute(OWNER_ATTR, &spec.owner.to_string())
            .map_err(host_error)?;
        let placement = match spec.placement {
            Placement::Top => "top",
            Placement::Bottom => "bottom",
        };
        tooltip.set_attribute("position", placement).map_err(host_error)?;

        if let Some(html) = tooltip.dyn_ref::<HtmlElement>() {
            let style = html.style();
            for (property, value) in [
                ("position", "fixed"),
                ("display", "block"),
                ("padding", "5px 8px"),
                ("border-radius", "6px"),
                ("font", "12px monospace"),
                ("cursor", "move"),
                ("white-space", "nowrap"),
            ] {
                set_style(&style, property, value);
            }
            set_style(&style, "background-color", &spec.background);
            set_style(&style, "color", &spec.color);
            set_style(&style, "border", &format!("1px solid {}", spec.color));
            set_style(
                &style,
                "z-index",
                &(self.config.connector_z_index - 1).to_string(),
            );
        }

        let title = self.document.create_element("div").map_err(host_error)?;
        title.set_attribute("slot", "title").map_err(host_error)?;
        title.set_text_content(Some(&spec.title));
        tooltip.append_child(&title).map_err(host_error)?;

        // Shared views render above unshared ones.
        for slot in [EntrySlot::Content, EntrySlot::Shared, EntrySlot::Unshared] {
            for entry in spec.entries.iter().filter(|e| e.slot == slot) {
                let element = self.entry_element(entry)?;
                tooltip.append_child(&element).map_err(host_error)?;
            }
        }

        let body = self
            .document
            .body()
            .ok_or_else(|| DevtoolsError::Host("document has no body".into()))?;
        body.append_child(&tooltip).map_err(host_error)?;
        Ok(tooltip)
    }

    fn move_to(&self, element: &Element, position: Position) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let style = html.style();
            set_style(&style, "top", &format!("{}px", position.top));
            set_style(&style, "left", &format!("{}px", position.left));
        }
    }

    fn remove_element(&self, element: &Element) {
        element.remove();
    }

    fn connect(&self, from: &Element, to: &Element, style: &LineStyle) -> Result<WebLine> {
        let options = serde_json::to_string(style)
            .map_err(|e| DevtoolsError::Host(e.to_string()))
            .and_then(|json| js_sys::JSON::parse(&json).map_err(host_error))?;
        let line = LeaderLine::new(from, to, &options).map_err(host_error)?;
        Ok(WebLine::new(line))
    }

    fn draggable(&self, element: &Element) -> Result<WebDrag> {
        let drag = PlainDraggable::new(element).map_err(host_error)?;
        Ok(WebDrag::new(drag))
    }

    fn raise_connectors(&self, z_index: i32) {
        let Ok(lines) = self.document.query_selector_all(".leader-line") else {
            return;
        };
        for index in 0..lines.length() {
            if let Some(line) = lines
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            {
                set_style(&line.style(), "z-index", &z_index.to_string());
            }
        }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<TimeoutHandle> {
        let slot = Rc::new(RefCell::new(Some(callback)));
        let scheduled = {
            let slot = slot.clone();
            Closure::once_into_js(move || {
                let callback = slot.borrow_mut().take();
                if let Some(callback) = callback {
                    callback();
                }
            })
        };
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                scheduled.unchecked_ref(),
                delay_ms as i32,
            ) {
            Ok(id) => Some(TimeoutHandle(id)),
            Err(err) => {
                tracing::warn!("Failed to schedule timeout, running now: {:?}", err);
                let callback = slot.borrow_mut().take();
                if let Some(callback) = callback {
                    callback();
                }
                None
            }
        }
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        self.window.clear_timeout_with_handle(handle.0);
    }

    fn log_table(&self, table: &DiagnosticTable) {
        match js_sys::JSON::parse(&table.to_json()) {
            Ok(data) => web_sys::console::table_1(&data),
            Err(err) => tracing::warn!("Failed to log diagnostic table: {:?}", err),
        }
    }
}
