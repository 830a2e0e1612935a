use nexa_devtools::{Result, Supervisor};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

use crate::host_error;
use crate::listener::EventListener;

pub const PANEL_TAG: &str = "nexa-devtools-supervisor";

/// Checkbox-per-devtool panel. Holds no state beyond its checkboxes.
pub struct SupervisorPanel {
    element: Element,
    _change: EventListener,
    _close: EventListener,
}

impl SupervisorPanel {
    pub fn open(document: &Document, supervisor: &Supervisor) -> Result<Self> {
        let element = document.create_element(PANEL_TAG).map_err(host_error)?;
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let style = html.style();
            for (property, value) in [
                ("position", "fixed"),
                ("bottom", "20px"),
                ("left", "50%"),
                ("transform", "translateX(-50%)"),
                ("display", "flex"),
                ("gap", "0 5px"),
                ("padding", "5px 10px"),
                ("border-radius", "10px"),
                ("outline", "solid 1px gainsboro"),
                ("background-color", "ghostwhite"),
                ("user-select", "none"),
                ("z-index", "10000"),
            ] {
                let _ = style.set_property(property, value);
            }
        }

        let heading = document.create_element("strong").map_err(host_error)?;
        heading.set_text_content(Some("Nexa"));
        element.append_child(&heading).map_err(host_error)?;

        for (name, description) in supervisor.registrations() {
            let label = document.create_element("label").map_err(host_error)?;
            label.set_attribute("slot", "devtool").map_err(host_error)?;
            let checkbox: HtmlInputElement = document
                .create_element("input")
                .map_err(host_error)?
                .unchecked_into();
            checkbox.set_type("checkbox");
            checkbox.set_name(&name);
            checkbox.set_checked(supervisor.enabled(&name));
            label.append_child(&checkbox).map_err(host_error)?;
            label
                .append_with_str_1(&description)
                .map_err(host_error)?;
            element.append_child(&label).map_err(host_error)?;
        }

        let closer = document.create_element("button").map_err(host_error)?;
        closer.set_attribute("data-role", "closer").map_err(host_error)?;
        closer.set_text_content(Some("X"));
        element.append_child(&closer).map_err(host_error)?;

        let change = {
            let supervisor = supervisor.clone();
            EventListener::new(&element, "change", move |event: Event| {
                let Some(input) = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                if input.checked() {
                    supervisor.enable_devtool(&input.name());
                } else {
                    supervisor.disable_devtool(&input.name());
                }
            })?
        };
        let close = {
            let panel = element.clone();
            EventListener::new(&closer, "click", move |_| close_panel(&panel))?
        };

        let body = document
            .body()
            .ok_or_else(|| nexa_devtools::DevtoolsError::Host("document has no body".into()))?;
        body.append_child(&element).map_err(host_error)?;

        Ok(Self {
            element,
            _change: change,
            _close: close,
        })
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn close(&self) {
        close_panel(&self.element);
    }
}

/// Unchecks every checkbox and detaches the panel.
fn close_panel(panel: &Element) {
    if let Ok(inputs) = panel.query_selector_all("input[type=\"checkbox\"]") {
        for index in 0..inputs.length() {
            if let Some(input) = inputs
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            {
                input.set_checked(false);
            }
        }
    }
    panel.remove();
}
