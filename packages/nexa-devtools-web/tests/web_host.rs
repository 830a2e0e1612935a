use std::rc::Rc;

use nexa_devtools::host::{EntrySlot, HighlightStyle, Placement, TooltipEntry};
use nexa_devtools::{
    DevtoolsConfig, FrameworkAdapter, HighlightLayer, OverlayHost, OwnerId, Supervisor,
    TooltipKind, TooltipSpec,
};
use nexa_devtools_web::adapter::parse_list;
use nexa_devtools_web::host::OWNER_ATTR;
use nexa_devtools_web::panel::PANEL_TAG;
use nexa_devtools_web::{DataAttributeAdapter, SupervisorPanel, TOOLTIP_TAG, WebHost, WebScriptLoader};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount(html: &str) -> web_sys::Element {
    let doc = document();
    let root = doc.create_element("div").unwrap();
    root.set_inner_html(html);
    doc.body().unwrap().append_child(&root).unwrap();
    root
}

#[wasm_bindgen_test]
fn test_parse_list_accepts_json_and_commas() {
    assert_eq!(parse_list(r#"["Layout", "Page"]"#), vec!["Layout", "Page"]);
    assert_eq!(parse_list(" Layout , Page ,"), vec!["Layout", "Page"]);
    assert!(parse_list("[not json").is_empty());
    assert!(parse_list("").is_empty());
}

#[wasm_bindgen_test]
fn test_adapter_reads_data_attributes() {
    let root = mount(
        r#"<button id="describe-btn" aria-controls="describe-panel" data-partial="buttons/toggle"
            data-view-stack='["Layout","Page","Sidebar"]' data-shared-views="Layout,Page"
            data-rendering-id="describe-body"></button>"#,
    );
    let trigger = document().get_element_by_id("describe-btn").unwrap();

    let description = DataAttributeAdapter.describe(&trigger);
    assert_eq!(description.controls.as_deref(), Some("describe-panel"));
    assert_eq!(description.partial.as_deref(), Some("buttons/toggle"));
    assert_eq!(description.id.as_deref(), Some("describe-btn"));
    assert_eq!(description.view_stack, vec!["Layout", "Page", "Sidebar"]);
    assert_eq!(description.shared_views, vec!["Layout", "Page"]);
    assert_eq!(description.rendering.id.as_deref(), Some("describe-body"));
    assert_eq!(description.rendering.partial, None);

    root.remove();
}

#[wasm_bindgen_test]
fn test_highlight_restores_previous_outline() {
    let root = mount(r#"<div id="outlined" style="outline: 1px solid red"></div>"#);
    let host = WebHost::new(Rc::new(DevtoolsConfig::default())).unwrap();
    let element = document().get_element_by_id("outlined").unwrap();
    let style = || element.unchecked_ref::<web_sys::HtmlElement>().style();

    host.add_highlight(&element, &HighlightStyle::dashed("darkcyan", "-2px"));
    assert!(style().get_property_value("outline").unwrap().contains("dashed"));

    // A second highlight must not overwrite the saved outline.
    host.add_highlight(&element, &HighlightStyle::dashed("chocolate", "3px"));
    host.remove_highlight(&element);
    assert!(style().get_property_value("outline").unwrap().contains("red"));
    assert_eq!(style().get_property_value("outline-offset").unwrap(), "");

    root.remove();
}

#[wasm_bindgen_test]
fn test_highlight_layers_fall_back_to_passive_outline() {
    let root = mount(r#"<button id="layered" style="outline: 1px solid red"></button>"#);
    let host = WebHost::new(Rc::new(DevtoolsConfig::default())).unwrap();
    let element = document().get_element_by_id("layered").unwrap();
    let outline = || {
        element
            .unchecked_ref::<web_sys::HtmlElement>()
            .style()
            .get_property_value("outline")
            .unwrap()
    };
    let highlights = DevtoolsConfig::default().highlights;
    let (trigger, other) = (OwnerId(71), OwnerId(72));

    let layers = host.highlight_layers();
    layers.push(&host, &element, trigger, HighlightLayer::Passive, &highlights.passive);
    layers.push(&host, &element, other, HighlightLayer::Target, &highlights.target);
    assert!(outline().contains("darkcyan"));

    layers.release(&host, &element, other, HighlightLayer::Target);
    assert!(outline().contains("blueviolet"));

    layers.release(&host, &element, trigger, HighlightLayer::Passive);
    assert!(outline().contains("red"));

    root.remove();
}

#[wasm_bindgen_test]
fn test_tooltip_is_tagged_with_owner() {
    let host = WebHost::new(Rc::new(DevtoolsConfig::default())).unwrap();
    let spec = TooltipSpec {
        owner: OwnerId(4242),
        kind: TooltipKind::Trigger,
        title: "buttons/toggle".to_string(),
        entries: vec![
            TooltipEntry {
                text: "2. Page".to_string(),
                slot: EntrySlot::Unshared,
            },
            TooltipEntry {
                text: "1. Layout".to_string(),
                slot: EntrySlot::Shared,
            },
        ],
        background: "lavender".to_string(),
        color: "blueviolet".to_string(),
        placement: Placement::Top,
    };

    let tooltip = host.append_tooltip(&spec).unwrap();
    assert_eq!(tooltip.tag_name().to_lowercase(), TOOLTIP_TAG);
    assert_eq!(tooltip.get_attribute(OWNER_ATTR).as_deref(), Some("4242"));
    let text = tooltip.text_content().unwrap();
    assert!(text.find("1. Layout").unwrap() < text.find("2. Page").unwrap());

    host.remove_element(&tooltip);
    let selector = format!("{TOOLTIP_TAG}[{OWNER_ATTR}=\"4242\"]");
    assert!(document().query_selector(&selector).unwrap().is_none());
}

#[wasm_bindgen_test]
fn test_panel_lists_devtools_and_closes() {
    let supervisor = Supervisor::new(
        DevtoolsConfig::default(),
        Rc::new(WebScriptLoader::new(document())),
    );
    supervisor.register("toggle", "toggles (trigger/target)");

    let panel = SupervisorPanel::open(&document(), &supervisor).unwrap();
    let checkbox: web_sys::HtmlInputElement = panel
        .element()
        .query_selector("input[name=\"toggle\"]")
        .unwrap()
        .unwrap()
        .unchecked_into();
    assert!(!checkbox.checked());
    assert!(document().query_selector(PANEL_TAG).unwrap().is_some());

    panel.close();
    assert!(!checkbox.checked());
    assert!(document().query_selector(PANEL_TAG).unwrap().is_none());
}
