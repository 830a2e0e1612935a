use nexa_devtools::{FrameworkAdapter, NodeDescription, RenderingInfo};
use web_sys::Element;

/// Reads framework metadata from `data-*` attributes written at render time:
///
/// * `data-controls` (or `aria-controls`): id of the target element
/// * `data-partial`: template that rendered the node
/// * `data-view-stack` / `data-shared-views`: JSON array or comma separated,
///   outermost view first
/// * `data-rendering-id` / `data-rendering-partial`: element re-rendered by
///   the trigger's last update
#[derive(Debug, Default, Clone, Copy)]
pub struct DataAttributeAdapter;

impl FrameworkAdapter<Element> for DataAttributeAdapter {
    fn describe(&self, element: &Element) -> NodeDescription {
        let attr = |name: &str| element.get_attribute(name).filter(|v| !v.is_empty());
        let id = element.id();
        NodeDescription {
            controls: attr("data-controls").or_else(|| attr("aria-controls")),
            partial: attr("data-partial"),
            id: (!id.is_empty()).then_some(id),
            view_stack: attr("data-view-stack")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            shared_views: attr("data-shared-views")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            rendering: RenderingInfo {
                id: attr("data-rendering-id"),
                partial: attr("data-rendering-partial"),
            },
        }
    }
}

pub fn parse_list(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.starts_with('[') {
        return serde_json::from_str(value).unwrap_or_else(|err| {
            tracing::debug!("Ignoring malformed view list {:?}: {}", value, err);
            Vec::new()
        });
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
