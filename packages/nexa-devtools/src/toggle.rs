//! The "toggle" devtool: visualizes how a trigger relates to the element it
//! controls and to the element its last reactive update re-rendered.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::config::{DevtoolsConfig, Exclusivity, Palette, ViewOrder};
use crate::diagnostics::{DiagnosticRow, DiagnosticTable, Status};
use crate::highlight::HighlightLayer;
use crate::host::{
    ConnectorLine, DragHandle, EntrySlot, FrameworkAdapter, LineStyle, NodeDescription,
    OverlayHost, OwnerId, Placement, Position, Rect, RenderingInfo, TimeoutHandle, TooltipEntry,
    TooltipKind, TooltipSpec,
};
use crate::loader::DependencyPin;
use crate::supervisor::{Devtool, PageEvent, Subscription, Supervisor};

pub const TOGGLE_DEVTOOL: &str = "toggle";
pub const TOGGLE_DESCRIPTION: &str = "toggles (trigger/target)";

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Registers the toggle devtool with the supervisor once it starts.
pub fn register_toggle_devtool(supervisor: &Supervisor) {
    supervisor.on_start(|supervisor| supervisor.register(TOGGLE_DEVTOOL, TOGGLE_DESCRIPTION));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Hidden,
    Showing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    Disabled,
    AlreadyShowing,
    Shown(DiagnosticTable),
}

struct Tooltip<H: OverlayHost> {
    kind: TooltipKind,
    node: H::Element,
    drag: Option<H::Drag>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Anchor,
    Tooltip(TooltipKind),
}

struct Connector<H: OverlayHost> {
    line: Rc<H::Line>,
    ends: [Endpoint; 2],
}

/// Everything one show cycle put on the page.
struct Visualization<H: OverlayHost> {
    tooltips: Vec<Tooltip<H>>,
    connectors: Vec<Connector<H>>,
    highlighted: Vec<(H::Element, HighlightLayer)>,
    _pin: DependencyPin,
}

impl<H: OverlayHost> Visualization<H> {
    fn teardown(&self, host: &H, owner: OwnerId) {
        for tooltip in &self.tooltips {
            if let Some(drag) = &tooltip.drag {
                drag.remove();
            }
        }
        for connector in &self.connectors {
            connector.line.remove();
        }
        for tooltip in &self.tooltips {
            host.remove_element(&tooltip.node);
        }
        for (element, layer) in &self.highlighted {
            host.highlight_layers().release(host, element, owner, *layer);
        }
    }
}

struct ToggleInner<H: OverlayHost> {
    visual: Option<Visualization<H>>,
    hide_timeout: Option<TimeoutHandle>,
    last_table: Option<DiagnosticTable>,
}

pub struct ToggleDevtool<H: OverlayHost> {
    me: Weak<Self>,
    owner: OwnerId,
    trigger: H::Element,
    host: Rc<H>,
    adapter: Rc<dyn FrameworkAdapter<H::Element>>,
    supervisor: Supervisor,
    config: Rc<DevtoolsConfig>,
    inner: RefCell<ToggleInner<H>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<H: OverlayHost + 'static> ToggleDevtool<H> {
    pub fn new(
        host: Rc<H>,
        adapter: Rc<dyn FrameworkAdapter<H::Element>>,
        supervisor: &Supervisor,
        trigger: H::Element,
    ) -> Rc<Self> {
        let toggle = Rc::new_cyclic(|me| Self {
            me: me.clone(),
            owner: OwnerId(NEXT_OWNER.fetch_add(1, Ordering::Relaxed)),
            trigger,
            host,
            adapter,
            supervisor: supervisor.clone(),
            config: supervisor.config(),
            inner: RefCell::new(ToggleInner {
                visual: None,
                hide_timeout: None,
                last_table: None,
            }),
            subscription: RefCell::new(None),
        });

        let devtool: Rc<dyn Devtool> = toggle.clone();
        let subscription = supervisor.subscribe(TOGGLE_DEVTOOL, Rc::downgrade(&devtool));
        *toggle.subscription.borrow_mut() = Some(subscription);

        if toggle.enabled() {
            toggle.apply_passive_highlight();
        }
        toggle
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn trigger(&self) -> &H::Element {
        &self.trigger
    }

    pub fn enabled(&self) -> bool {
        self.supervisor.enabled(TOGGLE_DEVTOOL)
    }

    pub fn state(&self) -> ToggleState {
        if self.inner.borrow().visual.is_some() {
            ToggleState::Showing
        } else {
            ToggleState::Hidden
        }
    }

    /// Diagnostic table of the most recent successful show.
    pub fn last_table(&self) -> Option<DiagnosticTable> {
        self.inner.borrow().last_table.clone()
    }

    pub fn show(&self) -> ShowOutcome {
        if !self.enabled() {
            tracing::debug!("Toggle devtool disabled; ignoring show for {}", self.owner);
            return ShowOutcome::Disabled;
        }
        if self.state() == ToggleState::Showing {
            return ShowOutcome::AlreadyShowing;
        }

        if self.config.exclusivity == Exclusivity::SingleActive {
            let key = self
                .subscription
                .borrow()
                .as_ref()
                .and_then(Subscription::devtool_key);
            self.supervisor.hide_others(TOGGLE_DEVTOOL, key);
        }
        self.cancel_pending_hide();

        let trigger = self.adapter.describe(&self.trigger);
        let target_element = trigger
            .controls
            .as_deref()
            .and_then(|id| self.host.element_by_id(id));
        let target = target_element
            .as_ref()
            .map(|element| self.adapter.describe(element));
        let rendering = rendering_info(&trigger, target.as_ref());
        let rendering_element = rendering
            .id
            .as_deref()
            .and_then(|id| self.host.element_by_id(id));
        let shared = shared_views(&trigger, target.as_ref());

        let loader = self.supervisor.loader();
        let mut graph = GraphBuilder {
            host: self.host.as_ref(),
            config: self.config.as_ref(),
            owner: self.owner,
            connectors_ready: loader.is_ready(),
            tooltips: Vec::new(),
            connectors: Vec::new(),
            highlighted: Vec::new(),
        };
        if !graph.connectors_ready {
            tracing::debug!("Connector dependency not ready; rendering text-only tooltips");
        }

        if let Some(element) = &target_element {
            graph.highlight(element, HighlightLayer::Target);
        }
        if let Some(element) = &rendering_element {
            graph.highlight(element, HighlightLayer::Rendering);
        }

        match &rendering_element {
            Some(element) => graph.rendering_tooltip(element, &rendering),
            None => tracing::debug!(
                "Unable to create the rendering tooltip! No element matches the DOM id: '{}'",
                rendering.id.as_deref().unwrap_or_default()
            ),
        }
        match (&target_element, &target) {
            (Some(element), Some(description)) => {
                graph.target_tooltip(element, description, &shared)
            }
            _ => tracing::debug!(
                "Unable to create the target tooltip! No element matches the DOM id: '{}'",
                trigger.controls.as_deref().unwrap_or_default()
            ),
        }
        graph.trigger_tooltip(&self.trigger, &trigger, &shared);
        graph.wire_drags();
        if graph.connectors_ready {
            self.host.raise_connectors(self.config.connector_z_index);
        }

        let table = DiagnosticTable {
            rendering: DiagnosticRow {
                partial: rendering.partial.clone(),
                id: rendering.id.clone(),
                status: Status::found(rendering_element.is_some()),
            },
            trigger: DiagnosticRow {
                partial: trigger.partial.clone(),
                id: trigger.id.clone(),
                status: Status::Ok,
            },
            target: target
                .as_ref()
                .map(|target| DiagnosticRow {
                    partial: target.partial.clone(),
                    id: target.id.clone(),
                    status: Status::Ok,
                })
                .unwrap_or_else(DiagnosticRow::not_found),
        };
        tracing::debug!("Toggle {} shown: {}", self.owner, table.to_json());
        self.host.log_table(&table);

        let visual = Visualization {
            tooltips: graph.tooltips,
            connectors: graph.connectors,
            highlighted: graph.highlighted,
            _pin: loader.pin(),
        };
        let mut inner = self.inner.borrow_mut();
        inner.visual = Some(visual);
        inner.last_table = Some(table.clone());
        ShowOutcome::Shown(table)
    }

    pub fn hide(&self) {
        self.cancel_pending_hide();
        let visual = self.inner.borrow_mut().visual.take();
        let Some(visual) = visual else {
            return;
        };

        visual.teardown(self.host.as_ref(), self.owner);
        tracing::debug!("Toggle {} hidden", self.owner);
    }

    /// Debounced hide; repeated requests within the delay collapse into one.
    pub fn schedule_hide(&self) {
        self.cancel_pending_hide();
        let me = self.me.clone();
        let pending = self.host.set_timeout(
            self.config.hide_debounce_ms,
            Box::new(move || {
                if let Some(toggle) = me.upgrade() {
                    toggle.inner.borrow_mut().hide_timeout = None;
                    toggle.hide();
                }
            }),
        );
        self.inner.borrow_mut().hide_timeout = pending;
    }

    fn cancel_pending_hide(&self) {
        let pending = self.inner.borrow_mut().hide_timeout.take();
        if let Some(handle) = pending {
            self.host.clear_timeout(handle);
        }
    }

    fn apply_passive_highlight(&self) {
        self.host.highlight_layers().push(
            self.host.as_ref(),
            &self.trigger,
            self.owner,
            HighlightLayer::Passive,
            &self.config.highlights.passive,
        );
    }

    fn clear_passive_highlight(&self) {
        self.host.highlight_layers().release(
            self.host.as_ref(),
            &self.trigger,
            self.owner,
            HighlightLayer::Passive,
        );
    }
}

impl<H: OverlayHost + 'static> Devtool for ToggleDevtool<H> {
    fn name(&self) -> &str {
        TOGGLE_DEVTOOL
    }

    fn enabled_changed(&self, enabled: bool) {
        if enabled {
            self.apply_passive_highlight();
        } else {
            self.hide();
            self.clear_passive_highlight();
        }
    }

    fn page_event(&self, event: PageEvent) {
        if event == (PageEvent::Click { inside_tooltip: true }) {
            return;
        }
        if self.state() == ToggleState::Showing {
            self.schedule_hide();
        }
    }

    fn hide(&self) {
        ToggleDevtool::hide(self);
    }

    fn is_showing(&self) -> bool {
        self.state() == ToggleState::Showing
    }
}

impl<H: OverlayHost> Drop for ToggleDevtool<H> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(handle) = inner.hide_timeout.take() {
            self.host.clear_timeout(handle);
        }
        if let Some(visual) = inner.visual.take() {
            visual.teardown(self.host.as_ref(), self.owner);
        }
        self.host.highlight_layers().release(
            self.host.as_ref(),
            &self.trigger,
            self.owner,
            HighlightLayer::Passive,
        );
    }
}

/// Builds the tooltip graph for one show cycle.
struct GraphBuilder<'a, H: OverlayHost> {
    host: &'a H,
    config: &'a DevtoolsConfig,
    owner: OwnerId,
    connectors_ready: bool,
    tooltips: Vec<Tooltip<H>>,
    connectors: Vec<Connector<H>>,
    highlighted: Vec<(H::Element, HighlightLayer)>,
}

impl<H: OverlayHost> GraphBuilder<'_, H> {
    fn highlight(&mut self, element: &H::Element, layer: HighlightLayer) {
        let style = match layer {
            HighlightLayer::Target => &self.config.highlights.target,
            HighlightLayer::Rendering => &self.config.highlights.rendering,
            HighlightLayer::Passive => &self.config.highlights.passive,
        };
        self.host
            .highlight_layers()
            .push(self.host, element, self.owner, layer, style);
        self.highlighted.push((element.clone(), layer));
    }

    fn rendering_tooltip(&mut self, anchor: &H::Element, rendering: &RenderingInfo) {
        let title = format!(
            "RENDERING (id: {})",
            rendering.id.as_deref().unwrap_or("unknown")
        );
        let entries = vec![TooltipEntry {
            text: format!(
                "partial: {}",
                rendering.partial.as_deref().unwrap_or("unknown")
            ),
            slot: EntrySlot::Content,
        }];
        let palette = self.config.palettes.rendering.clone();
        if self.append(TooltipKind::Rendering, title, entries, &palette, Placement::Top, anchor) {
            self.connect(
                Endpoint::Tooltip(TooltipKind::Rendering),
                Endpoint::Anchor,
                anchor,
                self.line_style(&palette, None),
            );
        }
    }

    fn target_tooltip(
        &mut self,
        anchor: &H::Element,
        target: &NodeDescription,
        shared: &[String],
    ) {
        let title = format!("TARGET (id: {})", target.id.as_deref().unwrap_or("unknown"));
        let entries = view_entries(&target.view_stack, shared, self.config.view_order);
        let palette = self.config.palettes.target.clone();
        if self.append(TooltipKind::Target, title, entries, &palette, Placement::Bottom, anchor) {
            self.connect(
                Endpoint::Tooltip(TooltipKind::Target),
                Endpoint::Anchor,
                anchor,
                self.line_style(&palette, None),
            );
        }
    }

    fn trigger_tooltip(
        &mut self,
        anchor: &H::Element,
        trigger: &NodeDescription,
        shared: &[String],
    ) {
        let title = format!(
            "TRIGGER (controls: {})",
            trigger.controls.as_deref().unwrap_or("none")
        );
        let entries = view_entries(&trigger.view_stack, shared, self.config.view_order);
        let palette = self.config.palettes.trigger.clone();
        if !self.append(TooltipKind::Trigger, title, entries, &palette, Placement::Top, anchor) {
            return;
        }

        self.connect(
            Endpoint::Anchor,
            Endpoint::Tooltip(TooltipKind::Trigger),
            anchor,
            self.line_style(&palette, None),
        );
        for (kind, label) in [
            (TooltipKind::Target, "toggles"),
            (TooltipKind::Rendering, "renders"),
        ] {
            if self.tooltip(kind).is_some() {
                self.connect(
                    Endpoint::Tooltip(TooltipKind::Trigger),
                    Endpoint::Tooltip(kind),
                    anchor,
                    self.line_style(&palette, Some(label)),
                );
            }
        }
    }

    /// Every drag handle repositions every line touching its tooltip,
    /// including lines created on behalf of other tooltips.
    fn wire_drags(&mut self) {
        for tooltip in &self.tooltips {
            let Some(drag) = &tooltip.drag else {
                continue;
            };
            let endpoint = Endpoint::Tooltip(tooltip.kind);
            let lines: SmallVec<[Rc<H::Line>; 3]> = self
                .connectors
                .iter()
                .filter(|connector| connector.ends.contains(&endpoint))
                .map(|connector| connector.line.clone())
                .collect();
            drag.on_move(Box::new(move || {
                for line in &lines {
                    line.position();
                }
            }));
        }
    }

    fn append(
        &mut self,
        kind: TooltipKind,
        title: String,
        entries: Vec<TooltipEntry>,
        palette: &Palette,
        placement: Placement,
        anchor: &H::Element,
    ) -> bool {
        let spec = TooltipSpec {
            owner: self.owner,
            kind,
            title,
            entries,
            background: palette.background.clone(),
            color: palette.color.clone(),
            placement,
        };
        let node = match self.host.append_tooltip(&spec) {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!("Failed to append {:?} tooltip: {}", kind, err);
                return false;
            }
        };

        let anchor_box = self.host.coordinates(anchor);
        let tooltip_box = self.host.coordinates(&node);
        let position = tooltip_position(kind, anchor_box, tooltip_box, self.config.rendering_gap);
        self.host.move_to(&node, position);

        let drag = if self.connectors_ready {
            self.host
                .draggable(&node)
                .inspect_err(|err| tracing::warn!("Failed to make tooltip draggable: {}", err))
                .ok()
        } else {
            None
        };
        self.tooltips.push(Tooltip { kind, node, drag });
        true
    }

    fn connect(&mut self, from: Endpoint, to: Endpoint, anchor: &H::Element, style: LineStyle) {
        if !self.connectors_ready {
            return;
        }
        let (Some(start), Some(end)) = (self.resolve(from, anchor), self.resolve(to, anchor)) else {
            return;
        };
        match self.host.connect(&start, &end, &style) {
            Ok(line) => self.connectors.push(Connector {
                line: Rc::new(line),
                ends: [from, to],
            }),
            Err(err) => tracing::warn!("Failed to draw connector line: {}", err),
        }
    }

    fn resolve(&self, endpoint: Endpoint, anchor: &H::Element) -> Option<H::Element> {
        match endpoint {
            Endpoint::Anchor => Some(anchor.clone()),
            Endpoint::Tooltip(kind) => self.tooltip(kind).map(|t| t.node.clone()),
        }
    }

    fn tooltip(&self, kind: TooltipKind) -> Option<&Tooltip<H>> {
        self.tooltips.iter().find(|t| t.kind == kind)
    }

    fn line_style(&self, palette: &Palette, label: Option<&str>) -> LineStyle {
        let mut style = self.config.line.clone();
        style.color = palette.color.clone();
        if let Some(label) = label {
            style.middle_label = Some(label.to_string());
            style.size = self.config.link_size;
        }
        style
    }
}

/// Anchor-relative placement; tooltips may overlap.
pub fn tooltip_position(kind: TooltipKind, anchor: Rect, tooltip: Rect, rendering_gap: f64) -> Position {
    let (top, left) = match kind {
        TooltipKind::Rendering => (
            anchor.top + anchor.height / 2.0 - tooltip.height / 2.0,
            anchor.left + anchor.width + rendering_gap,
        ),
        TooltipKind::Target => (
            anchor.top + tooltip.height,
            anchor.left + anchor.width + tooltip.width / 3.0,
        ),
        TooltipKind::Trigger => (
            anchor.top - tooltip.height * 2.0,
            anchor.left + anchor.width + tooltip.width / 3.0,
        ),
    };
    Position {
        top: top.ceil(),
        left: left.ceil(),
    }
}

/// Rendering cause, falling back to the target's when the trigger has none.
pub fn rendering_info(trigger: &NodeDescription, target: Option<&NodeDescription>) -> RenderingInfo {
    let fallback = target.map(|t| &t.rendering);
    RenderingInfo {
        id: trigger
            .rendering
            .id
            .clone()
            .or_else(|| fallback.and_then(|r| r.id.clone())),
        partial: trigger
            .rendering
            .partial
            .clone()
            .or_else(|| fallback.and_then(|r| r.partial.clone())),
    }
}

/// Views shared by trigger and target. Adapter-reported shared views win;
/// otherwise the overlap of both stacks is used.
pub fn shared_views(trigger: &NodeDescription, target: Option<&NodeDescription>) -> Vec<String> {
    if !trigger.shared_views.is_empty() {
        return trigger.shared_views.clone();
    }
    let Some(target) = target else {
        return Vec::new();
    };
    trigger
        .view_stack
        .iter()
        .filter(|view| target.view_stack.contains(view))
        .cloned()
        .collect()
}

pub fn view_entries(stack: &[String], shared: &[String], order: ViewOrder) -> Vec<TooltipEntry> {
    let views: Box<dyn Iterator<Item = &String>> = match order {
        ViewOrder::InnermostFirst => Box::new(stack.iter().rev()),
        ViewOrder::OutermostFirst => Box::new(stack.iter()),
    };
    views
        .enumerate()
        .map(|(index, view)| TooltipEntry {
            text: format!("{}. {}", index + 1, view),
            slot: if shared.contains(view) {
                EntrySlot::Shared
            } else {
                EntrySlot::Unshared
            },
        })
        .collect()
}
