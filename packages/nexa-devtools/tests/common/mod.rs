#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nexa_devtools::host::{HighlightStyle, LineStyle, Position, TimeoutHandle};
use nexa_devtools::{
    ConnectorLine, DevtoolsConfig, DiagnosticTable, DragHandle, FrameworkAdapter,
    HighlightLayers, NodeDescription, OverlayHost, OwnerId, Rect, Result, ScriptLoader, Supervisor, TooltipKind,
    TooltipSpec, register_toggle_devtool,
};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct NodeKey;
}

pub struct FakeNode {
    pub dom_id: Option<String>,
    pub description: NodeDescription,
    pub rect: Rect,
    pub tooltip: Option<TooltipSpec>,
    pub highlight: Option<HighlightStyle>,
    pub position: Option<Position>,
}

pub struct LineRecord {
    pub from: NodeKey,
    pub to: NodeKey,
    pub style: LineStyle,
    pub repositions: usize,
    pub removed: bool,
}

pub struct DragRecord {
    pub node: NodeKey,
    pub on_move: Option<Box<dyn FnMut()>>,
    pub removed: bool,
}

#[derive(Default)]
pub struct FakeDom {
    pub nodes: SlotMap<NodeKey, FakeNode>,
    pub lines: Vec<LineRecord>,
    pub drags: Vec<DragRecord>,
    pub timers: Vec<(i32, u32, Box<dyn FnOnce()>)>,
    pub next_timer: i32,
    pub tables: Vec<DiagnosticTable>,
    pub raised: Vec<i32>,
}

/// In-memory page: nodes in a slotmap, lines and drags as records.
#[derive(Default)]
pub struct FakeHost {
    pub dom: Rc<RefCell<FakeDom>>,
    pub layers: HighlightLayers<NodeKey>,
    /// Runs timer callbacks on the spot, as a host that cannot schedule does.
    pub inline_timers: Cell<bool>,
}

pub struct FakeLine {
    index: usize,
    dom: Rc<RefCell<FakeDom>>,
}

impl ConnectorLine for FakeLine {
    fn position(&self) {
        self.dom.borrow_mut().lines[self.index].repositions += 1;
    }

    fn remove(&self) {
        self.dom.borrow_mut().lines[self.index].removed = true;
    }
}

pub struct FakeDrag {
    index: usize,
    dom: Rc<RefCell<FakeDom>>,
}

impl DragHandle for FakeDrag {
    fn on_move(&self, callback: Box<dyn FnMut()>) {
        self.dom.borrow_mut().drags[self.index].on_move = Some(callback);
    }

    fn remove(&self) {
        let mut dom = self.dom.borrow_mut();
        dom.drags[self.index].removed = true;
        dom.drags[self.index].on_move = None;
    }
}

impl FakeHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add_element(&self, dom_id: Option<&str>, description: NodeDescription) -> NodeKey {
        let index = self.dom.borrow().nodes.len() as f64;
        self.dom.borrow_mut().nodes.insert(FakeNode {
            dom_id: dom_id.map(str::to_string),
            description,
            rect: Rect {
                top: 200.0 + index * 50.0,
                left: 40.0,
                width: 80.0,
                height: 30.0,
            },
            tooltip: None,
            highlight: None,
            position: None,
        })
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.dom.borrow().nodes.contains_key(key)
    }

    pub fn tooltips(&self) -> Vec<(NodeKey, TooltipSpec)> {
        self.dom
            .borrow()
            .nodes
            .iter()
            .filter_map(|(key, node)| node.tooltip.clone().map(|spec| (key, spec)))
            .collect()
    }

    pub fn tooltip_count(&self) -> usize {
        self.tooltips().len()
    }

    pub fn tooltips_owned_by(&self, owner: OwnerId) -> usize {
        self.tooltips()
            .iter()
            .filter(|(_, spec)| spec.owner == owner)
            .count()
    }

    pub fn tooltip(&self, kind: TooltipKind) -> Option<(NodeKey, TooltipSpec)> {
        self.tooltips().into_iter().find(|(_, spec)| spec.kind == kind)
    }

    pub fn coordinates_of(&self, key: NodeKey) -> Rect {
        self.coordinates(&key)
    }

    pub fn position_of(&self, key: NodeKey) -> Option<Position> {
        self.dom.borrow().nodes.get(key).and_then(|n| n.position)
    }

    pub fn live_lines(&self) -> usize {
        self.dom.borrow().lines.iter().filter(|l| !l.removed).count()
    }

    pub fn live_drags(&self) -> usize {
        self.dom.borrow().drags.iter().filter(|d| !d.removed).count()
    }

    /// Index of the live line joining `a` and `b` in either direction.
    pub fn line_between(&self, a: NodeKey, b: NodeKey) -> Option<usize> {
        self.dom.borrow().lines.iter().position(|l| {
            !l.removed && ((l.from == a && l.to == b) || (l.from == b && l.to == a))
        })
    }

    pub fn repositions(&self, line: usize) -> usize {
        self.dom.borrow().lines[line].repositions
    }

    pub fn line_label(&self, line: usize) -> Option<String> {
        self.dom.borrow().lines[line].style.middle_label.clone()
    }

    /// Simulates the user dragging the tooltip node `key`.
    pub fn drag(&self, key: NodeKey) {
        let slot = self
            .dom
            .borrow()
            .drags
            .iter()
            .position(|d| d.node == key && !d.removed);
        let Some(slot) = slot else {
            panic!("node is not draggable");
        };
        let callback = self.dom.borrow_mut().drags[slot].on_move.take();
        if let Some(mut callback) = callback {
            callback();
            self.dom.borrow_mut().drags[slot].on_move = Some(callback);
        }
    }

    pub fn highlight(&self, key: NodeKey) -> Option<HighlightStyle> {
        self.dom.borrow().nodes.get(key).and_then(|n| n.highlight.clone())
    }

    pub fn pending_timers(&self) -> usize {
        self.dom.borrow().timers.len()
    }

    /// Fires every pending timer.
    pub fn run_timers(&self) {
        let timers = std::mem::take(&mut self.dom.borrow_mut().timers);
        for (_, _, callback) in timers {
            callback();
        }
    }

    pub fn tables(&self) -> Vec<DiagnosticTable> {
        self.dom.borrow().tables.clone()
    }
}

impl FrameworkAdapter<NodeKey> for FakeHost {
    fn describe(&self, element: &NodeKey) -> NodeDescription {
        self.dom
            .borrow()
            .nodes
            .get(*element)
            .map(|n| n.description.clone())
            .unwrap_or_default()
    }
}

impl OverlayHost for FakeHost {
    type Element = NodeKey;
    type Line = FakeLine;
    type Drag = FakeDrag;

    fn element_by_id(&self, id: &str) -> Option<NodeKey> {
        self.dom
            .borrow()
            .nodes
            .iter()
            .find(|(_, node)| node.dom_id.as_deref() == Some(id))
            .map(|(key, _)| key)
    }

    fn coordinates(&self, element: &NodeKey) -> Rect {
        self.dom
            .borrow()
            .nodes
            .get(*element)
            .map(|n| n.rect)
            .unwrap_or_default()
    }

    fn add_highlight(&self, element: &NodeKey, style: &HighlightStyle) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(*element) {
            node.highlight = Some(style.clone());
        }
    }

    fn remove_highlight(&self, element: &NodeKey) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(*element) {
            node.highlight = None;
        }
    }

    fn highlight_layers(&self) -> &HighlightLayers<NodeKey> {
        &self.layers
    }

    fn append_tooltip(&self, spec: &TooltipSpec) -> Result<NodeKey> {
        Ok(self.dom.borrow_mut().nodes.insert(FakeNode {
            dom_id: None,
            description: NodeDescription::default(),
            rect: Rect {
                top: 0.0,
                left: 0.0,
                width: 120.0,
                height: 40.0,
            },
            tooltip: Some(spec.clone()),
            highlight: None,
            position: None,
        }))
    }

    fn move_to(&self, element: &NodeKey, position: Position) {
        if let Some(node) = self.dom.borrow_mut().nodes.get_mut(*element) {
            node.position = Some(position);
        }
    }

    fn remove_element(&self, element: &NodeKey) {
        self.dom.borrow_mut().nodes.remove(*element);
    }

    fn connect(&self, from: &NodeKey, to: &NodeKey, style: &LineStyle) -> Result<FakeLine> {
        let mut dom = self.dom.borrow_mut();
        dom.lines.push(LineRecord {
            from: *from,
            to: *to,
            style: style.clone(),
            repositions: 0,
            removed: false,
        });
        Ok(FakeLine {
            index: dom.lines.len() - 1,
            dom: self.dom.clone(),
        })
    }

    fn draggable(&self, element: &NodeKey) -> Result<FakeDrag> {
        let mut dom = self.dom.borrow_mut();
        dom.drags.push(DragRecord {
            node: *element,
            on_move: None,
            removed: false,
        });
        Ok(FakeDrag {
            index: dom.drags.len() - 1,
            dom: self.dom.clone(),
        })
    }

    fn raise_connectors(&self, z_index: i32) {
        self.dom.borrow_mut().raised.push(z_index);
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<TimeoutHandle> {
        if self.inline_timers.get() {
            callback();
            return None;
        }
        let mut dom = self.dom.borrow_mut();
        dom.next_timer += 1;
        let id = dom.next_timer;
        dom.timers.push((id, delay_ms, callback));
        Some(TimeoutHandle(id))
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        self.dom.borrow_mut().timers.retain(|(id, _, _)| *id != handle.0);
    }

    fn log_table(&self, table: &DiagnosticTable) {
        self.dom.borrow_mut().tables.push(table.clone());
    }
}

/// Script loader whose loads complete immediately or when the test says so.
#[derive(Default)]
pub struct FakeScripts {
    pub manual: Cell<bool>,
    pub fail_with: RefCell<Option<nexa_devtools::DevtoolsError>>,
    pub pending: RefCell<Vec<Box<dyn FnOnce(Result<()>)>>>,
    pub loads: Cell<usize>,
    pub unloads: Cell<usize>,
}

impl FakeScripts {
    pub fn immediate() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn manual() -> Rc<Self> {
        let scripts = Self::default();
        scripts.manual.set(true);
        Rc::new(scripts)
    }

    /// Completes every pending load with `result`.
    pub fn complete(&self, result: Result<()>) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for done in pending {
            done(result.clone());
        }
    }
}

impl ScriptLoader for FakeScripts {
    fn load(&self, _urls: &[String], done: Box<dyn FnOnce(Result<()>)>) {
        self.loads.set(self.loads.get() + 1);
        if self.manual.get() {
            self.pending.borrow_mut().push(done);
            return;
        }
        match self.fail_with.borrow().clone() {
            Some(err) => done(Err(err)),
            None => done(Ok(())),
        }
    }

    fn unload(&self, _urls: &[String]) {
        self.unloads.set(self.unloads.get() + 1);
    }
}

pub fn views(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Supervisor with the toggle devtool registered and started.
pub fn started_supervisor(config: DevtoolsConfig, scripts: Rc<FakeScripts>) -> Supervisor {
    let supervisor = Supervisor::new(config, scripts);
    register_toggle_devtool(&supervisor);
    supervisor.start();
    supervisor
}
