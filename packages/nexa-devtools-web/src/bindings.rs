// Bindings for the connector-line (leader-line) and drag (plain-draggable)
// libraries. Both are globals installed by the dependency loader, so the
// constructors throw until the bundle has landed.

use std::cell::RefCell;

use nexa_devtools::{ConnectorLine, DragHandle};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

#[wasm_bindgen]
extern "C" {
    pub type LeaderLine;

    #[wasm_bindgen(constructor, catch)]
    pub fn new(start: &Element, end: &Element, options: &JsValue) -> Result<LeaderLine, JsValue>;

    #[wasm_bindgen(method)]
    pub fn position(this: &LeaderLine);

    #[wasm_bindgen(method)]
    pub fn remove(this: &LeaderLine);

    pub type PlainDraggable;

    #[wasm_bindgen(constructor, catch)]
    pub fn new(element: &Element) -> Result<PlainDraggable, JsValue>;

    #[wasm_bindgen(method, setter = onMove)]
    pub fn set_on_move(this: &PlainDraggable, callback: &js_sys::Function);

    #[wasm_bindgen(method)]
    pub fn remove(this: &PlainDraggable);
}

pub struct WebLine {
    line: LeaderLine,
}

impl WebLine {
    pub fn new(line: LeaderLine) -> Self {
        Self { line }
    }
}

impl ConnectorLine for WebLine {
    fn position(&self) {
        self.line.position();
    }

    fn remove(&self) {
        self.line.remove();
    }
}

pub struct WebDrag {
    drag: PlainDraggable,
    // Kept alive for as long as the library may call it.
    on_move: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl WebDrag {
    pub fn new(drag: PlainDraggable) -> Self {
        Self {
            drag,
            on_move: RefCell::new(None),
        }
    }
}

impl DragHandle for WebDrag {
    fn on_move(&self, callback: Box<dyn FnMut()>) {
        let closure = Closure::wrap(callback);
        self.drag.set_on_move(closure.as_ref().unchecked_ref());
        *self.on_move.borrow_mut() = Some(closure);
    }

    fn remove(&self) {
        self.drag.remove();
        self.on_move.borrow_mut().take();
    }
}
