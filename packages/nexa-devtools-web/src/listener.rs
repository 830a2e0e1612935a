use nexa_devtools::Result;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget};

use crate::host_error;

/// A DOM listener that is removed again when dropped.
pub struct EventListener {
    target: EventTarget,
    name: String,
    closure: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new(
        target: &EventTarget,
        name: &str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self> {
        let closure = Closure::<dyn FnMut(Event)>::new(callback);
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(host_error)?;
        Ok(Self {
            target: target.clone(),
            name: name.to_string(),
            closure,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.name, self.closure.as_ref().unchecked_ref());
    }
}
