use std::cell::RefCell;
use std::rc::{Rc, Weak};

use nexa_devtools::{
    DevtoolEvent, DevtoolsConfig, DevtoolsError, PageEvent, Subscription, Supervisor,
    ToggleDevtool, install_supervisor, register_toggle_devtool,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, Document, Element, Event};

pub mod adapter;
pub mod bindings;
pub mod host;
pub mod listener;
pub mod panel;
pub mod scripts;

pub use adapter::DataAttributeAdapter;
pub use host::{TOOLTIP_TAG, WebHost};
pub use listener::EventListener;
pub use panel::SupervisorPanel;
pub use scripts::WebScriptLoader;

// Platform adapter for the devtools overlay (WASM/DOM)

pub(crate) fn host_error(err: JsValue) -> DevtoolsError {
    DevtoolsError::Host(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn to_js(err: DevtoolsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Page-wide devtools: supervisor, document listeners and the open panel.
#[wasm_bindgen]
pub struct DevtoolsRuntime {
    supervisor: Supervisor,
    host: Rc<WebHost>,
    adapter: Rc<DataAttributeAdapter>,
    listeners: Vec<EventListener>,
    panel: RefCell<Option<SupervisorPanel>>,
    _mirror: Subscription,
}

#[wasm_bindgen]
impl DevtoolsRuntime {
    /// `config` is an optional JSON document overriding `DevtoolsConfig` defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<DevtoolsRuntime, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let config = match config {
            Some(json) => DevtoolsConfig::from_json(&json).map_err(to_js)?,
            None => DevtoolsConfig::default(),
        };
        Self::with_config(config).map_err(to_js)
    }

    pub fn start(&self) {
        let name = self.supervisor.config().event_name("devtools-start");
        dispatch(self.host.document(), &name, &JsValue::NULL);
    }

    #[wasm_bindgen(js_name = openPanel)]
    pub fn open_panel(&self) -> Result<(), JsValue> {
        let panel = SupervisorPanel::open(self.host.document(), &self.supervisor).map_err(to_js)?;
        if let Some(previous) = self.panel.borrow_mut().replace(panel) {
            previous.close();
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = closePanel)]
    pub fn close_panel(&self) {
        if let Some(panel) = self.panel.borrow_mut().take() {
            panel.close();
        }
    }

    pub fn enable(&self, name: &str) {
        self.supervisor.enable_devtool(name);
    }

    pub fn disable(&self, name: &str) {
        self.supervisor.disable_devtool(name);
    }

    pub fn enabled(&self, name: &str) -> bool {
        self.supervisor.enabled(name)
    }

    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&self) -> String {
        self.supervisor.export_state()
    }

    /// Binds a toggle devtool to `trigger`. Drop the binding when the trigger
    /// leaves the document.
    #[wasm_bindgen(js_name = attachToggle)]
    pub fn attach_toggle(&self, trigger: Element) -> Result<ToggleBinding, JsValue> {
        let toggle = ToggleDevtool::new(
            self.host.clone(),
            self.adapter.clone(),
            &self.supervisor,
            trigger.clone(),
        );
        let weak: Weak<ToggleDevtool<WebHost>> = Rc::downgrade(&toggle);
        let hover = EventListener::new(&trigger, "mouseenter", move |_| {
            if let Some(toggle) = weak.upgrade() {
                toggle.show();
            }
        })
        .map_err(to_js)?;
        Ok(ToggleBinding {
            toggle,
            _hover: hover,
        })
    }
}

impl DevtoolsRuntime {
    pub fn with_config(config: DevtoolsConfig) -> nexa_devtools::Result<Self> {
        let host = Rc::new(WebHost::new(Rc::new(config.clone()))?);
        let document = host.document().clone();
        let supervisor = Supervisor::new(config, Rc::new(WebScriptLoader::new(document.clone())));
        register_toggle_devtool(&supervisor);
        install_supervisor(supervisor.clone());

        let config = supervisor.config();
        let mut listeners = Vec::new();

        let start = {
            let supervisor = supervisor.clone();
            EventListener::new(&document, &config.event_name("devtools-start"), move |_| {
                supervisor.start()
            })?
        };
        listeners.push(start);

        let click = {
            let supervisor = supervisor.clone();
            EventListener::new(&document, "click", move |event: Event| {
                let inside_tooltip = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest(TOOLTIP_TAG).ok().flatten())
                    .is_some();
                supervisor.dispatch_page_event(PageEvent::Click { inside_tooltip });
            })?
        };
        listeners.push(click);

        for name in &config.navigation_events {
            let supervisor = supervisor.clone();
            listeners.push(EventListener::new(&document, name, move |_| {
                supervisor.dispatch_page_event(PageEvent::Navigation)
            })?);
        }

        let mirror = {
            let document = document.clone();
            let config = config.clone();
            supervisor.observe(move |event: &DevtoolEvent| {
                let detail = js_sys::Object::new();
                let _ = js_sys::Reflect::set(&detail, &"name".into(), &event.name().into());
                dispatch(&document, &config.event_name(event.kind()), &detail);
            })
        };

        tracing::info!("Nexa devtools installed");
        Ok(Self {
            supervisor,
            host,
            adapter: Rc::new(DataAttributeAdapter),
            listeners,
            panel: RefCell::new(None),
            _mirror: mirror,
        })
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Keeps a trigger's toggle devtool and its hover listener alive.
#[wasm_bindgen]
pub struct ToggleBinding {
    toggle: Rc<ToggleDevtool<WebHost>>,
    _hover: EventListener,
}

#[wasm_bindgen]
impl ToggleBinding {
    pub fn show(&self) -> bool {
        matches!(self.toggle.show(), nexa_devtools::ShowOutcome::Shown(_))
    }

    pub fn hide(&self) {
        self.toggle.hide();
    }

    pub fn showing(&self) -> bool {
        self.toggle.state() == nexa_devtools::ToggleState::Showing
    }
}

impl ToggleBinding {
    pub fn toggle(&self) -> &Rc<ToggleDevtool<WebHost>> {
        &self.toggle
    }
}

fn dispatch(document: &Document, name: &str, detail: &JsValue) {
    let init = CustomEventInit::new();
    init.set_detail(detail);
    match CustomEvent::new_with_event_init_dict(name, &init) {
        Ok(event) => {
            let _ = document.dispatch_event(&event);
        }
        Err(err) => tracing::warn!("Failed to dispatch {}: {:?}", name, err),
    }
}
