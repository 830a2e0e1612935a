use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::config::DevtoolsConfig;
use crate::loader::{DependencyLoader, ScriptLoader};

new_key_type! {
    pub struct DevtoolKey;
    pub struct ObserverKey;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DevtoolEvent {
    DevtoolEnable { name: String },
    DevtoolDisable { name: String },
}

impl DevtoolEvent {
    pub fn name(&self) -> &str {
        match self {
            DevtoolEvent::DevtoolEnable { name } | DevtoolEvent::DevtoolDisable { name } => name,
        }
    }

    /// DOM event suffix, e.g. `devtool-enable`.
    pub fn kind(&self) -> &'static str {
        match self {
            DevtoolEvent::DevtoolEnable { .. } => "devtool-enable",
            DevtoolEvent::DevtoolDisable { .. } => "devtool-disable",
        }
    }

    pub fn is_enable(&self) -> bool {
        matches!(self, DevtoolEvent::DevtoolEnable { .. })
    }
}

/// Page-level happenings that may dismiss an open visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Click { inside_tooltip: bool },
    Navigation,
}

/// A devtool instance as seen by the supervisor.
pub trait Devtool {
    fn name(&self) -> &str;
    fn enabled_changed(&self, enabled: bool);
    fn page_event(&self, event: PageEvent);
    fn hide(&self);
    fn is_showing(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorSnapshot {
    pub registrations: BTreeMap<String, String>,
    pub enabled: Vec<String>,
}

type StartHook = Rc<dyn Fn(&Supervisor)>;
type Observer = Rc<dyn Fn(&DevtoolEvent)>;

struct SupervisorInner {
    registrations: FxHashMap<String, String>,
    enabled_names: FxHashSet<String>,
    devtools: SlotMap<DevtoolKey, (String, Weak<dyn Devtool>)>,
    observers: SlotMap<ObserverKey, Observer>,
    start_hooks: Vec<StartHook>,
    started: bool,
}

/// Registry of devtools and the set currently enabled.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct Supervisor {
    inner: Rc<RefCell<SupervisorInner>>,
    loader: DependencyLoader,
    config: Rc<DevtoolsConfig>,
}

impl Supervisor {
    pub fn new(config: DevtoolsConfig, scripts: Rc<dyn ScriptLoader>) -> Self {
        let loader = DependencyLoader::new(scripts, config.library_urls.clone());
        Self {
            inner: Rc::new(RefCell::new(SupervisorInner {
                registrations: FxHashMap::default(),
                enabled_names: FxHashSet::default(),
                devtools: SlotMap::with_key(),
                observers: SlotMap::with_key(),
                start_hooks: Vec::new(),
                started: false,
            })),
            loader,
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> Rc<DevtoolsConfig> {
        self.config.clone()
    }

    pub fn loader(&self) -> &DependencyLoader {
        &self.loader
    }

    pub fn register(&self, name: &str, description: &str) {
        tracing::info!("Registering devtool '{}'", name);
        self.inner
            .borrow_mut()
            .registrations
            .insert(name.to_string(), description.to_string());
    }

    pub fn registrations(&self) -> BTreeMap<String, String> {
        self.inner
            .borrow()
            .registrations
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn enabled(&self, name: &str) -> bool {
        self.inner.borrow().enabled_names.contains(name)
    }

    pub fn enable_devtool(&self, name: &str) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.enabled_names.insert(name.to_string()) {
                return;
            }
            if !inner.registrations.contains_key(name) {
                tracing::debug!("Enabling unregistered devtool '{}'", name);
            }
        }

        tracing::info!("Devtool '{}' enabled", name);
        self.loader.add_leader_line_dependency();
        self.notify(DevtoolEvent::DevtoolEnable {
            name: name.to_string(),
        });
    }

    pub fn disable_devtool(&self, name: &str) {
        if !self.inner.borrow_mut().enabled_names.remove(name) {
            return;
        }

        tracing::info!("Devtool '{}' disabled", name);
        // Instances hide (and unpin) before the dependency is released.
        self.notify(DevtoolEvent::DevtoolDisable {
            name: name.to_string(),
        });
        self.loader.remove_leader_line_dependency();
    }

    /// Queues a registration hook to run on `start`, or runs it now if the
    /// supervisor already started.
    pub fn on_start(&self, hook: impl Fn(&Supervisor) + 'static) {
        let hook: StartHook = Rc::new(hook);
        let run_now = {
            let mut inner = self.inner.borrow_mut();
            inner.start_hooks.push(hook.clone());
            inner.started
        };
        if run_now {
            hook(self);
        }
    }

    /// The `devtools-start` moment. Runs registration hooks once.
    pub fn start(&self) {
        let hooks = {
            let mut inner = self.inner.borrow_mut();
            if inner.started {
                return;
            }
            inner.started = true;
            inner.start_hooks.clone()
        };
        for hook in hooks {
            hook(self);
        }
    }

    pub fn subscribe(&self, name: &str, devtool: Weak<dyn Devtool>) -> Subscription {
        let key = self
            .inner
            .borrow_mut()
            .devtools
            .insert((name.to_string(), devtool));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            key: SubscriptionKey::Devtool(key),
        }
    }

    /// Observes every enable/disable notification regardless of name.
    pub fn observe(&self, observer: impl Fn(&DevtoolEvent) + 'static) -> Subscription {
        let key = self.inner.borrow_mut().observers.insert(Rc::new(observer));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            key: SubscriptionKey::Observer(key),
        }
    }

    /// Whether any live instance of `name` currently has a visualization up.
    pub fn showing(&self, name: &str) -> bool {
        self.devtools_named(name, None)
            .iter()
            .any(|devtool| devtool.is_showing())
    }

    /// Hides every showing instance of `name` except `keep`.
    pub fn hide_others(&self, name: &str, keep: Option<DevtoolKey>) {
        for devtool in self.devtools_named(name, keep) {
            if devtool.is_showing() {
                devtool.hide();
            }
        }
    }

    pub fn dispatch_page_event(&self, event: PageEvent) {
        for devtool in self.live_devtools() {
            devtool.page_event(event);
        }
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        let inner = self.inner.borrow();
        let mut enabled: Vec<String> = inner.enabled_names.iter().cloned().collect();
        enabled.sort();
        SupervisorSnapshot {
            registrations: inner
                .registrations
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            enabled,
        }
    }

    pub fn export_state(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }

    fn notify(&self, event: DevtoolEvent) {
        let (devtools, observers) = {
            let inner = self.inner.borrow();
            let observers: Vec<Observer> = inner.observers.values().cloned().collect();
            (collect(&inner, Some(event.name()), None), observers)
        };

        for devtool in devtools {
            devtool.enabled_changed(event.is_enable());
        }
        for observer in observers {
            observer(&event);
        }
    }

    fn devtools_named(&self, name: &str, skip: Option<DevtoolKey>) -> Vec<Rc<dyn Devtool>> {
        let inner = self.inner.borrow();
        collect(&inner, Some(name), skip)
    }

    fn live_devtools(&self) -> Vec<Rc<dyn Devtool>> {
        let inner = self.inner.borrow();
        collect(&inner, None, None)
    }
}

fn collect(
    inner: &SupervisorInner,
    name: Option<&str>,
    skip: Option<DevtoolKey>,
) -> Vec<Rc<dyn Devtool>> {
    inner
        .devtools
        .iter()
        .filter(|(key, (devtool_name, _))| {
            Some(*key) != skip && name.is_none_or(|n| n == devtool_name)
        })
        .filter_map(|(_, (_, devtool))| devtool.upgrade())
        .collect()
}

enum SubscriptionKey {
    Devtool(DevtoolKey),
    Observer(ObserverKey),
}

/// Removes its registration from the supervisor when dropped.
pub struct Subscription {
    inner: Weak<RefCell<SupervisorInner>>,
    key: SubscriptionKey,
}

impl Subscription {
    pub fn devtool_key(&self) -> Option<DevtoolKey> {
        match self.key {
            SubscriptionKey::Devtool(key) => Some(key),
            SubscriptionKey::Observer(_) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let Ok(mut registry) = inner.try_borrow_mut() else {
            tracing::warn!("Supervisor busy; subscription could not be removed");
            return;
        };
        // Dropped after the borrow ends: an observer may own subscriptions too.
        let removed = match self.key {
            SubscriptionKey::Devtool(key) => {
                registry.devtools.remove(key);
                None
            }
            SubscriptionKey::Observer(key) => registry.observers.remove(key),
        };
        drop(registry);
        drop(removed);
    }
}
