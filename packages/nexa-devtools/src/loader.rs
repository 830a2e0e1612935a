//! Reference-counted lazy loading of the connector-line/drag library bundle.
//!
//! The bundle is fetched on the first `add_leader_line_dependency` and released
//! when the last holder lets go. Showing devtools additionally pin the bundle
//! so an unload requested mid-visualization is deferred until they hide.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::error::{DevtoolsError, Result};

/// Platform side of the loader. `done` may be invoked synchronously.
pub trait ScriptLoader {
    fn load(&self, urls: &[String], done: Box<dyn FnOnce(Result<()>)>);

    /// Platforms that cannot unload scripts may treat this as a no-op.
    fn unload(&self, urls: &[String]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

struct LoaderInner {
    state: LoadState,
    holders: usize,
    /// Releases still owed by holders whose load attempt failed.
    stale_releases: usize,
    pins: usize,
    unload_pending: bool,
    generation: u64,
    waiters: Vec<oneshot::Sender<Result<()>>>,
    last_error: Option<DevtoolsError>,
}

#[derive(Clone)]
pub struct DependencyLoader {
    inner: Rc<RefCell<LoaderInner>>,
    scripts: Rc<dyn ScriptLoader>,
    urls: Rc<[String]>,
}

impl DependencyLoader {
    pub fn new(scripts: Rc<dyn ScriptLoader>, urls: Vec<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LoaderInner {
                state: LoadState::Unloaded,
                holders: 0,
                stale_releases: 0,
                pins: 0,
                unload_pending: false,
                generation: 0,
                waiters: Vec::new(),
                last_error: None,
            })),
            scripts,
            urls: urls.into(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.inner.borrow().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LoadState::Ready
    }

    pub fn holders(&self) -> usize {
        self.inner.borrow().holders
    }

    pub fn last_error(&self) -> Option<DevtoolsError> {
        self.inner.borrow().last_error.clone()
    }

    pub fn add_leader_line_dependency(&self) {
        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.holders += 1;
            if inner.holders > 1 {
                return;
            }
            inner.unload_pending = false;
            match inner.state {
                LoadState::Loading | LoadState::Ready => return,
                LoadState::Unloaded | LoadState::Failed => {
                    inner.state = LoadState::Loading;
                    inner.generation += 1;
                    inner.generation
                }
            }
        };

        tracing::info!("Loading connector dependency ({} scripts)", self.urls.len());
        let loader = self.clone();
        self.scripts
            .load(&self.urls, Box::new(move |result| loader.finish(generation, result)));
    }

    pub fn remove_leader_line_dependency(&self) {
        let unload = {
            let mut inner = self.inner.borrow_mut();
            if inner.stale_releases > 0 {
                inner.stale_releases -= 1;
                return;
            }
            if inner.holders == 0 {
                tracing::debug!("Connector dependency released with no holders");
                return;
            }
            inner.holders -= 1;
            if inner.holders > 0 {
                return;
            }
            if inner.pins > 0 {
                tracing::debug!("Deferring connector unload until {} visualizations hide", inner.pins);
                inner.unload_pending = true;
                false
            } else {
                true
            }
        };

        if unload {
            self.unload();
        }
    }

    /// Resolves once the bundle is usable, or with the load error.
    pub fn ready(&self) -> impl Future<Output = Result<()>> + 'static {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                LoadState::Loading => inner.waiters.push(tx),
                LoadState::Ready => {
                    let _ = tx.send(Ok(()));
                }
                LoadState::Failed => {
                    let err = inner
                        .last_error
                        .clone()
                        .unwrap_or(DevtoolsError::DependencyUnavailable);
                    let _ = tx.send(Err(err));
                }
                LoadState::Unloaded => {
                    let _ = tx.send(Err(DevtoolsError::DependencyUnavailable));
                }
            }
        }
        async move { rx.await.unwrap_or(Err(DevtoolsError::DependencyUnavailable)) }
    }

    /// Keeps the bundle loaded while the returned guard lives.
    pub fn pin(&self) -> DependencyPin {
        self.inner.borrow_mut().pins += 1;
        DependencyPin {
            loader: self.clone(),
        }
    }

    fn unpin(&self) {
        let unload = {
            let mut inner = self.inner.borrow_mut();
            inner.pins = inner.pins.saturating_sub(1);
            let drained = inner.pins == 0 && inner.holders == 0 && inner.unload_pending;
            if drained {
                inner.unload_pending = false;
            }
            drained
        };

        if unload {
            self.unload();
        }
    }

    fn finish(&self, generation: u64, result: Result<()>) {
        let (waiters, unload) = {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != generation || inner.state != LoadState::Loading {
                return;
            }
            match &result {
                Ok(()) => {
                    tracing::info!("Connector dependency ready");
                    inner.state = LoadState::Ready;
                    inner.last_error = None;
                }
                Err(err) => {
                    tracing::error!("Connector dependency failed to load: {}", err);
                    inner.state = LoadState::Failed;
                    inner.last_error = Some(err.clone());
                    inner.stale_releases += inner.holders;
                    inner.holders = 0;
                    inner.unload_pending = false;
                }
            }
            let unload = result.is_ok() && inner.holders == 0 && inner.pins == 0;
            (std::mem::take(&mut inner.waiters), unload)
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }

        if unload {
            self.unload();
        }
    }

    fn unload(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            // A load still in flight is unloaded by `finish` once it lands.
            if inner.state != LoadState::Ready {
                return;
            }
            inner.state = LoadState::Unloaded;
        }
        tracing::info!("Unloading connector dependency");
        self.scripts.unload(&self.urls);
    }
}

pub struct DependencyPin {
    loader: DependencyLoader,
}

impl Drop for DependencyPin {
    fn drop(&mut self) {
        self.loader.unpin();
    }
}
