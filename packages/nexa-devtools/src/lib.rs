pub mod config;
pub mod diagnostics;
pub mod error;
pub mod highlight;
pub mod host;
pub mod loader;
pub mod supervisor;
pub mod toggle;

pub use config::{DevtoolsConfig, Exclusivity, ViewOrder};
pub use diagnostics::{DiagnosticRow, DiagnosticTable, Status};
pub use error::{DevtoolsError, Result};
pub use highlight::{HighlightLayer, HighlightLayers};
pub use host::{
    ConnectorLine, DragHandle, FrameworkAdapter, NodeDescription, OverlayHost, OwnerId, Rect,
    RenderingInfo, TooltipKind, TooltipSpec,
};
pub use loader::{DependencyLoader, LoadState, ScriptLoader};
pub use supervisor::{Devtool, DevtoolEvent, PageEvent, Subscription, Supervisor};
pub use toggle::{ShowOutcome, TOGGLE_DEVTOOL, ToggleDevtool, ToggleState, register_toggle_devtool};

use std::cell::RefCell;

thread_local! {
    static SUPERVISOR: RefCell<Option<Supervisor>> = const { RefCell::new(None) };
}

/// Installs the page-wide supervisor. Later calls replace it.
pub fn install_supervisor(supervisor: Supervisor) {
    SUPERVISOR.with(|s| *s.borrow_mut() = Some(supervisor));
}

/// The page-wide supervisor, if one was installed on this thread.
pub fn supervisor() -> Option<Supervisor> {
    SUPERVISOR.with(|s| s.borrow().clone())
}
