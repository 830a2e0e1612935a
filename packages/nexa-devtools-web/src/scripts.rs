use std::cell::RefCell;
use std::rc::Rc;

use nexa_devtools::{DevtoolsError, Result, ScriptLoader};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlScriptElement};

use crate::host_error;

const DEPENDENCY_ATTR: &str = "data-nexa-devtools-dependency";

/// Loads the connector bundle by appending `<script>` tags, one after the other.
pub struct WebScriptLoader {
    document: Document,
}

impl WebScriptLoader {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl ScriptLoader for WebScriptLoader {
    fn load(&self, urls: &[String], done: Box<dyn FnOnce(Result<()>)>) {
        load_from(self.document.clone(), urls.into(), 0, done);
    }

    /// Removes the tags. The libraries' globals cannot be unloaded and stay behind.
    fn unload(&self, urls: &[String]) {
        for url in urls {
            if let Some(script) = existing_script(&self.document, url) {
                script.remove();
            }
        }
    }
}

fn existing_script(document: &Document, url: &str) -> Option<web_sys::Element> {
    let selector = format!("script[{DEPENDENCY_ATTR}][src=\"{url}\"]");
    document.query_selector(&selector).ok().flatten()
}

fn load_from(
    document: Document,
    urls: Rc<[String]>,
    index: usize,
    done: Box<dyn FnOnce(Result<()>)>,
) {
    let Some(url) = urls.get(index).cloned() else {
        done(Ok(()));
        return;
    };
    if existing_script(&document, &url).is_some() {
        load_from(document, urls, index + 1, done);
        return;
    }

    let script = match append_script(&document, &url) {
        Ok(script) => script,
        Err(err) => {
            done(Err(err));
            return;
        }
    };

    // Exactly one of onload/onerror fires; both closures share `done`.
    let done = Rc::new(RefCell::new(Some(done)));
    let on_load = {
        let done = done.clone();
        Closure::once_into_js(move || {
            if let Some(done) = done.borrow_mut().take() {
                load_from(document, urls, index + 1, done);
            }
        })
    };
    let on_error = {
        let script = script.clone();
        Closure::once_into_js(move || {
            script.remove();
            if let Some(done) = done.borrow_mut().take() {
                done(Err(DevtoolsError::DependencyLoad {
                    url,
                    reason: "script failed to load".to_string(),
                }));
            }
        })
    };
    script.set_onload(Some(on_load.unchecked_ref()));
    script.set_onerror(Some(on_error.unchecked_ref()));
}

fn append_script(document: &Document, url: &str) -> Result<HtmlScriptElement> {
    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(host_error)?
        .dyn_into()
        .map_err(|_| DevtoolsError::Host("created element is not a script".into()))?;
    script.set_src(url);
    script.set_attribute(DEPENDENCY_ATTR, "").map_err(host_error)?;
    let head = document
        .head()
        .map(HtmlElement::from)
        .or_else(|| document.body())
        .ok_or_else(|| DevtoolsError::Host("document has no head or body".into()))?;
    head.append_child(&script).map_err(host_error)?;
    Ok(script)
}
