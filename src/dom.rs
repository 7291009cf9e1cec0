//! Browser-backed seams for the navigator and small DOM helpers shared by
//! the page components.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, Window,
};

use crate::checkpoint::Checkpoint;
use crate::config::{CHECKPOINT_ATTR, CHECKPOINT_SELECTOR, SPEED_ATTR};
use crate::navigator::{Clock, ScrollSurface};
use crate::utils::parse_duration_attr;
use crate::NavError;

/// The window's vertical scroll position.
pub struct WindowSurface {
    window: Window,
    root: Option<HtmlElement>,
}

impl WindowSurface {
    pub fn new() -> Self {
        let root = gloo_utils::document().document_element().and_then(|el| el.dyn_into().ok());
        Self {
            window: gloo_utils::window(),
            root,
        }
    }
}

impl Default for WindowSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollSurface for WindowSurface {
    fn scroll_offset(&self) -> f64 {
        self.window.page_y_offset().unwrap_or(0.0)
    }

    fn scroll_to(&mut self, offset: f64) {
        self.window.scroll_to_with_x_and_y(0.0, offset);
    }

    fn set_native_scrolling(&mut self, enabled: bool) {
        let Some(root) = &self.root else {
            warn!("WindowSurface: no root element to style");
            return;
        };
        let style = root.style();
        let result = if enabled {
            style
                .remove_property("scroll-snap-type")
                .and_then(|_| style.remove_property("scroll-behavior"))
                .map(|_| ())
        } else {
            style
                .set_property("scroll-snap-type", "none")
                .and_then(|_| style.set_property("scroll-behavior", "auto"))
        };
        if let Err(e) = result {
            warn!("WindowSurface: failed to update scroll styling: {:?}", e);
        }
    }
}

/// `performance.now()`, falling back to wall time.
#[derive(Clone)]
pub struct PerformanceClock {
    performance: Option<web_sys::Performance>,
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self {
            performance: gloo_utils::window().performance(),
        }
    }
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for PerformanceClock {
    fn now(&self) -> f64 {
        match &self.performance {
            Some(p) => p.now(),
            None => js_sys::Date::now(),
        }
    }
}

/// Measure every tagged section on the page.
pub fn read_checkpoints(document: &Document) -> Result<Vec<Checkpoint>, NavError> {
    let scroll_y = gloo_utils::window().page_y_offset().unwrap_or(0.0);
    let mut out = Vec::new();
    for el in query_all(document, CHECKPOINT_SELECTOR)? {
        let Some(id) = el.get_attribute(CHECKPOINT_ATTR) else {
            warn!("read_checkpoints: section without {} skipped", CHECKPOINT_ATTR);
            continue;
        };
        let rect = el.get_bounding_client_rect();
        out.push(Checkpoint {
            id,
            anchor_offset: (rect.top() + scroll_y).round(),
            animation_duration_ms: parse_duration_attr(el.get_attribute(SPEED_ATTR).as_deref()),
        });
    }
    Ok(out)
}

pub fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, NavError> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, NavError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| NavError::MissingElement(format!("#{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| NavError::MissingElement(format!("#{} has an unexpected type", id)))
}

pub fn query_one<T: JsCast>(document: &Document, selector: &str) -> Result<T, NavError> {
    document
        .query_selector(selector)?
        .ok_or_else(|| NavError::MissingElement(selector.to_string()))?
        .dyn_into::<T>()
        .map_err(|_| NavError::MissingElement(format!("{} has an unexpected type", selector)))
}

/// Whether keys pressed on `target` belong to a form field or editable text.
pub fn is_text_entry(target: Option<&EventTarget>) -> bool {
    let Some(target) = target else {
        return false;
    };
    target.is_instance_of::<HtmlInputElement>()
        || target.is_instance_of::<HtmlTextAreaElement>()
        || target.is_instance_of::<HtmlSelectElement>()
        || target
            .dyn_ref::<HtmlElement>()
            .map(|el| el.is_content_editable())
            .unwrap_or(false)
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        warn!("set_style {}: {:?}", property, e);
    }
}

/// An event listener removed from its target when dropped.
pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        capture: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, NavError> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        options.set_capture(capture);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture,
            callback,
        })
    }

    /// Passive, bubbling listener.
    pub fn passive(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, NavError> {
        Self::new(target, kind, true, false, handler)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A `requestAnimationFrame` loop. The frame callback returns whether to
/// keep going; the loop also stops when cancelled or dropped.
pub struct FrameLoop {
    handle: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

impl FrameLoop {
    pub fn start(mut on_frame: impl FnMut(f64) -> bool + 'static) -> Result<Self, NavError> {
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        let next = callback.clone();
        let next_handle = handle.clone();
        *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
            if !on_frame(timestamp) {
                next_handle.set(None);
                return;
            }
            if let Some(cb) = next.borrow().as_ref() {
                match request_frame(cb) {
                    Ok(id) => next_handle.set(Some(id)),
                    Err(e) => {
                        warn!("FrameLoop: animation frame request failed: {}", e);
                        next_handle.set(None);
                    }
                }
            }
        }));

        let first = match callback.borrow().as_ref() {
            Some(cb) => request_frame(cb)?,
            None => return Err(NavError::Dom("frame callback missing".into())),
        };
        handle.set(Some(first));
        Ok(Self { handle, callback })
    }

    pub fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            let _ = gloo_utils::window().cancel_animation_frame(id);
        }
        // breaks the closure's reference to itself
        if let Ok(mut cb) = self.callback.try_borrow_mut() {
            cb.take();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn request_frame(cb: &Closure<dyn FnMut(f64)>) -> Result<i32, NavError> {
    Ok(gloo_utils::window().request_animation_frame(cb.as_ref().unchecked_ref())?)
}
