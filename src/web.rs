//! Binds the snap navigator to the live page: input listeners, the frame
//! loop, resize debouncing, and typed change notifications.
//!
//! [`Navigator`] is a cheap, clonable handle. The composition root builds one
//! and hands clones to every component that needs to navigate.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, KeyboardEvent, TouchEvent, WheelEvent};
use yew::Callback;

use crate::config::SnapConfig;
use crate::checkpoint::Checkpoint;
use crate::dom::{is_text_entry, read_checkpoints, FrameLoop, Listener, PerformanceClock, WindowSurface};
use crate::input::{DeltaMode, NavKey, WheelInput};
use crate::navigator::{NavEvent, SnapNavigator};
use crate::NavError;

type DomNavigator = SnapNavigator<WindowSurface, PerformanceClock>;

/// A checkpoint named in a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRef {
    pub index: usize,
    pub id: String,
}

#[derive(Clone, Default)]
struct Subscribers {
    checkpoint_changed: Vec<Callback<CheckpointRef>>,
    transition_complete: Vec<Callback<CheckpointRef>>,
    any: Vec<Callback<NavEvent>>,
}

impl Subscribers {
    fn emit(&self, event: &NavEvent) {
        match event {
            NavEvent::CheckpointChanged { index, id } => {
                let r = CheckpointRef {
                    index: *index,
                    id: id.clone(),
                };
                self.checkpoint_changed.iter().for_each(|cb| cb.emit(r.clone()));
            }
            NavEvent::TransitionComplete { index, id } => {
                let r = CheckpointRef {
                    index: *index,
                    id: id.clone(),
                };
                self.transition_complete.iter().for_each(|cb| cb.emit(r.clone()));
            }
            _ => {}
        }
        self.any.iter().for_each(|cb| cb.emit(event.clone()));
    }
}

struct Wiring {
    _listeners: Vec<Listener>,
    frames: FrameLoop,
    resize_timer: Rc<RefCell<Option<Timeout>>>,
}

struct Inner {
    core: RefCell<DomNavigator>,
    subscribers: RefCell<Subscribers>,
    wiring: RefCell<Option<Wiring>>,
}

#[derive(Clone)]
pub struct Navigator {
    inner: Rc<Inner>,
}

impl Navigator {
    /// Measure the page, take over scrolling, and start listening for input.
    pub fn attach(config: SnapConfig) -> Result<Self, NavError> {
        let document = gloo_utils::document();
        let checkpoints = read_checkpoints(&document)?;
        let core = SnapNavigator::new(
            config,
            WindowSurface::new(),
            PerformanceClock::new(),
            checkpoints,
        );
        let nav = Navigator {
            inner: Rc::new(Inner {
                core: RefCell::new(core),
                subscribers: RefCell::new(Subscribers::default()),
                wiring: RefCell::new(None),
            }),
        };
        let wiring = nav.wire()?;
        *nav.inner.wiring.borrow_mut() = Some(wiring);
        nav.dispatch();
        Ok(nav)
    }

    fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    fn wire(&self) -> Result<Wiring, NavError> {
        let document: web_sys::EventTarget = gloo_utils::document().into();
        let window: web_sys::EventTarget = gloo_utils::window().into();
        let resize_timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
        let debounce_ms = self.inner.core.borrow().config().resize_debounce_ms;

        let listeners = vec![
            Listener::new(&document, "wheel", false, false, self.handler(Self::on_wheel))?,
            Listener::new(&document, "keydown", false, false, self.handler(Self::on_key))?,
            Listener::new(&document, "touchstart", false, false, self.handler(Self::on_touch_start))?,
            Listener::new(&document, "touchmove", false, false, self.handler(Self::on_touch_move))?,
            Listener::new(&document, "touchend", false, false, self.handler(Self::on_touch_end))?,
            Listener::new(&document, "scroll", false, true, self.handler(Self::on_scroll))?,
            {
                let weak = self.downgrade();
                let timer = resize_timer.clone();
                Listener::passive(&window, "resize", move |_| {
                    let weak = weak.clone();
                    // replacing the pending timeout cancels it
                    *timer.borrow_mut() = Some(Timeout::new(debounce_ms, move || {
                        if let Some(inner) = weak.upgrade() {
                            Navigator { inner }.refresh();
                        }
                    }));
                })?
            },
        ];

        let weak = self.downgrade();
        let frames = FrameLoop::start(move |timestamp| {
            match weak.upgrade() {
                Some(inner) => {
                    Navigator { inner }.tick(timestamp);
                    true
                }
                None => false,
            }
        })?;

        Ok(Wiring {
            _listeners: listeners,
            frames,
            resize_timer,
        })
    }

    fn handler(&self, f: fn(&Navigator, &Event)) -> impl FnMut(Event) + 'static {
        let weak = self.downgrade();
        move |event: Event| {
            if let Some(inner) = weak.upgrade() {
                f(&Navigator { inner }, &event);
            }
        }
    }

    // ── public entry points ──────────────────────────────────────────────

    /// Jump to a named checkpoint. Unknown ids, requests made while a
    /// transition runs, and calls made from inside the navigator's own
    /// handlers are logged and ignored.
    pub fn navigate_to(&self, id: &str) {
        let result = match self.inner.core.try_borrow_mut() {
            Ok(mut core) => core.navigate_to(id),
            Err(_) => Err(NavError::Busy),
        };
        if let Err(e) = result {
            debug!("Navigator: navigate_to(\"{}\") ignored: {}", id, e);
        }
        self.dispatch();
    }

    /// Re-measure checkpoints after the layout changed.
    pub fn refresh(&self) {
        let checkpoints = match read_checkpoints(&gloo_utils::document()) {
            Ok(c) => c,
            Err(e) => {
                error!("Navigator: failed to read checkpoints: {}", e);
                return;
            }
        };
        if let Ok(mut core) = self.inner.core.try_borrow_mut() {
            core.refresh(checkpoints);
        }
        self.dispatch();
    }

    /// Remove every listener, stop the frame loop and hand scrolling back
    /// to the browser.
    pub fn destroy(&self) {
        if let Some(wiring) = self.inner.wiring.borrow_mut().take() {
            wiring.frames.cancel();
            wiring.resize_timer.borrow_mut().take();
        }
        if let Ok(mut core) = self.inner.core.try_borrow_mut() {
            core.destroy();
        }
        *self.inner.subscribers.borrow_mut() = Subscribers::default();
    }

    pub fn current_checkpoint(&self) -> Option<CheckpointRef> {
        let core = self.inner.core.try_borrow().ok()?;
        let index = core.current_index();
        let current = core.current_checkpoint().map(|cp| CheckpointRef {
            index,
            id: cp.id.clone(),
        });
        current
    }

    /// The checkpoints as last measured, in navigation order.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.inner
            .core
            .try_borrow()
            .map(|core| core.checkpoints().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_animating(&self) -> bool {
        self.inner
            .core
            .try_borrow()
            .map(|core| core.is_animating())
            .unwrap_or(true)
    }

    pub fn on_checkpoint_changed(&self, cb: Callback<CheckpointRef>) {
        self.inner.subscribers.borrow_mut().checkpoint_changed.push(cb);
    }

    pub fn on_transition_complete(&self, cb: Callback<CheckpointRef>) {
        self.inner.subscribers.borrow_mut().transition_complete.push(cb);
    }

    pub fn on_event(&self, cb: Callback<NavEvent>) {
        self.inner.subscribers.borrow_mut().any.push(cb);
    }

    // ── internals ────────────────────────────────────────────────────────

    /// Deliver queued events once the core is no longer borrowed, so
    /// subscribers may call straight back into the navigator.
    fn dispatch(&self) {
        let events = match self.inner.core.try_borrow_mut() {
            Ok(mut core) => core.drain_events(),
            Err(_) => return,
        };
        if events.is_empty() {
            return;
        }
        let subscribers = self.inner.subscribers.borrow().clone();
        for event in &events {
            subscribers.emit(event);
        }
    }

    fn tick(&self, timestamp: f64) {
        if let Ok(mut core) = self.inner.core.try_borrow_mut() {
            core.tick(timestamp);
        }
        self.dispatch();
    }

    fn with_core(&self, f: impl FnOnce(&mut DomNavigator) -> bool) -> bool {
        let handled = match self.inner.core.try_borrow_mut() {
            Ok(mut core) => f(&mut core),
            Err(_) => false,
        };
        self.dispatch();
        handled
    }

    fn on_wheel(&self, event: &Event) {
        let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        let input = WheelInput {
            delta_x: wheel.delta_x(),
            delta_y: wheel.delta_y(),
            mode: DeltaMode::from_dom(wheel.delta_mode()),
        };
        if self.with_core(|core| core.handle_wheel(input)) {
            event.prevent_default();
            event.stop_propagation();
        }
    }

    fn on_key(&self, event: &Event) {
        if is_text_entry(event.target().as_ref()) {
            return;
        }
        let Some(key) = event
            .dyn_ref::<KeyboardEvent>()
            .and_then(|k| NavKey::from_key(&k.key()))
        else {
            return;
        };
        if self.with_core(|core| core.handle_key(key)) {
            event.prevent_default();
        }
    }

    fn on_touch_start(&self, event: &Event) {
        if let Some((touches, y)) = first_touch(event) {
            self.with_core(|core| {
                core.touch_start(touches, y);
                false
            });
        }
    }

    fn on_touch_move(&self, event: &Event) {
        if let Some((touches, y)) = first_touch(event) {
            self.with_core(|core| {
                core.touch_move(touches, y);
                false
            });
        }
    }

    fn on_touch_end(&self, event: &Event) {
        if self.with_core(|core| core.touch_end()) {
            event.prevent_default();
        }
    }

    /// Swallow scroll events caused by our own positioning.
    fn on_scroll(&self, event: &Event) {
        if self.is_animating() {
            event.prevent_default();
            event.stop_immediate_propagation();
        }
    }
}

fn first_touch(event: &Event) -> Option<(u32, f64)> {
    let touches = event.dyn_ref::<TouchEvent>()?.touches();
    let count = touches.length();
    let y = touches.get(0).map(|t| t.client_y() as f64).unwrap_or(0.0);
    Some((count, y))
}

/// JS-facing wrapper around [`Navigator`].
#[wasm_bindgen]
pub struct SnapScroll {
    nav: Navigator,
}

#[wasm_bindgen]
impl SnapScroll {
    /// Take over page scrolling. Pass an object overriding any tunable, or
    /// undefined/null for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SnapScroll, JsError> {
        let cfg: SnapConfig = if config.is_undefined() || config.is_null() {
            SnapConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let nav = Navigator::attach(cfg).map_err(|e| JsError::new(&e.to_string()))?;
        info!("SnapScroll: attached");
        Ok(SnapScroll { nav })
    }

    #[wasm_bindgen(js_name = navigateTo)]
    pub fn navigate_to(&self, checkpoint_id: &str) {
        self.nav.navigate_to(checkpoint_id);
    }

    pub fn refresh(&self) {
        self.nav.refresh();
    }

    pub fn destroy(&self) {
        self.nav.destroy();
    }

    #[wasm_bindgen(getter, js_name = currentCheckpoint)]
    pub fn current_checkpoint(&self) -> Option<String> {
        self.nav.current_checkpoint().map(|c| c.id)
    }
}
