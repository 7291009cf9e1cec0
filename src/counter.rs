//! Count-up numbers that animate when fully scrolled into view.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::config::{COUNTER_SELECTOR, DEFAULT_COUNTER_MS, SPEED_ATTR};
use crate::dom::{query_all, FrameLoop};
use crate::easing::ease_out_quart;
use crate::utils::{parse_duration_attr, parse_leading_int};
use crate::NavError;

/// Progress of a single counter from 0 to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct CountUp {
    target: i64,
    duration_ms: f64,
    value: i64,
    running: bool,
    started_at: Option<f64>,
}

impl CountUp {
    pub fn new(target: i64, duration_ms: f64) -> Self {
        Self {
            target,
            duration_ms,
            value: 0,
            running: false,
            started_at: None,
        }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Restart from zero. The first [`step`](Self::step) fixes the start time.
    pub fn start(&mut self) {
        self.value = 0;
        self.running = true;
        self.started_at = None;
    }

    /// Advance to `now`. Returns whether more frames are needed.
    pub fn step(&mut self, now: f64) -> bool {
        if !self.running {
            return false;
        }
        let started = *self.started_at.get_or_insert(now);
        let progress = if self.duration_ms > 0.0 {
            ((now - started) / self.duration_ms).min(1.0)
        } else {
            1.0
        };
        if progress >= 1.0 {
            self.value = self.target;
            self.running = false;
            self.started_at = None;
            return false;
        }
        self.value = (ease_out_quart(progress) * self.target as f64).round() as i64;
        true
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.running = false;
        self.started_at = None;
    }
}

struct CounterSlot {
    element: Element,
    count: CountUp,
    frames: Option<FrameLoop>,
}

type Slot = Rc<RefCell<CounterSlot>>;

/// Every `.counter` on the page, observed for full visibility.
pub struct Counters {
    slots: Vec<Slot>,
    observer: IntersectionObserver,
    _on_intersect: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl Counters {
    pub fn attach(document: &Document) -> Result<Self, NavError> {
        let mut slots = Vec::new();
        for element in query_all(document, COUNTER_SELECTOR)? {
            let text = element.text_content().unwrap_or_default();
            let Some(target) = parse_leading_int(&text) else {
                warn!("Counters: \"{}\" is not a number, skipped", text.trim());
                continue;
            };
            let duration = parse_duration_attr(element.get_attribute(SPEED_ATTR).as_deref())
                .unwrap_or(DEFAULT_COUNTER_MS);
            element.set_text_content(Some("0"));
            slots.push(Rc::new(RefCell::new(CounterSlot {
                element,
                count: CountUp::new(target, duration),
                frames: None,
            })));
        }

        let for_cb = slots.clone();
        let on_intersect = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let target = entry.target();
                    let Some(slot) = for_cb.iter().find(|s| s.borrow().element == target) else {
                        continue;
                    };
                    if entry.is_intersecting() {
                        start_counter(slot);
                    } else {
                        reset_counter(slot);
                    }
                }
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(1.0));
        let observer =
            IntersectionObserver::new_with_options(on_intersect.as_ref().unchecked_ref(), &options)?;
        for slot in &slots {
            observer.observe(&slot.borrow().element);
        }
        debug!("Counters: observing {} counters", slots.len());

        Ok(Self {
            slots,
            observer,
            _on_intersect: on_intersect,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Drop for Counters {
    fn drop(&mut self) {
        self.observer.disconnect();
        for slot in &self.slots {
            if let Ok(mut s) = slot.try_borrow_mut() {
                s.frames = None;
            }
        }
    }
}

fn start_counter(slot: &Slot) {
    let mut guard = slot.borrow_mut();
    let s = &mut *guard;
    if s.count.is_running() {
        return;
    }
    s.count.start();
    let weak: Weak<RefCell<CounterSlot>> = Rc::downgrade(slot);
    match FrameLoop::start(move |now| {
        let Some(slot) = weak.upgrade() else {
            return false;
        };
        let mut guard = slot.borrow_mut();
        let s = &mut *guard;
        let more = s.count.step(now);
        s.element.set_text_content(Some(&s.count.value().to_string()));
        more
    }) {
        Ok(frames) => s.frames = Some(frames),
        Err(e) => {
            warn!("Counters: could not start animation: {}", e);
            s.count.reset();
        }
    }
}

fn reset_counter(slot: &Slot) {
    let mut guard = slot.borrow_mut();
    let s = &mut *guard;
    s.frames = None;
    s.count.reset();
    s.element.set_text_content(Some("0"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_with_ease_out() {
        let mut c = CountUp::new(100, 2000.0);
        c.start();
        assert!(c.step(1000.0));
        assert_eq!(c.value(), 0);
        // halfway: 1 - 0.5^4 = 0.9375
        assert!(c.step(2000.0));
        assert_eq!(c.value(), 94);
    }

    #[test]
    fn finishing_lands_on_target() {
        let mut c = CountUp::new(37, 500.0);
        c.start();
        c.step(0.0);
        assert!(!c.step(510.0));
        assert_eq!(c.value(), 37);
        assert!(!c.is_running());
        assert!(!c.step(600.0));
    }

    #[test]
    fn reset_goes_back_to_zero() {
        let mut c = CountUp::new(10, 100.0);
        c.start();
        c.step(0.0);
        c.step(50.0);
        c.reset();
        assert_eq!(c.value(), 0);
        assert!(!c.is_running());
    }

    #[test]
    fn restart_after_finish() {
        let mut c = CountUp::new(5, 100.0);
        c.start();
        c.step(0.0);
        c.step(200.0);
        c.start();
        assert_eq!(c.value(), 0);
        assert!(c.step(1000.0));
        assert!(!c.step(1100.0));
        assert_eq!(c.value(), 5);
    }
}
