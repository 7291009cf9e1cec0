//! Loading screen: tracks page images, eases a percentage toward the real
//! progress, then slides the overlay away.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement};

use crate::config::{
    ACCEPT_MOBILE_ID, LOADING_COUNTER_SELECTOR, LOADING_MAX_RETRIES, LOADING_MAX_WAIT_MS,
    LOADING_MIN_INCREMENT, LOADING_PAGE_ID, LOADING_RETRY_BASE_MS, MOBILE_WARNING_ID,
    MOBILE_WIDTH_CUTOFF, NORMAL_LOADING_ID,
};
use crate::dom::{element_by_id, query_all, query_one, set_style, FrameLoop, Listener};
use crate::utils::is_mobile;
use crate::NavError;

const SETTLE_DELAY_MS: u32 = 500;
const SLIDE_DELAY_MS: u32 = 300;
const SLIDE_DURATION_MS: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceState {
    Pending { attempts: u32 },
    Loaded,
    Failed,
}

/// What to do after a resource failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorOutcome {
    Retry { attempt: u32, delay_ms: u32 },
    GaveUp,
}

/// Bookkeeping for the loading screen, independent of the DOM.
#[derive(Debug, Clone)]
pub struct LoadingProgress {
    resources: Vec<(String, ResourceState)>,
    max_retries: u32,
    retry_base_ms: u32,
    displayed: f64,
    page_loaded: bool,
    complete: bool,
}

impl Default for LoadingProgress {
    fn default() -> Self {
        Self::new(LOADING_MAX_RETRIES, LOADING_RETRY_BASE_MS)
    }
}

impl LoadingProgress {
    pub fn new(max_retries: u32, retry_base_ms: u32) -> Self {
        Self {
            resources: Vec::new(),
            max_retries,
            retry_base_ms,
            displayed: 0.0,
            page_loaded: false,
            complete: false,
        }
    }

    /// Register a resource. Duplicates and non-fetchable sources are ignored.
    pub fn add(&mut self, src: &str) -> bool {
        if !is_loadable(src) || self.state(src).is_some() {
            return false;
        }
        self.resources
            .push((src.to_string(), ResourceState::Pending { attempts: 0 }));
        true
    }

    pub fn state(&self, src: &str) -> Option<ResourceState> {
        self.resources
            .iter()
            .find(|(s, _)| s == src)
            .map(|(_, state)| *state)
    }

    fn state_mut(&mut self, src: &str) -> Option<&mut ResourceState> {
        self.resources
            .iter_mut()
            .find(|(s, _)| s == src)
            .map(|(_, state)| state)
    }

    pub fn total(&self) -> usize {
        self.resources.len()
    }

    /// Loaded plus given-up resources.
    pub fn settled(&self) -> usize {
        self.resources
            .iter()
            .filter(|(_, s)| !matches!(s, ResourceState::Pending { .. }))
            .count()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, s)| *s == ResourceState::Failed)
            .map(|(src, _)| src.as_str())
            .collect()
    }

    pub fn loaded(&mut self, src: &str) {
        if let Some(state) = self.state_mut(src) {
            if matches!(state, ResourceState::Pending { .. }) {
                *state = ResourceState::Loaded;
            }
        }
    }

    /// Record a failure. Returns `None` for unknown or already settled sources.
    pub fn errored(&mut self, src: &str) -> Option<ErrorOutcome> {
        let max_retries = self.max_retries;
        let base = self.retry_base_ms;
        let state = self.state_mut(src)?;
        let ResourceState::Pending { attempts } = *state else {
            return None;
        };
        if attempts < max_retries {
            *state = ResourceState::Pending {
                attempts: attempts + 1,
            };
            Some(ErrorOutcome::Retry {
                attempt: attempts + 1,
                delay_ms: base.saturating_mul(2u32.saturating_pow(attempts)),
            })
        } else {
            *state = ResourceState::Failed;
            Some(ErrorOutcome::GaveUp)
        }
    }

    pub fn mark_page_loaded(&mut self) {
        self.page_loaded = true;
    }

    pub fn target_percent(&self) -> f64 {
        if self.complete || self.total() == 0 {
            100.0
        } else {
            self.settled() as f64 / self.total() as f64 * 100.0
        }
    }

    pub fn is_ready(&self) -> bool {
        self.page_loaded && self.settled() >= self.total()
    }

    /// Move the displayed percentage one frame closer to the target.
    pub fn advance_display(&mut self) -> f64 {
        let target = self.target_percent();
        if self.displayed < target {
            let step = ((target - self.displayed) * 0.1).max(LOADING_MIN_INCREMENT);
            self.displayed = (self.displayed + step).min(target);
        }
        self.displayed
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns true the first time only.
    pub fn finish(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.complete = true;
        self.displayed = 100.0;
        true
    }
}

fn is_loadable(src: &str) -> bool {
    ["./", "../", "/", "http://", "https://"]
        .iter()
        .any(|p| src.starts_with(p))
}

fn percent_label(value: f64) -> String {
    format!("{}%", value.round() as i64)
}

struct Elements {
    page: HtmlElement,
    counter: Option<Element>,
    normal: Option<HtmlElement>,
    warning: Option<HtmlElement>,
    accept: Option<HtmlElement>,
}

#[derive(Default)]
struct Handles {
    listeners: Vec<Listener>,
    timers: Vec<Timeout>,
    frames: Option<FrameLoop>,
}

struct Shared {
    progress: RefCell<LoadingProgress>,
    elements: Elements,
    handles: RefCell<Handles>,
    started: Cell<bool>,
    settling: Cell<bool>,
}

/// The `#LoadingPage` overlay.
pub struct LoadingScreen {
    shared: Rc<Shared>,
}

impl LoadingScreen {
    pub fn attach(document: &Document) -> Result<Self, NavError> {
        let elements = Elements {
            page: element_by_id(document, LOADING_PAGE_ID)?,
            counter: optional(query_one(document, LOADING_COUNTER_SELECTOR)),
            normal: optional(element_by_id(document, NORMAL_LOADING_ID)),
            warning: optional(element_by_id(document, MOBILE_WARNING_ID)),
            accept: optional(element_by_id(document, ACCEPT_MOBILE_ID)),
        };
        let shared = Rc::new(Shared {
            progress: RefCell::new(LoadingProgress::default()),
            elements,
            handles: RefCell::new(Handles::default()),
            started: Cell::new(false),
            settling: Cell::new(false),
        });

        if detect_mobile() {
            show_mobile_warning(&shared)?;
        } else {
            start(&shared, document)?;
        }
        Ok(Self { shared })
    }

    pub fn is_complete(&self) -> bool {
        self.shared.progress.borrow().is_complete()
    }
}

fn optional<T>(found: Result<T, NavError>) -> Option<T> {
    match found {
        Ok(el) => Some(el),
        Err(e) => {
            warn!("LoadingScreen: {}", e);
            None
        }
    }
}

fn detect_mobile() -> bool {
    let window = gloo_utils::window();
    let navigator = window.navigator();
    let ua = navigator.user_agent().unwrap_or_default();
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let mobile = is_mobile(&ua, width, navigator.max_touch_points() > 0, MOBILE_WIDTH_CUTOFF);
    debug!("LoadingScreen: mobile detection = {}", mobile);
    mobile
}

fn show_mobile_warning(shared: &Rc<Shared>) -> Result<(), NavError> {
    let els = &shared.elements;
    let (Some(warning), Some(accept)) = (&els.warning, &els.accept) else {
        warn!("LoadingScreen: mobile warning markup missing, loading normally");
        return start(shared, &gloo_utils::document());
    };
    if let Some(normal) = &els.normal {
        set_style(normal, "display", "none");
    }
    set_style(warning, "display", "flex");

    let weak = Rc::downgrade(shared);
    let listener = Listener::new(accept, "click", false, false, move |_| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let els = &shared.elements;
        if let Some(warning) = &els.warning {
            set_style(warning, "display", "none");
        }
        if let Some(normal) = &els.normal {
            set_style(normal, "display", "flex");
        }
        if let Err(e) = start(&shared, &gloo_utils::document()) {
            error!("LoadingScreen: {}", e);
        }
    })?;
    shared.handles.borrow_mut().listeners.push(listener);
    info!("LoadingScreen: mobile warning displayed");
    Ok(())
}

fn start(shared: &Rc<Shared>, document: &Document) -> Result<(), NavError> {
    if shared.started.replace(true) {
        return Ok(());
    }
    let mut sources = Vec::new();
    for el in query_all(document, "img[src]")? {
        let src = match el.dyn_ref::<HtmlImageElement>() {
            Some(img) => img.src(),
            None => el.get_attribute("src").unwrap_or_default(),
        };
        if shared.progress.borrow_mut().add(&src) {
            sources.push(src);
        }
    }
    info!("LoadingScreen: {} resources to load", sources.len());
    for src in &sources {
        probe(shared, src)?;
    }

    if document.ready_state() == "complete" {
        shared.progress.borrow_mut().mark_page_loaded();
    } else {
        let weak = Rc::downgrade(shared);
        let window: web_sys::EventTarget = gloo_utils::window().into();
        let listener = Listener::passive(&window, "load", move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.progress.borrow_mut().mark_page_loaded();
                check_completion(&shared);
            }
        })?;
        shared.handles.borrow_mut().listeners.push(listener);
    }

    let weak = Rc::downgrade(shared);
    let frames = FrameLoop::start(move |_| {
        let Some(shared) = weak.upgrade() else {
            return false;
        };
        let (shown, done) = {
            let mut progress = shared.progress.borrow_mut();
            (progress.advance_display(), progress.is_complete())
        };
        if let Some(counter) = &shared.elements.counter {
            counter.set_text_content(Some(&percent_label(shown)));
        }
        !done
    })?;

    let weak = Rc::downgrade(shared);
    let cap = Timeout::new(LOADING_MAX_WAIT_MS, move || {
        if let Some(shared) = weak.upgrade() {
            if !shared.progress.borrow().is_complete() {
                warn!("LoadingScreen: timed out after {}ms, proceeding anyway", LOADING_MAX_WAIT_MS);
                complete(&shared);
            }
        }
    });

    {
        let mut handles = shared.handles.borrow_mut();
        handles.frames = Some(frames);
        handles.timers.push(cap);
    }
    check_completion(shared);
    Ok(())
}

/// Load `src` through a detached image element.
fn probe(shared: &Rc<Shared>, src: &str) -> Result<(), NavError> {
    let img = HtmlImageElement::new()?;
    img.set_cross_origin(Some("anonymous"));

    let weak = Rc::downgrade(shared);
    let loaded_src = src.to_string();
    let on_load = Listener::passive(&img, "load", move |_| {
        if let Some(shared) = weak.upgrade() {
            shared.progress.borrow_mut().loaded(&loaded_src);
            check_completion(&shared);
        }
    })?;

    let weak = Rc::downgrade(shared);
    let failed_src = src.to_string();
    let on_error = Listener::passive(&img, "error", move |_| {
        if let Some(shared) = weak.upgrade() {
            on_resource_error(&shared, &failed_src);
        }
    })?;

    img.set_src(src);
    let mut handles = shared.handles.borrow_mut();
    handles.listeners.push(on_load);
    handles.listeners.push(on_error);
    Ok(())
}

fn on_resource_error(shared: &Rc<Shared>, src: &str) {
    let outcome = shared.progress.borrow_mut().errored(src);
    match outcome {
        Some(ErrorOutcome::Retry { attempt, delay_ms }) => {
            warn!(
                "LoadingScreen: failed to load {}, retrying in {}ms (attempt {}/{})",
                src, delay_ms, attempt, LOADING_MAX_RETRIES
            );
            let weak: Weak<Shared> = Rc::downgrade(shared);
            let src = src.to_string();
            let retry = Timeout::new(delay_ms, move || {
                if let Some(shared) = weak.upgrade() {
                    if let Err(e) = probe(&shared, &src) {
                        error!("LoadingScreen: retry of {} failed: {}", src, e);
                    }
                }
            });
            shared.handles.borrow_mut().timers.push(retry);
        }
        Some(ErrorOutcome::GaveUp) => {
            error!(
                "LoadingScreen: failed to load after {} retries: {}",
                LOADING_MAX_RETRIES, src
            );
            check_completion(shared);
        }
        None => {}
    }
}

fn check_completion(shared: &Rc<Shared>) {
    let ready = shared.progress.borrow().is_ready();
    if !ready || shared.settling.get() || shared.progress.borrow().is_complete() {
        return;
    }
    shared.settling.set(true);
    // let the counter reach 100% before sliding away
    let weak = Rc::downgrade(shared);
    let settle = Timeout::new(SETTLE_DELAY_MS, move || {
        if let Some(shared) = weak.upgrade() {
            complete(&shared);
        }
    });
    shared.handles.borrow_mut().timers.push(settle);
}

fn complete(shared: &Rc<Shared>) {
    if !shared.progress.borrow_mut().finish() {
        return;
    }
    if let Some(counter) = &shared.elements.counter {
        counter.set_text_content(Some(&percent_label(100.0)));
    }
    let failed: Vec<String> = shared
        .progress
        .borrow()
        .failed()
        .into_iter()
        .map(String::from)
        .collect();
    if !failed.is_empty() {
        warn!("LoadingScreen: {} resources failed to load: {:?}", failed.len(), failed);
    }

    let page = shared.elements.page.clone();
    let slide = Timeout::new(SLIDE_DELAY_MS, move || {
        if let Err(e) = page.class_list().add_1("slide-up") {
            warn!("LoadingScreen: {:?}", e);
        }
        Timeout::new(SLIDE_DURATION_MS, move || set_style(&page, "display", "none")).forget();
    });
    shared.handles.borrow_mut().timers.push(slide);
    info!("LoadingScreen: complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_and_inline_sources_are_ignored() {
        let mut p = LoadingProgress::default();
        assert!(p.add("./a.png"));
        assert!(!p.add("./a.png"));
        assert!(!p.add("data:image/png;base64,AAAA"));
        assert!(!p.add(""));
        assert!(p.add("https://cdn.example.org/b.jpg"));
        assert_eq!(p.total(), 2);
    }

    #[test]
    fn empty_page_targets_full_progress() {
        let p = LoadingProgress::default();
        assert_eq!(p.target_percent(), 100.0);
        assert!(!p.is_ready());
    }

    #[test]
    fn retries_back_off_then_give_up() {
        let mut p = LoadingProgress::new(3, 1000);
        p.add("/x.png");
        assert_eq!(
            p.errored("/x.png"),
            Some(ErrorOutcome::Retry { attempt: 1, delay_ms: 1000 })
        );
        assert_eq!(
            p.errored("/x.png"),
            Some(ErrorOutcome::Retry { attempt: 2, delay_ms: 2000 })
        );
        assert_eq!(
            p.errored("/x.png"),
            Some(ErrorOutcome::Retry { attempt: 3, delay_ms: 4000 })
        );
        assert_eq!(p.errored("/x.png"), Some(ErrorOutcome::GaveUp));
        assert_eq!(p.state("/x.png"), Some(ResourceState::Failed));
        assert_eq!(p.settled(), 1);
        assert_eq!(p.failed(), vec!["/x.png"]);
        assert_eq!(p.errored("/x.png"), None);
    }

    #[test]
    fn progress_counts_failures_as_settled() {
        let mut p = LoadingProgress::new(0, 1000);
        p.add("/a.png");
        p.add("/b.png");
        p.loaded("/a.png");
        assert_eq!(p.target_percent(), 50.0);
        assert_eq!(p.errored("/b.png"), Some(ErrorOutcome::GaveUp));
        assert_eq!(p.target_percent(), 100.0);
        assert!(!p.is_ready());
        p.mark_page_loaded();
        assert!(p.is_ready());
    }

    #[test]
    fn display_eases_toward_target() {
        let mut p = LoadingProgress::default();
        p.add("/a.png");
        p.add("/b.png");
        p.loaded("/a.png");
        // 10% of the remaining 50
        assert_eq!(p.advance_display(), 5.0);
        assert!((p.advance_display() - 9.5).abs() < 1e-9);
        for _ in 0..200 {
            p.advance_display();
        }
        assert_eq!(p.displayed(), 50.0);
    }

    #[test]
    fn display_step_has_a_floor() {
        let mut p = LoadingProgress::default();
        for i in 0..100 {
            p.add(&format!("/img/{}.png", i));
        }
        p.loaded("/img/0.png");
        // a tenth of 1% is below the minimum step
        assert_eq!(p.advance_display(), 0.5);
        assert_eq!(p.advance_display(), 1.0);
        assert_eq!(p.advance_display(), 1.0);
        p.finish();
        assert_eq!(p.displayed(), 100.0);
    }

    #[test]
    fn finish_happens_once() {
        let mut p = LoadingProgress::default();
        assert!(p.finish());
        assert!(!p.finish());
        assert!(p.is_complete());
    }

    #[test]
    fn percent_labels_round() {
        assert_eq!(percent_label(9.5), "10%");
        assert_eq!(percent_label(0.0), "0%");
    }
}
