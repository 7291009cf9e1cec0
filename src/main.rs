//! Entry point for the site script: installs logging, then wires the
//! navigator and every page widget once the document is parsed.

use std::cell::RefCell;

use gloo_timers::callback::Timeout;
use log::{error, info, warn, Level};
use snap_site::components::{AnchorNavigation, CardSlider, ContactButtons, NavHighlighter, ViewportVars};
use snap_site::config::{CONTACT_FORM_DELAY_MS, DEBUG};
use snap_site::contact_form::ContactForm;
use snap_site::counter::Counters;
use snap_site::loading::LoadingScreen;
use snap_site::{NavError, Navigator, SnapConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Everything attached to the page. Dropping a field detaches it.
#[derive(Default)]
struct Site {
    loading: Option<LoadingScreen>,
    viewport: Option<ViewportVars>,
    navigator: Option<Navigator>,
    contact_buttons: Option<ContactButtons>,
    anchors: Option<AnchorNavigation>,
    highlighter: Option<NavHighlighter>,
    cards: Option<CardSlider>,
    counters: Option<Counters>,
    contact_form: Option<ContactForm>,
}

impl Site {
    fn attached(&self) -> usize {
        [
            self.loading.is_some(),
            self.viewport.is_some(),
            self.navigator.is_some(),
            self.contact_buttons.is_some(),
            self.anchors.is_some(),
            self.highlighter.is_some(),
            self.cards.is_some(),
            self.counters.is_some(),
            self.contact_form.is_some(),
        ]
        .iter()
        .filter(|ok| **ok)
        .count()
    }
}

thread_local! {
    /// Lives for the whole page.
    static SITE: RefCell<Site> = RefCell::new(Site::default());
}

/// Log the outcome of one component; a failure never stops the others.
fn attach<T>(name: &str, result: Result<T, NavError>) -> Option<T> {
    match result {
        Ok(component) => {
            info!("✓ {} initialized", name);
            Some(component)
        }
        Err(e) => {
            error!("{} failed to initialize: {}", name, e);
            None
        }
    }
}

fn boot() {
    let document = gloo_utils::document();
    let mut site = Site {
        loading: attach("LoadingScreen", LoadingScreen::attach(&document)),
        viewport: attach("ViewportVars", ViewportVars::attach()),
        navigator: attach("SnapNavigator", Navigator::attach(SnapConfig::default())),
        cards: attach("CardSlider", CardSlider::attach(&document)),
        counters: attach("Counters", Counters::attach(&document)),
        ..Site::default()
    };

    match site.navigator.clone() {
        Some(nav) => {
            site.contact_buttons = attach("ContactButtons", ContactButtons::attach(&document, &nav));
            site.anchors = attach("AnchorNavigation", AnchorNavigation::attach(&document, &nav));
            site.highlighter = attach("NavHighlighter", NavHighlighter::attach(&document, &nav));
        }
        None => warn!("navigation widgets skipped: no navigator"),
    }
    info!("site ready: {} components attached", site.attached());
    SITE.with(|s| *s.borrow_mut() = site);

    Timeout::new(CONTACT_FORM_DELAY_MS, || {
        let form = attach("ContactForm", ContactForm::attach(&gloo_utils::document()));
        SITE.with(|s| s.borrow_mut().contact_form = form);
    })
    .forget();
}

fn main() {
    console_error_panic_hook::set_once();
    let level = if DEBUG { Level::Debug } else { Level::Info };
    if console_log::init_with_level(level).is_err() {
        warn!("console logger already installed");
    }

    let document = gloo_utils::document();
    if document.ready_state() == "loading" {
        let start = Closure::once_into_js(boot);
        if let Err(e) =
            document.add_event_listener_with_callback("DOMContentLoaded", start.unchecked_ref())
        {
            error!("could not wait for DOMContentLoaded: {:?}", e);
        }
    } else {
        boot();
    }
}
