//! Page widgets that sit on top of the navigator.
//!
//! Each component takes what it needs (usually a [`Navigator`] clone) at
//! construction and owns its listeners, so dropping it detaches it.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};
use yew::Callback;

use crate::config::{
    ACTIVE_ATTR, CARD_CONTAINER_SELECTOR, CONTACT_BUTTON_SELECTOR, CONTACT_CHECKPOINT,
    IMAGE_SLIDER_ID, NAV_LINK_SELECTOR, TEXT_SLIDER_ID, VIEWPORT_ATTR,
};
use crate::dom::{element_by_id, query_all, set_style, Listener};
use crate::utils::{anchor_checkpoint, card_translate_percent};
use crate::web::{CheckpointRef, Navigator};
use crate::NavError;

/// "Contact us" buttons jump to the contact section.
pub struct ContactButtons {
    _listeners: Vec<Listener>,
}

impl ContactButtons {
    pub fn attach(document: &Document, nav: &Navigator) -> Result<Self, NavError> {
        let buttons = query_all(document, CONTACT_BUTTON_SELECTOR)?;
        if buttons.is_empty() {
            warn!("ContactButtons: no {} buttons found", CONTACT_BUTTON_SELECTOR);
        }
        let listeners = buttons
            .iter()
            .map(|button| {
                let nav = nav.clone();
                Listener::new(button, "click", false, false, move |e| {
                    e.prevent_default();
                    e.stop_propagation();
                    nav.navigate_to(CONTACT_CHECKPOINT);
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("ContactButtons: attached to {} buttons", listeners.len());
        Ok(Self {
            _listeners: listeners,
        })
    }
}

/// Internal links whose href names a checkpoint navigate through the
/// navigator instead of the browser.
pub struct AnchorNavigation {
    _listeners: Vec<Listener>,
}

impl AnchorNavigation {
    pub fn attach(document: &Document, nav: &Navigator) -> Result<Self, NavError> {
        let anchors = query_all(document, "a[href]")?;
        if anchors.is_empty() {
            warn!("AnchorNavigation: no anchors with href found");
        }
        let listeners = anchors
            .iter()
            .map(|anchor| {
                let nav = nav.clone();
                let el = anchor.clone();
                Listener::new(anchor, "click", false, false, move |e| {
                    let href = el.get_attribute("href");
                    let active = el.get_attribute(ACTIVE_ATTR);
                    if let Some(id) = anchor_checkpoint(href.as_deref(), active.as_deref()) {
                        e.prevent_default();
                        e.stop_propagation();
                        nav.navigate_to(id);
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            _listeners: listeners,
        })
    }
}

/// Marks the nav entry for the current checkpoint with `data-viewport`.
pub struct NavHighlighter {
    links: Rc<Vec<(String, Element)>>,
}

impl NavHighlighter {
    pub fn attach(document: &Document, nav: &Navigator) -> Result<Self, NavError> {
        let selector = format!("{} a[href]", NAV_LINK_SELECTOR);
        let mut links = Vec::new();
        for anchor in query_all(document, &selector)? {
            let Some(href) = anchor.get_attribute("href") else {
                continue;
            };
            match anchor.closest(NAV_LINK_SELECTOR)? {
                Some(item) => links.push((href, item)),
                None => warn!("NavHighlighter: link \"{}\" outside a nav item", href),
            }
        }
        info!("NavHighlighter: mapped {} navigation links", links.len());

        let links = Rc::new(links);
        if let Some(current) = nav.current_checkpoint() {
            highlight(&links, &current.id);
        }
        let for_cb = links.clone();
        nav.on_checkpoint_changed(Callback::from(move |cp: CheckpointRef| {
            highlight(&for_cb, &cp.id);
        }));
        Ok(Self { links })
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

fn highlight(links: &[(String, Element)], active_id: &str) {
    for (href, item) in links {
        let result = if href == active_id {
            item.set_attribute(VIEWPORT_ATTR, "true")
        } else {
            item.remove_attribute(VIEWPORT_ATTR)
        };
        if let Err(e) = result {
            warn!("NavHighlighter: {:?}", e);
        }
    }
}

/// Service cards: clicking one activates it and slides the image and text
/// panels to match.
pub struct CardSlider {
    _listeners: Vec<Listener>,
}

impl CardSlider {
    pub fn attach(document: &Document) -> Result<Self, NavError> {
        let containers = Rc::new(query_all(document, CARD_CONTAINER_SELECTOR)?);
        if containers.is_empty() {
            warn!("CardSlider: no containers match {}", CARD_CONTAINER_SELECTOR);
            return Ok(Self {
                _listeners: Vec::new(),
            });
        }
        let image = slider_panel(document, IMAGE_SLIDER_ID);
        let text = slider_panel(document, TEXT_SLIDER_ID);
        let panels = Rc::new([image, text]);

        let listeners = containers
            .iter()
            .map(|container| {
                let clicked = container.clone();
                let all = containers.clone();
                let panels = panels.clone();
                Listener::new(container, "click", false, false, move |e| {
                    e.prevent_default();
                    e.stop_propagation();
                    let Some(card) = clicked.get_attribute("data-card") else {
                        warn!("CardSlider: container missing data-card");
                        return;
                    };
                    select_card(&all, &clicked, &card, &panels[..]);
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            _listeners: listeners,
        })
    }
}

fn slider_panel(document: &Document, id: &str) -> Option<HtmlElement> {
    match element_by_id::<HtmlElement>(document, id) {
        Ok(el) => Some(el),
        Err(e) => {
            warn!("CardSlider: {}", e);
            None
        }
    }
}

fn select_card(all: &[Element], clicked: &Element, card: &str, panels: &[Option<HtmlElement>]) {
    for c in all {
        let _ = c.remove_attribute(ACTIVE_ATTR);
    }
    let _ = clicked.set_attribute(ACTIVE_ATTR, "true");

    let Some(percent) = card_translate_percent(card) else {
        warn!("CardSlider: bad card number \"{}\"", card);
        return;
    };
    let transform = format!("translateX({}%)", percent);
    for panel in panels.iter().flatten() {
        set_style(panel, "transform", &transform);
    }
}

/// Mirrors the viewport size into `--viewport_height` / `--viewport_width`.
pub struct ViewportVars {
    _listeners: Vec<Listener>,
    _pending: Rc<RefCell<Option<Timeout>>>,
}

impl ViewportVars {
    pub fn attach() -> Result<Self, NavError> {
        update_viewport_vars();
        let window: web_sys::EventTarget = gloo_utils::window().into();
        let pending: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
        let for_orientation = pending.clone();
        let listeners = vec![
            Listener::passive(&window, "resize", |_| update_viewport_vars())?,
            Listener::passive(&window, "orientationchange", move |_| {
                *for_orientation.borrow_mut() = Some(Timeout::new(100, update_viewport_vars));
            })?,
        ];
        Ok(Self {
            _listeners: listeners,
            _pending: pending,
        })
    }
}

fn update_viewport_vars() {
    let window = gloo_utils::window();
    let Some(root) = gloo_utils::document()
        .document_element()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return;
    };
    let size = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    set_style(&root, "--viewport_height", &format!("{}px", size(window.inner_height())));
    set_style(&root, "--viewport_width", &format!("{}px", size(window.inner_width())));
}
