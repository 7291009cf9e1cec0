//! Browser tests for the DOM bindings.
#![cfg(target_arch = "wasm32")]
extern crate wasm_bindgen_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use snap_site::components::CardSlider;
use snap_site::dom::read_checkpoints;
use snap_site::{NavEvent, Navigator, SnapConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, Event, EventInit, HtmlElement, HtmlInputElement, KeyboardEvent, KeyboardEventInit};
use yew::Callback;

wasm_bindgen_test_configure!(run_in_browser);

/// Mounts markup in a fresh container and removes it when dropped.
struct Fixture {
    root: Element,
}

impl Fixture {
    fn mount(html: &str) -> Self {
        let document = gloo_utils::document();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        Self { root }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.root.remove();
    }
}

const SECTIONS: &str = r#"
    <section class="snap_checkpoint" data-checkpoint="2" style="height:1000px"></section>
    <section class="snap_checkpoint" data-checkpoint="home" style="height:1000px"></section>
    <section class="snap_checkpoint" data-checkpoint="end" data-speed="900" style="height:1000px"></section>
"#;

#[wasm_bindgen_test]
fn reads_sections_in_document_order() {
    let _page = Fixture::mount(SECTIONS);
    let found = read_checkpoints(&gloo_utils::document()).unwrap();

    let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "home", "end"]);
    assert_eq!(found[1].anchor_offset - found[0].anchor_offset, 1000.0);
    assert_eq!(found[2].animation_duration_ms, Some(900.0));
    assert_eq!(found[0].animation_duration_ms, None);
}

#[wasm_bindgen_test]
fn navigator_takes_over_and_hands_back_scrolling() {
    let _page = Fixture::mount(SECTIONS);
    let nav = Navigator::attach(SnapConfig::default()).unwrap();
    let root: HtmlElement = gloo_utils::document()
        .document_element()
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(
        root.style().get_property_value("scroll-snap-type").unwrap(),
        "none"
    );
    assert!(nav.current_checkpoint().is_some());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    nav.on_event(Callback::from(move |e| sink.borrow_mut().push(e)));
    nav.navigate_to("missing");
    assert!(seen.borrow().is_empty());
    assert!(!nav.is_animating());

    nav.destroy();
    assert_eq!(
        root.style().get_property_value("scroll-snap-type").unwrap(),
        ""
    );
}

#[wasm_bindgen_test]
fn clicking_a_card_slides_the_panels() {
    let _page = Fixture::mount(
        r#"
        <div id="Services"><div class="wrapper">
            <div class="container"><div class="wrapper">
                <div class="container" data-card="1" data-active="true">one</div>
                <div class="container" data-card="3">three</div>
            </div></div>
        </div></div>
        <div id="ImageSlider"></div>
        <div id="TextSlider"></div>
    "#,
    );
    let document = gloo_utils::document();
    let _slider = CardSlider::attach(&document).unwrap();

    let third: HtmlElement = document
        .query_selector("[data-card=\"3\"]")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    third.click();

    let image: HtmlElement = document.get_element_by_id("ImageSlider").unwrap().dyn_into().unwrap();
    assert_eq!(
        image.style().get_property_value("transform").unwrap(),
        "translateX(-200%)"
    );
    assert_eq!(third.get_attribute("data-active").as_deref(), Some("true"));
    let first = document.query_selector("[data-card=\"1\"]").unwrap().unwrap();
    assert_eq!(first.get_attribute("data-active"), None);
}

#[wasm_bindgen_test]
fn typing_in_a_form_field_is_left_alone() {
    let _page = Fixture::mount(&format!(
        r#"{}<form><input name="Name" type="text"></form>"#,
        SECTIONS
    ));
    let nav = Navigator::attach(SnapConfig::default()).unwrap();
    let input: HtmlInputElement = gloo_utils::document()
        .query_selector("input[name=\"Name\"]")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    input.focus().unwrap();

    let init = KeyboardEventInit::new();
    init.set_key(" ");
    init.set_bubbles(true);
    init.set_cancelable(true);
    let space = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    input.dispatch_event(&space).unwrap();

    assert!(!space.default_prevented());
    assert!(!nav.is_animating());
    nav.destroy();
}

#[wasm_bindgen_test]
fn scroll_events_are_swallowed_only_while_animating() {
    let page = Fixture::mount(SECTIONS);
    let nav = Navigator::attach(SnapConfig::default()).unwrap();
    let document = gloo_utils::document();

    let seen = Rc::new(Cell::new(0));
    let counter = seen.clone();
    let on_scroll = Closure::<dyn FnMut(Event)>::new(move |_| counter.set(counter.get() + 1));
    document
        .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())
        .unwrap();
    let fire = || {
        let init = EventInit::new();
        init.set_bubbles(true);
        let scroll = Event::new_with_event_init_dict("scroll", &init).unwrap();
        page.root.dispatch_event(&scroll).unwrap();
    };

    nav.navigate_to("end");
    assert!(nav.is_animating());
    fire();
    assert_eq!(seen.get(), 0);

    nav.destroy();
    fire();
    assert_eq!(seen.get(), 1);

    document
        .remove_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())
        .unwrap();
}

#[wasm_bindgen_test]
async fn resize_burst_rebuilds_checkpoints_once() {
    let _page = Fixture::mount(SECTIONS);
    let nav = Navigator::attach(SnapConfig::default()).unwrap();
    let rebuilt = Rc::new(RefCell::new(Vec::new()));
    let sink = rebuilt.clone();
    nav.on_event(Callback::from(move |e: NavEvent| {
        if let NavEvent::CheckpointsRebuilt { count } = e {
            sink.borrow_mut().push(count);
        }
    }));
    let window = gloo_utils::window();
    let resize = || {
        window
            .dispatch_event(&Event::new("resize").unwrap())
            .unwrap();
    };

    resize();
    let sections = gloo_utils::document()
        .query_selector_all(".snap_checkpoint")
        .unwrap();
    for i in 0..sections.length() {
        let section: HtmlElement = sections.item(i).unwrap().dyn_into().unwrap();
        section.style().set_property("height", "500px").unwrap();
    }
    TimeoutFuture::new(50).await;
    resize();
    TimeoutFuture::new(400).await;

    assert_eq!(*rebuilt.borrow(), vec![3]);
    let offsets: Vec<(String, f64)> = nav
        .checkpoints()
        .into_iter()
        .map(|c| (c.id, c.anchor_offset))
        .collect();
    let base = offsets.iter().find(|(id, _)| id == "2").unwrap().1;
    assert_eq!(
        offsets.iter().map(|(id, o)| (id.as_str(), o - base)).collect::<Vec<_>>(),
        vec![("home", 500.0), ("2", 0.0), ("end", 1000.0)]
    );
    nav.destroy();
}
