//! `#contactForm`: validation, submission through EmailJS, and the result
//! popup.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{debug, error, info, warn};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement};

use crate::config::{
    CONTACT_FORM_ID, CONTACT_RECIPIENT, EMAILJS_PUBLIC_KEY, EMAILJS_SERVICE_ID,
    EMAILJS_TEMPLATE_ID, POPUP_DISMISS_MS, POPUP_FADE_MS,
};
use crate::dom::{element_by_id, set_style, Listener};
use crate::emailjs;
use crate::utils::is_valid_email;
use crate::NavError;

pub const REQUIRED_FIELDS: [&str; 3] = ["Name", "Email", "ContactNumber"];
const NO_MESSAGE: &str = "No message provided";
const EMAILJS_INIT_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    /// A required field is empty or missing from the form.
    Missing(&'static str),
    InvalidEmail,
}

impl FormError {
    /// The `name` of the input to highlight.
    pub fn field(&self) -> &'static str {
        match self {
            FormError::Missing(name) => *name,
            FormError::InvalidEmail => "Email",
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Missing(name) => write!(f, "{} is required", name),
            FormError::InvalidEmail => write!(f, "Email address is not valid"),
        }
    }
}

impl std::error::Error for FormError {}

/// Raw values typed into the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub message: String,
}

impl ContactFields {
    fn value_of(&self, field: &str) -> &str {
        match field {
            "Name" => &self.name,
            "Email" => &self.email,
            "ContactNumber" => &self.contact_number,
            "Message" => &self.message,
            _ => "",
        }
    }

    /// Every problem at once, so all bad fields can be highlighted together.
    pub fn validate(&self) -> Result<(), Vec<FormError>> {
        let mut errors: Vec<FormError> = REQUIRED_FIELDS
            .iter()
            .filter(|f| self.value_of(f).trim().is_empty())
            .map(|f| FormError::Missing(*f))
            .collect();
        if !self.email.trim().is_empty() && !is_valid_email(&self.email) {
            errors.push(FormError::InvalidEmail);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Template parameters sent to EmailJS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSubmission {
    pub from_name: String,
    pub from_email: String,
    pub contact_number: String,
    pub message: String,
    pub to_email: String,
    pub request_time: String,
    pub subject: String,
}

impl ContactSubmission {
    pub fn new(fields: &ContactFields, to_email: &str, request_time: String) -> Self {
        let name = fields.name.trim().to_string();
        let message = match fields.message.trim() {
            "" => NO_MESSAGE.to_string(),
            m => m.to_string(),
        };
        Self {
            subject: format!("New Contact Request from {}", name),
            from_name: name,
            from_email: fields.email.trim().to_string(),
            contact_number: fields.contact_number.trim().to_string(),
            message,
            to_email: to_email.to_string(),
            request_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PopupKind {
    Success,
    Error,
}

struct FormShared {
    form: HtmlFormElement,
    button: HtmlButtonElement,
    submitting: Cell<bool>,
}

pub struct ContactForm {
    shared: Rc<FormShared>,
    _listener: Listener,
}

impl ContactForm {
    pub fn attach(document: &Document) -> Result<Self, NavError> {
        let form: HtmlFormElement = element_by_id(document, CONTACT_FORM_ID)?;
        let button = form
            .query_selector("button[type=\"submit\"], button:not([type])")?
            .ok_or_else(|| NavError::MissingElement("contact form submit button".into()))?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|_| NavError::MissingElement("contact form submit button".into()))?;

        emailjs::init_when_ready(EMAILJS_PUBLIC_KEY, EMAILJS_INIT_ATTEMPTS);

        let shared = Rc::new(FormShared {
            form,
            button,
            submitting: Cell::new(false),
        });
        let weak = Rc::downgrade(&shared);
        let listener = Listener::new(&shared.form, "submit", false, false, move |e| {
            e.prevent_default();
            if let Some(shared) = weak.upgrade() {
                handle_submit(&shared);
            }
        })?;
        info!("ContactForm: initialised");
        Ok(Self {
            shared,
            _listener: listener,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.shared.submitting.get()
    }
}

fn handle_submit(shared: &Rc<FormShared>) {
    if shared.submitting.get() {
        debug!("ContactForm: submission already in progress");
        return;
    }
    let fields = read_fields(&shared.form);
    let errors = fields.validate().err().unwrap_or_default();
    for name in REQUIRED_FIELDS {
        if let Some(field) = named_field(&shared.form, name) {
            highlight_field(&field, errors.iter().any(|e| e.field() == name));
        }
    }
    if !errors.is_empty() {
        debug!("ContactForm: rejected: {:?}", errors);
        show_popup("Please fill in all required fields correctly.", PopupKind::Error);
        return;
    }

    shared.submitting.set(true);
    update_button(&shared.button, true);
    let submission = ContactSubmission::new(&fields, CONTACT_RECIPIENT, request_time());
    let shared = shared.clone();
    wasm_bindgen_futures::spawn_local(async move {
        match emailjs::send(EMAILJS_SERVICE_ID, EMAILJS_TEMPLATE_ID, &submission).await {
            Ok(response) => {
                debug!("ContactForm: email sent: {:?}", response);
                on_sent(&shared.form);
            }
            Err(e) => {
                error!("ContactForm: email send failed: {}", e);
                show_popup(
                    "Submission failed. Please refresh the page and try again.",
                    PopupKind::Error,
                );
            }
        }
        shared.submitting.set(false);
        update_button(&shared.button, false);
    });
}

fn on_sent(form: &HtmlFormElement) {
    show_popup("Successfully submitted! We will contact you soon.", PopupKind::Success);
    form.reset();
    if let Ok(fields) = form.query_selector_all("input, textarea") {
        for i in 0..fields.length() {
            if let Some(field) = fields.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                highlight_field(&field, false);
            }
        }
    }
}

fn named_field(form: &HtmlFormElement, name: &str) -> Option<HtmlElement> {
    form.query_selector(&format!("[name=\"{}\"]", name))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn field_value(form: &HtmlFormElement, name: &str) -> String {
    let Some(el) = named_field(form, name) else {
        return String::new();
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else {
        el.text_content().unwrap_or_default()
    }
}

fn read_fields(form: &HtmlFormElement) -> ContactFields {
    ContactFields {
        name: field_value(form, "Name"),
        email: field_value(form, "Email"),
        contact_number: field_value(form, "ContactNumber"),
        message: field_value(form, "Message"),
    }
}

fn request_time() -> String {
    js_sys::Date::new_0()
        .to_locale_string("default", &JsValue::UNDEFINED)
        .into()
}

fn highlight_field(field: &HtmlElement, has_error: bool) {
    let (border, background) = if has_error {
        ("#ff4444", "#fff5f5")
    } else {
        ("", "")
    };
    set_style(field, "border-color", border);
    set_style(field, "background-color", background);
}

fn update_button(button: &HtmlButtonElement, submitting: bool) {
    button.set_disabled(submitting);
    if submitting {
        button.set_text_content(Some("Submitting..."));
        set_style(button, "opacity", "0.7");
        set_style(button, "cursor", "not-allowed");
    } else {
        button.set_text_content(Some("Submit"));
        set_style(button, "opacity", "1");
        set_style(button, "cursor", "pointer");
    }
}

const POPUP_KEYFRAMES: &str = "
@keyframes popupFadeIn {
    from { opacity: 0; transform: translate(-50%, -50%) scale(0.8); }
    to { opacity: 1; transform: translate(-50%, -50%) scale(1); }
}
@keyframes popupFadeOut {
    from { opacity: 1; transform: translate(-50%, -50%) scale(1); }
    to { opacity: 0; transform: translate(-50%, -50%) scale(0.8); }
}";

fn popup_css(kind: PopupKind) -> String {
    let background = match kind {
        PopupKind::Success => "#4CAF50",
        PopupKind::Error => "#f44336",
    };
    format!(
        "position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%); \
         background: {}; color: white; padding: 20px 30px; border-radius: 10px; \
         font-size: 16px; font-weight: 500; text-align: center; z-index: 10000; \
         box-shadow: 0 4px 20px rgba(0,0,0,0.3); max-width: 400px; width: 90%; \
         animation: popupFadeIn 0.3s ease-out;",
        background
    )
}

fn show_popup(message: &str, kind: PopupKind) {
    if let Err(e) = try_show_popup(message, kind) {
        warn!("ContactForm: could not show popup \"{}\": {}", message, e);
    }
}

fn try_show_popup(message: &str, kind: PopupKind) -> Result<(), NavError> {
    let document = gloo_utils::document();
    ensure_popup_styles(&document)?;
    let popup: HtmlElement = document
        .create_element("div")?
        .dyn_into()
        .map_err(|_| NavError::Dom("popup is not an HtmlElement".into()))?;
    popup.set_class_name("contact-form-popup");
    popup.set_text_content(Some(message));
    popup.set_attribute("style", &popup_css(kind))?;
    document
        .body()
        .ok_or_else(|| NavError::MissingElement("body".into()))?
        .append_child(&popup)?;

    let for_click = popup.clone();
    let click = Listener::passive(&popup, "click", move |_| dismiss_popup(&for_click))?;
    Timeout::new(POPUP_DISMISS_MS, move || {
        dismiss_popup(&popup);
        drop(click);
    })
    .forget();
    Ok(())
}

fn ensure_popup_styles(document: &Document) -> Result<(), NavError> {
    if document.get_element_by_id("popup-styles").is_some() {
        return Ok(());
    }
    let style: Element = document.create_element("style")?;
    style.set_id("popup-styles");
    style.set_text_content(Some(POPUP_KEYFRAMES));
    document
        .head()
        .ok_or_else(|| NavError::MissingElement("head".into()))?
        .append_child(&style)?;
    Ok(())
}

fn dismiss_popup(popup: &HtmlElement) {
    set_style(popup, "animation", "popupFadeOut 0.3s ease-out");
    let popup = popup.clone();
    Timeout::new(POPUP_FADE_MS, move || popup.remove()).forget();
}
