//! Client-side behavior for a single-page site: a snap-scrolling section
//! navigator plus the small page widgets that hang off it.
//!
//! The navigation core ([`navigator`], [`checkpoint`], [`input`]) is plain
//! Rust driven through injected seams, so it runs and tests natively. The
//! [`web`] and [`dom`] modules bind it to a live browser page, and the
//! remaining modules are the thin consumers wired up by the binary.

use std::fmt;

use wasm_bindgen::JsValue;

pub mod checkpoint;
pub mod components;
pub mod config;
pub mod contact_form;
pub mod counter;
pub mod dom;
pub mod easing;
pub mod emailjs;
pub mod input;
pub mod loading;
pub mod navigator;
pub mod utils;
pub mod web;

pub use checkpoint::{Checkpoint, CheckpointList};
pub use config::SnapConfig;
pub use easing::Easing;
pub use input::{DeltaMode, NavKey, WheelInput};
pub use navigator::{Clock, NavEvent, Phase, ScrollSurface, SnapNavigator};
pub use web::Navigator;

/// Failures inside navigation. Public entry points log these and move on.
#[derive(Debug, Clone, PartialEq)]
pub enum NavError {
    CheckpointNotFound(String),
    TransitionInFlight,
    /// Called re-entrantly while the navigator core was already borrowed.
    Busy,
    /// The navigator was torn down.
    Inactive,
    MissingElement(String),
    Dom(String),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::CheckpointNotFound(id) => write!(f, "Checkpoint \"{}\" not found", id),
            NavError::TransitionInFlight => {
                write!(f, "A transition is already in flight, request dropped")
            }
            NavError::Busy => write!(f, "Navigator is busy handling another call"),
            NavError::Inactive => write!(f, "Navigator has been destroyed"),
            NavError::MissingElement(what) => write!(f, "Element not found: {}", what),
            NavError::Dom(msg) => write!(f, "DOM call failed: {}", msg),
        }
    }
}

impl std::error::Error for NavError {}

impl From<JsValue> for NavError {
    fn from(value: JsValue) -> Self {
        NavError::Dom(js_error_text(&value))
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
