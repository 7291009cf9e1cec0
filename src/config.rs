//! Application-level configuration constants.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Verbose console output for every component.
pub const DEBUG: bool = true;

// Snap timing
pub const SNAP_COOLDOWN_MS: f64 = 1000.0;
pub const WHEEL_DEBOUNCE_MS: f64 = 16.0;
pub const DEFAULT_TRANSITION_MS: f64 = 600.0;
pub const RESIZE_DEBOUNCE_MS: u32 = 150;

// Trackpad accumulation
pub const TRACKPAD_DELTA_THRESHOLD: f64 = 50.0;
pub const ENERGY_THRESHOLD: f64 = 50.0;
pub const MAX_ENERGY: f64 = 200.0;
pub const ENERGY_DECAY_RATE: f64 = 0.85;
pub const NEGLIGIBLE_ENERGY: f64 = 0.1;

// Touch flicks
pub const FLICK_MIN_VELOCITY: f64 = 0.3; // px per ms
pub const FLICK_MAX_DURATION_MS: f64 = 300.0;
pub const TOUCH_SAMPLE_WINDOW: usize = 3;

// Markup contract
pub const CHECKPOINT_SELECTOR: &str = ".snap_checkpoint";
pub const CHECKPOINT_ATTR: &str = "data-checkpoint";
pub const SPEED_ATTR: &str = "data-speed";
pub const HOME_ID: &str = "home";
pub const END_ID: &str = "end";

// Consumers
pub const CONTACT_BUTTON_SELECTOR: &str = ".contactUs";
pub const CONTACT_CHECKPOINT: &str = "8";
pub const NAV_LINK_SELECTOR: &str = ".nav-link";
pub const VIEWPORT_ATTR: &str = "data-viewport";
pub const ACTIVE_ATTR: &str = "data-active";
pub const CARD_CONTAINER_SELECTOR: &str =
    "#Services > .wrapper > .container:first-child > .wrapper > .container";
pub const IMAGE_SLIDER_ID: &str = "ImageSlider";
pub const TEXT_SLIDER_ID: &str = "TextSlider";

// Counters
pub const COUNTER_SELECTOR: &str = ".counter";
pub const DEFAULT_COUNTER_MS: f64 = 2000.0;

// Loading screen
pub const LOADING_PAGE_ID: &str = "LoadingPage";
pub const LOADING_COUNTER_SELECTOR: &str = ".loading-counter";
pub const NORMAL_LOADING_ID: &str = "normalLoading";
pub const MOBILE_WARNING_ID: &str = "mobileWarning";
pub const ACCEPT_MOBILE_ID: &str = "acceptMobileWarning";
pub const LOADING_MAX_WAIT_MS: u32 = 30_000;
pub const LOADING_MAX_RETRIES: u32 = 3;
pub const LOADING_RETRY_BASE_MS: u32 = 1000;
pub const LOADING_MIN_INCREMENT: f64 = 0.5;
pub const MOBILE_WIDTH_CUTOFF: f64 = 1024.0;

// Contact form
pub const CONTACT_FORM_ID: &str = "contactForm";
pub const CONTACT_FORM_DELAY_MS: u32 = 500;
pub const POPUP_DISMISS_MS: u32 = 4000;
pub const POPUP_FADE_MS: u32 = 300;
pub const EMAILJS_SERVICE_ID: &str = "service_6hh5ajg";
pub const EMAILJS_TEMPLATE_ID: &str = "template_vv1irpd";
pub const EMAILJS_PUBLIC_KEY: &str = "FtRIitNZVFWJKmm6_";
pub const CONTACT_RECIPIENT: &str = "saarthak.batra@gmail.com";

/// Tunables for the snap navigator. Any subset may be overridden from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub cooldown_ms: f64,
    pub wheel_debounce_ms: f64,
    pub default_duration_ms: f64,
    pub trackpad_delta_threshold: f64,
    pub energy_threshold: f64,
    pub max_energy: f64,
    pub decay_rate: f64,
    pub negligible_energy: f64,
    pub flick_min_velocity: f64,
    pub flick_max_duration_ms: f64,
    pub touch_sample_window: usize,
    pub resize_debounce_ms: u32,
    pub easing: Easing,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: SNAP_COOLDOWN_MS,
            wheel_debounce_ms: WHEEL_DEBOUNCE_MS,
            default_duration_ms: DEFAULT_TRANSITION_MS,
            trackpad_delta_threshold: TRACKPAD_DELTA_THRESHOLD,
            energy_threshold: ENERGY_THRESHOLD,
            max_energy: MAX_ENERGY,
            decay_rate: ENERGY_DECAY_RATE,
            negligible_energy: NEGLIGIBLE_ENERGY,
            flick_min_velocity: FLICK_MIN_VELOCITY,
            flick_max_duration_ms: FLICK_MAX_DURATION_MS,
            touch_sample_window: TOUCH_SAMPLE_WINDOW,
            resize_debounce_ms: RESIZE_DEBOUNCE_MS,
            easing: Easing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: SnapConfig =
            serde_json::from_str(r#"{ "cooldown_ms": 250.0, "easing": "quart_in_out" }"#).unwrap();
        assert_eq!(cfg.cooldown_ms, 250.0);
        assert_eq!(cfg.easing, Easing::QuartInOut);
        assert_eq!(cfg.decay_rate, ENERGY_DECAY_RATE);
        assert_eq!(cfg.touch_sample_window, TOUCH_SAMPLE_WINDOW);
    }
}
