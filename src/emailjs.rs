//! Bindings to the EmailJS browser SDK loaded by the page as `window.emailjs`.

use gloo_timers::callback::Timeout;
use log::{debug, error, info};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::{js_error_text, NavError};

const INIT_RETRY_MS: u32 = 200;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = emailjs, js_name = init, catch)]
    fn emailjs_init(options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = emailjs, js_name = send, catch)]
    fn emailjs_send(service_id: &str, template_id: &str, params: &JsValue) -> Result<js_sys::Promise, JsValue>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitOptions<'a> {
    public_key: &'a str,
}

/// Whether the SDK script has loaded.
pub fn is_available() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("emailjs")).unwrap_or(false)
}

/// Initialise with the options object, falling back to the legacy
/// string-key form.
pub fn init(public_key: &str) -> Result<(), NavError> {
    let options = serde_wasm_bindgen::to_value(&InitOptions { public_key })
        .map_err(|e| NavError::Dom(e.to_string()))?;
    if let Err(e) = emailjs_init(&options) {
        debug!("emailjs: options init failed ({}), trying legacy form", js_error_text(&e));
        emailjs_init(&JsValue::from_str(public_key))?;
    }
    Ok(())
}

/// Initialise once the SDK shows up, polling a bounded number of times.
pub fn init_when_ready(public_key: &'static str, attempts_left: u32) {
    if is_available() {
        match init(public_key) {
            Ok(()) => info!("emailjs: initialised"),
            Err(e) => error!("emailjs: initialisation failed: {}", e),
        }
        return;
    }
    if attempts_left == 0 {
        error!("emailjs: SDK never became available");
        return;
    }
    Timeout::new(INIT_RETRY_MS, move || init_when_ready(public_key, attempts_left - 1)).forget();
}

/// Send `params` through a template; resolves with the SDK's response.
pub async fn send<T: Serialize>(service_id: &str, template_id: &str, params: &T) -> Result<JsValue, NavError> {
    let params = serde_wasm_bindgen::to_value(params).map_err(|e| NavError::Dom(e.to_string()))?;
    let promise = emailjs_send(service_id, template_id, &params)?;
    Ok(JsFuture::from(promise).await?)
}
