//! Generic "GET some JSON and hand it to a callback" helper.
//!
//! Failures never escape as errors: they are turned into an object shaped
//! `{ "result": "error", "msg": "..." }` and delivered like any other response.
use crate::browser;
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

pub const ERROR_RESULT: &str = "error";

pub fn error_object(msg: impl Into<String>) -> Value {
    json!({ "result": ERROR_RESULT, "msg": msg.into() })
}

/// The message of an error object, `None` for regular payloads
pub fn error_message(value: &Value) -> Option<&str> {
    if value.get("result").and_then(Value::as_str) != Some(ERROR_RESULT) {
        return None;
    }
    Some(value.get("msg").and_then(Value::as_str).unwrap_or_default())
}

/// Maps an HTTP status and body to the value the callback receives
pub fn interpret_response(status: u16, body: &str) -> Value {
    if status != 200 {
        return error_object(format!("Ajax error, status: {}", status));
    }
    if body.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(body).unwrap_or_else(|err| {
        log::debug!("response is not JSON : {}", err);
        error_object(format!("JSON.parse exception.\n{}", body))
    })
}

pub async fn fetch_value(url: &str) -> Value {
    match browser::fetch_text(url).await {
        Ok((status, body)) => interpret_response(status, &body),
        Err(err) => error_object(format!("{:#}", err)),
    }
}

/// Typed variant: error objects and shape mismatches come back as `Err`
pub async fn fetch_json<T>(url: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    decode(fetch_value(url).await)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    if let Some(msg) = error_message(&value) {
        return Err(anyhow!("{}", msg));
    }
    serde_json::from_value(value).map_err(|err| anyhow!("unexpected response shape : {}", err))
}

/// JS entry point : `fetch(url, body, callback)`.
///
/// The request is a GET, so `body` is accepted but never sent. `callback` is
/// invoked exactly once with the parsed object or an error object.
#[wasm_bindgen(js_name = fetchJson)]
pub fn fetch(url: String, body: Option<String>, callback: js_sys::Function) {
    if body.is_some() {
        log::debug!("GET {} : request body dropped", url);
    }
    browser::spawn_local(async move {
        let value = fetch_value(&url).await;
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let js_value = match value.serialize(&serializer) {
            Ok(js_value) => js_value,
            Err(err) => {
                log::error!("cannot hand response of {} to JS : {}", url, err);
                return;
            }
        };
        if let Err(err) = callback.call1(&JsValue::NULL, &js_value) {
            log::error!("fetch callback for {} threw : {:?}", url, err);
        }
    });
}
