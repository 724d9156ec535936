use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    HtmlAudioElement,
    HtmlCanvasElement,
    HtmlElement,
    HtmlImageElement,
    Response,
};

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

// length of the fallback timer when requestAnimationFrame is unavailable
const FALLBACK_FRAME_MS: i32 = 1000 / 60;

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue> : map the JsValue error first, then
        // the missing context, then cast the Object
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn new_audio() -> Result<HtmlAudioElement> {
    HtmlAudioElement::new()
        .map_err(|err| anyhow!("Could not create audio element : {:#?}", err))
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

/// Schedules `callback` before the next repaint, or after ~1/60 s through
/// `setTimeout` when the browser refuses an animation frame.
/// The timer path calls back without a timestamp, so the callback sees `NaN`.
pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    let window = window()?;
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(handle) => Ok(handle),
        Err(err) => {
            log::warn!("requestAnimationFrame failed ({:?}), using timer", err);
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback.as_ref().unchecked_ref(),
                    FALLBACK_FRAME_MS,
                )
                .map_err(|err| anyhow!("Cannot schedule next frame : {:#?}", err))
        }
    }
}

pub fn set_timeout(callback: impl FnOnce() + 'static, millis: i32) -> Result<i32> {
    let callback = closure_once(callback);
    let handle = window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            millis,
        )
        .map_err(|err| anyhow!("Cannot set timeout : {:#?}", err))?;
    callback.forget();
    Ok(handle)
}

// ==================== DOM signaling ====================
fn html_element(selector: &str) -> Result<HtmlElement> {
    document()?
        .query_selector(selector)
        .map_err(|err| anyhow!("Invalid selector '{}' : {:#?}", selector, err))?
        .ok_or_else(|| anyhow!("No element matches '{}'", selector))?
        .dyn_into::<HtmlElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))
}

fn set_display(selector: &str, display: &str) -> Result<()> {
    html_element(selector)?
        .style()
        .set_property("display", display)
        .map_err(|err| anyhow!("Cannot set display of '{}' : {:#?}", selector, err))
}

pub fn show(selector: &str) -> Result<()> {
    set_display(selector, "block")
}

pub fn hide(selector: &str) -> Result<()> {
    set_display(selector, "none")
}

pub fn set_text(selector: &str, text: &str) -> Result<()> {
    html_element(selector)?.set_inner_text(text);
    Ok(())
}

/// Resolves on the first click on the element matching `selector`
pub async fn clicked(selector: &str) -> Result<()> {
    let element = html_element(selector)?;
    let (tx, rx) = channel::<()>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let on_click = closure_wrap(Box::new(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    }) as Box<dyn FnMut()>);
    element.set_onclick(Some(on_click.as_ref().unchecked_ref()));
    on_click.forget();

    rx.await
        .map_err(|err| anyhow!("Click listener on '{}' dropped : {:#?}", selector, err))
}

pub fn on_click(selector: &str, mut f: impl FnMut() + 'static) -> Result<()> {
    let element = html_element(selector)?;
    let on_click = closure_wrap(Box::new(move || f()) as Box<dyn FnMut()>);
    element.set_onclick(Some(on_click.as_ref().unchecked_ref()));
    on_click.forget();
    Ok(())
}

pub fn reload() -> Result<()> {
    window()?
        .location()
        .reload()
        .map_err(|err| anyhow!("Cannot reload page : {:#?}", err))
}

// ==================== Fetch ====================
/// GET `resource`, returning the HTTP status and the raw body text
pub async fn fetch_text(resource: &str) -> Result<(u16, String)> {
    let resp_value = JsFuture::from(window()?.fetch_with_str(resource))
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;

    let text = resp
        .text()
        .map_err(|err| anyhow!("Could not get text from response [{:#?}]", err))?;
    let body = JsFuture::from(text)
        .await
        .map_err(|err| anyhow!("error reading body [{:#?}]", err))?
        .as_string()
        .unwrap_or_default();

    Ok((resp.status(), body))
}

// ==================== Logging ====================
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from(format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Routes the `log` macros to the browser console
pub fn init_logging(level: log::LevelFilter) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|err| anyhow!("Logger already installed : {}", err))?;
    log::set_max_level(level);
    Ok(())
}
