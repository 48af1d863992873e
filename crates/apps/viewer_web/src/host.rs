//! Browser implementations of the viewer's host services.

use std::io::Write;

use gloo_net::http::Request;
use runtime::{FrameScheduler, RequestId, Subscription};
use tracing::{debug, warn};
use tracing_subscriber::fmt::MakeWriter;
use viewer::{
    AssetCallback, AssetError, AssetLoader, ClickHandler, ClickSource, Navigator, OpenTarget,
    PointerClick, decode_texture,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// `requestAnimationFrame` on the page's window.
pub struct RafScheduler {
    window: web_sys::Window,
}

impl RafScheduler {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl FrameScheduler for RafScheduler {
    fn request(&self, callback: Box<dyn FnOnce()>) -> RequestId {
        // Freed by wasm-bindgen after its single call. A cancelled request
        // leaks the closure, at most once per teardown.
        let f = Closure::once_into_js(move || callback());
        match self.window.request_animation_frame(f.unchecked_ref()) {
            Ok(handle) => RequestId(handle as u64),
            Err(err) => {
                warn!(?err, "requestAnimationFrame failed");
                RequestId(0)
            }
        }
    }

    fn cancel(&self, id: RequestId) {
        if let Err(err) = self.window.cancel_animation_frame(id.0 as i32) {
            warn!(?err, "cancelAnimationFrame failed");
        }
    }
}

/// `click` listener on the window, in client coordinates.
pub struct WindowClickSource {
    window: web_sys::Window,
}

impl WindowClickSource {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl ClickSource for WindowClickSource {
    fn subscribe(&self, mut handler: ClickHandler) -> Subscription {
        let listener = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |event: web_sys::MouseEvent| {
            handler(PointerClick {
                x: event.client_x() as f64,
                y: event.client_y() as f64,
                button: event.button(),
            });
        });
        if let Err(err) = self
            .window
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        {
            warn!(?err, "failed to register click listener");
        }

        let window = self.window.clone();
        Subscription::new("window-click", move || {
            let _ = window.remove_event_listener_with_callback(
                "click",
                listener.as_ref().unchecked_ref::<js_sys::Function>(),
            );
            drop(listener);
        })
    }
}

/// Opens links with `window.open`.
pub struct WindowNavigator {
    window: web_sys::Window,
}

impl WindowNavigator {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl Navigator for WindowNavigator {
    fn open(&self, url: &str, target: OpenTarget) {
        let target = match target {
            OpenTarget::NewContext => "_blank",
        };
        match self.window.open_with_url_and_target(url, target) {
            // Popup blockers return null rather than an error.
            Ok(None) => debug!(url, "window.open was blocked"),
            Ok(Some(_)) => {}
            Err(err) => warn!(url, ?err, "window.open failed"),
        }
    }
}

/// Fetches textures relative to the page and decodes them off the tick path.
#[derive(Debug, Default)]
pub struct FetchAssetLoader;

impl AssetLoader for FetchAssetLoader {
    fn load(&self, path: &str, done: AssetCallback) {
        let path = path.to_string();
        spawn_local(async move {
            let result = fetch_texture(&path).await;
            done(result);
        });
    }
}

async fn fetch_texture(path: &str) -> Result<gpu::TextureData, AssetError> {
    let fetch_err = |e: gloo_net::Error| AssetError::Fetch {
        path: path.to_string(),
        reason: e.to_string(),
    };
    let resp = Request::get(path).send().await.map_err(fetch_err)?;
    if resp.status() == 404 {
        return Err(AssetError::NotFound {
            path: path.to_string(),
        });
    }
    if let Some(reason) = http_failure(resp.status()) {
        return Err(AssetError::Fetch {
            path: path.to_string(),
            reason,
        });
    }
    let bytes = resp.binary().await.map_err(fetch_err)?;
    decode_texture(path, &bytes)
}

pub async fn fetch_manifest(url: &str) -> Result<formats::SceneManifest, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if let Some(reason) = http_failure(resp.status()) {
        return Err(JsValue::from_str(&format!("{url}: {reason}")));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    formats::SceneManifest::from_json_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// `None` for a 2xx status.
fn http_failure(status: u16) -> Option<String> {
    (!(200..300).contains(&status)).then(|| format!("HTTP {status}"))
}

/// Routes `tracing` output to the browser console, one call per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMakeWriter;

pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter { buf: Vec::new() }
    }
}

/// Panic hook and log subscriber. Safe to call more than once.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // No clock on wasm32-unknown-unknown, so events carry no timestamp.
    let _ = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}
