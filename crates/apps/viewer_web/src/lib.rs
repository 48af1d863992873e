//! Browser entry points: mount the scene into a canvas and drive it from the
//! page's animation frames and clicks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formats::SceneManifest;
use tracing::{info, warn};
use viewer::{Host, MountedView, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod host;
mod wgpu;

use crate::host::{
    FetchAssetLoader, RafScheduler, WindowClickSource, WindowNavigator, fetch_manifest,
    init_logging,
};
use crate::wgpu::WgpuBackend;

thread_local! {
    static VIEW: RefCell<Option<MountedView>> = const { RefCell::new(None) };
    // Bumped on every mount and unmount so a slow async mount that lost the
    // race never installs its view.
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_logging();
    Ok(())
}

/// Mounts the default scene into the canvas with id `canvas_id`.
#[wasm_bindgen]
pub fn mount(canvas_id: String) {
    let generation = next_generation();
    spawn_local(async move {
        if let Err(err) = mount_inner(&canvas_id, SceneManifest::default(), generation).await {
            warn!(?err, "mount failed");
        }
    });
}

/// Like [`mount`], with the scene described by the JSON manifest at `url`.
#[wasm_bindgen]
pub fn mount_with_manifest(canvas_id: String, url: String) {
    let generation = next_generation();
    spawn_local(async move {
        let result = match fetch_manifest(&url).await {
            Ok(manifest) => mount_inner(&canvas_id, manifest, generation).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(?err, %url, "mount failed");
        }
    });
}

/// Stops the animation, removes the click listener and releases the canvas.
#[wasm_bindgen]
pub fn unmount() {
    next_generation();
}

#[wasm_bindgen]
pub fn resize(width: f64, height: f64) {
    VIEW.with(|v| {
        if let Some(view) = v.borrow().as_ref() {
            view.resize(Viewport::new(width, height));
        }
    });
}

#[wasm_bindgen]
pub fn is_mounted() -> bool {
    VIEW.with(|v| v.borrow().as_ref().is_some_and(MountedView::is_mounted))
}

/// Invalidates pending mounts and tears down the current view, so the
/// canvas is free for the next surface.
fn next_generation() -> u64 {
    let view = VIEW.with(|v| v.borrow_mut().take());
    // Dropped outside the borrow; teardown never calls back into `VIEW`.
    drop(view);
    GENERATION.with(|g| {
        let next = g.get().wrapping_add(1);
        g.set(next);
        next
    })
}

async fn mount_inner(
    canvas_id: &str,
    manifest: SceneManifest,
    generation: u64,
) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let viewport = window_viewport(&window)?;

    if let Some(canvas) = window
        .document()
        .and_then(|d| d.get_element_by_id(canvas_id))
        .and_then(|e| wasm_bindgen::JsCast::dyn_into::<web_sys::HtmlCanvasElement>(e).ok())
    {
        canvas.set_width(viewport.width as u32);
        canvas.set_height(viewport.height as u32);
    }

    let backend = WgpuBackend::from_canvas_id(canvas_id)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    if GENERATION.with(Cell::get) != generation {
        info!("mount superseded before the surface was ready");
        return Ok(());
    }

    let view = MountedView::setup(
        &manifest,
        viewport,
        Host {
            scheduler: Rc::new(RafScheduler::new(window.clone())),
            clicks: Rc::new(WindowClickSource::new(window.clone())),
            navigator: Rc::new(WindowNavigator::new(window)),
            assets: Rc::new(FetchAssetLoader),
            backend: Box::new(backend),
        },
    )
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    VIEW.with(|v| *v.borrow_mut() = Some(view));
    Ok(())
}

fn window_viewport(window: &web_sys::Window) -> Result<Viewport, JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Viewport::new(width, height))
}
