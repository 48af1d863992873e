use std::cell::RefCell;
use std::rc::Rc;

use formats::SceneManifest;
use foundation::math::mat4_transform_point;
use gpu::{RecordingBackend, TextureData};
use pretty_assertions::assert_eq;
use runtime::ManualFrameScheduler;
use scene::world::{TextureId, TextureState};
use viewer::{
    Host, ManualClickSource, MemoryAssetLoader, MountedView, Navigator, OpenTarget,
    RecordingNavigator, SessionError, Viewport,
};

type SharedBackend = Rc<RefCell<RecordingBackend>>;

struct Harness {
    scheduler: ManualFrameScheduler,
    clicks: ManualClickSource,
    navigator: RecordingNavigator,
    backend: SharedBackend,
    view: MountedView,
}

const VIEWPORT: Viewport = Viewport {
    width: 1200.0,
    height: 900.0,
};

fn mount_with(manifest: &SceneManifest, assets: Rc<MemoryAssetLoader>) -> Harness {
    let scheduler = ManualFrameScheduler::new();
    let clicks = ManualClickSource::new();
    let navigator = RecordingNavigator::new();
    let backend = SharedBackend::default();
    let view = MountedView::setup(
        manifest,
        VIEWPORT,
        Host {
            scheduler: Rc::new(scheduler.clone()),
            clicks: Rc::new(clicks.clone()),
            navigator: Rc::new(navigator.clone()),
            assets,
            backend: Box::new(backend.clone()),
        },
    )
    .expect("default manifest mounts");
    Harness {
        scheduler,
        clicks,
        navigator,
        backend,
        view,
    }
}

fn mount() -> Harness {
    mount_with(&SceneManifest::default(), Rc::new(MemoryAssetLoader::new()))
}

fn body_on_screen(view: &MountedView, index: usize) -> (f64, f64) {
    view.with_session(|s| {
        let p = s.orbits().position(index).expect("body");
        let ndc = mat4_transform_point(s.camera().view_proj(), p);
        (
            (ndc.x + 1.0) * 0.5 * VIEWPORT.width,
            (1.0 - ndc.y) * 0.5 * VIEWPORT.height,
        )
    })
    .expect("session idle")
}

#[test]
fn ticks_render_once_per_frame() {
    let h = mount();
    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.scheduler.run_frames(5), 5);

    assert_eq!(h.view.frames_run(), 5);
    assert_eq!(h.backend.borrow().frames_rendered(), 5);
    assert_eq!(h.view.with_session(|s| s.ticks()), Some(5));
    assert_eq!(h.backend.borrow().size(), (1200, 900));
}

#[test]
fn click_on_moving_icon_opens_its_link() {
    let h = mount();
    h.scheduler.run_frames(120);

    let (x, y) = body_on_screen(&h.view, 3);
    assert_eq!(h.clicks.click(x, y), 1);
    assert_eq!(h.navigator.urls(), vec!["https://www.tiktok.com/@jlnmrshll".to_string()]);
}

#[test]
fn teardown_stops_ticks_and_clicks() {
    let mut h = mount();
    h.scheduler.run_frames(3);
    let (x, y) = body_on_screen(&h.view, 0);

    h.view.teardown();
    assert!(!h.view.is_mounted());
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.clicks.listener_count(), 0);
    assert!(h.backend.borrow().is_disposed());

    assert_eq!(h.scheduler.run_frames(10), 0);
    assert_eq!(h.clicks.click(x, y), 0);
    assert!(h.navigator.opened().is_empty());
    assert_eq!(h.backend.borrow().frames_rendered(), 3);
}

#[test]
fn callback_dequeued_before_teardown_runs_nothing() {
    let mut h = mount();
    h.scheduler.run_frames(2);

    // The host already pulled the next callback off its queue.
    let in_flight = h.scheduler.take_pending();
    h.view.teardown();
    for callback in in_flight {
        callback();
    }

    assert_eq!(h.backend.borrow().frames_rendered(), 2);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn teardown_before_first_tick_is_safe_and_idempotent() {
    let mut h = mount();
    h.view.teardown();
    h.view.teardown();
    assert_eq!(h.backend.borrow().frames_rendered(), 0);
    assert_eq!(h.scheduler.run_pending(), 0);
    drop(h.view);
    assert!(h.backend.borrow().is_disposed());
}

/// Unmounts the view it shares with the page as soon as a link opens.
struct UnmountOnOpen {
    view: Rc<RefCell<Option<MountedView>>>,
}

impl Navigator for UnmountOnOpen {
    fn open(&self, _url: &str, _target: OpenTarget) {
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.teardown();
        }
    }
}

#[test]
fn teardown_from_inside_a_click_releases_the_surface() {
    let scheduler = ManualFrameScheduler::new();
    let clicks = ManualClickSource::new();
    let backend = SharedBackend::default();
    let slot: Rc<RefCell<Option<MountedView>>> = Rc::default();
    let view = MountedView::setup(
        &SceneManifest::default(),
        VIEWPORT,
        Host {
            scheduler: Rc::new(scheduler.clone()),
            clicks: Rc::new(clicks.clone()),
            navigator: Rc::new(UnmountOnOpen { view: slot.clone() }),
            assets: Rc::new(MemoryAssetLoader::new()),
            backend: Box::new(backend.clone()),
        },
    )
    .expect("default manifest mounts");
    scheduler.run_frames(3);
    let (x, y) = body_on_screen(&view, 0);
    *slot.borrow_mut() = Some(view);

    assert_eq!(clicks.click(x, y), 1);

    // The view is still held by the page, yet the surface is already gone.
    let borrowed = slot.borrow();
    let view = borrowed.as_ref().expect("view kept");
    assert!(!view.is_mounted());
    assert!(backend.borrow().is_disposed());
    assert_eq!(clicks.listener_count(), 0);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn dropping_the_view_tears_it_down() {
    let h = mount();
    let Harness {
        scheduler,
        clicks,
        backend,
        view,
        ..
    } = h;
    drop(view);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(clicks.listener_count(), 0);
    assert!(backend.borrow().is_disposed());
}

#[test]
fn late_textures_are_applied_while_mounted() {
    let assets = Rc::new(
        MemoryAssetLoader::deferred().with_texture("/earthmap1k.jpg", TextureData::solid([0, 80, 200, 255])),
    );
    let h = mount_with(&SceneManifest::default(), assets.clone());
    h.scheduler.run_frames(2);
    assert_eq!(assets.queued(), 6);
    assert_eq!(assets.flush(), 6);

    let states: Vec<TextureState> = h
        .view
        .with_session(|s| s.world().textures().map(|(_, t)| t.state.clone()).collect())
        .expect("session idle");
    assert_eq!(states[0], TextureState::Ready);
    assert!(states[1..].iter().all(|s| matches!(s, TextureState::Failed(_))));

    // Failed textures never stop the animation.
    h.scheduler.run_frames(2);
    assert_eq!(h.backend.borrow().frames_rendered(), 4);
    let frame = h.backend.borrow().last_frame().cloned().expect("frame");
    assert!(frame.meshes.iter().any(|m| m.material.texture.is_some()));
}

#[test]
fn textures_arriving_after_teardown_are_ignored() {
    let assets = Rc::new(
        MemoryAssetLoader::deferred().with_texture("/earthmap1k.jpg", TextureData::solid([0, 80, 200, 255])),
    );
    let mut h = mount_with(&SceneManifest::default(), assets.clone());
    h.view.teardown();
    assert_eq!(assets.flush(), 6);
    assert!(!h.backend.borrow().has_texture(TextureId(0)));
}

#[test]
fn invalid_manifest_registers_nothing() {
    let manifest = SceneManifest {
        links: Vec::new(),
        ..SceneManifest::default()
    };
    let scheduler = ManualFrameScheduler::new();
    let clicks = ManualClickSource::new();
    let err = MountedView::setup(
        &manifest,
        VIEWPORT,
        Host {
            scheduler: Rc::new(scheduler.clone()),
            clicks: Rc::new(clicks.clone()),
            navigator: Rc::new(RecordingNavigator::new()),
            assets: Rc::new(MemoryAssetLoader::new()),
            backend: Box::new(RecordingBackend::new()),
        },
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::Manifest(_)));
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(clicks.listener_count(), 0);
}

#[test]
fn resize_reaches_backend_and_picker() {
    let h = mount();
    h.view.resize(Viewport::new(600.0, 900.0));
    assert_eq!(h.backend.borrow().size(), (600, 900));
    assert_eq!(
        h.view.with_session(|s| s.viewport()),
        Some(Viewport::new(600.0, 900.0))
    );
}
