//! Setup and teardown of a scene inside a host view.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use formats::SceneManifest;
use gpu::RenderBackend;
use runtime::{AnimationDriver, DriverHandle, FrameScheduler, Subscription};
use tracing::{debug, info};

use crate::assets::AssetLoader;
use crate::input::ClickSource;
use crate::links::Navigator;
use crate::picker::Viewport;
use crate::session::{SceneSession, SessionError};

/// Nominal tick length handed to the driver.
pub const FRAME_DT_S: f64 = 1.0 / 60.0;

/// Host services a mounted view runs on.
pub struct Host {
    pub scheduler: Rc<dyn FrameScheduler>,
    pub clicks: Rc<dyn ClickSource>,
    pub navigator: Rc<dyn Navigator>,
    pub assets: Rc<dyn AssetLoader>,
    pub backend: Box<dyn RenderBackend>,
}

/// A running scene: session, click subscription and animation driver.
///
/// Teardown (explicit or on drop) disposes the click subscription, stops the
/// driver and releases the draw surface, in that order, before returning.
/// From inside a tick or click the surface is released as soon as that
/// callback returns.
pub struct MountedView {
    session: Rc<RefCell<SceneSession>>,
    alive: Rc<Cell<bool>>,
    release_pending: Rc<Cell<bool>>,
    subscription: Option<Subscription>,
    driver: Option<DriverHandle>,
}

impl MountedView {
    pub fn setup(
        manifest: &SceneManifest,
        viewport: Viewport,
        host: Host,
    ) -> Result<Self, SessionError> {
        let Host {
            scheduler,
            clicks,
            navigator,
            assets,
            backend,
        } = host;

        let session = SceneSession::build(manifest, viewport, navigator, backend)?;
        let requests = session.texture_requests();
        let session = Rc::new(RefCell::new(session));
        let alive = Rc::new(Cell::new(true));
        let release_pending = Rc::new(Cell::new(false));

        for (id, path) in requests {
            let target = Live::new(&session, &alive, &release_pending);
            assets.load(
                &path,
                Box::new(move |result| target.with(|s| s.apply_texture(id, result))),
            );
        }

        let target = Live::new(&session, &alive, &release_pending);
        let subscription = clicks.subscribe(Box::new(move |click| {
            target.with(|s| {
                s.handle_click(click);
            });
        }));

        let target = Live::new(&session, &alive, &release_pending);
        let driver = AnimationDriver::start(scheduler, FRAME_DT_S, move |frame| {
            target.with(|s| s.tick(frame));
        });

        info!(
            width = viewport.width,
            height = viewport.height,
            "scene mounted"
        );
        Ok(Self {
            session,
            alive,
            release_pending,
            subscription: Some(subscription),
            driver: Some(driver),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.alive.get()
    }

    /// Ticks the driver has started.
    pub fn frames_run(&self) -> u64 {
        self.driver.as_ref().map_or(0, DriverHandle::frames_run)
    }

    pub fn resize(&self, viewport: Viewport) {
        if !self.alive.get() {
            return;
        }
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.resize(viewport);
        }
    }

    /// Runs `f` against the session. `None` while a tick or click holds it.
    pub fn with_session<R>(&self, f: impl FnOnce(&SceneSession) -> R) -> Option<R> {
        self.session.try_borrow().ok().map(|s| f(&s))
    }

    /// Idempotent; safe before the first tick ever ran.
    pub fn teardown(&mut self) {
        if !self.alive.replace(false) {
            return;
        }
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
        if let Some(driver) = self.driver.take() {
            driver.stop();
        }
        match self.session.try_borrow_mut() {
            Ok(mut session) => session.teardown(),
            // Called from inside a tick or click; that callback finishes it.
            Err(_) => {
                debug!("session busy during teardown, release deferred");
                self.release_pending.set(true);
            }
        }
        info!("scene unmounted");
    }
}

impl Drop for MountedView {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for MountedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedView")
            .field("mounted", &self.is_mounted())
            .field("driver", &self.driver)
            .field("subscription", &self.subscription)
            .finish()
    }
}

/// Weak session reference that only runs while the view is mounted.
struct Live {
    session: Weak<RefCell<SceneSession>>,
    alive: Rc<Cell<bool>>,
    release_pending: Rc<Cell<bool>>,
}

impl Live {
    fn new(
        session: &Rc<RefCell<SceneSession>>,
        alive: &Rc<Cell<bool>>,
        release_pending: &Rc<Cell<bool>>,
    ) -> Self {
        Self {
            session: Rc::downgrade(session),
            alive: alive.clone(),
            release_pending: release_pending.clone(),
        }
    }

    fn with(&self, f: impl FnOnce(&mut SceneSession)) {
        if !self.alive.get() {
            return;
        }
        let Some(session) = self.session.upgrade() else {
            return;
        };
        match session.try_borrow_mut() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => {
                debug!("session busy, event dropped");
                return;
            }
        }
        if self.release_pending.replace(false) {
            if let Ok(mut guard) = session.try_borrow_mut() {
                guard.teardown();
            }
        }
    }
}
