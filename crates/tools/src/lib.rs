//! Headless scene runs for the `moonlinks` command line.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use formats::SceneManifest;
use foundation::math::mat4_transform_point;
use gpu::RecordingBackend;
use runtime::ManualFrameScheduler;
use scene::world::TextureState;
use serde::Serialize;
use tracing::info;
use viewer::{
    AssetCallback, AssetError, AssetLoader, Host, ManualClickSource, MemoryAssetLoader,
    MountedView, RecordingNavigator, SessionError, Viewport, decode_texture,
};

/// Loads textures from a directory; page-absolute paths resolve under it.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetLoader for FsAssetLoader {
    fn load(&self, path: &str, done: AssetCallback) {
        let file = self.resolve(path);
        let result = match fs::read(&file) {
            Ok(bytes) => decode_texture(path, &bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AssetError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(AssetError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        };
        done(result);
    }
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub viewport: Viewport,
    pub ticks: usize,
    /// Client-pixel clicks, delivered in order after the last tick.
    pub clicks: Vec<(f64, f64)>,
    /// Texture directory. Without one every texture load fails and the scene
    /// falls back to untextured materials.
    pub assets: Option<PathBuf>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1280.0, 720.0),
            ticks: 60,
            clicks: Vec::new(),
            assets: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyReport {
    pub index: usize,
    pub position: [f64; 3],
    pub screen: Option<[f64; 2]>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickReport {
    pub x: f64,
    pub y: f64,
    pub body: Option<usize>,
    pub opened: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub manifest_hash: String,
    pub ticks: u64,
    pub frames_rendered: u64,
    pub mesh_uploads: usize,
    pub textures_ready: usize,
    pub textures_failed: usize,
    pub bodies: Vec<BodyReport>,
    pub clicks: Vec<ClickReport>,
}

/// Mounts `manifest` on in-memory host services, runs `options.ticks` frames,
/// replays the clicks and tears the view down.
pub fn simulate(
    manifest: &SceneManifest,
    options: &SimulateOptions,
) -> Result<SimulationReport, SessionError> {
    let scheduler = ManualFrameScheduler::new();
    let clicks = ManualClickSource::new();
    let navigator = RecordingNavigator::new();
    let backend = Rc::new(RefCell::new(RecordingBackend::new()));
    let assets: Rc<dyn AssetLoader> = match &options.assets {
        Some(dir) => Rc::new(FsAssetLoader::new(dir)),
        None => Rc::new(MemoryAssetLoader::new()),
    };

    let mut view = MountedView::setup(
        manifest,
        options.viewport,
        Host {
            scheduler: Rc::new(scheduler.clone()),
            clicks: Rc::new(clicks.clone()),
            navigator: Rc::new(navigator.clone()),
            assets,
            backend: Box::new(backend.clone()),
        },
    )?;
    scheduler.run_frames(options.ticks);

    let mut click_reports = Vec::with_capacity(options.clicks.len());
    for &(x, y) in &options.clicks {
        let body = view.with_session(|s| s.resolve_click(x, y)).flatten();
        let before = navigator.urls().len();
        clicks.click(x, y);
        let opened = navigator.urls().get(before).cloned();
        click_reports.push(ClickReport {
            x,
            y,
            body,
            opened,
        });
    }

    let (ticks, bodies, textures_ready, textures_failed) = view
        .with_session(|s| {
            let bodies = (0..s.orbits().len())
                .filter_map(|index| {
                    let p = s.orbits().position(index)?;
                    let ndc = mat4_transform_point(s.camera().view_proj(), p);
                    let vp = s.viewport();
                    let on_screen = ndc.x.abs() <= 1.0
                        && ndc.y.abs() <= 1.0
                        && (0.0..=1.0).contains(&ndc.z);
                    Some(BodyReport {
                        index,
                        position: [p.x, p.y, p.z],
                        screen: on_screen.then(|| {
                            [
                                (ndc.x + 1.0) * 0.5 * vp.width,
                                (1.0 - ndc.y) * 0.5 * vp.height,
                            ]
                        }),
                        url: s.links().get(index).map(str::to_string),
                    })
                })
                .collect();
            let (ready, failed) =
                s.world()
                    .textures()
                    .fold((0, 0), |(r, f), (_, t)| match t.state {
                        TextureState::Ready => (r + 1, f),
                        TextureState::Failed(_) => (r, f + 1),
                        TextureState::Pending => (r, f),
                    });
            (s.ticks(), bodies, ready, failed)
        })
        .unwrap_or_default();

    view.teardown();
    let backend = backend.borrow();
    info!(ticks, frames = backend.frames_rendered(), "simulation finished");
    Ok(SimulationReport {
        manifest_hash: manifest.content_hash()?,
        ticks,
        frames_rendered: backend.frames_rendered(),
        mesh_uploads: backend.mesh_uploads(),
        textures_ready,
        textures_failed,
        bodies,
        clicks: click_reports,
    })
}

#[cfg(test)]
mod tests {
    use super::{FsAssetLoader, SimulateOptions, simulate};
    use formats::SceneManifest;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn resolves_page_paths_under_the_root() {
        let loader = FsAssetLoader::new("/srv/public");
        assert_eq!(
            loader.resolve("/earthmap1k.jpg"),
            PathBuf::from("/srv/public/earthmap1k.jpg")
        );
    }

    #[test]
    fn default_scene_runs_and_clicks_resolve() {
        let manifest = SceneManifest::default();
        let warmup = simulate(
            &manifest,
            &SimulateOptions {
                ticks: 30,
                ..SimulateOptions::default()
            },
        )
        .expect("simulate");
        assert_eq!(warmup.ticks, 30);
        assert_eq!(warmup.frames_rendered, 30);
        assert_eq!(warmup.bodies.len(), 4);
        assert_eq!(warmup.textures_failed, 6);

        // The run is deterministic, so a second run can aim at a body the
        // first one located.
        let target = warmup
            .bodies
            .iter()
            .find_map(|b| b.screen.map(|s| (b.index, s)))
            .expect("a body on screen");
        let report = simulate(
            &manifest,
            &SimulateOptions {
                ticks: 30,
                clicks: vec![(target.1[0], target.1[1]), (0.0, 0.0)],
                ..SimulateOptions::default()
            },
        )
        .expect("simulate");

        assert_eq!(report.clicks[0].body, Some(target.0));
        assert_eq!(
            report.clicks[0].opened.as_deref(),
            manifest.link_urls().get(target.0).map(String::as_str)
        );
        assert_eq!(report.clicks[1].body, None);
        assert_eq!(report.clicks[1].opened, None);
    }
}
