use std::collections::HashMap;
use std::rc::Rc;

use foundation::math::Vec3;
use formats::{BodyKind, ManifestError, RadiusConfig, SceneManifest};
use gpu::{MeshCache, RenderBackend, Renderer, TextureData};
use runtime::Frame;
use scene::World;
use scene::camera::Camera3D;
use scene::entity::EntityId;
use scene::geometry::{Extrusion, GeometryError, RoundedRect};
use scene::orbit::{OrbitModel, RadiusLayout};
use scene::prefabs::{
    IconTemplate, Spin, Starfield, spawn_globe, spawn_icon, spawn_nebula, spawn_placeholder,
};
use scene::world::{TextureId, TextureState};
use tracing::{debug, info, warn};

use crate::assets::AssetError;
use crate::input::PointerClick;
use crate::links::{LinkTable, NavigationDispatcher, Navigator};
use crate::picker::{PointerPicker, Viewport};

const PLACEHOLDER_COLOR: [f32; 4] = [0.8, 0.8, 0.85, 1.0];

#[derive(Debug)]
pub enum SessionError {
    Manifest(ManifestError),
    Geometry(GeometryError),
    LinkCountMismatch { links: usize, bodies: usize },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Manifest(e) => write!(f, "scene manifest error: {e}"),
            SessionError::Geometry(e) => write!(f, "icon geometry error: {e}"),
            SessionError::LinkCountMismatch { links, bodies } => {
                write!(f, "{links} links for {bodies} orbiting bodies")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ManifestError> for SessionError {
    fn from(e: ManifestError) -> Self {
        SessionError::Manifest(e)
    }
}

impl From<GeometryError> for SessionError {
    fn from(e: GeometryError) -> Self {
        SessionError::Geometry(e)
    }
}

/// Everything one mounted scene owns: world, camera, orbits, links and the
/// draw surface.
pub struct SceneSession {
    world: World,
    camera: Camera3D,
    orbits: OrbitModel,
    globe: EntityId,
    globe_spin: Spin,
    nebula: Option<(EntityId, Spin)>,
    starfield: Starfield,
    picker: PointerPicker,
    dispatcher: NavigationDispatcher,
    backend: Box<dyn RenderBackend>,
    meshes: MeshCache,
    texture_paths: Vec<(TextureId, String)>,
    ticks: u64,
    torn_down: bool,
}

impl SceneSession {
    pub fn build(
        manifest: &SceneManifest,
        viewport: Viewport,
        navigator: Rc<dyn Navigator>,
        mut backend: Box<dyn RenderBackend>,
    ) -> Result<Self, SessionError> {
        manifest.validate()?;

        let icon = &manifest.icons;
        let rect = RoundedRect::new(icon.width, icon.height, icon.corner_radius)?;
        let extrusion = Extrusion {
            depth: icon.depth,
            bevel_thickness: icon.bevel_thickness,
            bevel_size: icon.bevel_size,
        };

        let mut world = World::new();
        let mut slots: HashMap<String, TextureId> = HashMap::new();
        let mut texture_paths = Vec::new();
        let mut texture = |world: &mut World, path: Option<&String>| -> Option<TextureId> {
            let path = path?;
            let id = *slots.entry(path.clone()).or_insert_with(|| {
                let id = world.add_texture(path.clone());
                texture_paths.push((id, path.clone()));
                id
            });
            Some(id)
        };

        let globe_texture = texture(&mut world, manifest.globe.texture.as_ref());
        let globe = spawn_globe(&mut world, manifest.globe.radius, globe_texture);

        let nebula = match &manifest.nebula {
            Some(cfg) => {
                let tex = texture(&mut world, cfg.texture.as_ref());
                let entity = spawn_nebula(&mut world, cfg.radius, cfg.opacity, tex);
                Some((entity, Spin::about_y(cfg.spin_y)))
            }
            None => None,
        };

        let stars = &manifest.stars;
        let starfield = Starfield::spawn(&mut world, stars.count, stars.extent, stars.jitter, stars.seed);

        let template = match manifest.orbit.body {
            BodyKind::Icon => Some(IconTemplate::register(
                &mut world,
                &rect,
                extrusion,
                icon.curve_divisions,
            )?),
            BodyKind::Sphere => None,
        };
        let mut bodies = Vec::with_capacity(manifest.links.len());
        for link in &manifest.links {
            let entity = match template {
                Some(template) => {
                    let tex = texture(&mut world, link.icon.as_ref());
                    spawn_icon(&mut world, template, tex)
                }
                None => spawn_placeholder(&mut world, manifest.orbit.sphere_radius, PLACEHOLDER_COLOR),
            };
            bodies.push(entity);
        }

        let layout = match manifest.orbit.radius {
            RadiusConfig::Uniform { radius } => RadiusLayout::Uniform(radius),
            RadiusConfig::Staggered { base, step } => RadiusLayout::Staggered { base, step },
        };
        let orbits = OrbitModel::evenly_spaced(&bodies, layout, manifest.orbit.speed);
        orbits.place(&mut world);

        let links = LinkTable::new(manifest.link_urls());
        if links.len() != orbits.len() {
            return Err(SessionError::LinkCountMismatch {
                links: links.len(),
                bodies: orbits.len(),
            });
        }

        let cam = &manifest.camera;
        let mut camera = Camera3D::look_at(
            Vec3::new(0.0, 0.0, cam.distance),
            Vec3::ZERO,
            cam.fov_deg.to_radians(),
            cam.near,
            cam.far,
        );
        if let Some(aspect) = viewport.aspect() {
            camera.set_aspect(aspect);
        }
        backend.resize(viewport.width as u32, viewport.height as u32);

        info!(
            bodies = orbits.len(),
            stars = starfield.stars().len(),
            textures = texture_paths.len(),
            "scene session built"
        );

        Ok(Self {
            world,
            camera,
            orbits,
            globe,
            globe_spin: Spin {
                x: manifest.globe.spin_x,
                y: manifest.globe.spin_y,
            },
            nebula,
            starfield,
            picker: PointerPicker::new(viewport),
            dispatcher: NavigationDispatcher::new(links, navigator),
            backend,
            meshes: MeshCache::new(),
            texture_paths,
            ticks: 0,
            torn_down: false,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn orbits(&self) -> &OrbitModel {
        &self.orbits
    }

    pub fn globe(&self) -> EntityId {
        self.globe
    }

    pub fn links(&self) -> &LinkTable {
        self.dispatcher.links()
    }

    pub fn viewport(&self) -> Viewport {
        self.picker.viewport()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Texture slots still waiting for their image, with their paths.
    pub fn texture_requests(&self) -> Vec<(TextureId, String)> {
        self.texture_paths
            .iter()
            .filter(|(id, _)| {
                matches!(
                    self.world.texture(*id).map(|t| &t.state),
                    Some(TextureState::Pending)
                )
            })
            .cloned()
            .collect()
    }

    /// One animation step: spin the globe, advance the orbits, drift the
    /// decoration, then draw.
    pub fn tick(&mut self, frame: Frame) {
        if self.torn_down {
            return;
        }
        self.globe_spin.apply(&mut self.world, self.globe);
        self.orbits.advance(&mut self.world);
        if let Some((nebula, spin)) = self.nebula {
            spin.apply(&mut self.world, nebula);
        }
        self.starfield.update(&mut self.world);
        self.render();

        self.ticks += 1;
        if frame.index == 0 {
            debug!("first frame rendered");
        }
    }

    fn render(&mut self) {
        let frame = Renderer::collect_3d(&self.world, &self.camera);
        let result = self
            .meshes
            .sync(&self.world, &frame, self.backend.as_mut())
            .and_then(|()| self.backend.render(&frame));
        if let Err(err) = result {
            warn!(%err, "frame not rendered");
        }
    }

    /// Body index under the pixel `(x, y)`. Reads current positions only.
    pub fn resolve_click(&self, x: f64, y: f64) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        self.picker.resolve(&self.world, &self.camera, &self.orbits, x, y)
    }

    /// Resolves a click and opens the matching link. Returns the opened URL.
    pub fn handle_click(&self, click: PointerClick) -> Option<String> {
        if self.torn_down || !click.is_primary() {
            return None;
        }
        let index = self.resolve_click(click.x, click.y)?;
        self.dispatcher.dispatch(index).map(str::to_string)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if self.torn_down {
            return;
        }
        self.picker.set_viewport(viewport);
        if let Some(aspect) = viewport.aspect() {
            self.camera.set_aspect(aspect);
        }
        self.backend.resize(viewport.width as u32, viewport.height as u32);
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
    }

    /// Stores a finished texture load. A failure leaves the slot untextured.
    pub fn apply_texture(&mut self, id: TextureId, result: Result<TextureData, AssetError>) {
        if self.torn_down {
            debug!(?id, "texture arrived after teardown");
            return;
        }
        let uploaded = result.and_then(|data| {
            self.backend
                .upload_texture(id, &data)
                .map_err(AssetError::Texture)
        });
        let state = match uploaded {
            Ok(()) => TextureState::Ready,
            Err(err) => {
                warn!(?id, %err, "texture unavailable, drawing untextured");
                TextureState::Failed(err.to_string())
            }
        };
        self.world.set_texture_state(id, state);
    }

    /// Releases the draw surface. Later ticks, clicks and texture loads are
    /// ignored. Idempotent.
    pub fn teardown(&mut self) {
        if std::mem::replace(&mut self.torn_down, true) {
            return;
        }
        self.backend.dispose();
        self.meshes.clear();
        info!(ticks = self.ticks, "scene session torn down");
    }
}

impl Drop for SceneSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SceneSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneSession")
            .field("bodies", &self.orbits.len())
            .field("ticks", &self.ticks)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{SceneSession, SessionError};
    use crate::input::PointerClick;
    use crate::links::RecordingNavigator;
    use crate::picker::Viewport;
    use formats::{BodyKind, RadiusConfig, SceneManifest};
    use foundation::math::mat4_transform_point;
    use gpu::RecordingBackend;
    use pretty_assertions::assert_eq;
    use runtime::Frame;
    use std::rc::Rc;

    fn build(manifest: &SceneManifest) -> (SceneSession, RecordingNavigator) {
        let navigator = RecordingNavigator::new();
        let session = SceneSession::build(
            manifest,
            Viewport::new(1000.0, 800.0),
            Rc::new(navigator.clone()),
            Box::new(RecordingBackend::new()),
        )
        .expect("valid manifest");
        (session, navigator)
    }

    fn screen_of_body(session: &SceneSession, index: usize) -> (f64, f64) {
        let p = session.orbits().position(index).expect("body");
        let ndc = mat4_transform_point(session.camera().view_proj(), p);
        let v = session.viewport();
        ((ndc.x + 1.0) * 0.5 * v.width, (1.0 - ndc.y) * 0.5 * v.height)
    }

    #[test]
    fn default_manifest_builds_four_icons() {
        let (session, _) = build(&SceneManifest::default());
        assert_eq!(session.orbits().len(), 4);
        assert_eq!(session.links().len(), 4);
        assert!((session.camera().aspect - 1.25).abs() < 1e-12);
        // Globe, nebula and four distinct icons.
        assert_eq!(session.texture_requests().len(), 6);
    }

    #[test]
    fn tick_advances_orbits_and_spins_globe() {
        let (mut session, _) = build(&SceneManifest::default());
        let start = session.orbits().body(0).expect("body").angle;
        let mut frame = Frame::first(1.0 / 60.0);
        for _ in 0..10 {
            session.tick(frame);
            frame = frame.next();
        }
        let body = session.orbits().body(0).expect("body");
        assert!((body.angle - (start + 0.02)).abs() < 1e-12);
        let globe = session.world().transform(session.globe()).expect("globe");
        assert!((globe.rotation.y - 0.1).abs() < 1e-12);
        assert_eq!(session.ticks(), 10);
    }

    #[test]
    fn click_on_body_opens_its_link() {
        let (mut session, navigator) = build(&SceneManifest::default());
        session.tick(Frame::first(1.0 / 60.0));

        for i in 0..4 {
            let (x, y) = screen_of_body(&session, i);
            let url = session.handle_click(PointerClick::primary(x, y));
            assert_eq!(url.as_deref(), session.links().get(i));
        }
        assert_eq!(navigator.urls(), session.links().iter().map(str::to_string).collect::<Vec<_>>());
    }

    #[test]
    fn clicks_on_empty_space_do_nothing() {
        let (session, navigator) = build(&SceneManifest::default());
        assert_eq!(session.handle_click(PointerClick::primary(500.0, 400.0)), None);
        let (x, y) = screen_of_body(&session, 0);
        let secondary = PointerClick { x, y, button: 2 };
        assert_eq!(session.handle_click(secondary), None);
        assert!(navigator.opened().is_empty());
    }

    #[test]
    fn resize_updates_camera_and_picker() {
        let (mut session, _) = build(&SceneManifest::default());
        session.resize(Viewport::new(400.0, 800.0));
        assert!((session.camera().aspect - 0.5).abs() < 1e-12);
        let (x, y) = screen_of_body(&session, 1);
        assert_eq!(session.resolve_click(x, y), Some(1));
    }

    #[test]
    fn sphere_bodies_on_staggered_orbits() {
        let mut manifest = SceneManifest::default();
        manifest.orbit.body = BodyKind::Sphere;
        manifest.orbit.radius = RadiusConfig::Staggered {
            base: 2.0,
            step: 0.5,
        };
        let (session, _) = build(&manifest);
        let radii: Vec<f64> = session.orbits().bodies().iter().map(|b| b.radius).collect();
        assert_eq!(radii, vec![2.0, 2.5, 3.0, 3.5]);
        let (x, y) = screen_of_body(&session, 2);
        assert_eq!(session.resolve_click(x, y), Some(2));
    }

    #[test]
    fn oversized_corner_radius_is_a_configuration_error() {
        let mut manifest = SceneManifest::default();
        manifest.icons.corner_radius = 0.8;
        let err = SceneSession::build(
            &manifest,
            Viewport::new(100.0, 100.0),
            Rc::new(RecordingNavigator::new()),
            Box::new(RecordingBackend::new()),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Geometry(_)));
    }

    #[test]
    fn torn_down_session_ignores_everything() {
        let (mut session, navigator) = build(&SceneManifest::default());
        let (x, y) = screen_of_body(&session, 0);
        session.teardown();
        session.teardown();
        session.tick(Frame::first(1.0 / 60.0));
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.handle_click(PointerClick::primary(x, y)), None);
        assert!(navigator.opened().is_empty());
    }
}
