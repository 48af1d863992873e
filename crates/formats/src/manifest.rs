//! JSON description of an orbiting-links scene.
//!
//! Every field has a default, so `{}` is a complete manifest apart from the
//! link list, which also defaults to the stock four links.

use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// Largest accepted `stars.count`.
pub const MAX_STARS: usize = 100_000;
/// Largest accepted `icons.curve_divisions`.
pub const MAX_CURVE_DIVISIONS: u32 = 256;

#[derive(Debug)]
pub enum ManifestError {
    Parse(serde_json::Error),
    UnsupportedVersion { found: String },
    Invalid { field: &'static str, reason: String },
    NoLinks,
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Parse(err) => write!(f, "manifest parse error: {err}"),
            ManifestError::UnsupportedVersion { found } => {
                write!(f, "unsupported manifest version: {found}")
            }
            ManifestError::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
            ManifestError::NoLinks => write!(f, "manifest lists no links"),
        }
    }
}

impl std::error::Error for ManifestError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneManifest {
    pub version: String,
    pub camera: CameraConfig,
    pub globe: GlobeConfig,
    /// `null` leaves the nebula out.
    pub nebula: Option<NebulaConfig>,
    pub stars: StarsConfig,
    pub icons: IconConfig,
    pub orbit: OrbitConfig,
    /// One orbiting body per entry, in order.
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Distance from the origin along +z.
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    pub radius: f64,
    pub texture: Option<String>,
    /// Radians per tick.
    pub spin_x: f64,
    pub spin_y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NebulaConfig {
    pub radius: f64,
    pub opacity: f32,
    pub texture: Option<String>,
    pub spin_y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarsConfig {
    pub count: usize,
    /// Stars start in `[-extent, extent]^3`.
    pub extent: f64,
    /// Largest per-axis drift per tick.
    pub jitter: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IconConfig {
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
    pub depth: f64,
    pub bevel_thickness: f64,
    pub bevel_size: f64,
    pub curve_divisions: u32,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Extruded rounded square carrying the link's icon texture.
    #[default]
    Icon,
    /// Solid sphere, used while icon art is missing.
    Sphere,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RadiusConfig {
    Uniform { radius: f64 },
    Staggered { base: f64, step: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: RadiusConfig,
    /// Radians per tick, shared by every body.
    pub speed: f64,
    pub body: BodyKind,
    /// Radius of [`BodyKind::Sphere`] bodies.
    pub sphere_radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl LinkEntry {
    pub fn new(url: impl Into<String>, icon: Option<&str>) -> Self {
        Self {
            url: url.into(),
            icon: icon.map(str::to_string),
        }
    }
}

impl Default for SceneManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            camera: CameraConfig::default(),
            globe: GlobeConfig::default(),
            nebula: Some(NebulaConfig::default()),
            stars: StarsConfig::default(),
            icons: IconConfig::default(),
            orbit: OrbitConfig::default(),
            links: vec![
                LinkEntry::new("https://www.instagram.com/jlnmrshll/", Some("/Instagram_Icon1.png")),
                LinkEntry::new("https://github.com/iamjalenmarshall", Some("/App_Icon2.png")),
                LinkEntry::new("https://www.youtube.com/@jlnmrshll", Some("/App_Icon3_3.png")),
                LinkEntry::new("https://www.tiktok.com/@jlnmrshll", Some("/App_Icon4.png")),
            ],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 110.0,
            near: 1.0,
            far: 1000.0,
            distance: 2.0,
        }
    }
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            texture: Some("/earthmap1k.jpg".to_string()),
            spin_x: 0.0001,
            spin_y: 0.01,
        }
    }
}

impl Default for NebulaConfig {
    fn default() -> Self {
        Self {
            radius: 90.0,
            opacity: 0.5,
            texture: Some("/nebula.png".to_string()),
            spin_y: 0.0005,
        }
    }
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: 300,
            extent: 100.0,
            jitter: 0.0005,
            seed: 0x5eed,
        }
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            corner_radius: 0.2,
            depth: 0.01,
            bevel_thickness: 0.001,
            bevel_size: 0.001,
            curve_divisions: 12,
        }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: RadiusConfig::Uniform { radius: 2.25 },
            speed: 0.002,
            body: BodyKind::Icon,
            sphere_radius: 0.3,
        }
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ManifestError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ManifestError::Invalid {
            field,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ManifestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ManifestError::Invalid {
            field,
            reason: format!("must be finite, got {value}"),
        })
    }
}

impl SceneManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, ManifestError> {
        let manifest: SceneManifest = serde_json::from_str(payload).map_err(ManifestError::Parse)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(ManifestError::Parse)
    }

    /// blake3 of the compact JSON form, hex encoded.
    pub fn content_hash(&self) -> Result<String, ManifestError> {
        let bytes = serde_json::to_vec(self).map_err(ManifestError::Parse)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    pub fn link_urls(&self) -> Vec<String> {
        self.links.iter().map(|l| l.url.clone()).collect()
    }

    /// Numeric sanity checks. Geometry constraints that depend on several
    /// fields (corner radius against the icon size) are left to the geometry
    /// builder.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: self.version.clone(),
            });
        }

        let c = &self.camera;
        require_positive("camera.fov_deg", c.fov_deg)?;
        if c.fov_deg >= 180.0 {
            return Err(ManifestError::Invalid {
                field: "camera.fov_deg",
                reason: format!("must be below 180, got {}", c.fov_deg),
            });
        }
        require_positive("camera.near", c.near)?;
        require_positive("camera.far", c.far)?;
        if c.far <= c.near {
            return Err(ManifestError::Invalid {
                field: "camera.far",
                reason: format!("must exceed near ({}), got {}", c.near, c.far),
            });
        }
        require_positive("camera.distance", c.distance)?;

        require_positive("globe.radius", self.globe.radius)?;
        require_finite("globe.spin_x", self.globe.spin_x)?;
        require_finite("globe.spin_y", self.globe.spin_y)?;

        if let Some(nebula) = &self.nebula {
            require_positive("nebula.radius", nebula.radius)?;
            require_finite("nebula.spin_y", nebula.spin_y)?;
            if !(0.0..=1.0).contains(&nebula.opacity) {
                return Err(ManifestError::Invalid {
                    field: "nebula.opacity",
                    reason: format!("must be within [0, 1], got {}", nebula.opacity),
                });
            }
        }

        require_positive("stars.extent", self.stars.extent)?;
        require_finite("stars.jitter", self.stars.jitter)?;
        if self.stars.count > MAX_STARS {
            return Err(ManifestError::Invalid {
                field: "stars.count",
                reason: format!("must be at most {MAX_STARS}, got {}", self.stars.count),
            });
        }

        let divisions = self.icons.curve_divisions;
        if !(1..=MAX_CURVE_DIVISIONS).contains(&divisions) {
            return Err(ManifestError::Invalid {
                field: "icons.curve_divisions",
                reason: format!("must be within [1, {MAX_CURVE_DIVISIONS}], got {divisions}"),
            });
        }

        match self.orbit.radius {
            RadiusConfig::Uniform { radius } => require_positive("orbit.radius", radius)?,
            RadiusConfig::Staggered { base, step } => {
                require_positive("orbit.radius.base", base)?;
                require_finite("orbit.radius.step", step)?;
                let last = base + step * self.links.len().saturating_sub(1) as f64;
                require_positive("orbit.radius.step", last)?;
            }
        }
        require_finite("orbit.speed", self.orbit.speed)?;
        require_positive("orbit.sphere_radius", self.orbit.sphere_radius)?;

        if self.links.is_empty() {
            return Err(ManifestError::NoLinks);
        }
        if let Some(blank) = self.links.iter().position(|l| l.url.trim().is_empty()) {
            return Err(ManifestError::Invalid {
                field: "links",
                reason: format!("entry {blank} has an empty url"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BodyKind, MAX_CURVE_DIVISIONS, MAX_STARS, ManifestError, RadiusConfig, SceneManifest,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_takes_every_default() {
        let manifest = SceneManifest::from_json_str("{}").expect("valid");
        assert_eq!(manifest, SceneManifest::default());
        assert_eq!(manifest.links.len(), 4);
        assert_eq!(manifest.camera.fov_deg, 110.0);
        assert_eq!(manifest.orbit.radius, RadiusConfig::Uniform { radius: 2.25 });
    }

    #[test]
    fn json_round_trip_keeps_overrides() {
        let payload = r#"{
            "orbit": { "radius": { "kind": "staggered", "base": 2.0, "step": 0.5 }, "speed": 0.001, "body": "sphere" },
            "links": [ { "url": "https://example.com/a" }, { "url": "https://example.com/b", "icon": "/b.png" } ],
            "nebula": null
        }"#;
        let manifest = SceneManifest::from_json_str(payload).expect("valid");
        assert_eq!(
            manifest.orbit.radius,
            RadiusConfig::Staggered {
                base: 2.0,
                step: 0.5
            }
        );
        assert_eq!(manifest.orbit.body, BodyKind::Sphere);
        assert_eq!(manifest.orbit.sphere_radius, 0.3);
        assert_eq!(manifest.nebula, None);
        assert_eq!(manifest.links[1].icon.as_deref(), Some("/b.png"));

        let again = SceneManifest::from_json_str(&manifest.to_json_pretty().expect("json"))
            .expect("valid");
        assert_eq!(again, manifest);
    }

    #[test]
    fn rejects_empty_link_table() {
        let err = SceneManifest::from_json_str(r#"{ "links": [] }"#).unwrap_err();
        assert!(matches!(err, ManifestError::NoLinks));
    }

    #[test]
    fn rejects_bad_numbers_and_versions() {
        let err = SceneManifest::from_json_str(r#"{ "camera": { "near": 10, "far": 5 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Invalid {
                field: "camera.far",
                ..
            }
        ));

        let err = SceneManifest::from_json_str(r#"{ "version": "0.9" }"#).unwrap_err();
        assert_eq!(err.to_string(), "unsupported manifest version: 0.9");

        let err =
            SceneManifest::from_json_str(r#"{ "orbit": { "radius": { "kind": "uniform", "radius": -1 } } }"#)
                .unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { field: "orbit.radius", .. }));

        assert!(matches!(
            SceneManifest::from_json_str("not json"),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn rejects_oversized_star_and_curve_counts() {
        let err = SceneManifest::from_json_str(r#"{ "stars": { "count": 18446744073709551615 } }"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { field: "stars.count", .. }));

        for divisions in ["0", "4294967295"] {
            let payload = format!(r#"{{ "icons": {{ "curve_divisions": {divisions} }} }}"#);
            let err = SceneManifest::from_json_str(&payload).unwrap_err();
            assert!(matches!(
                err,
                ManifestError::Invalid {
                    field: "icons.curve_divisions",
                    ..
                }
            ));
        }

        let at_limit = format!(
            r#"{{ "stars": {{ "count": {MAX_STARS} }}, "icons": {{ "curve_divisions": {MAX_CURVE_DIVISIONS} }} }}"#
        );
        assert!(SceneManifest::from_json_str(&at_limit).is_ok());
    }

    #[test]
    fn content_hash_tracks_content() {
        let a = SceneManifest::default();
        let mut b = SceneManifest::default();
        assert_eq!(a.content_hash().expect("hash"), b.content_hash().expect("hash"));
        b.orbit.speed = 0.003;
        assert_ne!(a.content_hash().expect("hash"), b.content_hash().expect("hash"));
        assert_eq!(a.content_hash().expect("hash").len(), 64);
    }
}
