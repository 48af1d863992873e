//! Rounded-rectangle outlines used as the cross-section of icon meshes.

use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Quadratic Bézier from the current point.
    QuadTo { control: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    NotPositive { name: &'static str, value: f64 },
    RadiusTooLarge { radius: f64, max: f64 },
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::NotPositive { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            GeometryError::RadiusTooLarge { radius, max } => {
                write!(f, "corner radius {radius} exceeds half the shorter side ({max})")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

fn positive(name: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::NotPositive { name, value })
    }
}

/// Closed outline of `[0, width] x [0, height]` with quarter-round corners.
///
/// The path runs counter-clockwise starting at `(radius, 0)`; each corner is a
/// quadratic curve whose control point is the sharp corner.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundedRect {
    width: f64,
    height: f64,
    radius: f64,
    segments: Vec<PathSegment>,
}

impl RoundedRect {
    pub fn new(width: f64, height: f64, radius: f64) -> Result<Self, GeometryError> {
        let width = positive("width", width)?;
        let height = positive("height", height)?;
        let radius = positive("radius", radius)?;
        let max = width.min(height) * 0.5;
        if radius > max {
            return Err(GeometryError::RadiusTooLarge { radius, max });
        }

        let (w, h, r) = (width, height, radius);
        let p = Vec2::new;
        let segments = vec![
            PathSegment::MoveTo(p(r, 0.0)),
            PathSegment::LineTo(p(w - r, 0.0)),
            PathSegment::QuadTo {
                control: p(w, 0.0),
                to: p(w, r),
            },
            PathSegment::LineTo(p(w, h - r)),
            PathSegment::QuadTo {
                control: p(w, h),
                to: p(w - r, h),
            },
            PathSegment::LineTo(p(r, h)),
            PathSegment::QuadTo {
                control: p(0.0, h),
                to: p(0.0, h - r),
            },
            PathSegment::LineTo(p(0.0, r)),
            PathSegment::QuadTo {
                control: p(0.0, 0.0),
                to: p(r, 0.0),
            },
        ];

        Ok(Self {
            width,
            height,
            radius,
            segments,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The same outline pushed outward by `amount` on every side.
    pub fn grown(&self, amount: f64) -> Result<Self, GeometryError> {
        if amount == 0.0 {
            return Ok(self.clone());
        }
        Self::new(
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
            self.radius + amount,
        )
    }

    /// Polygon approximation (CCW, no repeated closing point). Each corner
    /// contributes `divisions` points.
    pub fn flatten(&self, divisions: u32) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        let mut points: Vec<Vec2> = Vec::new();
        let mut current = Vec2::default();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(to) | PathSegment::LineTo(to) => {
                    push_distinct(&mut points, to);
                    current = to;
                }
                PathSegment::QuadTo { control, to } => {
                    for i in 1..=divisions {
                        let t = i as f64 / divisions as f64;
                        push_distinct(&mut points, quadratic(current, control, to, t));
                    }
                    current = to;
                }
            }
        }

        if points.len() > 1 && near(points[0], points[points.len() - 1]) {
            points.pop();
        }
        points
    }

    /// [`Self::flatten`], translated so the bounding box is centered on the
    /// origin.
    pub fn centered_points(&self, divisions: u32) -> Vec<Vec2> {
        let offset = Vec2::new(self.width * 0.5, self.height * 0.5);
        self.flatten(divisions)
            .into_iter()
            .map(|p| p - offset)
            .collect()
    }
}

fn quadratic(from: Vec2, control: Vec2, to: Vec2, t: f64) -> Vec2 {
    let u = 1.0 - t;
    from * (u * u) + control * (2.0 * u * t) + to * (t * t)
}

fn near(a: Vec2, b: Vec2) -> bool {
    (a - b).length() <= 1e-12
}

fn push_distinct(points: &mut Vec<Vec2>, p: Vec2) {
    if points.last().is_some_and(|last| near(*last, p)) {
        return;
    }
    points.push(p);
}

/// Thickness of an extruded icon. The solid spans
/// `z in [-half_depth, half_depth]` once centered; the bevel grows the outline
/// by `bevel_size`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extrusion {
    pub depth: f64,
    pub bevel_thickness: f64,
    pub bevel_size: f64,
}

impl Default for Extrusion {
    fn default() -> Self {
        Self {
            depth: 0.01,
            bevel_thickness: 0.001,
            bevel_size: 0.001,
        }
    }
}

impl Extrusion {
    pub fn half_depth(&self) -> f64 {
        self.depth * 0.5 + self.bevel_thickness
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        positive("depth", self.depth)?;
        if !(self.bevel_thickness >= 0.0 && self.bevel_thickness.is_finite()) {
            return Err(GeometryError::NotPositive {
                name: "bevel_thickness",
                value: self.bevel_thickness,
            });
        }
        if !(self.bevel_size >= 0.0 && self.bevel_size.is_finite()) {
            return Err(GeometryError::NotPositive {
                name: "bevel_size",
                value: self.bevel_size,
            });
        }
        Ok(())
    }

    /// Centered cross-section of an icon extruded from `outline`.
    pub fn cross_section(
        &self,
        outline: &RoundedRect,
        divisions: u32,
    ) -> Result<Vec<Vec2>, GeometryError> {
        self.validate()?;
        Ok(outline.grown(self.bevel_size)?.centered_points(divisions))
    }
}
