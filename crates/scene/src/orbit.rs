//! Bodies circling the origin in the `z = 0` plane.

use foundation::math::Vec3;
use tracing::trace;

use crate::World;
use crate::components::Transform;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitingBody {
    pub entity: EntityId,
    /// Radians. Grows without bound; only its sine and cosine are read.
    pub angle: f64,
    pub radius: f64,
    /// Radians per tick.
    pub angular_speed: f64,
}

impl OrbitingBody {
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.angle.cos(),
            self.radius * self.angle.sin(),
            0.0,
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RadiusLayout {
    Uniform(f64),
    /// Body `i` orbits at `base + i * step`.
    Staggered { base: f64, step: f64 },
}

impl RadiusLayout {
    pub fn radius(&self, index: usize) -> f64 {
        match *self {
            RadiusLayout::Uniform(r) => r,
            RadiusLayout::Staggered { base, step } => base + index as f64 * step,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrbitModel {
    bodies: Vec<OrbitingBody>,
}

impl OrbitModel {
    /// Body `i` of `N` starts at angle `i / N * 2π`.
    pub fn evenly_spaced(entities: &[EntityId], layout: RadiusLayout, angular_speed: f64) -> Self {
        let n = entities.len();
        let bodies = entities
            .iter()
            .enumerate()
            .map(|(i, entity)| OrbitingBody {
                entity: *entity,
                angle: i as f64 / n as f64 * std::f64::consts::TAU,
                radius: layout.radius(i),
                angular_speed,
            })
            .collect();
        Self { bodies }
    }

    pub fn bodies(&self) -> &[OrbitingBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn body(&self, index: usize) -> Option<&OrbitingBody> {
        self.bodies.get(index)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.bodies.iter().map(|b| b.entity)
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.body(index).map(OrbitingBody::position)
    }

    /// Body index of `entity`, if it orbits.
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.bodies.iter().position(|b| b.entity == entity)
    }

    /// Writes every body's derived position into its transform. Rotation and
    /// scale are left alone; a body without a transform gets one.
    pub fn place(&self, world: &mut World) {
        for body in &self.bodies {
            match world.transform_mut(body.entity) {
                Some(transform) => transform.position = body.position(),
                None => world.set_transform(body.entity, Transform::translate(body.position())),
            }
        }
    }

    /// One tick: every angle moves by its speed, then positions follow.
    pub fn advance(&mut self, world: &mut World) {
        for body in &mut self.bodies {
            body.angle += body.angular_speed;
        }
        self.place(world);
        trace!(bodies = self.bodies.len(), "orbits advanced");
    }
}
