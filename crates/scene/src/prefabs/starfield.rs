use foundation::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::World;
use crate::components::{Drawable3D, Material, Transform};
use crate::entity::EntityId;

/// Background points scattered in a cube, each drifting by a small random
/// step every tick.
#[derive(Debug)]
pub struct Starfield {
    stars: Vec<EntityId>,
    jitter: f64,
    rng: StdRng,
}

impl Starfield {
    /// Scatters `count` stars uniformly in `[-extent, extent]^3`. `jitter` is
    /// the largest per-axis step of [`Self::update`].
    pub fn spawn(world: &mut World, count: usize, extent: f64, jitter: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let extent = extent.abs();
        let mut stars = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Vec3::new(
                sample(&mut rng, extent),
                sample(&mut rng, extent),
                sample(&mut rng, extent),
            );
            let entity = world.spawn();
            world.set_transform(entity, Transform::translate(position));
            world.set_drawable_3d(entity, Drawable3D::point());
            world.set_material(entity, Material::default());
            stars.push(entity);
        }
        Self {
            stars,
            jitter: jitter.abs(),
            rng,
        }
    }

    pub fn stars(&self) -> &[EntityId] {
        &self.stars
    }

    pub fn update(&mut self, world: &mut World) {
        for star in &self.stars {
            let step = Vec3::new(
                sample(&mut self.rng, self.jitter),
                sample(&mut self.rng, self.jitter),
                sample(&mut self.rng, self.jitter),
            );
            if let Some(transform) = world.transform_mut(*star) {
                transform.position += step;
            }
        }
    }
}

fn sample(rng: &mut StdRng, half_range: f64) -> f64 {
    if half_range == 0.0 {
        return 0.0;
    }
    rng.gen_range(-half_range..=half_range)
}

#[cfg(test)]
mod tests {
    use super::Starfield;
    use crate::World;
    use crate::components::Shape3D;

    #[test]
    fn stars_start_inside_the_cube() {
        let mut world = World::new();
        let field = Starfield::spawn(&mut world, 300, 100.0, 0.0005, 7);
        assert_eq!(field.stars().len(), 300);
        for star in field.stars() {
            let p = world.transform(*star).expect("transform").position;
            assert!(p.x.abs() <= 100.0 && p.y.abs() <= 100.0 && p.z.abs() <= 100.0);
            assert_eq!(
                world.drawable_3d(*star).map(|d| d.shape),
                Some(Shape3D::Point)
            );
        }
    }

    #[test]
    fn jitter_is_bounded_per_axis() {
        let mut world = World::new();
        let mut field = Starfield::spawn(&mut world, 50, 10.0, 0.0005, 3);
        let before: Vec<_> = field
            .stars()
            .iter()
            .map(|s| world.transform(*s).expect("transform").position)
            .collect();
        field.update(&mut world);
        for (star, old) in field.stars().iter().zip(&before) {
            let new = world.transform(*star).expect("transform").position;
            let d = new - *old;
            assert!(d.x.abs() <= 0.0005 + 1e-15);
            assert!(d.y.abs() <= 0.0005 + 1e-15);
            assert!(d.z.abs() <= 0.0005 + 1e-15);
        }
    }

    #[test]
    fn same_seed_same_sky() {
        let mut a = World::new();
        let mut b = World::new();
        let fa = Starfield::spawn(&mut a, 20, 100.0, 0.0, 11);
        let fb = Starfield::spawn(&mut b, 20, 100.0, 0.0, 11);
        for (sa, sb) in fa.stars().iter().zip(fb.stars()) {
            assert_eq!(a.transform(*sa), b.transform(*sb));
        }
    }
}
