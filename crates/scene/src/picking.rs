use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Vec2, Vec3};

use crate::World;
use crate::components::{Collider, Transform};
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    /// Position of `entity` in the candidate list.
    pub index: usize,
    pub distance: f64,
    pub point: Vec3,
}

/// Deterministic ray picking against entity colliders at their current
/// transforms.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If several candidates are hit at the same distance, the one listed
///   first in `candidates` wins.
///
/// Candidates without a transform or collider are ignored. A ray starting
/// inside a collider hits it at distance 0.
pub fn pick_ray<I>(world: &World, ray: Ray, candidates: I) -> Option<PickHit>
where
    I: IntoIterator<Item = EntityId>,
{
    let dir = ray.dir.normalize()?;
    let ray = Ray::new(ray.origin, dir);

    let mut best: Option<(f64, usize, EntityId)> = None;
    for (index, entity) in candidates.into_iter().enumerate() {
        let (Some(transform), Some(collider)) = (world.transform(entity), world.collider(entity))
        else {
            continue;
        };
        let Some(t) = hit_distance(world, &transform, &collider, ray) else {
            continue;
        };

        best = match best {
            None => Some((t, index, entity)),
            Some((bt, bi, be)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| index.cmp(&bi));
                if ord.is_lt() {
                    Some((t, index, entity))
                } else {
                    Some((bt, bi, be))
                }
            }
        };
    }

    let (t, index, entity) = best?;
    Some(PickHit {
        entity,
        index,
        distance: t,
        point: ray.at(t),
    })
}

/// Entry distance along a unit-length world ray. The local-space ray keeps
/// the same parameter since its direction absorbs the inverse scale.
fn hit_distance(world: &World, transform: &Transform, collider: &Collider, ray: Ray) -> Option<f64> {
    if !(transform.scale.is_finite() && transform.scale > 0.0) {
        return None;
    }
    let local = Ray::new(
        transform.to_local_point(ray.origin),
        transform.to_local_dir(ray.dir),
    );
    match *collider {
        Collider::Sphere { radius } => ray_sphere(local, radius),
        Collider::Prism {
            outline,
            half_depth,
        } => ray_prism(local, world.outline(outline)?, half_depth),
    }
}

fn ray_sphere(ray: Ray, radius: f64) -> Option<f64> {
    let a = ray.dir.dot(ray.dir);
    let b = 2.0 * ray.origin.dot(ray.dir);
    let c = ray.origin.dot(ray.origin) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if a <= 0.0 || disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = (-b - sqrt) / (2.0 * a);
    let far = (-b + sqrt) / (2.0 * a);
    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

/// Cyrus-Beck clip of a ray against a convex CCW outline swept over
/// `z in [-half_depth, half_depth]`.
fn ray_prism(ray: Ray, outline: &[Vec2], half_depth: f64) -> Option<f64> {
    if outline.len() < 3 {
        return None;
    }
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    let mut clip = |normal: Vec3, offset: f64| -> bool {
        // Inside when normal . p <= offset.
        let denom = normal.dot(ray.dir);
        let dist = offset - normal.dot(ray.origin);
        if denom.abs() < 1e-15 {
            return dist >= 0.0;
        }
        let t = dist / denom;
        if denom < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        t_enter <= t_exit
    };

    if !clip(Vec3::new(0.0, 0.0, 1.0), half_depth) || !clip(Vec3::new(0.0, 0.0, -1.0), half_depth)
    {
        return None;
    }
    for i in 0..outline.len() {
        let p0 = outline[i];
        let p1 = outline[(i + 1) % outline.len()];
        let edge = p1 - p0;
        let normal = Vec3::new(edge.y, -edge.x, 0.0);
        if !clip(normal, normal.x * p0.x + normal.y * p0.y) {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some(t_enter.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{Ray, pick_ray};
    use crate::World;
    use crate::components::{Collider, Transform};
    use crate::entity::EntityId;
    use foundation::math::{Vec2, Vec3};

    fn unit_square(world: &mut World) -> crate::OutlineId {
        world.add_outline(vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ])
    }

    fn spawn_at(world: &mut World, position: Vec3, collider: Collider) -> EntityId {
        let entity = world.spawn();
        world.set_transform(entity, Transform::translate(position));
        world.set_collider(entity, collider);
        entity
    }

    fn down_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn ray_picks_nearest_hit() {
        let mut world = World::new();
        let outline = unit_square(&mut world);
        let far = spawn_at(&mut world, Vec3::new(0.0, 0.0, 0.0), Collider::prism(outline, 0.01));
        let near = spawn_at(&mut world, Vec3::new(0.0, 0.0, 3.0), Collider::prism(outline, 0.01));

        let hit = pick_ray(&world, down_z(), [far, near]).expect("hit");
        assert_eq!(hit.entity, near);
        assert_eq!(hit.index, 1);
        assert!((hit.distance - 6.99).abs() < 1e-12);
        assert!((hit.point.z - 3.01).abs() < 1e-12);
    }

    #[test]
    fn tie_breaks_by_candidate_order() {
        let mut world = World::new();
        let a = spawn_at(&mut world, Vec3::ZERO, Collider::sphere(1.0));
        let b = spawn_at(&mut world, Vec3::ZERO, Collider::sphere(1.0));

        let hit = pick_ray(&world, down_z(), [a, b]).expect("hit");
        assert_eq!((hit.entity, hit.index), (a, 0));
        let hit = pick_ray(&world, down_z(), [b, a]).expect("hit");
        assert_eq!((hit.entity, hit.index), (b, 0));
    }

    #[test]
    fn far_field_ray_misses() {
        let mut world = World::new();
        let outline = unit_square(&mut world);
        let e = spawn_at(&mut world, Vec3::ZERO, Collider::prism(outline, 0.01));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 0.0, -0.1));
        assert_eq!(pick_ray(&world, ray, [e]), None);

        // Pointing away from the body.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(pick_ray(&world, ray, [e]), None);
    }

    #[test]
    fn picking_is_pure() {
        let mut world = World::new();
        let outline = unit_square(&mut world);
        let a = spawn_at(&mut world, Vec3::new(0.2, 0.0, 0.0), Collider::prism(outline, 0.01));
        let b = spawn_at(&mut world, Vec3::new(0.0, 0.0, 1.0), Collider::sphere(0.3));

        let first = pick_ray(&world, down_z(), [a, b]);
        let second = pick_ray(&world, down_z(), [a, b]);
        assert_eq!(first, second);
        assert_eq!(world.transform(a).map(|t| t.position), Some(Vec3::new(0.2, 0.0, 0.0)));
    }

    #[test]
    fn prism_follows_rotation_and_scale() {
        let mut world = World::new();
        let outline = unit_square(&mut world);
        let e = world.spawn();
        world.set_collider(e, Collider::prism(outline, 0.01));
        world.set_transform(
            e,
            Transform {
                position: Vec3::ZERO,
                rotation: Vec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_4),
                scale: 2.0,
            },
        );

        // The rotated square reaches out to sqrt(2) along x.
        let ray = Ray::new(Vec3::new(1.3, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = pick_ray(&world, ray, [e]).expect("hit");
        assert!((hit.distance - 9.98).abs() < 1e-9);

        let ray = Ray::new(Vec3::new(1.3, 1.3, 10.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(pick_ray(&world, ray, [e]), None);
    }

    #[test]
    fn entities_without_colliders_are_ignored() {
        let mut world = World::new();
        let bare = world.spawn();
        world.set_transform(bare, Transform::identity());
        assert_eq!(pick_ray(&world, down_z(), [bare]), None);

        let zero_dir = Ray::new(Vec3::ZERO, Vec3::ZERO);
        let s = spawn_at(&mut world, Vec3::ZERO, Collider::sphere(1.0));
        assert_eq!(pick_ray(&world, zero_dir, [s]), None);
    }

    #[test]
    fn origin_inside_sphere_hits_at_zero() {
        let mut world = World::new();
        let s = spawn_at(&mut world, Vec3::ZERO, Collider::sphere(5.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let hit = pick_ray(&world, ray, [s]).expect("hit");
        assert_eq!(hit.distance, 0.0);
    }
}
