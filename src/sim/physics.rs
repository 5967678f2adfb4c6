//! Rigid-body world contract and a minimal axis-aligned implementation
//!
//! The game only talks to physics through `PhysicsWorld`: create bodies,
//! attach shapes with group/mask filtering, add/remove, step, and read the
//! contacts of the last step. `ArcadeWorld` is enough to run the game
//! headless: dynamic circles against static axis-aligned boxes, with
//! circle/circle overlaps reported but not resolved.

use glam::Vec2;

/// Collision groups
pub mod mask {
    pub const WORLD: u32 = 1 << 0;
    pub const PLAYER: u32 = 1 << 1;
    pub const ENEMY: u32 = 1 << 2;
    pub const ITEM: u32 = 1 << 3;
    pub const ALL: u32 = u32::MAX;
}

/// Surface material (selects friction between pairs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Material {
    #[default]
    World,
    Player,
}

/// Tangential velocity damping per second for a material pair
fn friction(a: Material, b: Material) -> f32 {
    match (a, b) {
        (Material::Player, Material::World) | (Material::World, Material::Player) => 10.0,
        _ => 0.0,
    }
}

/// Shape geometry, relative to the body position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Circle { radius: f32 },
    /// Axis-aligned box with half extents
    Rect { half: Vec2 },
}

/// A collision shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub offset: Vec2,
    pub group: u32,
    pub mask: u32,
    pub material: Material,
    /// Sensors report contacts but never push
    pub sensor: bool,
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Self {
            kind: ShapeKind::Circle { radius },
            offset: Vec2::ZERO,
            group: mask::WORLD,
            mask: mask::ALL,
            material: Material::World,
            sensor: false,
        }
    }

    /// Box of the given full size centred on the body
    pub fn rect(size: Vec2) -> Self {
        Self {
            kind: ShapeKind::Rect { half: size * 0.5 },
            ..Self::circle(0.0)
        }
    }

    pub fn with_filter(mut self, group: u32, mask: u32) -> Self {
        self.group = group;
        self.mask = mask;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Whether two shapes are allowed to collide
    #[inline]
    pub fn collides_with(&self, other: &Shape) -> bool {
        (self.group & other.mask) != 0 && (other.group & self.mask) != 0
    }

    pub fn bounding_radius(&self) -> f32 {
        let r = match self.kind {
            ShapeKind::Circle { radius } => radius,
            ShapeKind::Rect { half } => half.length(),
        };
        r + self.offset.length()
    }
}

/// Parameters for `PhysicsWorld::create_body`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub position: Vec2,
    /// Zero mass makes the body static
    pub mass: f32,
    pub fixed_rotation: bool,
    pub angle: f32,
}

impl BodyDesc {
    pub fn fixed(position: Vec2) -> Self {
        Self {
            position,
            mass: 0.0,
            fixed_rotation: true,
            angle: 0.0,
        }
    }

    pub fn dynamic(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            mass,
            fixed_rotation: true,
            angle: 0.0,
        }
    }
}

/// A rigid body, owned by a world once added
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub mass: f32,
    pub fixed_rotation: bool,
    pub angle: f32,
    pub shapes: Vec<Shape>,
    /// Owning entity id, if any
    pub entity: Option<u32>,
}

impl Body {
    pub fn new(desc: BodyDesc) -> Self {
        Self {
            position: desc.position,
            previous_position: desc.position,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            mass: desc.mass,
            fixed_rotation: desc.fixed_rotation,
            angle: desc.angle,
            shapes: Vec::new(),
            entity: None,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Position between the last two steps
    pub fn interpolated(&self, frac: f32) -> Vec2 {
        self.previous_position.lerp(self.position, frac)
    }

    /// Move without introducing velocity or an interpolation streak
    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
        self.previous_position += offset;
    }

    pub fn bounding_radius(&self) -> f32 {
        self.shapes
            .iter()
            .map(Shape::bounding_radius)
            .fold(0.0, f32::max)
    }
}

/// Index of a body inside one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// A touching pair from the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Unit vector pushing `a` out of `b`
    pub normal: Vec2,
    pub depth: f32,
    /// Either shape was a sensor
    pub sensor: bool,
}

/// Narrow contract the game needs from a physics engine
pub trait PhysicsWorld {
    /// Fresh empty world
    fn create(gravity: Vec2) -> Self
    where
        Self: Sized;

    fn create_body(&self, desc: BodyDesc) -> Body {
        Body::new(desc)
    }

    fn add_shape(&self, body: &mut Body, shape: Shape) {
        body.shapes.push(shape);
    }

    fn add_body(&mut self, body: Body) -> BodyHandle;

    fn remove_body(&mut self, handle: BodyHandle) -> Option<Body>;

    fn body(&self, handle: BodyHandle) -> Option<&Body>;

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body>;

    fn body_count(&self) -> usize;

    /// Advance the simulation and refresh `contacts`
    fn step(&mut self, dt: f32);

    fn contacts(&self) -> &[Contact];
}

/// True if something solid is holding `handle` up
pub fn is_grounded(world: &dyn PhysicsWorld, handle: BodyHandle) -> bool {
    world.contacts().iter().any(|c| {
        !c.sensor && ((c.a == handle && c.normal.y > 0.5) || (c.b == handle && c.normal.y < -0.5))
    })
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Surface normal pointing toward the circle centre
    pub normal: Vec2,
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Circle against an axis-aligned box
pub fn circle_rect_collision(
    center: Vec2,
    radius: f32,
    rect_center: Vec2,
    half: Vec2,
) -> CollisionResult {
    let d = center - rect_center;
    let closest = rect_center + d.clamp(-half, half);
    let delta = center - closest;
    let dist2 = delta.length_squared();

    if dist2 > radius * radius {
        return CollisionResult::miss();
    }

    if dist2 > 1e-8 {
        let dist = dist2.sqrt();
        return CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Centre inside the box: leave along the shallowest axis
    let ox = half.x - d.x.abs();
    let oy = half.y - d.y.abs();
    let (normal, depth) = if ox < oy {
        (Vec2::new(if d.x < 0.0 { -1.0 } else { 1.0 }, 0.0), ox)
    } else {
        (Vec2::new(0.0, if d.y < 0.0 { -1.0 } else { 1.0 }), oy)
    };
    CollisionResult {
        hit: true,
        normal,
        penetration: depth + radius,
    }
}

/// Circle against circle
pub fn circle_circle_collision(a: Vec2, ra: f32, b: Vec2, rb: f32) -> CollisionResult {
    let delta = a - b;
    let dist2 = delta.length_squared();
    let reach = ra + rb;
    if dist2 > reach * reach {
        return CollisionResult::miss();
    }
    let dist = dist2.sqrt();
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::Y };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Minimal world: gravity, forces, circle bodies colliding with static boxes
#[derive(Debug, Default)]
pub struct ArcadeWorld {
    gravity: Vec2,
    bodies: Vec<Option<Body>>,
    live: usize,
    contacts: Vec<Contact>,
}

impl ArcadeWorld {
    fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_some())
            .map(|(i, _)| BodyHandle(i as u32))
    }

    /// Dynamic circle shapes of a body, in world space
    fn circles(body: &Body) -> impl Iterator<Item = (Vec2, f32, &Shape)> + '_ {
        body.shapes.iter().filter_map(move |s| match s.kind {
            ShapeKind::Circle { radius } => Some((body.position + s.offset, radius, s)),
            ShapeKind::Rect { .. } => None,
        })
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().flatten() {
            body.previous_position = body.position;
            if body.is_static() {
                body.force = Vec2::ZERO;
                continue;
            }
            let accel = gravity + body.force / body.mass;
            body.velocity += accel * dt;
            body.position += body.velocity * dt;
            body.force = Vec2::ZERO;
        }
    }

    fn resolve_static(&mut self, dt: f32) {
        let handles: Vec<BodyHandle> = self.handles().collect();
        let statics: Vec<(BodyHandle, Vec2, Vec<Shape>)> = handles
            .iter()
            .filter_map(|&h| {
                let b = self.bodies[h.0 as usize].as_ref()?;
                b.is_static().then(|| (h, b.position, b.shapes.clone()))
            })
            .collect();

        for &h in &handles {
            let Some(body) = self.bodies[h.0 as usize].as_mut() else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            for (sh, spos, sshapes) in &statics {
                for rect in sshapes {
                    let ShapeKind::Rect { half } = rect.kind else {
                        continue;
                    };
                    let circles: Vec<(Vec2, f32, Shape)> =
                        Self::circles(body).map(|(c, r, s)| (c, r, *s)).collect();
                    for (center, radius, shape) in circles {
                        if !shape.collides_with(rect) {
                            continue;
                        }
                        let hit = circle_rect_collision(center, radius, *spos + rect.offset, half);
                        if !hit.hit {
                            continue;
                        }
                        let sensor = shape.sensor || rect.sensor;
                        if !sensor {
                            body.position += hit.normal * hit.penetration;
                            let vn = body.velocity.dot(hit.normal);
                            if vn < 0.0 {
                                body.velocity -= hit.normal * vn;
                            }
                            let mu = friction(shape.material, rect.material);
                            if mu > 0.0 {
                                let tangent = body.velocity - hit.normal * body.velocity.dot(hit.normal);
                                body.velocity -= tangent * (mu * dt).min(1.0);
                            }
                        }
                        self.contacts.push(Contact {
                            a: h,
                            b: *sh,
                            normal: hit.normal,
                            depth: hit.penetration,
                            sensor,
                        });
                    }
                }
            }
        }
    }

    fn detect_dynamic(&mut self) {
        let dynamic: Vec<BodyHandle> = self
            .handles()
            .filter(|h| {
                self.bodies[h.0 as usize]
                    .as_ref()
                    .is_some_and(|b| !b.is_static())
            })
            .collect();

        for (i, &ha) in dynamic.iter().enumerate() {
            for &hb in &dynamic[i + 1..] {
                let (Some(a), Some(b)) = (
                    self.bodies[ha.0 as usize].as_ref(),
                    self.bodies[hb.0 as usize].as_ref(),
                ) else {
                    continue;
                };
                let mut found = None;
                'pairs: for (ca, ra, sa) in Self::circles(a) {
                    for (cb, rb, sb) in Self::circles(b) {
                        if !sa.collides_with(sb) {
                            continue;
                        }
                        let hit = circle_circle_collision(ca, ra, cb, rb);
                        if hit.hit {
                            found = Some(Contact {
                                a: ha,
                                b: hb,
                                normal: hit.normal,
                                depth: hit.penetration,
                                sensor: sa.sensor || sb.sensor,
                            });
                            break 'pairs;
                        }
                    }
                }
                if let Some(contact) = found {
                    self.contacts.push(contact);
                }
            }
        }
    }
}

impl PhysicsWorld for ArcadeWorld {
    fn create(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }

    fn add_body(&mut self, body: Body) -> BodyHandle {
        // Slots are never reused, so stale handles can't alias new bodies
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Some(body));
        self.live += 1;
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.get_mut(handle.0 as usize)?.take()?;
        self.live -= 1;
        Some(body)
    }

    fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0 as usize)?.as_ref()
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.0 as usize)?.as_mut()
    }

    fn body_count(&self) -> usize {
        self.live
    }

    fn step(&mut self, dt: f32) {
        self.contacts.clear();
        self.integrate(dt);
        self.resolve_static(dt);
        self.detect_dynamic();
    }

    fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_box(world: &mut ArcadeWorld, center: Vec2, size: Vec2) -> BodyHandle {
        let mut body = world.create_body(BodyDesc::fixed(center));
        world.add_shape(&mut body, Shape::rect(size));
        world.add_body(body)
    }

    fn ball(world: &mut ArcadeWorld, pos: Vec2) -> BodyHandle {
        let mut body = world.create_body(BodyDesc::dynamic(pos, 1.0));
        world.add_shape(&mut body, Shape::circle(1.0));
        world.add_body(body)
    }

    #[test]
    fn test_circle_rect_outside_edge() {
        let hit = circle_rect_collision(Vec2::new(0.0, 1.5), 1.0, Vec2::ZERO, Vec2::new(5.0, 1.0));
        assert!(hit.hit);
        assert!((hit.normal - Vec2::Y).length() < 1e-5);
        assert!((hit.penetration - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_circle_rect_miss() {
        let hit = circle_rect_collision(Vec2::new(0.0, 3.0), 1.0, Vec2::ZERO, Vec2::new(5.0, 1.0));
        assert!(!hit.hit);
    }

    #[test]
    fn test_circle_rect_centre_inside() {
        let hit = circle_rect_collision(Vec2::new(4.5, 0.0), 1.0, Vec2::ZERO, Vec2::new(5.0, 1.0));
        assert!(hit.hit);
        assert_eq!(hit.normal, Vec2::X);
    }

    #[test]
    fn test_ball_rests_on_floor_and_is_grounded() {
        let mut world = ArcadeWorld::create(Vec2::new(0.0, -50.0));
        static_box(&mut world, Vec2::new(0.0, -1.0), Vec2::new(100.0, 2.0));
        let b = ball(&mut world, Vec2::new(0.0, 2.0));
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        let body = world.body(b).unwrap();
        assert!(body.position.y > 0.9 && body.position.y < 1.2, "y = {}", body.position.y);
        assert!(is_grounded(&world, b));
    }

    #[test]
    fn test_mask_filtering_skips_pair() {
        let mut world = ArcadeWorld::create(Vec2::new(0.0, -50.0));
        let mut floor = world.create_body(BodyDesc::fixed(Vec2::new(0.0, -1.0)));
        world.add_shape(&mut floor, Shape::rect(Vec2::new(100.0, 2.0)).with_filter(mask::WORLD, mask::PLAYER));
        world.add_body(floor);
        let mut item = world.create_body(BodyDesc::dynamic(Vec2::new(0.0, 0.5), 1.0));
        world.add_shape(&mut item, Shape::circle(1.0).with_filter(mask::ITEM, mask::PLAYER));
        let h = world.add_body(item);
        world.step(1.0 / 60.0);
        assert!(world.contacts().is_empty());
        assert!(!is_grounded(&world, h));
    }

    #[test]
    fn test_remove_body_returns_it_once() {
        let mut world = ArcadeWorld::create(Vec2::ZERO);
        let h = ball(&mut world, Vec2::ZERO);
        assert_eq!(world.body_count(), 1);
        assert!(world.remove_body(h).is_some());
        assert!(world.remove_body(h).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_dynamic_overlap_reported() {
        let mut world = ArcadeWorld::create(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(1.5, 0.0));
        world.step(1.0 / 60.0);
        let c = world.contacts()[0];
        assert_eq!((c.a, c.b), (a, b));
        assert!(c.normal.x < 0.0);
    }

    #[test]
    fn test_translate_keeps_interpolation_flat() {
        let mut body = Body::new(BodyDesc::dynamic(Vec2::new(1.0, 1.0), 1.0));
        body.translate(Vec2::new(-10.0, 2.0));
        assert_eq!(body.interpolated(0.5), Vec2::new(-9.0, 3.0));
    }
}
