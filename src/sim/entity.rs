//! Entities and the spawn registry
//!
//! Every entity kind implements `GameObject`. The game looks kinds up by
//! symbolic name in a `Registry` built once at startup, so generators only
//! ever deal in names and positions.

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::Vec2;

use super::color::{self, hex};
use super::draw::{SpriteDesc, SpriteLayer};
use super::game::TickInput;
use super::physics::{Body, BodyDesc, Material, PhysicsWorld, Shape, mask};
use super::rng::GenRng;
use crate::consts::{PLAYER_RADIUS, SIM_DT, SIM_RATE};
use crate::tuning::Tuning;

/// Where and how to spawn an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnArgs {
    pub position: Vec2,
    pub angle: f32,
    /// Inherited velocity (e.g. from the shooter)
    pub velocity: Vec2,
    pub is_enemy: bool,
}

impl SpawnArgs {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            is_enemy: false,
        }
    }
}

/// A deferred spawn, by registered type name
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: &'static str,
    pub args: SpawnArgs,
}

impl SpawnRequest {
    pub fn new(kind: &'static str, position: Vec2) -> Self {
        Self {
            kind,
            args: SpawnArgs::at(position),
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.args.angle = angle;
        self
    }
}

/// Broad category, used to route contact effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    Player,
    Enemy,
    Item,
    Shot,
}

/// Area damage requested by a payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub radius: f32,
    pub damage: u32,
}

/// What touching something did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactEffect {
    /// Damage dealt to the other entity
    pub damage: u32,
    /// This entity is used up
    pub consumed: bool,
    pub explosion: Option<Explosion>,
    /// This entity was collected by the player
    pub pickup: bool,
}

/// Per-step view of the game handed to entities
pub struct StepContext<'a> {
    pub tick: u64,
    pub input: &'a TickInput,
    pub tuning: &'a Tuning,
    pub player: Option<Vec2>,
    pub enemies: &'a [Vec2],
    pub grounded: bool,
    pub rng: &'a mut GenRng,
    pub spawns: &'a mut Vec<SpawnRequest>,
}

impl StepContext<'_> {
    /// Force cancelling gravity for a body of `mass`
    pub fn hover_force(&self, mass: f32) -> Vec2 {
        Vec2::new(0.0, self.tuning.gravity * mass)
    }
}

/// Capability set shared by every entity kind
pub trait GameObject: std::fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn class(&self) -> EntityClass;

    /// Build the body (not yet added to the world)
    fn spawn(&mut self, world: &dyn PhysicsWorld, args: &SpawnArgs, tuning: &Tuning) -> Body;

    fn initial_health(&self) -> Option<u32> {
        None
    }

    /// Seconds before automatic removal
    fn lifespan(&self) -> Option<f32> {
        None
    }

    /// Carried across segment transitions regardless of position
    fn always_keep(&self) -> bool {
        false
    }

    fn step(&mut self, _body: &mut Body, _ctx: &mut StepContext) {}

    fn emit(&self, body: &Body, frac: f32, sprites: &mut SpriteLayer);

    /// `other` is `None` for level geometry
    fn on_contact(&mut self, _other: Option<EntityClass>) -> ContactEffect {
        ContactEffect::default()
    }

    fn on_damage(&mut self, _amount: u32) {}

    /// The world was rebased by `offset`
    fn translate(&mut self, _offset: Vec2) {}
}

/// A live entity in the game
#[derive(Debug)]
pub struct Entity {
    pub id: u32,
    pub object: Box<dyn GameObject>,
    /// Body handle in the current world; `None` once destroyed
    pub body: Option<super::physics::BodyHandle>,
    pub health: Option<u32>,
    pub end_tick: Option<u64>,
    pub dead: bool,
}

impl Entity {
    pub fn class(&self) -> EntityClass {
        self.object.class()
    }

    /// Apply damage; returns true if this killed it
    pub fn damage(&mut self, amount: u32) -> bool {
        if amount == 0 || self.dead {
            return false;
        }
        self.object.on_damage(amount);
        if let Some(hp) = self.health.as_mut() {
            *hp = hp.saturating_sub(amount);
            if *hp == 0 {
                self.dead = true;
                return true;
            }
        }
        false
    }
}

type Constructor = fn() -> Box<dyn GameObject>;

/// Type name to constructor map, built once at startup
#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(None, "Player", || Box::new(Player::default()));
        reg.register(None, "Item", || Box::new(Item::default()));
        for kind in EnemyKind::ALL {
            reg.register(Some("Enemy"), kind.name(), kind.constructor());
        }
        reg.register(Some("Shot"), "Bullet", || Box::new(Shot::bullet()));
        reg.register(Some("Shot"), "Rocket", || Box::new(Shot::rocket()));
        reg.register(Some("Shot"), "Homing", || Box::new(Shot::homing()));
        reg
    }

    /// Register a kind as `category.name`; duplicates are rejected
    pub fn register(&mut self, category: Option<&str>, name: &str, ctor: Constructor) -> bool {
        let full = match category {
            Some(c) => format!("{c}.{name}"),
            None => name.to_string(),
        };
        if self.types.contains_key(&full) {
            log::error!("Duplicate type registered: {}", full);
            return false;
        }
        self.types.insert(full, ctor);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Construct, build its body and add it to `world`
    pub fn spawn(
        &self,
        name: &str,
        id: u32,
        args: &SpawnArgs,
        world: &mut dyn PhysicsWorld,
        tuning: &Tuning,
        tick: u64,
    ) -> Option<Entity> {
        let Some(ctor) = self.types.get(name) else {
            log::warn!("No such entity type: {}", name);
            return None;
        };
        let mut object = ctor();
        let mut body = object.spawn(world, args, tuning);
        body.entity = Some(id);
        let handle = world.add_body(body);
        let end_tick = object
            .lifespan()
            .map(|s| tick + lifespan_ticks(s));
        Some(Entity {
            id,
            health: object.initial_health(),
            object,
            body: Some(handle),
            end_tick,
            dead: false,
        })
    }
}

/// Whole ticks covering `seconds`, rounded up
pub fn lifespan_ticks(seconds: f32) -> u64 {
    (seconds.max(0.0) * SIM_RATE as f32).ceil() as u64
}

// ---------------------------------------------------------------------------
// Player

#[derive(Debug, Default)]
pub struct Player {
    fire_cooldown: u32,
}

impl GameObject for Player {
    fn type_name(&self) -> &'static str {
        "Player"
    }

    fn class(&self) -> EntityClass {
        EntityClass::Player
    }

    fn spawn(&mut self, world: &dyn PhysicsWorld, args: &SpawnArgs, tuning: &Tuning) -> Body {
        let mut body = world.create_body(BodyDesc::dynamic(args.position, tuning.player.mass));
        let shape = Shape::circle(PLAYER_RADIUS)
            .with_filter(mask::PLAYER, mask::WORLD | mask::ENEMY | mask::ITEM)
            .with_material(Material::Player);
        world.add_shape(&mut body, shape);
        body
    }

    fn initial_health(&self) -> Option<u32> {
        Some(5)
    }

    fn always_keep(&self) -> bool {
        true
    }

    fn step(&mut self, body: &mut Body, ctx: &mut StepContext) {
        let v = body.velocity;
        let speed2 = v.length_squared();
        let mut force = if speed2 > 1e-3 {
            -v.normalize() * speed2 * ctx.tuning.player.drag
        } else {
            Vec2::ZERO
        };
        if ctx.input.jet {
            force.y += ctx.tuning.jet_force();
        }
        if !ctx.grounded {
            force.x += ctx.tuning.forward_force();
        }
        body.apply_force(force);

        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        if ctx.input.fire && self.fire_cooldown == 0 {
            self.fire_cooldown = 10;
            let mut req = SpawnRequest::new("Shot.Bullet", body.position + Vec2::new(1.5, 0.0));
            req.args.velocity = body.velocity;
            ctx.spawns.push(req);
        }
    }

    fn emit(&self, body: &Body, frac: f32, sprites: &mut SpriteLayer) {
        sprites.add(SpriteDesc {
            pos: body.interpolated(frac),
            radius: 1.5,
            angle: 0.0,
            color: color::rgb(1.0, 0.0, 0.5),
            sprite: "PStand",
        });
    }

    fn on_damage(&mut self, amount: u32) {
        log::debug!("Player hit for {}", amount);
    }
}

// ---------------------------------------------------------------------------
// Enemies

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    Glider,
    Horiz,
    Silo,
    Diamond,
    Star,
    Ace,
    Turret,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 7] = [
        EnemyKind::Glider,
        EnemyKind::Horiz,
        EnemyKind::Silo,
        EnemyKind::Diamond,
        EnemyKind::Star,
        EnemyKind::Ace,
        EnemyKind::Turret,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Glider => "Glider",
            EnemyKind::Horiz => "Horiz",
            EnemyKind::Silo => "Silo",
            EnemyKind::Diamond => "Diamond",
            EnemyKind::Star => "Star",
            EnemyKind::Ace => "Ace",
            EnemyKind::Turret => "Turret",
        }
    }

    /// Registered name
    pub fn type_name(self) -> &'static str {
        match self {
            EnemyKind::Glider => "Enemy.Glider",
            EnemyKind::Horiz => "Enemy.Horiz",
            EnemyKind::Silo => "Enemy.Silo",
            EnemyKind::Diamond => "Enemy.Diamond",
            EnemyKind::Star => "Enemy.Star",
            EnemyKind::Ace => "Enemy.Ace",
            EnemyKind::Turret => "Enemy.Turret",
        }
    }

    pub fn color(self) -> u32 {
        match self {
            EnemyKind::Glider => hex(0xDCE800),
            EnemyKind::Horiz => hex(0x1C72FC),
            EnemyKind::Silo => hex(0xA7A4B3),
            EnemyKind::Diamond => hex(0x54EBB9),
            EnemyKind::Star => hex(0xFFF8C4),
            EnemyKind::Ace => hex(0xCB30FF),
            EnemyKind::Turret => hex(0xAB8249),
        }
    }

    fn sprite(self) -> &'static str {
        match self {
            EnemyKind::Glider => "EGlider",
            EnemyKind::Horiz => "EHoriz",
            EnemyKind::Silo => "ESilo",
            EnemyKind::Diamond => "EDiamond",
            EnemyKind::Star => "EStar",
            EnemyKind::Ace => "EAce",
            EnemyKind::Turret => "ETurret",
        }
    }

    fn health(self) -> u32 {
        match self {
            EnemyKind::Turret => 3,
            EnemyKind::Silo => 4,
            EnemyKind::Ace => 3,
            EnemyKind::Diamond | EnemyKind::Star => 2,
            EnemyKind::Glider | EnemyKind::Horiz => 1,
        }
    }

    /// Weapon and firing interval in ticks, for kinds that shoot
    fn weapon(self) -> Option<(&'static str, u32)> {
        match self {
            EnemyKind::Turret => Some(("Shot.Bullet", 90)),
            EnemyKind::Silo => Some(("Shot.Rocket", 150)),
            EnemyKind::Ace => Some(("Shot.Homing", 180)),
            _ => None,
        }
    }

    fn constructor(self) -> Constructor {
        match self {
            EnemyKind::Glider => || Box::new(Enemy::new(EnemyKind::Glider)),
            EnemyKind::Horiz => || Box::new(Enemy::new(EnemyKind::Horiz)),
            EnemyKind::Silo => || Box::new(Enemy::new(EnemyKind::Silo)),
            EnemyKind::Diamond => || Box::new(Enemy::new(EnemyKind::Diamond)),
            EnemyKind::Star => || Box::new(Enemy::new(EnemyKind::Star)),
            EnemyKind::Ace => || Box::new(Enemy::new(EnemyKind::Ace)),
            EnemyKind::Turret => || Box::new(Enemy::new(EnemyKind::Turret)),
        }
    }
}

/// Range (units) inside which armed enemies open fire
const FIRE_RANGE: f32 = 30.0;
/// Ticks between contact damage from the same enemy
const CONTACT_COOLDOWN: u32 = 30;

#[derive(Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    anchor: Vec2,
    angle: f32,
    phase: f32,
    reload: u32,
    contact_cooldown: u32,
}

impl Enemy {
    pub fn new(kind: EnemyKind) -> Self {
        Self {
            kind,
            anchor: Vec2::ZERO,
            angle: 0.0,
            phase: 0.0,
            reload: 0,
            contact_cooldown: 0,
        }
    }

    /// Velocity pulling the body toward this tick's patrol point
    fn patrol_velocity(&self, pos: Vec2) -> Vec2 {
        let goal = match self.kind {
            EnemyKind::Glider => self.anchor + Vec2::new(0.0, self.phase.sin() * 2.0),
            EnemyKind::Horiz => self.anchor + Vec2::new(self.phase.sin() * 6.0, 0.0),
            EnemyKind::Star => self.anchor + Vec2::new(self.phase.cos(), self.phase.sin()) * 1.5,
            _ => self.anchor,
        };
        (goal - pos) * 4.0
    }
}

impl GameObject for Enemy {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn class(&self) -> EntityClass {
        EntityClass::Enemy
    }

    fn spawn(&mut self, world: &dyn PhysicsWorld, args: &SpawnArgs, _tuning: &Tuning) -> Body {
        self.anchor = args.position;
        self.angle = args.angle;
        let mut desc = BodyDesc::dynamic(args.position, 2.0);
        desc.angle = args.angle;
        let mut body = world.create_body(desc);
        world.add_shape(
            &mut body,
            Shape::circle(1.2).with_filter(mask::ENEMY, mask::WORLD | mask::PLAYER),
        );
        body
    }

    fn initial_health(&self) -> Option<u32> {
        Some(self.kind.health())
    }

    fn step(&mut self, body: &mut Body, ctx: &mut StepContext) {
        self.phase += SIM_DT * 2.0;
        self.contact_cooldown = self.contact_cooldown.saturating_sub(1);

        if self.anchor.distance_squared(body.position) > 400.0 {
            // knocked far off its post
            self.anchor = body.position;
        }
        body.velocity = self.patrol_velocity(body.position);
        body.apply_force(ctx.hover_force(body.mass));

        let Some((weapon, interval)) = self.kind.weapon() else {
            return;
        };
        self.reload = self.reload.saturating_sub(1);
        let Some(player) = ctx.player else {
            return;
        };
        let to_player = player - body.position;
        if self.reload == 0 && to_player.length() < FIRE_RANGE {
            self.reload = interval + ctx.rng.range(0, 20) as u32;
            let dir = to_player.normalize_or_zero();
            let mut req = SpawnRequest::new(weapon, body.position + dir * 1.5)
                .with_angle(dir.y.atan2(dir.x));
            req.args.is_enemy = true;
            ctx.spawns.push(req);
        }
    }

    fn emit(&self, body: &Body, frac: f32, sprites: &mut SpriteLayer) {
        sprites.add(SpriteDesc {
            pos: body.interpolated(frac),
            radius: 1.5,
            angle: self.angle,
            color: self.kind.color(),
            sprite: self.kind.sprite(),
        });
    }

    fn translate(&mut self, offset: Vec2) {
        self.anchor += offset;
    }

    fn on_contact(&mut self, other: Option<EntityClass>) -> ContactEffect {
        if other == Some(EntityClass::Player) && self.contact_cooldown == 0 {
            self.contact_cooldown = CONTACT_COOLDOWN;
            return ContactEffect {
                damage: 1,
                ..Default::default()
            };
        }
        ContactEffect::default()
    }
}

// ---------------------------------------------------------------------------
// Items

#[derive(Debug, Default)]
pub struct Item {
    taken: bool,
}

impl GameObject for Item {
    fn type_name(&self) -> &'static str {
        "Item"
    }

    fn class(&self) -> EntityClass {
        EntityClass::Item
    }

    fn spawn(&mut self, world: &dyn PhysicsWorld, args: &SpawnArgs, _tuning: &Tuning) -> Body {
        let mut body = world.create_body(BodyDesc::dynamic(args.position, 1.0));
        world.add_shape(
            &mut body,
            Shape::circle(1.5)
                .with_filter(mask::ITEM, mask::PLAYER)
                .as_sensor(),
        );
        body
    }

    fn step(&mut self, body: &mut Body, ctx: &mut StepContext) {
        body.velocity = Vec2::ZERO;
        body.apply_force(ctx.hover_force(body.mass));
    }

    fn emit(&self, body: &Body, frac: f32, sprites: &mut SpriteLayer) {
        sprites.add(SpriteDesc {
            pos: body.interpolated(frac),
            radius: 1.5,
            angle: 0.0,
            color: hex(0xffffff),
            sprite: "IShield2",
        });
    }

    fn on_contact(&mut self, other: Option<EntityClass>) -> ContactEffect {
        if other == Some(EntityClass::Player) && !self.taken {
            self.taken = true;
            log::debug!("Pickup");
            return ContactEffect {
                consumed: true,
                pickup: true,
                ..Default::default()
            };
        }
        ContactEffect::default()
    }
}

// ---------------------------------------------------------------------------
// Shots

/// What a shot does on impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    Damage(u32),
    Explosive { damage: u32, radius: f32 },
}

impl Payload {
    fn impact(self) -> ContactEffect {
        match self {
            Payload::Damage(damage) => ContactEffect {
                damage,
                consumed: true,
                ..Default::default()
            },
            Payload::Explosive { damage, radius } => ContactEffect {
                consumed: true,
                explosion: Some(Explosion { radius, damage }),
                ..Default::default()
            },
        }
    }
}

/// How a shot steers in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guidance {
    Straight,
    /// Turn toward the nearest target at up to `turn_rate` rad/s
    Homing { turn_rate: f32 },
}

impl Guidance {
    fn steer(self, velocity: Vec2, pos: Vec2, target: Option<Vec2>) -> Vec2 {
        let Guidance::Homing { turn_rate } = self else {
            return velocity;
        };
        let Some(target) = target else {
            return velocity;
        };
        let speed = velocity.length();
        let want = (target - pos).normalize_or_zero();
        if speed < 1e-4 || want == Vec2::ZERO {
            return velocity;
        }
        let heading = velocity / speed;
        let max_turn = turn_rate * SIM_DT;
        let turn = heading.angle_to(want).clamp(-max_turn, max_turn);
        Vec2::from_angle(turn).rotate(heading) * speed
    }
}

#[derive(Debug)]
pub struct Shot {
    name: &'static str,
    pub payload: Payload,
    pub guidance: Guidance,
    speed: f32,
    radius: f32,
    lifespan: f32,
    sprite: &'static str,
    is_enemy: bool,
}

impl Shot {
    pub fn bullet() -> Self {
        Self {
            name: "Shot.Bullet",
            payload: Payload::Damage(1),
            guidance: Guidance::Straight,
            speed: 40.0,
            radius: 0.5,
            lifespan: 2.0,
            sprite: "SDot",
            is_enemy: false,
        }
    }

    pub fn rocket() -> Self {
        Self {
            name: "Shot.Rocket",
            payload: Payload::Explosive {
                damage: 2,
                radius: 3.0,
            },
            speed: 25.0,
            radius: 0.6,
            sprite: "SRocket",
            ..Self::bullet()
        }
    }

    pub fn homing() -> Self {
        Self {
            name: "Shot.Homing",
            guidance: Guidance::Homing { turn_rate: PI },
            lifespan: 3.0,
            sprite: "SHoming",
            ..Self::rocket()
        }
    }
}

impl GameObject for Shot {
    fn type_name(&self) -> &'static str {
        self.name
    }

    fn class(&self) -> EntityClass {
        EntityClass::Shot
    }

    fn spawn(&mut self, world: &dyn PhysicsWorld, args: &SpawnArgs, _tuning: &Tuning) -> Body {
        self.is_enemy = args.is_enemy;
        let mut desc = BodyDesc::dynamic(args.position, 0.1);
        desc.angle = args.angle;
        let mut body = world.create_body(desc);
        body.velocity = Vec2::from_angle(args.angle) * self.speed + args.velocity;
        let shape = if self.is_enemy {
            Shape::circle(self.radius).with_filter(mask::ENEMY, mask::WORLD | mask::PLAYER)
        } else {
            Shape::circle(self.radius).with_filter(mask::PLAYER, mask::WORLD | mask::ENEMY)
        };
        world.add_shape(&mut body, shape.as_sensor());
        body
    }

    fn lifespan(&self) -> Option<f32> {
        Some(self.lifespan)
    }

    fn step(&mut self, body: &mut Body, ctx: &mut StepContext) {
        let target = if self.is_enemy {
            ctx.player
        } else {
            ctx.enemies
                .iter()
                .copied()
                .min_by(|a, b| {
                    a.distance_squared(body.position)
                        .partial_cmp(&b.distance_squared(body.position))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        };
        body.velocity = self.guidance.steer(body.velocity, body.position, target);
        body.angle = body.velocity.y.atan2(body.velocity.x);
        body.apply_force(ctx.hover_force(body.mass));
    }

    fn emit(&self, body: &Body, frac: f32, sprites: &mut SpriteLayer) {
        let color = if self.is_enemy {
            color::rgb(1.0, 0.3, 0.2)
        } else {
            color::rgb(0.3, 0.9, 1.0)
        };
        sprites.add(SpriteDesc {
            pos: body.interpolated(frac),
            radius: self.radius * 2.0,
            angle: body.angle,
            color,
            sprite: self.sprite,
        });
    }

    fn on_contact(&mut self, other: Option<EntityClass>) -> ContactEffect {
        match other {
            None => ContactEffect {
                consumed: true,
                ..self.payload.impact()
            },
            Some(EntityClass::Player) | Some(EntityClass::Enemy) => self.payload.impact(),
            Some(_) => ContactEffect::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::ArcadeWorld;

    fn world() -> ArcadeWorld {
        ArcadeWorld::create(Vec2::new(0.0, -50.0))
    }

    #[test]
    fn test_defaults_registered() {
        let reg = Registry::with_defaults();
        for name in ["Player", "Item", "Enemy.Turret", "Enemy.Glider", "Shot.Homing"] {
            assert!(reg.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut reg = Registry::with_defaults();
        assert!(!reg.register(None, "Item", || Box::new(Item::default())));
    }

    #[test]
    fn test_unknown_name_spawns_nothing() {
        let reg = Registry::with_defaults();
        let mut w = world();
        let e = reg.spawn("Enemy.Dragon", 1, &SpawnArgs::at(Vec2::ZERO), &mut w, &Tuning::default(), 0);
        assert!(e.is_none());
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn test_spawn_tags_body_and_lifespan() {
        let reg = Registry::with_defaults();
        let mut w = world();
        let e = reg
            .spawn("Shot.Bullet", 42, &SpawnArgs::at(Vec2::ZERO), &mut w, &Tuning::default(), 100)
            .unwrap();
        let body = w.body(e.body.unwrap()).unwrap();
        assert_eq!(body.entity, Some(42));
        assert!((body.velocity.x - 40.0).abs() < 1e-4);
        assert_eq!(e.end_tick, Some(100 + 120));
    }

    #[test]
    fn test_lifespan_rounds_up_to_whole_ticks() {
        assert_eq!(lifespan_ticks(2.0), 120);
        assert_eq!(lifespan_ticks(1.005), 61);
        assert_eq!(lifespan_ticks(0.001), 1);
        assert_eq!(lifespan_ticks(0.0), 0);
    }

    #[test]
    fn test_only_player_is_always_kept() {
        let reg = Registry::with_defaults();
        let mut w = world();
        let t = Tuning::default();
        let player = reg.spawn("Player", 1, &SpawnArgs::at(Vec2::ZERO), &mut w, &t, 0).unwrap();
        let turret = reg.spawn("Enemy.Turret", 2, &SpawnArgs::at(Vec2::ZERO), &mut w, &t, 0).unwrap();
        assert!(player.object.always_keep());
        assert!(!turret.object.always_keep());
    }

    #[test]
    fn test_damage_kills_at_zero() {
        let mut e = Entity {
            id: 1,
            object: Box::new(Enemy::new(EnemyKind::Diamond)),
            body: None,
            health: Some(2),
            end_tick: None,
            dead: false,
        };
        assert!(!e.damage(1));
        assert!(e.damage(5));
        assert!(e.dead);
        assert!(!e.damage(1));
    }

    #[test]
    fn test_item_collected_once() {
        let mut item = Item::default();
        assert_eq!(item.on_contact(Some(EntityClass::Enemy)), ContactEffect::default());
        let first = item.on_contact(Some(EntityClass::Player));
        assert!(first.pickup && first.consumed);
        assert!(!item.on_contact(Some(EntityClass::Player)).pickup);
    }

    #[test]
    fn test_rocket_payload_explodes() {
        let mut rocket = Shot::rocket();
        let effect = rocket.on_contact(Some(EntityClass::Player));
        assert!(effect.consumed);
        assert_eq!(effect.damage, 0);
        assert_eq!(effect.explosion, Some(Explosion { radius: 3.0, damage: 2 }));
        assert!(rocket.on_contact(None).consumed);
    }

    #[test]
    fn test_homing_turn_is_rate_limited() {
        let g = Guidance::Homing { turn_rate: PI };
        let v = g.steer(Vec2::new(10.0, 0.0), Vec2::ZERO, Some(Vec2::new(0.0, 10.0)));
        let turned = Vec2::X.angle_to(v.normalize());
        assert!((turned - PI * SIM_DT).abs() < 1e-4);
        assert!((v.length() - 10.0).abs() < 1e-3);
        assert_eq!(Guidance::Straight.steer(Vec2::X, Vec2::ZERO, Some(Vec2::Y)), Vec2::X);
    }
}
