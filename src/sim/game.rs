//! Fixed timestep game driver
//!
//! Owns the physics world, the live entities and the current segment.
//! Each step runs entity logic, physics, contact effects and lifespans in
//! entity id order, then checks for a segment transition.

use glam::Vec2;

use super::camera::{Background, Camera};
use super::draw::{SpriteLayer, TileLayer};
use super::entity::{Entity, EntityClass, Explosion, Registry, SpawnArgs, SpawnRequest, StepContext};
use super::physics::{ArcadeWorld, Body, BodyHandle, PhysicsWorld, is_grounded};
use super::rng::{GenRng, RngState};
use super::segment::{EmittedSegment, Segment};
use super::style::{LevelStyle, StylePicker, generate_segment};
use super::time::FrameClock;
use crate::consts::SIM_DT;
use crate::tuning::Tuning;

/// Points for collecting an item
const PICKUP_SCORE: u32 = 10;
/// Points for destroying an enemy
const KILL_SCORE: u32 = 100;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Playing,
    GameOver,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Jetpack held
    pub jet: bool,
    /// Fire held
    pub fire: bool,
    /// Idle/demo mode - autopilot flies the player
    pub idle_mode: bool,
}

/// Complete game state
pub struct Game<W: PhysicsWorld = ArcadeWorld> {
    pub(crate) tuning: Tuning,
    pub(crate) seed: u64,
    /// Simulation randomness, separate from per-segment generation streams
    pub(crate) rng: GenRng,
    pub(crate) world: W,
    pub(crate) registry: Registry,
    /// Live entities, ascending by id
    pub(crate) entities: Vec<Entity>,
    pub(crate) next_id: u32,
    pub(crate) player_id: Option<u32>,
    pub(crate) segment: EmittedSegment,
    pub(crate) segment_index: u64,
    pub(crate) styles: StylePicker,
    pub(crate) tiles: TileLayer,
    pub(crate) sprites: SpriteLayer,
    pub(crate) camera: Camera,
    pub(crate) background: Background,
    pub(crate) clock: FrameClock,
    pub(crate) tick: u64,
    pub(crate) phase: GamePhase,
    pub(crate) score: u32,
}

impl<W: PhysicsWorld> Game<W> {
    /// New game: an open first segment with the player on its entry buffer
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut world = W::create(Vec2::new(0.0, -tuning.gravity));
        let mut tiles = TileLayer::new();
        let mut camera = Camera::new(1.0 / SIM_DT);

        // start mid-range; split an odd gap so it stays whole
        let gap = tuning.min_gap + tuning.gap_span() / 2;
        let floor_y = -gap / 2;
        let mut seg = Segment::new(-tuning.buffer_width / 2, floor_y, floor_y + gap, &tuning);
        let mut gen_rng = RngState::new(seed).to_rng();
        generate_segment(&mut seg, LevelStyle::Open, &mut gen_rng);
        let segment = seg.emit(&mut world, &mut tiles, &mut camera, &mut gen_rng);

        let mut game = Self {
            styles: StylePicker::from(tuning.styles),
            tuning,
            seed,
            rng: GenRng::with_stream(seed, u64::MAX),
            world,
            registry: Registry::with_defaults(),
            entities: Vec::new(),
            next_id: 1,
            player_id: None,
            segment,
            segment_index: 0,
            tiles,
            sprites: SpriteLayer::default(),
            camera,
            background: Background::default(),
            clock: FrameClock::default(),
            tick: 0,
            phase: GamePhase::Playing,
            score: 0,
        };

        let entry = game.segment.buffers[0].as_vec2();
        game.player_id = game.spawn("Player", SpawnArgs::at(entry));
        let spawns = game.segment.spawns.clone();
        game.spawn_requests(spawns);
        game.camera.reset(entry, Vec2::ZERO);

        log::info!("New game (seed {})", seed);
        game
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn segment(&self) -> &EmittedSegment {
        &self.segment
    }

    /// Number of transitions so far
    pub fn segment_index(&self) -> u64 {
        self.segment_index
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn tiles(&self) -> &TileLayer {
        &self.tiles
    }

    pub fn sprites(&self) -> &SpriteLayer {
        &self.sprites
    }

    pub fn player_id(&self) -> Option<u32> {
        self.player_id
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn body_of(&self, id: u32) -> Option<&Body> {
        let handle = self.entity(id)?.body?;
        self.world.body(handle)
    }

    pub fn body_of_mut(&mut self, id: u32) -> Option<&mut Body> {
        let handle = self.entity(id)?.body?;
        self.world.body_mut(handle)
    }

    pub fn player_body(&self) -> Option<&Body> {
        self.body_of(self.player_id?)
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player_body().map(|b| b.position)
    }

    /// Spawn a registered kind now; returns its id
    pub fn spawn(&mut self, name: &str, args: SpawnArgs) -> Option<u32> {
        let id = self.next_id;
        let entity = self
            .registry
            .spawn(name, id, &args, &mut self.world, &self.tuning, self.tick)?;
        self.next_id += 1;
        self.entities.push(entity);
        Some(id)
    }

    pub(crate) fn spawn_requests(&mut self, requests: Vec<SpawnRequest>) {
        for req in requests {
            self.spawn(req.kind, req.args);
        }
    }

    fn entity_at(&self, handle: BodyHandle) -> Option<usize> {
        let id = self.world.body(handle)?.entity?;
        self.index_of(id)
    }

    /// Autopilot: hold the jet below the camera line, fire at enemies ahead
    fn autopilot(&self, input: &mut TickInput) {
        let Some(body) = self.player_body() else {
            return;
        };
        let p = body.position;
        let target = self.camera.target().y_at(p.x);
        input.jet = p.y + body.velocity.y * 0.2 < target;
        input.fire = self.entities.iter().any(|e| {
            e.class() == EntityClass::Enemy
                && e.body
                    .and_then(|h| self.world.body(h))
                    .is_some_and(|b| {
                        let d = b.position - p;
                        d.x > 0.0 && d.x < 25.0 && d.y.abs() < 3.0
                    })
        });
    }

    /// Advance one fixed step
    pub fn step(&mut self, input: &TickInput) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        let mut input = input.clone();
        if input.idle_mode {
            self.autopilot(&mut input);
        }
        self.tick += 1;

        let player = self.player_position();
        let enemies: Vec<Vec2> = self
            .entities
            .iter()
            .filter(|e| e.class() == EntityClass::Enemy && !e.dead)
            .filter_map(|e| self.world.body(e.body?).map(|b| b.position))
            .collect();

        let mut spawns = Vec::new();
        for entity in self.entities.iter_mut().filter(|e| !e.dead) {
            let Some(handle) = entity.body else {
                continue;
            };
            let grounded = is_grounded(&self.world, handle);
            let Some(body) = self.world.body_mut(handle) else {
                continue;
            };
            let mut ctx = StepContext {
                tick: self.tick,
                input: &input,
                tuning: &self.tuning,
                player,
                enemies: &enemies,
                grounded,
                rng: &mut self.rng,
                spawns: &mut spawns,
            };
            entity.object.step(body, &mut ctx);
        }

        self.world.step(self.clock.dt());
        self.dispatch_contacts();
        self.expire();
        self.remove_dead();
        self.spawn_requests(spawns);

        if let Some(body) = self.player_body() {
            let (p, v) = (body.position, body.velocity);
            self.camera.step(p, v);
        }

        self.maybe_transition();
    }

    fn dispatch_contacts(&mut self) {
        let contacts = self.world.contacts().to_vec();
        let mut explosions = Vec::new();
        for c in contacts {
            let a = self.entity_at(c.a);
            let b = self.entity_at(c.b);
            self.touch(a, b, &mut explosions);
            self.touch(b, a, &mut explosions);
        }
        for (centre, explosion) in explosions {
            self.explode(centre, explosion);
        }
    }

    /// Run `me`'s contact handler against `other` (`None` is level geometry)
    fn touch(&mut self, me: Option<usize>, other: Option<usize>, explosions: &mut Vec<(Vec2, Explosion)>) {
        let Some(i) = me else {
            return;
        };
        if self.entities[i].dead {
            return;
        }
        let other_class = other.map(|j| self.entities[j].class());
        let effect = self.entities[i].object.on_contact(other_class);

        if let Some(j) = other.filter(|_| effect.damage > 0) {
            self.damage(j, effect.damage);
        }
        if effect.pickup {
            self.score += PICKUP_SCORE;
        }
        if let Some(explosion) = effect.explosion {
            let centre = self.entities[i]
                .body
                .and_then(|h| self.world.body(h))
                .map(|b| b.position);
            if let Some(centre) = centre {
                explosions.push((centre, explosion));
            }
        }
        if effect.consumed {
            self.entities[i].dead = true;
        }
    }

    fn damage(&mut self, index: usize, amount: u32) {
        let entity = &mut self.entities[index];
        if !entity.damage(amount) {
            return;
        }
        match entity.class() {
            EntityClass::Enemy => {
                self.score += KILL_SCORE;
                log::debug!("{} destroyed", entity.object.type_name());
            }
            EntityClass::Player => {
                self.phase = GamePhase::GameOver;
                log::info!("Game over at tick {} (score {})", self.tick, self.score);
            }
            _ => {}
        }
    }

    fn explode(&mut self, centre: Vec2, explosion: Explosion) {
        let hit: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.dead && e.health.is_some())
            .filter_map(|(i, e)| {
                let body = self.world.body(e.body?)?;
                (body.position.distance(centre) <= explosion.radius + body.bounding_radius()).then_some(i)
            })
            .collect();
        for i in hit {
            self.damage(i, explosion.damage);
        }
    }

    fn expire(&mut self) {
        let tick = self.tick;
        for entity in &mut self.entities {
            if entity.end_tick.is_some_and(|end| tick >= end) {
                entity.dead = true;
            }
        }
    }

    fn remove_dead(&mut self) {
        let world = &mut self.world;
        self.entities.retain_mut(|e| {
            if !e.dead {
                return true;
            }
            if let Some(h) = e.body.take() {
                world.remove_body(h);
            }
            false
        });
    }

    /// Run as many fixed steps as `real_dt` covers; returns the step count
    pub fn update(&mut self, real_dt: f32, input: &TickInput) -> u32 {
        let steps = self.clock.advance(real_dt);
        for _ in 0..steps {
            self.step(input);
        }
        steps
    }

    /// Refresh sprites for rendering; returns the interpolated camera position
    pub fn emit_frame(&mut self) -> Vec2 {
        let frac = self.clock.frac();
        self.sprites.clear();
        for entity in &self.entities {
            if let Some(body) = entity.body.and_then(|h| self.world.body(h)) {
                entity.object.emit(body, frac, &mut self.sprites);
            }
        }
        let pos = self.camera.update(frac);
        self.background.update(pos);
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(seed: u64) -> Game {
        Game::new(seed, Tuning::default())
    }

    #[test]
    fn test_player_starts_on_entry_buffer() {
        let g = game(1);
        let entry = g.segment().buffers[0].as_vec2();
        assert_eq!(g.player_position(), Some(entry));
        assert_eq!(entry.x, 0.0);
        assert!(g.entity(g.player_id().unwrap()).unwrap().object.always_keep());
        assert!(!g.tiles().is_empty());
    }

    #[test]
    fn test_entities_sorted_by_id() {
        let mut g = game(2);
        for _ in 0..120 {
            g.step(&TickInput {
                fire: true,
                ..Default::default()
            });
        }
        for pair in g.entities().windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_bullets_expire() {
        let mut g = game(3);
        let id = g
            .spawn("Shot.Bullet", SpawnArgs::at(Vec2::new(0.0, 0.0)))
            .unwrap();
        assert!(g.entity(id).is_some());
        for _ in 0..130 {
            g.step(&TickInput::default());
        }
        assert!(g.entity(id).is_none());
    }

    #[test]
    fn test_item_pickup_scores() {
        let mut g = game(4);
        let p = g.player_position().unwrap();
        let id = g.spawn("Item", SpawnArgs::at(p)).unwrap();
        g.step(&TickInput::default());
        assert!(g.entity(id).is_none());
        assert_eq!(g.score(), PICKUP_SCORE);
    }

    #[test]
    fn test_unknown_spawn_ignored() {
        let mut g = game(5);
        let before = g.entities().len();
        assert!(g.spawn("Enemy.Dragon", SpawnArgs::at(Vec2::ZERO)).is_none());
        assert_eq!(g.entities().len(), before);
    }

    #[test]
    fn test_update_runs_whole_steps() {
        let mut g = game(6);
        let steps = g.update(SIM_DT * 3.5, &TickInput::default());
        assert_eq!(steps, 3);
        assert_eq!(g.tick(), 3);
        g.emit_frame();
        assert!(!g.sprites().sprites().is_empty());
    }

    #[test]
    fn test_jet_lifts_player() {
        let mut g = game(7);
        let y0 = g.player_position().unwrap().y;
        for _ in 0..20 {
            g.step(&TickInput {
                jet: true,
                ..Default::default()
            });
        }
        assert!(g.player_position().unwrap().y > y0);
    }
}
