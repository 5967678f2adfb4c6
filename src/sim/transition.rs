//! Segment handoff
//!
//! When the player passes the exit anchor of the current segment, a fresh
//! world is built around a new segment whose entry anchor sits at the
//! origin. The player and anything close behind it are carried over,
//! shifted so that their position relative to the terrain is unchanged.

use glam::{IVec2, Vec2};

use super::entity::Entity;
use super::game::Game;
use super::physics::{Body, PhysicsWorld};
use super::rng::RngState;
use super::segment::{EmittedSegment, Segment};
use super::style::generate_segment;

/// Offset taking the old frame to the new one
pub fn rebase_offset(old_exit: IVec2, new_entry: IVec2) -> Vec2 {
    (new_entry - old_exit).as_vec2()
}

/// Left edge and starting heights of the segment following `prev`
///
/// The old exit anchor maps to x = 0 and heights are measured from its y,
/// so coordinates stay small however long the run.
pub fn next_origin(prev: &EmittedSegment) -> (i32, i32, i32) {
    let exit = prev.buffers[1];
    let (floor, ceiling) = prev.exit_heights();
    (-(prev.x1 - exit.x), floor - exit.y, ceiling - exit.y)
}

impl<W: PhysicsWorld> Game<W> {
    /// Hand off to the next segment once the player reaches the exit anchor
    pub fn maybe_transition(&mut self) -> bool {
        let exit_x = self.segment.buffers[1].x as f32;
        match self.player_position() {
            Some(p) if p.x >= exit_x => {
                self.transition();
                true
            }
            _ => false,
        }
    }

    /// Put the player on the exit anchor and hand off straight away
    pub fn skip_segment(&mut self) {
        let exit = self.segment.buffers[1].as_vec2();
        let id = self.player_id;
        if let Some(body) = id.and_then(|id| self.body_of_mut(id)) {
            body.position = exit;
            body.previous_position = exit;
            body.velocity = Vec2::ZERO;
        }
        self.transition();
    }

    /// Swap in a new segment and world, carrying retained entities over
    pub(crate) fn transition(&mut self) {
        let exit = self.segment.buffers[1];
        // never reach back past the exit buffer
        let window = self
            .tuning
            .retain_window
            .min((self.tuning.buffer_width / 2 - 1) as f32)
            .max(0.0);
        let cutoff = exit.x as f32 - window;

        let mut retained: Vec<(Entity, Body)> = Vec::new();
        for mut entity in std::mem::take(&mut self.entities) {
            let body = match entity.body.take() {
                Some(h) if !entity.dead => self.world.body(h).cloned(),
                _ => None,
            };
            let Some(body) = body else {
                log::trace!("Dropping {} {} without a live body", entity.object.type_name(), entity.id);
                continue;
            };
            if entity.object.always_keep() || body.position.x >= cutoff {
                retained.push((entity, body));
            }
        }

        self.world = W::create(Vec2::new(0.0, -self.tuning.gravity));
        self.tiles.clear();

        self.segment_index += 1;
        let (x0, floor_y, ceiling_y) = next_origin(&self.segment);
        let mut seg = Segment::new(x0, floor_y, ceiling_y, &self.tuning);
        let mut rng = RngState {
            seed: self.seed,
            stream: self.segment_index,
        }
        .to_rng();
        let style = self.styles.choose(&mut rng);
        generate_segment(&mut seg, style, &mut rng);
        let next = seg.emit(&mut self.world, &mut self.tiles, &mut self.camera, &mut rng);

        let offset = rebase_offset(exit, next.buffers[0]);
        self.camera.add_offset(offset);
        self.background.add_offset(offset);

        let kept = retained.len();
        for (mut entity, mut body) in retained {
            body.translate(offset);
            entity.object.translate(offset);
            entity.body = Some(self.world.add_body(body));
            self.entities.push(entity);
        }

        let spawns = next.spawns.clone();
        log::info!(
            "Segment {} ({}): width {}, kept {} entities, offset ({}, {})",
            self.segment_index,
            style.name(),
            next.width(),
            kept,
            offset.x,
            offset.y
        );
        self.segment = next;
        self.spawn_requests(spawns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::SpawnArgs;
    use crate::sim::game::TickInput;
    use crate::tuning::Tuning;

    fn game(seed: u64) -> Game {
        Game::new(seed, Tuning::default())
    }

    fn teleport_player(g: &mut Game, to: Vec2) {
        let id = g.player_id().unwrap();
        let body = g.body_of_mut(id).unwrap();
        body.position = to;
        body.previous_position = to;
        body.velocity = Vec2::ZERO;
    }

    #[test]
    fn test_next_origin_puts_exit_at_zero() {
        let g = game(1);
        let prev = g.segment();
        let (x0, f, c) = next_origin(prev);
        assert_eq!(x0, -g.tuning().buffer_width / 2);
        let (pf, pc) = prev.exit_heights();
        assert_eq!(c - f, pc - pf);
        assert_eq!(crate::floor_mid(f, c), 0);
    }

    #[test]
    fn test_crossing_exit_transitions() {
        let mut g = game(2);
        let exit = g.segment().buffers[1].as_vec2();
        teleport_player(&mut g, exit + Vec2::new(1.0, 0.0));
        g.step(&TickInput::default());
        assert_eq!(g.segment_index(), 1);
        assert_eq!(g.segment().buffers[0], IVec2::ZERO);
        let p = g.player_position().unwrap();
        assert!(p.x > 0.5 && p.x < 2.0, "player at {p}");
    }

    #[test]
    fn test_player_keeps_place_relative_to_terrain() {
        let mut g = game(3);
        let exit = g.segment().buffers[1];
        let p = exit.as_vec2() + Vec2::new(2.0, -3.0);
        teleport_player(&mut g, p);
        let old_floor = g.segment().floor.height_at(p.x as i32).unwrap();
        let old_ceiling = g.segment().ceiling.height_at(p.x as i32).unwrap();

        g.transition();
        let q = g.player_position().unwrap();
        assert_eq!(q, p - exit.as_vec2());
        let new_floor = g.segment().floor.height_at(q.x as i32).unwrap();
        let new_ceiling = g.segment().ceiling.height_at(q.x as i32).unwrap();
        assert_eq!(old_floor as f32 - p.y, new_floor as f32 - q.y);
        assert_eq!(old_ceiling as f32 - p.y, new_ceiling as f32 - q.y);
    }

    #[test]
    fn test_retains_near_drops_far() {
        let mut g = game(4);
        let exit = g.segment().buffers[1].as_vec2();
        let near = g.spawn("Item", SpawnArgs::at(exit + Vec2::new(-2.0, 0.0))).unwrap();
        let far = g.spawn("Item", SpawnArgs::at(Vec2::new(20.0, 0.0))).unwrap();
        let dead = g.spawn("Enemy.Glider", SpawnArgs::at(exit)).unwrap();
        let idx = g.entities.iter().position(|e| e.id == dead).unwrap();
        g.entities[idx].dead = true;
        teleport_player(&mut g, exit + Vec2::new(1.0, 0.0));

        g.transition();
        assert!(g.entity(near).is_some());
        assert!(g.entity(far).is_none());
        assert!(g.entity(dead).is_none());
        assert!(g.entity(g.player_id().unwrap()).is_some());
        let item = g.body_of(near).unwrap();
        assert_eq!(item.position, Vec2::new(-2.0, 0.0));
        assert_eq!(item.entity, Some(near));
    }

    #[test]
    fn test_missing_body_is_dropped_silently() {
        let mut g = game(5);
        let exit = g.segment().buffers[1].as_vec2();
        let id = g.spawn("Item", SpawnArgs::at(exit)).unwrap();
        let handle = g.entity(id).unwrap().body.unwrap();
        g.world.remove_body(handle);
        teleport_player(&mut g, exit + Vec2::new(1.0, 0.0));
        g.transition();
        assert!(g.entity(id).is_none());
    }

    #[test]
    fn test_camera_and_background_shifted() {
        let mut g = game(6);
        let exit = g.segment().buffers[1];
        let before = g.camera.update(0.0);
        g.background.update(before);
        let bg_before = g.background.pos;
        teleport_player(&mut g, exit.as_vec2());

        g.transition();
        let offset = -exit.as_vec2();
        let after = g.camera.update(0.0);
        assert_eq!(after, before + offset);
        // the background pattern does not jump
        g.background.update(after);
        assert!((g.background.pos - bg_before).length() < 1e-3);
    }

    #[test]
    fn test_skip_lands_player_on_new_entry() {
        let mut g = game(1);
        g.skip_segment();
        assert_eq!(g.segment_index(), 1);
        let p = g.player_position().unwrap();
        let seg = g.segment();
        assert!(p.x >= seg.x0 as f32 && p.x <= seg.x1 as f32, "player at {p}");
        assert_eq!(p, seg.buffers[0].as_vec2());
        let x = p.x as i32;
        assert!(seg.floor.height_at(x).unwrap() < 0);
        assert!(seg.ceiling.height_at(x).unwrap() > 0);
    }

    #[test]
    fn test_new_world_holds_only_new_geometry() {
        let mut g = game(7);
        let exit = g.segment().buffers[1].as_vec2();
        teleport_player(&mut g, exit);
        g.transition();
        let s = g.segment().stats;
        let geometry = s.base_volumes + s.run_boxes + s.block_boxes + s.seam_walls;
        assert_eq!(g.world().body_count(), geometry + g.entities().len());
    }
}
