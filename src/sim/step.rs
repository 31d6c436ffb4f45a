//! Per-frame simulation driver.
//!
//! [`Sim`] owns the ECS world, the frame counter, and the transient
//! per-step outputs (marks, sight map).  The grid stays owned by the
//! level loader's caller and is passed in mutably each step; the only
//! grid mutations are tile activation and the timer tick.
//!
//! Step order: player turn + move, guard AI, tile timers, bounded
//! collision settle, facing/activation test, sight recompute.  A step
//! never fails; every degraded condition is logged and play goes on.

use glam::IVec2;
use hecs::{Entity, World};
use smallvec::SmallVec;

use super::ai;
use super::collision::settle;
use super::components::{Body, Buttons, Guard, GuardState, Heading, Position};
use super::config::Tuning;
use super::marks::{MarkBuf, MarkKind};
use super::sight::{SightMap, compute_visible};
use crate::level::{Grid, TILE_SIZE, px_to_tile};

/// Owns the actors and drives one simulation step per rendered frame.
pub struct Sim {
    world: World,
    player: Entity,
    frame: u64,
    tuning: Tuning,
    marks: MarkBuf,
    sight: Option<SightMap>,
}

impl Sim {
    /// Create the simulation with the player spawned at `pos`
    /// (pixel units) facing `heading` degrees.
    pub fn new(tuning: Tuning, pos: IVec2, heading: i32) -> Self {
        let mut world = World::new();
        let player = world.spawn((
            Position(pos),
            Heading(heading),
            Body {
                radius: tuning.actor_radius,
            },
        ));
        Sim {
            world,
            player,
            frame: 0,
            tuning,
            marks: MarkBuf::new(),
            sight: None,
        }
    }

    /// Spawn a guard idling at its post.
    pub fn spawn_guard(&mut self, pos: IVec2, heading: i32) -> Entity {
        self.world.spawn((
            Position(pos),
            Heading(heading),
            Body {
                radius: self.tuning.actor_radius,
            },
            Guard {
                home: pos,
                home_heading: heading,
                state: GuardState::Idle,
            },
        ))
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn player(&self) -> Entity {
        self.player
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Marks emitted by the most recent step.
    #[inline]
    pub fn marks(&self) -> &[super::marks::Mark] {
        self.marks.as_slice()
    }

    /// Player visibility for the most recent step; `None` means
    /// "nothing visible" and should render fully obscured.
    #[inline]
    pub fn sight(&self) -> Option<&SightMap> {
        self.sight.as_ref()
    }

    /// Advance the world by one frame.
    pub fn step(&mut self, grid: &mut Grid, buttons: Buttons) {
        self.frame += 1;
        self.marks.clear();

        self.player_move(buttons);
        ai::guard_system(
            &mut self.world,
            grid,
            self.player,
            self.frame,
            &self.tuning,
            &mut self.marks,
        );
        grid.advance_timers();
        self.settle_bodies(grid);
        self.facing_tile(grid, buttons);

        let (ppos, ..) = self.player_pose();
        self.sight = compute_visible(
            grid,
            IVec2::new(px_to_tile(ppos.x), px_to_tile(ppos.y)),
            self.tuning.sight_radius,
        );
    }

    /*──────────────────── internals ────────────────────*/

    fn player_pose(&self) -> (IVec2, i32, i32) {
        let pos = self.world.get::<&Position>(self.player).map(|p| p.0);
        let heading = self.world.get::<&Heading>(self.player).map(|h| h.0);
        let radius = self.world.get::<&Body>(self.player).map(|b| b.radius);
        (
            pos.unwrap_or(IVec2::ZERO),
            heading.unwrap_or(0),
            radius.unwrap_or(self.tuning.actor_radius),
        )
    }

    /// Turn resolves before translation, so a simultaneous
    /// forward+left input advances along the *new* heading.
    fn player_move(&mut self, buttons: Buttons) {
        let Ok((pos, heading)) = self
            .world
            .query_one_mut::<(&mut Position, &mut Heading)>(self.player)
        else {
            return;
        };

        if buttons.intersects(Buttons::LEFT | Buttons::RIGHT) {
            let turn = if buttons.contains(Buttons::LEFT) {
                self.tuning.turn_rate
            } else {
                -self.tuning.turn_rate
            };
            heading.turn(turn);
        }
        if buttons.intersects(Buttons::FORWARD | Buttons::BACKWARD) {
            let step = if buttons.contains(Buttons::FORWARD) {
                self.tuning.forward_step
            } else {
                -self.tuning.backward_step
            };
            pos.0 += heading.displacement(step);
        }
    }

    /// Snapshot every body (player first, then guards in world
    /// order), run the bounded settle loop, write positions back.
    fn settle_bodies(&mut self, grid: &Grid) {
        let mut ents: SmallVec<[Entity; 8]> = SmallVec::new();
        let mut bodies: SmallVec<[(IVec2, i32); 8]> = SmallVec::new();

        let (ppos, _, pradius) = self.player_pose();
        ents.push(self.player);
        bodies.push((ppos, pradius));
        for (e, (pos, body, _)) in self.world.query_mut::<(&Position, &Body, &Guard)>() {
            ents.push(e);
            bodies.push((pos.0, body.radius));
        }

        settle(grid, &mut bodies);

        for (e, body) in ents.iter().zip(bodies.iter()) {
            if let Ok(pos) = self.world.query_one_mut::<&mut Position>(*e) {
                pos.0 = body.0;
            }
        }
    }

    /// Probe one point past the player's footprint along its heading;
    /// an activatable tile there is triggered (button held) or marked
    /// for UI feedback.  Also drops the standing-on mark.
    fn facing_tile(&mut self, grid: &mut Grid, buttons: Buttons) {
        let (pos, heading, radius) = self.player_pose();
        let probe = pos + Heading(heading).displacement(radius + TILE_SIZE / 2);
        let (tx, ty) = (px_to_tile(probe.x), px_to_tile(probe.y));
        if grid.in_bounds(tx, ty) && grid.can_be_activated(tx, ty) {
            if buttons.contains(Buttons::ACTIVATE) {
                grid.trigger(tx, ty);
            } else {
                self.marks.push_tile(MarkKind::Facing, tx, ty);
            }
        }
        self.marks
            .push_tile(MarkKind::StandingOn, px_to_tile(pos.x), px_to_tile(pos.y));
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{parse_level, tile_to_px_center};

    fn center(tx: i32, ty: i32) -> IVec2 {
        IVec2::new(tile_to_px_center(tx), tile_to_px_center(ty))
    }

    fn open_room() -> Grid {
        parse_level("########\n#      #\n#      #\n#      #\n########").unwrap()
    }

    fn pose(sim: &Sim) -> (IVec2, i32) {
        let (p, h, _) = sim.player_pose();
        (p, h)
    }

    #[test]
    fn forward_and_left_turn_before_translating() {
        let mut grid = open_room();
        let start = center(3, 2);
        let mut sim = Sim::new(Tuning::default(), start, 0);
        sim.step(&mut grid, Buttons::FORWARD | Buttons::LEFT);
        let (pos, heading) = pose(&sim);
        assert_eq!(heading, 6);
        // 50 units along 6°: (49.7, -5.2) rounded away from zero
        assert_eq!(pos, start + IVec2::new(50, -5));
    }

    #[test]
    fn backward_is_slower_than_forward() {
        let mut grid = open_room();
        let start = center(3, 2);
        let mut sim = Sim::new(Tuning::default(), start, 0);
        sim.step(&mut grid, Buttons::BACKWARD);
        let (pos, _) = pose(&sim);
        assert_eq!(pos, start - IVec2::new(30, 0));
    }

    #[test]
    fn walls_stop_the_player() {
        let mut grid = open_room();
        let mut sim = Sim::new(Tuning::default(), center(1, 1), 180);
        for _ in 0..20 {
            sim.step(&mut grid, Buttons::FORWARD);
        }
        let (pos, _) = pose(&sim);
        // settled flush against the left wall: x = wall edge + radius
        assert_eq!(pos.x, TILE_SIZE + 100);
    }

    #[test]
    fn facing_a_door_marks_then_activates() {
        let mut grid = parse_level("#####\n# + #\n#####").unwrap();
        let mut sim = Sim::new(Tuning::default(), center(1, 1), 0);

        sim.step(&mut grid, Buttons::empty());
        assert!(sim.marks().iter().any(|m| m.kind == MarkKind::Facing));
        assert!(!grid.tile(2, 1).active);

        sim.step(&mut grid, Buttons::ACTIVATE);
        assert_eq!(grid.tile(2, 1).flips_in, 10);
        // triggered at frame f: open exactly after 10 more steps
        for _ in 0..9 {
            sim.step(&mut grid, Buttons::empty());
            assert!(!grid.tile(2, 1).active);
        }
        sim.step(&mut grid, Buttons::empty());
        assert!(grid.tile(2, 1).active);
    }

    #[test]
    fn standing_on_mark_is_always_present() {
        let mut grid = open_room();
        let mut sim = Sim::new(Tuning::default(), center(2, 2), 0);
        sim.step(&mut grid, Buttons::empty());
        let m = sim
            .marks()
            .iter()
            .find(|m| m.kind == MarkKind::StandingOn)
            .unwrap();
        assert_eq!(m.pos, center(2, 2));
    }

    #[test]
    fn sight_is_recomputed_each_step() {
        let mut grid = open_room();
        let mut sim = Sim::new(Tuning::default(), center(2, 2), 0);
        sim.step(&mut grid, Buttons::empty());
        let sight = sim.sight().expect("sight map for an in-bounds player");
        assert!(sight.raw(2, 2));
        assert!(sight.sight_get(3, 2));
    }

    #[test]
    fn overlapping_actors_separate_in_one_step() {
        let mut grid = open_room();
        let mut sim = Sim::new(Tuning::default(), center(3, 2), 0);
        let gpos = center(3, 2) + IVec2::new(120, 0);
        let guard = sim.spawn_guard(gpos, 180);
        sim.step(&mut grid, Buttons::empty());
        let p = sim.world().get::<&Position>(sim.player()).unwrap().0;
        let g = sim.world().get::<&Position>(guard).unwrap().0;
        let dist = (g - p).as_dvec2().length();
        assert!(dist >= 199.0, "bodies still overlap: {dist}");
    }

    #[test]
    fn guard_spots_player_through_the_full_step() {
        let mut grid = parse_level("#######\n#     #\n#######").unwrap();
        let mut sim = Sim::new(Tuning::default(), center(4, 1), 0);
        sim.spawn_guard(center(1, 1), 0);
        sim.step(&mut grid, Buttons::empty());
        assert!(sim.marks().iter().any(|m| m.kind == MarkKind::Spotted));
    }
}
