//! Guard behaviour: sight acquisition, path-following pursuit, timed
//! give-up, and return to post.
//!
//! The state machine is explicit (see [`GuardState`]); each step the
//! rules run in a fixed order per guard:
//!
//! 1. fresh sight of the player always (re)arms pursuit,
//! 2. an expired give-up deadline sends the guard home,
//! 3. a movement target is steered towards along an A* path,
//! 4. with no target left, the guard rotates back into its home
//!    heading.

use glam::IVec2;
use hecs::{Entity, World};
use log::debug;
use smallvec::SmallVec;

use super::components::{Body, Guard, GuardState, Heading, Position};
use super::config::Tuning;
use super::marks::{MarkBuf, MarkKind};
use super::path::find_path;
use super::raycast::cast_ray;
use crate::level::{Grid, px_to_tile};

/// Angular error above which a guard turns at double rate.
const FAST_TURN_ERR: i32 = 30;
/// Angular error above which a guard turns at normal rate.
const TURN_ERR: i32 = 10;
/// Angular error below which a guard will walk forward.
const MOVE_ERR: i32 = 90;

type RayTiles = SmallVec<[IVec2; 32]>;

#[inline]
fn tile_of(px: IVec2) -> IVec2 {
    IVec2::new(px_to_tile(px.x), px_to_tile(px.y))
}

/// Heading (degrees, screen axes) from `from` towards `to`.
fn angle_to(from: IVec2, to: IVec2) -> i32 {
    let d = (to - from).as_dvec2();
    let deg = (-d.y).atan2(d.x).to_degrees();
    (deg.round() as i32).rem_euclid(360)
}

/// Signed shortest rotation from heading `b` to heading `a`, in
/// `[-180, 180)`.
#[inline]
fn angle_diff(a: i32, b: i32) -> i32 {
    (a - b + 180).rem_euclid(360) - 180
}

/// Run the behaviour rules for every guard in the world.
pub(crate) fn guard_system(
    world: &mut World,
    grid: &Grid,
    player: Entity,
    frame: u64,
    cfg: &Tuning,
    marks: &mut MarkBuf,
) {
    let Ok(player_pos) = world.get::<&Position>(player).map(|p| p.0) else {
        return;
    };

    let mut ray = RayTiles::new();
    for (_, (pos, heading, body, guard)) in
        world.query_mut::<(&mut Position, &mut Heading, &Body, &mut Guard)>()
    {
        step_guard(
            grid, player_pos, frame, cfg, marks, &mut ray, pos, heading, body, guard,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn step_guard(
    grid: &Grid,
    player_pos: IVec2,
    frame: u64,
    cfg: &Tuning,
    marks: &mut MarkBuf,
    ray: &mut RayTiles,
    pos: &mut Position,
    heading: &mut Heading,
    body: &Body,
    guard: &mut Guard,
) {
    /* rule 1: sight beats everything, stale searches included */
    let sees = sees_player(grid, pos.0, heading.0, player_pos, cfg, ray);
    if sees {
        if !matches!(guard.state, GuardState::Pursuing { .. }) {
            debug!("guard at {:?} spotted the player", pos.0);
        }
        guard.state = GuardState::Pursuing { target: player_pos };
        marks.push(MarkKind::Spotted, player_pos);
        for t in ray.iter() {
            marks.push_tile(MarkKind::SightRay, t.x, t.y);
        }
    }

    /* rule 2: give-up deadline */
    if let GuardState::Searching { give_up_at } = guard.state {
        marks.push(MarkKind::Lost, pos.0);
        if frame >= give_up_at {
            debug!("guard at {:?} gave up, returning to post", pos.0);
            guard.state = GuardState::Returning;
        }
    }

    /* rule 3: steer towards the current movement target */
    let target = match guard.state {
        GuardState::Pursuing { target } => Some(target),
        GuardState::Returning => Some(guard.home),
        _ => None,
    };
    if let Some(target) = target {
        if !sees && matches!(guard.state, GuardState::Pursuing { .. }) {
            marks.push(MarkKind::Chasing, pos.0);
        }
        if steer(grid, cfg, marks, pos, heading, body.radius, target) {
            guard.state = match guard.state {
                GuardState::Pursuing { .. } => GuardState::Searching {
                    give_up_at: frame + cfg.give_up_frames,
                },
                _ => GuardState::Realigning,
            };
        }
        return;
    }

    /* rule 4: heading-only realignment at the post */
    if guard.state == GuardState::Realigning {
        let err = angle_diff(guard.home_heading, heading.0);
        heading.turn(err.clamp(-cfg.turn_rate, cfg.turn_rate));
        if angle_diff(guard.home_heading, heading.0) == 0 {
            guard.state = GuardState::Idle;
        }
    }
}

/// Forward-cone plus line-of-sight test.  On success `ray` holds the
/// transparent tiles the sight line crossed.
fn sees_player(
    grid: &Grid,
    guard_pos: IVec2,
    guard_heading: i32,
    player_pos: IVec2,
    cfg: &Tuning,
    ray: &mut RayTiles,
) -> bool {
    ray.clear();
    if guard_pos != player_pos {
        let to_player = angle_to(guard_pos, player_pos);
        if angle_diff(to_player, guard_heading).abs() > cfg.fov / 2 {
            return false;
        }
    }
    let gt = tile_of(guard_pos);
    let pt = tile_of(player_pos);
    cast_ray(gt.x, gt.y, pt.x, pt.y, |x, y| {
        if !grid.in_bounds(x, y) || !grid.is_transparent(x, y) {
            return false;
        }
        ray.push(IVec2::new(x, y));
        true
    })
}

/// Turn and walk towards `target` along a fresh path.  Returns `true`
/// once the guard is within stopping distance (or the target is
/// unreachable, which counts as arrival so pursuit cannot wedge on a
/// door that closed behind the player).
fn steer(
    grid: &Grid,
    cfg: &Tuning,
    marks: &mut MarkBuf,
    pos: &mut Position,
    heading: &mut Heading,
    radius: i32,
    target: IVec2,
) -> bool {
    let stop_dist = (radius + cfg.guard_step) as f64;
    if (target - pos.0).as_dvec2().length() <= stop_dist {
        return true;
    }

    let Some(path) = find_path(grid, tile_of(pos.0), tile_of(target)) else {
        debug!("no path from {:?} to {:?}, treating as reached", pos.0, target);
        return true;
    };
    for node in &path {
        marks.push_tile(MarkKind::PathNode, node.x, node.y);
    }

    // aim at the next waypoint, skipping the tile we stand on
    let own_tile = tile_of(pos.0);
    let waypoint = if path.len() >= 2 && path[0] == own_tile {
        path[1]
    } else {
        path[0]
    };
    let way_px = grid.tile_center(waypoint.x, waypoint.y);

    if way_px != pos.0 {
        let err = angle_diff(angle_to(pos.0, way_px), heading.0);
        if err.abs() > FAST_TURN_ERR {
            heading.turn(err.signum() * cfg.turn_rate * 2);
        } else if err.abs() > TURN_ERR {
            heading.turn(err.signum() * cfg.turn_rate);
        }
        if err.abs() < MOVE_ERR {
            pos.0 += heading.displacement(cfg.guard_step);
        }
    }
    (target - pos.0).as_dvec2().length() <= stop_dist
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{TILE_SIZE, parse_level};

    fn center(tx: i32, ty: i32) -> IVec2 {
        IVec2::new(
            tx * TILE_SIZE + TILE_SIZE / 2,
            ty * TILE_SIZE + TILE_SIZE / 2,
        )
    }

    struct Rig {
        world: World,
        grid: Grid,
        player: Entity,
        guard: Entity,
        marks: MarkBuf,
        frame: u64,
    }

    impl Rig {
        /// Two-chamber level split by a wall at x = 4; guard on the
        /// left at (1,1) facing east, player wherever the test puts it.
        fn new(player_tile: (i32, i32)) -> Rig {
            let grid = parse_level("#########\n#   #   #\n#   #   #\n#########").unwrap();
            let mut world = World::new();
            let home = center(1, 1);
            let guard = world.spawn((
                Position(home),
                Heading(0),
                Body { radius: 100 },
                Guard {
                    home,
                    home_heading: 0,
                    state: GuardState::Idle,
                },
            ));
            let player = world.spawn((
                Position(center(player_tile.0, player_tile.1)),
                Heading(0),
                Body { radius: 100 },
            ));
            Rig {
                world,
                grid,
                player,
                guard,
                marks: MarkBuf::new(),
                frame: 0,
            }
        }

        fn step(&mut self) {
            self.frame += 1;
            self.marks.clear();
            guard_system(
                &mut self.world,
                &self.grid,
                self.player,
                self.frame,
                &Tuning::default(),
                &mut self.marks,
            );
        }

        fn guard_state(&self) -> GuardState {
            self.world.get::<&Guard>(self.guard).unwrap().state
        }

        fn guard_pos(&self) -> IVec2 {
            self.world.get::<&Position>(self.guard).unwrap().0
        }

        fn guard_heading(&self) -> i32 {
            self.world.get::<&Heading>(self.guard).unwrap().0
        }

        fn move_player(&mut self, tile: (i32, i32)) {
            self.world.get::<&mut Position>(self.player).unwrap().0 = center(tile.0, tile.1);
        }

        fn has_mark(&self, kind: MarkKind) -> bool {
            self.marks.iter().any(|m| m.kind == kind)
        }
    }

    #[test]
    fn angle_helpers() {
        assert_eq!(angle_to(IVec2::ZERO, IVec2::new(10, 0)), 0);
        assert_eq!(angle_to(IVec2::ZERO, IVec2::new(0, -10)), 90); // up on screen
        assert_eq!(angle_to(IVec2::ZERO, IVec2::new(-10, 0)), 180);
        assert_eq!(angle_diff(350, 10), -20);
        assert_eq!(angle_diff(10, 350), 20);
        assert_eq!(angle_diff(0, 180), -180);
    }

    #[test]
    fn clear_sight_in_cone_spots_the_same_step() {
        let mut rig = Rig::new((3, 1));
        rig.step();
        assert_eq!(
            rig.guard_state(),
            GuardState::Pursuing { target: center(3, 1) }
        );
        assert!(rig.has_mark(MarkKind::Spotted));
        assert!(rig.has_mark(MarkKind::SightRay));
    }

    #[test]
    fn player_behind_the_guard_is_not_seen() {
        // guard faces east (0°); put the player due west
        let grid = parse_level("#####\n#   #\n#####").unwrap();
        assert!(!sees_player(
            &grid,
            center(2, 1),
            0,
            center(1, 1),
            &Tuning::default(),
            &mut RayTiles::new(),
        ));
    }

    #[test]
    fn wall_breaks_line_of_sight() {
        let mut rig = Rig::new((6, 1)); // other chamber, cone is fine
        rig.step();
        assert_eq!(rig.guard_state(), GuardState::Idle);
        assert!(!rig.has_mark(MarkKind::Spotted));
    }

    #[test]
    fn pursuit_chases_searches_and_returns_home() {
        let mut rig = Rig::new((3, 1));
        rig.step();
        assert!(matches!(rig.guard_state(), GuardState::Pursuing { .. }));

        // player slips into the hidden chamber
        rig.move_player((6, 1));

        // guard closes on the last known position, emitting Chasing
        rig.step();
        assert!(rig.has_mark(MarkKind::Chasing));
        let mut searching_at = None;
        for _ in 0..200 {
            rig.step();
            if let GuardState::Searching { give_up_at } = rig.guard_state() {
                searching_at = Some((rig.frame, give_up_at));
                break;
            }
        }
        let (arrived, give_up_at) = searching_at.expect("guard never reached the stale target");
        assert_eq!(give_up_at, arrived + 60);
        // stopped within stopping distance of the stale target
        let stop = (100 + 30) as f64;
        assert!((center(3, 1) - rig.guard_pos()).as_dvec2().length() <= stop + 1.0);

        // waits out the deadline, flagging Lost
        for _ in 0..59 {
            rig.step();
            assert!(rig.has_mark(MarkKind::Lost));
            assert!(matches!(rig.guard_state(), GuardState::Searching { .. }));
        }
        rig.step();
        assert_eq!(rig.guard_state(), GuardState::Returning);

        // walks home and realigns into the recorded pose
        for _ in 0..300 {
            rig.step();
            if rig.guard_state() == GuardState::Idle {
                break;
            }
        }
        assert_eq!(rig.guard_state(), GuardState::Idle);
        assert_eq!(rig.guard_heading(), 0);
        let home_err = (rig.guard_pos() - center(1, 1)).as_dvec2().length();
        assert!(home_err <= 131.0, "guard ended {home_err} from its post");
    }

    #[test]
    fn fresh_sight_cancels_a_search() {
        let mut rig = Rig::new((2, 1));
        rig.step(); // spotted, and already within stopping distance?
        // walk the pursuit to Searching
        for _ in 0..200 {
            if matches!(rig.guard_state(), GuardState::Searching { .. }) {
                break;
            }
            rig.move_player((6, 1)); // keep the player hidden
            rig.step();
        }
        assert!(matches!(rig.guard_state(), GuardState::Searching { .. }));
        // player steps back into view: pursuit re-arms immediately
        rig.move_player((3, 1));
        rig.step();
        assert!(matches!(rig.guard_state(), GuardState::Pursuing { .. }));
    }

    #[test]
    fn turn_is_clamped_while_realigning() {
        let mut rig = Rig::new((6, 1));
        {
            let mut guard = rig.world.get::<&mut Guard>(rig.guard).unwrap();
            guard.state = GuardState::Realigning;
        }
        rig.world.get::<&mut Heading>(rig.guard).unwrap().0 = 8;
        rig.step();
        // 8° of error, 6° rate: one full turn then a clamped 2°
        assert_eq!(rig.guard_heading(), 2);
        assert_eq!(rig.guard_state(), GuardState::Realigning);
        rig.step();
        assert_eq!(rig.guard_heading(), 0);
        assert_eq!(rig.guard_state(), GuardState::Idle);
    }
}
