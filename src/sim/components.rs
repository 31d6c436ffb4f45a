//! ECS components for the two actor kinds, plus the per-step input
//! bitset the frontend hands in.

use bitflags::bitflags;
use glam::IVec2;

use super::collision::round_away;

/// World-space position in fixed-point pixel units.
#[derive(Debug, Clone, Copy)]
pub struct Position(pub IVec2);

/// Heading in whole degrees, kept in `[0, 360)`.  0 points along +x;
/// positive turns are counter-clockwise on screen (y grows downward,
/// so forward motion is `x += cos`, `y -= sin`).
#[derive(Debug, Clone, Copy)]
pub struct Heading(pub i32);

impl Heading {
    /// Turn by `delta` degrees, wrapping into `[0, 360)`.
    #[inline]
    pub fn turn(&mut self, delta: i32) {
        self.0 = (self.0 + delta).rem_euclid(360);
    }

    /// Pixel displacement of a `dist`-unit step along this heading.
    pub fn displacement(self, dist: i32) -> IVec2 {
        let rad = (self.0 as f64).to_radians();
        IVec2::new(
            round_away(dist as f64 * rad.cos()),
            round_away(-(dist as f64) * rad.sin()),
        )
    }
}

/// Circular collision body.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub radius: i32,
}

/// Guard AI state.  Which variant a guard is in fully determines the
/// behaviour rules that apply to it this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// At the post, nothing seen.
    Idle,
    /// Heading for the player's last known position.
    Pursuing { target: IVec2 },
    /// Reached a stale target; waiting out the give-up deadline.
    Searching { give_up_at: u64 },
    /// Deadline passed; walking back to the post.
    Returning,
    /// Back at the post, rotating into the recorded home heading.
    Realigning,
}

/// Marker component for AI-driven actors (the player has none).
#[derive(Debug, Clone, Copy)]
pub struct Guard {
    pub home: IVec2,
    pub home_heading: i32,
    pub state: GuardState,
}

bitflags! {
    /// Key-down state for one step.  The frontend fills this from its
    /// input polling; the simulation never reads devices itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const FORWARD  = 0x01;
        const BACKWARD = 0x02;
        const LEFT     = 0x04;
        const RIGHT    = 0x08;
        const ACTIVATE = 0x10;
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_wraps_into_range() {
        let mut h = Heading(350);
        h.turn(20);
        assert_eq!(h.0, 10);
        h.turn(-30);
        assert_eq!(h.0, 340);
    }

    #[test]
    fn displacement_follows_screen_axes() {
        assert_eq!(Heading(0).displacement(50), IVec2::new(50, 0));
        // 90° is up on screen: y decreases
        assert_eq!(Heading(90).displacement(50), IVec2::new(0, -50));
        assert_eq!(Heading(180).displacement(50), IVec2::new(-50, 0));
        assert_eq!(Heading(270).displacement(50), IVec2::new(0, 50));
    }

    #[test]
    fn backward_steps_negate_cleanly() {
        assert_eq!(Heading(0).displacement(-30), IVec2::new(-30, 0));
    }
}
