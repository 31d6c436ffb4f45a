//! Movement and AI tuning, passed explicitly into the routines that
//! use it so levels or tests can override per instance.

/// Per-step movement and perception constants, in fixed-point pixel
/// units and whole degrees.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// Degrees turned per step at normal rate.
    pub turn_rate: i32,
    /// Player forward distance per step.
    pub forward_step: i32,
    /// Player backward distance per step (applied negatively).
    pub backward_step: i32,
    /// Guard forward distance per step.
    pub guard_step: i32,
    /// Full width of the guard's view cone, degrees.
    pub fov: i32,
    /// Player sight radius, in tiles.
    pub sight_radius: i32,
    /// Steps a guard waits at a stale target before heading home.
    pub give_up_frames: u64,
    /// Collision radius of every actor.
    pub actor_radius: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            turn_rate: 6,
            forward_step: 50,
            backward_step: 30,
            guard_step: 30,
            fov: 180,
            sight_radius: 12,
            give_up_frames: 60,
            actor_radius: 100,
        }
    }
}
