//! Step-scoped annotation points for the renderer.
//!
//! Marks carry no simulation state: they are produced fresh each step
//! and consumed once by whoever draws the frame.  The buffer has a
//! fixed capacity; overflow drops marks with a logged warning instead
//! of growing or failing.

use glam::IVec2;
use log::warn;

use crate::level::tile_to_px_center;

/// Why a mark was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    /// Tile the player is standing on.
    StandingOn,
    /// Activatable tile the player is facing.
    Facing,
    /// Node of a guard's current steering path.
    PathNode,
    /// A guard acquired direct sight of the player this step.
    Spotted,
    /// A guard is pursuing a stale position without current sight.
    Chasing,
    /// A guard's give-up deadline is armed.
    Lost,
    /// Tile crossed by a successful line-of-sight ray.
    SightRay,
}

/// One annotation point, in pixel units.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    pub kind: MarkKind,
    pub pos: IVec2,
}

/// Fixed-capacity, step-scoped mark list.
pub struct MarkBuf {
    marks: Vec<Mark>,
    dropped: u32,
}

pub const MARK_CAPACITY: usize = 256;

impl Default for MarkBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkBuf {
    pub fn new() -> Self {
        MarkBuf {
            marks: Vec::with_capacity(MARK_CAPACITY),
            dropped: 0,
        }
    }

    /// Forget everything from the previous step.
    pub fn clear(&mut self) {
        self.marks.clear();
        self.dropped = 0;
    }

    /// Record a mark at a pixel position; dropped (and counted) when
    /// the buffer is full.
    pub fn push(&mut self, kind: MarkKind, pos: IVec2) {
        if self.marks.len() == MARK_CAPACITY {
            if self.dropped == 0 {
                warn!("mark buffer full, dropping further marks this step");
            }
            self.dropped += 1;
            return;
        }
        self.marks.push(Mark { kind, pos });
    }

    /// Record a mark at the centre of tile `(tx, ty)`.
    #[inline]
    pub fn push_tile(&mut self, kind: MarkKind, tx: i32, ty: i32) {
        self.push(kind, IVec2::new(tile_to_px_center(tx), tile_to_px_center(ty)));
    }

    #[inline]
    pub fn as_slice(&self) -> &[Mark] {
        &self.marks
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter()
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
