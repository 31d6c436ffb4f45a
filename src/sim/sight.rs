//! Field-of-view computation.
//!
//! A fresh boolean window around the viewer is rebuilt every step:
//! rays are cast from the viewer's tile to the 8 symmetric points of a
//! midpoint-circle walk over the sight radius, and every tile a ray
//! passes is marked visible until the ray hits something opaque (the
//! opaque tile itself is still marked, so walls show up).
//!
//! `sight_get` adds a small smoothing rule on top of the raw set to
//! fill the single-tile gaps the discrete rays leave behind.

use glam::IVec2;
use log::error;

use super::raycast::cast_ray;
use crate::level::Grid;

/// Per-step visibility window, anchored at the viewer's tile and
/// clamped to the grid.  Addressed in global tile coordinates.
pub struct SightMap {
    ox: i32,
    oy: i32,
    w: i32,
    h: i32,
    visible: Vec<bool>,
}

impl SightMap {
    #[inline]
    fn slot(&self, x: i32, y: i32) -> Option<usize> {
        if x < self.ox || y < self.oy || x >= self.ox + self.w || y >= self.oy + self.h {
            return None;
        }
        Some(((y - self.oy) * self.w + (x - self.ox)) as usize)
    }

    /// Raw ray-cast visibility, no smoothing.
    #[inline]
    pub fn raw(&self, x: i32, y: i32) -> bool {
        self.slot(x, y).is_some_and(|i| self.visible[i])
    }

    /// Visibility with fringe smoothing: an unmarked window-interior
    /// tile still reads as visible when its axis neighbours are.
    pub fn sight_get(&self, x: i32, y: i32) -> bool {
        if self.slot(x, y).is_none() {
            return false;
        }
        if self.raw(x, y) {
            return true;
        }
        // Window border tiles never get smoothed in.
        if x == self.ox || x == self.ox + self.w - 1 || y == self.oy || y == self.oy + self.h - 1 {
            return false;
        }
        // TODO: the fourth probe re-reads (x-1, y); it was probably
        // meant to be (x, y+1).  Fixing it changes the fog fringe, so
        // it stays until the rendered shape is re-approved.
        self.raw(x - 1, y) && self.raw(x + 1, y) && self.raw(x, y - 1) && self.raw(x - 1, y)
    }

    #[cfg(test)]
    fn set_raw(&mut self, x: i32, y: i32) {
        let i = self.slot(x, y).unwrap();
        self.visible[i] = true;
    }
}

/// Compute the viewer's visibility window.
///
/// Returns `None` when the window buffer cannot be allocated; the
/// caller must treat that as "nothing visible this step".
pub fn compute_visible(grid: &Grid, viewer: IVec2, radius: i32) -> Option<SightMap> {
    let ox = (viewer.x - radius).max(0);
    let oy = (viewer.y - radius).max(0);
    let w = (viewer.x + radius).min(grid.width() - 1) - ox + 1;
    let h = (viewer.y + radius).min(grid.height() - 1) - oy + 1;

    let len = (w * h) as usize;
    let mut visible = Vec::new();
    if visible.try_reserve_exact(len).is_err() {
        error!("sight window allocation failed ({w}x{h}), reporting nothing visible");
        return None;
    }
    visible.resize(len, false);

    let mut map = SightMap {
        ox,
        oy,
        w,
        h,
        visible,
    };

    // Midpoint-circle walk; each (x, y) step yields the 8 symmetric
    // boundary points the rays are aimed at.
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;
    while y <= x {
        for (tx, ty) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            cast_ray(viewer.x, viewer.y, viewer.x + tx, viewer.y + ty, |px, py| {
                if !grid.in_bounds(px, py) {
                    return false;
                }
                if let Some(i) = map.slot(px, py) {
                    map.visible[i] = true;
                }
                grid.is_transparent(px, py)
            });
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }

    Some(map)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
