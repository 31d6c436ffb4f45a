//! Discrete circle collision against the tile grid and between actors.
//!
//! No swept tests: bodies are moved first, then pushed out of whatever
//! they ended up inside.  Grid pushback classifies the body centre into
//! one of the 9 Voronoi regions of the offending tile square (4 edges,
//! 4 corners, interior) and applies the minimal translation for that
//! region.  A bounded settle loop repeats the whole scan until nothing
//! moves.

use glam::{DVec2, IVec2};
use log::warn;

use crate::level::{Grid, TILE_SIZE, px_to_tile, tile_to_px};

/// Settle passes before the step accepts a still-overlapping state.
const MAX_SETTLE_PASSES: u32 = 10;

/// Round away from zero: add half a unit towards the sign, then
/// truncate.  Keeps sub-unit pushes from vanishing entirely.
#[inline]
pub(crate) fn round_away(v: f64) -> i32 {
    if v > 0.0 {
        (v + 0.5) as i32
    } else if v < 0.0 {
        (v - 0.5) as i32
    } else {
        0
    }
}

/*──────────────────── body vs. grid ────────────────────*/

/// Push `pos` out of the first non-passable tile its bounding box
/// overlaps.  Resolves a single tile per call; returns whether the
/// body moved, in which case the caller must re-scan.
pub fn resolve_body_grid(grid: &Grid, pos: &mut IVec2, radius: i32) -> bool {
    let tx0 = px_to_tile(pos.x - radius).max(0);
    let tx1 = px_to_tile(pos.x + radius).min(grid.width() - 1);
    let ty0 = px_to_tile(pos.y - radius).max(0);
    let ty1 = px_to_tile(pos.y + radius).min(grid.height() - 1);

    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            if grid.is_passable(tx, ty) {
                continue;
            }
            if let Some(push) = tile_push(*pos, radius, tx, ty) {
                *pos += push;
                return true;
            }
        }
    }
    false
}

/// Minimal translation pushing a circle at `pos` out of tile
/// `(tx, ty)`, or `None` when they do not actually overlap (the AABB
/// scan over-approximates) or the centre is inside the square.
fn tile_push(pos: IVec2, radius: i32, tx: i32, ty: i32) -> Option<IVec2> {
    let x0 = tile_to_px(tx);
    let x1 = x0 + TILE_SIZE;
    let y0 = tile_to_px(ty);
    let y1 = y0 + TILE_SIZE;

    let push = if (y0..=y1).contains(&pos.y) {
        // left / right edge regions (or centre inside the square)
        if pos.x < x0 {
            let pen = radius - (x0 - pos.x);
            if pen <= 0 {
                return None;
            }
            IVec2::new(-pen, 0)
        } else if pos.x > x1 {
            let pen = radius - (pos.x - x1);
            if pen <= 0 {
                return None;
            }
            IVec2::new(pen, 0)
        } else {
            return None;
        }
    } else if (x0..=x1).contains(&pos.x) {
        // top / bottom edge regions
        if pos.y < y0 {
            let pen = radius - (y0 - pos.y);
            if pen <= 0 {
                return None;
            }
            IVec2::new(0, -pen)
        } else {
            let pen = radius - (pos.y - y1);
            if pen <= 0 {
                return None;
            }
            IVec2::new(0, pen)
        }
    } else {
        // corner region: capsule-style MTV along the centre-to-body
        // direction, magnitude radius + projection - distance
        let corner = DVec2::new(
            if pos.x < x0 { x0 } else { x1 } as f64,
            if pos.y < y0 { y0 } else { y1 } as f64,
        );
        let centre = DVec2::new((x0 + TILE_SIZE / 2) as f64, (y0 + TILE_SIZE / 2) as f64);
        let d = pos.as_dvec2() - centre;
        let dist = d.length();
        if dist == 0.0 {
            return None;
        }
        let dir = d / dist;
        let mag = radius as f64 + dir.dot(corner - centre) - dist;
        if mag <= 0.0 {
            return None;
        }
        IVec2::new(round_away(dir.x * mag), round_away(dir.y * mag))
    };

    (push != IVec2::ZERO).then_some(push)
}

/*──────────────────── body vs. body ────────────────────*/

/// Separate two overlapping circles symmetrically along the line
/// between their centres.  Returns whether anything moved.
pub fn resolve_body_body(a: &mut IVec2, ra: i32, b: &mut IVec2, rb: i32) -> bool {
    let d = (*b - *a).as_dvec2();
    let dist = d.length();
    let overlap = (ra + rb) as f64 - dist;
    if overlap <= 0.0 {
        return false;
    }
    // coincident centres: separate deterministically along +x
    let dir = if dist == 0.0 { DVec2::X } else { d / dist };
    let half = dir * (overlap * 0.5);
    let push = IVec2::new(round_away(half.x), round_away(half.y));
    if push == IVec2::ZERO {
        return false;
    }
    *a -= push;
    *b += push;
    true
}

/*──────────────────── settle driver ────────────────────*/

/// Iterate grid and pairwise resolution over all bodies until a full
/// pass moves nothing, bounded at [`MAX_SETTLE_PASSES`].  Exceeding
/// the bound is logged and the current (possibly still overlapping)
/// state is accepted.
pub fn settle(grid: &Grid, bodies: &mut [(IVec2, i32)]) {
    for _ in 0..MAX_SETTLE_PASSES {
        let mut moved = false;

        for body in bodies.iter_mut() {
            moved |= resolve_body_grid(grid, &mut body.0, body.1);
        }
        for i in 0..bodies.len() {
            for j in i + 1..bodies.len() {
                let (head, tail) = bodies.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];
                moved |= resolve_body_body(&mut a.0, a.1, &mut b.0, b.1);
            }
        }

        if !moved {
            return;
        }
    }
    warn!("collision settle still moving after {MAX_SETTLE_PASSES} passes, accepting overlap");
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
