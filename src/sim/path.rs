//! Grid A* with 8-directional movement.
//!
//! Cost and heuristic are both *squared* Euclidean distance between
//! tile coordinates.  That is not a proper metric, and paths can
//! differ from true-shortest in places, but it is what the guards have
//! always steered along, so it stays.
//!
//! Score storage is flat per-tile arrays plus a binary heap; ties on
//! f-score fall back to insertion order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use glam::IVec2;

use crate::level::Grid;

const ORTHO: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAG: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[inline]
fn dist2(a: IVec2, b: IVec2) -> i64 {
    let d = a - b;
    d.x as i64 * d.x as i64 + d.y as i64 * d.y as i64
}

/// Find a tile path from `start` to `goal`, both inclusive.
///
/// Diagonal steps are only taken when both flanking orthogonal tiles
/// are passable, so paths never cut through a blocked corner.
/// Returns `None` when the goal cannot be reached.
pub fn find_path(grid: &Grid, start: IVec2, goal: IVec2) -> Option<Vec<IVec2>> {
    debug_assert!(grid.in_bounds(start.x, start.y) && grid.in_bounds(goal.x, goal.y));

    let w = grid.width();
    let cells = (w * grid.height()) as usize;
    let idx = |p: IVec2| (p.y * w + p.x) as usize;

    let mut g = vec![i64::MAX; cells];
    let mut came_from = vec![u32::MAX; cells];
    let mut closed = vec![false; cells];

    // heap entries: (f, insertion seq, tile); Reverse turns the
    // max-heap into the min-heap A* wants
    let mut open: BinaryHeap<Reverse<(i64, u64, (i32, i32))>> = BinaryHeap::new();
    let mut seq = 0u64;

    g[idx(start)] = 0;
    open.push(Reverse((dist2(start, goal), seq, (start.x, start.y))));

    let passable = |x: i32, y: i32| grid.in_bounds(x, y) && grid.is_passable(x, y);

    while let Some(Reverse((_, _, (cx, cy)))) = open.pop() {
        let cur = IVec2::new(cx, cy);
        let ci = idx(cur);
        if closed[ci] {
            continue; // stale heap entry
        }
        closed[ci] = true;

        if cur == goal {
            let mut path = vec![cur];
            let mut i = ci;
            while came_from[i] != u32::MAX {
                i = came_from[i] as usize;
                path.push(IVec2::new(i as i32 % w, i as i32 / w));
            }
            path.reverse();
            return Some(path);
        }

        let mut relax = |nb: IVec2| {
            let ni = idx(nb);
            if closed[ni] {
                return;
            }
            let tentative = g[ci] + dist2(cur, nb);
            if tentative < g[ni] {
                g[ni] = tentative;
                came_from[ni] = ci as u32;
                seq += 1;
                open.push(Reverse((tentative + dist2(nb, goal), seq, (nb.x, nb.y))));
            }
        };

        for (dx, dy) in ORTHO {
            if passable(cx + dx, cy + dy) {
                relax(IVec2::new(cx + dx, cy + dy));
            }
        }
        for (dx, dy) in DIAG {
            // both flanking orthogonals must be open or the corner
            // would be cut
            if passable(cx + dx, cy + dy) && passable(cx + dx, cy) && passable(cx, cy + dy) {
                relax(IVec2::new(cx + dx, cy + dy));
            }
        }
    }

    None
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
