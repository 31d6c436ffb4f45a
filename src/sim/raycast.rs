//! Integer Bresenham ray walk with an early-abort visitor.
//!
//! The same primitive backs field-of-view rays and guard
//! line-of-sight tests; the visitor decides what "blocked" means.

/// Walk the Bresenham line from `(x0, y0)` towards `(x1, y1)`.
///
/// `visit` is called for every point **strictly before** the endpoint,
/// starting with `(x0, y0)` itself.  Returns `true` once the endpoint
/// is reached, `false` if `visit` aborted the walk.  The visited point
/// sequence is exactly reproducible for fixed endpoints.
pub fn cast_ray<F>(x0: i32, y0: i32, x1: i32, y1: i32, mut visit: F) -> bool
where
    F: FnMut(i32, i32) -> bool,
{
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);
    loop {
        if x == x1 && y == y1 {
            return true;
        }
        if !visit(x, y) {
            return false;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn trace(x0: i32, y0: i32, x1: i32, y1: i32) -> (Vec<(i32, i32)>, bool) {
        let mut pts = Vec::new();
        let done = cast_ray(x0, y0, x1, y1, |x, y| {
            pts.push((x, y));
            true
        });
        (pts, done)
    }

    #[test]
    fn horizontal_ray_visits_every_point_before_endpoint() {
        let (pts, done) = trace(0, 0, 4, 0);
        assert!(done);
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn diagonal_ray_steps_both_axes() {
        let (pts, done) = trace(0, 0, 3, 3);
        assert!(done);
        assert_eq!(pts, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn degenerate_ray_visits_nothing() {
        let (pts, done) = trace(2, 2, 2, 2);
        assert!(done);
        assert!(pts.is_empty());
    }

    #[test]
    fn visitor_can_abort() {
        let mut count = 0;
        let done = cast_ray(0, 0, 10, 0, |x, _| {
            count += 1;
            x < 3
        });
        assert!(!done);
        assert_eq!(count, 4); // aborted on (3, 0)
    }

    #[test]
    fn point_sequence_is_deterministic() {
        let (a, _) = trace(1, 2, 9, 5);
        let (b, _) = trace(1, 2, 9, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn negative_direction_mirrors_cleanly() {
        let (pts, done) = trace(4, 0, 0, 0);
        assert!(done);
        assert_eq!(pts, vec![(4, 0), (3, 0), (2, 0), (1, 0)]);
    }
}
