//! Even-odd point-in-ring test used when sampling boundaries.

use crate::model::Vec2;

/// Edges of `ring` crossed by the ray from `p` towards +x. Rings may be
/// open or closed; fewer than three points never contain anything.
pub fn ray_crossings(p: Vec2, ring: &[Vec2]) -> usize {
    if ring.len() < 3 {
        return 0;
    }
    let mut prev = ring[ring.len() - 1];
    let mut crossings = 0;
    for &cur in ring {
        // half-open in y so a vertex on the ray is counted once
        if (cur.y > p.y) != (prev.y > p.y) {
            let x = cur.x + (p.y - cur.y) / (prev.y - cur.y) * (prev.x - cur.x);
            if p.x < x {
                crossings += 1;
            }
        }
        prev = cur;
    }
    crossings
}

#[inline]
pub fn point_in_ring(p: Vec2, ring: &[Vec2]) -> bool {
    ray_crossings(p, ring) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 { Vec2::new(x, y) }

    fn square() -> Vec<Vec2> { vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0)] }

    #[test]
    fn square_inside_and_outside() {
        let sq = square();
        assert!(point_in_ring(v(5.0, 5.0), &sq));
        assert_eq!(ray_crossings(v(-5.0, 5.0), &sq), 2);
        assert_eq!(ray_crossings(v(15.0, 5.0), &sq), 0);
        assert!(!point_in_ring(v(5.0, 15.0), &sq));
    }

    #[test]
    fn orientation_and_closing_point_do_not_matter() {
        let mut ring: Vec<Vec2> = square().into_iter().rev().collect();
        assert!(point_in_ring(v(5.0, 5.0), &ring));
        ring.push(ring[0]);
        assert!(point_in_ring(v(5.0, 5.0), &ring));
        assert!(!point_in_ring(v(12.0, 5.0), &ring));
    }

    #[test]
    fn ray_through_a_vertex_counts_once() {
        let diamond = vec![v(5.0, 0.0), v(10.0, 5.0), v(5.0, 10.0), v(0.0, 5.0)];
        assert!(point_in_ring(v(5.0, 5.0), &diamond));
        assert!(!point_in_ring(v(-1.0, 5.0), &diamond));
    }

    #[test]
    fn concave_notch_is_outside() {
        let l_shape =
            vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 5.0), v(5.0, 5.0), v(5.0, 10.0), v(0.0, 10.0)];
        assert!(point_in_ring(v(2.0, 7.0), &l_shape));
        assert!(!point_in_ring(v(7.0, 7.0), &l_shape));
    }

    #[test]
    fn degenerate_rings() {
        assert!(!point_in_ring(v(0.0, 0.0), &[]));
        assert!(!point_in_ring(v(0.5, 0.5), &[v(0.0, 0.0), v(1.0, 1.0)]));
    }
}
