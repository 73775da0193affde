use crate::model::Vec2;

/// Axis-aligned bounds as (min, max) corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn empty() -> Self {
        Bounds {
            min: Vec2 { x: f64::INFINITY, y: f64::INFINITY },
            max: Vec2 { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY },
        }
    }

    pub fn is_empty(&self) -> bool { self.min.x > self.max.x || self.min.y > self.max.y }

    pub fn include_point(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x); self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x); self.max.y = self.max.y.max(p.y);
    }

    pub fn include(&mut self, other: &Bounds) {
        if other.is_empty() { return; }
        self.include_point(other.min);
        self.include_point(other.max);
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn width(&self) -> f64 { if self.is_empty() { 0.0 } else { self.max.x - self.min.x } }
    pub fn height(&self) -> f64 { if self.is_empty() { 0.0 } else { self.max.y - self.min.y } }

    pub fn of_points(points: &[Vec2]) -> Self {
        let mut b = Bounds::empty();
        for p in points { b.include_point(*p); }
        b
    }
}

/// Signed shoelace area; positive for counter-clockwise rings in a y-up frame.
/// A trailing point equal to the first is tolerated.
pub fn signed_area(ring: &[Vec2]) -> f64 {
    if ring.len() < 3 { return 0.0; }
    let n = ring.len();
    let mut acc = 0.0;
    for i in 0..n {
        let a = ring[i]; let b = ring[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

#[inline]
pub fn polygon_area(ring: &[Vec2]) -> f64 { signed_area(ring).abs() }

/// Arithmetic mean of the first `take` points.
pub fn mean_point(points: &[Vec2], take: usize) -> Option<Vec2> {
    let n = take.min(points.len());
    if n == 0 { return None; }
    let (sx, sy) = points[..n].iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Vec2 { x: sx / n as f64, y: sy / n as f64 })
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    let dx = a.x - b.x; let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area_and_bounds() {
        let sq = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!((signed_area(&sq) - 1.0).abs() < 1e-12);
        let rev: Vec<Vec2> = sq.iter().rev().copied().collect();
        assert!((signed_area(&rev) + 1.0).abs() < 1e-12);
        let b = Bounds::of_points(&sq);
        assert!(b.contains(Vec2::new(0.5, 0.5)));
        assert!(!b.contains(Vec2::new(1.5, 0.5)));
        assert_eq!(b.width(), 1.0);
    }

    #[test]
    fn closed_ring_area_matches_open_ring() {
        let open = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 3.0)];
        let mut closed = open.to_vec();
        closed.push(open[0]);
        assert!((polygon_area(&open) - 6.0).abs() < 1e-12);
        assert!((polygon_area(&closed) - 6.0).abs() < 1e-12);
    }
}
