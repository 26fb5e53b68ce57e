//! World-space rectangles and the intersection tests used by picking and culling.

use glam::Vec2;

/// Axis-aligned rectangle in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

/// The visible part of the world, derived from the camera every frame.
pub type ViewBoundaries = Rect;

impl Rect {
    pub const ZERO: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    /// Builds a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self::from_corners(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    /// Bounding box of a circle.
    pub fn around(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius.abs());
        Self {
            min: center - r,
            max: center + r,
        }
    }

    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// `true` if `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Closed-interval overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Splits the rectangle into four equal quadrants (NW, NE, SW, SE).
    pub fn quadrants(&self) -> [Self; 4] {
        let c = self.center();
        [
            Self::from_corners(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y)),
            Self::from_corners(c, self.max),
            Self::from_corners(self.min, c),
            Self::from_corners(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y)),
        ]
    }
}

/// Point inside circle, boundary inclusive.
pub fn circle_contains_point(center: Vec2, radius: f32, p: Vec2) -> bool {
    center.distance_squared(p) <= radius * radius
}

pub fn circle_intersects_circle(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    let r = r1 + r2;
    c1.distance_squared(c2) <= r * r
}

pub fn rect_intersects_circle(rect: &Rect, center: Vec2, radius: f32) -> bool {
    let closest = center.clamp(rect.min, rect.max);
    closest.distance_squared(center) <= radius * radius
}

/// Squared distance from `p` to the segment `a`-`b`.
pub fn segment_distance_squared(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a.distance_squared(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance_squared(p)
}

/// Segment against circle. Edge thickness is not considered.
pub fn segment_intersects_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    segment_distance_squared(a, b, center) <= radius * radius
}

/// Segment against rectangle (Liang-Barsky clipping). Edge thickness is not considered.
pub fn rect_intersects_segment(rect: &Rect, a: Vec2, b: Vec2) -> bool {
    if rect.contains_point(a) || rect.contains_point(b) {
        return true;
    }

    let d = b - a;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;

    let checks = [
        (-d.x, a.x - rect.min.x),
        (d.x, rect.max.x - a.x),
        (-d.y, a.y - rect.min.y),
        (d.y, rect.max.y - a.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }

    t0 <= t1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalizes_corners() {
        let r = Rect::new(5.0, 5.0, -1.0, 2.0);
        assert_eq!(r.min, Vec2::new(-1.0, 2.0));
        assert_eq!(r.max, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn touching_rectangles_intersect() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(1.0, 1.0, 2.0, 2.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&Rect::new(1.01, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn circle_boundary_is_inclusive() {
        assert!(circle_contains_point(Vec2::ZERO, 2.0, Vec2::new(2.0, 0.0)));
        assert!(!circle_contains_point(Vec2::ZERO, 2.0, Vec2::new(2.001, 0.0)));
    }

    #[test]
    fn rect_circle_uses_closest_point() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_intersects_circle(&rect, Vec2::new(-1.0, 5.0), 1.0));
        assert!(!rect_intersects_circle(&rect, Vec2::new(-1.0, -1.0), 1.0));
        assert!(rect_intersects_circle(&rect, Vec2::new(5.0, 5.0), 0.1));
    }

    #[test]
    fn segment_crossing_rect_without_endpoints_inside() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(rect_intersects_segment(
            &rect,
            Vec2::new(-1.0, 0.5),
            Vec2::new(2.0, 0.5)
        ));
        assert!(!rect_intersects_segment(
            &rect,
            Vec2::new(-1.0, 2.0),
            Vec2::new(2.0, 2.0)
        ));
        assert!(!rect_intersects_segment(
            &rect,
            Vec2::new(2.0, -1.0),
            Vec2::new(3.0, 3.0)
        ));
    }

    #[test]
    fn segment_circle_distance() {
        let a = Vec2::new(-5.0, 1.0);
        let b = Vec2::new(5.0, 1.0);
        assert!(segment_intersects_circle(a, b, Vec2::ZERO, 1.0));
        assert!(!segment_intersects_circle(a, b, Vec2::ZERO, 0.99));
        assert!(!segment_intersects_circle(a, b, Vec2::new(8.0, 1.0), 2.0));
    }
}
