// 2D Catmull-Rom spline used for path following.

use glam::Vec2;

const ARC_LENGTH_DIVISIONS: usize = 200;

/// Smooth curve through a list of control points.
///
/// `point` is parameterised by control-point index; `point_at` by
/// arc length, so equal steps in `u` cover equal distances.
#[derive(Debug, Clone)]
pub struct SplineCurve {
    points: Vec<Vec2>,
    arc_lengths: Vec<f32>,
}

impl SplineCurve {
    pub fn new(points: Vec<Vec2>) -> Self {
        let mut curve = Self {
            points,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.measure(ARC_LENGTH_DIVISIONS);
        curve
    }

    pub fn control_points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at parameter `t` in `0.0..=1.0`.
    pub fn point(&self, t: f32) -> Vec2 {
        let n = self.points.len();
        match n {
            0 => return Vec2::ZERO,
            1 => return self.points[0],
            _ => {}
        }

        let p = (n - 1) as f32 * t.clamp(0.0, 1.0);
        let i = (p.floor() as usize).min(n - 1);
        let weight = p - i as f32;

        let p0 = self.points[i.saturating_sub(1)];
        let p1 = self.points[i];
        let p2 = self.points[(i + 1).min(n - 1)];
        let p3 = self.points[(i + 2).min(n - 1)];

        catmull_rom(weight, p0, p1, p2, p3)
    }

    /// Point at arc-length fraction `u` in `0.0..=1.0`.
    pub fn point_at(&self, u: f32) -> Vec2 {
        self.point(self.u_to_t(u))
    }

    /// `divisions + 1` evenly parameterised points, both ends included.
    pub fn points(&self, divisions: usize) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point(d as f32 / divisions as f32))
            .collect()
    }

    fn measure(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for d in 1..=divisions {
            let current = self.point(d as f32 / divisions as f32);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    fn u_to_t(&self, u: f32) -> f32 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        let target = u.clamp(0.0, 1.0) * lengths[last];
        if lengths[last] <= 0.0 {
            return u.clamp(0.0, 1.0);
        }

        let idx = lengths.partition_point(|&l| l < target).min(last);
        if lengths[idx] == target || idx == 0 {
            return idx as f32 / last as f32;
        }

        let i = idx - 1;
        let before = lengths[i];
        let segment = lengths[idx] - before;
        let fraction = (target - before) / segment;
        (i as f32 + fraction) / last as f32
    }
}

fn catmull_rom(t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t * t2;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn zigzag() -> SplineCurve {
        SplineCurve::new(vec![
            Vec2::new(-10.0, 0.0),
            Vec2::new(-5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, -5.0),
            Vec2::new(10.0, 0.0),
        ])
    }

    #[test]
    fn passes_through_control_points() {
        let curve = zigzag();
        for (i, p) in curve.control_points().iter().enumerate() {
            let t = i as f32 / 4.0;
            let q = curve.point(t);
            assert_abs_diff_eq!(q.x, p.x, epsilon = 1e-4);
            assert_abs_diff_eq!(q.y, p.y, epsilon = 1e-4);
        }
    }

    #[test]
    fn arc_length_endpoints() {
        let curve = zigzag();
        assert_eq!(curve.point_at(0.0), Vec2::new(-10.0, 0.0));
        let end = curve.point_at(1.0);
        assert_abs_diff_eq!(end.x, 10.0, epsilon = 1e-4);
        assert!(curve.length() > 20.0);
    }

    #[test]
    fn arc_length_steps_are_even() {
        let curve = zigzag();
        let step = curve.length() / 10.0;
        for k in 0..10 {
            let a = curve.point_at(k as f32 / 10.0);
            let b = curve.point_at((k + 1) as f32 / 10.0);
            // Chords are never longer than the arc they span.
            assert!(a.distance(b) <= step * 1.01);
            assert!(a.distance(b) > step * 0.5);
        }
    }

    #[test]
    fn points_include_both_ends() {
        let pts = zigzag().points(50);
        assert_eq!(pts.len(), 51);
        assert_eq!(pts[0], Vec2::new(-10.0, 0.0));
    }
}
