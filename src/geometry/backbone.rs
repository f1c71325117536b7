//! Backbone control polylines and the bending interpolation law.
//!
//! The backbone is the 1-D control polyline driving the soft robot's
//! skin deformation. Two poses are fixed at construction - a straight
//! rest pose and a fully bent pose - and intermediate poses are
//! computed on demand by moving every point along a circular arc
//! derived from the two endpoints, which gives a physically plausible
//! bending trajectory instead of a straight-line blend.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

/// Rest and fully-bent control polylines of equal length.
///
/// The first point of both poses is pinned at the origin. For every
/// later point the rest height must strictly exceed the magnitude of
/// the bent height (`y_s > |y_e|`), otherwise the arc radius in
/// [`interpolate`](Self::interpolate) is singular. That is a
/// construction invariant of the poses, not a runtime-checked case;
/// [`quarter_circle`](Self::quarter_circle) satisfies it for free.
#[derive(Debug, Clone)]
pub struct BackbonePose {
    rest: Vec<Vec3>,
    bent: Vec<Vec3>,
}

impl BackbonePose {
    /// Pose pair from explicit rest and bent polylines.
    ///
    /// Both polylines must have the same length (at least 2), and
    /// `rest[i].y > |bent[i].y|` must hold for every `i > 0`.
    pub fn new(rest: Vec<Vec3>, bent: Vec<Vec3>) -> Self {
        debug_assert_eq!(rest.len(), bent.len());
        debug_assert!(rest.len() >= 2);
        debug_assert!(
            rest.iter()
                .zip(&bent)
                .skip(1)
                .all(|(s, e)| s.y > e.y.abs()),
            "rest height must exceed |bent height| for every non-first point"
        );
        Self { rest, bent }
    }

    /// Canonical soft-robot pose pair: a vertical rest polyline whose
    /// arc length equals a quarter circle of the given radius, bending
    /// into that quarter circle.
    ///
    /// Rest: `y_i = i * b / (n - 1)` with `b = R * 2π/4`.
    /// Bent: `t_i` sweeping `[3π/2, 2π]`, `x = R sin t + R`,
    /// `y = R cos t`.
    pub fn quarter_circle(n: usize, bending_radius: f32) -> Self {
        debug_assert!(n >= 2);
        let arc_length = bending_radius * TAU / 4.0;
        let last = (n - 1) as f32;

        let rest = (0..n)
            .map(|i| Vec3::new(0.0, i as f32 * arc_length / last, 0.0))
            .collect();

        let (t0, t1) = (3.0 * FRAC_PI_2, TAU);
        let bent = (0..n)
            .map(|i| {
                let t = t0 + i as f32 * (t1 - t0) / last;
                Vec3::new(
                    bending_radius * t.sin() + bending_radius,
                    bending_radius * t.cos(),
                    0.0,
                )
            })
            .collect();

        Self::new(rest, bent)
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.rest.len()
    }

    /// `true` if the pose holds no control points (never the case for
    /// poses built through the public constructors).
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// The rest-pose polyline.
    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    /// The fully-bent polyline.
    pub fn bent(&self) -> &[Vec3] {
        &self.bent
    }

    /// Interpolated pose at bend parameter `p`, clamped to `[0, 1]`.
    ///
    /// The first point stays pinned at the origin. Every later point
    /// travels along a circular arc between its rest position (arc
    /// angle `π/2`) and its bent position (arc angle
    /// `asin(y_e / y_s)`), with the arc radius scale
    /// `a = x_e / sqrt(y_s² - y_e²)` recovered from the bent-pose
    /// coordinates.
    pub fn interpolate(&self, p: f32) -> Vec<Vec3> {
        let p = p.clamp(0.0, 1.0);
        let t_s = FRAC_PI_2;

        self.rest
            .iter()
            .zip(&self.bent)
            .enumerate()
            .map(|(i, (rest, bent))| {
                if i == 0 {
                    return Vec3::ZERO;
                }
                let y_s = rest.y;
                let (x_e, y_e) = (bent.x, bent.y);
                let a = x_e / (y_s * y_s - y_e * y_e).sqrt();
                let t_e = (y_e / y_s).asin();
                let t = t_s + p * (t_e - t_s);
                Vec3::new(a * y_s * t.cos(), y_s * t.sin(), 0.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(actual: Vec3, expected: Vec3, context: &str) {
        assert!(
            (actual - expected).length() < EPS,
            "{context}: {actual:?} != {expected:?}",
        );
    }

    #[test]
    fn interpolate_at_zero_reproduces_rest_pose() {
        let pose = BackbonePose::quarter_circle(10, 1.5);
        let interpolated = pose.interpolate(0.0);
        for (i, (got, want)) in
            interpolated.iter().zip(pose.rest()).enumerate()
        {
            assert_close(*got, *want, &format!("point {i} at p=0"));
        }
    }

    #[test]
    fn interpolate_at_one_reproduces_bent_pose() {
        let pose = BackbonePose::quarter_circle(10, 1.5);
        let interpolated = pose.interpolate(1.0);
        for (i, (got, want)) in
            interpolated.iter().zip(pose.bent()).enumerate()
        {
            if i == 0 {
                // The first point is pinned at the origin for both
                // poses; quarter_circle's bent pose puts it there too.
                assert_close(*got, Vec3::ZERO, "pinned point at p=1");
                continue;
            }
            assert_close(*got, *want, &format!("point {i} at p=1"));
        }
    }

    #[test]
    fn out_of_range_parameters_clamp() {
        let pose = BackbonePose::quarter_circle(6, 2.0);
        assert_eq!(pose.interpolate(-0.5), pose.interpolate(0.0));
        assert_eq!(pose.interpolate(1.5), pose.interpolate(1.0));
    }

    #[test]
    fn first_point_stays_pinned_for_all_parameters() {
        let pose = BackbonePose::quarter_circle(8, 1.0);
        for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(pose.interpolate(p)[0], Vec3::ZERO, "p={p}");
        }
    }

    #[test]
    fn quarter_circle_rest_is_vertical_with_quarter_arc_length() {
        let radius = 1.5;
        let pose = BackbonePose::quarter_circle(10, radius);
        for point in pose.rest() {
            assert_eq!(point.x, 0.0);
            assert_eq!(point.z, 0.0);
        }
        let top = pose.rest()[9].y;
        assert!((top - radius * TAU / 4.0).abs() < EPS);
    }

    #[test]
    fn quarter_circle_bent_endpoint_reaches_radius_height() {
        // At t = 2π the bent formula gives (R sin t + R, R cos t)
        // = (R, R).
        let radius = 1.5;
        let pose = BackbonePose::quarter_circle(10, radius);
        assert_close(
            pose.bent()[9],
            Vec3::new(radius, radius, 0.0),
            "bent endpoint",
        );
    }

    #[test]
    fn intermediate_pose_follows_the_arc_formula() {
        // Independently evaluate the arc law for the last point at
        // p = 0.5 and compare against interpolate().
        let (n, radius) = (10, 1.5);
        let pose = BackbonePose::quarter_circle(n, radius);
        let p = 0.5;

        let y_s = pose.rest()[n - 1].y;
        let (x_e, y_e) = (pose.bent()[n - 1].x, pose.bent()[n - 1].y);
        let a = x_e / (y_s * y_s - y_e * y_e).sqrt();
        let t = FRAC_PI_2 + p * ((y_e / y_s).asin() - FRAC_PI_2);
        let expected = Vec3::new(a * y_s * t.cos(), y_s * t.sin(), 0.0);

        assert_close(
            pose.interpolate(p)[n - 1],
            expected,
            "last point at p=0.5",
        );
    }
}
