//! Procedural cylindrical skin: ring generation, index-range layout,
//! and backbone-driven deformation.
//!
//! The skin is `n` rings of `m + 2` vertices each (ring center, `m`
//! perimeter points, and a duplicate of the first perimeter point that
//! closes the ring for strip drawing). Ring 0 is cached as the
//! `base_circle` template; deformation never regenerates vertices, it
//! re-transforms the template once per ring and rewrites the position
//! array in place.

use glam::{Mat4, Quat, Vec3};

use super::backbone::BackbonePose;
use crate::gpu::geometry_buffer::{DrawRange, Primitive};

/// Default skin color (mid gray).
pub const DEFAULT_SKIN_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
/// Default color for the minimum sensor value (green).
pub const DEFAULT_MIN_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
/// Default color for the maximum sensor value (red).
pub const DEFAULT_MAX_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Reference normal of the undeformed ring plane. Ring transforms
/// rotate this onto the local backbone tangent.
const REFERENCE_NORMAL: Vec3 = Vec3::Y;

/// CPU model of the soft robot's cylindrical skin.
///
/// Owns the backbone pose pair, the cached base-circle template, the
/// full vertex arrays, and the index ranges for the cap, mantle, and
/// outline draws. All data lives on the CPU; the `scene` layer uploads
/// it into a single `GeometryBuffer`.
#[derive(Debug)]
pub struct SkinGeometry {
    segments: usize,
    subdivisions: usize,
    pose: BackbonePose,
    /// Ring template at the origin: center + `m` perimeter points.
    /// Read-only after construction.
    base_circle: Vec<Vec3>,
    /// Latest interpolated backbone (rest pose until deformed).
    spine: Vec<Vec3>,
    positions: Vec<Vec3>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u32>,
    default_color: [f32; 4],
    mantle_offset: u32,
    caps_offset: u32,
}

impl SkinGeometry {
    /// Generate the skin for the given backbone pose.
    ///
    /// `cylinder_radius` is the ring radius, `subdivisions` the number
    /// of perimeter points per ring (`m`).
    pub fn new(
        pose: BackbonePose,
        cylinder_radius: f32,
        subdivisions: usize,
        default_color: [f32; 4],
    ) -> Self {
        let n = pose.len();
        let m = subdivisions;
        debug_assert!(m >= 3);

        let mut positions = Vec::with_capacity(n * (m + 2));
        for point in pose.rest() {
            let y = point.y;
            positions.push(Vec3::new(0.0, y, 0.0));
            for k in 0..m {
                let phi = (k as f32 / m as f32) * std::f32::consts::TAU;
                positions.push(Vec3::new(
                    cylinder_radius * phi.cos(),
                    y,
                    cylinder_radius * phi.sin(),
                ));
            }
            // Duplicate of the first perimeter point closes the ring.
            let base = positions.len() - (m + 1);
            positions.push(positions[base + 1]);
        }

        // Ring 0 sits at the origin, so its center + perimeter double
        // as the reusable template for every deformed ring.
        let base_circle = positions[..=m].to_vec();

        let colors = vec![default_color; positions.len()];
        let (indices, mantle_offset, caps_offset) =
            Self::build_indices(n, m);

        Self {
            segments: n,
            subdivisions: m,
            spine: pose.rest().to_vec(),
            pose,
            base_circle,
            positions,
            colors,
            indices,
            default_color,
            mantle_offset,
            caps_offset,
        }
    }

    /// One shared index list with three disjoint regions:
    /// fan-order ring indices (outline draws slice into these), the
    /// mantle triangle strips, and the cap triangle lists.
    fn build_indices(n: usize, m: usize) -> (Vec<u32>, u32, u32) {
        let ring_stride = (m + 2) as u32;
        let mut indices = Vec::new();

        // Per-ring fan order: center, perimeter, duplicate-close.
        for ring in 0..n as u32 {
            let base = ring * ring_stride;
            indices.extend((0..ring_stride).map(|j| base + j));
        }

        // Mantle: one triangle strip per adjacent ring pair,
        // interleaving (upper, lower) perimeter points and closing via
        // the duplicate vertices - 2m + 2 indices per strip.
        let mantle_offset = indices.len() as u32;
        for ring in 0..(n - 1) as u32 {
            let lower = ring * ring_stride;
            let upper = (ring + 1) * ring_stride;
            for k in 1..=(m + 1) as u32 {
                indices.push(upper + k);
                indices.push(lower + k);
            }
        }

        // Caps: the end-ring fans emitted as triangle lists (wgpu has
        // no fan topology) - m triangles per cap.
        let caps_offset = indices.len() as u32;
        for ring in [0, (n - 1) as u32] {
            let base = ring * ring_stride;
            for k in 0..m as u32 {
                indices.push(base);
                indices.push(base + 1 + k);
                indices.push(base + 2 + k);
            }
        }

        (indices, mantle_offset, caps_offset)
    }

    /// Number of rings (`n`).
    pub fn ring_count(&self) -> usize {
        self.segments
    }

    /// Perimeter subdivisions per ring (`m`).
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Vertices per ring: center + perimeter + duplicate-close.
    pub fn ring_vertex_count(&self) -> usize {
        self.subdivisions + 2
    }

    /// The backbone pose pair driving the deformation.
    pub fn pose(&self) -> &BackbonePose {
        &self.pose
    }

    /// The cached ring template (center + `m` perimeter points).
    pub fn base_circle(&self) -> &[Vec3] {
        &self.base_circle
    }

    /// Latest interpolated backbone polyline.
    pub fn spine(&self) -> &[Vec3] {
        &self.spine
    }

    /// All skin vertex positions, ring-major.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// All skin vertex colors, ring-major.
    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    /// The shared index list.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The default (uncolored) skin color.
    pub fn default_color(&self) -> [f32; 4] {
        self.default_color
    }

    /// Mantle triangle-strip range: `(n-1) * (2m+2)` indices.
    pub fn mantle_range(&self) -> DrawRange {
        let count =
            (self.segments - 1) as u32 * (2 * self.subdivisions + 2) as u32;
        DrawRange {
            primitive: Primitive::TriangleStrip,
            first_index: self.mantle_offset,
            index_count: count,
        }
    }

    /// Bottom-cap triangle-list range.
    pub fn bottom_cap_range(&self) -> DrawRange {
        DrawRange {
            primitive: Primitive::Triangles,
            first_index: self.caps_offset,
            index_count: 3 * self.subdivisions as u32,
        }
    }

    /// Top-cap triangle-list range.
    pub fn top_cap_range(&self) -> DrawRange {
        DrawRange {
            primitive: Primitive::Triangles,
            first_index: self.caps_offset + 3 * self.subdivisions as u32,
            index_count: 3 * self.subdivisions as u32,
        }
    }

    /// Outline range for one ring: its perimeter plus the
    /// duplicate-close vertex drawn as a line strip.
    pub fn outline_range(&self, ring: usize) -> DrawRange {
        debug_assert!(ring < self.segments);
        let ring_stride = (self.subdivisions + 2) as u32;
        DrawRange {
            primitive: Primitive::LineStrip,
            first_index: ring as u32 * ring_stride + 1,
            index_count: (self.subdivisions + 1) as u32,
        }
    }

    /// Recompute every ring's rigid transform for bend parameter `p`
    /// and rewrite the position array from the base-circle template.
    ///
    /// Ring 0 is pinned (identity rotation). Interior rings take their
    /// tangent from the central difference of neighboring backbone
    /// points; the last ring falls back to a one-sided difference.
    pub fn deform(&mut self, p: f32) {
        let spine = self.pose.interpolate(p);
        let n = spine.len();
        let stride = self.subdivisions + 2;

        for (i, point) in spine.iter().enumerate() {
            let rotation = if i == 0 {
                Quat::IDENTITY
            } else {
                let tangent = if i == n - 1 {
                    (*point - spine[i - 1]).normalize()
                } else {
                    (spine[i + 1] - spine[i - 1]).normalize()
                };
                rotation_between(REFERENCE_NORMAL, tangent)
            };
            let transform = Mat4::from_translation(*point)
                * Mat4::from_quat(rotation);

            let base = i * stride;
            for (j, template) in self.base_circle.iter().enumerate() {
                self.positions[base + j] =
                    transform.transform_point3(*template);
            }
            self.positions[base + stride - 1] = self.positions[base + 1];
        }

        self.spine = spine;
    }

    /// Blend interior rings' perimeter colors between `min_color` and
    /// `max_color` by each ring's normalized sensor value.
    ///
    /// Values map to rings `1..n-1` in order; the first and last rings
    /// keep the default skin color, as do all ring centers. Extra
    /// values are ignored; missing values leave later rings untouched.
    pub fn blend_colors(
        &mut self,
        values: &[f32],
        min_color: [f32; 4],
        max_color: [f32; 4],
    ) {
        let stride = self.subdivisions + 2;
        for (ring, &value) in (1..self.segments - 1).zip(values) {
            let color = [
                min_color[0] * (1.0 - value) + max_color[0] * value,
                min_color[1] * (1.0 - value) + max_color[1] * value,
                min_color[2] * (1.0 - value) + max_color[2] * value,
                1.0,
            ];
            let base = ring * stride;
            for slot in &mut self.colors[base + 1..base + stride] {
                *slot = color;
            }
        }
    }
}

/// Rotation taking `from` onto `to` (both unit vectors), built from
/// the angle between them about their cross-product axis. A tangent
/// numerically equal to the reference normal yields the identity.
///
/// An antiparallel pair leaves the axis degenerate; backbone poses are
/// constructed so that never happens.
fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let axis = from.cross(to);
    if axis.length_squared() < f32::EPSILON {
        debug_assert!(
            from.dot(to) > 0.0,
            "tangent antiparallel to the reference normal"
        );
        return Quat::IDENTITY;
    }
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    Quat::from_axis_angle(axis.normalize(), angle)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const EPS: f32 = 1e-4;

    fn test_skin() -> SkinGeometry {
        SkinGeometry::new(
            BackbonePose::quarter_circle(10, 1.5),
            0.3,
            32,
            DEFAULT_SKIN_COLOR,
        )
    }

    fn ring_center(skin: &SkinGeometry, ring: usize) -> Vec3 {
        skin.positions()[ring * skin.ring_vertex_count()]
    }

    #[test]
    fn ring_and_vertex_counts_match_construction() {
        let skin = test_skin();
        assert_eq!(skin.ring_count(), 10);
        assert_eq!(skin.ring_vertex_count(), 34);
        assert_eq!(skin.positions().len(), 10 * 34);
        assert_eq!(skin.colors().len(), skin.positions().len());
    }

    #[test]
    fn mantle_index_count_is_strips_times_closed_perimeter() {
        let skin = test_skin();
        // (n - 1) * (2m + 2)
        assert_eq!(skin.mantle_range().index_count, 9 * 66);
    }

    #[test]
    fn all_indices_reference_valid_vertices() {
        let skin = test_skin();
        let vertex_count = skin.positions().len() as u32;
        assert!(skin.indices().iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn base_circle_is_center_plus_perimeter_at_origin() {
        let skin = test_skin();
        assert_eq!(skin.base_circle().len(), 33);
        assert_eq!(skin.base_circle()[0], Vec3::ZERO);
        for point in &skin.base_circle()[1..] {
            assert!((point.length() - 0.3).abs() < EPS);
            assert_eq!(point.y, 0.0);
        }
    }

    #[test]
    fn rest_generation_stacks_rings_along_y() {
        let skin = test_skin();
        let stride = skin.ring_vertex_count();
        for (ring, rest) in skin.pose().rest().to_vec().iter().enumerate() {
            let base = ring * stride;
            assert_eq!(ring_center(&skin, ring), Vec3::new(0.0, rest.y, 0.0));
            for vertex in &skin.positions()[base + 1..base + stride] {
                assert_eq!(vertex.y, rest.y);
                let radial = Vec3::new(vertex.x, 0.0, vertex.z);
                assert!((radial.length() - 0.3).abs() < EPS);
            }
        }
    }

    #[test]
    fn deform_at_zero_reproduces_rest_geometry() {
        let mut skin = test_skin();
        let rest_positions = skin.positions().to_vec();
        skin.deform(0.0);
        for (got, want) in skin.positions().iter().zip(&rest_positions) {
            assert!(
                (*got - *want).length() < EPS,
                "{got:?} != {want:?}",
            );
        }
        assert_eq!(ring_center(&skin, 0), Vec3::ZERO);
    }

    #[test]
    fn deform_at_one_places_ring_centers_on_the_bent_pose() {
        let mut skin = test_skin();
        skin.deform(1.0);
        for ring in 1..skin.ring_count() {
            let want = skin.pose().bent()[ring];
            let got = ring_center(&skin, ring);
            assert!(
                (got - want).length() < EPS,
                "ring {ring}: {got:?} != {want:?}",
            );
        }
        // Last center reaches (R, R, 0) per the bent-pose formula.
        let last = ring_center(&skin, 9);
        assert!((last - Vec3::new(1.5, 1.5, 0.0)).length() < EPS);
    }

    #[test]
    fn half_bend_pins_ring_zero_and_follows_the_arc_law() {
        let mut skin = test_skin();
        skin.deform(0.5);

        assert_eq!(ring_center(&skin, 0), Vec3::ZERO);

        // Independently evaluate the interpolation law for the last
        // backbone point at p = 0.5.
        let y_s = skin.pose().rest()[9].y;
        let (x_e, y_e) = (skin.pose().bent()[9].x, skin.pose().bent()[9].y);
        let a = x_e / (y_s * y_s - y_e * y_e).sqrt();
        let t = FRAC_PI_2 + 0.5 * ((y_e / y_s).asin() - FRAC_PI_2);
        let expected = Vec3::new(a * y_s * t.cos(), y_s * t.sin(), 0.0);

        let got = ring_center(&skin, 9);
        assert!(
            (got - expected).length() < EPS,
            "{got:?} != {expected:?}",
        );
    }

    #[test]
    fn deform_reads_but_never_mutates_the_template() {
        let mut skin = test_skin();
        let template = skin.base_circle().to_vec();
        skin.deform(0.7);
        skin.deform(0.2);
        assert_eq!(skin.base_circle(), template.as_slice());
    }

    #[test]
    fn deformed_rings_keep_the_duplicate_close_vertex() {
        let mut skin = test_skin();
        skin.deform(0.5);
        let stride = skin.ring_vertex_count();
        for ring in 0..skin.ring_count() {
            let base = ring * stride;
            assert_eq!(
                skin.positions()[base + 1],
                skin.positions()[base + stride - 1],
                "ring {ring}",
            );
        }
    }

    #[test]
    fn color_blend_hits_exact_endpoints() {
        // Two sensor rings: n = 4 leaves rings 1 and 2 interior.
        let mut skin = SkinGeometry::new(
            BackbonePose::quarter_circle(4, 1.5),
            0.3,
            8,
            DEFAULT_SKIN_COLOR,
        );
        skin.blend_colors(
            &[0.0, 1.0],
            DEFAULT_MIN_COLOR,
            DEFAULT_MAX_COLOR,
        );

        let stride = skin.ring_vertex_count();
        for j in 1..stride {
            assert_eq!(skin.colors()[stride + j], DEFAULT_MIN_COLOR);
            assert_eq!(skin.colors()[2 * stride + j], DEFAULT_MAX_COLOR);
        }
        // Centers and the first/last rings keep the default color.
        assert_eq!(skin.colors()[stride], DEFAULT_SKIN_COLOR);
        for j in 0..stride {
            assert_eq!(skin.colors()[j], DEFAULT_SKIN_COLOR);
            assert_eq!(skin.colors()[3 * stride + j], DEFAULT_SKIN_COLOR);
        }
    }

    #[test]
    fn blend_with_midpoint_value_mixes_colors() {
        let mut skin = SkinGeometry::new(
            BackbonePose::quarter_circle(4, 1.0),
            0.2,
            4,
            DEFAULT_SKIN_COLOR,
        );
        skin.blend_colors(&[0.5], [0.0, 1.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0]);
        let stride = skin.ring_vertex_count();
        assert_eq!(skin.colors()[stride + 1], [0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn rotation_between_identical_vectors_is_identity() {
        let q = rotation_between(Vec3::Y, Vec3::Y);
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn rotation_between_maps_from_onto_to() {
        let to = Vec3::new(1.0, 1.0, 0.0).normalize();
        let q = rotation_between(Vec3::Y, to);
        assert!((q * Vec3::Y - to).length() < EPS);
    }
}
