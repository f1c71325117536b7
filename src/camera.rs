//! First-person camera: yaw/pitch Euler angles, an orthonormal basis
//! derived from them, and a look-at view matrix.
//!
//! Pure kinematics - the camera owns no GPU state. The renderer
//! broadcasts [`view_matrix`](Camera::view_matrix) to the projected
//! shader programs each frame.

use glam::{Mat4, Vec3};

use crate::input::InputSnapshot;

/// Pitch is clamped short of ±90° to avoid gimbal flip.
const PITCH_LIMIT: f32 = 89.0;

/// Movement intents, relative to the camera's current basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Along `front`.
    Forward,
    /// Against `front`.
    Backward,
    /// Against `right`.
    Left,
    /// Along `right`.
    Right,
}

/// First-person camera state.
///
/// `front`, `up`, and `right` are unit vectors forming a right-handed
/// orthonormal basis. They are derived - recomputed whenever yaw or
/// pitch changes - and never set directly.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    /// World units per second for movement intents.
    pub movement_speed: f32,
    /// Degrees per unit of look delta.
    pub look_sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), 3.0, 0.2)
    }
}

impl Camera {
    /// Camera at `position`, looking down negative Z (yaw −90°,
    /// pitch 0°).
    pub fn new(
        position: Vec3,
        movement_speed: f32,
        look_sensitivity: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            movement_speed,
            look_sensitivity,
        };
        camera.update_basis();
        camera
    }

    /// Current view direction.
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Current up vector.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Current right vector.
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Yaw angle in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch angle in degrees, always within ±89°.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Move the camera along its basis for `dt` seconds.
    pub fn process_movement(&mut self, direction: MoveDirection, dt: f32) {
        let velocity = self.movement_speed * dt;
        match direction {
            MoveDirection::Forward => self.position += self.front * velocity,
            MoveDirection::Backward => {
                self.position -= self.front * velocity;
            }
            MoveDirection::Left => self.position -= self.right * velocity,
            MoveDirection::Right => self.position += self.right * velocity,
        }
    }

    /// Apply a look delta (screen-space, sensitivity-scaled) and
    /// recompute the basis.
    pub fn process_look_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.look_sensitivity;
        self.pitch = (self.pitch + dy * self.look_sensitivity)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_basis();
    }

    /// Apply one per-frame input snapshot: look delta first, then
    /// every active movement intent.
    pub fn apply(&mut self, snapshot: &InputSnapshot) {
        if snapshot.look_delta != glam::Vec2::ZERO {
            self.process_look_delta(
                snapshot.look_delta.x,
                snapshot.look_delta.y,
            );
        }
        let dt = snapshot.elapsed_seconds as f32;
        for direction in snapshot.movement.directions() {
            self.process_movement(direction, dt);
        }
    }

    /// View matrix looking from `position` toward `position + front`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Basis recomputation is a pure function of (yaw, pitch,
    /// world_up) - no drift accumulates beyond the stored angles.
    fn update_basis(&mut self) {
        let (yaw, pitch) =
            (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MovementIntents;

    const EPS: f32 = 1e-5;

    #[test]
    fn basis_stays_orthonormal_and_right_handed_across_angles() {
        let mut camera = Camera::default();
        for yaw_step in 0..12 {
            for pitch_step in -8..=8 {
                camera.yaw = yaw_step as f32 * 30.0;
                camera.pitch = pitch_step as f32 * 11.0;
                camera.update_basis();

                let (f, u, r) = (camera.front(), camera.up(), camera.right());
                for v in [f, u, r] {
                    assert!((v.length() - 1.0).abs() < EPS, "{v:?}");
                }
                assert!(f.dot(u).abs() < EPS);
                assert!(f.dot(r).abs() < EPS);
                assert!(u.dot(r).abs() < EPS);
                // Right-handed: front × up points along right.
                assert!((f.cross(u) - r).length() < EPS);
            }
        }
    }

    #[test]
    fn pitch_clamps_short_of_vertical() {
        let mut camera = Camera::default();
        camera.process_look_delta(0.0, 10_000.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.process_look_delta(0.0, -100_000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.front() - Vec3::NEG_Z).length() < EPS);
        assert!((camera.right() - Vec3::X).length() < EPS);
        assert!((camera.up() - Vec3::Y).length() < EPS);
    }

    #[test]
    fn movement_follows_the_basis() {
        let mut camera = Camera::new(Vec3::ZERO, 2.0, 0.2);
        camera.process_movement(MoveDirection::Forward, 0.5);
        assert!((camera.position - Vec3::new(0.0, 0.0, -1.0)).length() < EPS);
        camera.process_movement(MoveDirection::Right, 0.5);
        assert!((camera.position - Vec3::new(1.0, 0.0, -1.0)).length() < EPS);
        camera.process_movement(MoveDirection::Backward, 0.5);
        camera.process_movement(MoveDirection::Left, 0.5);
        assert!(camera.position.length() < EPS);
    }

    #[test]
    fn look_delta_scales_with_sensitivity() {
        let mut camera = Camera::new(Vec3::ZERO, 3.0, 0.2);
        camera.process_look_delta(50.0, 0.0);
        assert!((camera.yaw() - (-90.0 + 10.0)).abs() < EPS);
    }

    #[test]
    fn snapshot_applies_look_then_movement() {
        let mut camera = Camera::new(Vec3::ZERO, 1.0, 0.2);
        let snapshot = InputSnapshot {
            look_delta: glam::Vec2::new(450.0, 0.0), // yaw -90 -> 0
            movement: MovementIntents {
                forward: true,
                ..MovementIntents::default()
            },
            elapsed_seconds: 1.0,
        };
        camera.apply(&snapshot);
        // After rotating to yaw 0 the camera faces +X and moves there.
        assert!((camera.position - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn view_matrix_maps_a_point_ahead_onto_the_view_axis() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        let ahead = camera.position + camera.front() * 5.0;
        let in_view = view.transform_point3(ahead);
        assert!(in_view.x.abs() < EPS);
        assert!(in_view.y.abs() < EPS);
        assert!((in_view.z + 5.0).abs() < EPS);
    }
}
