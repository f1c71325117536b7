//! Per-frame input snapshots.
//!
//! The core never touches windowing state: the event-loop collaborator
//! collects raw events and hands the render loop one platform-agnostic
//! snapshot per frame. Winit conversions live behind the `viewer`
//! feature.

use glam::Vec2;

use crate::camera::MoveDirection;

/// Which movement intents are active this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntents {
    /// Move along the camera's front vector.
    pub forward: bool,
    /// Move against the camera's front vector.
    pub backward: bool,
    /// Move against the camera's right vector.
    pub left: bool,
    /// Move along the camera's right vector.
    pub right: bool,
}

impl MovementIntents {
    /// Iterate over the active intents.
    pub fn directions(&self) -> impl Iterator<Item = MoveDirection> + '_ {
        [
            (self.forward, MoveDirection::Forward),
            (self.backward, MoveDirection::Backward),
            (self.left, MoveDirection::Left),
            (self.right, MoveDirection::Right),
        ]
        .into_iter()
        .filter_map(|(active, direction)| active.then_some(direction))
    }

    /// `true` if any intent is active.
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Track a WASD key transition. Returns `false` for keys that are
    /// not movement-bound.
    #[cfg(feature = "viewer")]
    pub fn set_key(
        &mut self,
        code: winit::keyboard::KeyCode,
        pressed: bool,
    ) -> bool {
        use winit::keyboard::KeyCode;
        match code {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyD => self.right = pressed,
            _ => return false,
        }
        true
    }
}

/// One frame's worth of input, consumed by the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Accumulated cursor delta since the last frame. Positive `y`
    /// pitches up (the event-loop collaborator flips the screen-space
    /// axis).
    pub look_delta: Vec2,
    /// Active movement intents.
    pub movement: MovementIntents,
    /// Seconds since the last frame.
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_reflect_active_intents() {
        let intents = MovementIntents {
            forward: true,
            right: true,
            ..MovementIntents::default()
        };
        let directions: Vec<_> = intents.directions().collect();
        assert_eq!(
            directions,
            vec![MoveDirection::Forward, MoveDirection::Right],
        );
        assert!(intents.any());
        assert!(!MovementIntents::default().any());
    }
}
