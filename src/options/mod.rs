//! Centralized runtime options with TOML preset support.
//!
//! All tweakable settings (display, robot geometry, camera, bar chart,
//! sensor cadence) are consolidated here. Every sub-struct uses
//! `#[serde(default)]` so partial TOML files (e.g. only overriding
//! `[robot]`) work correctly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SomavizError;
use crate::geometry::skin;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Window and frame pacing.
    pub display: DisplayOptions,
    /// Soft-robot geometry and coloring.
    pub robot: RobotOptions,
    /// Camera kinematics and projection.
    pub camera: CameraOptions,
    /// Bar-chart placement and scaling.
    pub plot: PlotOptions,
    /// Sensor stream shape and cadence.
    pub sensor: SensorOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::Io`] if the file cannot be read or
    /// [`SomavizError::OptionsParse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, SomavizError> {
        let content = std::fs::read_to_string(path).map_err(SomavizError::Io)?;
        toml::from_str(&content)
            .map_err(|e| SomavizError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::OptionsParse`] if serialization fails
    /// or [`SomavizError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SomavizError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SomavizError::OptionsParse(e.to_string()))?;
        std::fs::write(path, content).map_err(SomavizError::Io)
    }
}

/// Window and frame pacing options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayOptions {
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Frame-rate cap (0 = uncapped).
    pub target_fps: u32,
    /// Background clear color (RGBA).
    pub clear_color: [f32; 4],
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            target_fps: 60,
            clear_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Soft-robot geometry and coloring options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RobotOptions {
    /// Number of skin rings (backbone control points).
    pub segments: usize,
    /// Perimeter subdivisions per ring.
    pub ring_subdivisions: usize,
    /// Backbone radius when fully bent.
    pub bending_radius: f32,
    /// Radius of the cylindrical skin.
    pub cylinder_radius: f32,
    /// Fixed per-frame bend parameter step (ping-ponged in [0, 1]).
    pub bend_step: f32,
    /// Default skin color.
    pub skin_color: [f32; 4],
    /// Color at sensor value 0.
    pub min_color: [f32; 4],
    /// Color at sensor value 1.
    pub max_color: [f32; 4],
}

impl Default for RobotOptions {
    fn default() -> Self {
        Self {
            segments: 10,
            ring_subdivisions: 32,
            bending_radius: 1.5,
            cylinder_radius: 0.3,
            bend_step: 0.01,
            skin_color: skin::DEFAULT_SKIN_COLOR,
            min_color: skin::DEFAULT_MIN_COLOR,
            max_color: skin::DEFAULT_MAX_COLOR,
        }
    }
}

/// Camera kinematics and projection options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    /// Initial eye position.
    pub position: [f32; 3],
    /// Movement speed in world units per second.
    pub movement_speed: f32,
    /// Look sensitivity in degrees per pixel of cursor delta.
    pub look_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane distance.
    pub z_near: f32,
    /// Far clipping plane distance.
    pub z_far: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [0.0, 1.0, 4.0],
            movement_speed: 3.0,
            look_sensitivity: 0.2,
            fov_degrees: 45.0,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

/// Bar-chart placement and scaling options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlotOptions {
    /// Chart corner in NDC.
    pub origin: [f32; 2],
    /// X-axis length in NDC.
    pub x_length: f32,
    /// Y-axis length in NDC.
    pub y_length: f32,
    /// Axis and tick color.
    pub axis_color: [f32; 4],
    /// Bar fill color.
    pub bar_color: [f32; 4],
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            origin: [-0.9, 0.35],
            x_length: 0.5,
            y_length: 0.5,
            axis_color: [0.0, 0.0, 0.0, 1.0],
            bar_color: [0.25, 0.45, 0.8, 1.0],
        }
    }
}

/// Sensor stream shape and cadence options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorOptions {
    /// Readings per frame (one per interior skin ring / chart bar).
    pub count: usize,
    /// Full-scale raw reading (values normalize as `value / max`).
    pub max_value: f32,
    /// Acquisition cadence in milliseconds.
    pub interval_ms: u64,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            count: 8,
            max_value: 1023.0,
            interval_ms: 160,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let options: Options =
            toml::from_str("[robot]\nsegments = 12\n").unwrap();
        assert_eq!(options.robot.segments, 12);
        assert_eq!(options.robot.ring_subdivisions, 32);
        assert_eq!(options.sensor.count, 8);
    }

    #[test]
    fn options_round_trip_through_toml() {
        let mut options = Options::default();
        options.camera.movement_speed = 5.0;
        options.plot.origin = [-0.5, 0.0];
        let text = toml::to_string_pretty(&options).unwrap();
        let parsed: Options = toml::from_str(&text).unwrap();
        assert_eq!(parsed, options);
    }
}
