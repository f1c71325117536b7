//! GPU-backed drawables: the soft robot, the bar chart, and textured
//! labels. Each owns its `GeometryBuffer`(s) and wraps the pure
//! geometry from [`crate::geometry`] with upload and draw logic.

pub mod bar_plot;
pub mod label;
pub mod soft_robot;

pub use bar_plot::BarPlot;
pub use label::Label;
pub use soft_robot::SoftRobot;
