//! Pure CPU-side geometry: backbone interpolation, skin generation and
//! deformation, and bar-chart layout.
//!
//! Nothing in this module touches the GPU, so every algorithm here is
//! testable without a device. The `scene` module wraps these types with
//! `GeometryBuffer` uploads.

pub mod backbone;
pub mod bar;
pub mod skin;

pub use backbone::BackbonePose;
pub use bar::BarChartLayout;
pub use skin::SkinGeometry;
