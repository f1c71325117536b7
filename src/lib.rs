// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Documentation
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]

//! GPU-accelerated soft-robot sensor visualization engine built on wgpu.
//!
//! Somaviz renders live sensor readings as an animated 3-D scene: a
//! screen-space bar chart plus a procedurally generated, deformable
//! cylinder ("soft robot") whose skin bends along an interpolated
//! backbone and colors itself from the incoming values.
//!
//! # Key entry points
//!
//! - [`renderer::Renderer`] - one shader program per mesh type, draw
//!   routing and per-program matrix state
//! - [`scene::SoftRobot`] - the deformable cylinder drawable
//! - [`scene::BarPlot`] - the screen-space bar chart drawable
//! - [`camera::Camera`] - first-person yaw/pitch camera
//! - [`sensor`] - CSV frame parsing, acquisition thread, and the
//!   single-slot snapshot hand-off
//! - [`options::Options`] - runtime configuration (TOML presets)
//!
//! # Architecture
//!
//! The render loop is single-threaded: per frame it consumes an
//! [`input::InputSnapshot`], advances the bend parameter, rewrites the
//! skin's position/color regions in place, and issues indexed draws
//! over disjoint ranges of shared buffers. An optional acquisition
//! thread hands the loop the latest sensor frame through a
//! [`sensor::LatestSlot`] (overwrite semantics - never a queue).

pub mod camera;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod sensor;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;
