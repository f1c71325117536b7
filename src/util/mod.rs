//! Shared utilities for the render loop: frame pacing and the
//! ping-pong bend-parameter sequencer.

pub mod bend_cycle;
pub mod frame_timing;

pub use bend_cycle::BendCycle;
pub use frame_timing::FrameTiming;
