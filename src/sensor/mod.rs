//! Sensor ingestion: CSV frame parsing, the latest-snapshot hand-off,
//! recording/replay, and the background acquisition thread.
//!
//! The serial port itself is an external collaborator; everything here
//! reads CSV frames from any [`std::io::BufRead`] source (a replay
//! file, a port wrapper, a test fixture) or generates them.

pub mod acquisition;
pub mod csv;
pub mod recording;
pub mod slot;

pub use acquisition::{
    Acquisition, ReaderSource, SensorSource, SimulatedSource,
};
pub use csv::{parse_frame, FrameError, SensorReader};
pub use recording::Recording;
pub use slot::LatestSlot;
