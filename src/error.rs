//! Crate-level error types.

use std::fmt;

use crate::gpu::geometry_buffer::GeometryError;
use crate::gpu::render_context::RenderContextError;
use crate::gpu::shader_program::ShaderError;

/// Errors produced by the somaviz crate.
#[derive(Debug)]
pub enum SomavizError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Shader compilation or linking failure.
    Shader(ShaderError),
    /// Vertex/index shape invariant violation.
    Geometry(GeometryError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn the acquisition thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for SomavizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Shader(e) => write!(f, "shader error: {e}"),
            Self::Geometry(e) => write!(f, "geometry error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for SomavizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Shader(e) => Some(e),
            Self::Geometry(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for SomavizError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<ShaderError> for SomavizError {
    fn from(e: ShaderError) -> Self {
        Self::Shader(e)
    }
}

impl From<GeometryError> for SomavizError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<std::io::Error> for SomavizError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
