//! GPU resource layer: device/queue context, packed geometry buffers,
//! shader programs with reflected uniform interfaces, and textures.

pub mod geometry_buffer;
pub mod render_context;
pub mod shader_program;
pub mod texture;

pub use geometry_buffer::{
    DrawRange, GeometryBuffer, GeometryError, LayoutKind, MeshData,
    Primitive,
};
pub use render_context::{RenderContext, RenderContextError};
pub use shader_program::{ShaderError, ShaderProgram};
pub use texture::{DepthTexture, ImageTexture};
