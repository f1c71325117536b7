//! Textured quad drawable (position-texture mesh type).
//!
//! Used for flat imagery in the 3-D scene - the demo places one under
//! the robot as a table surface. Pixels come pre-decoded from the
//! asset collaborator.

use glam::Vec3;

use crate::error::SomavizError;
use crate::gpu::geometry_buffer::{
    DrawRange, GeometryBuffer, MeshData, Primitive,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_program::ShaderProgram;
use crate::gpu::texture::ImageTexture;
use crate::renderer::Drawable;

/// A `width` x `height` textured quad centered on the origin of the
/// X/Y plane.
pub struct Label {
    mesh: GeometryBuffer,
    texture_bind_group: wgpu::BindGroup,
    range: DrawRange,
}

impl Label {
    /// Build the quad and its texture bind group against the given
    /// position-texture program.
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::Viewer`] if `program` does not sample a
    /// texture, or [`SomavizError::Geometry`] on a shape-invariant bug.
    pub fn new(
        context: &RenderContext,
        program: &ShaderProgram,
        width: f32,
        height: f32,
        texture: &ImageTexture,
    ) -> Result<Self, SomavizError> {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let positions = vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
            Vec3::new(hw, hh, 0.0),
        ];
        let tex_coords =
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let indices = vec![0, 1, 2, 3, 2, 1];
        let index_count = indices.len() as u32;

        let mesh = GeometryBuffer::new(
            context,
            MeshData::with_tex_coords(positions, indices, tex_coords),
        )?;

        let layout = program.texture_layout().ok_or_else(|| {
            SomavizError::Viewer(
                "label program does not sample a texture".into(),
            )
        })?;
        let texture_bind_group =
            texture.bind_group(&context.device, layout);

        Ok(Self {
            mesh,
            texture_bind_group,
            range: DrawRange {
                primitive: Primitive::Triangles,
                first_index: 0,
                index_count,
            },
        })
    }

    /// Translate the quad and re-upload its positions.
    pub fn move_by(&mut self, queue: &wgpu::Queue, delta: Vec3) {
        self.mesh.move_by(queue, delta);
    }

    /// The underlying mesh (for direct position rewrites, e.g. laying
    /// the quad flat).
    pub fn mesh_mut(&mut self) -> &mut GeometryBuffer {
        &mut self.mesh
    }
}

impl Drawable for Label {
    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        program: &'a ShaderProgram,
    ) {
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        pass.set_pipeline(program.pipeline(self.range.primitive));
        self.mesh.draw(pass, self.range);
    }
}
