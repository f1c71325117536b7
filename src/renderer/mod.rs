//! Draw routing: one shader program per mesh type, with per-program
//! matrix state.
//!
//! Mesh types are a closed enumeration - no string tags. Each program
//! keeps an independent copy of model/view/projection state, so a
//! camera change must be explicitly broadcast to every affected type;
//! the UI program declares no matrices at all and silently ignores
//! matrix pushes, which is what keeps NDC overlays fixed under camera
//! motion.

use glam::Mat4;

use crate::gpu::geometry_buffer::LayoutKind;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_program::{ShaderError, ShaderProgram};

const PC_VERT: &str =
    include_str!("../../assets/shaders/position_color.vert.wgsl");
const PC_FRAG: &str =
    include_str!("../../assets/shaders/position_color.frag.wgsl");
const PT_VERT: &str =
    include_str!("../../assets/shaders/position_texture.vert.wgsl");
const PT_FRAG: &str =
    include_str!("../../assets/shaders/position_texture.frag.wgsl");
const PCT_VERT: &str =
    include_str!("../../assets/shaders/position_color_texture.vert.wgsl");
const PCT_FRAG: &str =
    include_str!("../../assets/shaders/position_color_texture.frag.wgsl");
const UI_VERT: &str = include_str!("../../assets/shaders/ui.vert.wgsl");
const UI_FRAG: &str = include_str!("../../assets/shaders/ui.frag.wgsl");

/// The vertex-attribute combination a drawable declares, determining
/// which shader program renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshType {
    /// Projected, per-vertex colors.
    PositionColor,
    /// Projected, textured.
    PositionTexture,
    /// Projected, per-vertex colors tinting a texture.
    PositionColorTexture,
    /// Unprojected screen-space overlay (NDC positions + colors).
    Ui,
}

impl MeshType {
    /// Every mesh type, in program-table order.
    pub const ALL: [Self; 4] = [
        Self::PositionColor,
        Self::PositionTexture,
        Self::PositionColorTexture,
        Self::Ui,
    ];

    /// The projected types, which share camera view/projection state.
    pub const PROJECTED: [Self; 3] = [
        Self::PositionColor,
        Self::PositionTexture,
        Self::PositionColorTexture,
    ];

    /// The buffer layout meshes of this type use. UI meshes carry
    /// per-vertex colors like `PositionColor`; only the program
    /// differs.
    pub fn layout_kind(self) -> LayoutKind {
        match self {
            Self::PositionColor | Self::Ui => LayoutKind::PositionColor,
            Self::PositionTexture => LayoutKind::PositionTexture,
            Self::PositionColorTexture => LayoutKind::PositionColorTexture,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::PositionColor => 0,
            Self::PositionTexture => 1,
            Self::PositionColorTexture => 2,
            Self::Ui => 3,
        }
    }
}

/// Something that can record draw calls against an activated program.
///
/// Implementations select the pipeline for each of their index ranges
/// via [`ShaderProgram::pipeline`] and issue the indexed draws through
/// their [`GeometryBuffer`](crate::gpu::GeometryBuffer).
pub trait Drawable {
    /// Record this drawable's draw calls. The program has already
    /// been activated by [`Renderer::render`].
    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        program: &'a ShaderProgram,
    );
}

/// Owns the four shader programs and routes draw requests to them.
pub struct Renderer {
    programs: [ShaderProgram; 4],
}

impl Renderer {
    /// Compile the built-in programs and push initial matrix state:
    /// identity model/view and a perspective projection for the given
    /// aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderError`] if any built-in program fails to
    /// compile or link - fatal, nothing is left partially bound.
    pub fn new(
        context: &RenderContext,
        fov_degrees: f32,
        z_near: f32,
        z_far: f32,
    ) -> Result<Self, ShaderError> {
        let programs = [
            ShaderProgram::compile(
                context,
                PC_VERT,
                PC_FRAG,
                MeshType::PositionColor.layout_kind(),
            )?,
            ShaderProgram::compile(
                context,
                PT_VERT,
                PT_FRAG,
                MeshType::PositionTexture.layout_kind(),
            )?,
            ShaderProgram::compile(
                context,
                PCT_VERT,
                PCT_FRAG,
                MeshType::PositionColorTexture.layout_kind(),
            )?,
            ShaderProgram::compile(
                context,
                UI_VERT,
                UI_FRAG,
                MeshType::Ui.layout_kind(),
            )?,
        ];

        let renderer = Self { programs };
        let projection = Mat4::perspective_rh(
            fov_degrees.to_radians(),
            context.aspect(),
            z_near,
            z_far,
        );
        for ty in MeshType::PROJECTED {
            renderer.update_model_matrix(&context.queue, Mat4::IDENTITY, ty);
            renderer.update_view_matrix(&context.queue, Mat4::IDENTITY, ty);
            renderer.update_projection_matrix(&context.queue, projection, ty);
        }
        Ok(renderer)
    }

    /// The program serving a mesh type.
    pub fn program(&self, ty: MeshType) -> &ShaderProgram {
        &self.programs[ty.index()]
    }

    /// Activate the program for `ty`, then record the drawable's draw
    /// calls. Re-activation happens on every request; callers never
    /// rely on a program still being current from an earlier draw.
    pub fn render<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        drawable: &'a dyn Drawable,
        ty: MeshType,
    ) {
        let program = self.program(ty);
        program.activate(pass);
        drawable.draw(pass, program);
    }

    /// Set one program's model matrix.
    pub fn update_model_matrix(
        &self,
        queue: &wgpu::Queue,
        matrix: Mat4,
        ty: MeshType,
    ) {
        self.program(ty).set_mat4(queue, "model", matrix);
    }

    /// Set one program's view matrix.
    pub fn update_view_matrix(
        &self,
        queue: &wgpu::Queue,
        matrix: Mat4,
        ty: MeshType,
    ) {
        self.program(ty).set_mat4(queue, "view", matrix);
    }

    /// Set one program's projection matrix.
    pub fn update_projection_matrix(
        &self,
        queue: &wgpu::Queue,
        matrix: Mat4,
        ty: MeshType,
    ) {
        self.program(ty).set_mat4(queue, "projection", matrix);
    }

    /// Push a new view matrix to every projected program. The UI
    /// program has no view uniform, so including it would be a no-op
    /// anyway.
    pub fn broadcast_view(&self, queue: &wgpu::Queue, view: Mat4) {
        for ty in MeshType::PROJECTED {
            self.update_view_matrix(queue, view, ty);
        }
    }

    /// Recompute and push the perspective projection after a resize.
    pub fn update_aspect(
        &self,
        queue: &wgpu::Queue,
        fov_degrees: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    ) {
        let projection =
            Mat4::perspective_rh(fov_degrees.to_radians(), aspect, z_near, z_far);
        for ty in MeshType::PROJECTED {
            self.update_projection_matrix(queue, projection, ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_types_map_to_their_buffer_layouts() {
        assert_eq!(
            MeshType::PositionColor.layout_kind(),
            LayoutKind::PositionColor,
        );
        assert_eq!(MeshType::Ui.layout_kind(), LayoutKind::PositionColor);
        assert_eq!(
            MeshType::PositionTexture.layout_kind(),
            LayoutKind::PositionTexture,
        );
        assert_eq!(
            MeshType::PositionColorTexture.layout_kind(),
            LayoutKind::PositionColorTexture,
        );
    }

    #[test]
    fn program_table_indices_are_distinct() {
        let mut seen = [false; 4];
        for ty in MeshType::ALL {
            assert!(!seen[ty.index()]);
            seen[ty.index()] = true;
        }
    }
}
