//! The deformable soft-robot drawable.
//!
//! Owns the skin mesh and the backbone polyline mesh, pushes batched
//! position/color region updates per frame, and renders with the
//! two-pass technique: colored faces first, then every ring outline
//! (plus the backbone) in flat black over the same buffer.
//!
//! Under GL the outline pass overwrote the color region mid-draw; with
//! wgpu, queued buffer writes execute before the submitted pass, so
//! the technique becomes two submissions with the black overwrite and
//! the restore queued between them.

use crate::error::SomavizError;
use crate::geometry::backbone::BackbonePose;
use crate::geometry::skin::SkinGeometry;
use crate::gpu::geometry_buffer::{
    DrawRange, GeometryBuffer, GeometryError, MeshData, Primitive,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_program::ShaderProgram;
use crate::options::RobotOptions;
use crate::renderer::{Drawable, MeshType, Renderer};

const OUTLINE_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// GPU-backed soft robot: skin geometry, its `GeometryBuffer`, and the
/// backbone polyline.
pub struct SoftRobot {
    skin: SkinGeometry,
    mesh: GeometryBuffer,
    backbone_mesh: GeometryBuffer,
    min_color: [f32; 4],
    max_color: [f32; 4],
    /// All-black color array for the outline pass.
    black_colors: Vec<[f32; 4]>,
}

impl SoftRobot {
    /// Generate the robot from its options and upload both meshes.
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::Geometry`] if the generated arrays
    /// violate the shape invariants (a bug in generation, not a
    /// runtime condition).
    pub fn new(
        context: &RenderContext,
        options: &RobotOptions,
    ) -> Result<Self, SomavizError> {
        let pose = BackbonePose::quarter_circle(
            options.segments,
            options.bending_radius,
        );
        let skin = SkinGeometry::new(
            pose,
            options.cylinder_radius,
            options.ring_subdivisions,
            options.skin_color,
        );

        let mesh = GeometryBuffer::new(
            context,
            MeshData::with_colors(
                skin.positions().to_vec(),
                skin.indices().to_vec(),
                skin.colors().to_vec(),
            ),
        )?;

        let spine = skin.spine().to_vec();
        let backbone_mesh = GeometryBuffer::new(
            context,
            MeshData::with_colors(
                spine,
                (0..skin.ring_count() as u32).collect(),
                vec![OUTLINE_COLOR; skin.ring_count()],
            ),
        )?;

        let black_colors = vec![OUTLINE_COLOR; skin.positions().len()];

        Ok(Self {
            skin,
            mesh,
            backbone_mesh,
            min_color: options.min_color,
            max_color: options.max_color,
            black_colors,
        })
    }

    /// The CPU skin model.
    pub fn skin(&self) -> &SkinGeometry {
        &self.skin
    }

    /// Recompute ring transforms for bend parameter `p` and push the
    /// new skin and backbone positions in one batched update each.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] only if vertex counts changed, which
    /// generation makes impossible.
    pub fn update_skin_vertices(
        &mut self,
        queue: &wgpu::Queue,
        p: f32,
    ) -> Result<(), GeometryError> {
        self.skin.deform(p);
        self.mesh.update_positions(queue, self.skin.positions())?;
        self.backbone_mesh.update_positions(queue, self.skin.spine())
    }

    /// Re-blend interior ring colors from normalized sensor values and
    /// push the color region.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] only if vertex counts changed, which
    /// generation makes impossible.
    pub fn update_colors(
        &mut self,
        queue: &wgpu::Queue,
        values: &[f32],
    ) -> Result<(), GeometryError> {
        self.skin
            .blend_colors(values, self.min_color, self.max_color);
        self.mesh.update_colors(queue, self.skin.colors())
    }

    /// Draw the complete robot: colored faces in one pass, then black
    /// ring outlines and the backbone in a second load-pass, with the
    /// color overwrite/restore queued between the two submissions.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] only if vertex counts changed, which
    /// generation makes impossible.
    pub fn render(
        &self,
        context: &RenderContext,
        renderer: &Renderer,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) -> Result<(), GeometryError> {
        let mut encoder = context.create_encoder();
        {
            let mut pass = begin_load_pass(
                &mut encoder,
                "Robot Faces Pass",
                color_view,
                depth_view,
            );
            renderer.render(&mut pass, self, MeshType::PositionColor);
        }
        context.submit(encoder);

        self.mesh.update_colors(&context.queue, &self.black_colors)?;

        let outline = OutlinePass(self);
        let mut encoder = context.create_encoder();
        {
            let mut pass = begin_load_pass(
                &mut encoder,
                "Robot Outline Pass",
                color_view,
                depth_view,
            );
            renderer.render(&mut pass, &outline, MeshType::PositionColor);
        }
        context.submit(encoder);

        self.mesh.update_colors(&context.queue, self.skin.colors())
    }
}

impl Drawable for SoftRobot {
    /// The colored faces: both end caps and the mantle strips.
    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        program: &'a ShaderProgram,
    ) {
        pass.set_pipeline(program.pipeline(Primitive::Triangles));
        self.mesh.draw(pass, self.skin.bottom_cap_range());
        self.mesh.draw(pass, self.skin.top_cap_range());

        pass.set_pipeline(program.pipeline(Primitive::TriangleStrip));
        self.mesh.draw(pass, self.skin.mantle_range());
    }
}

/// Second-pass facade: ring outlines plus the backbone polyline, drawn
/// while the color region holds flat black.
struct OutlinePass<'r>(&'r SoftRobot);

impl Drawable for OutlinePass<'_> {
    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        program: &'a ShaderProgram,
    ) {
        let robot = self.0;
        pass.set_pipeline(program.pipeline(Primitive::LineStrip));
        for ring in 0..robot.skin.ring_count() {
            robot.mesh.draw(pass, robot.skin.outline_range(ring));
        }
        let spine_range = DrawRange {
            primitive: Primitive::LineStrip,
            first_index: 0,
            index_count: robot.skin.ring_count() as u32,
        };
        robot.backbone_mesh.draw(pass, spine_range);

        pass.set_pipeline(program.pipeline(Primitive::Points));
        robot.backbone_mesh.draw(
            pass,
            DrawRange {
                primitive: Primitive::Points,
                ..spine_range
            },
        );
    }
}

fn begin_load_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    color_view: &'e wgpu::TextureView,
    depth_view: &'e wgpu::TextureView,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(
            wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            },
        ),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
