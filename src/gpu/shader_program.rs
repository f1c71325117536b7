//! Shader programs: WGSL validation, uniform-interface reflection,
//! and one render pipeline per primitive kind.
//!
//! A program is built from two text sources - a vertex module and a
//! fragment module. Both are parsed and validated through naga before
//! any GPU object exists, so a broken shader fails construction with
//! the full annotated compiler log and never leaves a half-built
//! program behind. The group-0 binding-0 uniform struct is reflected
//! into a name -> byte-offset table, which is what makes the typed
//! setters name-addressed: setting a uniform a program does not
//! declare is a silent no-op, not an error.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use glam::{Mat4, Vec3};

use crate::gpu::geometry_buffer::{LayoutKind, Primitive};
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::DEPTH_FORMAT;

/// Shader construction failures.
#[derive(Debug)]
pub enum ShaderError {
    /// A stage failed to parse or validate; carries the annotated
    /// compiler log.
    Compile {
        /// Which stage failed ("vertex" or "fragment").
        stage: &'static str,
        /// The annotated naga error output.
        log: String,
    },
    /// The two stages cannot form a program together.
    Link(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { stage, log } => {
                write!(f, "{stage} shader failed to compile:\n{log}")
            }
            Self::Link(msg) => write!(f, "program link failed: {msg}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Parse and validate one WGSL source, producing naga IR.
///
/// # Errors
///
/// Returns [`ShaderError::Compile`] with the annotated log if parsing
/// or validation fails.
pub fn validate_wgsl(
    source: &str,
    stage: &'static str,
) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        ShaderError::Compile {
            stage,
            log: e.emit_to_string(source),
        }
    })?;
    let _info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;
    Ok(module)
}

/// One member of the reflected uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UniformMember {
    offset: u32,
    size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UniformBlock {
    members: Vec<(String, UniformMember)>,
    size: u32,
}

/// Reflected program interface: the uniform name table and whether the
/// program samples a texture. Built from naga IR alone, so it is
/// testable without a device.
#[derive(Debug, Clone)]
pub struct ShaderInterface {
    uniforms: HashMap<String, UniformMember>,
    uniform_block_size: u32,
    has_texture: bool,
}

impl ShaderInterface {
    /// Reflect the interface of a validated vertex/fragment module
    /// pair, performing the link checks.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderError::Link`] if an entry point is missing, a
    /// fragment input has no matching vertex output, or the two
    /// modules disagree on the group-0 uniform block.
    pub fn reflect(
        vertex: &naga::Module,
        fragment: &naga::Module,
    ) -> Result<Self, ShaderError> {
        let vs = entry_point(vertex, "vs_main", naga::ShaderStage::Vertex)
            .ok_or_else(|| {
                ShaderError::Link(
                    "vertex module has no vs_main entry point".into(),
                )
            })?;
        let fs =
            entry_point(fragment, "fs_main", naga::ShaderStage::Fragment)
                .ok_or_else(|| {
                    ShaderError::Link(
                        "fragment module has no fs_main entry point".into(),
                    )
                })?;

        let outputs = io_locations(vertex, vs, IoDirection::Output);
        for location in io_locations(fragment, fs, IoDirection::Input) {
            if !outputs.contains(&location) {
                return Err(ShaderError::Link(format!(
                    "fragment input @location({location}) has no matching \
                     vertex output"
                )));
            }
        }

        let block = match (uniform_block(vertex), uniform_block(fragment)) {
            (Some(a), Some(b)) if a != b => {
                return Err(ShaderError::Link(
                    "vertex and fragment modules disagree on the \
                     group(0) binding(0) uniform block"
                        .into(),
                ));
            }
            (Some(a), _) => Some(a),
            (None, b) => b,
        };

        let (uniforms, uniform_block_size) = match block {
            Some(block) => {
                (block.members.into_iter().collect(), block.size)
            }
            None => (HashMap::new(), 0),
        };

        Ok(Self {
            uniforms,
            uniform_block_size,
            has_texture: uses_texture(vertex) || uses_texture(fragment),
        })
    }

    /// Byte offset of a uniform member, if the program declares it.
    pub fn uniform_offset(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).map(|member| member.offset)
    }

    /// Size in bytes of the group-0 uniform block (0 if absent).
    pub fn uniform_block_size(&self) -> u32 {
        self.uniform_block_size
    }

    /// Whether either stage samples a texture.
    pub fn has_texture(&self) -> bool {
        self.has_texture
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum IoDirection {
    Input,
    Output,
}

fn entry_point<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m naga::Function> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
        .map(|ep| &ep.function)
}

fn io_locations(
    module: &naga::Module,
    function: &naga::Function,
    direction: IoDirection,
) -> Vec<u32> {
    let mut locations = Vec::new();
    match direction {
        IoDirection::Output => {
            if let Some(result) = &function.result {
                collect_locations(
                    module,
                    result.ty,
                    result.binding.as_ref(),
                    &mut locations,
                );
            }
        }
        IoDirection::Input => {
            for argument in &function.arguments {
                collect_locations(
                    module,
                    argument.ty,
                    argument.binding.as_ref(),
                    &mut locations,
                );
            }
        }
    }
    locations
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.push(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } =
                &module.types[ty].inner
            {
                for member in members {
                    collect_locations(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn uniform_block(module: &naga::Module) -> Option<UniformBlock> {
    module.global_variables.iter().find_map(|(_, var)| {
        if var.space != naga::AddressSpace::Uniform {
            return None;
        }
        let binding = var.binding.as_ref()?;
        if binding.group != 0 || binding.binding != 0 {
            return None;
        }
        if let naga::TypeInner::Struct { members, span } =
            &module.types[var.ty].inner
        {
            let members = members
                .iter()
                .map(|member| {
                    let size =
                        module.types[member.ty].inner.size(module.to_ctx());
                    (
                        member.name.clone().unwrap_or_default(),
                        UniformMember {
                            offset: member.offset,
                            size,
                        },
                    )
                })
                .collect();
            Some(UniformBlock {
                members,
                size: *span,
            })
        } else {
            None
        }
    })
}

fn uses_texture(module: &naga::Module) -> bool {
    module.global_variables.iter().any(|(_, var)| {
        matches!(
            module.types[var.ty].inner,
            naga::TypeInner::Image { .. } | naga::TypeInner::Sampler { .. }
        )
    })
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x4,
        offset: 0,
        shader_location: 1,
    }];
const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    [wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 2,
    }];

/// One vertex-buffer slot per attribute region, in region order.
/// Shader locations are fixed crate-wide: 0 = position, 1 = color,
/// 2 = texture coordinate.
fn vertex_buffer_layouts(
    kind: LayoutKind,
) -> Vec<wgpu::VertexBufferLayout<'static>> {
    let mut layouts = vec![wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRIBUTES,
    }];
    if kind.has_colors() {
        layouts.push(wgpu::VertexBufferLayout {
            array_stride: 16,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &COLOR_ATTRIBUTES,
        });
    }
    if kind.has_tex_coords() {
        layouts.push(wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEX_COORD_ATTRIBUTES,
        });
    }
    layouts
}

/// A compiled vertex+fragment program with its reflected uniform
/// interface, uniform buffer, and per-primitive pipelines.
pub struct ShaderProgram {
    interface: ShaderInterface,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl ShaderProgram {
    /// Compile and link a program from two WGSL sources for meshes of
    /// the given layout kind.
    ///
    /// # Errors
    ///
    /// Returns [`ShaderError::Compile`] if either stage fails naga
    /// validation, or [`ShaderError::Link`] if the stages cannot form
    /// a program (see [`ShaderInterface::reflect`]).
    pub fn compile(
        context: &RenderContext,
        vertex_source: &str,
        fragment_source: &str,
        kind: LayoutKind,
    ) -> Result<Self, ShaderError> {
        let vertex_ir = validate_wgsl(vertex_source, "vertex")?;
        let fragment_ir = validate_wgsl(fragment_source, "fragment")?;
        let interface = ShaderInterface::reflect(&vertex_ir, &fragment_ir)?;

        let device = &context.device;
        let vertex_module =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Vertex Module"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(vertex_ir)),
            });
        let fragment_module =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Fragment Module"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(fragment_ir)),
            });

        let uniform_layout = (interface.uniform_block_size() > 0).then(
            || {
                device.create_bind_group_layout(
                    &wgpu::BindGroupLayoutDescriptor {
                        label: Some("Program Uniform Layout"),
                        entries: &[wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX
                                | wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        }],
                    },
                )
            },
        );

        let (uniform_buffer, uniform_bind_group) = match &uniform_layout {
            Some(layout) => {
                // Zero-initialized; the renderer pushes real matrices
                // right after construction.
                let size =
                    u64::from((interface.uniform_block_size() + 15) & !15);
                let buffer =
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Program Uniform Buffer"),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM
                            | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                let bind_group =
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Program Uniform Bind Group"),
                        layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        }],
                    });
                (Some(buffer), Some(bind_group))
            }
            None => (None, None),
        };

        let texture_layout = interface.has_texture().then(|| {
            device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("Program Texture Layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float {
                                    filterable: true,
                                },
                                view_dimension:
                                    wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(
                                wgpu::SamplerBindingType::Filtering,
                            ),
                            count: None,
                        },
                    ],
                },
            )
        });

        // Group 0 must exist when group 1 does, even if the program
        // declares no uniforms.
        let empty_layout = (uniform_layout.is_none()
            && texture_layout.is_some())
        .then(|| {
            device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("Empty Group 0 Layout"),
                    entries: &[],
                },
            )
        });

        let mut group_layouts: Vec<&wgpu::BindGroupLayout> = Vec::new();
        if let Some(layout) = &uniform_layout {
            group_layouts.push(layout);
        } else if let Some(layout) = &empty_layout {
            group_layouts.push(layout);
        }
        if let Some(layout) = &texture_layout {
            group_layouts.push(layout);
        }

        let pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("Program Pipeline Layout"),
                bind_group_layouts: &group_layouts,
                push_constant_ranges: &[],
            },
        );

        let buffers = vertex_buffer_layouts(kind);
        let pipelines = Primitive::ALL
            .iter()
            .map(|&primitive| {
                Self::create_pipeline(
                    context,
                    &vertex_module,
                    &fragment_module,
                    &pipeline_layout,
                    &buffers,
                    primitive,
                )
            })
            .collect();

        Ok(Self {
            interface,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            pipelines,
        })
    }

    fn create_pipeline(
        context: &RenderContext,
        vertex_module: &wgpu::ShaderModule,
        fragment_module: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        buffers: &[wgpu::VertexBufferLayout<'_>],
        primitive: Primitive,
    ) -> wgpu::RenderPipeline {
        context.device.create_render_pipeline(
            &wgpu::RenderPipelineDescriptor {
                label: Some("Mesh Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: vertex_module,
                    entry_point: Some("vs_main"),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment_module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: primitive.topology(),
                    strip_index_format: primitive.strip_index_format(),
                    // The original surface is viewed from both sides
                    // (open mantle, caps); no face culling.
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        )
    }

    /// The reflected program interface.
    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    /// Bind this program's uniform state on the pass. Required before
    /// any draw through this program; [`Renderer::render`] calls it
    /// for every draw request.
    ///
    /// [`Renderer::render`]: crate::renderer::Renderer::render
    pub fn activate<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if let Some(bind_group) = &self.uniform_bind_group {
            pass.set_bind_group(0, bind_group, &[]);
        }
    }

    /// The pipeline drawing the given primitive kind.
    pub fn pipeline(&self, primitive: Primitive) -> &wgpu::RenderPipeline {
        &self.pipelines[primitive.index()]
    }

    /// Layout for the program's texture bind group (group 1), if the
    /// program samples a texture.
    pub fn texture_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.texture_layout.as_ref()
    }

    /// Set an `i32` uniform by name. Unknown names are a silent no-op.
    pub fn set_int(&self, queue: &wgpu::Queue, name: &str, value: i32) {
        self.write_uniform(queue, name, bytemuck::bytes_of(&value));
    }

    /// Set an `f32` uniform by name. Unknown names are a silent no-op.
    pub fn set_float(&self, queue: &wgpu::Queue, name: &str, value: f32) {
        self.write_uniform(queue, name, bytemuck::bytes_of(&value));
    }

    /// Set a `vec3<f32>` uniform by name. Unknown names are a silent
    /// no-op.
    pub fn set_vec3(&self, queue: &wgpu::Queue, name: &str, value: Vec3) {
        self.write_uniform(
            queue,
            name,
            bytemuck::cast_slice(&value.to_array()),
        );
    }

    /// Set a `mat4x4<f32>` uniform by name. Unknown names are a
    /// silent no-op.
    pub fn set_mat4(&self, queue: &wgpu::Queue, name: &str, value: Mat4) {
        self.write_uniform(
            queue,
            name,
            bytemuck::cast_slice(&value.to_cols_array()),
        );
    }

    fn write_uniform(&self, queue: &wgpu::Queue, name: &str, bytes: &[u8]) {
        let Some(member) = self.interface.uniforms.get(name) else {
            // Unused uniforms are common across shader variants; not
            // an error.
            log::trace!("uniform {name:?} not declared by this program");
            return;
        };
        if member.size as usize != bytes.len() {
            log::warn!(
                "uniform {name:?} is {} bytes, got {}",
                member.size,
                bytes.len()
            );
            return;
        }
        let Some(buffer) = &self.uniform_buffer else {
            return;
        };
        queue.write_buffer(buffer, u64::from(member.offset), bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PC_VERT: &str =
        include_str!("../../assets/shaders/position_color.vert.wgsl");
    const PC_FRAG: &str =
        include_str!("../../assets/shaders/position_color.frag.wgsl");
    const PT_VERT: &str =
        include_str!("../../assets/shaders/position_texture.vert.wgsl");
    const PT_FRAG: &str =
        include_str!("../../assets/shaders/position_texture.frag.wgsl");
    const PCT_VERT: &str = include_str!(
        "../../assets/shaders/position_color_texture.vert.wgsl"
    );
    const PCT_FRAG: &str = include_str!(
        "../../assets/shaders/position_color_texture.frag.wgsl"
    );
    const UI_VERT: &str = include_str!("../../assets/shaders/ui.vert.wgsl");
    const UI_FRAG: &str = include_str!("../../assets/shaders/ui.frag.wgsl");

    fn reflect(vert: &str, frag: &str) -> ShaderInterface {
        let vertex = validate_wgsl(vert, "vertex").unwrap();
        let fragment = validate_wgsl(frag, "fragment").unwrap();
        ShaderInterface::reflect(&vertex, &fragment).unwrap()
    }

    #[test]
    fn all_builtin_shader_pairs_validate_and_link() {
        let _ = reflect(PC_VERT, PC_FRAG);
        let _ = reflect(PT_VERT, PT_FRAG);
        let _ = reflect(PCT_VERT, PCT_FRAG);
        let _ = reflect(UI_VERT, UI_FRAG);
    }

    #[test]
    fn projected_programs_expose_the_three_matrices() {
        for (vert, frag) in
            [(PC_VERT, PC_FRAG), (PT_VERT, PT_FRAG), (PCT_VERT, PCT_FRAG)]
        {
            let interface = reflect(vert, frag);
            assert_eq!(interface.uniform_offset("model"), Some(0));
            assert_eq!(interface.uniform_offset("view"), Some(64));
            assert_eq!(interface.uniform_offset("projection"), Some(128));
            assert_eq!(interface.uniform_block_size(), 192);
        }
    }

    #[test]
    fn ui_program_has_no_matrix_uniforms() {
        let interface = reflect(UI_VERT, UI_FRAG);
        assert_eq!(interface.uniform_offset("model"), None);
        assert_eq!(interface.uniform_offset("view"), None);
        assert_eq!(interface.uniform_offset("projection"), None);
        assert_eq!(interface.uniform_block_size(), 0);
    }

    #[test]
    fn texture_detection_matches_the_program_kind() {
        assert!(!reflect(PC_VERT, PC_FRAG).has_texture());
        assert!(reflect(PT_VERT, PT_FRAG).has_texture());
        assert!(reflect(PCT_VERT, PCT_FRAG).has_texture());
        assert!(!reflect(UI_VERT, UI_FRAG).has_texture());
    }

    #[test]
    fn broken_wgsl_yields_a_compile_error_with_a_log() {
        let err = validate_wgsl("fn vs_main( -> { }", "vertex").unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, "vertex");
                assert!(!log.is_empty());
            }
            ShaderError::Link(_) => panic!("expected a compile error"),
        }
    }

    #[test]
    fn missing_entry_point_yields_a_link_error() {
        let vertex = validate_wgsl(
            "@vertex fn other_main() -> @builtin(position) vec4<f32> {\n\
             return vec4<f32>(0.0);\n}",
            "vertex",
        )
        .unwrap();
        let fragment = validate_wgsl(PC_FRAG, "fragment").unwrap();
        assert!(matches!(
            ShaderInterface::reflect(&vertex, &fragment),
            Err(ShaderError::Link(_)),
        ));
    }

    #[test]
    fn unmatched_fragment_input_yields_a_link_error() {
        // UI vertex stage outputs only @location(0); a fragment stage
        // consuming @location(3) cannot link against it.
        let vertex = validate_wgsl(UI_VERT, "vertex").unwrap();
        let fragment = validate_wgsl(
            "@fragment fn fs_main(@location(3) uv: vec2<f32>) -> \
             @location(0) vec4<f32> {\nreturn vec4<f32>(uv, 0.0, 1.0);\n}",
            "fragment",
        )
        .unwrap();
        assert!(matches!(
            ShaderInterface::reflect(&vertex, &fragment),
            Err(ShaderError::Link(_)),
        ));
    }
}
