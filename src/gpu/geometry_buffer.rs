//! Packed vertex/index buffer with in-place partial attribute updates.
//!
//! One GPU buffer holds every present attribute array contiguously
//! (positions first, then colors, then texture coordinates). Each
//! region binds as its own vertex-buffer slot slicing the shared
//! buffer, and disjoint primitive groups (caps, mantle strips,
//! outlines) draw through sub-ranges of one shared index buffer.
//!
//! The vertex count is fixed at construction: positions and colors may
//! be rewritten in place any number of times at the same byte region,
//! but a count mismatch is rejected before any GPU state changes.

use std::fmt;

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::gpu::render_context::RenderContext;

const POSITION_SIZE: u64 = 12; // [f32; 3]
const COLOR_SIZE: u64 = 16; // [f32; 4]
const TEX_COORD_SIZE: u64 = 8; // [f32; 2]

/// Vertex/index shape invariant violations.
#[derive(Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// An optional attribute array's length differs from the position
    /// count at construction.
    AttributeCountMismatch {
        /// Which attribute array mismatched.
        attribute: &'static str,
        /// The position count.
        expected: usize,
        /// The offending array's length.
        actual: usize,
    },
    /// An index references a vertex past the end of the arrays.
    IndexOutOfRange {
        /// The offending index value.
        index: u32,
        /// The vertex count it must stay below.
        vertex_count: usize,
    },
    /// An update supplied a different vertex count than construction.
    VertexCountChanged {
        /// The immutable construction-time count.
        expected: usize,
        /// The update's count.
        actual: usize,
    },
    /// An update targeted an attribute the buffer was built without.
    MissingAttribute(&'static str),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeCountMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "{attribute} array has {actual} entries, expected {expected}"
            ),
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "index {index} out of range for {vertex_count} vertices"
            ),
            Self::VertexCountChanged { expected, actual } => write!(
                f,
                "update has {actual} vertices, buffer was built with \
                 {expected}"
            ),
            Self::MissingAttribute(attribute) => {
                write!(f, "buffer has no {attribute} attribute")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Which optional attributes a mesh carries, decided once at
/// construction. Each variant has a fixed region/stride table - no
/// runtime "is the attribute present" branching past this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Positions + per-vertex RGBA colors.
    PositionColor,
    /// Positions + texture coordinates.
    PositionTexture,
    /// Positions + colors + texture coordinates.
    PositionColorTexture,
}

impl LayoutKind {
    /// Whether meshes of this layout carry a color region.
    pub fn has_colors(self) -> bool {
        matches!(self, Self::PositionColor | Self::PositionColorTexture)
    }

    /// Whether meshes of this layout carry a texture-coordinate
    /// region.
    pub fn has_tex_coords(self) -> bool {
        matches!(self, Self::PositionTexture | Self::PositionColorTexture)
    }
}

/// Indexed primitive kinds. GL's `TRIANGLE_FAN` and `LINE_LOOP` have
/// no wgpu equivalent: fans are emitted as triangle lists at
/// generation time, and loops close through a duplicate vertex drawn
/// as a line strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Isolated points.
    Points,
    /// Independent line segments (pairs of indices).
    Lines,
    /// Connected line strip.
    LineStrip,
    /// Independent triangles (index triples).
    Triangles,
    /// Triangle strip.
    TriangleStrip,
}

impl Primitive {
    /// Every primitive kind, in pipeline-table order.
    pub const ALL: [Self; 5] = [
        Self::Points,
        Self::Lines,
        Self::LineStrip,
        Self::Triangles,
        Self::TriangleStrip,
    ];

    /// Index into per-primitive pipeline tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::LineStrip => 2,
            Self::Triangles => 3,
            Self::TriangleStrip => 4,
        }
    }

    pub(crate) fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::Points => wgpu::PrimitiveTopology::PointList,
            Self::Lines => wgpu::PrimitiveTopology::LineList,
            Self::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Self::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Strip topologies must declare their index format in the
    /// pipeline.
    pub(crate) fn strip_index_format(self) -> Option<wgpu::IndexFormat> {
        match self {
            Self::LineStrip | Self::TriangleStrip => {
                Some(wgpu::IndexFormat::Uint32)
            }
            _ => None,
        }
    }
}

/// A sub-range of a shared index buffer plus the primitive it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    /// Primitive kind (selects the pipeline).
    pub primitive: Primitive,
    /// First index within the shared index buffer.
    pub first_index: u32,
    /// Number of indices to draw.
    pub index_count: u32,
}

/// CPU-side mesh arrays. Positions and indices are always present;
/// colors and texture coordinates are optional but length-checked.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Optional per-vertex RGBA colors.
    pub colors: Option<Vec<[f32; 4]>>,
    /// Optional per-vertex texture coordinates.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Index list (immutable after construction).
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Position + color mesh.
    pub fn with_colors(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        colors: Vec<[f32; 4]>,
    ) -> Self {
        Self {
            positions,
            colors: Some(colors),
            tex_coords: None,
            indices,
        }
    }

    /// Position + texture-coordinate mesh.
    pub fn with_tex_coords(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        tex_coords: Vec<[f32; 2]>,
    ) -> Self {
        Self {
            positions,
            colors: None,
            tex_coords: Some(tex_coords),
            indices,
        }
    }

    /// Check the shape invariants: equal attribute lengths, every
    /// index in range, and at least one optional attribute present.
    pub fn validate(&self) -> Result<LayoutKind, GeometryError> {
        let count = self.positions.len();
        if let Some(colors) = &self.colors {
            if colors.len() != count {
                return Err(GeometryError::AttributeCountMismatch {
                    attribute: "color",
                    expected: count,
                    actual: colors.len(),
                });
            }
        }
        if let Some(tex_coords) = &self.tex_coords {
            if tex_coords.len() != count {
                return Err(GeometryError::AttributeCountMismatch {
                    attribute: "texture coordinate",
                    expected: count,
                    actual: tex_coords.len(),
                });
            }
        }
        if let Some(&bad) =
            self.indices.iter().find(|&&i| i as usize >= count)
        {
            return Err(GeometryError::IndexOutOfRange {
                index: bad,
                vertex_count: count,
            });
        }
        match (&self.colors, &self.tex_coords) {
            (Some(_), Some(_)) => Ok(LayoutKind::PositionColorTexture),
            (Some(_), None) => Ok(LayoutKind::PositionColor),
            (None, Some(_)) => Ok(LayoutKind::PositionTexture),
            (None, None) => Err(GeometryError::MissingAttribute(
                "color or texture coordinate",
            )),
        }
    }
}

/// Byte region of one attribute inside the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub offset: u64,
    pub size: u64,
}

/// Pure packed-buffer layout: per-attribute byte regions computed once
/// from the vertex count. Positions first, then colors, then texture
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLayout {
    kind: LayoutKind,
    vertex_count: usize,
    position_region: Region,
    color_region: Option<Region>,
    tex_coord_region: Option<Region>,
}

impl MeshLayout {
    /// Compute the packed regions for `vertex_count` vertices of the
    /// given layout kind.
    pub fn new(kind: LayoutKind, vertex_count: usize) -> Self {
        let count = vertex_count as u64;
        let position_region = Region {
            offset: 0,
            size: count * POSITION_SIZE,
        };
        let mut cursor = position_region.size;

        let color_region = kind.has_colors().then(|| {
            let region = Region {
                offset: cursor,
                size: count * COLOR_SIZE,
            };
            cursor += region.size;
            region
        });

        let tex_coord_region = kind.has_tex_coords().then(|| Region {
            offset: cursor,
            size: count * TEX_COORD_SIZE,
        });

        Self {
            kind,
            vertex_count,
            position_region,
            color_region,
            tex_coord_region,
        }
    }

    /// The layout kind.
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// The immutable vertex count.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Total packed-buffer size in bytes.
    pub fn total_size(&self) -> u64 {
        self.position_region.size
            + self.color_region.map_or(0, |r| r.size)
            + self.tex_coord_region.map_or(0, |r| r.size)
    }

    pub(crate) fn position_region(&self) -> Region {
        self.position_region
    }

    pub(crate) fn color_region(&self) -> Option<Region> {
        self.color_region
    }

    pub(crate) fn tex_coord_region(&self) -> Option<Region> {
        self.tex_coord_region
    }

    /// Gate for in-place updates: the new count must equal the
    /// construction count, never truncating or padding.
    pub fn check_vertex_count(
        &self,
        actual: usize,
    ) -> Result<(), GeometryError> {
        if actual == self.vertex_count {
            Ok(())
        } else {
            Err(GeometryError::VertexCountChanged {
                expected: self.vertex_count,
                actual,
            })
        }
    }
}

fn positions_as_bytes(positions: &[Vec3]) -> Vec<u8> {
    let raw: Vec<[f32; 3]> =
        positions.iter().map(|p| p.to_array()).collect();
    bytemuck::cast_slice(&raw).to_vec()
}

/// A packed GPU vertex buffer, its index buffer, and their layout.
///
/// Created once with a fixed vertex count and index set; positions and
/// colors may be rewritten in place afterwards. GPU resources release
/// with the owning value.
pub struct GeometryBuffer {
    layout: MeshLayout,
    index_count: u32,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    /// CPU position copy, kept for [`move_by`](Self::move_by).
    positions: Vec<Vec3>,
}

impl GeometryBuffer {
    /// Validate `data`, pack every present attribute region into one
    /// buffer, and upload everything once.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if attribute lengths mismatch, an
    /// index is out of range, or no optional attribute is present.
    pub fn new(
        context: &RenderContext,
        data: MeshData,
    ) -> Result<Self, GeometryError> {
        let kind = data.validate()?;
        let layout = MeshLayout::new(kind, data.positions.len());

        let mut packed = Vec::with_capacity(layout.total_size() as usize);
        packed.extend_from_slice(&positions_as_bytes(&data.positions));
        if let Some(colors) = &data.colors {
            packed.extend_from_slice(bytemuck::cast_slice(colors));
        }
        if let Some(tex_coords) = &data.tex_coords {
            packed.extend_from_slice(bytemuck::cast_slice(tex_coords));
        }

        let vertex_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Vertex Buffer"),
                contents: &packed,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::COPY_DST,
            },
        );
        let index_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Geometry Index Buffer"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        Ok(Self {
            layout,
            index_count: data.indices.len() as u32,
            vertex_buffer,
            index_buffer,
            positions: data.positions,
        })
    }

    /// The packed-region layout.
    pub fn layout(&self) -> &MeshLayout {
        &self.layout
    }

    /// The immutable vertex count.
    pub fn vertex_count(&self) -> usize {
        self.layout.vertex_count()
    }

    /// Total index count of the shared index buffer.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The CPU copy of the current positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Overwrite the position region in place.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::VertexCountChanged`] (leaving GPU
    /// state untouched) if the count differs from construction.
    pub fn update_positions(
        &mut self,
        queue: &wgpu::Queue,
        positions: &[Vec3],
    ) -> Result<(), GeometryError> {
        self.layout.check_vertex_count(positions.len())?;
        queue.write_buffer(
            &self.vertex_buffer,
            self.layout.position_region().offset,
            &positions_as_bytes(positions),
        );
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        Ok(())
    }

    /// Overwrite the color region in place.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the buffer has no color region or
    /// the count differs from construction.
    pub fn update_colors(
        &self,
        queue: &wgpu::Queue,
        colors: &[[f32; 4]],
    ) -> Result<(), GeometryError> {
        let region = self
            .layout
            .color_region()
            .ok_or(GeometryError::MissingAttribute("color"))?;
        self.layout.check_vertex_count(colors.len())?;
        queue.write_buffer(
            &self.vertex_buffer,
            region.offset,
            bytemuck::cast_slice(colors),
        );
        Ok(())
    }

    /// Translate every stored position by `delta` and re-upload the
    /// position region.
    pub fn move_by(&mut self, queue: &wgpu::Queue, delta: Vec3) {
        for position in &mut self.positions {
            *position += delta;
        }
        queue.write_buffer(
            &self.vertex_buffer,
            self.layout.position_region().offset,
            &positions_as_bytes(&self.positions),
        );
    }

    /// Issue an indexed draw over `range`. The caller must have set
    /// the pipeline for `range.primitive` (and activated the owning
    /// program) beforehand.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, range: DrawRange) {
        let position = self.layout.position_region();
        pass.set_vertex_buffer(
            0,
            self.vertex_buffer
                .slice(position.offset..position.offset + position.size),
        );
        let mut slot = 1;
        if let Some(region) = self.layout.color_region() {
            pass.set_vertex_buffer(
                slot,
                self.vertex_buffer
                    .slice(region.offset..region.offset + region.size),
            );
            slot += 1;
        }
        if let Some(region) = self.layout.tex_coord_region() {
            pass.set_vertex_buffer(
                slot,
                self.vertex_buffer
                    .slice(region.offset..region.offset + region.size),
            );
        }
        pass.set_index_buffer(
            self.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(
            range.first_index..range.first_index + range.index_count,
            0,
            0..1,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_positions() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn layout_packs_positions_then_colors_then_tex_coords() {
        let layout = MeshLayout::new(LayoutKind::PositionColorTexture, 4);
        assert_eq!(layout.position_region().offset, 0);
        assert_eq!(layout.position_region().size, 48);
        let colors = layout.color_region().unwrap();
        assert_eq!(colors.offset, 48);
        assert_eq!(colors.size, 64);
        let tex = layout.tex_coord_region().unwrap();
        assert_eq!(tex.offset, 112);
        assert_eq!(tex.size, 32);
        assert_eq!(layout.total_size(), 144);
    }

    #[test]
    fn layout_without_colors_packs_tex_coords_after_positions() {
        let layout = MeshLayout::new(LayoutKind::PositionTexture, 3);
        assert!(layout.color_region().is_none());
        assert_eq!(layout.tex_coord_region().unwrap().offset, 36);
        assert_eq!(layout.total_size(), 36 + 24);
    }

    #[test]
    fn update_with_a_different_vertex_count_is_rejected() {
        let layout = MeshLayout::new(LayoutKind::PositionColor, 4);
        assert_eq!(
            layout.check_vertex_count(3),
            Err(GeometryError::VertexCountChanged {
                expected: 4,
                actual: 3,
            }),
        );
        assert_eq!(layout.check_vertex_count(4), Ok(()));
    }

    #[test]
    fn mismatched_attribute_lengths_are_rejected() {
        let data = MeshData::with_colors(
            quad_positions(),
            vec![0, 1, 2],
            vec![[1.0, 0.0, 0.0, 1.0]; 3],
        );
        assert_eq!(
            data.validate(),
            Err(GeometryError::AttributeCountMismatch {
                attribute: "color",
                expected: 4,
                actual: 3,
            }),
        );
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let data = MeshData::with_colors(
            quad_positions(),
            vec![0, 1, 4],
            vec![[0.0; 4]; 4],
        );
        assert_eq!(
            data.validate(),
            Err(GeometryError::IndexOutOfRange {
                index: 4,
                vertex_count: 4,
            }),
        );
    }

    #[test]
    fn validate_reports_the_layout_kind() {
        let pc = MeshData::with_colors(
            quad_positions(),
            vec![0, 1, 2],
            vec![[0.0; 4]; 4],
        );
        assert_eq!(pc.validate(), Ok(LayoutKind::PositionColor));

        let pt = MeshData::with_tex_coords(
            quad_positions(),
            vec![0, 1, 2],
            vec![[0.0; 2]; 4],
        );
        assert_eq!(pt.validate(), Ok(LayoutKind::PositionTexture));

        let bare = MeshData {
            positions: quad_positions(),
            colors: None,
            tex_coords: None,
            indices: vec![0],
        };
        assert!(matches!(
            bare.validate(),
            Err(GeometryError::MissingAttribute(_)),
        ));
    }
}
