//! The screen-space bar-chart drawable.

use glam::Vec2;

use crate::error::SomavizError;
use crate::geometry::bar::BarChartLayout;
use crate::gpu::geometry_buffer::{GeometryBuffer, GeometryError, MeshData};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_program::ShaderProgram;
use crate::options::{PlotOptions, SensorOptions};
use crate::renderer::Drawable;

/// Bar chart over one `GeometryBuffer`: axes and ticks as a line-list
/// range, bars as a triangle-list range. Drawn with the UI mesh type,
/// so its NDC geometry ignores the camera entirely.
pub struct BarPlot {
    layout: BarChartLayout,
    mesh: GeometryBuffer,
    axis_color: [f32; 4],
    bar_color: [f32; 4],
}

impl BarPlot {
    /// Build the chart with all bars at zero height.
    ///
    /// # Errors
    ///
    /// Returns [`SomavizError::Geometry`] if the generated arrays
    /// violate the shape invariants (a bug in layout, not a runtime
    /// condition).
    pub fn new(
        context: &RenderContext,
        plot: &PlotOptions,
        sensor: &SensorOptions,
    ) -> Result<Self, SomavizError> {
        let layout = BarChartLayout::new(
            Vec2::from_array(plot.origin),
            plot.x_length,
            plot.y_length,
            sensor.count,
            sensor.max_value,
        );

        let mesh = GeometryBuffer::new(
            context,
            MeshData::with_colors(
                layout.positions(&[]),
                layout.indices(),
                layout.colors(plot.axis_color, plot.bar_color),
            ),
        )?;

        Ok(Self {
            layout,
            mesh,
            axis_color: plot.axis_color,
            bar_color: plot.bar_color,
        })
    }

    /// The pure chart layout.
    pub fn layout(&self) -> &BarChartLayout {
        &self.layout
    }

    /// Scale raw sensor values to bar heights and rewrite the position
    /// region (the axes and ticks are rewritten unchanged - the vertex
    /// count never varies).
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] only if vertex counts changed, which
    /// the layout makes impossible.
    pub fn update_heights(
        &mut self,
        queue: &wgpu::Queue,
        values: &[f32],
    ) -> Result<(), GeometryError> {
        let heights = self.layout.scaled_heights(values);
        self.mesh
            .update_positions(queue, &self.layout.positions(&heights))
    }

    /// Normalize raw values to `[0, 1]` for the soft-robot coloring.
    pub fn normalized(&self, values: &[f32]) -> Vec<f32> {
        self.layout.normalized(values)
    }

    /// The chart's color scheme `(axis, bar)`.
    pub fn colors(&self) -> ([f32; 4], [f32; 4]) {
        (self.axis_color, self.bar_color)
    }
}

impl Drawable for BarPlot {
    fn draw<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        program: &'a ShaderProgram,
    ) {
        let lines = self.layout.line_range();
        pass.set_pipeline(program.pipeline(lines.primitive));
        self.mesh.draw(pass, lines);

        let bars = self.layout.bar_range();
        pass.set_pipeline(program.pipeline(bars.primitive));
        self.mesh.draw(pass, bars);
    }
}
