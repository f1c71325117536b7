//! Screen-space bar-chart layout: axes, ticks, and bar quads in
//! normalized device coordinates.
//!
//! The whole chart is one vertex/index set so it can live in a single
//! `GeometryBuffer` with two disjoint draw ranges: a line list (axes +
//! ticks) and a triangle list (bars). Bar-height updates rewrite the
//! full position array at the construction-time vertex count.

use glam::{Vec2, Vec3};

use crate::gpu::geometry_buffer::{DrawRange, Primitive};

/// Tick count on the value (y) axis.
const Y_TICKS: usize = 5;
/// Tick mark length in NDC.
const TICK_LENGTH: f32 = 0.05;
/// Bar width in NDC.
const BAR_WIDTH: f32 = 0.05;

/// Pure bar-chart layout in NDC.
#[derive(Debug, Clone)]
pub struct BarChartLayout {
    origin: Vec2,
    x_length: f32,
    y_length: f32,
    bars: usize,
    max_value: f32,
}

impl BarChartLayout {
    /// Chart with its corner at `origin`, axis lengths in NDC, one
    /// bar per x-axis tick, and values scaled against `max_value`.
    pub fn new(
        origin: Vec2,
        x_length: f32,
        y_length: f32,
        bars: usize,
        max_value: f32,
    ) -> Self {
        debug_assert!(bars > 0);
        debug_assert!(max_value > 0.0);
        Self {
            origin,
            x_length,
            y_length,
            bars,
            max_value,
        }
    }

    /// Number of bars.
    pub fn bars(&self) -> usize {
        self.bars
    }

    /// The full-scale sensor value.
    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    /// Bar anchor points: one per x-axis tick, the first one a full
    /// tick step past the origin.
    pub fn x_tick_origins(&self) -> Vec<Vec2> {
        let step = self.x_length / self.bars as f32;
        (1..=self.bars)
            .map(|i| self.origin + Vec2::new(step * i as f32, 0.0))
            .collect()
    }

    fn y_tick_origins(&self) -> Vec<Vec2> {
        let step = self.y_length / Y_TICKS as f32;
        (1..=Y_TICKS)
            .map(|i| self.origin + Vec2::new(0.0, step * i as f32))
            .collect()
    }

    /// Total vertex count: axes + ticks + bar quads.
    pub fn vertex_count(&self) -> usize {
        4 + 2 * (self.bars + Y_TICKS) + 4 * self.bars
    }

    /// Every chart vertex for the given bar heights (NDC units,
    /// typically from [`scaled_heights`](Self::scaled_heights)).
    /// Missing heights draw as zero-height bars.
    pub fn positions(&self, heights: &[f32]) -> Vec<Vec3> {
        let ndc = |p: Vec2| Vec3::new(p.x, p.y, 0.0);
        let mut positions = Vec::with_capacity(self.vertex_count());

        // Axes.
        positions.push(ndc(self.origin));
        positions.push(ndc(self.origin + Vec2::new(self.x_length, 0.0)));
        positions.push(ndc(self.origin));
        positions.push(ndc(self.origin + Vec2::new(0.0, self.y_length)));

        // Vertical ticks along x, horizontal ticks along y.
        let half = TICK_LENGTH / 2.0;
        for tick in self.x_tick_origins() {
            positions.push(ndc(tick + Vec2::new(0.0, half)));
            positions.push(ndc(tick - Vec2::new(0.0, half)));
        }
        for tick in self.y_tick_origins() {
            positions.push(ndc(tick + Vec2::new(half, 0.0)));
            positions.push(ndc(tick - Vec2::new(half, 0.0)));
        }

        // Bar quads, anchored at the x ticks.
        let half_width = BAR_WIDTH / 2.0;
        for (i, anchor) in self.x_tick_origins().iter().enumerate() {
            let height = heights.get(i).copied().unwrap_or(0.0);
            positions.push(ndc(*anchor - Vec2::new(half_width, 0.0)));
            positions.push(ndc(*anchor + Vec2::new(half_width, 0.0)));
            positions
                .push(ndc(*anchor + Vec2::new(-half_width, height)));
            positions.push(ndc(*anchor + Vec2::new(half_width, height)));
        }

        positions
    }

    /// Per-vertex colors: axes and ticks in `axis_color`, bars in
    /// `bar_color`.
    pub fn colors(
        &self,
        axis_color: [f32; 4],
        bar_color: [f32; 4],
    ) -> Vec<[f32; 4]> {
        let line_vertices = 4 + 2 * (self.bars + Y_TICKS);
        let mut colors = vec![axis_color; line_vertices];
        colors.extend(std::iter::repeat_n(bar_color, 4 * self.bars));
        colors
    }

    /// The shared index list: line-list indices for axes and ticks,
    /// then two triangles per bar.
    pub fn indices(&self) -> Vec<u32> {
        let line_vertices = (4 + 2 * (self.bars + Y_TICKS)) as u32;
        let mut indices: Vec<u32> = (0..line_vertices).collect();
        for bar in 0..self.bars as u32 {
            let base = line_vertices + 4 * bar;
            indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base + 3,
                base + 2,
                base + 1,
            ]);
        }
        indices
    }

    /// Line-list range covering axes and ticks.
    pub fn line_range(&self) -> DrawRange {
        DrawRange {
            primitive: Primitive::Lines,
            first_index: 0,
            index_count: (4 + 2 * (self.bars + Y_TICKS)) as u32,
        }
    }

    /// Triangle-list range covering the bars.
    pub fn bar_range(&self) -> DrawRange {
        DrawRange {
            primitive: Primitive::Triangles,
            first_index: self.line_range().index_count,
            index_count: 6 * self.bars as u32,
        }
    }

    /// Bar heights in NDC for raw sensor values:
    /// `y_length * value / max_value`.
    pub fn scaled_heights(&self, values: &[f32]) -> Vec<f32> {
        values
            .iter()
            .map(|value| self.y_length * (value / self.max_value))
            .collect()
    }

    /// Normalize raw sensor values to `[0, 1]` against `max_value`
    /// (the form the soft-robot coloring consumes).
    pub fn normalized(&self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|value| value / self.max_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> BarChartLayout {
        BarChartLayout::new(Vec2::new(-0.9, 0.4), 0.5, 0.5, 8, 1023.0)
    }

    #[test]
    fn vertex_and_index_counts_are_consistent() {
        let chart = chart();
        let positions = chart.positions(&[]);
        assert_eq!(positions.len(), chart.vertex_count());
        assert_eq!(
            chart.colors([0.0; 4], [1.0; 4]).len(),
            positions.len(),
        );

        let indices = chart.indices();
        assert_eq!(
            indices.len() as u32,
            chart.line_range().index_count + chart.bar_range().index_count,
        );
        let max_index = *indices.iter().max().unwrap();
        assert!((max_index as usize) < positions.len());
    }

    #[test]
    fn first_x_tick_sits_one_step_past_the_origin() {
        let chart = chart();
        let ticks = chart.x_tick_origins();
        assert_eq!(ticks.len(), 8);
        let step = 0.5 / 8.0;
        assert!((ticks[0].x - (-0.9 + step)).abs() < 1e-6);
        assert!((ticks[7].x - (-0.4)).abs() < 1e-6);
    }

    #[test]
    fn bar_heights_scale_against_max_value() {
        let chart = chart();
        let heights = chart.scaled_heights(&[1023.0, 511.5, 0.0]);
        assert!((heights[0] - 0.5).abs() < 1e-6);
        assert!((heights[1] - 0.25).abs() < 1e-6);
        assert_eq!(heights[2], 0.0);
    }

    #[test]
    fn bar_top_vertices_sit_at_the_scaled_height() {
        let chart = chart();
        let heights = chart.scaled_heights(&[1023.0; 8]);
        let positions = chart.positions(&heights);
        let first_bar = 4 + 2 * (8 + 5);
        // Third quad vertex is the upper-left corner.
        let top = positions[first_bar + 2];
        assert!((top.y - (0.4 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn normalization_divides_by_max_value() {
        let chart = chart();
        let normalized = chart.normalized(&[0.0, 511.5, 1023.0]);
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 0.5).abs() < 1e-6);
        assert!((normalized[2] - 1.0).abs() < 1e-6);
    }
}
