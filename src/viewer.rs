//! Winit-driven viewer: owns the window, the render context, and the
//! per-frame loop that feeds the core.
//!
//! Per frame: build an [`InputSnapshot`] from accumulated events,
//! apply it to the camera, broadcast the view matrix, pop the latest
//! sensor snapshot (bar heights + skin colors), advance the ping-pong
//! bend parameter, rewrite the skin, and draw.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::Camera;
use crate::error::SomavizError;
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture::{DepthTexture, ImageTexture};
use crate::input::{InputSnapshot, MovementIntents};
use crate::options::Options;
use crate::renderer::{MeshType, Renderer};
use crate::scene::{BarPlot, Label, SoftRobot};
use crate::sensor::{Acquisition, LatestSlot, SensorSource};
use crate::util::{BendCycle, FrameTiming};

/// Run the viewer until the window closes.
///
/// Spawns the acquisition thread for `source`, opens the window, and
/// drives the render loop.
///
/// # Errors
///
/// Returns [`SomavizError`] if the acquisition thread or the event
/// loop cannot be created; GPU/scene setup failures inside the loop
/// are logged and end the loop.
pub fn run(
    options: Options,
    source: Box<dyn SensorSource>,
) -> Result<(), SomavizError> {
    let slot = Arc::new(LatestSlot::new());
    let acquisition = Acquisition::start(
        source,
        Arc::clone(&slot),
        Duration::from_millis(options.sensor.interval_ms),
    )?;

    let event_loop = EventLoop::new()
        .map_err(|e| SomavizError::Viewer(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        options,
        slot,
        window: None,
        scene: None,
        movement: MovementIntents::default(),
        look_delta: Vec2::ZERO,
        last_cursor: None,
        last_frame: Instant::now(),
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| SomavizError::Viewer(e.to_string()))?;

    acquisition.stop();
    Ok(())
}

/// Everything the frame loop owns once the window exists.
struct SceneState {
    context: RenderContext,
    renderer: Renderer,
    camera: Camera,
    robot: SoftRobot,
    bar_plot: BarPlot,
    table: Label,
    depth: DepthTexture,
    bend: BendCycle,
    timing: FrameTiming,
}

impl SceneState {
    fn new(
        window: Arc<Window>,
        options: &Options,
    ) -> Result<Self, SomavizError> {
        let size = window.inner_size();
        let context = pollster::block_on(RenderContext::new(
            window,
            (size.width.max(1), size.height.max(1)),
        ))?;

        let renderer = Renderer::new(
            &context,
            options.camera.fov_degrees,
            options.camera.z_near,
            options.camera.z_far,
        )?;

        let camera = Camera::new(
            Vec3::from_array(options.camera.position),
            options.camera.movement_speed,
            options.camera.look_sensitivity,
        );
        renderer.broadcast_view(&context.queue, camera.view_matrix());

        let robot = SoftRobot::new(&context, &options.robot)?;
        let bar_plot =
            BarPlot::new(&context, &options.plot, &options.sensor)?;

        // Checkerboard "table" under the robot, laid flat on the X/Z
        // plane and nudged down to keep the robot's bottom cap out of
        // depth fighting.
        let texture =
            ImageTexture::from_rgba8(&context, 256, 256, &checker_pixels());
        let mut table = Label::new(
            &context,
            renderer.program(MeshType::PositionTexture),
            2.0,
            2.0,
            &texture,
        )?;
        let lay_flat = Mat4::from_rotation_x(-FRAC_PI_2)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -0.001));
        let flat: Vec<Vec3> = table
            .mesh_mut()
            .positions()
            .iter()
            .map(|p| lay_flat.transform_point3(*p))
            .collect();
        table
            .mesh_mut()
            .update_positions(&context.queue, &flat)
            .map_err(SomavizError::Geometry)?;

        let depth =
            DepthTexture::new(&context.device, size.width, size.height);

        Ok(Self {
            context,
            renderer,
            camera,
            robot,
            bar_plot,
            table,
            depth,
            bend: BendCycle::new(options.robot.bend_step),
            timing: FrameTiming::new(options.display.target_fps),
        })
    }

    fn resize(&mut self, width: u32, height: u32, options: &Options) {
        self.context.resize(width, height);
        self.depth = DepthTexture::new(&self.context.device, width, height);
        self.renderer.update_aspect(
            &self.context.queue,
            options.camera.fov_degrees,
            self.context.aspect(),
            options.camera.z_near,
            options.camera.z_far,
        );
    }

    fn frame(
        &mut self,
        snapshot: &InputSnapshot,
        sensor_values: Option<Vec<f32>>,
        clear_color: [f32; 4],
    ) -> Result<(), SomavizError> {
        self.camera.apply(snapshot);
        self.renderer
            .broadcast_view(&self.context.queue, self.camera.view_matrix());

        if let Some(values) = sensor_values {
            log::debug!("sensor frame: {values:?}");
            self.bar_plot.update_heights(&self.context.queue, &values)?;
            let normalized = self.bar_plot.normalized(&values);
            self.robot.update_colors(&self.context.queue, &normalized)?;
        }

        let p = self.bend.advance();
        self.robot.update_skin_vertices(&self.context.queue, p)?;

        let frame = match self.context.get_next_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = (self.context.config.width, self.context.config.height);
                self.context.resize(w, h);
                return Ok(());
            }
            Err(e) => {
                return Err(SomavizError::Viewer(format!(
                    "surface error: {e}"
                )));
            }
        };
        let color_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Clear pass: background + the table surface.
        let mut encoder = self.context.create_encoder();
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Clear Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &color_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: f64::from(clear_color[0]),
                                    g: f64::from(clear_color[1]),
                                    b: f64::from(clear_color[2]),
                                    a: f64::from(clear_color[3]),
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            self.renderer.render(
                &mut pass,
                &self.table,
                MeshType::PositionTexture,
            );
        }
        self.context.submit(encoder);

        // Colored faces + black outlines (two submissions with color
        // overwrite/restore between).
        self.robot.render(
            &self.context,
            &self.renderer,
            &color_view,
            &self.depth.view,
        )?;

        // Screen-space overlay on top.
        let mut encoder = self.context.create_encoder();
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Overlay Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &color_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            self.renderer.render(&mut pass, &self.bar_plot, MeshType::Ui);
        }
        self.context.submit(encoder);

        frame.present();
        let _ = self.timing.end_frame();
        Ok(())
    }
}

struct App {
    options: Options,
    slot: Arc<LatestSlot<Vec<f32>>>,
    window: Option<Arc<Window>>,
    scene: Option<SceneState>,
    movement: MovementIntents,
    look_delta: Vec2,
    last_cursor: Option<(f32, f32)>,
    last_frame: Instant,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("Somaviz")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.options.display.width,
                self.options.display.height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        match SceneState::new(Arc::clone(&window), &self.options) {
            Ok(scene) => {
                window.request_redraw();
                self.window = Some(window);
                self.scene = Some(scene);
                self.last_frame = Instant::now();
            }
            Err(e) => {
                log::error!("scene setup failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(scene) = &mut self.scene {
                    scene.resize(size.width, size.height, &self.options);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    if code == KeyCode::Escape {
                        event_loop.exit();
                        return;
                    }
                    let _ = self.movement.set_key(code, pressed);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                if let Some((lx, ly)) = self.last_cursor {
                    // Screen-space y grows downward; the camera pitches
                    // up on positive deltas.
                    self.look_delta += Vec2::new(x - lx, ly - y);
                }
                self.last_cursor = Some((x, y));
            }

            WindowEvent::RedrawRequested => {
                let Some(scene) = &mut self.scene else {
                    return;
                };
                if scene.timing.should_render() {
                    let now = Instant::now();
                    let elapsed =
                        now.duration_since(self.last_frame).as_secs_f64();
                    self.last_frame = now;

                    let snapshot = InputSnapshot {
                        look_delta: self.look_delta,
                        movement: self.movement,
                        elapsed_seconds: elapsed,
                    };
                    self.look_delta = Vec2::ZERO;

                    let sensor_values = self.slot.pop();
                    if let Err(e) = scene.frame(
                        &snapshot,
                        sensor_values,
                        self.options.display.clear_color,
                    ) {
                        log::error!("frame failed: {e}");
                        event_loop.exit();
                        return;
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => (),
        }
    }
}

/// Procedural two-tone checkerboard standing in for the original's
/// wood-texture image asset.
fn checker_pixels() -> Vec<u8> {
    const SIZE: u32 = 256;
    const CELL: u32 = 32;
    let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let light = ((x / CELL) + (y / CELL)) % 2 == 0;
            let rgb: [u8; 3] =
                if light { [177, 127, 82] } else { [140, 94, 55] };
            pixels.extend_from_slice(&rgb);
            pixels.push(255);
        }
    }
    pixels
}
