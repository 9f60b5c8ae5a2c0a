use anyhow::{Context, Result};
use clap::Parser;
use rayview_display_wgpu::{FrameBlitter, OrbitCamera};
use rayview_render_cpu::CpuRenderSession;
use rayview_scene::{framing_pose, obj, PresetTable};
use rayview_session::SessionController;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "rayview", about = "Interactive ray-traced model viewer")]
struct Cli {
    /// OBJ model to view
    model: PathBuf,

    /// JSON file with extra camera presets, overlaid on the built-ins
    #[arg(long)]
    preset_file: Option<PathBuf>,

    /// Initial window size, WIDTHxHEIGHT
    #[arg(long, default_value = "1200x800", value_parser = parse_size)]
    size: (u32, u32),

    /// Base name for the accel build-time logs (default: the model file stem)
    #[arg(long)]
    timing_log: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(arg: &str) -> Result<(u32, u32), String> {
    let (w, h) = arg
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {arg:?}"))?;
    let width = w.parse().map_err(|_| format!("bad width {w:?}"))?;
    let height = h.parse().map_err(|_| format!("bad height {h:?}"))?;
    if width == 0 || height == 0 {
        return Err("window size must be nonzero".into());
    }
    Ok((width, height))
}

/// The viewer: session controller plus the windowing state around it.
struct ViewerApp {
    controller: SessionController<CpuRenderSession>,
    camera: OrbitCamera,
    initial_size: (u32, u32),
    window: Option<Arc<Window>>,
    blitter: Option<FrameBlitter>,
    left_held: bool,
    right_held: bool,
    shift_held: bool,
}

impl ViewerApp {
    fn new(
        controller: SessionController<CpuRenderSession>,
        camera: OrbitCamera,
        initial_size: (u32, u32),
    ) -> Self {
        Self {
            controller,
            camera,
            initial_size,
            window: None,
            blitter: None,
            left_held: false,
            right_held: false,
            shift_held: false,
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.initial_size;
        let attrs = Window::default_attributes()
            .with_title("rayview")
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let blitter = FrameBlitter::new(window.clone());
        // The window system may not honor the requested size; follow the
        // drawable size the surface actually got.
        let (w, h) = blitter.size();
        self.controller.resize(w, h);

        self.window = Some(window);
        self.blitter = Some(blitter);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(blitter) = &mut self.blitter {
                    blitter.resize(new_size.width, new_size.height);
                    let (w, h) = blitter.size();
                    self.controller.resize(w, h);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape if state == ElementState::Pressed => {
                    event_loop.exit();
                }
                KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                    self.shift_held = state == ElementState::Pressed;
                }
                _ => {}
            },
            WindowEvent::MouseInput { button, state, .. } => {
                let held = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.left_held = held,
                    MouseButton::Right => self.right_held = held,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let ticks = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 60.0,
                };
                self.camera.zoom(ticks);
            }
            WindowEvent::RedrawRequested => {
                self.controller.advance(&mut self.camera);
                if let Some(blitter) = &mut self.blitter {
                    self.controller.present(blitter);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            let (dx, dy) = (delta.0 as f32, delta.1 as f32);
            if self.right_held || (self.left_held && self.shift_held) {
                self.camera.pan(dx, dy);
            } else if self.left_held {
                self.camera.rotate(dx, dy);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let model = obj::load(&cli.model)
        .with_context(|| format!("failed to load model {}", cli.model.display()))?;

    let mut presets = PresetTable::builtin();
    if let Some(path) = &cli.preset_file {
        let extra = PresetTable::load(path)
            .with_context(|| format!("failed to load presets {}", path.display()))?;
        presets.merge(extra);
    }

    let stem = cli
        .model
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let pose = presets.get(stem).unwrap_or_else(|| {
        tracing::debug!("no camera preset for {stem:?}, framing the model bounds");
        framing_pose(&model.bounds())
    });
    let world_scale = model.world_scale();
    let timing_base = cli.timing_log.clone().unwrap_or_else(|| PathBuf::from(stem));

    let (width, height) = cli.size;
    let session = CpuRenderSession::new(model);
    let controller = SessionController::new(session, pose, width, height);
    controller.write_accel_build_times(&timing_base);

    let camera = OrbitCamera::from_pose(pose, world_scale);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(controller, camera, (width, height));
    event_loop.run_app(&mut app)?;

    Ok(())
}
