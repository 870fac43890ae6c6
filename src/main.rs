use std::process::ExitCode;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use flagscape::config::AppConfig;
use flagscape::controller::{FrameClock, FrameLoop, LoopControl, CONTROL_HELP};
use flagscape::error::StartupError;
use flagscape::logging;
use flagscape::view::{GpuContext, Renderer, WgpuBackend};

/// Everything that exists once the window is up.
struct Running {
    window: Arc<Window>,
    backend: WgpuBackend,
    frame_loop: FrameLoop<WgpuBackend>,
    clock: FrameClock,
}

struct App {
    config: AppConfig,
    running: Option<Running>,
    failure: Option<StartupError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            running: None,
            failure: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, StartupError> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let backend = WgpuBackend::new(gpu);
        let (width, height) = backend.size();
        let renderer = Renderer::new(&backend, &self.config, width, height)?;

        Ok(Running {
            window,
            backend,
            frame_loop: FrameLoop::new(renderer, &self.config),
            clock: FrameClock::new(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        tracing::info!("initializing renderer");
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!(error = %e, "startup failed");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                running.backend.resize(size.width, size.height);
                running.frame_loop.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => running.frame_loop.focus_lost(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let pressed = event.state == ElementState::Pressed;
                    if running.frame_loop.handle_key(code, pressed, event.repeat) == LoopControl::Exit {
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let time = running.clock.tick();
                match running.frame_loop.frame(&mut running.backend, time) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        running.backend.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("out of GPU memory");
                        event_loop.exit();
                    }
                    Err(e) => tracing::warn!(error = %e, "frame dropped"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        shader_dir = %config.shader_dir.display(),
        width = config.window.width,
        height = config.window.height,
        "configuration loaded"
    );
    for line in CONTROL_HELP {
        tracing::info!("{line}");
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "flagscape stopped");
            ExitCode::FAILURE
        }
    }
}
