//! Windowed host: a winit window with a [`GpuState`] backend.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::FieldConfig;
use crate::error::{MountError, RenderError};
use crate::field::ParticleField;
use crate::gpu::GpuState;
use crate::input::HostInput;
use crate::time::Time;

struct FieldApp {
    config: FieldConfig,
    window: Option<Arc<Window>>,
    field: Option<ParticleField<GpuState>>,
    input: HostInput,
    time: Time,
    error: Option<MountError>,
}

impl FieldApp {
    fn new(config: FieldConfig) -> Self {
        Self {
            config,
            window: None,
            field: None,
            input: HostInput::new(),
            time: Time::new(),
            error: None,
        }
    }

    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), MountError> {
        let window_attrs = Window::default_attributes()
            .with_title("Particle Field")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        let gpu = pollster::block_on(GpuState::new(window.clone()))?;
        let field = ParticleField::mount(self.config.clone(), size.width, size.height, gpu)?;

        self.window = Some(window);
        self.field = Some(field);
        self.time.reset();
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(field) = &mut self.field {
            field.dispose();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for FieldApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.mount(event_loop) {
                log::error!("failed to start: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::RedrawRequested => {
                let (_, dt) = self.time.update();
                if self.time.frame() % 300 == 0 {
                    log::debug!("{:.1} fps", self.time.fps());
                }
                if let Some(field) = &mut self.field {
                    if let Err(RenderError::OutOfMemory) = field.frame(dt) {
                        log::error!("render backend out of memory, exiting");
                        self.shutdown(event_loop);
                        return;
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => {
                if let (Some(host_event), Some(field)) = (self.input.translate(&other), &mut self.field) {
                    field.handle_event(host_event);
                }
            }
        }
    }
}

/// Open a window and run the field until the window closes.
pub fn run(config: FieldConfig) -> Result<(), MountError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FieldApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
