// Windowed host: owns the event loop and feeds the frame driver

use std::sync::Arc;
use std::time::Instant;

use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::assets::AssetLoader;
use crate::config::WindowConfig;
use crate::driver::{Demo, FrameDriver};
use crate::renderer::{GpuRenderer, RenderError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Opens a window and runs `demo` in it until the window closes or a frame
/// fails.
pub async fn run(window_config: &WindowConfig, demo: Box<dyn Demo>, loader: AssetLoader) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_config.title.as_str())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .build(&event_loop)?,
    );

    let renderer = GpuRenderer::new(window.clone()).await?;
    let mut driver = FrameDriver::new(renderer, demo).with_loader(loader);
    driver.start();
    let start_time = Instant::now();

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent {
                window_id,
                event: WindowEvent::CloseRequested,
            } if window_id == window.id() => {
                target.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(physical_size),
                window_id,
            } if window_id == window.id() => {
                driver.resize(physical_size.into());
            }
            Event::AboutToWait => {
                if driver.is_scheduled() {
                    window.request_redraw();
                }
            }
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                window_id,
            } if window_id == window.id() && driver.is_scheduled() => {
                let now_ms = start_time.elapsed().as_secs_f64() * 1000.0;
                if let Err(error) = driver.tick(now_ms) {
                    log::error!("{}: {error}", driver.demo().name());
                    target.exit();
                }
            }
            _ => {}
        }
    })?;
    Ok(())
}
