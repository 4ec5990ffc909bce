// Per-frame scheduling shared by every demo.

use crate::assets::{AssetEvent, AssetLoader};
use crate::camera::Camera;
use crate::clock::{AnimationClock, FrameTime};
use crate::params::Param;
use crate::renderer::{RenderError, Renderer, TextureKey};
use crate::scene::Scene;
use crate::viewport::{fit_cameras, SurfaceSize};

/// A self-contained scene with its own animation.
pub trait Demo {
    fn name(&self) -> &'static str;

    fn scene(&self) -> &Scene;

    fn scene_mut(&mut self) -> &mut Scene;

    /// Cameras whose aspect follows the output size.
    fn cameras_mut(&mut self) -> Vec<&mut Camera>;

    fn resize(&mut self, size: SurfaceSize) {
        fit_cameras(size, self.cameras_mut());
    }

    /// Moves the scene to `seconds` after start. Must depend on nothing
    /// but its argument.
    fn update(&mut self, seconds: f32);

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError>;

    fn on_asset_event(&mut self, _event: &AssetEvent) {}

    fn params(&self) -> Vec<Param> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Not started, or a frame is running.
    Idle,
    /// Waiting for the next tick.
    Scheduled,
    /// A frame failed; no further frames run.
    Halted,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("tick called while no frame is scheduled")]
    NotScheduled,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Runs `update` then `draw` once per tick and reschedules on success.
pub struct FrameDriver<R: Renderer> {
    renderer: R,
    demo: Box<dyn Demo>,
    loader: Option<AssetLoader>,
    clock: AnimationClock,
    state: DriverState,
}

impl<R: Renderer> FrameDriver<R> {
    pub fn new(renderer: R, demo: Box<dyn Demo>) -> Self {
        Self {
            renderer,
            demo,
            loader: None,
            clock: AnimationClock::new(),
            state: DriverState::Idle,
        }
    }

    /// Completed loads are uploaded and forwarded to the demo each tick.
    pub fn with_loader(mut self, loader: AssetLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Fits the demo to the renderer's size and schedules the first frame.
    pub fn start(&mut self) {
        let size = self.renderer.size();
        self.demo.resize(size);
        self.state = DriverState::Scheduled;
        log::info!("starting demo `{}` at {}x{}", self.demo.name(), size.width, size.height);
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == DriverState::Scheduled
    }

    /// Resizes the output and every camera. Zero sizes are skipped.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        if !size.is_valid() {
            log::debug!("ignoring resize to {}x{}", size.width, size.height);
            return false;
        }
        self.renderer.resize(size);
        self.demo.resize(size);
        true
    }

    pub fn tick(&mut self, timestamp_ms: f64) -> Result<FrameTime, DriverError> {
        if self.state != DriverState::Scheduled {
            return Err(DriverError::NotScheduled);
        }
        self.state = DriverState::Idle;

        let time = self.clock.tick(timestamp_ms);
        self.pump_assets();
        self.demo.update(time.elapsed);

        match self.render_frame() {
            Ok(()) => {
                self.state = DriverState::Scheduled;
                Ok(time)
            }
            Err(err) => {
                log::error!("frame {} failed: {err}", time.frame_index);
                self.state = DriverState::Halted;
                Err(err.into())
            }
        }
    }

    fn render_frame(&mut self) -> Result<(), RenderError> {
        self.renderer.begin_frame()?;
        let drawn = self.demo.draw(&mut self.renderer);
        let ended = self.renderer.end_frame();
        drawn.and(ended)
    }

    fn pump_assets(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        while let Some(event) = loader.try_next() {
            if let AssetEvent::Loaded { id, image, .. } = &event {
                self.renderer.upload_image(TextureKey::Asset(*id), image);
            }
            self.demo.on_asset_event(&event);
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn demo(&self) -> &dyn Demo {
        self.demo.as_ref()
    }

    pub fn demo_mut(&mut self) -> &mut dyn Demo {
        self.demo.as_mut()
    }

    pub fn loader_mut(&mut self) -> Option<&mut AssetLoader> {
        self.loader.as_mut()
    }
}
