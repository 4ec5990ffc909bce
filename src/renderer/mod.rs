// Renderer module for the tutorial scenes

mod gpu;
mod headless;
mod pipeline;
pub mod render_list;
mod uniforms;

use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::assets::AssetId;
use crate::camera::Camera;
use crate::scene::Scene;
use crate::viewport::{ScissorRect, SurfaceSize};

pub use gpu::GpuRenderer;
pub use headless::{HeadlessRenderer, RenderRecord};

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable graphics adapter found")]
    NoAdapter,
    #[error("failed to acquire device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("render called outside of begin_frame/end_frame")]
    FrameNotStarted,
}

/// Off-screen color buffer that can later be sampled as a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    id: u64,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed),
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Handle for a texture whose pixels are replaced over time, e.g. video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    pub fn new() -> Self {
        Self(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

/// Texture slots whose pixels are supplied by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Asset(AssetId),
    Stream(StreamId),
}

/// Backend-neutral drawing interface used by the demos and the frame driver.
///
/// A frame is `begin_frame`, any number of `render` calls, then `end_frame`.
/// The render target and scissor persist across `render` calls within a
/// frame and are reset by `begin_frame`.
pub trait Renderer {
    /// Size of the default output.
    fn size(&self) -> SurfaceSize;

    /// Resizes the default output. Zero sizes are ignored.
    fn resize(&mut self, size: SurfaceSize);

    fn begin_frame(&mut self) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Redirects subsequent renders off-screen; `None` restores the default output.
    fn set_render_target(&mut self, target: Option<RenderTarget>);

    /// Restricts subsequent renders to a region (viewport and clip) of the
    /// current output. Replaces any previous scissor.
    fn set_scissor(&mut self, scissor: Option<ScissorRect>);

    /// Creates or replaces the pixels behind a texture key.
    fn upload_image(&mut self, key: TextureKey, image: &RgbaImage);

    /// Draws `scene` as seen from `camera` into the current output.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let a = RenderTarget::new(512, 512);
        let b = RenderTarget::new(512, 512);
        assert_ne!(a, b);
        assert_eq!(a.aspect(), 1.0);
        assert_ne!(StreamId::new(), StreamId::new());
        assert_eq!(RenderTarget::new(0, 4).width, 1);
    }
}
