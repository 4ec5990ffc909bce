// Render backend that records draws instead of issuing them

use std::collections::HashMap;

use image::RgbaImage;

use super::render_list::RenderList;
use super::{RenderError, RenderTarget, Renderer, TextureKey};
use crate::camera::Camera;
use crate::math::Color;
use crate::scene::Scene;
use crate::viewport::{ScissorRect, SurfaceSize};

/// What one `render` call would have drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub target: Option<RenderTarget>,
    pub scissor: Option<ScissorRect>,
    pub camera_aspect: f32,
    pub background: Option<Color>,
    pub opaque: usize,
    pub transparent: usize,
    pub overlay: usize,
}

impl RenderRecord {
    pub fn draw_count(&self) -> usize {
        self.opaque + self.transparent + self.overlay
    }
}

/// Renderer without a GPU. Records every render call of the current frame.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    size: SurfaceSize,
    target: Option<RenderTarget>,
    scissor: Option<ScissorRect>,
    in_frame: bool,
    frames: u64,
    records: Vec<RenderRecord>,
    textures: HashMap<TextureKey, (u32, u32)>,
}

impl HeadlessRenderer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Render calls made since the last `begin_frame`.
    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }

    /// Completed frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn texture_size(&self, key: TextureKey) -> Option<(u32, u32)> {
        self.textures.get(&key).copied()
    }
}

impl Renderer for HeadlessRenderer {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_valid() {
            self.size = size;
        }
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.in_frame = true;
        self.target = None;
        self.scissor = None;
        self.records.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotStarted);
        }
        self.in_frame = false;
        self.frames += 1;
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<RenderTarget>) {
        self.target = target;
    }

    fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.scissor = scissor;
    }

    fn upload_image(&mut self, key: TextureKey, image: &RgbaImage) {
        self.textures.insert(key, image.dimensions());
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotStarted);
        }
        let list = RenderList::build(scene, camera.view_matrix(scene));
        self.records.push(RenderRecord {
            target: self.target,
            scissor: self.scissor,
            camera_aspect: camera.aspect,
            background: scene.background,
            opaque: list.opaque.len(),
            transparent: list.transparent.len(),
            overlay: list.overlay.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_outside_frame_fails() {
        let mut renderer = HeadlessRenderer::new(SurfaceSize::new(8, 8));
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0);
        assert!(matches!(
            renderer.render(&Scene::new(), &camera),
            Err(RenderError::FrameNotStarted)
        ));
    }

    #[test]
    fn begin_frame_resets_state() {
        let mut renderer = HeadlessRenderer::new(SurfaceSize::new(800, 600));
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0);

        renderer.begin_frame().unwrap();
        renderer.set_scissor(Some(ScissorRect::new(0, 0, 400, 600)));
        renderer.set_render_target(Some(RenderTarget::new(64, 64)));
        renderer.render(&Scene::new(), &camera).unwrap();
        renderer.end_frame().unwrap();

        renderer.begin_frame().unwrap();
        renderer.render(&Scene::new(), &camera).unwrap();
        renderer.end_frame().unwrap();

        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.records().len(), 1);
        assert_eq!(renderer.records()[0].scissor, None);
        assert_eq!(renderer.records()[0].target, None);
    }

    #[test]
    fn zero_resize_is_ignored() {
        let mut renderer = HeadlessRenderer::new(SurfaceSize::new(800, 600));
        renderer.resize(SurfaceSize::new(0, 600));
        assert_eq!(renderer.size(), SurfaceSize::new(800, 600));
    }
}
