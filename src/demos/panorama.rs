// Inside-out half sphere showing a looping frame sequence

use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use image::RgbaImage;

use super::common::color_intensity_params;
use crate::assets::{list_images, AssetEvent, AssetId, AssetLoader, BatchId, ImageSequence, VideoSource};
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::params::Param;
use crate::renderer::{RenderError, Renderer, StreamId, TextureKey};
use crate::scene::{LightId, Node, Scene};

pub struct Panorama {
    scene: Scene,
    camera: Camera,
    ambient: LightId,
    stream: StreamId,
    fps: f32,
    batch: Option<BatchId>,
    frames: HashMap<AssetId, Arc<RgbaImage>>,
    video: Option<ImageSequence>,
    seconds: f32,
}

impl Panorama {
    /// Plays the images in `frames_dir` (relative to the loader root) at `fps`.
    pub fn new(loader: &mut AssetLoader, frames_dir: &Path, fps: f32) -> Self {
        let mut scene = Scene::new().with_background(Color::WHITE);
        let camera = Camera::perspective(75.0, 1.0, 1.0, 1100.0).looking_at(Vec3::new(0.0, 0.0, 1.0));
        let ambient = scene.add_light(Light::ambient(Color::WHITE, 0.7));

        let stream = StreamId::new();
        let geometry = Geometry::sphere_section(500.0, 60, 40, 0.0, PI, 0.0, PI).scaled(Vec3::new(-1.0, 1.0, 1.0));
        scene.add(
            Node::mesh("panorama", Arc::new(geometry), Arc::new(Material::basic().with_map(stream)))
                .with_position(Vec3::new(0.0, 0.0, 1.0)),
        );

        let batch = match list_images(&loader.root().join(frames_dir)) {
            Ok(files) if !files.is_empty() => {
                let paths: Vec<PathBuf> = files
                    .iter()
                    .filter_map(|file| file.file_name().map(|name| frames_dir.join(name)))
                    .collect();
                log::info!("panorama: {} frames in {}", paths.len(), frames_dir.display());
                Some(loader.load_batch(&paths).0)
            }
            Ok(_) => {
                log::warn!("panorama: no frames in {}", frames_dir.display());
                None
            }
            Err(error) => {
                log::warn!("panorama: {error}");
                None
            }
        };

        Self {
            scene,
            camera,
            ambient,
            stream,
            fps,
            batch,
            frames: HashMap::new(),
            video: None,
            seconds: 0.0,
        }
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    /// Frames available for playback; zero until the whole sequence is in.
    pub fn frame_count(&self) -> usize {
        self.video.as_ref().map_or(0, ImageSequence::len)
    }
}

impl Demo for Panorama {
    fn name(&self) -> &'static str {
        "panorama"
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn cameras_mut(&mut self) -> Vec<&mut Camera> {
        vec![&mut self.camera]
    }

    fn update(&mut self, seconds: f32) {
        self.seconds = seconds;
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        if let Some(frame) = self.video.as_mut().and_then(|video| video.frame_at(self.seconds)) {
            renderer.upload_image(TextureKey::Stream(self.stream), &frame);
        }
        renderer.render(&self.scene, &self.camera)
    }

    fn on_asset_event(&mut self, event: &AssetEvent) {
        match event {
            AssetEvent::Loaded { id, image, .. } => {
                self.frames.insert(*id, image.clone());
            }
            AssetEvent::BatchComplete { batch, ids } if Some(*batch) == self.batch => {
                // Frames that failed to decode are skipped.
                let frames: Vec<Arc<RgbaImage>> = ids.iter().filter_map(|id| self.frames.remove(id)).collect();
                log::info!("panorama: playing {} of {} frames", frames.len(), ids.len());
                self.video = Some(ImageSequence::new(frames, self.fps));
                self.frames.clear();
            }
            _ => {}
        }
    }

    fn params(&self) -> Vec<Param> {
        color_intensity_params(self.ambient, "color", "intensity")
    }
}
