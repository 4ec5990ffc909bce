// Textured boxes: eager, on-load and batched loading

use std::sync::Arc;

use glam::Vec3;

use super::common::{spin, FOX_1, FOX_2};
use crate::assets::{AssetEvent, AssetId, AssetLoader, BatchId};
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Drawable, Node, NodeId, Scene};

/// Scene, camera and rotating group shared by the three variants.
struct Stage {
    scene: Scene,
    camera: Camera,
    group: NodeId,
}

impl Stage {
    fn new() -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 2.0));
        scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(-1.0, 1.0, 4.0)));
        let group = scene.add(Node::new("group"));
        Self { scene, camera, group }
    }
}

macro_rules! stage_demo {
    ($ty:ty, $name:literal) => {
        impl Demo for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn scene(&self) -> &Scene {
                &self.stage.scene
            }

            fn scene_mut(&mut self) -> &mut Scene {
                &mut self.stage.scene
            }

            fn cameras_mut(&mut self) -> Vec<&mut Camera> {
                vec![&mut self.stage.camera]
            }

            fn update(&mut self, seconds: f32) {
                spin(&mut self.stage.scene, self.stage.group, seconds);
            }

            fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
                renderer.render(&self.stage.scene, &self.stage.camera)
            }

            fn on_asset_event(&mut self, event: &AssetEvent) {
                self.handle(event);
            }
        }
    };
}

/// Box whose material references the texture before it has loaded.
pub struct Textures {
    stage: Stage,
    texture: AssetId,
}

impl Textures {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let mut stage = Stage::new();
        let texture = loader.load("resources/fox.jpg");
        let material = Arc::new(Material::phong().with_map(texture));
        stage.scene.add_child(
            stage.group,
            Node::mesh("box", Arc::new(Geometry::cube(1.0)), material),
        );
        Self { stage, texture }
    }

    fn handle(&mut self, event: &AssetEvent) {
        if let AssetEvent::Failed { id, path, .. } = event {
            if *id == self.texture {
                log::warn!("{} unavailable, drawing untextured", path.display());
            }
        }
    }
}

stage_demo!(Textures, "textures");

/// Box added only once its texture has arrived.
pub struct TexturesOnLoad {
    stage: Stage,
    texture: AssetId,
    mesh: Option<NodeId>,
}

impl TexturesOnLoad {
    pub fn new(loader: &mut AssetLoader) -> Self {
        Self {
            stage: Stage::new(),
            texture: loader.load(FOX_1),
            mesh: None,
        }
    }

    pub fn mesh(&self) -> Option<NodeId> {
        self.mesh
    }

    fn handle(&mut self, event: &AssetEvent) {
        match event {
            AssetEvent::Loaded { id, .. } if *id == self.texture && self.mesh.is_none() => {
                let material = Arc::new(Material::basic().with_map(self.texture));
                let node = Node::mesh("box", Arc::new(Geometry::cube(1.0)), material);
                self.mesh = Some(self.stage.scene.add_child(self.stage.group, node));
            }
            AssetEvent::Failed { id, error, .. } if *id == self.texture => {
                log::warn!("box not added: {error}");
            }
            _ => {}
        }
    }
}

stage_demo!(TexturesOnLoad, "textures-on-load");

/// Box with a different texture per face, added when the whole batch is in.
pub struct TexturesBatch {
    stage: Stage,
    batch: BatchId,
    materials: Vec<Arc<Material>>,
    progress: f32,
    mesh: Option<NodeId>,
}

impl TexturesBatch {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let (batch, ids) = loader.load_batch(&[FOX_1, FOX_2, FOX_1, FOX_2, FOX_1, FOX_2]);
        let materials = ids
            .into_iter()
            .map(|id| Arc::new(Material::basic().with_map(id)))
            .collect();
        Self {
            stage: Stage::new(),
            batch,
            materials,
            progress: 0.0,
            mesh: None,
        }
    }

    /// Fraction of the batch finished, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn mesh(&self) -> Option<NodeId> {
        self.mesh
    }

    fn handle(&mut self, event: &AssetEvent) {
        match event {
            AssetEvent::Progress {
                batch,
                path,
                loaded,
                total,
            } if *batch == self.batch => {
                self.progress = *loaded as f32 / *total as f32;
                log::info!("loaded {} ({loaded}/{total})", path.display());
            }
            AssetEvent::BatchComplete { batch, .. } if *batch == self.batch && self.mesh.is_none() => {
                let drawable = Drawable::multi(Arc::new(Geometry::cube(1.0)), self.materials.clone());
                let node = Node::new("box").with_drawable(drawable);
                self.mesh = Some(self.stage.scene.add_child(self.stage.group, node));
                self.progress = 1.0;
            }
            _ => {}
        }
    }
}

stage_demo!(TexturesBatch, "textures-batch");
