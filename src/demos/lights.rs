// Ambient, hemisphere and directional light over a tiled ground

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;

use super::common::{add_cube_and_sphere, LightRig, PLANE_SIZE, TILE};
use crate::assets::AssetLoader;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::material::{Filter, Material, Side, TextureSlot};
use crate::params::Param;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, Scene};

pub struct Lights {
    scene: Scene,
    camera: Camera,
    lights: LightRig,
}

impl Lights {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 10.0, 20.0));
        let lights = LightRig::add_to(&mut scene);

        let tile = TextureSlot::from(loader.load(TILE))
            .tiled(PLANE_SIZE / 2.0)
            .with_filter(Filter::Linear);
        let plane_material = Material::phong().with_map(tile).with_side(Side::Double);
        let group = scene.add(Node::new("group"));
        scene.add_child(
            group,
            Node::mesh(
                "ground",
                Arc::new(Geometry::plane(PLANE_SIZE, PLANE_SIZE)),
                Arc::new(plane_material),
            )
            .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        );
        let root = scene.root();
        add_cube_and_sphere(&mut scene, root);

        Self { scene, camera, lights }
    }
}

impl Demo for Lights {
    fn name(&self) -> &'static str {
        "lights"
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

    fn update(&mut self, _seconds: f32) {}

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera)
    }

    fn params(&self) -> Vec<Param> {
        self.lights.params()
    }
}
