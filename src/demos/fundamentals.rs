// Three spinning cubes: the smallest complete scene

use std::sync::Arc;

use glam::Vec3;

use super::common::spin;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene};

pub struct Fundamentals {
    scene: Scene,
    camera: Camera,
    cubes: Vec<NodeId>,
}

impl Fundamentals {
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 2.0));

        scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(-1.0, 2.0, 4.0)));

        let geometry = Arc::new(Geometry::cuboid(1.0, 1.0, 1.0, 2, 2, 2));
        let cubes = [(0x44aa88, 0.0), (0x8844aa, -2.0), (0xaa8844, 2.0)]
            .into_iter()
            .enumerate()
            .map(|(i, (color, x))| {
                let material = Arc::new(Material::phong().with_color(Color::from_hex(color)));
                scene.add(Node::mesh(format!("cube{i}"), geometry.clone(), material).with_position(Vec3::new(x, 0.0, 0.0)))
            })
            .collect();

        Self { scene, camera, cubes }
    }

    pub fn cubes(&self) -> &[NodeId] {
        &self.cubes
    }
}

impl Default for Fundamentals {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for Fundamentals {
    fn name(&self) -> &'static str {
        "fundamentals"
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
        for (i, cube) in self.cubes.iter().enumerate() {
            let speed = 1.0 + i as f32 * 0.1;
            spin(&mut self.scene, *cube, seconds * speed);
        }
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera)
    }
}
