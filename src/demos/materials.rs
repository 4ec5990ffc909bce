// Shiny phong sphere

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

pub struct Materials {
    scene: Scene,
    camera: Camera,
    group: NodeId,
}

impl Materials {
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 2.0));
        scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(-1.0, 1.0, 4.0)));

        let material = Material::phong()
            .with_color(Color::from_hex(0xff0000))
            .with_shininess(50.0);
        let group = scene.add(Node::new("group"));
        scene.add_child(
            group,
            Node::mesh("sphere", Arc::new(Geometry::sphere(1.0, 12, 12)), Arc::new(material)),
        );

        Self { scene, camera, group }
    }
}

impl Default for Materials {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for Materials {
    fn name(&self) -> &'static str {
        "materials"
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
        spin(&mut self.scene, self.group, seconds);
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera)
    }
}
