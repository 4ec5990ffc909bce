// Translucent cubes and intersecting translucent planes

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;

use super::common::{color_intensity_params, LightRig, FOX_1, FOX_2};
use crate::assets::AssetLoader;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::{Material, Side};
use crate::math::Color;
use crate::params::Param;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{LightId, Node, Scene};

const CUBE_OFFSET: f32 = 0.8;

/// Eight half-transparent cubes, each drawn as a back-face mesh followed by
/// a front-face mesh so inner faces show through.
pub struct Transparency {
    scene: Scene,
    camera: Camera,
    lights: LightRig,
}

impl Transparency {
    pub fn new() -> Self {
        let mut scene = Scene::new().with_background(Color::WHITE);
        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(0.0, 0.0, 5.0))
            .looking_at(Vec3::ZERO);
        let lights = LightRig::add_to(&mut scene);

        let geometry = Arc::new(Geometry::cube(1.0));
        let d = CUBE_OFFSET;
        for i in 0..8u32 {
            let x = if i & 1 == 0 { -d } else { d };
            let y = if i & 2 == 0 { -d } else { d };
            let z = if i & 4 == 0 { -d } else { d };
            let color = Color::from_hsl(i as f32 / 8.0, 1.0, 0.5);
            for side in [Side::Back, Side::Front] {
                let material = Material::standard()
                    .with_color(color)
                    .translucent(0.5)
                    .with_side(side);
                scene.add(Node::mesh("cube", geometry.clone(), Arc::new(material)).with_position(Vec3::new(x, y, z)));
            }
        }

        Self { scene, camera, lights }
    }
}

impl Default for Transparency {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for Transparency {
    fn name(&self) -> &'static str {
        "transparency"
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

/// Two textured translucent planes crossing at right angles.
pub struct TransparencyPlanes {
    scene: Scene,
    camera: Camera,
    ambient: LightId,
}

impl TransparencyPlanes {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let mut scene = Scene::new().with_background(Color::WHITE);
        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(1.0, 1.0, 1.0))
            .looking_at(Vec3::ZERO);
        let ambient = scene.add_light(Light::ambient(Color::WHITE, 0.7));

        let geometry = Arc::new(Geometry::plane(1.0, 1.0));
        for (color, rotation_y, path) in [(0x00ff55, 0.0, FOX_1), (0xffff00, FRAC_PI_2, FOX_2)] {
            let material = Material::standard()
                .with_color(Color::from_hex(color))
                .with_map(loader.load(path))
                .translucent(0.5);
            scene.add(
                Node::mesh("plane", geometry.clone(), Arc::new(material))
                    .with_rotation(Vec3::new(0.0, rotation_y, 0.0)),
            );
        }

        Self { scene, camera, ambient }
    }
}

impl Demo for TransparencyPlanes {
    fn name(&self) -> &'static str {
        "transparency-planes"
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
        color_intensity_params(self.ambient, "color", "intensity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::render_list::RenderList;

    #[test]
    fn cubes_fill_the_corners_back_side_first() {
        let demo = Transparency::new();
        let scene = demo.scene();
        let meshes: Vec<_> = scene.node_ids().filter(|&id| scene.node(id).drawable.is_some()).collect();
        assert_eq!(meshes.len(), 16);

        for pair in meshes.chunks(2) {
            let back = scene.node(pair[0]);
            let front = scene.node(pair[1]);
            assert_eq!(back.transform.position, front.transform.position);
            assert!(back.transform.position.abs().cmpeq(Vec3::splat(CUBE_OFFSET)).all());
            let sides: Vec<Side> = [back, front]
                .iter()
                .map(|n| n.drawable.as_ref().map(|d| d.materials[0].side).unwrap())
                .collect();
            assert_eq!(sides, vec![Side::Back, Side::Front]);
        }
    }

    #[test]
    fn every_cube_is_blended() {
        let demo = Transparency::new();
        let list = RenderList::build(demo.scene(), demo.camera.view_matrix(demo.scene()));
        assert!(list.opaque.is_empty());
        assert_eq!(list.transparent.len(), 16);
    }
}
