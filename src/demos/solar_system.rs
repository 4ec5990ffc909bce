// Sun, earth and moon nested through orbit pivots

use std::sync::Arc;

use glam::Vec3;

use super::common::add_axis_grid;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::params::{Binding, Param};
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene};

#[derive(Debug, Clone, Copy)]
struct Bodies {
    solar_system: NodeId,
    sun: NodeId,
    earth_orbit: NodeId,
    earth: NodeId,
    moon_orbit: NodeId,
    moon: NodeId,
}

pub struct SolarSystem {
    scene: Scene,
    camera: Camera,
    bodies: Bodies,
    helpers: Vec<(&'static str, NodeId)>,
}

impl SolarSystem {
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(0.0, 20.0, 0.0))
            .with_up(Vec3::Z)
            .looking_at(Vec3::ZERO);

        scene.add_light(Light::point(Color::WHITE, 3.0, Vec3::ZERO));

        let sphere = Arc::new(Geometry::sphere(1.0, 6, 6));

        let solar_system = scene.add(Node::new("solar_system"));
        let earth_orbit = scene.add_child(
            solar_system,
            Node::new("earth_orbit").with_position(Vec3::new(10.0, 0.0, 0.0)),
        );
        let moon_orbit = scene.add_child(
            earth_orbit,
            Node::new("moon_orbit").with_position(Vec3::new(2.0, 0.0, 0.0)),
        );

        let sun_material = Arc::new(Material::phong().with_emissive(Color::from_hex(0xffff00)));
        let sun = scene.add(Node::mesh("sun_mesh", sphere.clone(), sun_material).with_scale(Vec3::splat(5.0)));

        let earth_material = Arc::new(
            Material::phong()
                .with_color(Color::from_hex(0x2233ff))
                .with_emissive(Color::from_hex(0x112244)),
        );
        let earth = scene.add_child(
            earth_orbit,
            Node::mesh("earth_mesh", sphere.clone(), earth_material).with_scale(Vec3::splat(0.7)),
        );

        let moon_material = Arc::new(
            Material::phong()
                .with_color(Color::from_hex(0x888888))
                .with_emissive(Color::from_hex(0x222222)),
        );
        let moon = scene.add_child(
            moon_orbit,
            Node::mesh("moon_mesh", sphere, moon_material).with_scale(Vec3::splat(0.3)),
        );

        let helpers = vec![
            ("solar_system", add_axis_grid(&mut scene, solar_system, 25)),
            ("sun_mesh", add_axis_grid(&mut scene, sun, 10)),
            ("earth_orbit", add_axis_grid(&mut scene, earth_orbit, 10)),
            ("earth_mesh", add_axis_grid(&mut scene, earth, 10)),
            ("moon_mesh", add_axis_grid(&mut scene, moon, 10)),
        ];

        Self {
            scene,
            camera,
            bodies: Bodies {
                solar_system,
                sun,
                earth_orbit,
                earth,
                moon_orbit,
                moon,
            },
            helpers,
        }
    }
}

impl Default for SolarSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for SolarSystem {
    fn name(&self) -> &'static str {
        "solar-system"
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
        let b = self.bodies;
        let spins = [
            (b.solar_system, 0.1),
            (b.sun, 0.3),
            (b.earth_orbit, 2.0),
            (b.earth, 1.0),
            (b.moon_orbit, 2.0),
            (b.moon, 4.0),
        ];
        for (node, speed) in spins {
            self.scene.transform_mut(node).rotation.y = seconds * speed;
        }
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera)
    }

    fn params(&self) -> Vec<Param> {
        self.helpers
            .iter()
            .map(|&(name, helper)| Param::new(name, Binding::NodeVisible(helper)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn moon_follows_earth_around_the_sun() {
        let mut demo = SolarSystem::new();
        demo.update(0.0);
        let moon = demo.scene.world_position(demo.bodies.moon);
        assert_abs_diff_eq!(moon.x, 12.0, epsilon = 1e-5);

        let t = PI / 2.0;
        demo.update(t);
        let earth = demo.scene.world_position(demo.bodies.earth);
        assert_abs_diff_eq!(earth.length(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn sun_is_not_inside_the_rotating_system() {
        let demo = SolarSystem::new();
        assert_eq!(demo.scene.node(demo.bodies.sun).parent(), Some(demo.scene.root()));
    }

    #[test]
    fn helper_params_toggle_visibility() {
        let mut demo = SolarSystem::new();
        let params = demo.params();
        assert_eq!(params.len(), 5);
        let sun = params.iter().find(|p| p.name == "sun_mesh").unwrap();
        sun.binding
            .set(demo.scene_mut(), crate::params::ParamValue::Bool(true))
            .unwrap();
        let helper = demo.helpers[1].1;
        assert!(demo.scene.is_visible(helper));
    }
}
