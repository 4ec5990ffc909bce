// A tank following a spline while its turret tracks a bobbing target

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::curve::SplineCurve;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene, Tint};

const CAR_WIDTH: f32 = 4.0;
const CAR_HEIGHT: f32 = 1.0;
const CAR_LENGTH: f32 = 8.0;
const WHEEL_THICKNESS: f32 = 0.5;

/// Seconds each camera stays active before switching.
const CAMERA_PERIOD: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveCamera {
    Overview,
    Tank,
}

pub struct Tank {
    scene: Scene,
    overview_camera: Camera,
    tank_camera: Camera,
    active: ActiveCamera,
    curve: SplineCurve,
    tank: NodeId,
    turret_pivot: NodeId,
    target_orbit: NodeId,
    target_bob: NodeId,
    target_mesh: NodeId,
}

impl Tank {
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let overview_camera = Camera::perspective(75.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(0.0, 30.0, 30.0))
            .looking_at(Vec3::ZERO);

        scene.add_light(Light::point(Color::WHITE, 1.0, Vec3::new(10.0, 10.0, 0.0)));
        scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(0.0, 20.0, 0.0)));

        let ground_material = Arc::new(Material::phong().with_color(Color::from_hex(0xcc8866)));
        scene.add(
            Node::mesh("ground", Arc::new(Geometry::plane(50.0, 50.0)), ground_material)
                .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        );

        let tank = scene.add(Node::new("tank"));
        let body_material = Arc::new(Material::phong().with_color(Color::from_hex(0x6688aa)));
        let body_geometry = Arc::new(Geometry::cuboid(CAR_WIDTH, CAR_HEIGHT, CAR_LENGTH, 1, 1, 1));
        let body = scene.add_child(
            tank,
            Node::mesh("body", body_geometry, body_material.clone()).with_position(Vec3::new(0.0, 1.4, 0.0)),
        );

        let mut tank_camera = Camera::perspective(75.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(0.0, 3.0, -6.0))
            .attach_to(body);
        tank_camera.transform.rotation.y = PI;

        let wheel_geometry = Arc::new(Geometry::cylinder(1.0, 1.0, WHEEL_THICKNESS, 6));
        let wheel_material = Arc::new(Material::phong().with_color(Color::from_hex(0x888888)));
        let wheel_x = CAR_WIDTH / 2.0 + WHEEL_THICKNESS / 2.0;
        for z in [CAR_LENGTH / 3.0, 0.0, -CAR_LENGTH / 3.0] {
            for x in [-wheel_x, wheel_x] {
                scene.add_child(
                    body,
                    Node::mesh("wheel", wheel_geometry.clone(), wheel_material.clone())
                        .with_position(Vec3::new(x, -CAR_HEIGHT / 2.0, z))
                        .with_rotation(Vec3::new(0.0, 0.0, FRAC_PI_2)),
                );
            }
        }

        let dome = Arc::new(Geometry::sphere_section(2.0, 12, 12, 0.0, TAU, 0.0, FRAC_PI_2));
        scene.add_child(
            body,
            Node::mesh("dome", dome, body_material.clone()).with_position(Vec3::new(0.0, 0.5, 0.0)),
        );

        let turret_length = CAR_LENGTH * 0.75 * 0.2;
        let turret_pivot = scene.add_child(
            body,
            Node::new("turret_pivot")
                .with_position(Vec3::new(0.0, 0.5, 0.0))
                .with_scale(Vec3::splat(5.0)),
        );
        scene.add_child(
            turret_pivot,
            Node::mesh(
                "turret",
                Arc::new(Geometry::cuboid(0.1, 0.1, turret_length, 1, 1, 1)),
                body_material,
            )
            .with_position(Vec3::new(0.0, 0.0, turret_length * 0.5)),
        );

        let target_material = Arc::new(Material::phong().with_color(Color::from_hex(0x00ff00)).flat());
        let target_orbit = scene.add(Node::new("target_orbit"));
        let target_elevation = scene.add_child(
            target_orbit,
            Node::new("target_elevation").with_position(Vec3::new(0.0, 8.0, CAR_LENGTH * 2.0)),
        );
        let target_bob = scene.add_child(target_elevation, Node::new("target_bob"));
        let target_mesh = scene.add_child(
            target_bob,
            Node::mesh("target", Arc::new(Geometry::sphere(0.5, 6, 3)), target_material),
        );

        let curve = SplineCurve::new(vec![
            Vec2::new(-10.0, 0.0),
            Vec2::new(-5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, -5.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 10.0),
            Vec2::new(-5.0, 10.0),
            Vec2::new(-10.0, -10.0),
            Vec2::new(-15.0, -8.0),
            Vec2::new(-10.0, 0.0),
        ]);
        let path: Vec<Vec3> = curve.points(50).into_iter().map(|p| p.extend(0.0)).collect();
        scene.add(
            Node::mesh(
                "spline",
                Arc::new(Geometry::line_strip(&path)),
                Arc::new(Material::line(Color::from_hex(0xff0000))),
            )
            .with_position(Vec3::new(0.0, 0.05, 0.0))
            .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
        );

        Self {
            scene,
            overview_camera,
            tank_camera,
            active: ActiveCamera::Overview,
            curve,
            tank,
            turret_pivot,
            target_orbit,
            target_bob,
            target_mesh,
        }
    }

    pub fn active_camera(&self) -> ActiveCamera {
        self.active
    }

    pub fn tank_node(&self) -> NodeId {
        self.tank
    }

    pub fn target_node(&self) -> NodeId {
        self.target_mesh
    }

    pub fn turret_pivot(&self) -> NodeId {
        self.turret_pivot
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for Tank {
    fn name(&self) -> &'static str {
        "tank"
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn cameras_mut(&mut self) -> Vec<&mut Camera> {
        vec![&mut self.overview_camera, &mut self.tank_camera]
    }

    fn update(&mut self, seconds: f32) {
        self.active = if seconds.rem_euclid(2.0 * CAMERA_PERIOD) < CAMERA_PERIOD {
            ActiveCamera::Overview
        } else {
            ActiveCamera::Tank
        };

        // target
        self.scene.transform_mut(self.target_orbit).rotation.y = seconds * 0.27;
        self.scene.transform_mut(self.target_bob).position.y = (seconds * 2.0).sin() * 4.0;
        let target = self.scene.node_mut(self.target_mesh);
        target.transform.rotation.x = seconds * 7.0;
        target.transform.rotation.y = seconds * 13.0;
        let hue = Color::from_hsl((seconds * 0.1).rem_euclid(1.0), 1.0, 0.25);
        if let Some(drawable) = target.drawable.as_mut() {
            drawable.tint = Some(Tint {
                color: Some(hue),
                emissive: Some(hue),
            });
        }

        // tank
        let tank_time = seconds * 0.05;
        let position = self.curve.point_at(tank_time.rem_euclid(1.0));
        let heading = self.curve.point_at((tank_time + 0.01).rem_euclid(1.0));
        self.scene.transform_mut(self.tank).position = Vec3::new(position.x, 0.0, position.y);
        self.scene.look_at(self.tank, Vec3::new(heading.x, 0.0, heading.y));

        // turret
        let target_position = self.scene.world_position(self.target_mesh);
        self.scene.look_at(self.turret_pivot, target_position);
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        let camera = match self.active {
            ActiveCamera::Overview => &self.overview_camera,
            ActiveCamera::Tank => &self.tank_camera,
        };
        renderer.render(&self.scene, camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cameras_alternate_every_four_seconds() {
        let mut demo = Tank::new();
        for (t, expected) in [
            (0.0, ActiveCamera::Overview),
            (3.9, ActiveCamera::Overview),
            (4.0, ActiveCamera::Tank),
            (7.9, ActiveCamera::Tank),
            (8.0, ActiveCamera::Overview),
        ] {
            demo.update(t);
            assert_eq!(demo.active_camera(), expected, "t = {t}");
        }
    }

    #[test]
    fn tank_stays_on_the_path() {
        let mut demo = Tank::new();
        demo.update(3.0);
        let expected = demo.curve.point_at(0.15);
        let position = demo.scene.world_position(demo.tank_node());
        assert_abs_diff_eq!(position.x, expected.x, epsilon = 1e-4);
        assert_abs_diff_eq!(position.y, 0.0);
        assert_abs_diff_eq!(position.z, expected.y, epsilon = 1e-4);
    }

    #[test]
    fn turret_points_at_target() {
        let mut demo = Tank::new();
        demo.update(2.5);
        let pivot = demo.scene.world_matrix(demo.turret_pivot());
        let forward = pivot.transform_vector3(Vec3::Z).normalize();
        let to_target = (demo.scene.world_position(demo.target_node()) - pivot.w_axis.truncate()).normalize();
        assert!(forward.dot(to_target) > 0.999, "{forward} vs {to_target}");
    }

    #[test]
    fn target_color_cycles() {
        let mut demo = Tank::new();
        demo.update(2.0);
        let tint = demo.scene.node(demo.target_node()).drawable.as_ref().and_then(|d| d.tint);
        let expected = Color::from_hsl(0.2, 1.0, 0.25);
        assert_eq!(tint.and_then(|t| t.color), Some(expected));
    }
}
