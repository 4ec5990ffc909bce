// Cube built from a hand-written vertex table

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::{Geometry, Vertex};
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene};

type Corner = ([f32; 3], [f32; 2]);

// Two triangles per face, listed as (position, uv).
const FACES: [([f32; 3], [Corner; 6]); 6] = [
    // front
    (
        [0.0, 0.0, 1.0],
        [
            ([-1.0, -1.0, 1.0], [0.0, 1.0]),
            ([1.0, -1.0, 1.0], [1.0, 1.0]),
            ([-1.0, 1.0, 1.0], [0.0, 0.0]),
            ([-1.0, 1.0, 1.0], [0.0, 0.0]),
            ([1.0, -1.0, 1.0], [1.0, 1.0]),
            ([1.0, 1.0, 1.0], [1.0, 0.0]),
        ],
    ),
    // right
    (
        [1.0, 0.0, 0.0],
        [
            ([1.0, -1.0, 1.0], [0.0, 1.0]),
            ([1.0, -1.0, -1.0], [1.0, 1.0]),
            ([1.0, 1.0, 1.0], [0.0, 0.0]),
            ([1.0, 1.0, 1.0], [0.0, 0.0]),
            ([1.0, -1.0, -1.0], [1.0, 1.0]),
            ([1.0, 1.0, -1.0], [1.0, 0.0]),
        ],
    ),
    // back
    (
        [0.0, 0.0, -1.0],
        [
            ([1.0, -1.0, -1.0], [0.0, 1.0]),
            ([-1.0, -1.0, -1.0], [1.0, 1.0]),
            ([1.0, 1.0, -1.0], [0.0, 0.0]),
            ([1.0, 1.0, -1.0], [0.0, 0.0]),
            ([-1.0, -1.0, -1.0], [1.0, 1.0]),
            ([-1.0, 1.0, -1.0], [1.0, 0.0]),
        ],
    ),
    // left
    (
        [-1.0, 0.0, 0.0],
        [
            ([-1.0, -1.0, -1.0], [0.0, 1.0]),
            ([-1.0, -1.0, 1.0], [1.0, 1.0]),
            ([-1.0, 1.0, -1.0], [0.0, 0.0]),
            ([-1.0, 1.0, -1.0], [0.0, 0.0]),
            ([-1.0, -1.0, 1.0], [1.0, 1.0]),
            ([-1.0, 1.0, 1.0], [1.0, 0.0]),
        ],
    ),
    // top
    (
        [0.0, 1.0, 0.0],
        [
            ([1.0, 1.0, -1.0], [0.0, 1.0]),
            ([-1.0, 1.0, -1.0], [1.0, 1.0]),
            ([1.0, 1.0, 1.0], [0.0, 0.0]),
            ([1.0, 1.0, 1.0], [0.0, 0.0]),
            ([-1.0, 1.0, -1.0], [1.0, 1.0]),
            ([-1.0, 1.0, 1.0], [1.0, 0.0]),
        ],
    ),
    // bottom
    (
        [0.0, -1.0, 0.0],
        [
            ([1.0, -1.0, 1.0], [0.0, 1.0]),
            ([-1.0, -1.0, 1.0], [1.0, 1.0]),
            ([1.0, -1.0, -1.0], [0.0, 0.0]),
            ([1.0, -1.0, -1.0], [0.0, 0.0]),
            ([-1.0, -1.0, 1.0], [1.0, 1.0]),
            ([-1.0, -1.0, -1.0], [1.0, 0.0]),
        ],
    ),
];

/// The 36-vertex cube, edge length 2.
pub fn vertex_table() -> Vec<Vertex> {
    FACES
        .iter()
        .flat_map(|(normal, corners)| {
            corners
                .iter()
                .map(move |(pos, uv)| Vertex::new(Vec3::from(*pos), Vec3::from(*normal), Vec2::from(*uv)))
        })
        .collect()
}

pub struct CustomGeometry {
    scene: Scene,
    camera: Camera,
    cubes: Vec<NodeId>,
}

impl CustomGeometry {
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 6.0));
        scene.add_light(Light::point(Color::WHITE, 1.0, Vec3::new(-1.0, 1.0, 4.0)));

        let geometry = Arc::new(Geometry::from_vertices(vertex_table()));
        let cubes = [(0xaaaa00, 0.0), (0x00aaaa, 3.0), (0xaa00aa, -3.0)]
            .into_iter()
            .map(|(color, x)| {
                let material = Arc::new(Material::phong().with_color(Color::from_hex(color)));
                scene.add(Node::mesh("cube", geometry.clone(), material).with_position(Vec3::new(x, 0.0, 0.0)))
            })
            .collect();

        Self { scene, camera, cubes }
    }

    pub fn cubes(&self) -> &[NodeId] {
        &self.cubes
    }
}

impl Default for CustomGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo for CustomGeometry {
    fn name(&self) -> &'static str {
        "custom-geometry"
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
        for (i, &cube) in self.cubes.iter().enumerate() {
            let angle = if i % 2 == 0 { seconds } else { -seconds };
            self.scene.transform_mut(cube).rotation = Vec3::new(angle, 0.0, angle);
        }
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.render(&self.scene, &self.camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_closed_outward_cube() {
        let vertices = vertex_table();
        assert_eq!(vertices.len(), 36);
        for triangle in vertices.chunks(3) {
            let [a, b, c] = [triangle[0].position(), triangle[1].position(), triangle[2].position()];
            let winding = (b - a).cross(c - a).normalize();
            // Counter-clockwise seen from outside.
            assert_eq!(winding, triangle[0].normal());
            assert!(a.abs().max_element() == 1.0);
        }
    }

    #[test]
    fn neighbours_spin_the_other_way() {
        let mut demo = CustomGeometry::new();
        demo.update(1.5);
        let rotations: Vec<Vec3> = demo
            .cubes()
            .iter()
            .map(|&id| demo.scene().node(id).transform.rotation)
            .collect();
        assert_eq!(rotations[0], Vec3::new(1.5, 0.0, 1.5));
        assert_eq!(rotations[1], Vec3::new(-1.5, 0.0, -1.5));
        assert_eq!(rotations[2], Vec3::new(1.5, 0.0, 1.5));
    }
}
