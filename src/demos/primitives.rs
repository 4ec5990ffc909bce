// One built-in shape with its wireframe drawn on top

use std::sync::Arc;

use glam::Vec3;

use super::common::spin;
use crate::camera::Camera;
use crate::config::PrimitiveShape;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene};

pub fn shape_geometry(shape: PrimitiveShape) -> Geometry {
    match shape {
        PrimitiveShape::Box => Geometry::cuboid(1.0, 1.0, 1.0, 2, 2, 2),
        PrimitiveShape::Circle => Geometry::circle(1.0, 24),
        PrimitiveShape::Cone => Geometry::cone(1.0, 1.0, 16),
        PrimitiveShape::Cylinder => Geometry::cylinder(0.5, 1.0, 1.0, 12),
        PrimitiveShape::Dodecahedron => Geometry::dodecahedron(7.0),
        PrimitiveShape::Sphere => Geometry::sphere(1.0, 8, 8),
    }
}

pub struct Primitives {
    scene: Scene,
    camera: Camera,
    group: NodeId,
}

impl Primitives {
    pub fn new(shape: PrimitiveShape) -> Self {
        let mut scene = Scene::new();
        let camera = Camera::perspective(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 2.0));
        scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(-1.0, 2.0, 4.0)));

        let geometry = shape_geometry(shape);
        let wireframe = Arc::new(geometry.wireframe());
        let geometry = Arc::new(geometry);

        let group = scene.add(Node::new("group"));
        let material = Arc::new(Material::phong().with_color(Color::from_hex(0x515151)));
        scene.add_child(group, Node::mesh("mesh", geometry, material));
        let line_material = Arc::new(Material::line(Color::from_hex(0xffff00)));
        scene.add_child(group, Node::mesh("line", wireframe, line_material));

        log::debug!("primitive: {shape:?}");
        Self { scene, camera, group }
    }
}

impl Demo for Primitives {
    fn name(&self) -> &'static str {
        "primitives"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Topology;

    #[test]
    fn every_shape_has_triangles_and_edges() {
        for shape in [
            PrimitiveShape::Box,
            PrimitiveShape::Circle,
            PrimitiveShape::Cone,
            PrimitiveShape::Cylinder,
            PrimitiveShape::Dodecahedron,
            PrimitiveShape::Sphere,
        ] {
            let geometry = shape_geometry(shape);
            assert!(geometry.triangle_count() > 0, "{shape:?}");
            let edges = geometry.wireframe();
            assert_eq!(edges.topology(), Topology::Lines);
            assert!(!edges.indices().is_empty());
        }
    }

    #[test]
    fn group_holds_mesh_and_wireframe() {
        let demo = Primitives::new(PrimitiveShape::Sphere);
        assert_eq!(demo.scene.node(demo.group).children().len(), 2);
    }
}
