// Pieces shared by several demos

use std::sync::Arc;

use glam::Vec3;

use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::params::{Axis, Binding, Param};
use crate::scene::{LightId, Node, NodeId, Scene};

pub const FOX_1: &str = "resources/fox-1.jpg";
pub const FOX_2: &str = "resources/fox-2.jpg";
pub const TILE: &str = "resources/tile.png";
pub const PLANE_SIZE: f32 = 40.0;

/// Ambient, hemisphere and aimed directional light used by the lighting
/// scenes.
#[derive(Debug, Clone, Copy)]
pub struct LightRig {
    pub ambient: LightId,
    pub hemisphere: LightId,
    pub directional: LightId,
}

impl LightRig {
    pub fn add_to(scene: &mut Scene) -> Self {
        let ambient = scene.add_light(Light::ambient(Color::WHITE, 0.1));
        let hemisphere = scene.add_light(Light::hemisphere(
            Color::from_hex(0xb1e1ff),
            Color::from_hex(0xb97a20),
            0.5,
        ));
        let directional = scene.add_light(
            Light::directional(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 0.0)).with_target(Vec3::new(-5.0, 0.0, 0.0)),
        );
        Self {
            ambient,
            hemisphere,
            directional,
        }
    }

    pub fn params(&self) -> Vec<Param> {
        let mut params = color_intensity_params(self.ambient, "ambientColor", "ambientIntensity");
        params.extend([
            Param::new("skyColor", Binding::LightColor(self.hemisphere)),
            Param::new("groundColor", Binding::LightGroundColor(self.hemisphere)),
            Param::new("hemisphereIntensity", Binding::LightIntensity(self.hemisphere)).with_range(0.0, 2.0),
        ]);
        params.extend(color_intensity_params(self.directional, "color", "intensity"));
        params.extend([
            Param::new("targetX", Binding::LightTarget(self.directional, Axis::X)).with_range(-10.0, 10.0),
            Param::new("targetZ", Binding::LightTarget(self.directional, Axis::Z)).with_range(-10.0, 10.0),
            Param::new("targetY", Binding::LightTarget(self.directional, Axis::Y)).with_range(0.0, 10.0),
        ]);
        params
    }
}

pub fn color_intensity_params(light: LightId, color: &'static str, intensity: &'static str) -> Vec<Param> {
    vec![
        Param::new(color, Binding::LightColor(light)),
        Param::new(intensity, Binding::LightIntensity(light)).with_range(0.0, 2.0),
    ]
}

/// Spins a node the way most scenes do: equal x and y rotation.
pub fn spin(scene: &mut Scene, id: NodeId, angle: f32) {
    let rotation = &mut scene.transform_mut(id).rotation;
    rotation.x = angle;
    rotation.y = angle;
}

/// The blue cube and tan sphere standing on the tiled ground.
pub fn add_cube_and_sphere(scene: &mut Scene, parent: NodeId) {
    let cube_size = 4.0;
    let cube_material = Material::phong().with_color(Color::parse("#8AC").unwrap_or(Color::WHITE));
    scene.add_child(
        parent,
        Node::mesh("cube", Arc::new(Geometry::cube(cube_size)), Arc::new(cube_material))
            .with_position(Vec3::new(cube_size + 1.0, cube_size / 2.0, 0.0)),
    );

    let radius = 3.0;
    let sphere_material = Material::phong().with_color(Color::parse("#CA8").unwrap_or(Color::WHITE));
    scene.add_child(
        parent,
        Node::mesh("sphere", Arc::new(Geometry::sphere(radius, 32, 16)), Arc::new(sphere_material))
            .with_position(Vec3::new(-radius - 1.0, radius + 2.0, 0.0)),
    );
}

/// Square grid of lines in the XZ plane, centred on the origin.
pub fn grid_lines(size: f32, divisions: u32) -> Geometry {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let segments: Vec<(Vec3, Vec3)> = (0..=divisions)
        .flat_map(|i| {
            let k = -half + i as f32 * step;
            [
                (Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k)),
                (Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half)),
            ]
        })
        .collect();
    Geometry::line_segments(&segments)
}

/// Attaches hidden axis and grid lines to `node`, drawn over the scene.
///
/// Returns the helper's root; toggle its visibility to show both.
pub fn add_axis_grid(scene: &mut Scene, node: NodeId, units: u32) -> NodeId {
    let name = format!("{}_helper", scene.node(node).name);
    let helper = scene.add_child(node, Node::new(name).hidden());

    let grid = Arc::new(grid_lines(units as f32, units));
    let grid_material = Arc::new(Material::line(Color::from_hex(0x888888)).overlay());
    scene.add_child(helper, Node::mesh("grid", grid, grid_material));

    let axes = [
        (Vec3::X, 0xff0000),
        (Vec3::Y, 0x00ff00),
        (Vec3::Z, 0x0000ff),
    ];
    for (axis, color) in axes {
        let line = Arc::new(Geometry::line_segments(&[(Vec3::ZERO, axis)]));
        let material = Arc::new(Material::line(Color::from_hex(color)).overlay());
        scene.add_child(helper, Node::mesh("axis", line, material));
    }
    helper
}
