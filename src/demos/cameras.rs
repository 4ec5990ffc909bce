// Split view: the scene through camera 1 on the left, and camera 1's
// frustum seen from camera 2 on the right

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;

use super::common::{add_cube_and_sphere, PLANE_SIZE, TILE};
use crate::assets::AssetLoader;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::{Filter, Material, Side, TextureSlot};
use crate::math::Color;
use crate::renderer::{RenderError, Renderer};
use crate::scene::{Node, NodeId, Scene};
use crate::viewport::{scissor_for_element, Rect, SurfaceSize};

pub struct Cameras {
    scene: Scene,
    camera_1: Camera,
    camera_2: Camera,
    frustum_helper: NodeId,
}

impl Cameras {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let mut scene = Scene::new();
        let camera_1 = Camera::perspective(45.0, 1.0, 5.0, 40.0)
            .with_position(Vec3::new(0.0, 10.0, 20.0))
            .looking_at(Vec3::ZERO);
        let camera_2 = Camera::perspective(75.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(40.0, 10.0, 30.0))
            .looking_at(Vec3::new(0.0, 5.0, 0.0));

        scene.add_light(Light::ambient(Color::WHITE, 0.1));
        scene.add_light(Light::point(Color::WHITE, 0.7, Vec3::new(0.0, 10.0, 10.0)));

        let frustum_helper = scene.add(Node::mesh(
            "camera_helper",
            Arc::new(Geometry::frustum_lines(&camera_1)),
            Arc::new(Material::line(Color::from_hex(0xffaa00))),
        ));

        let tile = TextureSlot::from(loader.load(TILE))
            .tiled(PLANE_SIZE / 2.0)
            .with_filter(Filter::Linear);
        let plane_material = Material::standard().with_map(tile).with_side(Side::Double);
        let group = scene.add(Node::new("group"));
        scene.add_child(
            group,
            Node::mesh(
                "ground",
                Arc::new(Geometry::plane(PLANE_SIZE, PLANE_SIZE)),
                Arc::new(plane_material),
            )
            .with_position(Vec3::new(0.0, -1.0, 0.0))
            .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        );
        add_cube_and_sphere(&mut scene, group);

        let mut demo = Self {
            scene,
            camera_1,
            camera_2,
            frustum_helper,
        };
        demo.sync_helper();
        demo
    }

    /// Left and right halves of the output.
    pub fn views(size: SurfaceSize) -> (Rect, Rect) {
        let w = size.width as f32;
        let h = size.height as f32;
        (Rect::new(0.0, 0.0, w / 2.0, h), Rect::new(w / 2.0, 0.0, w, h))
    }

    pub fn camera_1(&self) -> &Camera {
        &self.camera_1
    }

    fn sync_helper(&mut self) {
        let transform = &mut self.scene.node_mut(self.frustum_helper).transform;
        transform.position = self.camera_1.transform.position;
        transform.rotation = self.camera_1.transform.rotation;
        transform.scale = Vec3::new(self.camera_1.aspect, 1.0, 1.0);
    }
}

impl Demo for Cameras {
    fn name(&self) -> &'static str {
        "cameras"
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    fn cameras_mut(&mut self) -> Vec<&mut Camera> {
        vec![&mut self.camera_1, &mut self.camera_2]
    }

    fn update(&mut self, _seconds: f32) {}

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        let size = renderer.size();
        let surface = size.bounds();
        let (left, right) = Self::views(size);

        if let Some((scissor, aspect)) = scissor_for_element(surface, left) {
            renderer.set_scissor(Some(scissor));
            self.camera_1.set_aspect(aspect);
            self.sync_helper();
            self.scene.node_mut(self.frustum_helper).visible = false;
            self.scene.background = Some(Color::from_hex(0x000000));
            renderer.render(&self.scene, &self.camera_1)?;
        }

        if let Some((scissor, aspect)) = scissor_for_element(surface, right) {
            renderer.set_scissor(Some(scissor));
            self.camera_2.set_aspect(aspect);
            self.scene.node_mut(self.frustum_helper).visible = true;
            self.scene.background = Some(Color::from_hex(0x000040));
            renderer.render(&self.scene, &self.camera_2)?;
        }

        renderer.set_scissor(None);
        Ok(())
    }
}
