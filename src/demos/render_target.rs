// A small scene rendered off-screen and used as a cube's texture

use std::sync::Arc;

use glam::Vec3;

use super::common::{LightRig, FOX_1, FOX_2};
use crate::assets::AssetLoader;
use crate::camera::Camera;
use crate::driver::Demo;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::Color;
use crate::params::Param;
use crate::renderer::{RenderError, RenderTarget, Renderer};
use crate::scene::{Node, NodeId, Scene};

const TARGET_SIZE: u32 = 512;

pub struct RenderTargetDemo {
    scene: Scene,
    camera: Camera,
    lights: LightRig,
    mesh: NodeId,
    target: RenderTarget,
    rt_scene: Scene,
    rt_camera: Camera,
    rt_cubes: Vec<NodeId>,
}

impl RenderTargetDemo {
    pub fn new(loader: &mut AssetLoader) -> Self {
        let target = RenderTarget::new(TARGET_SIZE, TARGET_SIZE);
        let rt_camera = Camera::perspective(75.0, target.aspect(), 0.1, 5.0).with_position(Vec3::new(0.0, 0.0, 2.0));
        let mut rt_scene = Scene::new().with_background(Color::from_hex(0x115511));
        rt_scene.add_light(Light::directional(Color::WHITE, 1.0, Vec3::new(-1.0, 2.0, 4.0)));

        let cube = Arc::new(Geometry::cube(1.0));
        let rt_cubes = [(FOX_1, -0.8), (FOX_2, 0.8)]
            .into_iter()
            .map(|(path, x)| {
                let material = Arc::new(Material::basic().with_map(loader.load(path)));
                rt_scene.add(Node::mesh("fox_cube", cube.clone(), material).with_position(Vec3::new(x, 0.0, 0.0)))
            })
            .collect();

        let mut scene = Scene::new();
        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0).with_position(Vec3::new(0.0, 0.0, 3.0));
        let lights = LightRig::add_to(&mut scene);
        let material = Arc::new(Material::basic().with_map(target));
        let mesh = scene.add(Node::mesh("screen_cube", cube, material));

        Self {
            scene,
            camera,
            lights,
            mesh,
            target,
            rt_scene,
            rt_camera,
            rt_cubes,
        }
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn rt_scene(&self) -> &Scene {
        &self.rt_scene
    }

    pub fn rt_cubes(&self) -> &[NodeId] {
        &self.rt_cubes
    }

    pub fn mesh(&self) -> NodeId {
        self.mesh
    }
}

impl Demo for RenderTargetDemo {
    fn name(&self) -> &'static str {
        "render-target"
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    // The off-screen camera keeps the target's aspect.
    fn cameras_mut(&mut self) -> Vec<&mut Camera> {
        vec![&mut self.camera]
    }

    fn update(&mut self, seconds: f32) {
        for (i, &cube) in self.rt_cubes.iter().enumerate() {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            self.rt_scene.transform_mut(cube).rotation = Vec3::new(seconds * sign, seconds, seconds);
        }
        self.scene.transform_mut(self.mesh).rotation = Vec3::new(seconds, -seconds, seconds);
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.set_render_target(Some(self.target));
        renderer.render(&self.rt_scene, &self.rt_camera)?;
        renderer.set_render_target(None);
        renderer.render(&self.scene, &self.camera)
    }

    fn params(&self) -> Vec<Param> {
        self.lights.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessRenderer;
    use crate::viewport::SurfaceSize;

    #[tokio::test]
    async fn off_screen_pass_comes_first() {
        let mut loader = AssetLoader::current("does-not-exist").unwrap();
        let mut demo = RenderTargetDemo::new(&mut loader);
        let mut renderer = HeadlessRenderer::new(SurfaceSize::new(800, 600));

        renderer.begin_frame().unwrap();
        demo.draw(&mut renderer).unwrap();
        let records = renderer.records().to_vec();
        renderer.end_frame().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, Some(demo.target()));
        assert_eq!(records[0].camera_aspect, 1.0);
        assert_eq!(records[0].background, Some(Color::from_hex(0x115511)));
        assert_eq!(records[0].opaque, 2);
        assert_eq!(records[1].target, None);
        assert_eq!(records[1].opaque, 1);
    }

    #[tokio::test]
    async fn cubes_turn_in_opposite_x_directions() {
        let mut loader = AssetLoader::current("does-not-exist").unwrap();
        let mut demo = RenderTargetDemo::new(&mut loader);
        demo.update(2.0);

        let cubes = demo.rt_cubes().to_vec();
        let first = demo.rt_scene().node(cubes[0]).transform.rotation;
        let second = demo.rt_scene().node(cubes[1]).transform.rotation;
        assert_eq!(first, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(second, Vec3::new(-2.0, 2.0, 2.0));
        assert_eq!(demo.scene().node(demo.mesh()).transform.rotation, Vec3::new(2.0, -2.0, 2.0));
    }
}
