// Per-camera draw ordering.
//
// Opaque draws go front to back so the depth test rejects hidden fragments
// early. Blended draws go back to front so they composite correctly; the
// sort is stable, so two draws at the same depth keep scene order (a back
// face added before its front face is drawn first). Draws that ignore the
// depth buffer come last, in scene order.

use std::cmp::Ordering;
use std::sync::Arc;

use glam::Mat4;

use crate::geometry::Geometry;
use crate::material::Material;
use crate::scene::{NodeId, Scene, Tint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Opaque,
    Transparent,
    Overlay,
}

/// One geometry range drawn with one material.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    pub node: NodeId,
    pub geometry: &'a Arc<Geometry>,
    pub material: &'a Material,
    pub tint: Option<Tint>,
    pub model: Mat4,
    /// First index and index count.
    pub range: (u32, u32),
    /// Distance along the camera's view direction.
    pub depth: f32,
}

#[derive(Debug, Default)]
pub struct RenderList<'a> {
    pub opaque: Vec<DrawItem<'a>>,
    pub transparent: Vec<DrawItem<'a>>,
    pub overlay: Vec<DrawItem<'a>>,
}

impl<'a> RenderList<'a> {
    /// Collects every visible drawable of `scene` as seen through `view`.
    pub fn build(scene: &'a Scene, view: Mat4) -> Self {
        let world = scene.world_matrices();
        let visible = scene.effective_visibility();
        let mut list = Self::default();

        for id in scene.node_ids() {
            if !visible[id.index()] {
                continue;
            }
            let node = scene.node(id);
            let Some(drawable) = &node.drawable else {
                continue;
            };

            let model = world[id.index()];
            let depth = -(view * model.w_axis).z;
            let geometry = &drawable.geometry;

            let mut push = |material: &'a Material, range: (u32, u32)| {
                let item = DrawItem {
                    node: id,
                    geometry,
                    material,
                    tint: drawable.tint,
                    model,
                    range,
                    depth,
                };
                match pass_for(material) {
                    Pass::Opaque => list.opaque.push(item),
                    Pass::Transparent => list.transparent.push(item),
                    Pass::Overlay => list.overlay.push(item),
                }
            };

            // A single material covers the whole geometry regardless of groups.
            if geometry.groups().is_empty() || drawable.materials.len() == 1 {
                if let Some(material) = drawable.materials.first() {
                    push(material.as_ref(), (0, geometry.indices().len() as u32));
                }
            } else {
                for group in geometry.groups() {
                    // Groups without a matching material slot are not drawn.
                    if let Some(material) = drawable.materials.get(group.material_index) {
                        push(material.as_ref(), (group.start, group.count));
                    }
                }
            }
        }

        list.opaque.sort_by(|a, b| cmp_depth(a.depth, b.depth));
        list.transparent.sort_by(|a, b| cmp_depth(b.depth, a.depth));
        list
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len() + self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All draws in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &DrawItem<'a>> {
        self.opaque.iter().chain(&self.transparent).chain(&self.overlay)
    }
}

pub fn pass_for(material: &Material) -> Pass {
    if !material.depth_test {
        Pass::Overlay
    } else if material.is_blended() {
        Pass::Transparent
    } else {
        Pass::Opaque
    }
}

fn cmp_depth(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::material::Side;
    use crate::scene::{Drawable, Node};
    use glam::Vec3;

    fn view() -> Mat4 {
        Camera::perspective(45.0, 1.0, 0.1, 100.0)
            .with_position(Vec3::new(0.0, 0.0, 10.0))
            .view_matrix(&Scene::new())
    }

    #[test]
    fn opaque_front_to_back_transparent_back_to_front() {
        let mut scene = Scene::new();
        let cube = Arc::new(Geometry::cube(1.0));
        let solid = Arc::new(Material::phong());
        let glass = Arc::new(Material::standard().translucent(0.5));

        scene.add(Node::mesh("far", cube.clone(), solid.clone()).with_position(Vec3::new(0.0, 0.0, -5.0)));
        scene.add(Node::mesh("near", cube.clone(), solid).with_position(Vec3::new(0.0, 0.0, 5.0)));
        let far_glass = scene.add(Node::mesh("far-glass", cube.clone(), glass.clone()).with_position(Vec3::new(0.0, 0.0, -3.0)));
        let near_glass = scene.add(Node::mesh("near-glass", cube, glass).with_position(Vec3::new(0.0, 0.0, 3.0)));

        let list = RenderList::build(&scene, view());
        assert_eq!(scene.node(list.opaque[0].node).name, "near");
        assert_eq!(list.transparent[0].node, far_glass);
        assert_eq!(list.transparent[1].node, near_glass);
    }

    #[test]
    fn equal_depth_keeps_back_side_first() {
        let mut scene = Scene::new();
        let cube = Arc::new(Geometry::cube(1.0));
        let back = Arc::new(Material::standard().translucent(0.5).with_side(Side::Back));
        let front = Arc::new(Material::standard().translucent(0.5).with_side(Side::Front));
        scene.add(Node::mesh("back", cube.clone(), back));
        scene.add(Node::mesh("front", cube, front));

        let list = RenderList::build(&scene, view());
        let sides: Vec<Side> = list.transparent.iter().map(|d| d.material.side).collect();
        assert_eq!(sides, vec![Side::Back, Side::Front]);
    }

    #[test]
    fn groups_map_to_material_slots() {
        let mut scene = Scene::new();
        let cube = Arc::new(Geometry::cube(1.0));
        let materials = (0..6).map(|_| Arc::new(Material::basic())).collect();
        scene.add(Node::new("box").with_drawable(Drawable::multi(cube.clone(), materials)));
        // Only two slots: four faces are skipped.
        let two = vec![Arc::new(Material::basic()), Arc::new(Material::basic())];
        scene.add(Node::new("partial").with_drawable(Drawable::multi(cube, two)));

        let list = RenderList::build(&scene, view());
        assert_eq!(list.len(), 8);
        assert!(list.iter().all(|d| d.range.1 == 6));
    }

    #[test]
    fn single_material_draws_every_group() {
        let mut scene = Scene::new();
        scene.add(Node::mesh("box", Arc::new(Geometry::cube(1.0)), Arc::new(Material::basic())));

        let list = RenderList::build(&scene, view());
        assert_eq!(list.len(), 1);
        assert_eq!(list.opaque[0].range, (0, 36));
    }

    #[test]
    fn hidden_and_overlay() {
        let mut scene = Scene::new();
        let cube = Arc::new(Geometry::cube(1.0));
        let group = scene.add(Node::new("group").hidden());
        scene.add_child(group, Node::mesh("inside", cube.clone(), Arc::new(Material::phong())));
        scene.add(Node::mesh("axes", cube, Arc::new(Material::line(crate::math::Color::WHITE).overlay())));

        let list = RenderList::build(&scene, view());
        assert_eq!(list.len(), 1);
        assert_eq!(list.overlay.len(), 1);
    }
}
