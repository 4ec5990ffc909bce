// Scene module for the tutorial scenes

use std::sync::Arc;

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use crate::math::{euler_from_mat3, rotation_facing, Color, Transform};

/// Handle to a node inside a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a light inside a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(usize);

/// Per-node override of the shared material colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub color: Option<Color>,
    pub emissive: Option<Color>,
}

/// Geometry plus material(s) attached to a node.
///
/// Geometry and materials are shared read-only between nodes.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub geometry: Arc<Geometry>,
    pub materials: Vec<Arc<Material>>,
    pub tint: Option<Tint>,
}

impl Drawable {
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            geometry,
            materials: vec![material],
            tint: None,
        }
    }

    /// One material per geometry group, indexed by the group's material slot.
    pub fn multi(geometry: Arc<Geometry>, materials: Vec<Arc<Material>>) -> Self {
        Self {
            geometry,
            materials,
            tint: None,
        }
    }
}

/// Represents an object within the 3D scene.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub drawable: Option<Drawable>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Creates an empty grouping node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            visible: true,
            drawable: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Creates a node carrying a single-material mesh.
    pub fn mesh(name: impl Into<String>, geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self::new(name).with_drawable(Drawable::new(geometry, material))
    }

    pub fn with_drawable(mut self, drawable: Drawable) -> Self {
        self.drawable = Some(drawable);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Represents the entire 3D scene.
///
/// Nodes live in an arena and are only ever created under an existing parent,
/// so a parent's index is always smaller than its children's and the
/// hierarchy can never contain a cycle.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    lights: Vec<Light>,
    pub background: Option<Color>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a new scene holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root")],
            lights: Vec::new(),
            background: None,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Adds a top-level node.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.add_child(self.root(), node)
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Mutable access to a node's local transform.
    pub fn transform_mut(&mut self, id: NodeId) -> &mut Transform {
        &mut self.nodes[id.0].transform
    }

    /// Gets a node by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// All node ids in creation order (parents before children).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Number of nodes added, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks from the node's parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, move |p| self.nodes[p.0].parent)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, of: NodeId) -> bool {
        self.ancestors(of).any(|a| a == ancestor)
    }

    /// Every node below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// World matrix of a single node, composed from the root down.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// World matrices of all nodes, indexed by `NodeId::index`.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.matrix();
            let m = match node.parent {
                Some(parent) => world[parent.0] * local,
                None => local,
            };
            world.push(m);
        }
        world
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// A node is drawn only if it and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes[id.0].visible && self.ancestors(id).all(|a| self.nodes[a.0].visible)
    }

    /// Visibility of every node with ancestors taken into account.
    pub fn effective_visibility(&self) -> Vec<bool> {
        let mut visible: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let inherited = node.parent.map_or(true, |p| visible[p.0]);
            visible.push(inherited && node.visible);
        }
        visible
    }

    /// Rotates the node so its local +Z axis points at a world-space target.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) {
        let position = self.world_position(id);
        let facing = rotation_facing(target - position, Vec3::Y);

        let parent_rotation = match self.nodes[id.0].parent {
            Some(parent) => {
                let (_, rotation, _) = self.world_matrix(parent).to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };

        let world = Quat::from_mat3(&facing);
        let local = parent_rotation.inverse() * world;
        self.nodes[id.0].transform.rotation = euler_from_mat3(Mat3::from_quat(local));
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        self.lights.push(light);
        LightId(self.lights.len() - 1)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> &Light {
        &self.lights[id.0]
    }

    pub fn light_mut(&mut self, id: LightId) -> &mut Light {
        &mut self.lights[id.0]
    }

    /// Snapshot of every local transform, in node order.
    pub fn transforms(&self) -> Vec<Transform> {
        self.nodes.iter().map(|n| n.transform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn child_is_only_ever_a_descendant() {
        let mut scene = Scene::new();
        let a = scene.add(Node::new("a"));
        let b = scene.add_child(a, Node::new("b"));

        assert!(scene.is_ancestor(a, b));
        assert!(!scene.is_ancestor(b, a));
        assert!(scene.descendants(a).contains(&b));
        assert!(!scene.ancestors(a).any(|n| n == b));
        assert_eq!(scene.node(b).parent(), Some(a));
        assert_eq!(scene.node(a).children(), &[b]);
    }

    #[test]
    fn parent_indices_precede_children() {
        let mut scene = Scene::new();
        let a = scene.add(Node::new("a"));
        let b = scene.add_child(a, Node::new("b"));
        let c = scene.add_child(b, Node::new("c"));
        let d = scene.add(Node::new("d"));

        for id in [a, b, c, d] {
            let parent = scene.node(id).parent().expect("non-root node has a parent");
            assert!(parent.index() < id.index());
        }
        assert_eq!(scene.descendants(scene.root()), vec![a, b, c, d]);
    }

    #[test]
    fn world_matrix_composes_parent_first() {
        let mut scene = Scene::new();
        let orbit = scene.add(
            Node::new("orbit")
                .with_position(Vec3::new(10.0, 0.0, 0.0))
                .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0)),
        );
        let moon = scene.add_child(orbit, Node::new("moon").with_position(Vec3::new(2.0, 0.0, 0.0)));

        let p = scene.world_position(moon);
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, -2.0, epsilon = 1e-5);

        let all = scene.world_matrices();
        assert!(all[moon.index()].abs_diff_eq(scene.world_matrix(moon), 1e-6));
    }

    #[test]
    fn hidden_parent_hides_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(Node::new("group").hidden());
        let child = scene.add_child(group, Node::new("child"));
        let other = scene.add(Node::new("other"));

        assert!(!scene.is_visible(child));
        assert!(scene.is_visible(other));
        let visibility = scene.effective_visibility();
        assert!(!visibility[child.index()]);
        assert!(visibility[other.index()]);
    }

    #[test]
    fn look_at_accounts_for_parent_rotation() {
        let mut scene = Scene::new();
        let body = scene.add(Node::new("body").with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0)));
        let pivot = scene.add_child(body, Node::new("pivot"));

        scene.look_at(pivot, Vec3::new(0.0, 0.0, 5.0));

        let forward = scene.world_matrix(pivot).transform_vector3(Vec3::Z).normalize();
        assert_abs_diff_eq!(forward.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(forward.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn find_by_name() {
        let mut scene = Scene::new();
        let earth = scene.add(Node::new("earth"));
        assert_eq!(scene.find("earth"), Some(earth));
        assert_eq!(scene.find("mars"), None);
    }

    #[test]
    fn root_is_not_counted() {
        let mut scene = Scene::new();
        assert!(scene.is_empty());
        assert_eq!(scene.len(), 0);

        let a = scene.add(Node::new("a"));
        scene.add_child(a, Node::new("b"));
        assert!(!scene.is_empty());
        assert_eq!(scene.len(), 2);
    }
}
