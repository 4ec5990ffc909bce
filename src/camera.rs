// Camera module for the tutorial scenes

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::math::{euler_from_mat3, rotation_facing, Transform};
use crate::scene::{NodeId, Scene};

/// Perspective camera looking down its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub transform: Transform,
    pub up: Vec3,
    parent: Option<NodeId>,
}

impl Camera {
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            aspect,
            near,
            far,
            transform: Transform::identity(),
            up: Vec3::Y,
            parent: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Makes the camera follow `node`; its transform becomes relative to it.
    pub fn attach_to(mut self, node: NodeId) -> Self {
        self.parent = Some(node);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn world_matrix(&self, scene: &Scene) -> Mat4 {
        let local = self.transform.matrix();
        match self.parent {
            Some(parent) => scene.world_matrix(parent) * local,
            None => local,
        }
    }

    pub fn world_position(&self, scene: &Scene) -> Vec3 {
        self.world_matrix(scene).w_axis.truncate()
    }

    pub fn view_matrix(&self, scene: &Scene) -> Mat4 {
        self.world_matrix(scene).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, scene: &Scene) -> Mat4 {
        self.projection_matrix() * self.view_matrix(scene)
    }

    /// Turns the camera so it looks at a world-space point.
    pub fn look_at(&mut self, scene: &Scene, target: Vec3) {
        let eye = self.world_position(scene);
        // The camera looks down -Z, so +Z points from the target to the eye.
        let world = Quat::from_mat3(&rotation_facing(eye - target, self.up));

        let parent_rotation = match self.parent {
            Some(parent) => scene.world_matrix(parent).to_scale_rotation_translation().1,
            None => Quat::IDENTITY,
        };
        let local = parent_rotation.inverse() * world;
        self.transform.rotation = euler_from_mat3(Mat3::from_quat(local));
    }

    /// Builder form of [`Camera::look_at`] for unattached cameras.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.look_at(&Scene::new(), target);
        self
    }
}
