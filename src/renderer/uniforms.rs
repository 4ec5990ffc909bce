// CPU-side mirrors of the uniform blocks in `shaders/mesh.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use super::render_list::DrawItem;
use crate::camera::Camera;
use crate::light::LightKind;
use crate::material::{Material, Shading};
use crate::math::Color;
use crate::scene::Scene;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 4;

/// Dynamic uniform offsets must be multiples of this.
pub const DRAW_UNIFORM_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightUniform {
    /// Direction towards the light (directional) or position (point).
    pub vector: [f32; 4],
    pub color: [f32; 4],
}

/// Per-render uniforms (camera, lights), group 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PassUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
    /// Directional count, point count, unused, unused.
    pub counts: [u32; 4],
    pub directional: [LightUniform; MAX_DIRECTIONAL_LIGHTS],
    pub point: [LightUniform; MAX_POINT_LIGHTS],
}

impl PassUniforms {
    pub fn new(scene: &Scene, camera: &Camera) -> Self {
        let mut uniforms = Self {
            view_proj: camera.view_projection(scene).to_cols_array_2d(),
            camera_position: camera.world_position(scene).extend(1.0).into(),
            ..Self::zeroed()
        };

        let mut ambient = Vec3::ZERO;
        let mut sky = Vec3::ZERO;
        let mut ground = Vec3::ZERO;
        let (mut n_dir, mut n_point) = (0usize, 0usize);

        for light in scene.lights() {
            let radiance = light.radiance().to_vec3();
            match light.kind {
                LightKind::Ambient => ambient += radiance,
                LightKind::Hemisphere { ground_color } => {
                    sky += radiance;
                    ground += ground_color.scaled(light.intensity).to_vec3();
                }
                LightKind::Directional { .. } => {
                    if n_dir == MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("directional light limit ({MAX_DIRECTIONAL_LIGHTS}) reached");
                        continue;
                    }
                    let direction = light.direction().unwrap_or(Vec3::Y);
                    uniforms.directional[n_dir] = LightUniform {
                        vector: direction.extend(0.0).into(),
                        color: radiance.extend(1.0).into(),
                    };
                    n_dir += 1;
                }
                LightKind::Point { position } => {
                    if n_point == MAX_POINT_LIGHTS {
                        log::warn!("point light limit ({MAX_POINT_LIGHTS}) reached");
                        continue;
                    }
                    uniforms.point[n_point] = LightUniform {
                        vector: position.extend(1.0).into(),
                        color: radiance.extend(1.0).into(),
                    };
                    n_point += 1;
                }
            }
        }

        uniforms.ambient = ambient.extend(0.0).into();
        uniforms.sky_color = sky.extend(0.0).into();
        uniforms.ground_color = ground.extend(0.0).into();
        uniforms.counts = [n_dir as u32, n_point as u32, 0, 0];
        uniforms
    }
}

/// Per-draw uniforms, group 1 with a dynamic offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model's upper 3x3, padded to a mat4.
    pub normal_matrix: [[f32; 4]; 4],
    /// RGB plus opacity.
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// Repeat in xy, offset in zw.
    pub uv_transform: [f32; 4],
    /// Shading model, shininess, flat shading flag, specular strength.
    pub params: [f32; 4],
    /// Roughness, metalness.
    pub pbr: [f32; 4],
}

impl DrawUniforms {
    pub fn new(item: &DrawItem<'_>) -> Self {
        let material = item.material;
        let color = item.tint.and_then(|t| t.color).unwrap_or(material.color);
        let emissive = item.tint.and_then(|t| t.emissive).unwrap_or(material.emissive);
        let repeat = material.map.map(|m| m.repeat).unwrap_or(glam::Vec2::ONE);

        Self {
            model: item.model.to_cols_array_2d(),
            normal_matrix: normal_matrix(item.model).to_cols_array_2d(),
            color: with_alpha(color, material.opacity),
            emissive: with_alpha(emissive, 0.0),
            uv_transform: [repeat.x, repeat.y, 0.0, 0.0],
            params: [
                shading_index(material.shading),
                material.shininess.max(1e-4),
                if material.flat_shading { 1.0 } else { 0.0 },
                specular_strength(material),
            ],
            pbr: [material.roughness, material.metalness, 0.0, 0.0],
        }
    }
}

fn with_alpha(color: Color, alpha: f32) -> [f32; 4] {
    [color.r, color.g, color.b, alpha]
}

pub fn normal_matrix(model: Mat4) -> Mat4 {
    let m = Mat3::from_mat4(model);
    if m.determinant().abs() < f32::EPSILON {
        return Mat4::IDENTITY;
    }
    Mat4::from_mat3(m.inverse().transpose())
}

fn shading_index(shading: Shading) -> f32 {
    match shading {
        Shading::Basic => 0.0,
        Shading::Lambert => 1.0,
        Shading::Phong => 2.0,
        Shading::Standard => 3.0,
        Shading::Line => 4.0,
    }
}

fn specular_strength(material: &Material) -> f32 {
    match material.shading {
        // Default phong specular color is #111111.
        Shading::Phong => 0x11 as f32 / 255.0,
        Shading::Standard => 0.04 + (1.0 - 0.04) * material.metalness,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use approx::assert_abs_diff_eq;

    #[test]
    fn layouts_match_shader() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
        assert_eq!(std::mem::size_of::<PassUniforms>(), 64 + 16 * 5 + 32 * 8);
        assert!(std::mem::size_of::<DrawUniforms>() as u64 <= DRAW_UNIFORM_STRIDE);
    }

    #[test]
    fn lights_are_packed_by_kind() {
        let mut scene = Scene::new();
        scene.add_light(Light::ambient(Color::WHITE, 0.1));
        scene.add_light(Light::hemisphere(Color::from_hex(0xb1e1ff), Color::from_hex(0xb97a20), 0.5));
        scene.add_light(
            Light::directional(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 0.0)).with_target(Vec3::new(-5.0, 0.0, 0.0)),
        );
        scene.add_light(Light::point(Color::WHITE, 3.0, Vec3::ZERO));

        let camera = Camera::perspective(45.0, 1.0, 0.1, 100.0);
        let u = PassUniforms::new(&scene, &camera);

        assert_eq!(u.counts, [1, 1, 0, 0]);
        assert_abs_diff_eq!(u.ambient[0], 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(u.ground_color[0], (0xb9 as f32 / 255.0) * 0.5, epsilon = 1e-6);
        let d = Vec3::new(5.0, 10.0, 0.0).normalize();
        assert_abs_diff_eq!(u.directional[0].vector[0], d.x, epsilon = 1e-6);
        assert_abs_diff_eq!(u.point[0].color[0], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(model).transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        // Scaling x by 2 squashes the normal's x.
        assert_abs_diff_eq!(n.x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(n.y, 1.0, epsilon = 1e-6);
        assert_eq!(normal_matrix(Mat4::from_scale(Vec3::ZERO)), Mat4::IDENTITY);
    }
}
