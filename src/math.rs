// Math utilities for the tutorial scenes

use glam::{Mat3, Mat4, Quat, Vec3};

/// Represents a 3D transformation.
///
/// Rotation is stored as Euler angles in radians, applied in X, Y, Z order
/// (`R = Rx * Ry * Rz`), so animations can drive single axes directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Create a new transform
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Rotation as a quaternion
    pub fn quat(&self) -> Quat {
        euler_to_quat(self.rotation)
    }

    /// Generate transformation matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Euler XYZ angles to a quaternion.
pub fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_rotation_x(rotation.x)
        * Quat::from_rotation_y(rotation.y)
        * Quat::from_rotation_z(rotation.z)
}

/// Extract Euler XYZ angles from a pure rotation matrix.
pub fn euler_from_mat3(m: Mat3) -> Vec3 {
    // Row/column naming follows the usual m{row}{col} convention;
    // glam stores columns, so m13 lives in z_axis.x.
    let m11 = m.x_axis.x;
    let m12 = m.y_axis.x;
    let m13 = m.z_axis.x;
    let m22 = m.y_axis.y;
    let m23 = m.z_axis.y;
    let m32 = m.y_axis.z;
    let m33 = m.z_axis.z;

    let y = m13.clamp(-1.0, 1.0).asin();
    if m13.abs() < 0.999_999_9 {
        Vec3::new((-m23).atan2(m33), y, (-m12).atan2(m11))
    } else {
        // Gimbal lock: fold all roll into x.
        Vec3::new(m32.atan2(m22), y, 0.0)
    }
}

/// Rotation whose +Z axis points along `forward`, keeping `up` as close to +Y
/// as possible. Degenerate input (forward parallel to up) nudges the basis.
pub fn rotation_facing(forward: Vec3, up: Vec3) -> Mat3 {
    let z = forward.normalize_or_zero();
    if z == Vec3::ZERO {
        return Mat3::IDENTITY;
    }

    let mut x = up.cross(z);
    if x.length_squared() < 1e-12 {
        let nudged = if up.z.abs() > 0.9 {
            z + Vec3::new(1e-4, 0.0, 0.0)
        } else {
            z + Vec3::new(0.0, 0.0, 1e-4)
        };
        x = up.cross(nudged.normalize());
    }
    let x = x.normalize();
    let y = z.cross(x);

    Mat3::from_cols(x, y, z)
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` literal.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Color from hue, saturation and lightness, all in `0.0..=1.0`.
    ///
    /// Hue wraps around; saturation and lightness are clamped.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let q = 2.0 * l - p;

        Self {
            r: hue_to_rgb(q, p, h + 1.0 / 3.0),
            g: hue_to_rgb(q, p, h),
            b: hue_to_rgb(q, p, h - 1.0 / 3.0),
        }
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_hex),
            3 => {
                let short = u32::from_str_radix(digits, 16).ok()?;
                let r = (short >> 8) & 0xf;
                let g = (short >> 4) & 0xf;
                let b = short & 0xf;
                Some(Self::from_hex((r * 17) << 16 | (g * 17) << 8 | (b * 17)))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        channel(self.r) << 16 | channel(self.g) << 8 | channel(self.b)
    }

    /// `#rrggbb` representation.
    pub fn to_hex_string(self) -> String {
        format!("#{:06x}", self.to_hex())
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn euler_round_trips_through_matrix() {
        let rotation = Vec3::new(0.3, -0.7, 1.1);
        let m = Mat3::from_quat(euler_to_quat(rotation));
        let back = euler_from_mat3(m);

        assert_abs_diff_eq!(back.x, rotation.x, epsilon = 1e-5);
        assert_abs_diff_eq!(back.y, rotation.y, epsilon = 1e-5);
        assert_abs_diff_eq!(back.z, rotation.z, epsilon = 1e-5);
    }

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let transform = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
            Vec3::splat(2.0),
        );
        // +X scaled to 2, rotated about Y onto -Z, then moved.
        let p = transform.matrix().transform_point3(Vec3::X);

        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_facing_points_z_at_target() {
        let m = rotation_facing(Vec3::new(1.0, 0.0, 0.0), Vec3::Y);
        assert_abs_diff_eq!(m.z_axis.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(m.y_axis.y, 1.0, epsilon = 1e-6);

        // Straight up with +Y as up vector must still yield an orthonormal basis.
        let m = rotation_facing(Vec3::Y, Vec3::Y);
        assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn hex_colors() {
        let c = Color::from_hex(0x44aa88);
        assert_eq!(c.to_hex(), 0x44aa88);
        assert_eq!(c.to_hex_string(), "#44aa88");
        assert_eq!(Color::parse("#8AC"), Some(Color::from_hex(0x88aacc)));
        assert_eq!(Color::parse("b1e1ff"), Some(Color::from_hex(0xb1e1ff)));
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(Color::from_hsl(0.0, 1.0, 0.5).to_hex(), 0xff0000);
        assert_eq!(Color::from_hsl(1.0 / 3.0, 1.0, 0.5).to_hex(), 0x00ff00);
        assert_eq!(Color::from_hsl(2.0 / 3.0, 1.0, 0.5).to_hex(), 0x0000ff);
        // Hue wraps.
        assert_eq!(Color::from_hsl(1.0, 1.0, 0.5).to_hex(), 0xff0000);
        assert_eq!(Color::from_hsl(0.3, 0.0, 0.25).to_hex(), Color::new(0.25, 0.25, 0.25).to_hex());
    }
}
