// Light definitions.
//
// Lights only carry parameters; shading happens in the render backend.

use glam::Vec3;

use crate::math::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction.
    Ambient,
    /// Blend between a sky color (from above) and `ground_color` (from below).
    Hemisphere { ground_color: Color },
    /// Parallel rays travelling from `position` towards `target`.
    Directional { position: Vec3, target: Vec3 },
    /// Light radiating from `position`.
    Point { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    pub fn hemisphere(sky_color: Color, ground_color: Color, intensity: f32) -> Self {
        Self {
            color: sky_color,
            intensity,
            kind: LightKind::Hemisphere { ground_color },
        }
    }

    /// Directional light aimed at the origin.
    pub fn directional(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional {
                position,
                target: Vec3::ZERO,
            },
        }
    }

    pub fn point(color: Color, intensity: f32, position: Vec3) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Point { position },
        }
    }

    pub fn with_target(mut self, new_target: Vec3) -> Self {
        if let LightKind::Directional { target, .. } = &mut self.kind {
            *target = new_target;
        }
        self
    }

    /// Unit vector pointing from the lit surface towards a directional light.
    pub fn direction(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { position, target } => Some((position - target).normalize_or_zero()),
            _ => None,
        }
    }

    /// Color already multiplied by intensity.
    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_points_towards_light() {
        let light = Light::directional(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 0.0))
            .with_target(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(light.direction(), Some(Vec3::Y));
        assert_eq!(Light::ambient(Color::WHITE, 0.1).direction(), None);
    }

    #[test]
    fn target_only_applies_to_directional() {
        let light = Light::point(Color::WHITE, 1.0, Vec3::ONE).with_target(Vec3::X);
        assert_eq!(light.kind, LightKind::Point { position: Vec3::ONE });
    }
}
