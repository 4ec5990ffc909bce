// Surface descriptions shared between meshes.

use glam::Vec2;

use crate::assets::AssetId;
use crate::math::Color;
use crate::renderer::{RenderTarget, StreamId};

/// Lighting model used when shading a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shading {
    /// Unlit; color and texture only.
    Basic,
    /// Diffuse only.
    Lambert,
    /// Diffuse plus a specular highlight controlled by `shininess`.
    Phong,
    /// Roughness/metalness approximation.
    Standard,
    /// Unlit lines.
    Line,
}

/// Which triangle faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Clamp,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Where a texture's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    Asset(AssetId),
    RenderTarget(RenderTarget),
    Stream(StreamId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSlot {
    pub source: TextureSource,
    pub wrap: Wrap,
    pub repeat: Vec2,
    pub filter: Filter,
}

impl TextureSlot {
    pub fn new(source: TextureSource) -> Self {
        Self {
            source,
            wrap: Wrap::Clamp,
            repeat: Vec2::ONE,
            filter: Filter::Linear,
        }
    }

    /// Tiles the texture `times` in both directions.
    pub fn tiled(mut self, times: f32) -> Self {
        self.wrap = Wrap::Repeat;
        self.repeat = Vec2::splat(times);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl From<AssetId> for TextureSlot {
    fn from(id: AssetId) -> Self {
        Self::new(TextureSource::Asset(id))
    }
}

impl From<RenderTarget> for TextureSlot {
    fn from(target: RenderTarget) -> Self {
        Self::new(TextureSource::RenderTarget(target))
    }
}

impl From<StreamId> for TextureSlot {
    fn from(stream: StreamId) -> Self {
        Self::new(TextureSource::Stream(stream))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Color,
    pub emissive: Color,
    pub shininess: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub flat_shading: bool,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    pub depth_test: bool,
    pub depth_write: bool,
    pub map: Option<TextureSlot>,
}

impl Material {
    fn with_shading(shading: Shading) -> Self {
        Self {
            shading,
            color: Color::WHITE,
            emissive: Color::BLACK,
            shininess: 30.0,
            roughness: 1.0,
            metalness: 0.0,
            flat_shading: false,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            depth_test: true,
            depth_write: true,
            map: None,
        }
    }

    pub fn basic() -> Self {
        Self::with_shading(Shading::Basic)
    }

    pub fn lambert() -> Self {
        Self::with_shading(Shading::Lambert)
    }

    pub fn phong() -> Self {
        Self::with_shading(Shading::Phong)
    }

    pub fn standard() -> Self {
        Self::with_shading(Shading::Standard)
    }

    pub fn line(color: Color) -> Self {
        Self::with_shading(Shading::Line).with_color(color)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_emissive(mut self, emissive: Color) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn flat(mut self) -> Self {
        self.flat_shading = true;
        self
    }

    /// Enables blending with the given opacity.
    pub fn translucent(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = true;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Draws on top of everything already in the depth buffer.
    pub fn overlay(mut self) -> Self {
        self.depth_test = false;
        self.depth_write = false;
        self
    }

    pub fn with_map(mut self, map: impl Into<TextureSlot>) -> Self {
        self.map = Some(map.into());
        self
    }

    pub fn is_lit(&self) -> bool {
        !matches!(self.shading, Shading::Basic | Shading::Line)
    }

    /// Whether the surface goes through the blended, back-to-front pass.
    pub fn is_blended(&self) -> bool {
        self.transparent && self.opacity < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::phong()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phong_defaults() {
        let m = Material::phong().with_color(Color::from_hex(0xff0000)).with_shininess(50.0);
        assert_eq!(m.shading, Shading::Phong);
        assert_eq!(m.shininess, 50.0);
        assert_eq!(m.side, Side::Front);
        assert!(m.is_lit());
        assert!(!m.is_blended());
    }

    #[test]
    fn translucent_is_blended_and_clamped() {
        let m = Material::standard().translucent(1.5);
        assert_eq!(m.opacity, 1.0);
        assert!(!m.is_blended());

        let m = Material::standard().translucent(0.5).with_side(Side::Back);
        assert!(m.is_blended());
        assert_eq!(m.side, Side::Back);
    }

    #[test]
    fn tiled_map_repeats() {
        let target = RenderTarget::new(4, 4);
        let slot = TextureSlot::from(target).tiled(20.0).with_filter(Filter::Nearest);
        assert_eq!(slot.wrap, Wrap::Repeat);
        assert_eq!(slot.repeat, Vec2::splat(20.0));
        assert_eq!(slot.source, TextureSource::RenderTarget(target));
        assert!(!Material::line(Color::WHITE).is_lit());
    }
}
