// Tweakable scene parameters.
//
// A `Binding` names one field of a light or node; demos expose a list of
// named `Param`s and the values can be overridden from the config file.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Deserialize;

use crate::light::LightKind;
use crate::math::Color;
use crate::scene::{LightId, NodeId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// The scene field a parameter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    LightColor(LightId),
    /// Ground color of a hemisphere light.
    LightGroundColor(LightId),
    LightIntensity(LightId),
    /// One coordinate of a directional light's target.
    LightTarget(LightId, Axis),
    NodeVisible(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Color(Color),
    Float(f32),
    Bool(bool),
}

/// A raw override as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamInput {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    Unknown(String),
    #[error("parameter `{name}` expects {expected}")]
    WrongType { name: String, expected: &'static str },
    #[error("`{0}` is not a color")]
    BadColor(String),
    #[error("binding does not apply to this light")]
    NotApplicable,
}

impl Binding {
    pub fn get(&self, scene: &Scene) -> Result<ParamValue, ParamError> {
        match *self {
            Binding::LightColor(id) => Ok(ParamValue::Color(scene.light(id).color)),
            Binding::LightGroundColor(id) => match scene.light(id).kind {
                LightKind::Hemisphere { ground_color } => Ok(ParamValue::Color(ground_color)),
                _ => Err(ParamError::NotApplicable),
            },
            Binding::LightIntensity(id) => Ok(ParamValue::Float(scene.light(id).intensity)),
            Binding::LightTarget(id, axis) => match scene.light(id).kind {
                LightKind::Directional { target, .. } => Ok(ParamValue::Float(axis.get(target))),
                _ => Err(ParamError::NotApplicable),
            },
            Binding::NodeVisible(id) => Ok(ParamValue::Bool(scene.node(id).visible)),
        }
    }

    pub fn set(&self, scene: &mut Scene, value: ParamValue) -> Result<(), ParamError> {
        match (*self, value) {
            (Binding::LightColor(id), ParamValue::Color(color)) => {
                scene.light_mut(id).color = color;
            }
            (Binding::LightGroundColor(id), ParamValue::Color(color)) => match &mut scene.light_mut(id).kind {
                LightKind::Hemisphere { ground_color } => *ground_color = color,
                _ => return Err(ParamError::NotApplicable),
            },
            (Binding::LightIntensity(id), ParamValue::Float(intensity)) => {
                scene.light_mut(id).intensity = intensity;
            }
            (Binding::LightTarget(id, axis), ParamValue::Float(v)) => match &mut scene.light_mut(id).kind {
                LightKind::Directional { target, .. } => axis.set(target, v),
                _ => return Err(ParamError::NotApplicable),
            },
            (Binding::NodeVisible(id), ParamValue::Bool(visible)) => {
                scene.node_mut(id).visible = visible;
            }
            _ => {
                return Err(ParamError::WrongType {
                    name: format!("{self:?}"),
                    expected: self.expected(),
                })
            }
        }
        Ok(())
    }

    fn expected(&self) -> &'static str {
        match self {
            Binding::LightColor(_) | Binding::LightGroundColor(_) => "a color",
            Binding::LightIntensity(_) | Binding::LightTarget(..) => "a number",
            Binding::NodeVisible(_) => "a boolean",
        }
    }
}

/// A named, bounded binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub binding: Binding,
    /// Inclusive range for numeric values.
    pub range: Option<(f32, f32)>,
}

impl Param {
    pub fn new(name: &'static str, binding: Binding) -> Self {
        Self {
            name,
            binding,
            range: None,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Converts a config value into this parameter's type, clamping numbers
    /// into range.
    pub fn parse(&self, input: &ParamInput) -> Result<ParamValue, ParamError> {
        let wrong = || ParamError::WrongType {
            name: self.name.to_string(),
            expected: self.binding.expected(),
        };
        match (self.binding, input) {
            (Binding::LightColor(_) | Binding::LightGroundColor(_), ParamInput::Text(text)) => Color::parse(text)
                .map(ParamValue::Color)
                .ok_or_else(|| ParamError::BadColor(text.clone())),
            (Binding::LightColor(_) | Binding::LightGroundColor(_), ParamInput::Number(n)) if *n >= 0.0 => {
                Ok(ParamValue::Color(Color::from_hex(*n as u32)))
            }
            (Binding::LightIntensity(_) | Binding::LightTarget(..), ParamInput::Number(n)) => {
                let mut v = *n as f32;
                if let Some((min, max)) = self.range {
                    v = v.clamp(min, max);
                }
                Ok(ParamValue::Float(v))
            }
            (Binding::NodeVisible(_), ParamInput::Bool(b)) => Ok(ParamValue::Bool(*b)),
            _ => Err(wrong()),
        }
    }
}

/// Applies every override whose name matches a parameter. Returns how many
/// were applied; stops at the first invalid one.
pub fn apply_overrides(
    scene: &mut Scene,
    params: &[Param],
    overrides: &BTreeMap<String, ParamInput>,
) -> Result<usize, ParamError> {
    let mut applied = 0;
    for (name, input) in overrides {
        let param = params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ParamError::Unknown(name.clone()))?;
        let value = param.parse(input)?;
        param.binding.set(scene, value)?;
        log::info!("param {name} = {value:?}");
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use crate::scene::Node;

    fn lit_scene() -> (Scene, LightId, LightId, NodeId) {
        let mut scene = Scene::new();
        let hemi = scene.add_light(Light::hemisphere(Color::from_hex(0xb1e1ff), Color::from_hex(0xb97a20), 0.5));
        let dir = scene.add_light(
            Light::directional(Color::WHITE, 1.0, Vec3::new(0.0, 10.0, 0.0)).with_target(Vec3::new(-5.0, 0.0, 0.0)),
        );
        let node = scene.add(Node::new("helper").hidden());
        (scene, hemi, dir, node)
    }

    #[test]
    fn bindings_read_and_write_scene_fields() {
        let (mut scene, hemi, dir, node) = lit_scene();

        Binding::LightGroundColor(hemi)
            .set(&mut scene, ParamValue::Color(Color::from_hex(0x123456)))
            .unwrap();
        assert_eq!(
            Binding::LightGroundColor(hemi).get(&scene),
            Ok(ParamValue::Color(Color::from_hex(0x123456)))
        );

        Binding::LightTarget(dir, Axis::Y).set(&mut scene, ParamValue::Float(3.0)).unwrap();
        assert_eq!(Binding::LightTarget(dir, Axis::Y).get(&scene), Ok(ParamValue::Float(3.0)));
        assert_eq!(Binding::LightTarget(dir, Axis::X).get(&scene), Ok(ParamValue::Float(-5.0)));

        Binding::NodeVisible(node).set(&mut scene, ParamValue::Bool(true)).unwrap();
        assert!(scene.node(node).visible);
    }

    #[test]
    fn mismatched_bindings_are_rejected() {
        let (mut scene, hemi, dir, _) = lit_scene();
        assert_eq!(Binding::LightTarget(hemi, Axis::X).get(&scene), Err(ParamError::NotApplicable));
        assert_eq!(Binding::LightGroundColor(dir).get(&scene), Err(ParamError::NotApplicable));
        assert!(matches!(
            Binding::LightIntensity(dir).set(&mut scene, ParamValue::Bool(true)),
            Err(ParamError::WrongType { .. })
        ));
    }

    #[test]
    fn overrides_parse_and_clamp() {
        let (mut scene, hemi, dir, node) = lit_scene();
        let params = vec![
            Param::new("skyColor", Binding::LightColor(hemi)),
            Param::new("intensity", Binding::LightIntensity(dir)).with_range(0.0, 2.0),
            Param::new("helper", Binding::NodeVisible(node)),
        ];
        let mut overrides = BTreeMap::new();
        overrides.insert("skyColor".to_string(), ParamInput::Text("#ff0000".into()));
        overrides.insert("intensity".to_string(), ParamInput::Number(5.0));
        overrides.insert("helper".to_string(), ParamInput::Bool(true));

        assert_eq!(apply_overrides(&mut scene, &params, &overrides), Ok(3));
        assert_eq!(scene.light(hemi).color, Color::from_hex(0xff0000));
        assert_eq!(scene.light(dir).intensity, 2.0);
        assert!(scene.node(node).visible);

        overrides.insert("nope".to_string(), ParamInput::Bool(false));
        assert_eq!(
            apply_overrides(&mut scene, &params, &overrides),
            Err(ParamError::Unknown("nope".into()))
        );
    }

    #[test]
    fn bad_color_text_is_reported() {
        let (_, hemi, _, _) = lit_scene();
        let param = Param::new("skyColor", Binding::LightColor(hemi));
        assert_eq!(
            param.parse(&ParamInput::Text("teal-ish".into())),
            Err(ParamError::BadColor("teal-ish".into()))
        );
    }
}
