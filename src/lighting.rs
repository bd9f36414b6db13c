//! The preview's fixed lighting rig.
//!
//! Three lights are created once per attach and never rebuilt: a white
//! ambient fill, a gold directional key light that casts shadows, and an
//! orange point light sitting near the object like an ember.

use crate::material::Color;
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// A light infinitely far away, shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub casts_shadow: bool,
}

impl DirectionalLight {
    /// Unit vector the light travels along.
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

/// A light radiating from a point, fading out to nothing at `range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub key: DirectionalLight,
    pub ember: PointLight,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.4,
            },
            key: DirectionalLight {
                color: Color::hex(0xffd700),
                intensity: 1.5,
                position: Vec3::new(5.0, 5.0, 5.0),
                casts_shadow: true,
            },
            ember: PointLight {
                color: Color::hex(0xff6600),
                intensity: 2.0,
                position: Vec3::new(-2.0, 1.0, 2.0),
                range: 10.0,
            },
        }
    }
}

/// Light rig as laid out in the shader's uniform block.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    /// rgb * intensity, w unused.
    pub ambient: [f32; 4],
    /// Direction the key light travels, w unused.
    pub key_direction: [f32; 4],
    pub key_color: [f32; 4],
    /// xyz position, w range.
    pub ember_position: [f32; 4],
    pub ember_color: [f32; 4],
}

impl From<&LightRig> for LightUniforms {
    fn from(rig: &LightRig) -> Self {
        let scaled = |c: Color, i: f32| [c.r * i, c.g * i, c.b * i, 1.0];
        Self {
            ambient: scaled(rig.ambient.color, rig.ambient.intensity),
            key_direction: rig.key.direction().extend(0.0).to_array(),
            key_color: scaled(rig.key.color, rig.key.intensity),
            ember_position: rig.ember.position.extend(rig.ember.range).to_array(),
            ember_color: scaled(rig.ember.color, rig.ember.intensity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_light_points_at_origin() {
        let rig = LightRig::default();
        let dir = rig.key.direction();
        assert!((dir - Vec3::splat(-1.0).normalize()).length() < 1e-6);
        assert!(rig.key.casts_shadow);
    }

    #[test]
    fn ember_packs_range_into_w() {
        let rig = LightRig::default();
        let uniforms = LightUniforms::from(&rig);
        assert_eq!(uniforms.ember_position, [-2.0, 1.0, 2.0, 10.0]);
        assert_eq!(uniforms.ambient[0], 0.4);
    }
}
