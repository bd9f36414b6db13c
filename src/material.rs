//! Surface finishes for the preview's primitives.
//!
//! A [`Material`] is a small physically-inspired description (base colour,
//! emissive colour, roughness, metalness). Each stage picks one of the finish
//! presets below; the backend turns it into whatever GPU resource it needs.

/// Linear RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour from a `0xRRGGBB` sRGB literal, converted to linear.
    pub fn hex(rgb: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((rgb >> shift) & 0xff) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Kiln interior (`#1a0505`), used for the background and fog.
    pub const KILN: Color = Color::rgb(0.010_329_823, 0.001_517_635, 0.001_517_635);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// The sRGB electro-optical transfer function.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Which of the craft finishes a material represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finish {
    /// Matte dark-red raw lac.
    Raw,
    /// Glowing orange lac straight off the coals.
    Heated,
    /// Dark semi-glossy polished lac.
    Finished,
    /// Bright reflective inlaid stone.
    Stone,
}

/// Surface parameters of a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub finish: Finish,
    pub color: Color,
    pub emissive: Color,
    /// 0 is mirror-smooth, 1 fully diffuse.
    pub roughness: f32,
    pub metalness: f32,
}

impl Material {
    pub fn raw() -> Self {
        Self {
            finish: Finish::Raw,
            color: Color::hex(0x8b0000),
            emissive: Color::BLACK,
            roughness: 0.8,
            metalness: 0.1,
        }
    }

    pub fn heated() -> Self {
        Self {
            finish: Finish::Heated,
            color: Color::hex(0xff4500),
            emissive: Color::hex(0x550000),
            roughness: 0.4,
            metalness: 0.0,
        }
    }

    pub fn finished() -> Self {
        Self {
            finish: Finish::Finished,
            color: Color::hex(0x800020),
            emissive: Color::BLACK,
            roughness: 0.2,
            metalness: 0.6,
        }
    }

    pub fn stone() -> Self {
        Self {
            finish: Finish::Stone,
            color: Color::WHITE,
            emissive: Color::hex(0x222222),
            roughness: 0.1,
            metalness: 0.9,
        }
    }

    /// Whether the finish glows on its own.
    pub fn is_emissive(&self) -> bool {
        self.emissive.r > 0.0 || self.emissive.g > 0.0 || self.emissive.b > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels_into_linear_space() {
        let c = Color::hex(0xff4500);
        assert_eq!(c.r, 1.0);
        // 0x45 is 0.2706 in sRGB
        assert!((c.g - 0.059_511).abs() < 1e-5);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn kiln_background_is_linear() {
        let kiln = Color::hex(0x1a0505);
        assert!((Color::KILN.r - 0.0103).abs() < 1e-4);
        assert!((Color::KILN.r - kiln.r).abs() < 1e-6);
        assert!((Color::KILN.g - kiln.g).abs() < 1e-6);
        assert!((Color::KILN.b - kiln.b).abs() < 1e-6);
        assert!((Color::KILN.to_wgpu().r - 0.0103).abs() < 1e-4);
    }

    #[test]
    fn dark_channels_use_the_linear_segment() {
        assert!((Color::hex(0x050505).r - 5.0 / 255.0 / 12.92).abs() < 1e-7);
        assert!((Color::hex(0x8b0000).r - 0.258_183).abs() < 1e-5);
    }

    #[test]
    fn only_heated_and_stone_glow() {
        assert!(!Material::raw().is_emissive());
        assert!(Material::heated().is_emissive());
        assert!(!Material::finished().is_emissive());
        assert!(Material::stone().is_emissive());
    }
}
