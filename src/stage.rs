//! The four stages of bangle making and what each one looks like.
//!
//! [`Stage::blueprint`] is pure: it describes the primitives of a stage on the
//! CPU without touching any GPU resource, so a [`ContentGroup`] can release
//! the previous stage first and upload the new one afterwards.
//!
//! [`ContentGroup`]: crate::ContentGroup

use crate::error::PreviewError;
use crate::geometry::RawGeometry;
use crate::material::Material;
use crate::mesh::Transform;
use glam::{Quat, Vec3};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Number of inlaid stones on the decorated ring.
pub const STONE_COUNT: usize = 12;
/// Distance from the ring's center to each stone.
pub const STONE_ORBIT: f32 = 1.75;

const RING_RADIUS: f32 = 1.5;
const RING_TUBE: f32 = 0.25;

/// A step of the craft process, selected by the surrounding page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    RawLump,
    HeatedRod,
    PlainRing,
    DecoratedRing,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::RawLump,
        Stage::HeatedRod,
        Stage::PlainRing,
        Stage::DecoratedRing,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::RawLump => "Raw Lac Collection",
            Stage::HeatedRod => "Heating & Rolling",
            Stage::PlainRing => "Shaping (Kalbut)",
            Stage::DecoratedRing => "Stone Embellishment",
        }
    }

    /// The following stage, wrapping back to the first.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// The preceding stage, wrapping around to the last.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// How many primitives this stage puts in the content group.
    pub fn primitive_count(self) -> usize {
        match self {
            Stage::DecoratedRing => 1 + STONE_COUNT,
            _ => 1,
        }
    }

    /// Describes this stage's primitives.
    ///
    /// `rng` only feeds the raw lump's cosmetic jitter.
    pub fn blueprint<R: Rng>(self, rng: &mut R) -> Vec<PrimitiveSpec> {
        match self {
            Stage::RawLump => vec![PrimitiveSpec {
                kind: PrimitiveKind::Lump,
                geometry: RawGeometry::lump(1.2, 1, 0.8, 0.1, rng),
                material: Material::raw(),
                transform: Transform::new(),
                casts_shadow: true,
            }],
            Stage::HeatedRod => vec![PrimitiveSpec {
                kind: PrimitiveKind::Rod,
                geometry: RawGeometry::cylinder(0.3, 3.0, 32),
                material: Material::heated(),
                transform: Transform::new().rotation(Quat::from_rotation_z(FRAC_PI_2)),
                casts_shadow: true,
            }],
            Stage::PlainRing => vec![ring(64)],
            Stage::DecoratedRing => {
                let mut specs = Vec::with_capacity(self.primitive_count());
                specs.push(ring(100));
                specs.extend((0..STONE_COUNT).map(stone));
                specs
            }
        }
    }
}

impl TryFrom<usize> for Stage {
    type Error = PreviewError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Stage::ALL
            .get(index)
            .copied()
            .ok_or(PreviewError::InvalidStage(index))
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// What a primitive depicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Lump,
    Rod,
    Ring,
    Stone,
}

/// CPU-side description of one primitive, ready for upload.
#[derive(Clone, Debug)]
pub struct PrimitiveSpec {
    pub kind: PrimitiveKind,
    pub geometry: RawGeometry,
    pub material: Material,
    /// Placement relative to the content group.
    pub transform: Transform,
    pub casts_shadow: bool,
}

fn ring(tubular_segments: u32) -> PrimitiveSpec {
    PrimitiveSpec {
        kind: PrimitiveKind::Ring,
        geometry: RawGeometry::torus(RING_RADIUS, RING_TUBE, 32, tubular_segments),
        material: Material::finished(),
        transform: Transform::new(),
        casts_shadow: true,
    }
}

fn stone(i: usize) -> PrimitiveSpec {
    let angle = i as f32 / STONE_COUNT as f32 * TAU;
    let (sin, cos) = angle.sin_cos();
    PrimitiveSpec {
        kind: PrimitiveKind::Stone,
        geometry: RawGeometry::sphere(0.1, 16, 16),
        material: Material::stone(),
        transform: Transform::from_position(Vec3::new(cos * STONE_ORBIT, sin * STONE_ORBIT, 0.0)),
        casts_shadow: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Finish;

    #[test]
    fn index_boundary_rejects_out_of_range() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(Stage::try_from(i).unwrap(), *stage);
            assert_eq!(stage.index(), i);
        }
        assert!(matches!(
            Stage::try_from(4),
            Err(PreviewError::InvalidStage(4))
        ));
        assert!(Stage::try_from(usize::MAX).is_err());
    }

    #[test]
    fn next_and_previous_wrap() {
        assert_eq!(Stage::DecoratedRing.next(), Stage::RawLump);
        assert_eq!(Stage::RawLump.previous(), Stage::DecoratedRing);
        for stage in Stage::ALL {
            assert_eq!(stage.next().previous(), stage);
        }
    }

    #[test]
    fn blueprints_match_primitive_counts() {
        let mut rng = rand::thread_rng();
        let counts: Vec<usize> = Stage::ALL
            .iter()
            .map(|s| s.blueprint(&mut rng).len())
            .collect();
        assert_eq!(counts, vec![1, 1, 1, 13]);
        for stage in Stage::ALL {
            assert_eq!(stage.blueprint(&mut rng).len(), stage.primitive_count());
        }
    }

    #[test]
    fn heated_rod_lies_horizontally() {
        let specs = Stage::HeatedRod.blueprint(&mut rand::thread_rng());
        let rod = &specs[0];
        assert_eq!(rod.kind, PrimitiveKind::Rod);
        assert!(rod.material.is_emissive());

        let axis = rod.transform.matrix().transform_vector3(Vec3::Y);
        assert!(axis.y.abs() < 1e-6);
        assert!((axis.x.abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stones_circle_the_ring_every_thirty_degrees() {
        let specs = Stage::DecoratedRing.blueprint(&mut rand::thread_rng());
        assert_eq!(specs[0].kind, PrimitiveKind::Ring);
        assert_eq!(specs[0].material.finish, Finish::Finished);

        let stones = &specs[1..];
        assert_eq!(stones.len(), STONE_COUNT);
        for (i, spec) in stones.iter().enumerate() {
            assert_eq!(spec.kind, PrimitiveKind::Stone);
            assert_eq!(spec.material.finish, Finish::Stone);

            let p = spec.transform.position;
            assert!(p.z.abs() < 1e-6, "stone {i} leaves the ring plane");
            assert!((p.length() - STONE_ORBIT).abs() < 1e-5);

            let expected = (i as f32 * 30.0).to_radians();
            let actual = p.y.atan2(p.x).rem_euclid(TAU);
            let diff = (actual - expected).abs();
            assert!(diff < 1e-4 || (TAU - diff) < 1e-4, "stone {i} at {actual}");
        }
    }
}
