//! Scene graph owned by an attached preview.
//!
//! The camera, lights, background and fog are fixed for the lifetime of an
//! attach. Only the [`ContentGroup`] changes: it is emptied and refilled on
//! every stage change, and rotated every frame.

use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::lighting::LightRig;
use crate::material::Color;
use crate::mesh::Transform;
use crate::stage::{PrimitiveKind, PrimitiveSpec};
use glam::{Mat4, Quat};

/// Linear distance fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    /// Distance where fog starts.
    pub near: f32,
    /// Distance where fog fully hides geometry.
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: Color::KILN,
            near: 5.0,
            far: 20.0,
        }
    }
}

/// A drawable mesh and material placed inside the content group.
pub struct Primitive<B: RenderBackend> {
    pub kind: PrimitiveKind,
    pub mesh: B::Mesh,
    pub material: B::Material,
    /// Placement relative to the group.
    pub transform: Transform,
    pub casts_shadow: bool,
}

/// The rebuilt-per-stage part of the scene.
///
/// Owns its primitives exclusively. Anything added must leave through
/// [`ContentGroup::clear`], which hands every mesh and material back to the
/// backend for release.
pub struct ContentGroup<B: RenderBackend> {
    primitives: Vec<Primitive<B>>,
    yaw: f32,
    tilt: f32,
    added: usize,
    released: usize,
}

impl<B: RenderBackend> Default for ContentGroup<B> {
    fn default() -> Self {
        Self {
            primitives: Vec::new(),
            yaw: 0.0,
            tilt: 0.0,
            added: 0,
            released: 0,
        }
    }
}

impl<B: RenderBackend> ContentGroup<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive<B>> {
        self.primitives.iter()
    }

    pub fn kinds(&self) -> Vec<PrimitiveKind> {
        self.primitives.iter().map(|p| p.kind).collect()
    }

    /// Primitives ever added to this group.
    pub fn added_total(&self) -> usize {
        self.added
    }

    /// Primitives ever released from this group.
    pub fn released_total(&self) -> usize {
        self.released
    }

    /// Rotation around the vertical axis, in `[0, 2π)`.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Rotation around the horizontal axis.
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn set_rotation(&mut self, yaw: f32, tilt: f32) {
        self.yaw = yaw.rem_euclid(std::f32::consts::TAU);
        self.tilt = tilt;
    }

    /// The group's own transform: tilt applied after yaw.
    pub fn transform(&self) -> Transform {
        Transform::new()
            .rotation(Quat::from_rotation_x(self.tilt) * Quat::from_rotation_y(self.yaw))
    }

    /// World matrix of a primitive of this group.
    pub fn world_matrix(&self, primitive: &Primitive<B>) -> Mat4 {
        self.transform().matrix() * primitive.transform.matrix()
    }

    /// Releases every primitive's mesh and material. Returns how many were released.
    pub fn clear(&mut self, backend: &mut B) -> usize {
        let count = self.primitives.len();
        for primitive in self.primitives.drain(..) {
            backend.release_mesh(primitive.mesh);
            backend.release_material(primitive.material);
        }
        self.released += count;
        if count > 0 {
            log::debug!("released {} content primitives", count);
        }
        count
    }

    /// Uploads `specs` and appends them. The group should be cleared first.
    pub fn populate(&mut self, backend: &mut B, specs: Vec<PrimitiveSpec>) {
        debug_assert!(self.primitives.is_empty(), "content group not cleared");
        self.primitives.reserve(specs.len());
        for spec in specs {
            let mesh = backend.upload_mesh(&spec.geometry);
            let material = backend.upload_material(&spec.material);
            self.primitives.push(Primitive {
                kind: spec.kind,
                mesh,
                material,
                transform: spec.transform,
                casts_shadow: spec.casts_shadow,
            });
            self.added += 1;
        }
    }
}

impl<B: RenderBackend> Drop for ContentGroup<B> {
    fn drop(&mut self) {
        if !self.primitives.is_empty() {
            log::warn!(
                "content group dropped with {} unreleased primitives",
                self.primitives.len()
            );
        }
    }
}

/// Everything a backend needs to draw one frame.
pub struct SceneGraph<B: RenderBackend> {
    pub camera: Camera,
    pub lights: LightRig,
    pub background: Color,
    pub fog: Fog,
    pub content: ContentGroup<B>,
}

impl<B: RenderBackend> SceneGraph<B> {
    pub fn new(camera: Camera, lights: LightRig, background: Color, fog: Fog) -> Self {
        Self {
            camera,
            lights,
            background,
            fog,
            content: ContentGroup::new(),
        }
    }
}
