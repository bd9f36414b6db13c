//! The seam between the preview's scene logic and whatever draws it.
//!
//! [`StagePreview`](crate::StagePreview) only ever talks to a
//! [`RenderBackend`]: it asks it to upload meshes and materials, to release
//! them again, and to draw a [`SceneGraph`]. The wgpu implementation lives in
//! [`WgpuBackend`](crate::WgpuBackend); [`HeadlessBackend`](crate::HeadlessBackend)
//! keeps a ledger instead of touching a GPU.
//!
//! Mesh and material handles are move-only associated types. Releasing one
//! consumes it, so a handle cannot be released twice.

use crate::error::PreviewError;
use crate::geometry::RawGeometry;
use crate::material::Material;
use crate::scene::SceneGraph;

/// Pixel dimensions of a drawable surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero (minimized window, collapsed panel).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or `None` for an empty surface.
    pub fn aspect(&self) -> Option<f32> {
        (!self.is_empty()).then(|| self.width as f32 / self.height as f32)
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Something that can draw a [`SceneGraph`] and owns the GPU resources for it.
pub trait RenderBackend: Sized {
    /// Uploaded geometry.
    type Mesh;
    /// Uploaded surface parameters.
    type Material;

    fn upload_mesh(&mut self, geometry: &RawGeometry) -> Self::Mesh;

    fn upload_material(&mut self, material: &Material) -> Self::Material;

    /// Frees the GPU buffers behind `mesh` immediately.
    fn release_mesh(&mut self, mesh: Self::Mesh);

    /// Frees the GPU buffers behind `material` immediately.
    fn release_material(&mut self, material: Self::Material);

    /// Resizes the backing store. Called only with non-empty sizes.
    fn resize(&mut self, size: SurfaceSize);

    /// Draws one frame.
    ///
    /// A surface that was lost and has been reconfigured reports
    /// [`PreviewError::SurfaceLost`]; the caller skips the frame.
    fn render(&mut self, scene: &SceneGraph<Self>) -> Result<(), PreviewError>;

    /// Clears the surface and tears down the GPU context.
    ///
    /// Every mesh and material must already have been released.
    fn release(self);
}

/// A drawable region a preview can attach to.
pub trait DrawSurface {
    type Backend: RenderBackend;

    /// Current pixel size of the region.
    fn size(&self) -> SurfaceSize;

    /// Creates the GPU context that draws into this surface.
    fn connect(&self) -> Result<Self::Backend, PreviewError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sizes_have_no_aspect() {
        assert_eq!(SurfaceSize::new(0, 400).aspect(), None);
        assert_eq!(SurfaceSize::new(400, 0).aspect(), None);
        assert_eq!(SurfaceSize::new(800, 400).aspect(), Some(2.0));
        assert!(SurfaceSize::default().is_empty());
    }
}
