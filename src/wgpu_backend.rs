//! The [`RenderBackend`] that draws into a window through wgpu.

use crate::backend::{DrawSurface, RenderBackend, SurfaceSize};
use crate::error::PreviewError;
use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use crate::material::Material;
use crate::mesh_pass::{GpuMaterial, GpuMesh, MeshPass};
use crate::scene::SceneGraph;
use std::sync::Arc;
use winit::window::Window;

/// A GPU context and the mesh pass that draws the preview with it.
pub struct WgpuBackend {
    gpu: GpuContext,
    pass: MeshPass,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Result<Self, PreviewError> {
        let gpu = GpuContext::new(window)?;
        let pass = MeshPass::new(&gpu);
        Ok(Self { gpu, pass })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }
}

impl RenderBackend for WgpuBackend {
    type Mesh = GpuMesh;
    type Material = GpuMaterial;

    fn upload_mesh(&mut self, geometry: &RawGeometry) -> GpuMesh {
        GpuMesh::new(&self.gpu, geometry)
    }

    fn upload_material(&mut self, material: &Material) -> GpuMaterial {
        self.pass.create_material(&self.gpu, material)
    }

    fn release_mesh(&mut self, mesh: GpuMesh) {
        mesh.destroy();
    }

    fn release_material(&mut self, material: GpuMaterial) {
        material.destroy();
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.gpu.resize(size.width, size.height);
        self.pass.ensure_target_size(&self.gpu);
    }

    fn render(&mut self, scene: &SceneGraph<Self>) -> Result<(), PreviewError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Err(PreviewError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface acquire timed out");
                return Err(PreviewError::SurfaceLost);
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.pass.prepare(&self.gpu, scene);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Preview Encoder"),
            });
        self.pass.render(&mut encoder, &view, scene);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn release(self) {
        let Self { gpu, pass } = self;
        pass.destroy();
        gpu.release();
    }
}

/// A winit window as a [`DrawSurface`].
#[derive(Clone, Debug)]
pub struct WindowSurface(pub Arc<Window>);

impl DrawSurface for WindowSurface {
    type Backend = WgpuBackend;

    fn size(&self) -> SurfaceSize {
        let size = self.0.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn connect(&self) -> Result<WgpuBackend, PreviewError> {
        WgpuBackend::new(Arc::clone(&self.0))
    }
}
