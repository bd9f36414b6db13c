//! Lit mesh rendering with depth testing and 4x multisampling.
//!
//! [`MeshPass`] owns the pipeline, the per-frame scene uniforms and the
//! multisampled color and depth attachments. Each primitive brings its own
//! [`GpuMesh`] and [`GpuMaterial`]; the material carries a uniform buffer with
//! the primitive's model matrix and surface parameters, so every draw in a
//! pass reads its own data.
//!
//! # Bind Groups
//!
//! - **Group 0**: scene uniforms (view-projection, camera, fog, lights)
//! - **Group 1**: primitive uniforms (model and normal matrix, material)

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use crate::lighting::LightUniforms;
use crate::material::Material;
use crate::mesh::Vertex3d;
use crate::scene::SceneGraph;
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Frame-wide uniforms, uploaded once per frame.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub fog_color: [f32; 4],
    /// x: near, y: far.
    pub fog_range: [f32; 4],
    pub lights: LightUniforms,
}

impl SceneUniforms {
    pub fn new<B: crate::RenderBackend>(scene: &SceneGraph<B>) -> Self {
        Self {
            view_proj: scene.camera.view_projection().to_cols_array_2d(),
            camera_pos: scene.camera.position.extend(1.0).to_array(),
            fog_color: scene.fog.color.to_array(),
            fog_range: [scene.fog.near, scene.fog.far, 0.0, 0.0],
            lights: LightUniforms::from(&scene.lights),
        }
    }
}

/// Per-primitive uniforms.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PrimitiveUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    /// x: roughness, y: metalness.
    pub finish: [f32; 4],
}

impl PrimitiveUniforms {
    pub fn new(model: Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: material.color.to_array(),
            emissive: material.emissive.to_array(),
            finish: [material.roughness, material.metalness, 0.0, 0.0],
        }
    }
}

/// Geometry resident on the GPU.
#[derive(Debug)]
pub struct GpuMesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl GpuMesh {
    pub fn new(gpu: &GpuContext, geometry: &RawGeometry) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive Vertex Buffer"),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive Index Buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    /// Frees both buffers now rather than when the last reference drops.
    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// Surface parameters and placement of one primitive on the GPU.
#[derive(Debug)]
pub struct GpuMaterial {
    pub material: Material,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    /// Writes this frame's model matrix along with the material parameters.
    pub fn update(&self, gpu: &GpuContext, model: Mat4) {
        let uniforms = PrimitiveUniforms::new(model, &self.material);
        gpu.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn destroy(self) {
        self.buffer.destroy();
    }
}

/// Samples per pixel of the color and depth attachments.
pub const SAMPLE_COUNT: u32 = 4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const SHADER_SOURCE: &str = include_str!("shaders/preview.wgsl");

/// Descriptor for a multisampled attachment covering `size`.
fn attachment_descriptor(
    label: &'static str,
    size: (u32, u32),
    format: wgpu::TextureFormat,
) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: SAMPLE_COUNT,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

/// Multisampled color and depth attachments, resolved into the surface.
struct RenderTargets {
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    size: (u32, u32),
}

impl RenderTargets {
    fn new(gpu: &GpuContext) -> Self {
        let size = (gpu.config.width, gpu.config.height);
        let color_texture = gpu.device.create_texture(&attachment_descriptor(
            "MSAA Color Texture",
            size,
            gpu.config.format,
        ));
        let depth_texture = gpu.device.create_texture(&attachment_descriptor(
            "Depth Texture",
            size,
            DEPTH_FORMAT,
        ));

        Self {
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            color_texture,
            depth_texture,
            size,
        }
    }

    fn destroy(&self) {
        self.color_texture.destroy();
        self.depth_texture.destroy();
    }
}

/// Pipeline and shared resources for drawing the preview's primitives.
///
/// - Back-face culling with counter-clockwise front faces
/// - 4x multisampling, resolved into the surface texture
/// - 32-bit float depth buffer, `Less` comparison
/// - Attachments follow the surface size
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    primitive_layout: wgpu::BindGroupLayout,
    targets: RenderTargets,
}

impl MeshPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Preview Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        // Scene uniform buffer (group 0)
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_layout = uniform_layout(device, "Scene Bind Group Layout");
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        // Primitive uniform layout (group 1), one buffer per material
        let primitive_layout = uniform_layout(device, "Primitive Bind Group Layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Preview Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &primitive_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Preview Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: SAMPLE_COUNT,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            scene_buffer,
            scene_bind_group,
            primitive_layout,
            targets: RenderTargets::new(gpu),
        }
    }

    pub fn create_material(&self, gpu: &GpuContext, material: &Material) -> GpuMaterial {
        let uniforms = PrimitiveUniforms::new(Mat4::IDENTITY, material);
        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive Uniforms"),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Primitive Bind Group"),
            layout: &self.primitive_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        GpuMaterial {
            material: *material,
            buffer,
            bind_group,
        }
    }

    /// Recreates the attachments if the surface size changed.
    pub fn ensure_target_size(&mut self, gpu: &GpuContext) {
        if self.targets.size != (gpu.config.width, gpu.config.height) {
            self.targets.destroy();
            self.targets = RenderTargets::new(gpu);
        }
    }

    /// Frees the attachments now rather than when the pass drops.
    pub fn destroy(self) {
        self.targets.destroy();
        self.scene_buffer.destroy();
    }

    /// Uploads frame uniforms and every primitive's current world matrix.
    pub fn prepare<B>(&self, gpu: &GpuContext, scene: &SceneGraph<B>)
    where
        B: crate::RenderBackend<Material = GpuMaterial>,
    {
        let uniforms = SceneUniforms::new(scene);
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        for primitive in scene.content.iter() {
            primitive
                .material
                .update(gpu, scene.content.world_matrix(primitive));
        }
    }

    /// Clears to the scene background, draws the content group and resolves
    /// the samples into `target`.
    pub fn render<B>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &SceneGraph<B>,
    ) where
        B: crate::RenderBackend<Mesh = GpuMesh, Material = GpuMaterial>,
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Preview Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.targets.color_view,
                resolve_target: Some(target),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        for primitive in scene.content.iter() {
            let mesh = &primitive.mesh;
            render_pass.set_bind_group(1, &primitive.material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
