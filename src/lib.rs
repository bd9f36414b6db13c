//! # Kiln
//!
//! **A live 3D preview of the stages of lac bangle making.**
//!
//! A [`StagePreview`] attaches to a drawable surface, builds a small lit scene
//! (camera, ambient, key and ember lights, fog) and keeps an object slowly
//! turning in it, as if sitting in a glowing kiln. The object shown depends on
//! the selected [`Stage`]:
//!
//! | Stage | Content |
//! |-------|---------|
//! | [`Stage::RawLump`] | an irregular, slightly flattened lump of raw lac |
//! | [`Stage::HeatedRod`] | a glowing horizontal rod |
//! | [`Stage::PlainRing`] | a polished bangle |
//! | [`Stage::DecoratedRing`] | the bangle with twelve inset stones |
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), kiln::PreviewError> {
//!     kiln::run_with_config(kiln::AppConfig::new().stage(kiln::Stage::DecoratedRing))
//! }
//! ```
//!
//! Drawing goes through a [`RenderBackend`]. [`WgpuBackend`] draws into a
//! winit window; [`HeadlessBackend`] only records what it was asked to do and
//! is what the tests run against.

mod app;
mod backend;
mod camera;
mod error;
mod geometry;
mod gpu;
mod headless;
mod lighting;
mod material;
mod mesh;
mod mesh_pass;
mod preview;
mod render_loop;
mod scene;
mod stage;
mod wgpu_backend;

pub use app::{AppConfig, parse_stage_arg, run, run_with_config};
pub use backend::{DrawSurface, RenderBackend, SurfaceSize};
pub use camera::Camera;
pub use error::PreviewError;
pub use geometry::RawGeometry;
pub use gpu::GpuContext;
pub use headless::{
    HeadlessBackend, HeadlessMaterial, HeadlessMesh, HeadlessSurface, LedgerSnapshot,
    ResourceLedger,
};
pub use lighting::{AmbientLight, DirectionalLight, LightRig, PointLight};
pub use material::{Color, Finish, Material};
pub use mesh::{Transform, Vertex3d};
pub use mesh_pass::{GpuMaterial, GpuMesh, MeshPass};
pub use preview::{DetachReport, FrameStatus, PreviewConfig, StagePreview};
pub use render_loop::{FrameTick, IdleMotion, LoopHandle, RenderLoop};
pub use scene::{ContentGroup, Fog, Primitive, SceneGraph};
pub use stage::{PrimitiveKind, PrimitiveSpec, STONE_COUNT, STONE_ORBIT, Stage};
pub use wgpu_backend::{WgpuBackend, WindowSurface};

// Re-export math types so callers don't need a direct glam dependency.
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
