//! Error type shared by the renderer, its backends and the desktop host.

use thiserror::Error;

/// Everything that can go wrong while attaching, driving or detaching a
/// [`StagePreview`](crate::StagePreview).
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The drawable surface has no area, so there is nothing to attach to.
    #[error("surface has zero area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    /// `attach` was called on a renderer that already owns a render loop.
    #[error("renderer is already attached to a surface")]
    AlreadyAttached,

    /// An operation that needs a live scene was called before `attach`.
    #[error("renderer is not attached to a surface")]
    NotAttached,

    /// A stage index outside `0..=3` reached the integer boundary.
    #[error("invalid stage index {0}, expected 0..=3")]
    InvalidStage(usize),

    /// A stage given on the command line is not a number from 1 to 4.
    #[error("invalid stage {0:?}, expected a number from 1 to 4")]
    StageArgument(String),

    /// The surface could not provide a rendering backend at all.
    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface was lost")]
    SurfaceLost,

    #[error("GPU ran out of memory")]
    OutOfMemory,

    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl From<wgpu::SurfaceError> for PreviewError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost => PreviewError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => PreviewError::OutOfMemory,
            other => PreviewError::Surface(other),
        }
    }
}
