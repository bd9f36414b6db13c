//! The stage preview renderer.
//!
//! [`StagePreview`] turns a [`Stage`] into a continuously animated 3D preview
//! on any [`DrawSurface`]. Its lifecycle is:
//!
//! 1. [`attach`](StagePreview::attach) builds the scene graph (camera, three
//!    lights, empty content group) and starts the render loop.
//! 2. [`set_stage`](StagePreview::set_stage) releases the current content and
//!    builds the new stage's primitives, synchronously.
//! 3. [`frame`](StagePreview::frame) is called once per display refresh.
//! 4. [`detach`](StagePreview::detach) cancels the loop and releases
//!    everything. Dropping the preview does the same.
//!
//! # Example
//!
//! ```
//! use kiln::{HeadlessSurface, PreviewConfig, Stage, StagePreview};
//! use std::time::Instant;
//!
//! let surface = HeadlessSurface::new(400, 400);
//! let mut preview = StagePreview::new(PreviewConfig::default());
//!
//! preview.attach(&surface)?;
//! preview.set_stage(Stage::DecoratedRing)?;
//! preview.frame(Instant::now())?;
//! assert_eq!(preview.content().map(|c| c.len()), Some(13));
//!
//! preview.detach();
//! assert_eq!(surface.ledger().snapshot().meshes_released, 13);
//! # Ok::<(), kiln::PreviewError>(())
//! ```

use crate::backend::{DrawSurface, RenderBackend, SurfaceSize};
use crate::camera::Camera;
use crate::error::PreviewError;
use crate::lighting::LightRig;
use crate::material::Color;
use crate::render_loop::{IdleMotion, LoopHandle, RenderLoop};
use crate::scene::{ContentGroup, Fog, SceneGraph};
use crate::stage::Stage;
use std::time::Instant;

/// Tunables of the preview. Defaults reproduce the kiln view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewConfig {
    pub camera: Camera,
    pub lights: LightRig,
    pub background: Color,
    pub fog: Fog,
    pub motion: IdleMotion,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            lights: LightRig::default(),
            background: Color::KILN,
            fog: Fog::default(),
            motion: IdleMotion::default(),
        }
    }
}

impl PreviewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Vertical field of view in degrees.
    pub fn fov(mut self, degrees: f32) -> Self {
        self.camera = self.camera.with_fov(degrees);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self.fog.color = color;
        self
    }

    /// Radians of yaw per frame.
    pub fn spin(mut self, per_frame: f32) -> Self {
        self.motion.spin_per_frame = per_frame;
        self
    }

    /// Tilt amplitude in radians and its angular frequency in radians per second.
    pub fn tilt(mut self, amplitude: f32, rate: f32) -> Self {
        self.motion.tilt_amplitude = amplitude;
        self.motion.tilt_rate = rate;
        self
    }
}

/// What happened on a call to [`StagePreview::frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Animation advanced and a frame was drawn.
    Rendered,
    /// Animation advanced but nothing was drawn (empty or lost surface).
    Skipped,
    /// The loop is cancelled or the preview is detached. Do not re-arm.
    Stopped,
}

impl FrameStatus {
    /// Whether the host should schedule another frame.
    pub fn keeps_running(self) -> bool {
        self != FrameStatus::Stopped
    }
}

/// Summary of what a [`StagePreview::detach`] call tore down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetachReport {
    /// Content primitives released by the detach itself.
    pub primitives_released: usize,
    /// Frames the render loop ticked while attached.
    pub frames: u64,
}

struct Attached<B: RenderBackend> {
    backend: B,
    scene: SceneGraph<B>,
    render_loop: RenderLoop,
    size: SurfaceSize,
    stage: Option<Stage>,
}

/// Renders one stage of the craft as a slowly turning 3D object.
pub struct StagePreview<B: RenderBackend> {
    config: PreviewConfig,
    attached: Option<Attached<B>>,
}

impl<B: RenderBackend> StagePreview<B> {
    /// Creates a detached preview.
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            attached: None,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Connects to `surface`, builds the scene graph and starts the render loop.
    ///
    /// Fails without side effects if the surface has no area, the backend
    /// cannot be created, or the preview is already attached.
    pub fn attach<S>(&mut self, surface: &S) -> Result<LoopHandle, PreviewError>
    where
        S: DrawSurface<Backend = B>,
    {
        if self.attached.is_some() {
            return Err(PreviewError::AlreadyAttached);
        }

        let size = surface.size();
        if size.is_empty() {
            return Err(PreviewError::EmptySurface {
                width: size.width,
                height: size.height,
            });
        }

        let backend = surface.connect()?;

        let mut camera = self.config.camera;
        camera.set_viewport(size.width, size.height);
        let scene = SceneGraph::new(
            camera,
            self.config.lights,
            self.config.background,
            self.config.fog,
        );

        let render_loop = RenderLoop::start(Instant::now());
        let handle = render_loop.handle();
        self.attached = Some(Attached {
            backend,
            scene,
            render_loop,
            size,
            stage: None,
        });

        log::info!("attached stage preview to {} surface", size);
        Ok(handle)
    }

    /// Replaces the content group with `stage`'s primitives.
    ///
    /// All previous primitives are released before the new ones are
    /// uploaded. Calling this with the current stage rebuilds it anyway.
    pub fn set_stage(&mut self, stage: Stage) -> Result<(), PreviewError> {
        let attached = self.attached.as_mut().ok_or(PreviewError::NotAttached)?;

        let content = &mut attached.scene.content;
        content.clear(&mut attached.backend);
        let specs = stage.blueprint(&mut rand::thread_rng());
        content.populate(&mut attached.backend, specs);
        attached.stage = Some(stage);

        log::info!("stage set to {} ({} primitives)", stage, content.len());
        Ok(())
    }

    /// [`set_stage`](Self::set_stage) from a raw index in `0..=3`.
    ///
    /// An out-of-range index is rejected and the content is left untouched.
    pub fn set_stage_index(&mut self, index: usize) -> Result<Stage, PreviewError> {
        let stage = Stage::try_from(index)?;
        self.set_stage(stage)?;
        Ok(stage)
    }

    /// The stage currently displayed, if any.
    pub fn stage(&self) -> Option<Stage> {
        self.attached.as_ref().and_then(|a| a.stage)
    }

    /// Follows a surface resize.
    ///
    /// Updates the camera aspect and the backing store; the loop, rotation
    /// and content are untouched. An empty size only pauses drawing.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(attached) = self.attached.as_mut() else {
            return;
        };

        let size = SurfaceSize::new(width, height);
        attached.size = size;
        if size.is_empty() {
            log::debug!("surface collapsed to {}, pausing draws", size);
            return;
        }

        attached.scene.camera.set_viewport(width, height);
        attached.backend.resize(size);
    }

    /// Current surface size, if attached.
    pub fn size(&self) -> Option<SurfaceSize> {
        self.attached.as_ref().map(|a| a.size)
    }

    /// Runs one iteration of the render loop.
    ///
    /// Advances the idle motion, then draws unless the surface is empty.
    /// The host should schedule another call while the returned status
    /// [`keeps_running`](FrameStatus::keeps_running).
    pub fn frame(&mut self, now: Instant) -> Result<FrameStatus, PreviewError> {
        let Some(attached) = self.attached.as_mut() else {
            return Ok(FrameStatus::Stopped);
        };
        let Some(tick) = attached.render_loop.tick(now) else {
            return Ok(FrameStatus::Stopped);
        };

        let content = &mut attached.scene.content;
        let (yaw, tilt) = self.config.motion.step(content.yaw(), tick);
        content.set_rotation(yaw, tilt);

        if attached.size.is_empty() {
            return Ok(FrameStatus::Skipped);
        }

        match attached.backend.render(&attached.scene) {
            Ok(()) => Ok(FrameStatus::Rendered),
            Err(PreviewError::SurfaceLost) => {
                log::warn!("surface lost on frame {}, skipping", tick.index);
                Ok(FrameStatus::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Cancels the loop, releases all content, the GPU context and the surface.
    ///
    /// Returns `None` if there was nothing to tear down, so it is safe to
    /// call repeatedly or on a preview that never attached.
    pub fn detach(&mut self) -> Option<DetachReport> {
        let Attached {
            mut backend,
            mut scene,
            render_loop,
            ..
        } = self.attached.take()?;

        render_loop.cancel();
        let primitives_released = scene.content.clear(&mut backend);
        drop(scene);
        backend.release();

        let report = DetachReport {
            primitives_released,
            frames: render_loop.frames(),
        };
        log::info!(
            "detached stage preview after {} frames, released {} primitives",
            report.frames,
            report.primitives_released
        );
        Some(report)
    }

    /// Handle that cancels the current render loop, if attached.
    pub fn loop_handle(&self) -> Option<LoopHandle> {
        self.attached.as_ref().map(|a| a.render_loop.handle())
    }

    pub fn scene(&self) -> Option<&SceneGraph<B>> {
        self.attached.as_ref().map(|a| &a.scene)
    }

    pub fn content(&self) -> Option<&ContentGroup<B>> {
        self.scene().map(|s| &s.content)
    }
}

impl<B: RenderBackend> Drop for StagePreview<B> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, HeadlessSurface};
    use crate::stage::PrimitiveKind;
    use std::time::Duration;

    fn attached(width: u32, height: u32) -> (HeadlessSurface, StagePreview<HeadlessBackend>) {
        let surface = HeadlessSurface::new(width, height);
        let mut preview = StagePreview::new(PreviewConfig::default());
        preview.attach(&surface).unwrap();
        (surface, preview)
    }

    #[test]
    fn attach_to_empty_surface_fails_without_starting() {
        let surface = HeadlessSurface::new(0, 300);
        let mut preview = StagePreview::new(PreviewConfig::default());

        let err = preview.attach(&surface).unwrap_err();
        assert!(matches!(err, PreviewError::EmptySurface { width: 0, height: 300 }));
        assert!(!preview.is_attached());
        assert_eq!(surface.ledger().snapshot().connections, 0);

        // Retrying on a usable surface works.
        let surface = HeadlessSurface::new(300, 300);
        assert!(preview.attach(&surface).is_ok());
    }

    #[test]
    fn failed_connection_leaves_preview_detached() {
        let surface = HeadlessSurface::unavailable(400, 400);
        let mut preview = StagePreview::new(PreviewConfig::default());

        assert!(matches!(
            preview.attach(&surface),
            Err(PreviewError::BackendUnavailable(_))
        ));
        assert!(!preview.is_attached());
        assert!(preview.loop_handle().is_none());
        assert_eq!(preview.frame(Instant::now()).unwrap(), FrameStatus::Stopped);
    }

    #[test]
    fn second_attach_is_rejected() {
        let (_surface, mut preview) = attached(200, 200);
        let other = HeadlessSurface::new(200, 200);

        assert!(matches!(
            preview.attach(&other),
            Err(PreviewError::AlreadyAttached)
        ));
        assert_eq!(other.ledger().snapshot().connections, 0);
    }

    #[test]
    fn set_stage_requires_attach() {
        let mut preview: StagePreview<HeadlessBackend> =
            StagePreview::new(PreviewConfig::default());
        assert!(matches!(
            preview.set_stage(Stage::PlainRing),
            Err(PreviewError::NotAttached)
        ));
    }

    #[test]
    fn invalid_index_leaves_content_untouched() {
        let (surface, mut preview) = attached(200, 200);
        preview.set_stage(Stage::HeatedRod).unwrap();
        let before = surface.ledger().snapshot();

        assert!(matches!(
            preview.set_stage_index(7),
            Err(PreviewError::InvalidStage(7))
        ));
        assert_eq!(preview.stage(), Some(Stage::HeatedRod));
        assert_eq!(preview.content().unwrap().kinds(), vec![PrimitiveKind::Rod]);
        assert_eq!(surface.ledger().snapshot(), before);
    }

    #[test]
    fn lights_and_camera_survive_stage_changes() {
        let (_surface, mut preview) = attached(300, 150);
        let camera = preview.scene().unwrap().camera;
        let lights = preview.scene().unwrap().lights;
        assert_eq!(camera.aspect, 2.0);

        for stage in Stage::ALL {
            preview.set_stage(stage).unwrap();
            assert_eq!(preview.scene().unwrap().camera, camera);
            assert_eq!(preview.scene().unwrap().lights, lights);
        }
    }

    #[test]
    fn configured_camera_reaches_the_scene() {
        let surface = HeadlessSurface::new(200, 100);
        let camera = Camera::new().at(0.0, 1.0, 8.0).looking_at(0.0, 0.5, 0.0);
        let mut preview = StagePreview::new(PreviewConfig::new().camera(camera).fov(60.0));
        preview.attach(&surface).unwrap();

        let scene = preview.scene().unwrap();
        assert_eq!(scene.camera.position, glam::Vec3::new(0.0, 1.0, 8.0));
        assert_eq!(scene.camera.target, glam::Vec3::new(0.0, 0.5, 0.0));
        assert!((scene.camera.fov - 60f32.to_radians()).abs() < 1e-6);
        assert_eq!(scene.camera.aspect, 2.0);
    }

    #[test]
    fn empty_surface_skips_draws_but_keeps_animating() {
        let (surface, mut preview) = attached(200, 200);
        preview.set_stage(Stage::PlainRing).unwrap();
        let start = Instant::now();

        assert_eq!(preview.frame(start).unwrap(), FrameStatus::Rendered);
        let aspect = preview.scene().unwrap().camera.aspect;

        preview.resize(0, 200);
        let yaw = preview.content().unwrap().yaw();
        assert_eq!(
            preview.frame(start + Duration::from_millis(16)).unwrap(),
            FrameStatus::Skipped
        );
        assert!(preview.content().unwrap().yaw() > yaw);
        assert_eq!(preview.scene().unwrap().camera.aspect, aspect);
        assert_eq!(surface.ledger().snapshot().frames_rendered, 1);

        preview.resize(400, 200);
        assert_eq!(
            preview.frame(start + Duration::from_millis(32)).unwrap(),
            FrameStatus::Rendered
        );
        assert_eq!(preview.scene().unwrap().camera.aspect, 2.0);
    }

    #[test]
    fn cancelled_handle_stops_frames() {
        let (surface, mut preview) = attached(200, 200);
        let handle = preview.loop_handle().unwrap();

        handle.cancel();
        assert_eq!(preview.frame(Instant::now()).unwrap(), FrameStatus::Stopped);
        assert!(!FrameStatus::Stopped.keeps_running());
        assert_eq!(surface.ledger().snapshot().frames_rendered, 0);
    }

    #[test]
    fn detach_is_idempotent() {
        let (surface, mut preview) = attached(200, 200);
        let handle = preview.loop_handle().unwrap();

        assert!(preview.detach().is_some());
        assert!(!handle.is_live());
        assert!(preview.detach().is_none());
        assert_eq!(surface.ledger().snapshot().contexts_released, 1);

        let mut never: StagePreview<HeadlessBackend> = StagePreview::new(PreviewConfig::default());
        assert!(never.detach().is_none());
    }

    #[test]
    fn dropping_an_attached_preview_releases_everything() {
        let surface = HeadlessSurface::new(200, 200);
        {
            let mut preview = StagePreview::new(PreviewConfig::default());
            preview.attach(&surface).unwrap();
            preview.set_stage(Stage::DecoratedRing).unwrap();
        }
        let ledger = surface.ledger().snapshot();
        assert_eq!(ledger.live_meshes(), 0);
        assert_eq!(ledger.live_materials(), 0);
        assert_eq!(ledger.contexts_released, 1);
    }
}
