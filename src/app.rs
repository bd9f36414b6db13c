//! Desktop host: one window showing a [`StagePreview`].
//!
//! Keys `1`-`4` pick a stage, `←`/`→` cycle through them, and `Esc` or closing
//! the window detaches the preview and exits.

use crate::error::PreviewError;
use crate::preview::{PreviewConfig, StagePreview};
use crate::stage::Stage;
use crate::wgpu_backend::{WgpuBackend, WindowSurface};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Configuration for the host window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Stage shown right after the window opens.
    pub stage: Stage,
    pub preview: PreviewConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Kiln".to_string(),
            width: 800,
            height: 600,
            stage: Stage::RawLump,
            preview: PreviewConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn preview(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }

    fn window_title(&self, stage: Stage) -> String {
        format!("{} - {}", self.title, stage.title())
    }
}

/// Parses a 1-based stage number as typed on the command line.
///
/// `0` and non-numeric input are rejected outright; numbers past the last
/// stage go through the same index check as
/// [`StagePreview::set_stage_index`].
pub fn parse_stage_arg(arg: &str) -> Result<Stage, PreviewError> {
    let number: usize = arg
        .trim()
        .parse()
        .map_err(|_| PreviewError::StageArgument(arg.to_string()))?;
    let index = number
        .checked_sub(1)
        .ok_or_else(|| PreviewError::StageArgument(arg.to_string()))?;
    Stage::try_from(index)
}

/// Opens the preview window with default settings and blocks until it closes.
pub fn run() -> Result<(), PreviewError> {
    run_with_config(AppConfig::default())
}

/// Opens the preview window with custom configuration.
///
/// # Example
/// ```no_run
/// use kiln::{AppConfig, Stage};
///
/// kiln::run_with_config(AppConfig::new().size(1024, 768).stage(Stage::DecoratedRing))?;
/// # Ok::<(), kiln::PreviewError>(())
/// ```
pub fn run_with_config(config: AppConfig) -> Result<(), PreviewError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = KilnApp {
        preview: StagePreview::new(config.preview),
        config,
        window: None,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct KilnApp {
    config: AppConfig,
    preview: StagePreview<WgpuBackend>,
    window: Option<Arc<Window>>,
    error: Option<PreviewError>,
}

impl KilnApp {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), PreviewError> {
        let attrs = WindowAttributes::default()
            .with_title(self.config.window_title(self.config.stage))
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        self.preview.attach(&WindowSurface(Arc::clone(&window)))?;
        self.preview.set_stage(self.config.stage)?;

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn show(&mut self, stage: Stage) -> Result<(), PreviewError> {
        self.preview.set_stage(stage)?;
        if let Some(window) = &self.window {
            window.set_title(&self.config.window_title(stage));
        }
        Ok(())
    }

    fn handle_key(
        &mut self,
        event_loop: &ActiveEventLoop,
        key: KeyCode,
    ) -> Result<(), PreviewError> {
        let current = self.preview.stage().unwrap_or(self.config.stage);
        let stage = match key {
            KeyCode::Digit1 => Stage::RawLump,
            KeyCode::Digit2 => Stage::HeatedRod,
            KeyCode::Digit3 => Stage::PlainRing,
            KeyCode::Digit4 => Stage::DecoratedRing,
            KeyCode::ArrowRight => current.next(),
            KeyCode::ArrowLeft => current.previous(),
            KeyCode::Escape => {
                self.shutdown(event_loop);
                return Ok(());
            }
            _ => return Ok(()),
        };
        self.show(stage)
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.preview.detach();
        self.window = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: PreviewError) {
        log::error!("preview failed: {}", error);
        self.error = Some(error);
        self.shutdown(event_loop);
    }
}

impl ApplicationHandler for KilnApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                self.preview.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Err(e) = self.handle_key(event_loop, key) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::RedrawRequested => match self.preview.frame(Instant::now()) {
                Ok(status) if status.keeps_running() => {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                Ok(_) => {}
                Err(e) => self.fail(event_loop, e),
            },
            _ => {}
        }
    }
}
