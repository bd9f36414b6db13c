//! The continuous redraw loop and the idle motion it drives.
//!
//! The host owns the actual display-refresh callback (winit's
//! `RedrawRequested`). Each callback ticks the [`RenderLoop`]; while the loop
//! is live the host re-arms the next redraw, once cancelled every further tick
//! returns `None`, even if a callback was already queued.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Cancels a [`RenderLoop`] from outside the renderer.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    live: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.live.set(false);
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }
}

/// One scheduled frame of a live loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Zero-based frame counter.
    pub index: u64,
    /// Wall-clock time since the loop started.
    pub elapsed: Duration,
}

/// The single redraw task of an attached preview.
#[derive(Debug)]
pub struct RenderLoop {
    live: Rc<Cell<bool>>,
    started: Instant,
    frames: u64,
}

impl RenderLoop {
    pub fn start(now: Instant) -> Self {
        Self {
            live: Rc::new(Cell::new(true)),
            started: now,
            frames: 0,
        }
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            live: Rc::clone(&self.live),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn cancel(&self) {
        self.live.set(false);
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advances to the next frame, or `None` once cancelled.
    pub fn tick(&mut self, now: Instant) -> Option<FrameTick> {
        if !self.is_live() {
            return None;
        }
        let tick = FrameTick {
            index: self.frames,
            elapsed: now.saturating_duration_since(self.started),
        };
        self.frames += 1;
        Some(tick)
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The "live kiln" idle animation applied to the content group.
///
/// Yaw advances by a fixed step every frame, so spin speed follows the
/// display refresh rate. Tilt is a sine of wall-clock time, so it does not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdleMotion {
    /// Radians of yaw added per frame.
    pub spin_per_frame: f32,
    /// Peak tilt in radians.
    pub tilt_amplitude: f32,
    /// Angular frequency of the tilt, radians per second.
    pub tilt_rate: f32,
}

impl Default for IdleMotion {
    fn default() -> Self {
        Self {
            spin_per_frame: 0.005,
            tilt_amplitude: 0.1,
            tilt_rate: 1.0,
        }
    }
}

impl IdleMotion {
    /// Returns the `(yaw, tilt)` following `yaw` for `tick`.
    pub fn step(&self, yaw: f32, tick: FrameTick) -> (f32, f32) {
        let yaw = (yaw + self.spin_per_frame).rem_euclid(std::f32::consts::TAU);
        let tilt = (tick.elapsed.as_secs_f32() * self.tilt_rate).sin() * self.tilt_amplitude;
        (yaw, tilt)
    }
}
