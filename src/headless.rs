//! A backend that draws nothing and keeps books instead.
//!
//! [`HeadlessSurface`] stands in for a window. The [`HeadlessBackend`] it
//! connects records every upload, release, resize and frame in a shared
//! [`ResourceLedger`], which stays readable after the backend itself has been
//! released. Useful for tests and for driving a preview without a GPU.

use crate::backend::{DrawSurface, RenderBackend, SurfaceSize};
use crate::error::PreviewError;
use crate::geometry::RawGeometry;
use crate::material::{Finish, Material};
use crate::scene::SceneGraph;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Counters kept by a [`ResourceLedger`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub connections: usize,
    pub contexts_released: usize,
    pub meshes_uploaded: usize,
    pub meshes_released: usize,
    pub materials_uploaded: usize,
    pub materials_released: usize,
    pub resizes: usize,
    pub frames_rendered: usize,
    /// Primitives drawn by the most recent frame.
    pub last_draw_count: usize,
    pub backing_size: SurfaceSize,
    /// Whether the surface was cleared on release.
    pub cleared: bool,
}

impl LedgerSnapshot {
    pub fn live_meshes(&self) -> usize {
        self.meshes_uploaded - self.meshes_released
    }

    pub fn live_materials(&self) -> usize {
        self.materials_uploaded - self.materials_released
    }
}

/// Shared, cloneable view of a headless backend's bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger(Rc<RefCell<LedgerSnapshot>>);

impl ResourceLedger {
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.0.borrow().clone()
    }

    fn record(&self, f: impl FnOnce(&mut LedgerSnapshot)) {
        f(&mut self.0.borrow_mut());
    }
}

/// An off-screen drawable region of a fixed size.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: SurfaceSize,
    ledger: ResourceLedger,
    available: bool,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            ledger: ResourceLedger::default(),
            available: true,
        }
    }

    /// A surface whose backend can never be created.
    pub fn unavailable(width: u32, height: u32) -> Self {
        Self {
            available: false,
            ..Self::new(width, height)
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }
}

impl DrawSurface for HeadlessSurface {
    type Backend = HeadlessBackend;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn connect(&self) -> Result<HeadlessBackend, PreviewError> {
        if !self.available {
            return Err(PreviewError::BackendUnavailable(
                "headless surface marked unavailable".into(),
            ));
        }
        self.ledger.record(|l| {
            l.connections += 1;
            l.backing_size = self.size;
            l.cleared = false;
        });
        Ok(HeadlessBackend {
            ledger: self.ledger.clone(),
            next_id: 0,
            live: HashSet::new(),
        })
    }
}

#[derive(Debug)]
pub struct HeadlessMesh {
    id: u64,
    pub triangles: usize,
}

#[derive(Debug)]
pub struct HeadlessMaterial {
    id: u64,
    pub finish: Finish,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    ledger: ResourceLedger,
    next_id: u64,
    live: HashSet<u64>,
}

impl HeadlessBackend {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    fn free(&mut self, id: u64) {
        let was_live = self.live.remove(&id);
        debug_assert!(was_live, "resource {id} released twice");
    }
}

impl RenderBackend for HeadlessBackend {
    type Mesh = HeadlessMesh;
    type Material = HeadlessMaterial;

    fn upload_mesh(&mut self, geometry: &RawGeometry) -> HeadlessMesh {
        self.ledger.record(|l| l.meshes_uploaded += 1);
        HeadlessMesh {
            id: self.allocate(),
            triangles: geometry.triangle_count(),
        }
    }

    fn upload_material(&mut self, material: &Material) -> HeadlessMaterial {
        self.ledger.record(|l| l.materials_uploaded += 1);
        HeadlessMaterial {
            id: self.allocate(),
            finish: material.finish,
        }
    }

    fn release_mesh(&mut self, mesh: HeadlessMesh) {
        self.free(mesh.id);
        self.ledger.record(|l| l.meshes_released += 1);
    }

    fn release_material(&mut self, material: HeadlessMaterial) {
        self.free(material.id);
        self.ledger.record(|l| l.materials_released += 1);
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.ledger.record(|l| {
            l.resizes += 1;
            l.backing_size = size;
        });
    }

    fn render(&mut self, scene: &SceneGraph<Self>) -> Result<(), PreviewError> {
        let drawn = scene.content.len();
        self.ledger.record(|l| {
            l.frames_rendered += 1;
            l.last_draw_count = drawn;
        });
        Ok(())
    }

    fn release(self) {
        if !self.live.is_empty() {
            log::warn!(
                "headless context released with {} live resources",
                self.live.len()
            );
        }
        self.ledger.record(|l| {
            l.contexts_released += 1;
            l.cleared = true;
        });
    }
}
