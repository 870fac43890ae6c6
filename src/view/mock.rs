//! Recording backend used by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec3;
use thiserror::Error;

use super::backend::{Culling, FrameSubmission, GraphicsBackend, StageKind};
use super::uniforms::UniformLayout;
use crate::model::mesh::{MeshData, PatchData};

/// Counts every resource the backend hands out and takes back.
#[derive(Debug, Default)]
pub struct Ledger {
    stages_compiled: Cell<usize>,
    stages_released: Cell<usize>,
    programs_linked: Cell<usize>,
    programs_released: Cell<usize>,
    meshes_uploaded: Cell<usize>,
    meshes_released: Cell<usize>,
    compiled_kinds: RefCell<Vec<StageKind>>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl Ledger {
    pub fn stages_compiled(&self) -> usize {
        self.stages_compiled.get()
    }

    pub fn stages_released(&self) -> usize {
        self.stages_released.get()
    }

    pub fn stages_alive(&self) -> usize {
        self.stages_compiled.get() - self.stages_released.get()
    }

    pub fn programs_linked(&self) -> usize {
        self.programs_linked.get()
    }

    pub fn programs_alive(&self) -> usize {
        self.programs_linked.get() - self.programs_released.get()
    }

    pub fn meshes_uploaded(&self) -> usize {
        self.meshes_uploaded.get()
    }

    pub fn meshes_alive(&self) -> usize {
        self.meshes_uploaded.get() - self.meshes_released.get()
    }

    pub fn compiled_kinds(&self) -> Vec<StageKind> {
        self.compiled_kinds.borrow().clone()
    }
}

#[derive(Debug)]
pub struct MockStage {
    pub kind: StageKind,
    ledger: Rc<Ledger>,
}

impl Drop for MockStage {
    fn drop(&mut self) {
        bump(&self.ledger.stages_released);
    }
}

#[derive(Debug)]
pub struct MockProgram {
    pub label: String,
    pub tessellated: bool,
    pub uniform_size: usize,
    ledger: Rc<Ledger>,
}

impl Drop for MockProgram {
    fn drop(&mut self) {
        bump(&self.ledger.programs_released);
    }
}

#[derive(Debug)]
pub struct MockMesh {
    pub label: String,
    pub patch: bool,
    /// Indices for triangle meshes, control points for patches.
    pub element_count: u32,
    ledger: Rc<Ledger>,
}

impl Drop for MockMesh {
    fn drop(&mut self) {
        bump(&self.ledger.meshes_released);
    }
}

#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub program: String,
    pub mesh: String,
    pub culling: Culling,
    pub uniforms: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RecordedPass {
    pub label: &'static str,
    pub draws: Vec<RecordedDraw>,
}

#[derive(Debug, Clone)]
pub struct RecordedFrame {
    pub clear_color: Vec3,
    pub passes: Vec<RecordedPass>,
}

#[derive(Debug, Error)]
#[error("mock surface lost")]
pub struct MockError;

#[derive(Debug, Default)]
pub struct MockBackend {
    pub ledger: Rc<Ledger>,
    pub fail_compile: Option<StageKind>,
    pub fail_link: bool,
    pub fail_submit: bool,
    pub frames: Vec<RecordedFrame>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }
}

impl GraphicsBackend for MockBackend {
    type Stage = MockStage;
    type Program = MockProgram;
    type Mesh = MockMesh;
    type Error = MockError;

    fn compile_stage(
        &self,
        kind: StageKind,
        source: &str,
        _uniforms: &UniformLayout,
    ) -> Result<MockStage, String> {
        if self.fail_compile == Some(kind) || source.trim().is_empty() {
            return Err(format!("{kind}: syntax error at 1:1"));
        }
        bump(&self.ledger.stages_compiled);
        self.ledger.compiled_kinds.borrow_mut().push(kind);
        Ok(MockStage {
            kind,
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn link_program(
        &self,
        label: &str,
        stages: &[MockStage],
        uniforms: &UniformLayout,
    ) -> Result<MockProgram, String> {
        if self.fail_link {
            return Err(format!("{label}: unresolved symbol `main`"));
        }
        bump(&self.ledger.programs_linked);
        Ok(MockProgram {
            label: label.to_string(),
            tessellated: stages.iter().any(|s| s.kind == StageKind::TessEval),
            uniform_size: uniforms.size(),
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn upload_mesh(&self, label: &str, mesh: &MeshData) -> MockMesh {
        bump(&self.ledger.meshes_uploaded);
        MockMesh {
            label: label.to_string(),
            patch: false,
            element_count: mesh.index_count() as u32,
            ledger: Rc::clone(&self.ledger),
        }
    }

    fn upload_patch(&self, label: &str, patch: &PatchData) -> MockMesh {
        bump(&self.ledger.meshes_uploaded);
        MockMesh {
            label: label.to_string(),
            patch: true,
            element_count: patch.control_point_count(),
            ledger: Rc::clone(&self.ledger),
        }
    }

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), MockError> {
        if self.fail_submit {
            return Err(MockError);
        }
        let passes = frame
            .passes
            .iter()
            .map(|pass| RecordedPass {
                label: pass.label,
                draws: pass
                    .draws
                    .iter()
                    .map(|draw| RecordedDraw {
                        program: draw.program.label.clone(),
                        mesh: draw.mesh.label.clone(),
                        culling: draw.culling,
                        uniforms: draw.uniforms.to_vec(),
                    })
                    .collect(),
            })
            .collect();
        self.frames.push(RecordedFrame {
            clear_color: frame.clear_color,
            passes,
        });
        Ok(())
    }
}
