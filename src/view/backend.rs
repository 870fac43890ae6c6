//! The set of GPU operations the renderer core relies on.
//!
//! Handles returned by a backend own their GPU resources: dropping a stage,
//! program or mesh releases it.

use std::fmt;

use glam::Vec3;

use super::uniforms::UniformLayout;
use crate::model::mesh::{MeshData, PatchData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
    TessControl,
    TessEval,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
            StageKind::TessControl => "tessellation-control",
            StageKind::TessEval => "tessellation-evaluation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Culling {
    Back,
    None,
}

pub trait GraphicsBackend {
    type Stage;
    type Program;
    type Mesh;
    type Error: std::error::Error + 'static;

    /// Compiles one stage against the program's uniform struct. `Err` carries the
    /// compiler diagnostic.
    fn compile_stage(
        &self,
        kind: StageKind,
        source: &str,
        uniforms: &UniformLayout,
    ) -> Result<Self::Stage, String>;

    /// Links compiled stages. A program with tessellation stages draws patches.
    fn link_program(
        &self,
        label: &str,
        stages: &[Self::Stage],
        uniforms: &UniformLayout,
    ) -> Result<Self::Program, String>;

    fn upload_mesh(&self, label: &str, mesh: &MeshData) -> Self::Mesh;

    fn upload_patch(&self, label: &str, patch: &PatchData) -> Self::Mesh;

    /// Executes every pass in order and presents the result.
    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), Self::Error>;
}

pub struct DrawSubmission<'a, B: GraphicsBackend + ?Sized> {
    pub program: &'a B::Program,
    pub mesh: &'a B::Mesh,
    /// Snapshot of the program's uniform block for this draw.
    pub uniforms: &'a [u8],
    pub culling: Culling,
}

pub struct PassSubmission<'a, B: GraphicsBackend + ?Sized> {
    pub label: &'static str,
    pub draws: Vec<DrawSubmission<'a, B>>,
}

pub struct FrameSubmission<'a, B: GraphicsBackend + ?Sized> {
    pub clear_color: Vec3,
    pub passes: Vec<PassSubmission<'a, B>>,
}

impl<B: GraphicsBackend + ?Sized> FrameSubmission<'_, B> {
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }
}
