use std::fs;
use std::path::{Path, PathBuf};

use super::backend::{GraphicsBackend, StageKind};
use super::uniforms::{UniformBlock, UniformLayout, UniformValue, Uniforms};
use crate::error::ShaderError;

/// Stage sources of one program. Tessellation is used only when both
/// tessellation sources are present and not blank.
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub tess_control: Option<String>,
    pub tess_eval: Option<String>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            tess_control: None,
            tess_eval: None,
        }
    }

    pub fn with_tessellation(mut self, control: impl Into<String>, eval: impl Into<String>) -> Self {
        self.tess_control = Some(control.into());
        self.tess_eval = Some(eval.into());
        self
    }

    pub fn tessellation(&self) -> Option<(&str, &str)> {
        let control = self.tess_control.as_deref().filter(|s| !s.trim().is_empty())?;
        let eval = self.tess_eval.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((control, eval))
    }

    /// Reads every configured file. Nothing is compiled here, so a missing file
    /// fails before any GPU work starts.
    pub fn load(paths: &ProgramPaths) -> Result<Self, ShaderError> {
        Ok(Self {
            vertex: read_source(&paths.vertex)?,
            fragment: read_source(&paths.fragment)?,
            tess_control: paths.tess_control.as_deref().map(read_source).transpose()?,
            tess_eval: paths.tess_eval.as_deref().map(read_source).transpose()?,
        })
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    let source = fs::read_to_string(path).map_err(|source| ShaderError::ResourceLoad {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "shader source loaded");
    Ok(source)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub tess_control: Option<PathBuf>,
    pub tess_eval: Option<PathBuf>,
}

impl ProgramPaths {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            tess_control: None,
            tess_eval: None,
        }
    }

    pub fn with_tessellation(mut self, control: impl Into<PathBuf>, eval: impl Into<PathBuf>) -> Self {
        self.tess_control = Some(control.into());
        self.tess_eval = Some(eval.into());
        self
    }
}

/// A linked GPU program together with the CPU copy of its uniforms.
pub struct ShaderProgram<B: GraphicsBackend> {
    label: String,
    raw: B::Program,
    uniforms: UniformBlock,
    tessellated: bool,
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    pub fn build(
        backend: &B,
        label: &str,
        sources: &ShaderSources,
        layout: UniformLayout,
    ) -> Result<Self, ShaderError> {
        let compile = |kind: StageKind, source: &str| {
            backend
                .compile_stage(kind, source, &layout)
                .map_err(|log| ShaderError::Compile {
                    program: label.to_string(),
                    stage: kind,
                    log,
                })
        };

        // stages already compiled are dropped, and so released, on every early return
        let mut stages = Vec::with_capacity(4);
        stages.push(compile(StageKind::Vertex, &sources.vertex)?);
        stages.push(compile(StageKind::Fragment, &sources.fragment)?);
        let tessellated = match sources.tessellation() {
            Some((control, eval)) => {
                stages.push(compile(StageKind::TessControl, control)?);
                stages.push(compile(StageKind::TessEval, eval)?);
                true
            }
            None => false,
        };

        let linked = backend.link_program(label, &stages, &layout);
        drop(stages);
        let raw = linked.map_err(|log| ShaderError::Link {
            program: label.to_string(),
            log,
        })?;

        tracing::info!(
            program = label,
            tessellated,
            uniforms = layout.fields().len(),
            uniform_bytes = layout.size(),
            "shader program linked"
        );
        Ok(Self {
            label: label.to_string(),
            raw,
            uniforms: UniformBlock::new(layout),
            tessellated,
        })
    }

    pub fn from_files(
        backend: &B,
        label: &str,
        paths: &ProgramPaths,
        layout: UniformLayout,
    ) -> Result<Self, ShaderError> {
        let sources = ShaderSources::load(paths)?;
        Self::build(backend, label, &sources, layout)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &B::Program {
        &self.raw
    }

    pub fn is_tessellated(&self) -> bool {
        self.tessellated
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.layout().contains(name)
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    /// Copy of the current uniform bytes, taken once per draw.
    pub fn snapshot(&self) -> Vec<u8> {
        self.uniforms.bytes().to_vec()
    }
}

impl<B: GraphicsBackend> Uniforms for ShaderProgram<B> {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.set_uniform(name, value);
    }
}
