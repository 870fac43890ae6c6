// VIEW: GPU backend, shader programs and frame recording
pub mod backend;
pub mod gpu_init;
pub mod render;
pub mod shader;
pub mod uniforms;
pub mod wgpu_backend;

#[cfg(test)]
pub mod mock;

pub use backend::{Culling, FrameSubmission, GraphicsBackend, StageKind};
pub use gpu_init::GpuContext;
pub use render::{FramePlan, Renderer};
pub use shader::{ProgramPaths, ShaderProgram, ShaderSources};
pub use uniforms::{UniformBlock, UniformLayout, UniformValue, Uniforms};
pub use wgpu_backend::WgpuBackend;
