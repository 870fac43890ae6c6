use std::path::PathBuf;

use thiserror::Error;

use crate::view::StageKind;

/// Failures while turning shader sources into a linked program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("cannot read shader source {}: {source}", path.display())]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage of program `{program}` failed to compile:\n{log}")]
    Compile {
        program: String,
        stage: StageKind,
        log: String,
    },

    #[error("program `{program}` failed to link:\n{log}")]
    Link { program: String, log: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

/// Everything that can stop the renderer before the first frame.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("event loop creation failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture format")]
    NoSurfaceFormat,

    #[error(transparent)]
    Shader(#[from] ShaderError),
}
