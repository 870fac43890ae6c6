//! Startup configuration: window, projection, shader location, control rates and
//! the initial scene parameters.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::{
    CameraMode, DayNight, FogSettings, MovingObjectPose, ShadingModel, SpotlightAim,
    SurfaceAnimationParams,
};
use crate::view::shader::ProgramPaths;

pub const SHADER_DIR_VAR: &str = "FLAGSCAPE_SHADER_DIR";
pub const WIDTH_VAR: &str = "FLAGSCAPE_WIDTH";
pub const HEIGHT_VAR: &str = "FLAGSCAPE_HEIGHT";

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "flagscape".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

/// Rates of the continuous (held-key) controls, per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlConfig {
    pub move_speed: f32,
    pub turn_rate_deg: f32,
    pub aim_yaw_rate_deg: f32,
    pub aim_pitch_rate_deg: f32,
    pub day_night_rate: f32,
    /// Step of the discrete fog density keys.
    pub fog_step: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            turn_rate_deg: 90.0,
            aim_yaw_rate_deg: 45.0,
            aim_pitch_rate_deg: 30.0,
            day_night_rate: 0.5,
            fog_step: 0.01,
        }
    }
}

/// Values the scene starts from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneDefaults {
    pub pose: MovingObjectPose,
    pub camera: CameraMode,
    pub aim: SpotlightAim,
    pub fog: FogSettings,
    pub day_night: DayNight,
    pub shading: ShadingModel,
    pub surface: SurfaceAnimationParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub projection: ProjectionConfig,
    pub shader_dir: PathBuf,
    pub controls: ControlConfig,
    pub scene: SceneDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            projection: ProjectionConfig::default(),
            shader_dir: PathBuf::from("shaders"),
            controls: ControlConfig::default(),
            scene: SceneDefaults::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the known variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(dir) = lookup(SHADER_DIR_VAR) {
            config.shader_dir = PathBuf::from(dir);
        }
        if let Some(width) = lookup(WIDTH_VAR) {
            config.window.width = parse_dimension(WIDTH_VAR, &width)?;
        }
        if let Some(height) = lookup(HEIGHT_VAR) {
            config.window.height = parse_dimension(HEIGHT_VAR, &height)?;
        }
        Ok(config)
    }

    pub fn main_program_paths(&self) -> ProgramPaths {
        ProgramPaths::new(
            self.shader_dir.join("main_vertex.wgsl"),
            self.shader_dir.join("main_fragment.wgsl"),
        )
    }

    pub fn flag_program_paths(&self) -> ProgramPaths {
        ProgramPaths::new(
            self.shader_dir.join("flag_vertex.wgsl"),
            self.shader_dir.join("flag_fragment.wgsl"),
        )
        .with_tessellation(
            self.shader_dir.join("flag_tess_control.wgsl"),
            self.shader_dir.join("flag_tess_eval.wgsl"),
        )
    }
}

fn parse_dimension(name: &'static str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
