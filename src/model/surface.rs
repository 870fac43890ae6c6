use glam::{Vec2, Vec3};

use super::uniforms::Uniforms;

pub const MIN_TESS_LEVEL: u32 = 2;
pub const MAX_TESS_LEVEL: u32 = 64;
pub const TESS_STEP: u32 = 2;
pub const WIND_STEP: f32 = 0.1;

/// Top half of the cloth.
pub const FLAG_COLOR_TOP: Vec3 = Vec3::new(1.0, 1.0, 1.0);
/// Bottom half of the cloth.
pub const FLAG_COLOR_BOTTOM: Vec3 = Vec3::new(0.9, 0.1, 0.2);

/// Inputs of the GPU-side flag animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceAnimationParams {
    tess_level: u32,
    wind_strength: f32,
    pub wind_direction: Vec2,
    /// Seconds since startup.
    pub time: f32,
}

impl Default for SurfaceAnimationParams {
    fn default() -> Self {
        Self {
            tess_level: 16,
            wind_strength: 0.3,
            wind_direction: Vec2::new(1.0, 0.3),
            time: 0.0,
        }
    }
}

impl SurfaceAnimationParams {
    pub fn new(tess_level: u32, wind_strength: f32) -> Self {
        Self {
            tess_level: tess_level.clamp(MIN_TESS_LEVEL, MAX_TESS_LEVEL),
            wind_strength: wind_strength.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    pub fn tess_level(&self) -> u32 {
        self.tess_level
    }

    pub fn wind_strength(&self) -> f32 {
        self.wind_strength
    }

    pub fn raise_tessellation(&mut self) {
        self.tess_level = (self.tess_level + TESS_STEP).min(MAX_TESS_LEVEL);
    }

    pub fn lower_tessellation(&mut self) {
        self.tess_level = self.tess_level.saturating_sub(TESS_STEP).max(MIN_TESS_LEVEL);
    }

    pub fn strengthen_wind(&mut self) {
        self.wind_strength = (self.wind_strength + WIND_STEP).min(1.0);
    }

    pub fn weaken_wind(&mut self) {
        self.wind_strength = (self.wind_strength - WIND_STEP).max(0.0);
    }

    pub fn apply(&self, target: &mut impl Uniforms) {
        target.set_float("time", self.time);
        target.set_float("windStrength", self.wind_strength);
        target.set_vec2("windDirection", self.wind_direction);
        target.set_int("tessLevelOuter", self.tess_level as i32);
        target.set_int("tessLevelInner", self.tess_level as i32);
        target.set_bool("useFlagColors", true);
        target.set_vec3("flagColor1", FLAG_COLOR_TOP);
        target.set_vec3("flagColor2", FLAG_COLOR_BOTTOM);
    }
}
