use std::collections::HashSet;

use crate::config::{ControlConfig, SceneDefaults};
use crate::model::{
    CameraMode, CameraRig, DayNight, FogSettings, MovingObjectPose, ShadingModel, SpotlightAim,
    SurfaceAnimationParams,
};

use super::input::{Action, Control, HELD_ORDER};

/// Elapsed time since startup and since the previous frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
}

/// All mutable scene state, owned by the frame loop.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pose: MovingObjectPose,
    pub camera: CameraRig,
    pub aim: SpotlightAim,
    pub fog: FogSettings,
    pub day_night: DayNight,
    pub shading: ShadingModel,
    pub surface: SurfaceAnimationParams,
    pub elapsed: f32,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&SceneDefaults::default())
    }
}

impl AppState {
    pub fn new(defaults: &SceneDefaults) -> Self {
        Self {
            pose: defaults.pose,
            camera: CameraRig::new(defaults.camera),
            aim: defaults.aim,
            fog: defaults.fog,
            day_night: defaults.day_night,
            shading: defaults.shading,
            surface: defaults.surface,
            elapsed: 0.0,
        }
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera.mode()
    }

    /// Applies a discrete action. Exit is handled by the frame loop.
    pub fn apply_action(&mut self, action: Action, controls: &ControlConfig) {
        match action {
            Action::SetCamera(mode) => {
                if self.camera.set_mode(mode) {
                    tracing::info!(%mode, "camera mode");
                }
            }
            Action::ToggleFog => {
                self.fog.toggle();
                tracing::info!(enabled = self.fog.enabled, "fog");
            }
            Action::ToggleShading => {
                self.shading = self.shading.toggled();
                tracing::info!(model = %self.shading, "shading");
            }
            Action::ToggleDayNight => {
                self.day_night.toggle();
                let time_of_day = if self.day_night.is_day() { "day" } else { "night" };
                tracing::info!(time_of_day, "day/night toggled");
            }
            Action::FogDensityUp => {
                self.fog.adjust_density(controls.fog_step);
                tracing::info!(density = self.fog.density, "fog density");
            }
            Action::FogDensityDown => {
                self.fog.adjust_density(-controls.fog_step);
                tracing::info!(density = self.fog.density, "fog density");
            }
            Action::TessellationUp => {
                self.surface.raise_tessellation();
                tracing::info!(level = self.surface.tess_level(), "tessellation level");
            }
            Action::TessellationDown => {
                self.surface.lower_tessellation();
                tracing::info!(level = self.surface.tess_level(), "tessellation level");
            }
            Action::WindUp => {
                self.surface.strengthen_wind();
                tracing::info!(strength = self.surface.wind_strength(), "wind");
            }
            Action::WindDown => {
                self.surface.weaken_wind();
                tracing::info!(strength = self.surface.wind_strength(), "wind");
            }
            Action::Exit => {}
        }
    }

    /// Advances time and applies every held control for one frame, in
    /// [`HELD_ORDER`].
    pub fn update(&mut self, time: FrameTime, held: &HashSet<Control>, controls: &ControlConfig) {
        self.elapsed = time.elapsed;
        self.surface.time = time.elapsed;

        let dt = time.delta;
        for control in HELD_ORDER.iter().filter(|c| held.contains(*c)) {
            match control {
                Control::MoveForward => self.pose.advance(controls.move_speed * dt),
                Control::MoveBackward => self.pose.advance(-controls.move_speed * dt),
                Control::TurnLeft => self.pose.turn(controls.turn_rate_deg * dt),
                Control::TurnRight => self.pose.turn(-controls.turn_rate_deg * dt),
                Control::AimLeft => self.aim.turn(controls.aim_yaw_rate_deg * dt, 0.0),
                Control::AimRight => self.aim.turn(-controls.aim_yaw_rate_deg * dt, 0.0),
                Control::AimUp => self.aim.turn(0.0, controls.aim_pitch_rate_deg * dt),
                Control::AimDown => self.aim.turn(0.0, -controls.aim_pitch_rate_deg * dt),
                Control::Brighten => self.day_night.ramp(controls.day_night_rate * dt),
                Control::Darken => self.day_night.ramp(-controls.day_night_rate * dt),
            }
        }

        tracing::trace!(
            elapsed = time.elapsed,
            dt,
            x = self.pose.position.x,
            z = self.pose.position.z,
            heading = self.pose.heading_deg,
            "state updated"
        );
    }
}
