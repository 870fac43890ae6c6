//! Per-frame light, material, fog and time-of-day parameters.
//!
//! Everything positional is handed to the shaders in view space, matching the
//! view-space normals produced by `normalMatrix`.

use glam::{Mat4, Vec3};

use super::camera::MovingObjectPose;
use super::uniforms::{Uniforms, POINT_LIGHT_COUNT, SPOT_LIGHT_COUNT};

pub const FOG_COLOR: Vec3 = Vec3::new(0.5, 0.6, 0.7);
pub const MAX_FOG_DENSITY: f32 = 0.5;
pub const MAX_SPOT_PITCH_DEG: f32 = 45.0;

const HEADLIGHT_OFFSET: Vec3 = Vec3::new(0.0, 0.3, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.25),
            diffuse: Vec3::splat(0.9),
            specular: Vec3::splat(0.6),
            shininess: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSettings {
    pub enabled: bool,
    pub density: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 0.05,
        }
    }
}

impl FogSettings {
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn adjust_density(&mut self, delta: f32) {
        self.density = (self.density + delta).clamp(0.0, MAX_FOG_DENSITY);
    }
}

/// Manual aim of the headlight relative to the object heading, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotlightAim {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
}

impl Default for SpotlightAim {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: -10.0,
        }
    }
}

impl SpotlightAim {
    pub fn turn(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.yaw_deg += yaw_deg;
        self.pitch_deg = (self.pitch_deg + pitch_deg).clamp(-MAX_SPOT_PITCH_DEG, MAX_SPOT_PITCH_DEG);
    }

    /// World-space direction for an object facing `heading_deg`.
    pub fn direction(&self, heading_deg: f32) -> Vec3 {
        let yaw = (heading_deg + self.yaw_deg).to_radians();
        let pitch = self.pitch_deg.to_radians();
        Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos()).normalize()
    }
}

/// Time of day: 0 is night, 1 is full day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayNight {
    factor: f32,
}

impl Default for DayNight {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl DayNight {
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Snaps to the opposite extreme.
    pub fn toggle(&mut self) {
        self.factor = if self.factor > 0.5 { 0.0 } else { 1.0 };
    }

    pub fn ramp(&mut self, delta: f32) {
        self.factor = (self.factor + delta).clamp(0.0, 1.0);
    }

    pub fn is_day(&self) -> bool {
        self.factor > 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingModel {
    #[default]
    Phong,
    BlinnPhong,
}

impl ShadingModel {
    pub fn toggled(self) -> Self {
        match self {
            ShadingModel::Phong => ShadingModel::BlinnPhong,
            ShadingModel::BlinnPhong => ShadingModel::Phong,
        }
    }

    pub fn uses_blinn(self) -> bool {
        self == ShadingModel::BlinnPhong
    }
}

impl std::fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShadingModel::Phong => "Phong",
            ShadingModel::BlinnPhong => "Blinn-Phong",
        })
    }
}

/// Everything the lighting model needs for one frame, already in view space.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingState {
    pub point_lights: [PointLight; POINT_LIGHT_COUNT],
    pub spot_lights: [SpotLight; SPOT_LIGHT_COUNT],
    pub material: Material,
    pub fog: FogSettings,
    pub fog_color: Vec3,
    pub day_night: f32,
    pub shading: ShadingModel,
}

impl LightingState {
    pub fn assemble(
        view: Mat4,
        pose: &MovingObjectPose,
        aim: SpotlightAim,
        fog: FogSettings,
        day_night: DayNight,
        shading: ShadingModel,
    ) -> Self {
        let dn = day_night.factor();
        let to_view = |p: Vec3| view.transform_point3(p);
        let dir_to_view = |d: Vec3| view.transform_vector3(d).normalize();

        // street lamp fades out at night, the second lamp stays on
        let street_lamp = PointLight {
            position: to_view(Vec3::new(3.0, 4.0, 3.0)),
            ambient: Vec3::splat(0.1) * dn,
            diffuse: Vec3::new(1.0, 0.9, 0.7) * dn,
            specular: Vec3::ONE * dn,
            attenuation: Attenuation::new(1.0, 0.22, 0.20),
        };
        let blue_lamp = PointLight {
            position: to_view(Vec3::new(-4.0, 3.0, -2.0)),
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::new(0.5, 0.5, 1.0),
            specular: Vec3::splat(0.5),
            attenuation: Attenuation::new(1.0, 0.35, 0.44),
        };

        let headlight = SpotLight {
            position: to_view(pose.position + HEADLIGHT_OFFSET),
            direction: dir_to_view(aim.direction(pose.heading_deg)),
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::new(2.5, 2.5, 2.0),
            specular: Vec3::splat(2.0),
            attenuation: Attenuation::new(1.0, 0.14, 0.07),
            cut_off: 15f32.to_radians().cos(),
            outer_cut_off: 25f32.to_radians().cos(),
        };
        let overhead = SpotLight {
            position: to_view(Vec3::new(0.0, 6.0, 0.0)),
            direction: dir_to_view(Vec3::NEG_Y),
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.8) * dn,
            specular: Vec3::splat(0.5) * dn,
            attenuation: Attenuation::new(1.0, 0.045, 0.0075),
            cut_off: 25f32.to_radians().cos(),
            outer_cut_off: 35f32.to_radians().cos(),
        };

        Self {
            point_lights: [street_lamp, blue_lamp],
            spot_lights: [headlight, overhead],
            material: Material::default(),
            fog,
            fog_color: FOG_COLOR,
            day_night: dn,
            shading,
        }
    }

    pub fn apply(&self, target: &mut impl Uniforms) {
        target.set_int("numPointLights", POINT_LIGHT_COUNT as i32);
        target.set_int("numSpotLights", SPOT_LIGHT_COUNT as i32);

        target.set_vec3("material.ambient", self.material.ambient);
        target.set_vec3("material.diffuse", self.material.diffuse);
        target.set_vec3("material.specular", self.material.specular);
        target.set_float("material.shininess", self.material.shininess);

        for (i, light) in self.point_lights.iter().enumerate() {
            let field = |name: &str| format!("pointLights[{i}].{name}");
            target.set_vec3(&field("position"), light.position);
            target.set_vec3(&field("ambient"), light.ambient);
            target.set_vec3(&field("diffuse"), light.diffuse);
            target.set_vec3(&field("specular"), light.specular);
            target.set_float(&field("constant"), light.attenuation.constant);
            target.set_float(&field("linear"), light.attenuation.linear);
            target.set_float(&field("quadratic"), light.attenuation.quadratic);
        }

        for (i, light) in self.spot_lights.iter().enumerate() {
            let field = |name: &str| format!("spotLights[{i}].{name}");
            target.set_vec3(&field("position"), light.position);
            target.set_vec3(&field("direction"), light.direction);
            target.set_vec3(&field("ambient"), light.ambient);
            target.set_vec3(&field("diffuse"), light.diffuse);
            target.set_vec3(&field("specular"), light.specular);
            target.set_float(&field("constant"), light.attenuation.constant);
            target.set_float(&field("linear"), light.attenuation.linear);
            target.set_float(&field("quadratic"), light.attenuation.quadratic);
            target.set_float(&field("cutOff"), light.cut_off);
            target.set_float(&field("outerCutOff"), light.outer_cut_off);
        }

        target.set_bool("fogEnabled", self.fog.enabled);
        target.set_float("fogDensity", self.fog.density);
        target.set_vec3("fogColor", self.fog_color);
        target.set_float("dayNightFactor", self.day_night);
        target.set_bool("useBlinn", self.shading.uses_blinn());
        target.set_bool("useTexture", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::uniforms::{flag_layout, main_layout, UniformBlock, UniformValue};

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn state(view: Mat4, day_night: f32) -> LightingState {
        LightingState::assemble(
            view,
            &MovingObjectPose::default(),
            SpotlightAim::default(),
            FogSettings::default(),
            DayNight::new(day_night),
            ShadingModel::Phong,
        )
    }

    #[test]
    fn night_dims_only_street_lamp_and_overhead_spot() {
        let night = state(Mat4::IDENTITY, 0.0);
        let day = state(Mat4::IDENTITY, 1.0);

        let [lamp, blue] = night.point_lights;
        assert_eq!(lamp.ambient, Vec3::ZERO);
        assert_eq!(lamp.diffuse, Vec3::ZERO);
        assert_eq!(lamp.specular, Vec3::ZERO);
        assert_eq!(blue, day.point_lights[1]);

        let [head, overhead] = night.spot_lights;
        assert_eq!(head, day.spot_lights[0]);
        assert_eq!(overhead.diffuse, Vec3::ZERO);
        assert_eq!(overhead.specular, Vec3::ZERO);
        assert_eq!(overhead.ambient, Vec3::ZERO);
        assert_eq!(day.spot_lights[1].diffuse, Vec3::splat(0.8));
    }

    #[test]
    fn positions_and_directions_move_to_view_space() {
        let view = Mat4::look_at_rh(Vec3::new(8.0, 6.0, 8.0), Vec3::ZERO, Vec3::Y);
        let lit = state(view, 1.0);
        assert!(close(
            lit.point_lights[0].position,
            view.transform_point3(Vec3::new(3.0, 4.0, 3.0))
        ));
        let down = view.transform_vector3(Vec3::NEG_Y).normalize();
        assert!(close(lit.spot_lights[1].direction, down));
        assert!((lit.spot_lights[0].direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn headlight_follows_heading_and_aim() {
        let aim = SpotlightAim {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
        };
        assert!(close(aim.direction(0.0), Vec3::Z));
        assert!(close(aim.direction(90.0), Vec3::X));

        let offset = SpotlightAim {
            yaw_deg: -90.0,
            pitch_deg: 0.0,
        };
        assert!(close(offset.direction(90.0), Vec3::Z));
        assert!(SpotlightAim::default().direction(0.0).y < 0.0);

        let pose = MovingObjectPose {
            position: Vec3::new(1.0, 0.5, 2.0),
            heading_deg: 0.0,
        };
        let lit = LightingState::assemble(
            Mat4::IDENTITY,
            &pose,
            aim,
            FogSettings::default(),
            DayNight::default(),
            ShadingModel::Phong,
        );
        assert!(close(lit.spot_lights[0].position, Vec3::new(1.0, 0.8, 2.0)));
    }

    #[test]
    fn cone_cutoffs_are_cosines() {
        let lit = state(Mat4::IDENTITY, 1.0);
        let [head, overhead] = lit.spot_lights;
        assert!((head.cut_off - 15f32.to_radians().cos()).abs() < 1e-6);
        assert!((head.outer_cut_off - 25f32.to_radians().cos()).abs() < 1e-6);
        assert!(overhead.cut_off > overhead.outer_cut_off);
    }

    #[test]
    fn apply_fills_both_program_layouts() {
        let lit = state(Mat4::IDENTITY, 0.25);
        for layout in [main_layout(), flag_layout()] {
            let mut block = UniformBlock::new(layout);
            lit.apply(&mut block);
            assert_eq!(block.get("numPointLights"), Some(UniformValue::Int(2)));
            assert_eq!(block.get("numSpotLights"), Some(UniformValue::Int(2)));
            assert_eq!(block.get("material.shininess"), Some(UniformValue::Float(12.0)));
            assert_eq!(block.get("fogColor"), Some(UniformValue::Vec3(FOG_COLOR)));
            assert_eq!(block.get("dayNightFactor"), Some(UniformValue::Float(0.25)));
            assert_eq!(block.get("useBlinn"), Some(UniformValue::Bool(false)));
            assert_eq!(
                block.get("spotLights[1].quadratic"),
                Some(UniformValue::Float(0.0075))
            );
            assert_eq!(
                block.get("pointLights[0].diffuse"),
                Some(UniformValue::Vec3(Vec3::new(1.0, 0.9, 0.7) * 0.25))
            );
        }
    }

    #[test]
    fn fog_density_stays_in_range() {
        let mut fog = FogSettings::default();
        for _ in 0..100 {
            fog.adjust_density(0.01);
        }
        assert_eq!(fog.density, MAX_FOG_DENSITY);
        for _ in 0..100 {
            fog.adjust_density(-0.01);
        }
        assert_eq!(fog.density, 0.0);
        fog.toggle();
        assert!(!fog.enabled);
    }

    #[test]
    fn spotlight_pitch_is_clamped() {
        let mut aim = SpotlightAim::default();
        for _ in 0..50 {
            aim.turn(1.0, 5.0);
        }
        assert_eq!(aim.pitch_deg, MAX_SPOT_PITCH_DEG);
        assert_eq!(aim.yaw_deg, 50.0);
        for _ in 0..50 {
            aim.turn(0.0, -5.0);
        }
        assert_eq!(aim.pitch_deg, -MAX_SPOT_PITCH_DEG);
    }

    #[test]
    fn day_night_toggle_snaps_to_extremes() {
        let mut dn = DayNight::new(0.7);
        dn.toggle();
        assert_eq!(dn.factor(), 0.0);
        dn.toggle();
        assert_eq!(dn.factor(), 1.0);

        let mut dusk = DayNight::new(0.5);
        dusk.toggle();
        assert_eq!(dusk.factor(), 1.0);
    }

    #[test]
    fn day_night_ramp_saturates() {
        let mut dn = DayNight::new(0.5);
        let mut last = dn.factor();
        for _ in 0..40 {
            dn.ramp(0.05);
            assert!(dn.factor() >= last);
            last = dn.factor();
        }
        assert_eq!(dn.factor(), 1.0);
        for _ in 0..40 {
            dn.ramp(-0.05);
            assert!(dn.factor() <= last);
            last = dn.factor();
        }
        assert_eq!(dn.factor(), 0.0);
    }

    #[test]
    fn shading_model_toggles() {
        let model = ShadingModel::default();
        assert!(!model.uses_blinn());
        assert!(model.toggled().uses_blinn());
        assert_eq!(model.toggled().toggled(), model);
    }
}
