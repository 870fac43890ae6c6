use glam::{Mat4, Vec3};

/// Eye position shared by the static and tracking modes.
const ORBIT_EYE: Vec3 = Vec3::new(8.0, 6.0, 8.0);
const CHASE_DISTANCE: f32 = 4.0;
const CHASE_HEIGHT: f32 = 2.0;
const CHASE_LOOK_OFFSET: Vec3 = Vec3::new(0.0, 0.5, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Static,
    Tracking,
    ThirdPerson,
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CameraMode::Static => "static",
            CameraMode::Tracking => "tracking",
            CameraMode::ThirdPerson => "third-person",
        };
        f.write_str(name)
    }
}

/// Position and heading of the player-driven object. Heading is in degrees,
/// 0° faces +Z and positive values turn toward +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingObjectPose {
    pub position: Vec3,
    pub heading_deg: f32,
}

impl Default for MovingObjectPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.5, 0.0),
            heading_deg: 0.0,
        }
    }
}

impl MovingObjectPose {
    pub fn forward(&self) -> Vec3 {
        let h = self.heading_deg.to_radians();
        Vec3::new(h.sin(), 0.0, h.cos())
    }

    /// Moves along the heading; negative distances back up.
    pub fn advance(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    pub fn turn(&mut self, degrees: f32) {
        self.heading_deg += degrees;
    }
}

/// Output of the camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub eye: Vec3,
    pub target: Vec3,
    pub view: Mat4,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraRig {
    mode: CameraMode,
}

impl CameraRig {
    pub fn new(mode: CameraMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Returns true if the mode actually changed.
    pub fn set_mode(&mut self, mode: CameraMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn view(&self, pose: &MovingObjectPose) -> CameraView {
        let (eye, target) = match self.mode {
            CameraMode::Static => (ORBIT_EYE, Vec3::ZERO),
            CameraMode::Tracking => (ORBIT_EYE, pose.position),
            CameraMode::ThirdPerson => {
                let h = pose.heading_deg.to_radians();
                let offset = Vec3::new(h.sin() * CHASE_DISTANCE, -CHASE_HEIGHT, h.cos() * CHASE_DISTANCE);
                (pose.position - offset, pose.position + CHASE_LOOK_OFFSET)
            }
        };
        CameraView {
            eye,
            target,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
        }
    }
}

/// Perspective projection with wgpu's [0, 1] depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn new(fov_y_deg: f32, width: u32, height: u32, z_near: f32, z_far: f32) -> Self {
        let mut projection = Self {
            fov_y: fov_y_deg.to_radians(),
            aspect: 1.0,
            z_near,
            z_far,
        };
        projection.set_aspect(width, height);
        projection
    }

    /// Zero-sized surfaces (minimized windows) keep the previous aspect.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn forward_for_one_second_at_speed_two() {
        let mut pose = MovingObjectPose::default();
        pose.advance(2.0 * 1.0);
        assert!(close(pose.position, Vec3::new(0.0, 0.5, 2.0)));
    }

    #[test]
    fn heading_ninety_moves_along_x() {
        let mut pose = MovingObjectPose::default();
        pose.turn(90.0);
        pose.advance(1.0);
        assert!(close(pose.position, Vec3::new(1.0, 0.5, 0.0)));
    }

    #[test]
    fn static_mode_ignores_pose() {
        let rig = CameraRig::new(CameraMode::Static);
        let a = rig.view(&MovingObjectPose::default());
        let b = rig.view(&MovingObjectPose {
            position: Vec3::new(5.0, 0.5, -3.0),
            heading_deg: 123.0,
        });
        assert_eq!(a, b);
        assert_eq!(a.eye, ORBIT_EYE);
        assert_eq!(a.target, Vec3::ZERO);
    }

    #[test]
    fn tracking_mode_looks_at_object() {
        let rig = CameraRig::new(CameraMode::Tracking);
        let pose = MovingObjectPose {
            position: Vec3::new(2.0, 0.5, 1.0),
            heading_deg: 0.0,
        };
        let view = rig.view(&pose);
        assert_eq!(view.eye, ORBIT_EYE);
        assert_eq!(view.target, pose.position);
        // the target lands on the view axis
        let in_view = view.view.transform_point3(pose.position);
        assert!(in_view.x.abs() < 1e-4 && in_view.y.abs() < 1e-4 && in_view.z < 0.0);
    }

    #[test]
    fn third_person_sits_behind_and_above() {
        let rig = CameraRig::new(CameraMode::ThirdPerson);
        let pose = MovingObjectPose::default();
        let view = rig.view(&pose);
        assert!(close(view.eye, Vec3::new(0.0, 2.5, -4.0)));
        assert!(close(view.target, Vec3::new(0.0, 1.0, 0.0)));

        let turned = MovingObjectPose {
            heading_deg: 90.0,
            ..pose
        };
        assert!(close(rig.view(&turned).eye, Vec3::new(-4.0, 2.5, 0.0)));
    }

    #[test]
    fn mode_switch_is_idempotent() {
        let pose = MovingObjectPose::default();
        let mut rig = CameraRig::default();
        assert!(rig.set_mode(CameraMode::ThirdPerson));
        let once = rig.view(&pose);
        assert!(!rig.set_mode(CameraMode::ThirdPerson));
        assert_eq!(rig.view(&pose), once);
        assert_eq!(rig.mode(), CameraMode::ThirdPerson);
    }

    #[test]
    fn projection_keeps_aspect_for_empty_surface() {
        let mut projection = Projection::new(45.0, 1280, 720, 0.1, 100.0);
        assert!((projection.aspect - 1280.0 / 720.0).abs() < 1e-6);
        projection.set_aspect(0, 720);
        assert!((projection.aspect - 1280.0 / 720.0).abs() < 1e-6);
        projection.set_aspect(800, 800);
        assert_eq!(projection.aspect, 1.0);
    }
}
