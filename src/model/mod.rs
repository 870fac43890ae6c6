// MODEL: scene data, geometry and per-frame state derivation
pub mod camera;
pub mod lighting;
pub mod mesh;
pub mod primitives;
pub mod surface;
pub mod uniforms;

pub use camera::{CameraMode, CameraRig, CameraView, MovingObjectPose, Projection};
pub use lighting::{DayNight, FogSettings, LightingState, ShadingModel, SpotlightAim};
pub use mesh::{MeshData, PatchData, Vertex};
pub use primitives::FlagDimensions;
pub use surface::SurfaceAnimationParams;
