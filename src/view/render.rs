//! Scene description and per-frame draw recording.
//!
//! A frame is first recorded as a [`FramePlan`]: plain data naming which program
//! and mesh each draw uses plus a snapshot of the program's uniforms at that
//! point. The plan is then resolved against the GPU handles and submitted.

use glam::{Mat3, Mat4, Quat, Vec3};

use super::backend::{
    Culling, DrawSubmission, FrameSubmission, GraphicsBackend, PassSubmission,
};
use super::shader::{ShaderProgram, ShaderSources};
use super::uniforms::{flag_layout, main_layout, Uniforms};
use crate::config::AppConfig;
use crate::controller::state::AppState;
use crate::error::ShaderError;
use crate::model::primitives::{self, FlagDimensions};
use crate::model::{LightingState, Projection};

const NIGHT_SKY: Vec3 = Vec3::new(0.02, 0.02, 0.05);
const DAY_SKY: Vec3 = Vec3::new(0.4, 0.6, 0.8);

pub const GROUND_SIZE: f32 = 20.0;
const CHECKER_SCALE: f32 = 10.0;
const CHECKER_LIGHT: Vec3 = Vec3::splat(0.5);
const CHECKER_DARK: Vec3 = Vec3::splat(0.25);

pub const MAST_POSITION: Vec3 = Vec3::new(0.0, 0.0, -5.0);
const MAST_RADIUS: f32 = 0.05;
const MAST_HEIGHT: f32 = 3.5;
const TORUS_SPIN: f32 = 0.5;

pub const OPAQUE_PASS: &str = "opaque";
pub const SURFACE_PASS: &str = "surface";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneProgram {
    Main,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMesh {
    Plane,
    Cube,
    Sphere,
    Torus,
    Mast,
    Flag,
}

/// GPU copies of every mesh the scene draws.
pub struct SceneMeshes<B: GraphicsBackend> {
    plane: B::Mesh,
    cube: B::Mesh,
    sphere: B::Mesh,
    torus: B::Mesh,
    mast: B::Mesh,
    flag: B::Mesh,
}

impl<B: GraphicsBackend> SceneMeshes<B> {
    pub fn upload(backend: &B) -> Self {
        let meshes = Self {
            plane: backend.upload_mesh("plane", &primitives::plane(GROUND_SIZE)),
            cube: backend.upload_mesh("cube", &primitives::cube()),
            sphere: backend.upload_mesh("sphere", &primitives::sphere(32, 16)),
            torus: backend.upload_mesh("torus", &primitives::torus(0.3, 0.8, 32, 16)),
            mast: backend.upload_mesh("mast", &primitives::cylinder(MAST_RADIUS, MAST_HEIGHT, 16)),
            flag: backend.upload_patch("flag", &primitives::bezier_patch(FlagDimensions::default())),
        };
        tracing::debug!("scene meshes uploaded");
        meshes
    }

    pub fn get(&self, mesh: SceneMesh) -> &B::Mesh {
        match mesh {
            SceneMesh::Plane => &self.plane,
            SceneMesh::Cube => &self.cube,
            SceneMesh::Sphere => &self.sphere,
            SceneMesh::Torus => &self.torus,
            SceneMesh::Mast => &self.mast,
            SceneMesh::Flag => &self.flag,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub label: &'static str,
    pub program: SceneProgram,
    pub mesh: SceneMesh,
    pub culling: Culling,
    pub uniforms: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PassPlan {
    pub label: &'static str,
    pub draws: Vec<DrawCommand>,
}

#[derive(Debug, Clone)]
pub struct FramePlan {
    pub clear_color: Vec3,
    pub passes: Vec<PassPlan>,
}

/// A solid drawn by the main program.
struct SceneObject {
    label: &'static str,
    mesh: SceneMesh,
    model: Mat4,
    color: Vec3,
}

fn scene_objects(state: &AppState) -> [SceneObject; 6] {
    let pose = &state.pose;
    [
        SceneObject {
            label: "vehicle",
            mesh: SceneMesh::Cube,
            model: Mat4::from_scale_rotation_translation(
                Vec3::new(0.8, 0.5, 1.2),
                Quat::from_rotation_y(pose.heading_deg.to_radians()),
                pose.position,
            ),
            color: Vec3::new(0.8, 0.2, 0.2),
        },
        SceneObject {
            label: "sphere",
            mesh: SceneMesh::Sphere,
            model: Mat4::from_translation(Vec3::new(-3.0, 1.0, 2.0)),
            color: Vec3::new(0.2, 0.4, 0.8),
        },
        SceneObject {
            label: "torus",
            mesh: SceneMesh::Torus,
            model: Mat4::from_translation(Vec3::new(3.0, 0.5, -3.0))
                * Mat4::from_rotation_y(state.elapsed * TORUS_SPIN),
            color: Vec3::new(0.8, 0.6, 0.2),
        },
        SceneObject {
            label: "grey cube",
            mesh: SceneMesh::Cube,
            model: Mat4::from_translation(Vec3::new(-4.0, 0.5, -4.0)),
            color: Vec3::splat(0.5),
        },
        SceneObject {
            label: "purple cube",
            mesh: SceneMesh::Cube,
            model: Mat4::from_translation(Vec3::new(4.0, 0.75, 2.0)) * Mat4::from_scale(Vec3::splat(1.5)),
            color: Vec3::new(0.6, 0.3, 0.6),
        },
        SceneObject {
            label: "mast",
            mesh: SceneMesh::Mast,
            model: Mat4::from_translation(MAST_POSITION),
            color: Vec3::new(0.4, 0.3, 0.2),
        },
    ]
}

/// Model matrix plus the view-space normal matrix derived from it.
fn set_model(target: &mut impl Uniforms, view: Mat4, model: Mat4) {
    target.set_mat4("model", model);
    target.set_mat3("normalMatrix", Mat3::from_mat4(view * model).inverse().transpose());
}

pub fn clear_color(day_night: f32) -> Vec3 {
    NIGHT_SKY.lerp(DAY_SKY, day_night)
}

pub struct Renderer<B: GraphicsBackend> {
    main: ShaderProgram<B>,
    flag: ShaderProgram<B>,
    meshes: SceneMeshes<B>,
    projection: Projection,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Loads both programs from the configured shader directory and uploads the
    /// scene meshes.
    pub fn new(backend: &B, config: &AppConfig, width: u32, height: u32) -> Result<Self, ShaderError> {
        let main = ShaderProgram::from_files(backend, "main", &config.main_program_paths(), main_layout())?;
        let flag = ShaderProgram::from_files(backend, "flag", &config.flag_program_paths(), flag_layout())?;
        let p = config.projection;
        let projection = Projection::new(p.fov_y_deg, width, height, p.z_near, p.z_far);
        Ok(Self::from_programs(backend, main, flag, projection))
    }

    pub fn with_sources(
        backend: &B,
        main: &ShaderSources,
        flag: &ShaderSources,
        projection: Projection,
    ) -> Result<Self, ShaderError> {
        let main = ShaderProgram::build(backend, "main", main, main_layout())?;
        let flag = ShaderProgram::build(backend, "flag", flag, flag_layout())?;
        Ok(Self::from_programs(backend, main, flag, projection))
    }

    fn from_programs(
        backend: &B,
        main: ShaderProgram<B>,
        flag: ShaderProgram<B>,
        projection: Projection,
    ) -> Self {
        if !flag.is_tessellated() {
            tracing::warn!("flag program has no tessellation stages, the cloth will not be drawn as a surface");
        }
        Self {
            main,
            flag,
            meshes: SceneMeshes::upload(backend),
            projection,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.projection.set_aspect(width, height);
    }

    pub fn program(&self, program: SceneProgram) -> &ShaderProgram<B> {
        match program {
            SceneProgram::Main => &self.main,
            SceneProgram::Flag => &self.flag,
        }
    }

    /// Pushes this frame's uniforms through both programs and records the opaque
    /// pass followed by the flag pass.
    pub fn plan_frame(&mut self, state: &AppState) -> FramePlan {
        let camera = state.camera.view(&state.pose);
        let view = camera.view;
        let projection = self.projection.matrix();
        let lighting = LightingState::assemble(
            view,
            &state.pose,
            state.aim,
            state.fog,
            state.day_night,
            state.shading,
        );

        let main = &mut self.main;
        main.set_mat4("projection", projection);
        main.set_mat4("view", view);
        lighting.apply(main);
        main.set_int("textureDiffuse", 0);
        main.set_bool("useTexture", false);

        let mut opaque = PassPlan {
            label: OPAQUE_PASS,
            draws: Vec::with_capacity(7),
        };

        // the ground is visible from below as well
        set_model(main, view, Mat4::IDENTITY);
        main.set_bool("useCheckerboard", true);
        main.set_float("checkerScale", CHECKER_SCALE);
        main.set_vec3("checkerColor1", CHECKER_LIGHT);
        main.set_vec3("checkerColor2", CHECKER_DARK);
        opaque.draws.push(DrawCommand {
            label: "ground",
            program: SceneProgram::Main,
            mesh: SceneMesh::Plane,
            culling: Culling::None,
            uniforms: main.snapshot(),
        });
        main.set_bool("useCheckerboard", false);

        for object in scene_objects(state) {
            set_model(main, view, object.model);
            main.set_vec3("objectColor", object.color);
            opaque.draws.push(DrawCommand {
                label: object.label,
                program: SceneProgram::Main,
                mesh: object.mesh,
                culling: Culling::Back,
                uniforms: main.snapshot(),
            });
        }

        let flag = &mut self.flag;
        flag.set_mat4("projection", projection);
        flag.set_mat4("view", view);
        lighting.apply(flag);
        state.surface.apply(flag);
        set_model(flag, view, Mat4::from_translation(MAST_POSITION));
        let surface = PassPlan {
            label: SURFACE_PASS,
            draws: vec![DrawCommand {
                label: "flag",
                program: SceneProgram::Flag,
                mesh: SceneMesh::Flag,
                culling: Culling::None,
                uniforms: flag.snapshot(),
            }],
        };

        tracing::trace!(
            camera = %state.camera_mode(),
            eye = ?camera.eye,
            draws = opaque.draws.len() + surface.draws.len(),
            "frame planned"
        );

        FramePlan {
            clear_color: clear_color(state.day_night.factor()),
            passes: vec![opaque, surface],
        }
    }

    /// Binds a plan to this renderer's GPU handles.
    pub fn resolve<'a>(&'a self, plan: &'a FramePlan) -> FrameSubmission<'a, B> {
        let passes = plan
            .passes
            .iter()
            .map(|pass| PassSubmission {
                label: pass.label,
                draws: pass
                    .draws
                    .iter()
                    .map(|draw| DrawSubmission {
                        program: self.program(draw.program).raw(),
                        mesh: self.meshes.get(draw.mesh),
                        uniforms: &draw.uniforms,
                        culling: draw.culling,
                    })
                    .collect(),
            })
            .collect();

        FrameSubmission {
            clear_color: plan.clear_color,
            passes,
        }
    }

    pub fn render(&mut self, backend: &mut B, state: &AppState) -> Result<(), B::Error> {
        let plan = self.plan_frame(state);
        let frame = self.resolve(&plan);
        backend.submit_frame(&frame)
    }
}
