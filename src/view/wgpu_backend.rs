//! [`GraphicsBackend`] on wgpu.
//!
//! wgpu has no tessellation stages, so a tessellated program is split in three:
//! the vertex and tessellation-control sources are compute shaders that run in a
//! prepass, and the tessellation-evaluation source is the vertex shader of the
//! draw. The control stage writes the indirect draw arguments, so the vertex
//! count follows the tessellation level on the GPU.
//!
//! Bindings shared by every stage:
//!
//! | group | binding | contents                                        |
//! |-------|---------|-------------------------------------------------|
//! | 0     | 0       | uniform struct of the program                   |
//! | 0     | 1       | diffuse texture (1x1 white)                     |
//! | 0     | 2       | sampler                                         |
//! | 1     | 0       | patch control points (`array<f32>`)             |
//! | 1     | 1       | transformed control points (`array<vec4<f32>>`) |
//! | 1     | 2       | tessellation arguments                          |
//!
//! In the draw the transformed points move to binding 0 and the arguments to
//! binding 1, both read-only.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use super::backend::{Culling, DrawSubmission, FrameSubmission, GraphicsBackend, StageKind};
use super::gpu_init::GpuContext;
use super::uniforms::UniformLayout;
use crate::model::mesh::{MeshData, PatchData, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_UNIFORM_CAPACITY: u64 = 16 * 1024;
/// `array<vec4<f32>, 16>`
const PATCH_POINTS_SIZE: u64 = 16 * 16;
/// Four indirect draw words, outer and inner level, two words of padding.
const TESS_ARGS_SIZE: u64 = 8 * 4;

pub fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

/// A compiled shader module and the stage it was compiled for.
pub struct WgpuStage {
    kind: StageKind,
    module: wgpu::ShaderModule,
}

struct CullVariants {
    back: wgpu::RenderPipeline,
    none: wgpu::RenderPipeline,
}

impl CullVariants {
    fn get(&self, culling: Culling) -> &wgpu::RenderPipeline {
        match culling {
            Culling::Back => &self.back,
            Culling::None => &self.none,
        }
    }
}

enum ProgramPipelines {
    Triangles(CullVariants),
    Patch {
        control_points: wgpu::ComputePipeline,
        levels: wgpu::ComputePipeline,
        draw: CullVariants,
    },
}

pub struct WgpuProgram {
    label: String,
    pipelines: ProgramPipelines,
}

impl WgpuProgram {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_tessellated(&self) -> bool {
        matches!(self.pipelines, ProgramPipelines::Patch { .. })
    }
}

pub enum WgpuMesh {
    Triangles {
        label: String,
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    Patch {
        label: String,
        control_points: wgpu::Buffer,
        count: u32,
    },
}

impl WgpuMesh {
    pub fn label(&self) -> &str {
        match self {
            WgpuMesh::Triangles { label, .. } | WgpuMesh::Patch { label, .. } => label,
        }
    }
}

struct Layouts {
    scene: wgpu::BindGroupLayout,
    patch_compute: wgpu::BindGroupLayout,
    patch_draw: wgpu::BindGroupLayout,
    triangles_pipeline: wgpu::PipelineLayout,
    patch_compute_pipeline: wgpu::PipelineLayout,
    patch_draw_pipeline: wgpu::PipelineLayout,
}

fn storage_entry(binding: u32, visibility: wgpu::ShaderStages, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let scene = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT
                        | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let patch_compute = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("patch_compute_bgl"),
            entries: &[
                storage_entry(0, wgpu::ShaderStages::COMPUTE, true),
                storage_entry(1, wgpu::ShaderStages::COMPUTE, false),
                storage_entry(2, wgpu::ShaderStages::COMPUTE, false),
            ],
        });

        let patch_draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("patch_draw_bgl"),
            entries: &[
                storage_entry(0, wgpu::ShaderStages::VERTEX, true),
                storage_entry(1, wgpu::ShaderStages::VERTEX, true),
            ],
        });

        let pipeline_layout = |label, groups: &[&wgpu::BindGroupLayout]| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: groups,
                push_constant_ranges: &[],
            })
        };
        let triangles_pipeline = pipeline_layout("triangles_layout", &[&scene]);
        let patch_compute_pipeline = pipeline_layout("patch_compute_layout", &[&scene, &patch_compute]);
        let patch_draw_pipeline = pipeline_layout("patch_draw_layout", &[&scene, &patch_draw]);

        Self {
            scene,
            patch_compute,
            patch_draw,
            triangles_pipeline,
            patch_compute_pipeline,
            patch_draw_pipeline,
        }
    }
}

/// One uniform buffer holding every draw's snapshot for the current frame.
struct UniformRing {
    buffer: wgpu::Buffer,
    capacity: u64,
    alignment: u64,
}

impl UniformRing {
    fn new(device: &wgpu::Device) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        Self {
            buffer: Self::allocate(device, INITIAL_UNIFORM_CAPACITY),
            capacity: INITIAL_UNIFORM_CAPACITY,
            alignment,
        }
    }

    fn allocate(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_ring"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Copies the snapshots in order and returns where each one landed.
    fn upload<'a>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        snapshots: impl Iterator<Item = &'a [u8]>,
    ) -> Vec<u64> {
        let mut staging = Vec::new();
        let mut offsets = Vec::new();
        for snapshot in snapshots {
            let offset = (staging.len() as u64).next_multiple_of(self.alignment);
            staging.resize(offset as usize, 0);
            staging.extend_from_slice(snapshot);
            offsets.push(offset);
        }
        staging.resize(staging.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);

        let needed = staging.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.capacity);
            tracing::debug!(capacity = self.capacity, "uniform ring grown");
        }
        if !staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &staging);
        }
        offsets
    }
}

/// Per-draw working memory of a tessellated patch.
struct PatchScratch {
    points: wgpu::Buffer,
    args: wgpu::Buffer,
}

impl PatchScratch {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            points: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("patch_points"),
                size: PATCH_POINTS_SIZE,
                usage: wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            }),
            args: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tess_args"),
                size: TESS_ARGS_SIZE,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::INDIRECT,
                mapped_at_creation: false,
            }),
        }
    }
}

struct PatchBindings<'a> {
    compute: wgpu::BindGroup,
    draw: wgpu::BindGroup,
    args: &'a wgpu::Buffer,
}

struct PreparedDraw<'a> {
    draw: &'a DrawSubmission<'a, WgpuBackend>,
    scene: wgpu::BindGroup,
    patch: Option<PatchBindings<'a>>,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    depth: (wgpu::Texture, wgpu::TextureView),
    layouts: Layouts,
    white_texture: (wgpu::Texture, wgpu::TextureView),
    sampler: wgpu::Sampler,
    uniform_ring: UniformRing,
    patch_scratch: Vec<PatchScratch>,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        let device = gpu.device.as_ref();
        let (width, height) = gpu.size();
        let depth = create_depth_texture(device, width, height);
        let layouts = Layouts::new(device);

        let white = device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("white_texture"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let white_view = white.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("diffuse_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_ring = UniformRing::new(device);

        Self {
            gpu,
            depth,
            layouts,
            white_texture: (white, white_view),
            sampler,
            uniform_ring,
            patch_scratch: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    /// Resizes the surface and the depth buffer. Returns false for a zero size.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.gpu.resize(width, height) {
            return false;
        }
        self.depth = create_depth_texture(&self.gpu.device, width, height);
        tracing::debug!(width, height, "surface resized");
        true
    }

    /// Reapplies the current surface configuration after the surface was lost.
    pub fn reconfigure(&self) {
        self.gpu.reconfigure();
    }

    /// Runs `create` inside a validation scope and turns a captured error into
    /// its message.
    fn validated<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let device = self.gpu.device.as_ref();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(device);
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(value),
        }
    }

    fn render_pipelines(
        &self,
        label: &str,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        buffers: &[wgpu::VertexBufferLayout<'_>],
        fragment: &wgpu::ShaderModule,
    ) -> CullVariants {
        let device = self.gpu.device.as_ref();
        let create = |cull_mode: Option<wgpu::Face>, suffix: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{label}_{suffix}")),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: None,
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: None,
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };
        CullVariants {
            back: create(Some(wgpu::Face::Back), "culled"),
            none: create(None, "double_sided"),
        }
    }

    fn compute_pipeline(&self, label: &str, module: &wgpu::ShaderModule) -> wgpu::ComputePipeline {
        self.gpu
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&self.layouts.patch_compute_pipeline),
                module,
                entry_point: None,
                compilation_options: Default::default(),
                cache: None,
            })
    }

    fn scene_bind_group(&self, offset: u64, size: u64) -> wgpu::BindGroup {
        self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &self.layouts.scene,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.uniform_ring.buffer,
                        offset,
                        size: NonZeroU64::new(size),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.white_texture.1),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn patch_bindings<'a>(&'a self, scratch: &'a PatchScratch, control_points: &wgpu::Buffer) -> PatchBindings<'a> {
        let device = self.gpu.device.as_ref();
        let compute = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("patch_compute_bg"),
            layout: &self.layouts.patch_compute,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: control_points.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scratch.points.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: scratch.args.as_entire_binding(),
                },
            ],
        });
        let draw = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("patch_draw_bg"),
            layout: &self.layouts.patch_draw,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scratch.points.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scratch.args.as_entire_binding(),
                },
            ],
        });
        PatchBindings {
            compute,
            draw,
            args: &scratch.args,
        }
    }

    fn encode_patch_prepass(encoder: &mut wgpu::CommandEncoder, prepared: &[PreparedDraw<'_>]) {
        if prepared.iter().all(|p| p.patch.is_none()) {
            return;
        }
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("patch_prepass"),
            timestamp_writes: None,
        });
        for p in prepared {
            let (
                Some(patch),
                ProgramPipelines::Patch {
                    control_points,
                    levels,
                    ..
                },
            ) = (&p.patch, &p.draw.program.pipelines)
            else {
                continue;
            };
            pass.set_bind_group(0, &p.scene, &[]);
            pass.set_bind_group(1, &patch.compute, &[]);
            pass.set_pipeline(control_points);
            pass.dispatch_workgroups(1, 1, 1);
            pass.set_pipeline(levels);
            pass.dispatch_workgroups(1, 1, 1);
        }
    }

    fn encode_draw(pass: &mut wgpu::RenderPass<'_>, p: &PreparedDraw<'_>) {
        let draw = p.draw;
        match (&draw.program.pipelines, draw.mesh, &p.patch) {
            (
                ProgramPipelines::Triangles(pipelines),
                WgpuMesh::Triangles {
                    vertices,
                    indices,
                    index_count,
                    ..
                },
                _,
            ) => {
                if *index_count == 0 {
                    return;
                }
                pass.set_pipeline(pipelines.get(draw.culling));
                pass.set_bind_group(0, &p.scene, &[]);
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
            (ProgramPipelines::Patch { draw: pipelines, .. }, WgpuMesh::Patch { .. }, Some(patch)) => {
                pass.set_pipeline(pipelines.get(draw.culling));
                pass.set_bind_group(0, &p.scene, &[]);
                pass.set_bind_group(1, &patch.draw, &[]);
                pass.draw_indirect(patch.args, 0);
            }
            _ => tracing::debug!(
                program = draw.program.label(),
                mesh = draw.mesh.label(),
                "program cannot draw this mesh, skipped"
            ),
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    type Stage = WgpuStage;
    type Program = WgpuProgram;
    type Mesh = WgpuMesh;
    type Error = wgpu::SurfaceError;

    fn compile_stage(
        &self,
        kind: StageKind,
        source: &str,
        uniforms: &UniformLayout,
    ) -> Result<WgpuStage, String> {
        let full = format!("{}\n{}", uniforms.wgsl_declaration(), source);
        let module = self.validated(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{kind}_stage")),
                source: wgpu::ShaderSource::Wgsl(full.into()),
            })
        })?;
        Ok(WgpuStage { kind, module })
    }

    fn link_program(
        &self,
        label: &str,
        stages: &[WgpuStage],
        _uniforms: &UniformLayout,
    ) -> Result<WgpuProgram, String> {
        let find = |kind: StageKind| {
            stages
                .iter()
                .find(|s| s.kind == kind)
                .map(|s| &s.module)
                .ok_or_else(|| format!("{label}: missing {kind} stage"))
        };
        let vertex = find(StageKind::Vertex)?;
        let fragment = find(StageKind::Fragment)?;
        let tessellation = match (find(StageKind::TessControl), find(StageKind::TessEval)) {
            (Ok(control), Ok(eval)) => Some((control, eval)),
            _ => None,
        };

        let pipelines = self.validated(|_| match tessellation {
            Some((control, eval)) => ProgramPipelines::Patch {
                control_points: self.compute_pipeline(&format!("{label}_control_points"), vertex),
                levels: self.compute_pipeline(&format!("{label}_levels"), control),
                draw: self.render_pipelines(label, &self.layouts.patch_draw_pipeline, eval, &[], fragment),
            },
            None => {
                let buffers = [wgpu::VertexBufferLayout {
                    array_stride: Vertex::STRIDE as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                        wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                        wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
                    ],
                }];
                ProgramPipelines::Triangles(self.render_pipelines(
                    label,
                    &self.layouts.triangles_pipeline,
                    vertex,
                    &buffers,
                    fragment,
                ))
            }
        })?;

        Ok(WgpuProgram {
            label: label.to_string(),
            pipelines,
        })
    }

    fn upload_mesh(&self, label: &str, mesh: &MeshData) -> WgpuMesh {
        let device = self.gpu.device.as_ref();
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        WgpuMesh::Triangles {
            label: label.to_string(),
            vertices,
            indices,
            index_count: mesh.index_count() as u32,
        }
    }

    fn upload_patch(&self, label: &str, patch: &PatchData) -> WgpuMesh {
        let control_points = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_control_points")),
                contents: patch.bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });
        WgpuMesh::Patch {
            label: label.to_string(),
            control_points,
            count: patch.control_point_count(),
        }
    }

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let draws: Vec<&DrawSubmission<'_, Self>> =
            frame.passes.iter().flat_map(|p| p.draws.iter()).collect();
        let offsets = self.uniform_ring.upload(
            &self.gpu.device,
            &self.gpu.queue,
            draws.iter().map(|d| d.uniforms),
        );
        let patch_draws = draws
            .iter()
            .filter(|d| d.program.is_tessellated() && matches!(d.mesh, WgpuMesh::Patch { .. }))
            .count();
        while self.patch_scratch.len() < patch_draws {
            self.patch_scratch.push(PatchScratch::new(&self.gpu.device));
        }

        let mut scratch = self.patch_scratch.iter();
        let prepared: Vec<PreparedDraw<'_>> = draws
            .iter()
            .zip(&offsets)
            .map(|(&draw, &offset)| {
                let patch = match draw.mesh {
                    WgpuMesh::Patch { control_points, count, .. } if draw.program.is_tessellated() => {
                        if *count != 16 {
                            tracing::warn!(count, mesh = draw.mesh.label(), "patch is not bicubic");
                        }
                        scratch.next().map(|s| self.patch_bindings(s, control_points))
                    }
                    _ => None,
                };
                PreparedDraw {
                    draw,
                    scene: self.scene_bind_group(offset, draw.uniforms.len() as u64),
                    patch,
                }
            })
            .collect();

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        Self::encode_patch_prepass(&mut encoder, &prepared);

        let clear = wgpu::Color {
            r: f64::from(frame.clear_color.x),
            g: f64::from(frame.clear_color.y),
            b: f64::from(frame.clear_color.z),
            a: 1.0,
        };
        // a frame without passes still clears
        let pass_sizes: Vec<(&str, usize)> = if frame.passes.is_empty() {
            vec![("clear", 0)]
        } else {
            frame.passes.iter().map(|p| (p.label, p.draws.len())).collect()
        };

        let mut cursor = 0;
        for (i, (label, len)) in pass_sizes.into_iter().enumerate() {
            let first = i == 0;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if first { wgpu::LoadOp::Clear(clear) } else { wgpu::LoadOp::Load },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.1,
                    depth_ops: Some(wgpu::Operations {
                        load: if first { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            for p in &prepared[cursor..cursor + len] {
                Self::encode_draw(&mut pass, p);
            }
            cursor += len;
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
