//! CPU mirror of a program's uniform struct.
//!
//! A [`UniformLayout`] lists the named fields a program reads, with offsets laid
//! out by the WGSL uniform address-space rules. The same layout renders the WGSL
//! struct declaration that every stage of the program is compiled against, so
//! the bytes in a [`UniformBlock`] always match what the GPU expects.

use std::collections::HashMap;
use std::fmt::Write as _;

use glam::{Mat3, Mat4, Vec2, Vec3};

pub use crate::model::uniforms::{
    UniformKind, UniformValue, Uniforms, POINT_LIGHT_COUNT, SPOT_LIGHT_COUNT,
};

/// Name of the WGSL struct type generated for every program.
pub const UNIFORM_STRUCT: &str = "SceneUniforms";
/// Name of the WGSL uniform variable stages read from.
pub const UNIFORM_VAR: &str = "scene";

impl UniformKind {
    pub fn align(self) -> usize {
        match self {
            UniformKind::Bool | UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Mat3 | UniformKind::Mat4 => 16,
        }
    }

    pub fn size(self) -> usize {
        match self {
            UniformKind::Bool | UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            // three vec3 columns, each padded to 16 bytes
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }

    pub fn wgsl_type(self) -> &'static str {
        match self {
            // bool is not host-shareable
            UniformKind::Bool => "u32",
            UniformKind::Int => "i32",
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Mat3 => "mat3x3<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }
}

impl UniformValue {
    fn write(&self, dst: &mut [u8]) {
        match *self {
            UniformValue::Bool(b) => dst[..4].copy_from_slice(&u32::from(b).to_le_bytes()),
            UniformValue::Int(i) => dst[..4].copy_from_slice(&i.to_le_bytes()),
            UniformValue::Float(f) => write_f32s(dst, &[f]),
            UniformValue::Vec2(v) => write_f32s(dst, &v.to_array()),
            UniformValue::Vec3(v) => write_f32s(dst, &v.to_array()),
            UniformValue::Mat3(m) => {
                for (col, chunk) in m.to_cols_array_2d().iter().zip(dst.chunks_mut(16)) {
                    write_f32s(chunk, col);
                }
            }
            UniformValue::Mat4(m) => write_f32s(dst, &m.to_cols_array()),
        }
    }

    fn read(kind: UniformKind, src: &[u8]) -> Self {
        let f = |i: usize| read_f32(src, i * 4);
        match kind {
            UniformKind::Bool => UniformValue::Bool(read_u32(src, 0) != 0),
            UniformKind::Int => UniformValue::Int(read_u32(src, 0) as i32),
            UniformKind::Float => UniformValue::Float(f(0)),
            UniformKind::Vec2 => UniformValue::Vec2(Vec2::new(f(0), f(1))),
            UniformKind::Vec3 => UniformValue::Vec3(Vec3::new(f(0), f(1), f(2))),
            UniformKind::Mat3 => UniformValue::Mat3(Mat3::from_cols(
                Vec3::new(f(0), f(1), f(2)),
                Vec3::new(f(4), f(5), f(6)),
                Vec3::new(f(8), f(9), f(10)),
            )),
            UniformKind::Mat4 => {
                let mut cols = [0.0; 16];
                for (i, c) in cols.iter_mut().enumerate() {
                    *c = f(i);
                }
                UniformValue::Mat4(Mat4::from_cols_array(&cols))
            }
        }
    }
}

fn write_f32s(dst: &mut [u8], values: &[f32]) {
    for (v, chunk) in values.iter().zip(dst.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}

fn read_u32(src: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&src[at..at + 4]);
    u32::from_le_bytes(b)
}

fn read_f32(src: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(src, at))
}

/// `pointLights[0].position` -> `pointLights_0_position`
pub fn wgsl_identifier(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            '[' | '.' => Some('_'),
            ']' => None,
            c => Some(c),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    index: HashMap<String, usize>,
    size: usize,
}

impl UniformLayout {
    /// Lays fields out in the given order. Later duplicates of a name are dropped.
    pub fn new<N: Into<String>>(fields: impl IntoIterator<Item = (N, UniformKind)>) -> Self {
        let mut layout = Self::default();
        let mut cursor: usize = 0;
        let mut max_align: usize = 16;
        for (name, kind) in fields {
            let name = name.into();
            if layout.index.contains_key(&name) {
                continue;
            }
            let offset = cursor.next_multiple_of(kind.align());
            cursor = offset + kind.size();
            max_align = max_align.max(kind.align());
            layout.index.insert(name.clone(), layout.fields.len());
            layout.fields.push(UniformField { name, kind, offset });
        }
        layout.size = cursor.next_multiple_of(max_align);
        layout
    }

    /// Size of the struct in bytes, rounded up to its alignment.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Decodes `name` from a byte snapshot laid out by this layout.
    pub fn read(&self, bytes: &[u8], name: &str) -> Option<UniformValue> {
        let field = self.field(name)?;
        let end = field.offset + field.kind.size();
        (end <= bytes.len()).then(|| UniformValue::read(field.kind, &bytes[field.offset..end]))
    }

    /// WGSL struct plus the `@group(0) @binding(0)` variable declaring it.
    pub fn wgsl_declaration(&self) -> String {
        let mut out = format!("struct {UNIFORM_STRUCT} {{\n");
        for field in &self.fields {
            // writing into a String cannot fail
            let _ = writeln!(out, "    {}: {},", wgsl_identifier(&field.name), field.kind.wgsl_type());
        }
        let _ = write!(
            out,
            "}}\n\n@group(0) @binding(0) var<uniform> {UNIFORM_VAR}: {UNIFORM_STRUCT};\n"
        );
        out
    }
}


/// Uniform values of one program, stored in GPU byte order.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let data = vec![0; layout.size()];
        Self { layout, data }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.layout.read(&self.data, name)
    }
}

impl Uniforms for UniformBlock {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(field) = self.layout.field(name) else {
            tracing::trace!(uniform = name, "not declared by program, ignored");
            return;
        };
        if field.kind != value.kind() {
            tracing::warn!(
                uniform = name,
                declared = ?field.kind,
                given = ?value.kind(),
                "uniform type mismatch, value ignored"
            );
            return;
        }
        let range = field.offset..field.offset + field.kind.size();
        value.write(&mut self.data[range]);
    }
}

/// Fields read by both programs: transforms plus the full lighting model.
fn lighting_fields() -> Vec<(String, UniformKind)> {
    use UniformKind::*;

    let mut fields: Vec<(String, UniformKind)> = [
        ("projection", Mat4),
        ("view", Mat4),
        ("model", Mat4),
        ("normalMatrix", Mat3),
        ("material.ambient", Vec3),
        ("material.diffuse", Vec3),
        ("material.specular", Vec3),
        ("material.shininess", Float),
        ("numPointLights", Int),
        ("numSpotLights", Int),
    ]
    .into_iter()
    .map(|(n, k)| (n.to_string(), k))
    .collect();

    for i in 0..POINT_LIGHT_COUNT {
        for (field, kind) in [
            ("position", Vec3),
            ("ambient", Vec3),
            ("diffuse", Vec3),
            ("specular", Vec3),
            ("constant", Float),
            ("linear", Float),
            ("quadratic", Float),
        ] {
            fields.push((format!("pointLights[{i}].{field}"), kind));
        }
    }
    for i in 0..SPOT_LIGHT_COUNT {
        for (field, kind) in [
            ("position", Vec3),
            ("direction", Vec3),
            ("ambient", Vec3),
            ("diffuse", Vec3),
            ("specular", Vec3),
            ("constant", Float),
            ("linear", Float),
            ("quadratic", Float),
            ("cutOff", Float),
            ("outerCutOff", Float),
        ] {
            fields.push((format!("spotLights[{i}].{field}"), kind));
        }
    }

    for (name, kind) in [
        ("fogColor", Vec3),
        ("fogEnabled", Bool),
        ("fogDensity", Float),
        ("dayNightFactor", Float),
        ("useBlinn", Bool),
    ] {
        fields.push((name.to_string(), kind));
    }
    fields
}

/// Layout of the program that draws every opaque mesh.
pub fn main_layout() -> UniformLayout {
    use UniformKind::*;

    let mut fields = lighting_fields();
    for (name, kind) in [
        ("objectColor", Vec3),
        ("useTexture", Bool),
        ("textureDiffuse", Int),
        ("checkerColor1", Vec3),
        ("useCheckerboard", Bool),
        ("checkerColor2", Vec3),
        ("checkerScale", Float),
    ] {
        fields.push((name.to_string(), kind));
    }
    UniformLayout::new(fields)
}

/// Layout of the tessellated flag program.
pub fn flag_layout() -> UniformLayout {
    use UniformKind::*;

    let mut fields = lighting_fields();
    for (name, kind) in [
        ("windDirection", Vec2),
        ("time", Float),
        ("windStrength", Float),
        ("tessLevelOuter", Int),
        ("tessLevelInner", Int),
        ("useFlagColors", Bool),
        ("flagColor1", Vec3),
        ("flagColor2", Vec3),
    ] {
        fields.push((name.to_string(), kind));
    }
    UniformLayout::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_uniform_alignment() {
        let layout = UniformLayout::new([
            ("a", UniformKind::Float),
            ("b", UniformKind::Vec3),
            ("c", UniformKind::Float),
            ("d", UniformKind::Vec2),
            ("e", UniformKind::Mat3),
            ("f", UniformKind::Bool),
        ]);
        let offsets: Vec<usize> = layout.fields().iter().map(|f| f.offset).collect();
        // vec3 aligns to 16, the float after it packs into its tail
        assert_eq!(offsets, vec![0, 16, 28, 32, 48, 96]);
        assert_eq!(layout.size(), 112);
    }

    #[test]
    fn duplicate_names_keep_first_declaration() {
        let layout = UniformLayout::new([("x", UniformKind::Float), ("x", UniformKind::Mat4)]);
        assert_eq!(layout.fields().len(), 1);
        assert_eq!(layout.field("x").map(|f| f.kind), Some(UniformKind::Float));
    }

    #[test]
    fn identifiers_flatten_array_and_field_access() {
        assert_eq!(wgsl_identifier("pointLights[0].position"), "pointLights_0_position");
        assert_eq!(wgsl_identifier("material.shininess"), "material_shininess");
        assert_eq!(wgsl_identifier("time"), "time");
    }

    #[test]
    fn declaration_lists_every_field() {
        let layout = flag_layout();
        let wgsl = layout.wgsl_declaration();
        assert!(wgsl.starts_with("struct SceneUniforms {"));
        assert!(wgsl.contains("spotLights_1_outerCutOff: f32,"));
        assert!(wgsl.contains("normalMatrix: mat3x3<f32>,"));
        assert!(wgsl.contains("@group(0) @binding(0) var<uniform> scene: SceneUniforms;"));
        assert_eq!(wgsl.matches(',').count(), layout.fields().len());
    }

    #[test]
    fn values_survive_the_byte_encoding() {
        let layout = UniformLayout::new([
            ("m3", UniformKind::Mat3),
            ("m4", UniformKind::Mat4),
            ("flag", UniformKind::Bool),
            ("n", UniformKind::Int),
        ]);
        let mut block = UniformBlock::new(layout);
        let m3 = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let m4 = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));
        block.set_mat3("m3", m3);
        block.set_mat4("m4", m4);
        block.set_bool("flag", true);
        block.set_int("n", -7);

        assert_eq!(block.get("m3"), Some(UniformValue::Mat3(m3)));
        assert_eq!(block.get("m4"), Some(UniformValue::Mat4(m4)));
        assert_eq!(block.get("flag"), Some(UniformValue::Bool(true)));
        assert_eq!(block.get("n"), Some(UniformValue::Int(-7)));
        // mat3 column padding stays zero
        assert_eq!(&block.bytes()[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn unknown_name_leaves_block_untouched() {
        let mut block = UniformBlock::new(main_layout());
        let before = block.bytes().to_vec();
        block.set_float("windStrength", 0.7);
        block.set_vec3("flagColor1", Vec3::ONE);
        assert_eq!(block.bytes(), before.as_slice());
        assert_eq!(block.get("windStrength"), None);
    }

    #[test]
    fn mismatched_kind_is_ignored() {
        let mut block = UniformBlock::new(main_layout());
        block.set_float("checkerScale", 10.0);
        block.set_int("checkerScale", 3);
        assert_eq!(block.get("checkerScale"), Some(UniformValue::Float(10.0)));
    }

    #[test]
    fn program_layouts_split_surface_and_object_names() {
        let main = main_layout();
        let flag = flag_layout();
        for shared in ["projection", "normalMatrix", "spotLights[1].cutOff", "fogDensity", "useBlinn"] {
            assert!(main.contains(shared) && flag.contains(shared), "{shared}");
        }
        for name in ["time", "windStrength", "windDirection", "tessLevelOuter", "flagColor2"] {
            assert!(!main.contains(name), "{name}");
            assert!(flag.contains(name), "{name}");
        }
        for name in ["objectColor", "useTexture", "textureDiffuse", "useCheckerboard", "checkerScale"] {
            assert!(main.contains(name), "{name}");
            assert!(!flag.contains(name), "{name}");
        }
        assert_eq!(main.size() % 16, 0);
        assert_eq!(flag.size() % 16, 0);
    }
}
