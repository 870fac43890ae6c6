//! Procedural primitives for the scene.
//!
//! Every triangle generator winds counter-clockwise when seen from the side its
//! normals point to, so back-face culling with `FrontFace::Ccw` keeps the outside.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use super::mesh::{MeshData, PatchData, Vertex};

/// Unit sphere built from `stacks` latitude bands of `sectors` cells each.
///
/// Rows run from the north pole (i = 0) to the south pole (i = stacks). The first
/// and last band emit one triangle per cell; the second one would collapse onto the
/// pole.
pub fn sphere(sectors: u32, stacks: u32) -> MeshData {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    let mut vertices = Vec::with_capacity(((stacks + 1) * (sectors + 1)) as usize);
    for i in 0..=stacks {
        let latitude = FRAC_PI_2 - i as f32 * PI / stacks as f32;
        let (sin_lat, cos_lat) = latitude.sin_cos();
        for j in 0..=sectors {
            let longitude = j as f32 * TAU / sectors as f32;
            let (sin_lon, cos_lon) = longitude.sin_cos();
            let pos = Vec3::new(cos_lat * cos_lon, sin_lat, cos_lat * sin_lon);
            vertices.push(Vertex::new(
                pos,
                pos,
                [j as f32 / sectors as f32, i as f32 / stacks as f32],
            ));
        }
    }

    let mut indices = Vec::with_capacity((6 * sectors * (stacks - 1)) as usize);
    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;
        for _ in 0..sectors {
            if i != 0 {
                indices.extend_from_slice(&[k1, k1 + 1, k2]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[k1 + 1, k2 + 1, k2]);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    MeshData { vertices, indices }
}

/// Face of the unit cube: outward normal plus two in-plane axes with
/// `u × v = normal`, which makes the corner order below CCW from outside.
struct CubeFace {
    normal: Vec3,
    u: Vec3,
    v: Vec3,
}

const CUBE_FACES: [CubeFace; 6] = [
    // front
    CubeFace { normal: Vec3::Z, u: Vec3::X, v: Vec3::Y },
    // back
    CubeFace { normal: Vec3::NEG_Z, u: Vec3::NEG_X, v: Vec3::Y },
    // left
    CubeFace { normal: Vec3::NEG_X, u: Vec3::Z, v: Vec3::Y },
    // right
    CubeFace { normal: Vec3::X, u: Vec3::NEG_Z, v: Vec3::Y },
    // top
    CubeFace { normal: Vec3::Y, u: Vec3::X, v: Vec3::NEG_Z },
    // bottom
    CubeFace { normal: Vec3::NEG_Y, u: Vec3::X, v: Vec3::Z },
];

/// Unit cube centered at the origin. Faces do not share vertices so every face
/// keeps its own flat normal.
pub fn cube() -> MeshData {
    const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in &CUBE_FACES {
        let base = vertices.len() as u32;
        for (su, sv) in CORNERS {
            let pos = face.normal * 0.5 + face.u * su + face.v * sv;
            vertices.push(Vertex::new(pos, face.normal, [su + 0.5, sv + 0.5]));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    MeshData { vertices, indices }
}

/// Square of `size × size` in the XZ plane, facing +Y.
pub fn plane(size: f32) -> MeshData {
    let h = size / 2.0;
    let vertices = vec![
        Vertex::new(Vec3::new(-h, 0.0, -h), Vec3::Y, [0.0, 0.0]),
        Vertex::new(Vec3::new(h, 0.0, -h), Vec3::Y, [1.0, 0.0]),
        Vertex::new(Vec3::new(h, 0.0, h), Vec3::Y, [1.0, 1.0]),
        Vertex::new(Vec3::new(-h, 0.0, h), Vec3::Y, [0.0, 1.0]),
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];

    MeshData { vertices, indices }
}

/// Torus lying in the XZ plane, spanning `inner_radius..outer_radius` from the
/// center. `rings` cells run around the main ring (u), `sides` around the tube (v).
pub fn torus(inner_radius: f32, outer_radius: f32, rings: u32, sides: u32) -> MeshData {
    let rings = rings.max(3);
    let sides = sides.max(3);
    let tube_radius = (outer_radius - inner_radius) / 2.0;
    let center_radius = inner_radius + tube_radius;

    let mut vertices = Vec::with_capacity(((rings + 1) * (sides + 1)) as usize);
    for i in 0..=rings {
        let (su, cu) = (i as f32 / rings as f32 * TAU).sin_cos();
        for j in 0..=sides {
            let (sv, cv) = (j as f32 / sides as f32 * TAU).sin_cos();
            let reach = center_radius + tube_radius * cv;
            let pos = Vec3::new(reach * cu, tube_radius * sv, reach * su);
            let normal = Vec3::new(cv * cu, sv, cv * su);
            vertices.push(Vertex::new(
                pos,
                normal,
                [i as f32 / rings as f32, j as f32 / sides as f32],
            ));
        }
    }

    let mut indices = Vec::with_capacity((6 * rings * sides) as usize);
    for i in 0..rings {
        for j in 0..sides {
            let a = i * (sides + 1) + j;
            let b = a + sides + 1;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    MeshData { vertices, indices }
}

/// Open cylinder standing on the XZ plane: lateral surface only, no caps.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);

    let mut vertices = Vec::with_capacity((2 * (segments + 1)) as usize);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let (sin, cos) = (t * TAU).sin_cos();
        let normal = Vec3::new(cos, 0.0, sin);
        let rim = normal * radius;
        vertices.push(Vertex::new(rim, normal, [t, 0.0]));
        vertices.push(Vertex::new(rim + Vec3::Y * height, normal, [t, 1.0]));
    }

    let mut indices = Vec::with_capacity((6 * segments) as usize);
    for i in 0..segments {
        let bottom = i * 2;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;
        indices.extend_from_slice(&[bottom, top, next_bottom, top, next_top, next_bottom]);
    }

    MeshData { vertices, indices }
}

/// Size and placement of the flag cloth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagDimensions {
    pub width: f32,
    pub height: f32,
    /// Height of the bottom edge above the ground.
    pub bottom: f32,
}

impl Default for FlagDimensions {
    fn default() -> Self {
        Self {
            width: 1.5,
            height: 1.0,
            bottom: 2.3,
        }
    }
}

/// 4×4 control grid of a bicubic Bezier patch in the XY plane.
///
/// Point `i * 4 + j` sits at u = i/3 (x, away from the mast) and v = j/3 (y, bottom
/// to top). Row 0 is the edge held by the mast; row 3 is free.
pub fn bezier_patch(dims: FlagDimensions) -> PatchData {
    let mut control_points = Vec::with_capacity(16);
    for i in 0..4 {
        for j in 0..4 {
            control_points.push([
                i as f32 * dims.width / 3.0,
                dims.bottom + j as f32 * dims.height / 3.0,
                0.0,
            ]);
        }
    }
    PatchData { control_points }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &MeshData) {
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count), "index out of range");
        assert_eq!(mesh.index_count() % 3, 0);
    }

    /// Every triangle with a usable area must face the same way as the normals
    /// stored at its corners.
    fn assert_outward_winding(mesh: &MeshData) {
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (
                mesh.vertices[a].position(),
                mesh.vertices[b].position(),
                mesh.vertices[c].position(),
            );
            let face = (pb - pa).cross(pc - pa);
            if face.length() < 1e-7 {
                continue;
            }
            let corner_normals =
                mesh.vertices[a].normal() + mesh.vertices[b].normal() + mesh.vertices[c].normal();
            assert!(
                face.dot(corner_normals) > 0.0,
                "triangle ({a}, {b}, {c}) winds against its normals"
            );
        }
    }

    #[test]
    fn sphere_counts_follow_bands() {
        let mesh = sphere(32, 16);
        assert_eq!(mesh.vertex_count(), 17 * 33);
        assert_eq!(mesh.index_count(), 6 * 32 * 15);
        assert_indices_in_range(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn sphere_normals_are_unit_positions() {
        let mesh = sphere(12, 6);
        for v in &mesh.vertices {
            assert!((v.position().length() - 1.0).abs() < 1e-5);
            assert!((v.position() - v.normal()).length() < 1e-6);
        }
        assert!((mesh.vertices[0].position() - Vec3::Y).length() < 1e-6);
        assert!((mesh.vertices.last().unwrap().position() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn sphere_pole_bands_have_no_degenerate_triangles() {
        let mesh = sphere(8, 4);
        for [a, b, c] in mesh.triangles() {
            assert!(a != b && b != c && a != c);
            let (pa, pb, pc) = (
                mesh.vertices[a].position(),
                mesh.vertices[b].position(),
                mesh.vertices[c].position(),
            );
            assert!((pb - pa).cross(pc - pa).length() > 1e-6);
        }
    }

    #[test]
    fn sphere_raises_degenerate_arguments() {
        let mesh = sphere(0, 0);
        assert_eq!(mesh.vertex_count(), 3 * 4);
        assert!(mesh.index_count() > 0);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn cube_has_unshared_faces() {
        let mesh = cube();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_indices_in_range(&mesh);
        assert_outward_winding(&mesh);
        for v in &mesh.vertices {
            let p = v.position();
            assert!(p.abs().max_element() <= 0.5 + 1e-6);
            // the normal axis coordinate sits on the face
            assert!((p.dot(v.normal()) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(20.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
        assert_indices_in_range(&mesh);
        assert_outward_winding(&mesh);
        for v in &mesh.vertices {
            assert_eq!(v.normal(), Vec3::Y);
            assert_eq!(v.position().x.abs(), 10.0);
            assert_eq!(v.position().z.abs(), 10.0);
        }
    }

    #[test]
    fn torus_counts_and_winding() {
        let mesh = torus(0.3, 0.8, 32, 16);
        assert_eq!(mesh.vertex_count(), 33 * 17);
        assert_eq!(mesh.index_count(), 6 * 32 * 16);
        assert_indices_in_range(&mesh);
        assert_outward_winding(&mesh);
    }

    #[test]
    fn torus_spans_inner_to_outer_radius() {
        let mesh = torus(0.3, 0.8, 24, 12);
        let radial = |v: &Vertex| Vec3::new(v.pos[0], 0.0, v.pos[2]).length();
        let min = mesh.vertices.iter().map(radial).fold(f32::MAX, f32::min);
        let max = mesh.vertices.iter().map(radial).fold(f32::MIN, f32::max);
        assert!((min - 0.3).abs() < 1e-5);
        assert!((max - 0.8).abs() < 1e-5);
    }

    #[test]
    fn cylinder_is_open_and_outward() {
        let mesh = cylinder(0.05, 3.5, 16);
        assert_eq!(mesh.vertex_count(), 34);
        assert_eq!(mesh.index_count(), 96);
        assert_indices_in_range(&mesh);
        assert_outward_winding(&mesh);
        for pair in mesh.vertices.chunks_exact(2) {
            assert_eq!(pair[0].normal, pair[1].normal);
            assert_eq!(pair[0].normal[1], 0.0);
            assert_eq!(pair[0].pos[1], 0.0);
            assert_eq!(pair[1].pos[1], 3.5);
        }
    }

    #[test]
    fn bezier_patch_always_has_sixteen_points() {
        let variants = [
            FlagDimensions::default(),
            FlagDimensions { width: 4.0, height: 0.25, bottom: 0.0 },
            FlagDimensions { width: 0.1, height: 9.0, bottom: -3.0 },
        ];
        for dims in variants {
            let patch = bezier_patch(dims);
            assert_eq!(patch.control_point_count(), 16);
        }
    }

    #[test]
    fn bezier_patch_anchors_first_row_at_mast() {
        let dims = FlagDimensions::default();
        let patch = bezier_patch(dims);
        for j in 0..4 {
            assert_eq!(patch.point(j).x, 0.0);
            assert!((patch.point(12 + j).x - dims.width).abs() < 1e-6);
        }
        assert!((patch.point(0).y - dims.bottom).abs() < 1e-6);
        assert!((patch.point(3).y - (dims.bottom + dims.height)).abs() < 1e-6);
        assert!(patch.control_points.iter().all(|p| p[2] == 0.0));
    }
}
