use bytemuck::NoUninit;
use glam::Vec3;

/// Interleaved vertex shared by every triangle mesh: position, normal, uv.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub fn new(pos: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            pos: pos.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.pos)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Indexed triangle list, CPU side.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Control points of a single surface patch. There is no index buffer: the
/// points are consumed in order as one patch primitive.
#[derive(Debug, Clone, Default)]
pub struct PatchData {
    pub control_points: Vec<[f32; 3]>,
}

impl PatchData {
    pub fn control_point_count(&self) -> u32 {
        self.control_points.len() as u32
    }

    pub fn point(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.control_points[index])
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.control_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 32);
    }

    #[test]
    fn byte_views_match_element_counts() {
        let mesh = MeshData {
            vertices: vec![Vertex::new(Vec3::ZERO, Vec3::Y, [0.0, 0.0]); 3],
            indices: vec![0, 1, 2],
        };
        assert_eq!(mesh.vertex_bytes().len(), 3 * 32);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);

        let patch = PatchData { control_points: vec![[0.0; 3]; 16] };
        assert_eq!(patch.bytes().len(), 16 * 12);
    }
}
