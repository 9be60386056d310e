//! CPU-side mesh representation.

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Rectangle in the XY plane centred on the origin, facing +Z.
    /// UV (0,0) is the top-left corner so images appear upright.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = [0.0, 0.0, 1.0];
        let vertices = vec![
            MeshVertex::new([-hw, -hh, 0.0], n, [0.0, 1.0]),
            MeshVertex::new([hw, -hh, 0.0], n, [1.0, 1.0]),
            MeshVertex::new([hw, hh, 0.0], n, [1.0, 0.0]),
            MeshVertex::new([-hw, hh, 0.0], n, [0.0, 0.0]),
        ];
        // CCW seen from +Z
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_spans_requested_size() {
        let plane = MeshData::plane(5.0, 8.0);
        assert!(plane.is_valid());
        assert_eq!(plane.indices.len(), 6);

        let xs: Vec<f32> = plane.vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = plane.vertices.iter().map(|v| v.position[1]).collect();
        let span = |v: &[f32]| {
            v.iter().cloned().fold(f32::MIN, f32::max) - v.iter().cloned().fold(f32::MAX, f32::min)
        };
        assert!((span(&xs) - 5.0).abs() < 1e-6);
        assert!((span(&ys) - 8.0).abs() < 1e-6);
        assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }
}
