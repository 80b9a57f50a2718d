use bytemuck::{Pod, Zeroable};

use crate::constants::{MESH_COLOR, MESH_SCALE};
use crate::error::AssetLoadError;

/// Interleaved vertex as uploaded to the GPU (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

/// Shader attribute names and their byte offsets inside [`Vertex`].
pub const VERTEX_ATTRIBUTES: [(&str, u64); 4] = [
    ("position", 0),
    ("normal", 12),
    ("sourceColor", 24),
    ("textureCoordIn", 40),
];

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Cube centred on the origin with per-face normals and UVs.
    pub fn cube() -> Self {
        // (normal, u axis, v axis) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let corners = [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (cu, cv) in corners {
                let p = [
                    (n[0] + u[0] * cu + v[0] * cv) * MESH_SCALE,
                    (n[1] + u[1] * cu + v[1] * cv) * MESH_SCALE,
                    (n[2] + u[2] * cu + v[2] * cv) * MESH_SCALE,
                ];
                vertices.push(Vertex {
                    position: p,
                    normal: n,
                    color: MESH_COLOR,
                    tex_coord: [(cu + 1.0) * 0.5, 1.0 - (cv + 1.0) * 0.5],
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    pub fn validate(&self, name: &str) -> Result<(), AssetLoadError> {
        let invalid = |reason: String| AssetLoadError::Invalid {
            name: name.to_string(),
            reason,
        };
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(invalid("empty mesh".to_string()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(invalid(format!("{} indices is not a triangle list", self.indices.len())));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(invalid(format!("index {bad} out of range")));
        }
        Ok(())
    }
}

/// Source of named meshes (e.g. `"cube"`).
pub trait AssetLoader {
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetLoadError>;
}

/// Meshes compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinAssets;

impl AssetLoader for BuiltinAssets {
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetLoadError> {
        match name {
            "cube" | "cube.obj" => Ok(MeshData::cube()),
            other => Err(AssetLoadError::NotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_attribute_offsets() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        let v = Vertex::zeroed();
        let base = &v as *const Vertex as usize;
        assert_eq!(&v.normal as *const _ as usize - base, 12);
        assert_eq!(&v.color as *const _ as usize - base, 24);
        assert_eq!(&v.tex_coord as *const _ as usize - base, 40);
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = MeshData::cube();
        assert!(cube.validate("cube").is_ok());
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| glam::Vec3::from(cube.vertices[tri[k] as usize].position));
            let n = glam::Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn unknown_asset_is_not_found() {
        assert_eq!(
            BuiltinAssets.load_mesh("teapot.obj"),
            Err(AssetLoadError::NotFound("teapot.obj".into()))
        );
    }
}
