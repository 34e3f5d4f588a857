//! Mesh generation for the pool and water surface

use glam::Vec3;

use super::vertex::MeshVertex;
use crate::mesh::Mesh;

/// Subdivisions per side of the water surface grid
pub const WATER_DETAIL: u32 = 200;

/// Indexed triangle list ready for upload
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Square grid over [-1, 1] in x/y facing +z. The water shader lifts it
/// into the xz plane and displaces it from the height field.
pub fn water_plane(detail: u32) -> MeshData {
    let detail = detail.max(1);
    let side = detail + 1;
    let mut mesh = MeshData {
        vertices: Vec::with_capacity((side * side) as usize),
        indices: Vec::with_capacity((detail * detail * 6) as usize),
    };

    for j in 0..side {
        let v = j as f32 / detail as f32;
        for i in 0..side {
            let u = i as f32 / detail as f32;
            mesh.vertices.push(MeshVertex::new(
                [u * 2.0 - 1.0, v * 2.0 - 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [u, v],
            ));
        }
    }

    for j in 0..detail {
        for i in 0..detail {
            let a = j * side + i;
            let b = a + 1;
            let c = a + side;
            let d = c + 1;
            mesh.indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    mesh
}

/// Unit cube over [-1, 1] without its -y face. The wall shader flips y so
/// the missing face becomes the open rim.
pub fn open_cube() -> MeshData {
    // (outward normal, first tangent); the second tangent is normal x first
    const FACES: [(Vec3, Vec3); 5] = [
        (Vec3::NEG_X, Vec3::Z),
        (Vec3::X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Z, Vec3::Y),
        (Vec3::Z, Vec3::X),
    ];

    let mut mesh = MeshData::default();
    for (normal, u) in FACES {
        let v = normal.cross(u);
        let base = mesh.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = normal + u * su + v * sv;
            mesh.vertices.push(MeshVertex::new(
                p.to_array(),
                normal.to_array(),
                [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
            ));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Flatten an imported mesh into GPU vertices
pub fn model_mesh(mesh: &Mesh) -> MeshData {
    let vertices = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.texcoords)
        .map(|((p, n), t)| MeshVertex::new(p.to_array(), n.to_array(), t.to_array()))
        .collect();
    let indices = mesh.triangles.iter().flatten().copied().collect();
    MeshData { vertices, indices }
}
