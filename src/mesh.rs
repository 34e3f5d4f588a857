//! Triangle mesh import for the optional dynamic model
//!
//! Supports the OBJ subset exported by common modeling tools: `v`, `vt`, `vn`
//! and `f` records (polygons are fan-triangulated, negative indices are
//! relative to the end of the list). Material color comes from the first `Kd`
//! line of an MTL file.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::error::MeshError;

/// Sphere enclosing every vertex of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Center of the axis-aligned box, radius to the farthest vertex
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        }
        let (min, max) = points
            .iter()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);
        Self { center, radius }
    }
}

/// Indexed triangle mesh with one normal and texcoord per vertex
#[derive(Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: BoundingSphere,
}

/// (position, texcoord, normal) record indices, zero-based
type VertexKey = (usize, Option<usize>, Option<usize>);

impl Mesh {
    /// Parse OBJ text into a mesh
    pub fn from_obj(text: &str) -> Result<Self, MeshError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut texcoords: Vec<Vec2> = Vec::new();

        let mut mesh = Mesh {
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            triangles: Vec::new(),
            bounds: BoundingSphere::from_points(&[]),
        };
        let mut vertex_map: HashMap<VertexKey, u32> = HashMap::new();
        let mut face_count = 0usize;

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(tag) = parts.next() else { continue };
            let rest: Vec<&str> = parts.collect();

            match tag {
                "v" => {
                    let [x, y, z] = parse_floats::<3>(&rest, line_no)?;
                    positions.push(Vec3::new(x, y, z));
                }
                "vn" => {
                    let [x, y, z] = parse_floats::<3>(&rest, line_no)?;
                    normals.push(Vec3::new(x, y, z));
                }
                "vt" => {
                    let [u, v] = parse_floats::<2>(&rest, line_no)?;
                    texcoords.push(Vec2::new(u, v));
                }
                "f" => {
                    face_count += 1;
                    let mut corners = Vec::with_capacity(rest.len());
                    for token in &rest {
                        let key = parse_face_token(
                            token,
                            line_no,
                            positions.len(),
                            texcoords.len(),
                            normals.len(),
                        )?;
                        let index = *vertex_map.entry(key).or_insert_with(|| {
                            let (p, t, n) = key;
                            mesh.positions.push(positions[p]);
                            mesh.texcoords.push(t.map(|t| texcoords[t]).unwrap_or(Vec2::ZERO));
                            mesh.normals.push(n.map(|n| normals[n]).unwrap_or(Vec3::Z));
                            (mesh.positions.len() - 1) as u32
                        });
                        corners.push(index);
                    }
                    for a in 1..corners.len().saturating_sub(1) {
                        mesh.triangles.push([corners[0], corners[a], corners[a + 1]]);
                    }
                }
                // Groups, objects, smoothing and material records don't affect geometry
                _ => {}
            }
        }

        if mesh.triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        mesh.bounds = BoundingSphere::from_points(&mesh.positions);
        log::info!(
            "Parsed OBJ: {} vertices, {} triangles, {} faces",
            mesh.positions.len(),
            mesh.triangles.len(),
            face_count
        );
        Ok(mesh)
    }
}

/// First `Kd r g b` diffuse color in MTL text
pub fn parse_mtl_color(text: &str) -> Option<[f32; 3]> {
    text.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        if parts.next()? != "Kd" {
            return None;
        }
        let rgb: Vec<f32> = parts.take(3).map_while(|p| p.parse().ok()).collect();
        (rgb.len() == 3).then(|| [rgb[0], rgb[1], rgb[2]])
    })
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize) -> Result<[f32; N], MeshError> {
    if parts.len() < N {
        return Err(MeshError::MissingComponents {
            line,
            expected: N,
            found: parts.len(),
        });
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(parts) {
        *slot = token.parse().map_err(|_| MeshError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

/// Resolve a one-based (or negative, relative) OBJ index
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, MeshError> {
    let raw: i64 = token.parse().map_err(|_| MeshError::InvalidNumber {
        line,
        token: token.to_string(),
    })?;
    let resolved = if raw < 0 { len as i64 + raw } else { raw - 1 };
    if resolved < 0 || resolved >= len as i64 {
        return Err(MeshError::IndexOutOfRange { line, index: raw });
    }
    Ok(resolved as usize)
}

/// `p`, `p/t`, `p//n` or `p/t/n`
fn parse_face_token(
    token: &str,
    line: usize,
    position_count: usize,
    texcoord_count: usize,
    normal_count: usize,
) -> Result<VertexKey, MeshError> {
    let mut comps = token.split('/');
    let p = resolve_index(comps.next().unwrap_or(""), position_count, line)?;
    let t = match comps.next() {
        Some(c) if !c.is_empty() => Some(resolve_index(c, texcoord_count, line)?),
        _ => None,
    };
    let n = match comps.next() {
        Some(c) if !c.is_empty() => Some(resolve_index(c, normal_count, line)?),
        _ => None,
    };
    Ok((p, t, n))
}

/// The dynamic model placed in every pool: a mesh plus its world transform
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub position: Vec3,
    pub scale: f32,
    pub color: [f32; 3],
}

impl Model {
    pub const DEFAULT_COLOR: [f32; 3] = [0.6, 0.6, 0.7];
    /// Scale factor applied per model-scale key press
    pub const SCALE_STEP: f32 = 1.1;

    pub fn new(mesh: Mesh, position: Vec3, scale: f32) -> Self {
        Self {
            mesh,
            position,
            scale,
            color: Self::DEFAULT_COLOR,
        }
    }

    /// Bounding sphere after the model's translation and uniform scale
    pub fn world_bounds(&self) -> BoundingSphere {
        BoundingSphere {
            center: self.position + self.mesh.bounds.center * self.scale,
            radius: self.mesh.bounds.radius * self.scale,
        }
    }

    pub fn scale_up(&mut self) {
        self.scale *= Self::SCALE_STEP;
    }

    pub fn scale_down(&mut self) {
        self.scale /= Self::SCALE_STEP;
    }
}
