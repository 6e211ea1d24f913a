//! Dot geometry: one merged mesh per category, an octahedron per reading

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::api::SensorReading;
use crate::core::coordinates::{DOT_RADIUS, ProjectionMode, project};

const AXES: [Vec3; 6] = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

/// Project readings onto the dot surface, in scene-root space.
pub fn dot_positions(readings: &[SensorReading], mode: ProjectionMode) -> Vec<Vec3> {
    readings.iter().map(|r| project(r.coord, DOT_RADIUS, mode)).collect()
}

/// Octahedron index triples, wound outward.
fn octahedron_faces() -> impl Iterator<Item = [u32; 3]> {
    (0..8u32).map(|octant| {
        let sx = octant & 1;
        let sy = (octant >> 1) & 1;
        let sz = (octant >> 2) & 1;
        // AXES pairs are (+, -): index 2k is positive, 2k+1 negative
        let (a, b, c) = (sx, 2 + sy, 4 + sz);
        if (sx + sy + sz) % 2 == 0 { [a, b, c] } else { [a, c, b] }
    })
}

/// Build one mesh holding an octahedron of `size` (tip to tip) at each position.
pub fn build_dot_mesh(positions: &[Vec3], size: f32) -> Mesh {
    let half = size * 0.5;
    let mut vertices = Vec::with_capacity(positions.len() * AXES.len());
    let mut normals = Vec::with_capacity(positions.len() * AXES.len());
    let mut indices = Vec::with_capacity(positions.len() * 24);

    for (i, center) in positions.iter().enumerate() {
        let base = (i * AXES.len()) as u32;
        for axis in AXES {
            vertices.push(*center + axis * half);
            normals.push(axis);
        }
        for face in octahedron_faces() {
            indices.extend(face.iter().map(|v| base + v));
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vertices)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_point_outward() {
        for [a, b, c] in octahedron_faces() {
            let (a, b, c) = (AXES[a as usize], AXES[b as usize], AXES[c as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn mesh_counts_scale_with_points() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let mesh = build_dot_mesh(&positions, 0.1);
        assert_eq!(mesh.count_vertices(), 18);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(72));
    }

    #[test]
    fn vertices_are_centered_on_positions() {
        let mesh = build_dot_mesh(&[Vec3::new(1.0, 2.0, 3.0)], 0.2);
        let Some(bevy::mesh::VertexAttributeValues::Float32x3(verts)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
            panic!("missing positions");
        };
        let sum = verts.iter().fold(Vec3::ZERO, |acc, v| acc + Vec3::from_array(*v));
        assert!((sum / 6.0 - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((Vec3::from_array(verts[0]) - Vec3::new(1.1, 2.0, 3.0)).length() < 1e-6);
    }
}
