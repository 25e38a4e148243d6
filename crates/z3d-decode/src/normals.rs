//! Vertex normal reconstruction.
//!
//! Stored normals are unreliable, so they are rebuilt from the final
//! triangle set once an object is complete.

use glam::Vec3;

use crate::scene::{Face, Vertex};

/// Recompute every vertex normal from `faces`.
///
/// Each face contributes its unit normal weighted by the corner angle at
/// the vertex. Vertices that no face touches point away from the origin.
pub fn recompute_normals(vertices: &mut [Vertex], faces: &[Face]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];

    for face in faces {
        let corners = face.indices.map(|index| index as usize);
        let Some(points) = corner_positions(vertices, corners) else {
            continue;
        };
        let normal = (points[1] - points[0])
            .cross(points[2] - points[0])
            .normalize_or_zero();
        if normal == Vec3::ZERO {
            continue;
        }

        for k in 0..3 {
            let a = (points[(k + 1) % 3] - points[k]).normalize_or_zero();
            let b = (points[(k + 2) % 3] - points[k]).normalize_or_zero();
            let angle = a.dot(b).clamp(-1.0, 1.0).acos();
            sums[corners[k]] += normal * angle;
        }
    }

    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        vertex.normal = sum
            .try_normalize()
            .unwrap_or_else(|| vertex.position.normalize_or_zero());
    }
}

fn corner_positions(vertices: &[Vertex], corners: [usize; 3]) -> Option<[Vec3; 3]> {
    Some([
        vertices.get(corners[0])?.position,
        vertices.get(corners[1])?.position,
        vertices.get(corners[2])?.position,
    ])
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::chunk::StateFlags;
    use crate::descriptor::RenderFlags;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex {
            position: Vec3::new(x, y, z),
            normal: Vec3::ZERO,
            flags: StateFlags::empty(),
            misc: [0; 4],
        }
    }

    fn face(indices: [u32; 3]) -> Face {
        Face {
            indices,
            uvs: [Vec2::ZERO; 3],
            material: 0,
            material_slot: None,
            flags: StateFlags::empty(),
            misc: [0; 4],
            render_flags: RenderFlags::default(),
            hidden: false,
        }
    }

    #[test]
    fn flat_quad_faces_up() {
        let mut vertices = vec![
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
            vertex(1.0, 1.0, 0.0),
            vertex(0.0, 1.0, 0.0),
        ];
        let faces = [face([0, 1, 2]), face([0, 2, 3])];
        recompute_normals(&mut vertices, &faces);
        for v in &vertices {
            assert!(v.normal.abs_diff_eq(Vec3::Z, 1e-6), "{:?}", v.normal);
        }
    }

    #[test]
    fn corners_are_weighted_by_angle() {
        // A 90° corner facing +Z and a 45° corner facing +X share vertex 0.
        let mut vertices = vec![
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
            vertex(0.0, 1.0, 0.0),
            vertex(0.0, 1.0, 1.0),
        ];
        let faces = [face([0, 1, 2]), face([0, 2, 3])];
        recompute_normals(&mut vertices, &faces);
        let expected = Vec3::new(1.0, 0.0, 2.0).normalize();
        assert!(vertices[0].normal.abs_diff_eq(expected, 1e-5), "{:?}", vertices[0].normal);
    }

    #[test]
    fn loose_vertices_point_outwards() {
        let mut vertices = vec![vertex(0.0, 3.0, 4.0), vertex(0.0, 0.0, 0.0)];
        recompute_normals(&mut vertices, &[]);
        assert!(vertices[0].normal.abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-6));
        assert_eq!(vertices[1].normal, Vec3::ZERO);
    }

    #[test]
    fn out_of_range_faces_are_ignored() {
        let mut vertices = vec![vertex(1.0, 0.0, 0.0)];
        recompute_normals(&mut vertices, &[face([0, 1, 2])]);
        assert!(vertices[0].normal.abs_diff_eq(Vec3::X, 1e-6));
    }
}
