// Navigation mesh
//
// A walkable surface made of convex polygonal cells over a shared vertex
// list. Cells are fan-triangulated at construction. The only query is
// point projection: snap a point onto the nearest walkable triangle, as
// long as the snapped point lies inside an axis-aligned box around the
// query point.

use cgmath::{InnerSpace, Vector3};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{GroundsError, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavMeshDefinition {
    pub vertices: Vec<[f32; 3]>,
    pub cells: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct NavMesh {
    triangles: Vec<Triangle>,
    cell_count: usize,
}

impl NavMesh {
    pub fn empty() -> NavMesh {
        NavMesh::default()
    }

    pub fn from_definition(definition: &NavMeshDefinition) -> Result<NavMesh> {
        let vertices: Vec<Vector3<f32>> = definition
            .vertices
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();

        let mut triangles = Vec::new();
        for (cell_index, cell) in definition.cells.iter().enumerate() {
            if cell.len() < 3 {
                return Err(GroundsError::validation(
                    format!("navmesh.cells[{}]", cell_index),
                    format!("cell needs at least 3 vertices, got {}", cell.len()),
                ));
            }
            if let Some(bad) = cell.iter().find(|i| **i >= vertices.len()) {
                return Err(GroundsError::validation(
                    format!("navmesh.cells[{}]", cell_index),
                    format!(
                        "vertex index {} out of range ({} vertices)",
                        bad,
                        vertices.len()
                    ),
                ));
            }

            let anchor = vertices[cell[0]];
            for pair in cell[1..].windows(2) {
                triangles.push(Triangle {
                    a: anchor,
                    b: vertices[pair[0]],
                    c: vertices[pair[1]],
                });
            }
        }

        Ok(NavMesh {
            triangles,
            cell_count: definition.cells.len(),
        })
    }

    /// Axis-aligned rectangle at height `y`, as a single cell.
    pub fn from_rect(min_x: f32, min_z: f32, max_x: f32, max_z: f32, y: f32) -> NavMesh {
        let definition = NavMeshDefinition {
            vertices: vec![
                [min_x, y, min_z],
                [max_x, y, min_z],
                [max_x, y, max_z],
                [min_x, y, max_z],
            ],
            cells: vec![vec![0, 1, 2, 3]],
        };
        // Four in-range indices always validate
        NavMesh::from_definition(&definition).unwrap_or_default()
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Snap `point` onto the closest navigable surface whose snapped
    /// position lies within `extent` (half-extents) of `point`.
    pub fn project_point(&self, point: Vector3<f32>, extent: Vector3<f32>) -> Option<Vector3<f32>> {
        self.triangles
            .iter()
            .map(|triangle| closest_point_on_triangle(point, triangle))
            .filter(|candidate| within_extent(*candidate - point, extent))
            .min_by_key(|candidate| OrderedFloat((*candidate - point).magnitude2()))
    }
}

fn within_extent(delta: Vector3<f32>, extent: Vector3<f32>) -> bool {
    delta.x.abs() <= extent.x && delta.y.abs() <= extent.y && delta.z.abs() <= extent.z
}

// Region-based closest point (Ericson, Real-Time Collision Detection 5.1.5)
fn closest_point_on_triangle(p: Vector3<f32>, t: &Triangle) -> Vector3<f32> {
    let ab = t.b - t.a;
    let ac = t.c - t.a;
    let ap = p - t.a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return t.a;
    }

    let bp = p - t.b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return t.b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return t.a + ab * v;
    }

    let cp = p - t.c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return t.c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return t.a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return t.b + (t.c - t.b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    t.a + ab * v + ac * w
}
