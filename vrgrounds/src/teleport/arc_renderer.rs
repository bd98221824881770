use cgmath::{Quaternion, Vector3, Zero};
use engine::{Spline, SplinePoint};
use serde::Serialize;

/// A mesh deformed along one spline segment.
///
/// Positions and tangents are in the local space of the arc's spline,
/// which follows the right hand.
#[derive(Clone, Debug, Serialize)]
pub struct SplineMeshSegment {
    pub visible: bool,
    pub mesh: Option<String>,
    pub material: Option<String>,
    pub start_position: Vector3<f32>,
    pub start_tangent: Vector3<f32>,
    pub end_position: Vector3<f32>,
    pub end_tangent: Vector3<f32>,
}

impl SplineMeshSegment {
    fn new(mesh: Option<String>, material: Option<String>) -> Self {
        SplineMeshSegment {
            visible: false,
            mesh,
            material,
            start_position: Vector3::zero(),
            start_tangent: Vector3::zero(),
            end_position: Vector3::zero(),
            end_tangent: Vector3::zero(),
        }
    }

    fn set_start_and_end(
        &mut self,
        start: (Vector3<f32>, Vector3<f32>),
        end: (Vector3<f32>, Vector3<f32>),
    ) {
        self.start_position = start.0;
        self.start_tangent = start.1;
        self.end_position = end.0;
        self.end_tangent = end.1;
    }
}

/// Draws the teleport path as a chain of pooled spline meshes.
///
/// The pool only grows. Segments past the current path length stay in the
/// pool, hidden.
pub struct ArcRenderer {
    spline: Spline,
    pool: Vec<SplineMeshSegment>,
    arch_mesh: Option<String>,
    arch_material: Option<String>,
}

impl ArcRenderer {
    pub fn new(arch_mesh: Option<String>, arch_material: Option<String>) -> Self {
        ArcRenderer {
            spline: Spline::new(),
            pool: Vec::new(),
            arch_mesh,
            arch_material,
        }
    }

    /// Rebuild the spline from world-space `path` and show one segment per
    /// consecutive pair of points. `origin` and `rotation` are the world
    /// transform of the spline (the right hand). An empty path hides
    /// everything.
    pub fn draw_teleport_path(
        &mut self,
        path: &[Vector3<f32>],
        origin: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) {
        self.update_spline(path, origin, rotation);

        for segment in self.pool.iter_mut() {
            segment.visible = false;
        }

        let segment_count = path.len().saturating_sub(1);
        for i in 0..segment_count {
            if self.pool.len() <= i {
                self.pool.push(SplineMeshSegment::new(
                    self.arch_mesh.clone(),
                    self.arch_material.clone(),
                ));
            }

            let (Some(start), Some(end)) = (
                self.spline.location_and_tangent_at_spline_point(i),
                self.spline.location_and_tangent_at_spline_point(i + 1),
            ) else {
                continue;
            };

            let segment = &mut self.pool[i];
            segment.visible = true;
            segment.set_start_and_end(start, end);
        }
    }

    fn update_spline(
        &mut self,
        path: &[Vector3<f32>],
        origin: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) {
        let inverse = rotation.conjugate();
        self.spline.clear_spline_points(false);
        for (i, point) in path.iter().enumerate() {
            let local = inverse * (*point - origin);
            self.spline.add_point(SplinePoint::new(i as f32, local), false);
        }
        self.spline.update_spline();
    }

    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    pub fn segments(&self) -> &[SplineMeshSegment] {
        &self.pool
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn visible_segment_count(&self) -> usize {
        self.pool.iter().filter(|s| s.visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace, Rotation3, vec3};

    fn path(n: usize) -> Vec<Vector3<f32>> {
        (0..n).map(|i| vec3(0.0, 1.0, -(i as f32))).collect()
    }

    fn identity() -> Quaternion<f32> {
        Quaternion::from_angle_y(Deg(0.0))
    }

    #[test]
    fn test_segments_follow_path_length() {
        let mut renderer = ArcRenderer::new(Some("SM_TeleportArch".to_string()), None);
        renderer.draw_teleport_path(&path(5), Vector3::zero(), identity());

        assert_eq!(renderer.pool_size(), 4);
        assert_eq!(renderer.visible_segment_count(), 4);
        assert_eq!(renderer.spline().number_of_spline_points(), 5);
        assert_eq!(renderer.segments()[0].mesh.as_deref(), Some("SM_TeleportArch"));
    }

    #[test]
    fn test_surplus_segments_are_hidden() {
        let mut renderer = ArcRenderer::new(None, None);
        renderer.draw_teleport_path(&path(6), Vector3::zero(), identity());
        renderer.draw_teleport_path(&path(3), Vector3::zero(), identity());

        assert_eq!(renderer.pool_size(), 5);
        assert_eq!(renderer.visible_segment_count(), 2);
        assert!(renderer.segments()[2..].iter().all(|s| !s.visible));

        renderer.draw_teleport_path(&[], Vector3::zero(), identity());
        assert_eq!(renderer.visible_segment_count(), 0);
        assert_eq!(renderer.spline().number_of_spline_points(), 0);
    }

    #[test]
    fn test_segments_are_in_hand_space() {
        let mut renderer = ArcRenderer::new(None, None);
        let origin = vec3(2.0, 1.0, 0.0);
        let rotation = Quaternion::from_angle_y(Deg(90.0));
        let world = vec![origin, origin + vec3(-1.0, 0.0, 0.0)];
        renderer.draw_teleport_path(&world, origin, rotation);

        let segment = &renderer.segments()[0];
        assert!(segment.start_position.magnitude() < 1e-5);
        // Yawing 90 degrees left turns hand forward (-Z) into world -X
        assert!((segment.end_position - vec3(0.0, 0.0, -1.0)).magnitude() < 1e-5);
        assert!((segment.start_tangent - segment.end_tangent).magnitude() < 1e-5);
    }
}
