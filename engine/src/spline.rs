use cgmath::{Vector3, Zero};

/// A control point of a curve-type spline, in the spline's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplinePoint {
    pub input_key: f32,
    pub position: Vector3<f32>,
}

impl SplinePoint {
    pub fn new(input_key: f32, position: Vector3<f32>) -> Self {
        SplinePoint {
            input_key,
            position,
        }
    }
}

/// Cubic Hermite spline with automatically computed tangents.
///
/// Tangents are recomputed by `update_spline`; points added with
/// `update_spline = false` leave the tangents stale until then.
#[derive(Clone, Debug, Default)]
pub struct Spline {
    points: Vec<SplinePoint>,
    tangents: Vec<Vector3<f32>>,
}

impl Spline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_spline_points(&mut self, update_spline: bool) {
        self.points.clear();
        if update_spline {
            self.update_spline();
        }
    }

    pub fn add_point(&mut self, point: SplinePoint, update_spline: bool) {
        let index = self.points.partition_point(|p| p.input_key <= point.input_key);
        self.points.insert(index, point);
        if update_spline {
            self.update_spline();
        }
    }

    pub fn number_of_spline_points(&self) -> usize {
        self.points.len()
    }

    /// Recompute tangents. Interior points use the average of the adjacent
    /// chords; end points treat the missing neighbour as the point itself.
    pub fn update_spline(&mut self) {
        let count = self.points.len();
        self.tangents = (0..count)
            .map(|i| {
                let p = self.points[i].position;
                let prev = if i > 0 { self.points[i - 1].position } else { p };
                let next = if i + 1 < count {
                    self.points[i + 1].position
                } else {
                    p
                };
                ((p - prev) + (next - p)) * 0.5
            })
            .collect();
    }

    pub fn location_and_tangent_at_spline_point(
        &self,
        index: usize,
    ) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let point = self.points.get(index)?;
        let tangent = self.tangents.get(index).copied().unwrap_or_else(Vector3::zero);
        Some((point.position, tangent))
    }

    /// Hermite interpolation on the segment starting at `index`, `t` in [0, 1].
    pub fn location_on_segment(&self, index: usize, t: f32) -> Option<Vector3<f32>> {
        let (p0, m0) = self.location_and_tangent_at_spline_point(index)?;
        let (p1, m1) = self.location_and_tangent_at_spline_point(index + 1)?;
        let t = t.clamp(0.0, 1.0);
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        Some(p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11)
    }
}
