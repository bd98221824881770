use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        CurveKey { time, value }
    }
}

/// A piecewise-linear float curve, clamped at both ends.
///
/// Keys are kept sorted by time. An empty curve evaluates to 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct FloatCurve {
    keys: Vec<CurveKey>,
}

impl FloatCurve {
    pub fn from_keys(keys: Vec<CurveKey>) -> Self {
        let mut keys: Vec<CurveKey> = keys.into_iter().filter(|k| k.time.is_finite()).collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        FloatCurve { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get_float_value(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed to exist and be > 0 here
        let upper = self.keys.partition_point(|k| k.time <= time);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        let alpha = (time - a.time) / span;
        a.value + (b.value - a.value) * alpha
    }
}

impl From<Vec<CurveKey>> for FloatCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        FloatCurve::from_keys(keys)
    }
}

impl From<FloatCurve> for Vec<CurveKey> {
    fn from(curve: FloatCurve) -> Self {
        curve.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vignette_curve() -> FloatCurve {
        FloatCurve::from_keys(vec![
            CurveKey::new(3.0, 0.4),
            CurveKey::new(0.0, 1.0),
            CurveKey::new(1.0, 0.7),
        ])
    }

    #[test]
    fn test_empty_curve_is_zero() {
        assert_eq!(FloatCurve::default().get_float_value(12.0), 0.0);
    }

    #[test]
    fn test_keys_are_sorted() {
        let times: Vec<f32> = vignette_curve().keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_clamps_outside_range() {
        let curve = vignette_curve();
        assert_eq!(curve.get_float_value(-5.0), 1.0);
        assert_eq!(curve.get_float_value(0.0), 1.0);
        assert_eq!(curve.get_float_value(3.0), 0.4);
        assert_eq!(curve.get_float_value(100.0), 0.4);
    }

    #[test]
    fn test_linear_interpolation() {
        let curve = vignette_curve();
        assert!((curve.get_float_value(0.5) - 0.85).abs() < 1e-5);
        assert!((curve.get_float_value(2.0) - 0.55).abs() < 1e-5);
        assert!((curve.get_float_value(1.0) - 0.7).abs() < 1e-5);
    }
}
