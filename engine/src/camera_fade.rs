use std::time::Duration;

use cgmath::Vector3;

/// Full-screen color fade, as driven by a player camera manager.
///
/// Alpha 0 is fully transparent, 1 fully covers the view with `color`.
#[derive(Clone, Debug)]
pub struct CameraFade {
    from_alpha: f32,
    to_alpha: f32,
    duration: Duration,
    elapsed: Duration,
    color: Vector3<f32>,
    active: bool,
}

impl CameraFade {
    pub fn new() -> Self {
        CameraFade {
            from_alpha: 0.0,
            to_alpha: 0.0,
            duration: Duration::ZERO,
            elapsed: Duration::ZERO,
            color: Vector3::new(0.0, 0.0, 0.0),
            active: false,
        }
    }

    pub fn start_camera_fade(
        &mut self,
        from_alpha: f32,
        to_alpha: f32,
        duration: Duration,
        color: Vector3<f32>,
    ) {
        self.from_alpha = from_alpha.clamp(0.0, 1.0);
        self.to_alpha = to_alpha.clamp(0.0, 1.0);
        self.duration = duration;
        self.elapsed = Duration::ZERO;
        self.color = color;
        self.active = true;
    }

    pub fn stop_camera_fade(&mut self) {
        self.active = false;
        self.from_alpha = 0.0;
        self.to_alpha = 0.0;
    }

    /// Advance the fade. Returns true on the frame the fade completes.
    pub fn update(&mut self, elapsed: Duration) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed += elapsed;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.active = false;
            return true;
        }
        false
    }

    pub fn is_fading(&self) -> bool {
        self.active
    }

    /// Current overlay alpha. A completed fade holds its target alpha.
    pub fn alpha(&self) -> f32 {
        if self.duration.is_zero() {
            return self.to_alpha;
        }
        let t = (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.from_alpha + (self.to_alpha - self.from_alpha) * t
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }
}

impl Default for CameraFade {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);

    #[test]
    fn test_fade_interpolates_and_holds_target() {
        let mut fade = CameraFade::new();
        fade.start_camera_fade(0.0, 1.0, Duration::from_secs(1), BLACK);

        assert!(!fade.update(Duration::from_millis(250)));
        assert!((fade.alpha() - 0.25).abs() < 1e-5);
        assert!(fade.is_fading());

        assert!(fade.update(Duration::from_millis(800)));
        assert!(!fade.is_fading());
        assert_eq!(fade.alpha(), 1.0);

        // Completion is only reported once
        assert!(!fade.update(Duration::from_millis(16)));
        assert_eq!(fade.alpha(), 1.0);
    }

    #[test]
    fn test_zero_duration_fade_jumps_to_target() {
        let mut fade = CameraFade::new();
        fade.start_camera_fade(1.0, 0.0, Duration::ZERO, BLACK);
        assert_eq!(fade.alpha(), 0.0);
        assert!(fade.update(Duration::ZERO));
    }
}
