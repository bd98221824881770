use cgmath::{Deg, Vector3, Vector4, perspective};
use engine::CameraFade;

use super::CameraPose;

/// The local player's view of the world: the viewport the camera renders
/// into and the camera manager's fade overlay.
pub struct PlayerController {
    camera_fade: CameraFade,
    viewport_width: u32,
    viewport_height: u32,
    fov_y: Deg<f32>,
}

impl PlayerController {
    pub fn new(viewport_width: u32, viewport_height: u32, fov_y: Deg<f32>) -> Self {
        PlayerController {
            camera_fade: CameraFade::new(),
            viewport_width: viewport_width.max(1),
            viewport_height: viewport_height.max(1),
            fov_y,
        }
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn camera_fade(&self) -> &CameraFade {
        &self.camera_fade
    }

    pub fn camera_fade_mut(&mut self) -> &mut CameraFade {
        &mut self.camera_fade
    }

    /// Project a world location into viewport pixels (origin top left).
    /// Returns None for points at or behind the camera plane. Points outside
    /// the view frustum still project, to coordinates outside the viewport.
    pub fn project_world_location_to_screen(
        &self,
        camera: &CameraPose,
        world_location: Vector3<f32>,
    ) -> Option<(f32, f32)> {
        let view = camera.rotation.conjugate() * (world_location - camera.position);
        if view.z >= 0.0 {
            return None;
        }

        let aspect = self.viewport_width as f32 / self.viewport_height as f32;
        let projection = perspective(self.fov_y, aspect, 0.1, 10_000.0);
        let clip = projection * Vector4::new(view.x, view.y, view.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let x = (ndc_x + 1.0) * 0.5 * self.viewport_width as f32;
        let y = (1.0 - ndc_y) * 0.5 * self.viewport_height as f32;
        Some((x, y))
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        PlayerController::new(1920, 1080, Deg(90.0))
    }
}
