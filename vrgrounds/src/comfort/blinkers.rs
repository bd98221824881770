use cgmath::{InnerSpace, Vector3};
use engine::materials::{LinearColor, MaterialInstanceDynamic, PostProcessComponent};
use engine::{CurveKey, FloatCurve, comfort_log};
use serde::{Deserialize, Serialize};

use crate::character::{CameraPose, PlayerController};

pub const RADIUS_PARAMETER: &str = "Radius";
pub const CENTER_PARAMETER: &str = "Center";

const SCREEN_CENTER: (f32, f32) = (0.5, 0.5);
const STATIONARY_DISTANCE: f32 = 10.0;
const MIN_SPEED: f32 = 1e-3;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkerConfig {
    /// Post-process material to instance. None disables the vignette.
    pub material_base: Option<String>,
    /// Bias the vignette toward the direction of travel
    pub directional: bool,
    /// Vignette radius as a function of speed (m/s). None disables the
    /// vignette.
    pub radius_vs_velocity: Option<FloatCurve>,
}

impl Default for BlinkerConfig {
    fn default() -> Self {
        BlinkerConfig {
            material_base: Some("M_TunnelVision".to_string()),
            directional: true,
            radius_vs_velocity: Some(FloatCurve::from_keys(vec![
                CurveKey::new(0.0, 1.0),
                CurveKey::new(1.0, 0.6),
                CurveKey::new(3.0, 0.4),
            ])),
        }
    }
}

/// Tunnel-vision vignette driven by the character's speed.
pub struct Blinkers {
    config: BlinkerConfig,
    blendable: Option<usize>,
    radius: Option<f32>,
    center: (f32, f32),
}

impl Blinkers {
    /// Create the dynamic material instance and register it as a
    /// post-process blendable.
    pub fn begin_play(config: BlinkerConfig, post_process: &mut PostProcessComponent) -> Self {
        let blendable = config.material_base.as_ref().map(|base| {
            let material = MaterialInstanceDynamic::create(base.clone());
            post_process.add_or_update_blendable(material)
        });

        if blendable.is_none() {
            comfort_log!(INFO, "no blinker material configured, vignette disabled");
        }

        Blinkers {
            config,
            blendable,
            radius: None,
            center: SCREEN_CENTER,
        }
    }

    /// Write the vignette radius (and center) for the current velocity.
    /// A no-op without both a curve and a material instance.
    pub fn update(
        &mut self,
        post_process: &mut PostProcessComponent,
        velocity: Vector3<f32>,
        camera: &CameraPose,
        player_controller: Option<&PlayerController>,
    ) {
        let Some(curve) = self.config.radius_vs_velocity.as_ref() else {
            return;
        };
        let Some(material) = self
            .blendable
            .and_then(|index| post_process.blendable_mut(index))
        else {
            return;
        };

        let speed = velocity.magnitude();
        let radius = curve.get_float_value(speed);
        material.set_scalar_parameter_value(RADIUS_PARAMETER, radius);

        let center = if self.config.directional {
            blinker_center(velocity, camera, player_controller)
        } else {
            SCREEN_CENTER
        };
        material.set_vector_parameter_value(
            CENTER_PARAMETER,
            LinearColor::rgb(center.0, center.1, 0.0),
        );

        comfort_log!(
            TRACE,
            "blinkers speed={:.2} radius={:.3} center=({:.3}, {:.3})",
            speed,
            radius,
            center.0,
            center.1
        );
        self.radius = Some(radius);
        self.center = center;
    }

    pub fn radius(&self) -> Option<f32> {
        self.radius
    }

    pub fn center(&self) -> (f32, f32) {
        self.center
    }

    pub fn blendable_index(&self) -> Option<usize> {
        self.blendable
    }

    pub fn config(&self) -> &BlinkerConfig {
        &self.config
    }
}

/// Normalized screen position of a point 10 m along (or against) the
/// direction of travel. The sign follows the camera: moving backwards
/// biases toward the point ahead of the camera instead of behind it.
pub fn blinker_center(
    velocity: Vector3<f32>,
    camera: &CameraPose,
    player_controller: Option<&PlayerController>,
) -> (f32, f32) {
    if velocity.magnitude() < MIN_SPEED {
        return SCREEN_CENTER;
    }
    let direction = velocity.normalize();

    let stationary_location = if camera.forward().dot(direction) > 0.0 {
        camera.position + direction * STATIONARY_DISTANCE
    } else {
        camera.position - direction * STATIONARY_DISTANCE
    };

    let Some(player_controller) = player_controller else {
        return SCREEN_CENTER;
    };
    let Some((x, y)) = player_controller.project_world_location_to_screen(camera, stationary_location)
    else {
        return SCREEN_CENTER;
    };

    let (width, height) = player_controller.viewport_size();
    let normalized = (x / width as f32, y / height as f32);
    if !(0.0..=1.0).contains(&normalized.0) || !(0.0..=1.0).contains(&normalized.1) {
        return SCREEN_CENTER;
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Quaternion, Rotation3, Zero, vec3};

    fn camera() -> CameraPose {
        CameraPose {
            position: vec3(0.0, 1.7, 0.0),
            rotation: Quaternion::from_angle_y(Deg(0.0)),
        }
    }

    fn radius_of(post_process: &PostProcessComponent, blinkers: &Blinkers) -> Option<f32> {
        post_process
            .blendable(blinkers.blendable_index()?)?
            .scalar_parameter_value(RADIUS_PARAMETER)
    }

    fn center_of(post_process: &PostProcessComponent, blinkers: &Blinkers) -> Option<LinearColor> {
        post_process
            .blendable(blinkers.blendable_index()?)?
            .vector_parameter_value(CENTER_PARAMETER)
    }

    #[test]
    fn test_radius_follows_curve() {
        let mut post_process = PostProcessComponent::new();
        let mut blinkers = Blinkers::begin_play(BlinkerConfig::default(), &mut post_process);
        let pc = PlayerController::default();

        blinkers.update(&mut post_process, Vector3::zero(), &camera(), Some(&pc));
        assert_eq!(radius_of(&post_process, &blinkers), Some(1.0));

        blinkers.update(&mut post_process, vec3(0.0, 0.0, -2.0), &camera(), Some(&pc));
        let radius = radius_of(&post_process, &blinkers).unwrap();
        assert!((radius - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_stationary_is_centered() {
        let mut post_process = PostProcessComponent::new();
        let mut blinkers = Blinkers::begin_play(BlinkerConfig::default(), &mut post_process);
        let pc = PlayerController::default();

        blinkers.update(&mut post_process, Vector3::zero(), &camera(), Some(&pc));
        let center = center_of(&post_process, &blinkers).unwrap();
        assert_eq!((center.r, center.g, center.b), (0.5, 0.5, 0.0));
    }

    #[test]
    fn test_center_biased_toward_travel() {
        let pc = PlayerController::default();
        // Moving forward and to the right
        let (x, y) = blinker_center(vec3(1.0, 0.0, -3.0), &camera(), Some(&pc));
        assert!(x > 0.5);
        assert!((y - 0.5).abs() < 1e-4);

        // Backing up and to the right: the opposite point is in view, to the left
        let (x, _) = blinker_center(vec3(1.0, 0.0, 3.0), &camera(), Some(&pc));
        assert!(x < 0.5);
    }

    #[test]
    fn test_center_falls_back_to_middle() {
        // No player controller
        assert_eq!(blinker_center(vec3(1.0, 0.0, -3.0), &camera(), None), (0.5, 0.5));

        // Sideways motion projects outside the viewport
        let pc = PlayerController::default();
        assert_eq!(blinker_center(vec3(1.0, 0.0, 0.0), &camera(), Some(&pc)), (0.5, 0.5));
    }

    #[test]
    fn test_non_directional_is_centered() {
        let mut post_process = PostProcessComponent::new();
        let config = BlinkerConfig {
            directional: false,
            ..BlinkerConfig::default()
        };
        let mut blinkers = Blinkers::begin_play(config, &mut post_process);
        let pc = PlayerController::default();

        blinkers.update(&mut post_process, vec3(1.0, 0.0, -3.0), &camera(), Some(&pc));
        assert_eq!(blinkers.center(), (0.5, 0.5));
    }

    #[test]
    fn test_missing_curve_or_material_disables() {
        let pc = PlayerController::default();

        let mut post_process = PostProcessComponent::new();
        let no_curve = BlinkerConfig {
            radius_vs_velocity: None,
            ..BlinkerConfig::default()
        };
        let mut blinkers = Blinkers::begin_play(no_curve, &mut post_process);
        blinkers.update(&mut post_process, vec3(0.0, 0.0, -2.0), &camera(), Some(&pc));
        assert_eq!(radius_of(&post_process, &blinkers), None);
        assert_eq!(blinkers.radius(), None);

        let mut post_process = PostProcessComponent::new();
        let no_material = BlinkerConfig {
            material_base: None,
            ..BlinkerConfig::default()
        };
        let mut blinkers = Blinkers::begin_play(no_material, &mut post_process);
        blinkers.update(&mut post_process, vec3(0.0, 0.0, -2.0), &camera(), Some(&pc));
        assert_eq!(post_process.blendable_count(), 0);
        assert_eq!(blinkers.radius(), None);
    }
}
