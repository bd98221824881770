use std::time::Duration;

use cgmath::{InnerSpace, Vector3, Zero, vec3};
use engine::{CameraFade, TimerManager, teleport_log};
use serde::{Deserialize, Serialize};

use crate::effect::GameTimer;
use crate::navigation::NavMesh;
use crate::physics::PhysicsWorld;

use super::{ArcTrajectory, PredictProjectileParams};

/// How the teleport destination is found
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeleportTargeting {
    /// Predicted projectile path under gravity
    Arc,
    /// Single ray of `max_teleport_distance`
    Straight,
}

/// Configuration for the teleport system
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    pub targeting: TeleportTargeting,
    pub max_teleport_distance: f32,
    /// Seconds for each half of the fade
    pub fade_time: f32,
    /// Half extents of the box a hit point may be snapped within
    pub projection_extent: Vector3<f32>,
    pub projectile_radius: f32,
    pub projectile_speed: f32,
    pub simulation_time: f32,
    pub sim_frequency: f32,
    pub gravity: f32,
    pub arch_mesh: Option<String>,
    pub arch_material: Option<String>,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        TeleportConfig {
            targeting: TeleportTargeting::Arc,
            max_teleport_distance: 10.0,
            fade_time: 1.0,
            projection_extent: vec3(1.0, 1.0, 1.0),
            projectile_radius: 0.1,
            projectile_speed: 10.0,
            simulation_time: 1.0,
            sim_frequency: 15.0,
            gravity: 9.8,
            arch_mesh: Some("SM_TeleportArch".to_string()),
            arch_material: Some("M_TeleportArch".to_string()),
        }
    }
}

impl TeleportConfig {
    pub fn fade_duration(&self) -> Duration {
        Duration::from_secs_f32(self.fade_time.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TeleportPhase {
    Idle,
    FadingOut,
    FadingIn,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DestinationMarker {
    pub visible: bool,
    pub location: Vector3<f32>,
}

/// Destination targeting plus the fade-out / relocate / fade-in sequence.
///
/// The system never moves the character itself: `finish_teleport` hands
/// back the location to move to.
pub struct TeleportSystem {
    config: TeleportConfig,
    phase: TeleportPhase,
    marker: DestinationMarker,
    last_valid_location: Option<Vector3<f32>>,
    current_path: Vec<Vector3<f32>>,
}

impl TeleportSystem {
    pub fn new(config: TeleportConfig) -> Self {
        TeleportSystem {
            config,
            phase: TeleportPhase::Idle,
            marker: DestinationMarker {
                visible: false,
                location: Vector3::zero(),
            },
            last_valid_location: None,
            current_path: Vec::new(),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(TeleportConfig::default())
    }

    /// Trace from `start` along `forward` and snap the hit onto the
    /// navmesh. Returns the traced path and the landing point.
    pub fn find_teleport_destination(
        &self,
        physics: &PhysicsWorld,
        navmesh: &NavMesh,
        start: Vector3<f32>,
        forward: Vector3<f32>,
    ) -> Option<(ArcTrajectory, Vector3<f32>)> {
        if forward.magnitude2() <= f32::EPSILON {
            return None;
        }
        let forward = forward.normalize();

        let trajectory = match self.config.targeting {
            TeleportTargeting::Arc => {
                let params = PredictProjectileParams {
                    start,
                    launch_velocity: forward * self.config.projectile_speed,
                    projectile_radius: self.config.projectile_radius,
                    max_sim_time: self.config.simulation_time,
                    sim_frequency: self.config.sim_frequency,
                    gravity: self.config.gravity,
                };
                ArcTrajectory::predict(physics, &params)
            }
            TeleportTargeting::Straight => ArcTrajectory::straight(
                physics,
                start,
                forward,
                self.config.max_teleport_distance,
            ),
        };

        let hit_location = trajectory.hit_location?;
        let location = navmesh.project_point(hit_location, self.config.projection_extent)?;
        Some((trajectory, location))
    }

    /// Refresh the destination marker. On success the marker is shown at
    /// the landing point and the traced path is kept for drawing; on
    /// failure the marker is hidden and the path cleared.
    pub fn update_destination(
        &mut self,
        physics: &PhysicsWorld,
        navmesh: &NavMesh,
        start: Vector3<f32>,
        forward: Vector3<f32>,
    ) -> bool {
        match self.find_teleport_destination(physics, navmesh, start, forward) {
            Some((trajectory, location)) => {
                self.marker.visible = true;
                self.marker.location = location;
                self.last_valid_location = Some(location);
                self.current_path = trajectory.points;
                true
            }
            None => {
                self.marker.visible = false;
                self.current_path.clear();
                false
            }
        }
    }

    /// Start fading out and arm the relocation timer. Ignored unless idle
    /// with a destination recorded at some point. Without a camera fade the
    /// timer still runs so relocation happens on schedule.
    pub fn begin_teleport(
        &mut self,
        timers: &mut TimerManager<GameTimer>,
        fade: Option<&mut CameraFade>,
    ) -> bool {
        if self.phase != TeleportPhase::Idle {
            teleport_log!(DEBUG, "teleport ignored, phase is {:?}", self.phase);
            return false;
        }
        if self.last_valid_location.is_none() {
            teleport_log!(DEBUG, "teleport ignored, no destination has been found yet");
            return false;
        }

        let duration = self.config.fade_duration();
        if let Some(fade) = fade {
            fade.start_camera_fade(0.0, 1.0, duration, Vector3::zero());
        }
        timers.set_timer(GameTimer::TeleportFadeOut, duration);
        self.phase = TeleportPhase::FadingOut;

        teleport_log!(INFO, "teleport started, fading out over {:?}", duration);
        true
    }

    /// Fade-out timer expired: returns the marker location to relocate to
    /// and starts the fade back in.
    pub fn finish_teleport(&mut self, fade: Option<&mut CameraFade>) -> Option<Vector3<f32>> {
        if self.phase != TeleportPhase::FadingOut {
            return None;
        }

        let location = self.last_valid_location?;
        self.phase = match fade {
            Some(fade) => {
                fade.start_camera_fade(1.0, 0.0, self.config.fade_duration(), Vector3::zero());
                TeleportPhase::FadingIn
            }
            None => TeleportPhase::Idle,
        };

        teleport_log!(INFO, "teleport relocating to {:?}", location);
        Some(location)
    }

    /// The camera fade completed.
    pub fn on_fade_complete(&mut self) {
        if self.phase == TeleportPhase::FadingIn {
            self.phase = TeleportPhase::Idle;
            teleport_log!(DEBUG, "teleport finished");
        }
    }

    pub fn phase(&self) -> TeleportPhase {
        self.phase
    }

    pub fn marker(&self) -> &DestinationMarker {
        &self.marker
    }

    pub fn hide_marker(&mut self) {
        self.marker.visible = false;
    }

    pub fn last_valid_location(&self) -> Option<Vector3<f32>> {
        self.last_valid_location
    }

    pub fn current_path(&self) -> &[Vector3<f32>] {
        &self.current_path
    }

    pub fn config(&self) -> &TeleportConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TeleportConfig) {
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> (PhysicsWorld, NavMesh) {
        let mut physics = PhysicsWorld::new();
        physics.add_box_actor(
            "Floor",
            vec![],
            vec3(0.0, -0.5, 0.0),
            vec3(20.0, 0.5, 20.0),
            true,
        );
        physics.add_box_actor(
            "Pillar",
            vec![],
            vec3(0.0, 5.0, 10.0),
            vec3(1.0, 5.0, 1.0),
            true,
        );
        // Walkable area stops at z = -8
        let navmesh = NavMesh::from_rect(-8.0, -8.0, 8.0, 8.0, 0.0);
        (physics, navmesh)
    }

    fn down_forward() -> Vector3<f32> {
        vec3(0.0, -0.3, -1.0)
    }

    #[test]
    fn test_destination_found_on_navmesh() {
        let (physics, navmesh) = level();
        let mut teleport = TeleportSystem::with_default_config();

        assert!(teleport.update_destination(&physics, &navmesh, vec3(0.0, 1.2, 0.0), down_forward()));
        let marker = *teleport.marker();
        assert!(marker.visible);
        assert!(marker.location.y.abs() < 1e-4);
        assert!(marker.location.z < 0.0);
        assert_eq!(teleport.last_valid_location(), Some(marker.location));
        assert!(teleport.current_path().len() >= 2);
    }

    #[test]
    fn test_miss_hides_marker_and_clears_path() {
        let (physics, navmesh) = level();
        let mut teleport = TeleportSystem::with_default_config();
        teleport.update_destination(&physics, &navmesh, vec3(0.0, 1.2, 0.0), down_forward());
        let last = teleport.last_valid_location();

        // Straight up never comes down within the simulation time
        assert!(!teleport.update_destination(&physics, &navmesh, vec3(0.0, 1.2, 0.0), vec3(0.0, 1.0, 0.0)));
        assert!(!teleport.marker().visible);
        assert!(teleport.current_path().is_empty());
        assert_eq!(teleport.last_valid_location(), last);
    }

    #[test]
    fn test_hit_off_navmesh_is_rejected() {
        let (physics, navmesh) = level();
        let config = TeleportConfig {
            targeting: TeleportTargeting::Straight,
            max_teleport_distance: 30.0,
            ..TeleportConfig::default()
        };
        let teleport = TeleportSystem::new(config);

        // Lands on the floor around z = -13, outside the walkable area
        let result =
            teleport.find_teleport_destination(&physics, &navmesh, vec3(0.0, 1.3, 0.0), vec3(0.0, -0.1, -1.0));
        assert!(result.is_none());

        // Hits the pillar side at mid height, too far from any walkable cell
        let result =
            teleport.find_teleport_destination(&physics, &navmesh, vec3(0.0, 5.0, 0.0), vec3(0.0, 0.0, 1.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_straight_targeting_path() {
        let (physics, navmesh) = level();
        let config = TeleportConfig {
            targeting: TeleportTargeting::Straight,
            ..TeleportConfig::default()
        };
        let teleport = TeleportSystem::new(config);
        let (trajectory, location) = teleport
            .find_teleport_destination(&physics, &navmesh, vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, -1.0))
            .unwrap();
        assert_eq!(trajectory.points.len(), 2);
        assert!((location - vec3(0.0, 0.0, -2.0)).magnitude() < 1e-3);
    }

    #[test]
    fn test_fade_sequence() {
        let (physics, navmesh) = level();
        let mut teleport = TeleportSystem::with_default_config();
        let mut timers = TimerManager::new();
        let mut fade = CameraFade::new();

        teleport.update_destination(&physics, &navmesh, vec3(0.0, 1.2, 0.0), down_forward());
        let destination = teleport.marker().location;

        assert!(teleport.begin_teleport(&mut timers, Some(&mut fade)));
        assert_eq!(teleport.phase(), TeleportPhase::FadingOut);
        assert!(fade.is_fading());
        assert_eq!(timers.pending_count(), 1);

        // Retrigger while fading is ignored
        assert!(!teleport.begin_teleport(&mut timers, Some(&mut fade)));
        assert_eq!(timers.pending_count(), 1);

        let fired = timers.advance(Duration::from_secs(1));
        assert_eq!(fired, vec![GameTimer::TeleportFadeOut]);
        assert_eq!(teleport.finish_teleport(Some(&mut fade)), Some(destination));
        assert_eq!(teleport.phase(), TeleportPhase::FadingIn);
        assert!((fade.alpha() - 1.0).abs() < 1e-6);

        assert!(fade.update(Duration::from_secs(1)));
        teleport.on_fade_complete();
        assert_eq!(teleport.phase(), TeleportPhase::Idle);
        assert!(fade.alpha().abs() < 1e-6);
    }

    #[test]
    fn test_teleport_without_destination_is_ignored() {
        let mut teleport = TeleportSystem::with_default_config();
        let mut timers = TimerManager::new();
        assert!(!teleport.begin_teleport(&mut timers, None));
        assert_eq!(teleport.phase(), TeleportPhase::Idle);
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_teleport_without_fade_still_relocates() {
        let (physics, navmesh) = level();
        let mut teleport = TeleportSystem::with_default_config();
        let mut timers = TimerManager::new();

        teleport.update_destination(&physics, &navmesh, vec3(0.0, 1.2, 0.0), down_forward());
        assert!(teleport.begin_teleport(&mut timers, None));
        assert!(timers.advance(Duration::from_millis(500)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(500)).len(), 1);
        assert!(teleport.finish_teleport(None).is_some());
        assert_eq!(teleport.phase(), TeleportPhase::Idle);
    }
}
