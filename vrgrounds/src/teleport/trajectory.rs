use cgmath::{InnerSpace, Vector3};

use crate::physics::{PhysicsWorld, RayHit};

/// Upper bound on simulation steps (and so ray casts) per prediction.
pub const MAX_SIM_STEPS: usize = 512;

/// Inputs for a projectile path prediction.
#[derive(Clone, Copy, Debug)]
pub struct PredictProjectileParams {
    pub start: Vector3<f32>,
    pub launch_velocity: Vector3<f32>,
    /// Radius of the simulated projectile. The reported hit location is
    /// pulled back along the path by this amount.
    pub projectile_radius: f32,
    /// Maximum simulated time in seconds
    pub max_sim_time: f32,
    /// Samples per simulated second
    pub sim_frequency: f32,
    /// Downward acceleration in m/s^2
    pub gravity: f32,
}

/// A traced teleport path
#[derive(Clone, Debug)]
pub struct ArcTrajectory {
    /// Sample points from the start to the hit location (inclusive)
    pub points: Vec<Vector3<f32>>,
    /// First blocking hit along the path, if any
    pub hit: Option<RayHit>,
    /// Where the projectile came to rest on a hit
    pub hit_location: Option<Vector3<f32>>,
}

impl ArcTrajectory {
    /// Simulate a projectile under gravity, tracing each step against
    /// blocking geometry. The first hit ends the path.
    pub fn predict(physics: &PhysicsWorld, params: &PredictProjectileParams) -> Self {
        let mut points = vec![params.start];

        if params.sim_frequency <= 0.0 || params.max_sim_time <= 0.0 {
            return ArcTrajectory {
                points,
                hit: None,
                hit_location: None,
            };
        }

        let step = 1.0 / params.sim_frequency;
        let gravity = Vector3::new(0.0, -params.gravity, 0.0);

        let steps = (params.max_sim_time * params.sim_frequency).ceil() as usize;
        let steps = steps.min(MAX_SIM_STEPS);

        let mut position = params.start;
        let mut velocity = params.launch_velocity;

        for i in 0..steps {
            // Final step is shortened to land exactly on max_sim_time
            let dt = step.min(params.max_sim_time - i as f32 * step);
            let next_position = position + velocity * dt + gravity * (0.5 * dt * dt);

            if let Some(hit) = physics.ray_cast(position, next_position) {
                let location = Self::back_off(position, next_position, &hit, params.projectile_radius);
                points.push(location);
                return ArcTrajectory {
                    points,
                    hit: Some(hit),
                    hit_location: Some(location),
                };
            }

            points.push(next_position);
            position = next_position;
            velocity += gravity * dt;
        }

        ArcTrajectory {
            points,
            hit: None,
            hit_location: None,
        }
    }

    /// Single ray of `max_distance` along `direction`. The path is
    /// `[start, hit]` on a hit.
    pub fn straight(
        physics: &PhysicsWorld,
        start: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Self {
        let end = start + direction.normalize() * max_distance;
        match physics.ray_cast(start, end) {
            Some(hit) => ArcTrajectory {
                points: vec![start, hit.hit_point],
                hit: Some(hit),
                hit_location: Some(hit.hit_point),
            },
            None => ArcTrajectory {
                points: vec![start, end],
                hit: None,
                hit_location: None,
            },
        }
    }

    fn back_off(
        segment_start: Vector3<f32>,
        segment_end: Vector3<f32>,
        hit: &RayHit,
        radius: f32,
    ) -> Vector3<f32> {
        let direction = (segment_end - segment_start).normalize();
        let distance = hit.distance.min(radius.max(0.0));
        hit.hit_point - direction * distance
    }

    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}
