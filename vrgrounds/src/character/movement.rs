use cgmath::{InnerSpace, Vector3, Zero, vec3};
use rapier3d::parry::shape::Shape;
use serde::{Deserialize, Serialize};

use crate::physics::PhysicsWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    Walking,
    Falling,
    /// No gravity and no walking; position is driven from outside (climbing)
    Flying,
}

/// Character movement: accumulates movement input, integrates gravity and
/// slides the capsule through the level.
pub struct CharacterMovement {
    mode: MovementMode,
    velocity: Vector3<f32>,
    pending_input: Vector3<f32>,
    jump_held: bool,
    walk_speed: f32,
    jump_velocity: f32,
    gravity: f32,
}

impl CharacterMovement {
    pub fn new(walk_speed: f32, jump_velocity: f32, gravity: f32) -> Self {
        CharacterMovement {
            mode: MovementMode::Falling,
            velocity: Vector3::zero(),
            pending_input: Vector3::zero(),
            jump_held: false,
            walk_speed,
            jump_velocity,
            gravity,
        }
    }

    pub fn add_movement_input(&mut self, world_direction: Vector3<f32>) {
        self.pending_input += vec3(world_direction.x, 0.0, world_direction.z);
    }

    fn consume_input_vector(&mut self) -> Vector3<f32> {
        let input = self.pending_input;
        self.pending_input = Vector3::zero();
        if input.magnitude2() > 1.0 {
            input.normalize()
        } else {
            input
        }
    }

    /// Launch upward. Only possible from the ground.
    pub fn jump(&mut self) -> bool {
        self.jump_held = true;
        if self.mode != MovementMode::Walking {
            return false;
        }
        self.velocity.y = self.jump_velocity;
        self.mode = MovementMode::Falling;
        true
    }

    pub fn stop_jumping(&mut self) {
        self.jump_held = false;
    }

    pub fn is_jump_held(&self) -> bool {
        self.jump_held
    }

    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        if mode == MovementMode::Flying {
            self.velocity = Vector3::zero();
        }
        self.mode = mode;
    }

    pub fn movement_mode(&self) -> MovementMode {
        self.mode
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    /// Integrate one step and return the translation to apply to the
    /// capsule at `position`.
    pub fn tick(
        &mut self,
        dt: f32,
        physics: &PhysicsWorld,
        shape: &dyn Shape,
        position: Vector3<f32>,
    ) -> Vector3<f32> {
        let input = self.consume_input_vector();

        if self.mode == MovementMode::Flying || dt <= 0.0 {
            return Vector3::zero();
        }

        let horizontal = input * self.walk_speed;
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;
        self.velocity.y -= self.gravity * dt;

        let movement = physics.move_shape(dt, shape, position, self.velocity * dt);

        if movement.grounded && self.velocity.y <= 0.0 {
            self.mode = MovementMode::Walking;
            self.velocity.y = 0.0;
        } else if !movement.grounded {
            self.mode = MovementMode::Falling;
            // Bumped a ceiling
            if self.velocity.y > 0.0 && movement.translation.y < self.velocity.y * dt * 0.5 {
                self.velocity.y = 0.0;
            }
        }

        movement.translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::parry::shape::Capsule;

    const DT: f32 = 1.0 / 90.0;

    fn floor() -> PhysicsWorld {
        let mut physics = PhysicsWorld::new();
        physics.add_box_actor(
            "Floor",
            vec![],
            vec3(0.0, -0.5, 0.0),
            vec3(50.0, 0.5, 50.0),
            true,
        );
        physics
    }

    fn capsule() -> Capsule {
        Capsule::new_y(0.88 - 0.34, 0.34)
    }

    fn settle(
        movement: &mut CharacterMovement,
        physics: &PhysicsWorld,
        mut position: Vector3<f32>,
        frames: usize,
    ) -> Vector3<f32> {
        let shape = capsule();
        for _ in 0..frames {
            position += movement.tick(DT, physics, &shape, position);
        }
        position
    }

    #[test]
    fn test_falls_and_lands() {
        let physics = floor();
        let mut movement = CharacterMovement::new(6.0, 4.2, 9.8);
        let position = settle(&mut movement, &physics, vec3(0.0, 3.0, 0.0), 180);

        assert_eq!(movement.movement_mode(), MovementMode::Walking);
        assert!((position.y - 0.88).abs() < 0.05);
        assert!(movement.velocity().magnitude() < 1e-4);
    }

    #[test]
    fn test_walk_speed_is_capped() {
        let physics = floor();
        let mut movement = CharacterMovement::new(6.0, 4.2, 9.8);
        let shape = capsule();
        let position = settle(&mut movement, &physics, vec3(0.0, 0.9, 0.0), 30);

        movement.add_movement_input(vec3(0.0, 0.0, -1.0));
        movement.add_movement_input(vec3(1.0, 0.0, 0.0));
        movement.tick(DT, &physics, &shape, position);

        let v = movement.velocity();
        assert!((vec3(v.x, 0.0, v.z).magnitude() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_flying_ignores_input_and_gravity() {
        let physics = floor();
        let mut movement = CharacterMovement::new(6.0, 4.2, 9.8);
        let shape = capsule();
        movement.set_movement_mode(MovementMode::Flying);

        movement.add_movement_input(vec3(0.0, 0.0, -1.0));
        let translation = movement.tick(DT, &physics, &shape, vec3(0.0, 5.0, 0.0));
        assert_eq!(translation, Vector3::zero());
        assert_eq!(movement.velocity(), Vector3::zero());
        assert_eq!(movement.movement_mode(), MovementMode::Flying);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let physics = floor();
        let mut movement = CharacterMovement::new(6.0, 4.2, 9.8);
        assert!(!movement.jump());

        let position = settle(&mut movement, &physics, vec3(0.0, 0.9, 0.0), 30);
        assert_eq!(movement.movement_mode(), MovementMode::Walking);
        assert!(movement.jump());
        assert_eq!(movement.movement_mode(), MovementMode::Falling);
        assert!((movement.velocity().y - 4.2).abs() < 1e-5);

        movement.stop_jumping();
        assert!(!movement.is_jump_held());
        assert!((movement.velocity().y - 4.2).abs() < 1e-5);

        let shape = capsule();
        let translation = movement.tick(DT, &physics, &shape, position);
        assert!(translation.y > 0.0);
    }

    #[test]
    fn test_standing_from_resting_position_holds() {
        let physics = floor();
        let mut movement = CharacterMovement::new(6.0, 4.2, 9.8);

        // Capsule bottom exactly on the floor, then five seconds idle
        let position = settle(&mut movement, &physics, vec3(0.0, 0.88, 0.0), 450);

        assert_eq!(movement.movement_mode(), MovementMode::Walking);
        assert!(position.y > 0.87 && position.y < 0.93, "y = {}", position.y);
    }
}
