use std::collections::BTreeSet;

use cgmath::{Quaternion, Vector3, Zero};
use engine::climb_log;
use serde::{Deserialize, Serialize};

use crate::{
    character::MovementMode,
    effect::Effect,
    physics::{ActorId, PhysicsWorld},
    vr_config::Handedness,
};

use super::HapticEffect;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Radius of the overlap sphere around the controller
    pub overlap_radius: f32,
    /// Actors carrying this tag can be climbed
    pub climbable_tag: String,
    /// Pulse played when the hand first touches something climbable
    pub haptic: HapticEffect,
}

impl Default for HandConfig {
    fn default() -> Self {
        HandConfig {
            overlap_radius: 0.1,
            climbable_tag: "Climbable".to_string(),
            haptic: HapticEffect::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ClimbState {
    Idle,
    Climbing { anchor: Vector3<f32> },
}

/// One motion controller: tracked pose, overlap sphere, climbing.
///
/// The controller never touches the character or the other hand directly.
/// Anything that has to happen outside the hand is returned as an `Effect`.
pub struct HandController {
    hand: Handedness,
    config: HandConfig,
    paired_hand: Option<Handedness>,

    tracked_position: Vector3<f32>,
    tracked_rotation: Quaternion<f32>,
    world_position: Vector3<f32>,
    world_rotation: Quaternion<f32>,

    overlapping: BTreeSet<ActorId>,
    can_climb: bool,
    climb_state: ClimbState,
}

impl HandController {
    pub fn new(hand: Handedness, config: HandConfig) -> Self {
        HandController {
            hand,
            config,
            paired_hand: None,
            tracked_position: Vector3::zero(),
            tracked_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            world_position: Vector3::zero(),
            world_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            overlapping: BTreeSet::new(),
            can_climb: false,
            climb_state: ClimbState::Idle,
        }
    }

    /// Record the opposite hand. Pairing happens once; later calls are
    /// ignored and return false.
    pub fn pair_controller(&mut self, other: Handedness) -> bool {
        if self.paired_hand.is_some() || other == self.hand {
            return false;
        }
        self.paired_hand = Some(other);
        true
    }

    pub fn set_tracked_pose(&mut self, position: Vector3<f32>, rotation: Quaternion<f32>) {
        self.tracked_position = position;
        self.tracked_rotation = rotation;
    }

    pub fn set_world_pose(&mut self, position: Vector3<f32>, rotation: Quaternion<f32>) {
        self.world_position = position;
        self.world_rotation = rotation;
    }

    /// Displacement of the hand since it gripped, if climbing.
    pub fn climb_displacement(&self) -> Option<Vector3<f32>> {
        match self.climb_state {
            ClimbState::Climbing { anchor } => Some(self.world_position - anchor),
            ClimbState::Idle => None,
        }
    }

    /// Query the physics world around the hand and raise begin/end overlap
    /// events for every change, ends first.
    pub fn refresh_overlaps(&mut self, physics: &PhysicsWorld) -> Effect {
        let current = physics.overlapping_actors(self.world_position, self.config.overlap_radius);

        let ended: Vec<ActorId> = self.overlapping.difference(&current).copied().collect();
        let began: Vec<ActorId> = current.difference(&self.overlapping).copied().collect();

        let mut effects = Vec::new();
        for actor in ended {
            effects.push(self.actor_end_overlap(physics, actor));
        }
        for actor in began {
            effects.push(self.actor_begin_overlap(physics, actor));
        }
        Effect::combine(effects)
    }

    pub fn actor_begin_overlap(&mut self, physics: &PhysicsWorld, actor: ActorId) -> Effect {
        if !self.overlapping.insert(actor) {
            return Effect::NoEffect;
        }

        let new_can_climb = self.compute_can_climb(physics);
        let rising = !self.can_climb && new_can_climb;
        self.can_climb = new_can_climb;

        if rising {
            climb_log!(
                INFO,
                "{} hand can climb ({})",
                self.hand,
                physics.actor(actor).map(|a| a.name.as_str()).unwrap_or("?")
            );
            return Effect::PlayHaptic {
                hand: self.hand,
                effect: self.config.haptic,
            };
        }
        Effect::NoEffect
    }

    pub fn actor_end_overlap(&mut self, physics: &PhysicsWorld, actor: ActorId) -> Effect {
        if self.overlapping.remove(&actor) {
            self.can_climb = self.compute_can_climb(physics);
            if !self.can_climb {
                climb_log!(DEBUG, "{} hand can no longer climb", self.hand);
            }
        }
        Effect::NoEffect
    }

    fn compute_can_climb(&self, physics: &PhysicsWorld) -> bool {
        self.overlapping.iter().any(|id| {
            physics
                .actor(*id)
                .is_some_and(|actor| actor.has_tag(&self.config.climbable_tag))
        })
    }

    /// Start climbing if touching something climbable.
    pub fn grip(&mut self) -> Effect {
        if !self.can_climb {
            climb_log!(DEBUG, "{} grip ignored, nothing to climb", self.hand);
            return Effect::NoEffect;
        }
        if self.is_climbing() {
            return Effect::NoEffect;
        }

        self.climb_state = ClimbState::Climbing {
            anchor: self.world_position,
        };
        climb_log!(INFO, "{} hand climbing from {:?}", self.hand, self.world_position);

        let mut effects = Vec::new();
        if let Some(other) = self.paired_hand {
            effects.push(Effect::ForceRelease { hand: other });
        }
        effects.push(Effect::SetMovementMode {
            mode: MovementMode::Flying,
        });
        Effect::combine(effects)
    }

    pub fn release(&mut self) -> Effect {
        if !self.force_release() {
            return Effect::NoEffect;
        }
        Effect::SetMovementMode {
            mode: MovementMode::Falling,
        }
    }

    /// Leave climbing without touching the movement mode. Returns whether
    /// the hand was climbing.
    pub fn force_release(&mut self) -> bool {
        if !self.is_climbing() {
            return false;
        }
        self.climb_state = ClimbState::Idle;
        climb_log!(INFO, "{} hand released", self.hand);
        true
    }

    pub fn hand(&self) -> Handedness {
        self.hand
    }

    pub fn paired_hand(&self) -> Option<Handedness> {
        self.paired_hand
    }

    pub fn can_climb(&self) -> bool {
        self.can_climb
    }

    pub fn is_climbing(&self) -> bool {
        matches!(self.climb_state, ClimbState::Climbing { .. })
    }

    pub fn climb_state(&self) -> ClimbState {
        self.climb_state
    }

    pub fn overlapping_actors(&self) -> &BTreeSet<ActorId> {
        &self.overlapping
    }

    pub fn tracked_position(&self) -> Vector3<f32> {
        self.tracked_position
    }

    pub fn tracked_rotation(&self) -> Quaternion<f32> {
        self.tracked_rotation
    }

    pub fn world_position(&self) -> Vector3<f32> {
        self.world_position
    }

    pub fn world_rotation(&self) -> Quaternion<f32> {
        self.world_rotation
    }

    pub fn config(&self) -> &HandConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    struct Fixture {
        physics: PhysicsWorld,
        wall: ActorId,
        rope: ActorId,
        crate_actor: ActorId,
    }

    fn fixture() -> Fixture {
        let mut physics = PhysicsWorld::new();
        let wall = physics.add_box_actor(
            "Wall",
            vec!["Climbable".to_string()],
            vec3(0.0, 2.0, -2.0),
            vec3(1.0, 2.0, 0.1),
            true,
        );
        let rope = physics.add_box_actor(
            "Rope",
            vec!["Climbable".to_string()],
            vec3(5.0, 2.0, 0.0),
            vec3(0.05, 2.0, 0.05),
            false,
        );
        let crate_actor = physics.add_box_actor(
            "Crate",
            vec![],
            vec3(-5.0, 0.5, 0.0),
            vec3(0.5, 0.5, 0.5),
            true,
        );
        Fixture {
            physics,
            wall,
            rope,
            crate_actor,
        }
    }

    fn hand(handedness: Handedness) -> HandController {
        let mut hand = HandController::new(handedness, HandConfig::default());
        hand.pair_controller(handedness.opposite());
        hand
    }

    fn is_haptic(effect: &Effect) -> bool {
        matches!(effect, Effect::PlayHaptic { .. })
    }

    #[test]
    fn test_can_climb_tracks_tagged_overlaps() {
        let f = fixture();
        let mut left = hand(Handedness::Left);

        left.actor_begin_overlap(&f.physics, f.crate_actor);
        assert!(!left.can_climb());

        left.actor_begin_overlap(&f.physics, f.wall);
        assert!(left.can_climb());

        left.actor_begin_overlap(&f.physics, f.rope);
        left.actor_end_overlap(&f.physics, f.wall);
        assert!(left.can_climb());

        left.actor_end_overlap(&f.physics, f.rope);
        assert!(!left.can_climb());
        assert_eq!(left.overlapping_actors().len(), 1);
    }

    #[test]
    fn test_haptic_only_on_rising_edge() {
        let f = fixture();
        let mut left = hand(Handedness::Left);

        assert!(is_haptic(&left.actor_begin_overlap(&f.physics, f.wall)));
        assert_eq!(left.actor_begin_overlap(&f.physics, f.rope), Effect::NoEffect);
        assert_eq!(left.actor_begin_overlap(&f.physics, f.wall), Effect::NoEffect);

        left.actor_end_overlap(&f.physics, f.wall);
        left.actor_end_overlap(&f.physics, f.rope);
        assert!(is_haptic(&left.actor_begin_overlap(&f.physics, f.rope)));
    }

    #[test]
    fn test_refresh_overlaps_from_world() {
        let f = fixture();
        let mut right = hand(Handedness::Right);

        right.set_world_pose(vec3(0.0, 1.5, -1.85), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let effect = right.refresh_overlaps(&f.physics);
        assert!(is_haptic(&effect));
        assert!(right.can_climb());

        // Staying in contact does not pulse again
        assert_eq!(right.refresh_overlaps(&f.physics), Effect::NoEffect);

        right.set_world_pose(vec3(0.0, 1.5, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        right.refresh_overlaps(&f.physics);
        assert!(!right.can_climb());
        assert!(right.overlapping_actors().is_empty());
    }

    #[test]
    fn test_grip_without_climbable_is_noop() {
        let f = fixture();
        let mut left = hand(Handedness::Left);
        left.actor_begin_overlap(&f.physics, f.crate_actor);

        assert_eq!(left.grip(), Effect::NoEffect);
        assert!(!left.is_climbing());
    }

    #[test]
    fn test_grip_anchors_and_releases_other_hand() {
        let f = fixture();
        let mut left = hand(Handedness::Left);
        left.set_world_pose(vec3(0.2, 1.4, -1.9), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        left.actor_begin_overlap(&f.physics, f.wall);

        let effects = left.grip().flatten();
        assert_eq!(
            effects,
            vec![
                Effect::ForceRelease {
                    hand: Handedness::Right
                },
                Effect::SetMovementMode {
                    mode: MovementMode::Flying
                },
            ]
        );
        assert_eq!(
            left.climb_state(),
            ClimbState::Climbing {
                anchor: vec3(0.2, 1.4, -1.9)
            }
        );

        left.set_world_pose(vec3(0.2, 1.6, -1.9), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let displacement = left.climb_displacement().unwrap();
        assert!((displacement.y - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_release() {
        let f = fixture();
        let mut left = hand(Handedness::Left);

        assert_eq!(left.release(), Effect::NoEffect);

        left.actor_begin_overlap(&f.physics, f.wall);
        left.grip();
        assert_eq!(
            left.release(),
            Effect::SetMovementMode {
                mode: MovementMode::Falling
            }
        );
        assert!(!left.is_climbing());
        assert!(left.climb_displacement().is_none());
        assert_eq!(left.release(), Effect::NoEffect);
    }

    #[test]
    fn test_pairing_happens_once() {
        let mut left = HandController::new(Handedness::Left, HandConfig::default());
        assert!(!left.pair_controller(Handedness::Left));
        assert!(left.pair_controller(Handedness::Right));
        assert!(!left.pair_controller(Handedness::Right));
        assert_eq!(left.paired_hand(), Some(Handedness::Right));
    }
}
