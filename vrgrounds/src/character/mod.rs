// The VR character: a capsule that follows the player's head around the
// level, two motion controllers, teleport targeting and the comfort
// vignette.
//
// Spaces: tracking space is the VR root's frame (the headset and
// controllers report poses in it). The VR root sits at
// `location + rotation * vr_root_offset`, by default on the floor under the
// capsule center.

mod camera;
pub mod movement;
mod player_controller;

pub use camera::CameraPose;
pub use movement::{CharacterMovement, MovementMode};
pub use player_controller::PlayerController;

use cgmath::{InnerSpace, Quaternion, Vector3, Zero, vec3};
use engine::materials::PostProcessComponent;
use engine::{CameraFade, TimerManager, game_log};
use rapier3d::parry::shape::Capsule;
use serde::{Deserialize, Serialize};

use crate::{
    comfort::Blinkers,
    config::LocomotionConfig,
    effect::{Effect, GameTimer},
    hand::HandController,
    input_bindings::{ActionEvent, ButtonEvent, InputAction},
    input_context::InputContext,
    navigation::NavMesh,
    physics::PhysicsWorld,
    teleport::{ArcRenderer, TeleportSystem},
    vr_config::Handedness,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Half the capsule height, caps included
    pub capsule_half_height: f32,
    pub capsule_radius: f32,
    pub walk_speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        CharacterConfig {
            capsule_half_height: 0.88,
            capsule_radius: 0.34,
            walk_speed: 6.0,
            jump_velocity: 4.2,
            gravity: 9.8,
        }
    }
}

fn identity() -> Quaternion<f32> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

pub struct VrCharacter {
    config: CharacterConfig,
    location: Vector3<f32>,
    rotation: Quaternion<f32>,
    vr_root_offset: Vector3<f32>,

    head_position: Vector3<f32>,
    head_rotation: Quaternion<f32>,
    camera: CameraPose,

    capsule: Capsule,
    movement: CharacterMovement,

    hands: [HandController; 2],

    teleport: TeleportSystem,
    teleport_path: ArcRenderer,

    post_process: PostProcessComponent,
    blinkers: Blinkers,

    player_controller: Option<PlayerController>,
}

impl VrCharacter {
    /// Spawn the character with its capsule center at `location`, create
    /// and pair both hand controllers, set up the blinker material and hide
    /// the destination marker.
    pub fn begin_play(config: &LocomotionConfig, location: Vector3<f32>) -> Self {
        let character_config = config.character.clone();
        let half_height = character_config.capsule_half_height;
        let radius = character_config.capsule_radius.min(half_height);

        let mut hands = [
            HandController::new(Handedness::Left, config.hands.clone()),
            HandController::new(Handedness::Right, config.hands.clone()),
        ];
        for hand in Handedness::BOTH {
            hands[hand.index()].pair_controller(hand.opposite());
        }

        let mut post_process = PostProcessComponent::new();
        let blinkers = Blinkers::begin_play(config.blinkers.clone(), &mut post_process);

        let mut teleport = TeleportSystem::new(config.teleport.clone());
        teleport.hide_marker();
        let teleport_path = ArcRenderer::new(
            config.teleport.arch_mesh.clone(),
            config.teleport.arch_material.clone(),
        );

        let movement = CharacterMovement::new(
            character_config.walk_speed,
            character_config.jump_velocity,
            character_config.gravity,
        );

        let mut character = VrCharacter {
            capsule: Capsule::new_y((half_height - radius).max(0.0), radius),
            config: character_config,
            location,
            rotation: identity(),
            vr_root_offset: vec3(0.0, -half_height, 0.0),
            head_position: Vector3::zero(),
            head_rotation: identity(),
            camera: CameraPose {
                position: location,
                rotation: identity(),
            },
            movement,
            hands,
            teleport,
            teleport_path,
            post_process,
            blinkers,
            player_controller: Some(PlayerController::default()),
        };
        character.update_camera();

        game_log!(INFO, "character spawned at {:?}", location);
        character
    }

    /// Take the latest head and controller poses.
    pub fn set_tracking(&mut self, input_context: &InputContext) {
        self.head_position = input_context.head.position;
        self.head_rotation = input_context.head.rotation;
        for hand in Handedness::BOTH {
            let tracked = input_context.hand(hand);
            self.hands[hand.index()].set_tracked_pose(tracked.position, tracked.rotation);
        }
        self.update_camera();
        self.update_hand_world_poses();
    }

    fn tracking_to_world(&self, tracked: Vector3<f32>) -> Vector3<f32> {
        self.location + self.rotation * (self.vr_root_offset + tracked)
    }

    fn update_camera(&mut self) {
        self.camera = CameraPose {
            position: self.tracking_to_world(self.head_position),
            rotation: self.rotation * self.head_rotation,
        };
    }

    fn update_hand_world_pose(&mut self, hand: Handedness) {
        let controller = &self.hands[hand.index()];
        let position = self.tracking_to_world(controller.tracked_position());
        let rotation = self.rotation * controller.tracked_rotation();
        self.hands[hand.index()].set_world_pose(position, rotation);
    }

    // Grip anchors and teleport aim read these, so they must track the body
    fn update_hand_world_poses(&mut self) {
        for hand in Handedness::BOTH {
            self.update_hand_world_pose(hand);
        }
    }

    /// Move the capsule under the headset, horizontally only. The VR root
    /// moves the opposite way so nothing moves in world space except the
    /// capsule.
    pub fn recenter(&mut self) {
        let mut offset = self.camera.position - self.location;
        offset.y = 0.0;

        self.add_actor_world_offset(offset);
        self.vr_root_offset -= self.rotation.conjugate() * offset;
        self.update_camera();
    }

    /// Resolve hand poses, apply the climbing pull and refresh overlaps.
    pub fn tick_hands(&mut self, physics: &PhysicsWorld) -> Effect {
        let mut effects = Vec::new();
        for hand in Handedness::BOTH {
            self.update_hand_world_pose(hand);

            if let Some(displacement) = self.hands[hand.index()].climb_displacement() {
                // The hand holds still in the world; the body moves instead
                self.add_actor_world_offset(-displacement);
                self.update_camera();
                self.update_hand_world_pose(hand);
            }

            effects.push(self.hands[hand.index()].refresh_overlaps(physics));
        }
        Effect::combine(effects)
    }

    pub fn tick_movement(&mut self, dt: f32, physics: &PhysicsWorld) {
        let translation = self
            .movement
            .tick(dt, physics, &self.capsule, self.location);
        if translation.magnitude2() > 0.0 {
            self.add_actor_world_offset(translation);
            self.update_camera();
            self.update_hand_world_poses();
        }
    }

    /// Teleport targeting from the right controller, plus the arc visual.
    pub fn update_destination_marker(&mut self, physics: &PhysicsWorld, navmesh: &NavMesh) {
        let right = &self.hands[Handedness::Right.index()];
        let start = right.world_position();
        let rotation = right.world_rotation();
        let forward = rotation * vec3(0.0, 0.0, -1.0);

        self.teleport
            .update_destination(physics, navmesh, start, forward);
        self.teleport_path
            .draw_teleport_path(self.teleport.current_path(), start, rotation);
    }

    pub fn update_blinkers(&mut self) {
        let velocity = self.movement.velocity();
        self.blinkers.update(
            &mut self.post_process,
            velocity,
            &self.camera,
            self.player_controller.as_ref(),
        );
    }

    /// Route a bound action.
    pub fn on_action(&mut self, event: ActionEvent, timers: &mut TimerManager<GameTimer>) -> Effect {
        match (event.action, event.event) {
            (InputAction::Jump, ButtonEvent::Pressed) => {
                self.movement.jump();
                Effect::NoEffect
            }
            (InputAction::Jump, ButtonEvent::Released) => {
                self.movement.stop_jumping();
                Effect::NoEffect
            }
            (InputAction::Teleport, ButtonEvent::Pressed) => {
                self.begin_teleport(timers);
                Effect::NoEffect
            }
            (InputAction::Teleport, ButtonEvent::Released) => Effect::NoEffect,
            (InputAction::GripLeft | InputAction::GripRight, button_event) => {
                let Some(hand) = event.action.grip_hand() else {
                    return Effect::NoEffect;
                };
                match button_event {
                    ButtonEvent::Pressed => self.grip(hand),
                    ButtonEvent::Released => self.release(hand),
                }
            }
        }
    }

    pub fn move_forward(&mut self, value: f32) {
        if value != 0.0 {
            let direction = self.camera.flat_forward() * value;
            self.movement.add_movement_input(direction);
        }
    }

    pub fn move_right(&mut self, value: f32) {
        if value != 0.0 {
            let direction = self.camera.flat_right() * value;
            self.movement.add_movement_input(direction);
        }
    }

    pub fn grip(&mut self, hand: Handedness) -> Effect {
        self.hands[hand.index()].grip()
    }

    pub fn release(&mut self, hand: Handedness) -> Effect {
        self.hands[hand.index()].release()
    }

    pub fn force_release(&mut self, hand: Handedness) -> bool {
        self.hands[hand.index()].force_release()
    }

    pub fn begin_teleport(&mut self, timers: &mut TimerManager<GameTimer>) -> bool {
        let fade = self
            .player_controller
            .as_mut()
            .map(PlayerController::camera_fade_mut);
        self.teleport.begin_teleport(timers, fade)
    }

    /// Fade-out finished: move to the marker and fade back in.
    pub fn finish_teleport(&mut self) {
        let fade = self
            .player_controller
            .as_mut()
            .map(PlayerController::camera_fade_mut);
        let Some(destination) = self.teleport.finish_teleport(fade) else {
            return;
        };

        // A gripping hand would yank the body back to its anchor
        let mut released = false;
        for hand in Handedness::BOTH {
            released |= self.force_release(hand);
        }
        if released {
            self.movement.set_movement_mode(MovementMode::Falling);
        }

        self.set_actor_location(destination + self.up_vector() * self.config.capsule_half_height);
    }

    /// Advance the camera fade. Returns true when a fade completed.
    pub fn tick_camera_fade(&mut self, elapsed: std::time::Duration) -> bool {
        let completed = self
            .player_controller
            .as_mut()
            .is_some_and(|pc| pc.camera_fade_mut().update(elapsed));
        if completed {
            self.teleport.on_fade_complete();
        }
        completed
    }

    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        self.movement.set_movement_mode(mode);
    }

    pub fn set_actor_location(&mut self, location: Vector3<f32>) {
        self.location = location;
        self.update_camera();
        self.update_hand_world_poses();
    }

    pub fn add_actor_world_offset(&mut self, offset: Vector3<f32>) {
        self.location += offset;
    }

    fn up_vector(&self) -> Vector3<f32> {
        self.rotation * vec3(0.0, 1.0, 0.0)
    }

    pub fn location(&self) -> Vector3<f32> {
        self.location
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.movement.velocity()
    }

    pub fn movement_mode(&self) -> MovementMode {
        self.movement.movement_mode()
    }

    pub fn vr_root_offset(&self) -> Vector3<f32> {
        self.vr_root_offset
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn hand(&self, hand: Handedness) -> &HandController {
        &self.hands[hand.index()]
    }

    pub fn hand_mut(&mut self, hand: Handedness) -> &mut HandController {
        &mut self.hands[hand.index()]
    }

    pub fn climbing_hand_count(&self) -> usize {
        self.hands.iter().filter(|h| h.is_climbing()).count()
    }

    pub fn teleport(&self) -> &TeleportSystem {
        &self.teleport
    }

    pub fn teleport_path(&self) -> &ArcRenderer {
        &self.teleport_path
    }

    pub fn blinkers(&self) -> &Blinkers {
        &self.blinkers
    }

    pub fn post_process(&self) -> &PostProcessComponent {
        &self.post_process
    }

    pub fn player_controller(&self) -> Option<&PlayerController> {
        self.player_controller.as_ref()
    }

    pub fn camera_fade(&self) -> Option<&CameraFade> {
        self.player_controller.as_ref().map(PlayerController::camera_fade)
    }

    /// Possess or unpossess the character.
    /// A fade in flight belongs to the old controller, so a pending fade-in
    /// is finished here rather than left waiting forever.
    pub fn set_player_controller(&mut self, player_controller: Option<PlayerController>) {
        self.player_controller = player_controller;
        self.teleport.on_fade_complete();
    }

    pub fn capsule_half_height(&self) -> f32 {
        self.config.capsule_half_height
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> VrCharacter {
        VrCharacter::begin_play(&LocomotionConfig::default(), vec3(0.0, 0.88, 0.0))
    }

    #[test]
    fn test_begin_play() {
        let character = character();
        assert_eq!(character.hand(Handedness::Left).paired_hand(), Some(Handedness::Right));
        assert_eq!(character.hand(Handedness::Right).paired_hand(), Some(Handedness::Left));
        assert!(!character.teleport().marker().visible);
        assert_eq!(character.post_process().blendable_count(), 1);
        assert!(character.player_controller().is_some());
    }

    #[test]
    fn test_camera_follows_head() {
        let mut character = character();
        let mut input = InputContext::default();
        input.head.position = vec3(0.3, 1.7, -0.2);
        character.set_tracking(&input);

        let camera = character.camera().position;
        assert!((camera - vec3(0.3, 1.7, -0.2)).magnitude() < 1e-5);
    }

    #[test]
    fn test_recenter_keeps_camera_fixed() {
        let mut character = character();
        let mut input = InputContext::default();
        input.head.position = vec3(0.5, 1.6, 0.25);
        character.set_tracking(&input);

        let camera_before = character.camera().position;
        character.recenter();

        let camera_after = character.camera().position;
        assert!((camera_before - camera_after).magnitude() < 1e-5);
        assert!((character.location() - vec3(0.5, 0.88, 0.25)).magnitude() < 1e-5);
        assert!((character.vr_root_offset() - vec3(-0.5, -0.88, -0.25)).magnitude() < 1e-5);

        // Already centered: nothing moves
        character.recenter();
        assert!((character.location() - vec3(0.5, 0.88, 0.25)).magnitude() < 1e-5);
    }

    #[test]
    fn test_movement_follows_camera_heading() {
        let mut character = character();
        character.set_tracking(&InputContext::default());

        character.move_forward(1.0);
        let physics = PhysicsWorld::new();
        character.tick_movement(1.0 / 90.0, &physics);

        let velocity = character.velocity();
        assert!(velocity.z < -5.9);
        assert!(velocity.x.abs() < 1e-4);
    }

    #[test]
    fn test_relocation_lands_capsule_on_marker() {
        let mut physics = PhysicsWorld::new();
        physics.add_box_actor(
            "Floor",
            vec![],
            vec3(0.0, -0.5, 0.0),
            vec3(20.0, 0.5, 20.0),
            true,
        );
        let navmesh = NavMesh::from_rect(-10.0, -10.0, 10.0, 10.0, 0.0);
        let mut character = character();
        let mut input = InputContext::default();
        input.right_hand.rotation = Quaternion::from(cgmath::Euler::new(
            cgmath::Deg(-20.0),
            cgmath::Deg(0.0),
            cgmath::Deg(0.0),
        ));
        character.set_tracking(&input);
        character.tick_hands(&physics);
        character.update_destination_marker(&physics, &navmesh);

        let marker = *character.teleport().marker();
        assert!(marker.visible);
        assert!(character.teleport_path().visible_segment_count() > 0);

        let mut timers = TimerManager::new();
        assert!(character.begin_teleport(&mut timers));
        for _ in timers.advance(std::time::Duration::from_secs(1)) {
            character.finish_teleport();
        }
        assert!((character.location() - (marker.location + vec3(0.0, 0.88, 0.0))).magnitude() < 1e-5);
    }
}
