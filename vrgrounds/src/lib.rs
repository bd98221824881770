// Gameplay for the VR testing grounds: teleport locomotion with a comfort
// vignette, smooth movement, and climbing with the motion controllers.
//
// The library does no scheduling of its own. A runtime owns the loop and
// calls `Game::update` once per frame with the latest tracking state.

pub mod character;
pub mod comfort;
pub mod command;
pub mod config;
pub mod effect;
pub mod error;
pub mod hand;
pub mod input_bindings;
pub mod input_context;
pub mod level;
pub mod navigation;
pub mod physics;
pub mod teleport;
pub mod time;
pub mod vr_config;


use std::collections::VecDeque;

use cgmath::Vector3;
use engine::{TimerManager, game_log, input_log, profile};
use serde::Serialize;

use crate::{
    character::{CameraPose, MovementMode, VrCharacter},
    command::Command,
    config::LocomotionConfig,
    effect::{Effect, GameTimer},
    error::Result,
    hand::{ClimbState, HapticDevice},
    input_bindings::{InputAxis, InputBindings, InputMapper},
    input_context::InputContext,
    level::LevelDefinition,
    navigation::NavMesh,
    physics::PhysicsWorld,
    teleport::{DestinationMarker, TeleportPhase},
    time::Time,
    vr_config::Handedness,
};

#[derive(Default)]
struct AxisValues {
    move_forward: f32,
    move_right: f32,
}

pub struct Game {
    config: LocomotionConfig,
    level_name: String,
    physics: PhysicsWorld,
    navmesh: NavMesh,
    timers: TimerManager<GameTimer>,
    character: VrCharacter,
    input_mapper: InputMapper,
    haptics: Box<dyn HapticDevice>,
    haptic_pulses: u64,
    frame: u64,
}

impl Game {
    pub fn init(
        config: LocomotionConfig,
        level: &LevelDefinition,
        haptics: Box<dyn HapticDevice>,
    ) -> Result<Game> {
        config.validate()?;
        let level = level.build()?;

        let character = VrCharacter::begin_play(&config, level.spawn);
        let input_mapper = InputMapper::new(InputBindings::from_config(&config.input));

        game_log!(
            INFO,
            "level '{}' loaded: {} actors, {} navmesh cells",
            level.name,
            level.physics.actor_count(),
            level.navmesh.cell_count()
        );

        Ok(Game {
            config,
            level_name: level.name,
            physics: level.physics,
            navmesh: level.navmesh,
            timers: TimerManager::new(),
            character,
            input_mapper,
            haptics,
            haptic_pulses: 0,
            frame: 0,
        })
    }

    /// Run one frame.
    pub fn update(
        &mut self,
        time: &Time,
        input_context: &InputContext,
        commands: Vec<Box<dyn Command>>,
    ) {
        profile!(scope: "game", level: TRACE, "update", {
            self.frame += 1;
            let dt = time.elapsed.as_secs_f32();

            self.character.set_tracking(input_context);

            // Actions and axes
            let mapped = self.input_mapper.map(input_context);
            let mut axes = AxisValues {
                move_forward: mapped.move_forward,
                move_right: mapped.move_right,
            };
            let mut effects: Vec<Effect> = commands.iter().map(|command| command.execute()).collect();
            effects.extend(mapped.events.into_iter().map(Effect::Action));
            self.apply_effects(effects, &mut axes);
            self.character.move_forward(axes.move_forward);
            self.character.move_right(axes.move_right);

            self.character.recenter();

            let hand_effects = self.character.tick_hands(&self.physics);
            self.apply_effects(vec![hand_effects], &mut axes);

            self.character.tick_movement(dt, &self.physics);

            self.character
                .update_destination_marker(&self.physics, &self.navmesh);

            self.character.update_blinkers();

            // Fades first, so a fade started by a timer below does not
            // advance until next frame
            self.character.tick_camera_fade(time.elapsed);
            for timer in self.timers.advance(time.elapsed) {
                match timer {
                    GameTimer::TeleportFadeOut => self.character.finish_teleport(),
                }
            }
        })
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, axes: &mut AxisValues) {
        let mut queue: VecDeque<Effect> = effects.into_iter().flat_map(Effect::flatten).collect();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::NoEffect => {}
                Effect::Multiple(inner) => {
                    for effect in inner.into_iter().rev() {
                        queue.push_front(effect);
                    }
                }
                Effect::Action(event) => {
                    input_log!(DEBUG, "{} {:?}", event.action.name(), event.event);
                    // Follow-ups apply before anything queued after the action
                    let follow_ups = self.character.on_action(event, &mut self.timers).flatten();
                    for effect in follow_ups.into_iter().rev() {
                        queue.push_front(effect);
                    }
                }
                Effect::SetAxis { axis, value } => match axis {
                    InputAxis::MoveForward => axes.move_forward += value,
                    InputAxis::MoveRight => axes.move_right += value,
                },
                Effect::ForceRelease { hand } => {
                    self.character.force_release(hand);
                }
                Effect::PlayHaptic { hand, effect } => {
                    self.haptics.play_haptic_effect(hand, &effect);
                    self.haptic_pulses += 1;
                }
                Effect::SetMovementMode { mode } => self.character.set_movement_mode(mode),
                Effect::SetPlayerPosition { position } => {
                    self.character.set_actor_location(position)
                }
            }
        }
    }

    pub fn character(&self) -> &VrCharacter {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut VrCharacter {
        &mut self.character
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn navmesh(&self) -> &NavMesh {
        &self.navmesh
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn input_bindings_mut(&mut self) -> &mut InputBindings {
        self.input_mapper.bindings_mut()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn haptic_pulses(&self) -> u64 {
        self.haptic_pulses
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let character = &self.character;
        let hands = Handedness::BOTH
            .iter()
            .map(|hand| {
                let controller = character.hand(*hand);
                HandSnapshot {
                    hand: *hand,
                    world_position: controller.world_position(),
                    can_climb: controller.can_climb(),
                    climb_state: controller.climb_state(),
                    overlapping: controller
                        .overlapping_actors()
                        .iter()
                        .filter_map(|id| self.physics.actor(*id))
                        .map(|actor| actor.name.clone())
                        .collect(),
                }
            })
            .collect();

        GameSnapshot {
            frame: self.frame,
            level: self.level_name.clone(),
            location: character.location(),
            velocity: character.velocity(),
            movement_mode: character.movement_mode(),
            camera: *character.camera(),
            teleport_phase: character.teleport().phase(),
            marker: *character.teleport().marker(),
            arc_segments: character.teleport_path().visible_segment_count(),
            blinker_radius: character.blinkers().radius(),
            blinker_center: character.blinkers().center(),
            fade_alpha: character.camera_fade().map(|fade| fade.alpha()),
            hands,
            haptic_pulses: self.haptic_pulses,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HandSnapshot {
    pub hand: Handedness,
    pub world_position: Vector3<f32>,
    pub can_climb: bool,
    pub climb_state: ClimbState,
    pub overlapping: Vec<String>,
}

/// Read-only view of a frame, for runtimes and debugging tools.
#[derive(Clone, Debug, Serialize)]
pub struct GameSnapshot {
    pub frame: u64,
    pub level: String,
    pub location: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub movement_mode: MovementMode,
    pub camera: CameraPose,
    pub teleport_phase: TeleportPhase,
    pub marker: DestinationMarker,
    pub arc_segments: usize,
    pub blinker_radius: Option<f32>,
    pub blinker_center: (f32, f32),
    pub fade_alpha: Option<f32>,
    pub hands: Vec<HandSnapshot>,
    pub haptic_pulses: u64,
}
