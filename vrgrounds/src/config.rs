use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    character::CharacterConfig,
    comfort::BlinkerConfig,
    error::{GroundsError, Result},
    hand::HandConfig,
    input_bindings::{ButtonBinding, InputConfig},
    teleport::{MAX_SIM_STEPS, TeleportConfig},
};

/// Everything tunable about locomotion. Every field has a default, so a
/// config file only needs the values it changes:
///
/// ```toml
/// [teleport]
/// targeting = "Straight"
/// fade_time = 0.5
///
/// [hands.haptic]
/// amplitude = 0.6
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub teleport: TeleportConfig,
    pub blinkers: BlinkerConfig,
    pub character: CharacterConfig,
    pub hands: HandConfig,
    pub input: InputConfig,
}

impl LocomotionConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: LocomotionConfig =
            toml::from_str(contents).map_err(|source| GroundsError::Config { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| GroundsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LocomotionConfig = toml::from_str(&contents).map_err(|source| {
            GroundsError::Config {
                path: Some(path.to_path_buf()),
                source,
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let teleport = &self.teleport;
        positive("teleport.max_teleport_distance", teleport.max_teleport_distance)?;
        non_negative("teleport.fade_time", teleport.fade_time)?;
        non_negative("teleport.projectile_radius", teleport.projectile_radius)?;
        non_negative("teleport.projectile_speed", teleport.projectile_speed)?;
        positive("teleport.simulation_time", teleport.simulation_time)?;
        positive("teleport.sim_frequency", teleport.sim_frequency)?;
        let steps = (teleport.simulation_time * teleport.sim_frequency).ceil();
        if !steps.is_finite() || steps > MAX_SIM_STEPS as f32 {
            return Err(GroundsError::validation(
                "teleport.sim_frequency",
                format!(
                    "simulation_time * sim_frequency must be at most {}, got {}",
                    MAX_SIM_STEPS, steps
                ),
            ));
        }
        non_negative("teleport.gravity", teleport.gravity)?;
        non_negative("teleport.projection_extent.x", teleport.projection_extent.x)?;
        non_negative("teleport.projection_extent.y", teleport.projection_extent.y)?;
        non_negative("teleport.projection_extent.z", teleport.projection_extent.z)?;

        let character = &self.character;
        positive("character.capsule_half_height", character.capsule_half_height)?;
        positive("character.capsule_radius", character.capsule_radius)?;
        if character.capsule_radius > character.capsule_half_height {
            return Err(GroundsError::validation(
                "character.capsule_radius",
                "must not exceed capsule_half_height",
            ));
        }
        non_negative("character.walk_speed", character.walk_speed)?;
        non_negative("character.jump_velocity", character.jump_velocity)?;
        non_negative("character.gravity", character.gravity)?;

        positive("hands.overlap_radius", self.hands.overlap_radius)?;
        if self.hands.climbable_tag.is_empty() {
            return Err(GroundsError::validation("hands.climbable_tag", "must not be empty"));
        }
        non_negative("hands.haptic.duration", self.hands.haptic.duration)?;

        threshold("input.jump", &self.input.jump)?;
        threshold("input.teleport", &self.input.teleport)?;
        threshold("input.grip_left", &self.input.grip_left)?;
        threshold("input.grip_right", &self.input.grip_right)?;

        Ok(())
    }
}

fn positive(item: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GroundsError::validation(item, format!("must be positive, got {}", value)))
    }
}

fn non_negative(item: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GroundsError::validation(item, format!("must not be negative, got {}", value)))
    }
}

fn threshold(item: &str, binding: &ButtonBinding) -> Result<()> {
    if binding.threshold > 0.0 && binding.threshold <= 1.0 {
        Ok(())
    } else {
        Err(GroundsError::validation(
            item,
            format!("threshold must be in (0, 1], got {}", binding.threshold),
        ))
    }
}
