use cgmath::Vector3;

use crate::{
    character::MovementMode,
    hand::HapticEffect,
    input_bindings::{ActionEvent, InputAxis},
    vr_config::Handedness,
};

/// Deferred changes produced by hands and commands, applied by the game in
/// the order they were produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    NoEffect,
    Multiple(Vec<Effect>),

    // Input
    Action(ActionEvent),
    SetAxis {
        axis: InputAxis,
        value: f32,
    },

    // Hands
    ForceRelease {
        hand: Handedness,
    },
    PlayHaptic {
        hand: Handedness,
        effect: HapticEffect,
    },

    // Character
    SetMovementMode {
        mode: MovementMode,
    },
    SetPlayerPosition {
        position: Vector3<f32>,
    },
}

impl Effect {
    pub fn combine(effects: Vec<Effect>) -> Effect {
        let mut flattened = Vec::new();
        for effect in effects {
            match effect {
                Effect::NoEffect => {}
                Effect::Multiple(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }

        match flattened.len() {
            0 => Effect::NoEffect,
            1 => flattened.remove(0),
            _ => Effect::Multiple(flattened),
        }
    }

    /// Flatten into a list in application order.
    pub fn flatten(self) -> Vec<Effect> {
        match self {
            Effect::NoEffect => Vec::new(),
            Effect::Multiple(effects) => effects.into_iter().flat_map(Effect::flatten).collect(),
            other => vec![other],
        }
    }
}

/// One-shot timers scheduled on the game's timer manager
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameTimer {
    TeleportFadeOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_drops_no_effect() {
        assert_eq!(Effect::combine(vec![Effect::NoEffect]), Effect::NoEffect);

        let release = Effect::ForceRelease {
            hand: Handedness::Left,
        };
        assert_eq!(
            Effect::combine(vec![Effect::NoEffect, release.clone()]),
            release
        );
    }

    #[test]
    fn test_flatten_preserves_order() {
        let combined = Effect::combine(vec![
            Effect::ForceRelease {
                hand: Handedness::Left,
            },
            Effect::Multiple(vec![
                Effect::SetMovementMode {
                    mode: MovementMode::Flying,
                },
                Effect::NoEffect,
            ]),
        ]);
        let flat = combined.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(
            flat[1],
            Effect::SetMovementMode {
                mode: MovementMode::Flying
            }
        );
    }
}
