// Input context is an abstraction layer over the motion controllers that the runtime will provide.
// Poses are in tracking space: relative to the VR root of the character, in meters, Y up,
// with -Z as the forward direction.

use cgmath::{Quaternion, Rotation, Vector2, Vector3, Zero, vec3};
use serde::{Deserialize, Serialize};

use crate::vr_config::Handedness;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputContext {
    // Information about the head position
    pub head: Head,

    // Information about each of the hands
    pub left_hand: Hand,
    pub right_hand: Hand,
}

impl InputContext {
    pub fn hand(&self, handedness: Handedness) -> &Hand {
        match handedness {
            Handedness::Left => &self.left_hand,
            Handedness::Right => &self.right_hand,
        }
    }

    pub fn hand_mut(&mut self, handedness: Handedness) -> &mut Hand {
        match handedness {
            Handedness::Left => &mut self.left_hand,
            Handedness::Right => &mut self.right_hand,
        }
    }
}

impl Default for InputContext {
    fn default() -> InputContext {
        InputContext {
            head: Head::default(),

            left_hand: Hand::at(vec3(-0.2, 1.2, -0.3)),
            right_hand: Hand::at(vec3(0.2, 1.2, -0.3)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Head {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Default for Head {
    fn default() -> Head {
        Head {
            position: vec3(0.0, 1.7, 0.0),
            rotation: identity(),
        }
    }
}

// Context for an individual hand (motion controller)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hand {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub thumbstick: Vector2<f32>,
    pub trigger_value: f32,
    pub squeeze_value: f32,
    pub a_value: f32,
    pub b_value: f32,
}

impl Hand {
    pub fn at(position: Vector3<f32>) -> Hand {
        Hand {
            position,
            ..Hand::default()
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(vec3(0.0, 0.0, -1.0))
    }
}

impl Default for Hand {
    fn default() -> Hand {
        Hand {
            position: Vector3::zero(),
            rotation: identity(),
            thumbstick: Vector2::zero(),
            trigger_value: 0.0,
            squeeze_value: 0.0,
            a_value: 0.0,
            b_value: 0.0,
        }
    }
}

fn identity() -> Quaternion<f32> {
    Quaternion {
        v: Vector3::zero(),
        s: 1.0,
    }
}
