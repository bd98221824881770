// Commands let a runtime inject input that did not come from the
// controllers: named actions and axes from a debug console or HTTP API.

use cgmath::Vector3;

use crate::{
    effect::Effect,
    error::Result,
    input_bindings::{ActionEvent, InputAction, InputAxis},
};

pub trait Command: Send {
    fn execute(&self) -> Effect;
}

/// Press or release a named action
pub struct ActionCommand {
    event: ActionEvent,
}

impl ActionCommand {
    pub fn new(event: ActionEvent) -> Self {
        ActionCommand { event }
    }

    /// `name` is a binding name such as `"Teleport"` or `"GripLeft"`.
    pub fn from_name(name: &str, pressed: bool) -> Result<Self> {
        let action = name.parse::<InputAction>()?;
        let event = if pressed {
            ActionEvent::pressed(action)
        } else {
            ActionEvent::released(action)
        };
        Ok(ActionCommand { event })
    }
}

impl Command for ActionCommand {
    fn execute(&self) -> Effect {
        Effect::Action(self.event)
    }
}

/// Add to a named axis for one frame
pub struct AxisCommand {
    axis: InputAxis,
    value: f32,
}

impl AxisCommand {
    pub fn from_name(name: &str, value: f32) -> Result<Self> {
        Ok(AxisCommand {
            axis: name.parse::<InputAxis>()?,
            value,
        })
    }
}

impl Command for AxisCommand {
    fn execute(&self) -> Effect {
        Effect::SetAxis {
            axis: self.axis,
            value: self.value,
        }
    }
}

/// Move the character's capsule center, no fade
pub struct SetPlayerPositionCommand {
    pub position: Vector3<f32>,
}

impl Command for SetPlayerPositionCommand {
    fn execute(&self) -> Effect {
        Effect::SetPlayerPosition {
            position: self.position,
        }
    }
}
