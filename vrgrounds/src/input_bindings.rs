// Named input bindings, resolved each frame against the motion controller state.
//
// Actions are edge-triggered: a binding produces `Pressed` on the frame its
// button value crosses the threshold and `Released` on the frame it drops
// back. Axes are sampled every frame.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::{GroundsError, Result},
    input_context::{Hand, InputContext},
    vr_config::Handedness,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    Jump,
    Teleport,
    GripLeft,
    GripRight,
}

impl InputAction {
    pub fn name(self) -> &'static str {
        match self {
            InputAction::Jump => "Jump",
            InputAction::Teleport => "Teleport",
            InputAction::GripLeft => "GripLeft",
            InputAction::GripRight => "GripRight",
        }
    }

    pub fn grip_hand(self) -> Option<Handedness> {
        match self {
            InputAction::GripLeft => Some(Handedness::Left),
            InputAction::GripRight => Some(Handedness::Right),
            _ => None,
        }
    }
}

impl FromStr for InputAction {
    type Err = GroundsError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "Jump" => Ok(InputAction::Jump),
            "Teleport" => Ok(InputAction::Teleport),
            "GripLeft" => Ok(InputAction::GripLeft),
            "GripRight" => Ok(InputAction::GripRight),
            _ => Err(GroundsError::UnknownBinding {
                name: name.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAxis {
    MoveForward,
    MoveRight,
}

impl FromStr for InputAxis {
    type Err = GroundsError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "MoveForward" => Ok(InputAxis::MoveForward),
            "MoveRight" => Ok(InputAxis::MoveRight),
            _ => Err(GroundsError::UnknownBinding {
                name: name.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonEvent {
    Pressed,
    Released,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub action: InputAction,
    pub event: ButtonEvent,
}

impl ActionEvent {
    pub fn pressed(action: InputAction) -> Self {
        ActionEvent {
            action,
            event: ButtonEvent::Pressed,
        }
    }

    pub fn released(action: InputAction) -> Self {
        ActionEvent {
            action,
            event: ButtonEvent::Released,
        }
    }
}

/// Button mapping options on a motion controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerButton {
    Trigger,
    Squeeze,
    AButton,
    BButton,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub hand: Handedness,
    pub button: ControllerButton,
    pub threshold: f32,
}

impl ButtonBinding {
    pub fn new(hand: Handedness, button: ControllerButton, threshold: f32) -> Self {
        ButtonBinding {
            hand,
            button,
            threshold,
        }
    }

    fn value(&self, hand: &Hand) -> f32 {
        match self.button {
            ControllerButton::Trigger => hand.trigger_value,
            ControllerButton::Squeeze => hand.squeeze_value,
            ControllerButton::AButton => hand.a_value,
            ControllerButton::BButton => hand.b_value,
        }
    }

    fn is_pressed(&self, input_context: &InputContext) -> bool {
        self.value(input_context.hand(self.hand)) >= self.threshold
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThumbstickAxis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub hand: Handedness,
    pub axis: ThumbstickAxis,
    pub scale: f32,
}

impl AxisBinding {
    fn value(&self, input_context: &InputContext) -> f32 {
        let thumbstick = input_context.hand(self.hand).thumbstick;
        let raw = match self.axis {
            ThumbstickAxis::X => thumbstick.x,
            ThumbstickAxis::Y => thumbstick.y,
        };
        raw * self.scale
    }
}

/// Which controller inputs feed the named actions and axes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub jump: ButtonBinding,
    pub teleport: ButtonBinding,
    pub grip_left: ButtonBinding,
    pub grip_right: ButtonBinding,
    pub move_hand: Handedness,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            jump: ButtonBinding::new(Handedness::Right, ControllerButton::BButton, 0.5),
            teleport: ButtonBinding::new(Handedness::Right, ControllerButton::AButton, 0.5),
            grip_left: ButtonBinding::new(Handedness::Left, ControllerButton::Squeeze, 0.5),
            grip_right: ButtonBinding::new(Handedness::Right, ControllerButton::Squeeze, 0.5),
            move_hand: Handedness::Left,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InputBindings {
    actions: Vec<(InputAction, ButtonBinding)>,
    axes: Vec<(InputAxis, AxisBinding)>,
}

impl InputBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &InputConfig) -> Self {
        let mut bindings = InputBindings::new();
        bindings.add_action(InputAction::Jump, config.jump);
        bindings.add_action(InputAction::Teleport, config.teleport);
        bindings.add_action(InputAction::GripLeft, config.grip_left);
        bindings.add_action(InputAction::GripRight, config.grip_right);

        let move_hand = config.move_hand;
        bindings.add_axis(
            InputAxis::MoveForward,
            AxisBinding {
                hand: move_hand,
                axis: ThumbstickAxis::Y,
                scale: 1.0,
            },
        );
        bindings.add_axis(
            InputAxis::MoveRight,
            AxisBinding {
                hand: move_hand,
                axis: ThumbstickAxis::X,
                scale: 1.0,
            },
        );
        bindings
    }

    /// Bind an action by its string name, e.g. `"Teleport"`.
    pub fn bind_action(&mut self, name: &str, binding: ButtonBinding) -> Result<()> {
        let action = name.parse::<InputAction>()?;
        self.add_action(action, binding);
        Ok(())
    }

    /// Bind an axis by its string name, e.g. `"MoveForward"`.
    pub fn bind_axis(&mut self, name: &str, binding: AxisBinding) -> Result<()> {
        let axis = name.parse::<InputAxis>()?;
        self.add_axis(axis, binding);
        Ok(())
    }

    fn add_action(&mut self, action: InputAction, binding: ButtonBinding) {
        self.actions.push((action, binding));
    }

    fn add_axis(&mut self, axis: InputAxis, binding: AxisBinding) {
        self.axes.push((axis, binding));
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappedInput {
    pub events: Vec<ActionEvent>,
    pub move_forward: f32,
    pub move_right: f32,
}

/// Turns raw controller state into action edges and axis values.
pub struct InputMapper {
    bindings: InputBindings,
    was_pressed: HashMap<InputAction, bool>,
}

impl InputMapper {
    pub fn new(bindings: InputBindings) -> Self {
        InputMapper {
            bindings,
            was_pressed: HashMap::new(),
        }
    }

    pub fn bindings_mut(&mut self) -> &mut InputBindings {
        &mut self.bindings
    }

    pub fn map(&mut self, input_context: &InputContext) -> MappedInput {
        let mut mapped = MappedInput::default();

        // An action is down if any of its bindings is down
        let mut is_down: HashMap<InputAction, bool> = HashMap::new();
        for (action, binding) in &self.bindings.actions {
            let entry = is_down.entry(*action).or_insert(false);
            *entry |= binding.is_pressed(input_context);
        }

        for (action, _) in &self.bindings.actions {
            let Some(down) = is_down.remove(action) else {
                continue;
            };
            let was_down = self.was_pressed.insert(*action, down).unwrap_or(false);
            if down && !was_down {
                mapped.events.push(ActionEvent::pressed(*action));
            } else if !down && was_down {
                mapped.events.push(ActionEvent::released(*action));
            }
        }

        for (axis, binding) in &self.bindings.axes {
            let value = binding.value(input_context);
            match axis {
                InputAxis::MoveForward => mapped.move_forward += value,
                InputAxis::MoveRight => mapped.move_right += value,
            }
        }

        mapped
    }
}
