// Command processing for debug runtime
//
// This module defines the command interface between the HTTP server and game loop,
// allowing remote control of the running game through a request/response pattern.

use std::time::Duration;

use cgmath::{Quaternion, vec2, vec3};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use vrgrounds::{
    GameSnapshot,
    command::{ActionCommand, AxisCommand, Command, SetPlayerPositionCommand},
    input_context::{Hand, InputContext},
};

/// Commands that can be sent from HTTP handlers to the game loop
#[derive(Debug)]
pub enum RuntimeCommand {
    /// Get current game state snapshot
    GetInfo(oneshot::Sender<FrameSnapshot>),

    /// Step the simulation forward by frames or time
    Step(StepSpec, oneshot::Sender<StepResult>),

    /// Set a tracking or button channel; it holds until changed again
    SetInput(InputPatch, oneshot::Sender<CommandResult>),

    /// Queue a named action, axis or teleport for the next frame
    RunAction(ActionRequest, oneshot::Sender<CommandResult>),

    /// Shutdown the debug runtime gracefully
    Shutdown,
}

/// How far to step the simulation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    /// Step by number of frames
    Frames { frames: u32 },
    /// Step by duration
    Duration { duration: String }, // Parsed with humantime
}

impl StepSpec {
    /// Number of frames this request covers at the given frame length.
    pub fn frame_count(&self, frame: Duration) -> Result<u32, String> {
        match self {
            StepSpec::Frames { frames } => Ok(*frames),
            StepSpec::Duration { duration } => {
                let duration = humantime::parse_duration(duration)
                    .map_err(|err| format!("invalid duration '{}': {}", duration, err))?;
                let frames = duration.as_nanos().div_ceil(frame.as_nanos().max(1));
                Ok(u32::try_from(frames).unwrap_or(u32::MAX))
            }
        }
    }
}

/// Result of stepping the simulation
#[derive(Debug, Serialize)]
pub struct StepResult {
    pub frames_advanced: u32,
    pub time_advanced: f32,
    pub new_frame_index: u64,
    pub new_total_time: f32,
}

/// Input channel modifications, e.g. `{"channel": "right_hand.squeeze", "value": 1.0}`
#[derive(Debug, Deserialize)]
pub struct InputPatch {
    pub channel: String,
    pub value: serde_json::Value,
}

impl InputPatch {
    pub fn apply(&self, input: &mut InputContext) -> Result<(), String> {
        let (target, field) = self
            .channel
            .split_once('.')
            .ok_or_else(|| format!("channel '{}' must be <target>.<field>", self.channel))?;

        if target == "head" {
            return match field {
                "position" => {
                    let [x, y, z] = self.parse::<[f32; 3]>()?;
                    input.head.position = vec3(x, y, z);
                    Ok(())
                }
                "rotation" => {
                    input.head.rotation = self.parse_rotation()?;
                    Ok(())
                }
                _ => Err(self.unknown()),
            };
        }

        let hand: &mut Hand = match target {
            "left_hand" => &mut input.left_hand,
            "right_hand" => &mut input.right_hand,
            _ => return Err(self.unknown()),
        };

        match field {
            "position" => {
                let [x, y, z] = self.parse::<[f32; 3]>()?;
                hand.position = vec3(x, y, z);
            }
            "rotation" => hand.rotation = self.parse_rotation()?,
            "thumbstick" => {
                let [x, y] = self.parse::<[f32; 2]>()?;
                hand.thumbstick = vec2(x, y);
            }
            "trigger" => hand.trigger_value = self.parse()?,
            "squeeze" => hand.squeeze_value = self.parse()?,
            "a" => hand.a_value = self.parse()?,
            "b" => hand.b_value = self.parse()?,
            _ => return Err(self.unknown()),
        }
        Ok(())
    }

    fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        serde_json::from_value(self.value.clone())
            .map_err(|err| format!("bad value for '{}': {}", self.channel, err))
    }

    // Quaternions travel as [w, x, y, z]
    fn parse_rotation(&self) -> Result<Quaternion<f32>, String> {
        let [w, x, y, z] = self.parse::<[f32; 4]>()?;
        Ok(Quaternion::new(w, x, y, z))
    }

    fn unknown(&self) -> String {
        format!("unknown input channel '{}'", self.channel)
    }
}

/// A one-shot game command, queued for the next frame
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ActionRequest {
    Action {
        action: String,
        #[serde(default = "pressed_by_default")]
        pressed: bool,
    },
    Axis {
        axis: String,
        value: f32,
    },
    SetPosition {
        position: [f32; 3],
    },
}

fn pressed_by_default() -> bool {
    true
}

impl ActionRequest {
    pub fn into_command(self) -> Result<Box<dyn Command>, String> {
        match self {
            ActionRequest::Action { action, pressed } => ActionCommand::from_name(&action, pressed)
                .map(|command| Box::new(command) as Box<dyn Command>)
                .map_err(|err| err.to_string()),
            ActionRequest::Axis { axis, value } => AxisCommand::from_name(&axis, value)
                .map(|command| Box::new(command) as Box<dyn Command>)
                .map_err(|err| err.to_string()),
            ActionRequest::SetPosition { position: [x, y, z] } => {
                Ok(Box::new(SetPlayerPositionCommand {
                    position: vec3(x, y, z),
                }))
            }
        }
    }
}

/// Result of executing a game command
#[derive(Debug, Serialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        CommandResult {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CommandResult {
            success: false,
            message: message.into(),
        }
    }
}

/// Current state of the game
#[derive(Debug, Serialize, Clone)]
pub struct FrameSnapshot {
    pub time: TimeInfo,
    pub manual_step: bool,
    pub game: GameSnapshot,
    pub inputs: InputContext,
}

/// Time information
#[derive(Debug, Serialize, Clone)]
pub struct TimeInfo {
    pub elapsed_ms: f32,
    pub total_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(channel: &str, value: serde_json::Value) -> InputPatch {
        InputPatch {
            channel: channel.to_string(),
            value,
        }
    }

    #[test]
    fn test_patch_hand_channels() {
        let mut input = InputContext::default();
        patch("right_hand.squeeze", json!(1.0))
            .apply(&mut input)
            .unwrap();
        patch("left_hand.thumbstick", json!([0.0, 1.0]))
            .apply(&mut input)
            .unwrap();
        patch("head.position", json!([0.5, 1.6, 0.0]))
            .apply(&mut input)
            .unwrap();

        assert_eq!(input.right_hand.squeeze_value, 1.0);
        assert_eq!(input.left_hand.thumbstick, vec2(0.0, 1.0));
        assert_eq!(input.head.position, vec3(0.5, 1.6, 0.0));
    }

    #[test]
    fn test_patch_rejects_unknown_channel() {
        let mut input = InputContext::default();
        assert!(patch("tail.position", json!([0.0, 0.0, 0.0]))
            .apply(&mut input)
            .is_err());
        assert!(patch("left_hand.grip", json!(1.0)).apply(&mut input).is_err());
        assert!(patch("left_hand.trigger", json!("full"))
            .apply(&mut input)
            .is_err());
    }

    #[test]
    fn test_step_duration_rounds_up_to_frames() {
        let frame = Duration::from_millis(10);
        let spec: StepSpec = serde_json::from_value(json!({ "duration": "1s" })).unwrap();
        assert_eq!(spec.frame_count(frame), Ok(100));

        let spec: StepSpec = serde_json::from_value(json!({ "duration": "25ms" })).unwrap();
        assert_eq!(spec.frame_count(frame), Ok(3));

        let spec: StepSpec = serde_json::from_value(json!({ "frames": 3 })).unwrap();
        assert_eq!(spec.frame_count(frame), Ok(3));
    }

    #[test]
    fn test_action_request_forms() {
        let request: ActionRequest =
            serde_json::from_value(json!({ "action": "Teleport" })).unwrap();
        assert!(matches!(
            request,
            ActionRequest::Action { pressed: true, .. }
        ));
        assert!(request.into_command().is_ok());

        let request: ActionRequest =
            serde_json::from_value(json!({ "axis": "MoveSideways", "value": 1.0 })).unwrap();
        assert!(request.into_command().is_err());
    }
}
