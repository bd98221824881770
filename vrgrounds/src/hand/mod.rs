pub mod hand_controller;
pub mod haptics;

pub use hand_controller::{ClimbState, HandConfig, HandController};
pub use haptics::{HapticDevice, HapticEffect, NullHapticDevice, RecordingHapticDevice};
