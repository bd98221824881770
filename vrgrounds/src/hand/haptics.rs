use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::vr_config::Handedness;

/// A single vibration pulse
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticEffect {
    /// 0..1
    pub amplitude: f32,
    /// 0..1, normalized over the device's range
    pub frequency: f32,
    /// Seconds
    pub duration: f32,
}

impl Default for HapticEffect {
    fn default() -> Self {
        HapticEffect {
            amplitude: 1.0,
            frequency: 0.5,
            duration: 0.1,
        }
    }
}

/// Output side of the motion controllers.
pub trait HapticDevice: Send {
    fn play_haptic_effect(&mut self, hand: Handedness, effect: &HapticEffect);
}

/// Drops every pulse. Used when no device is attached.
#[derive(Default)]
pub struct NullHapticDevice;

impl HapticDevice for NullHapticDevice {
    fn play_haptic_effect(&mut self, _hand: Handedness, _effect: &HapticEffect) {}
}

/// Keeps every pulse it is asked to play. Clones share the same log, so a
/// test or the headless runtime can hold on to one while the game owns the
/// other.
#[derive(Clone, Debug, Default)]
pub struct RecordingHapticDevice {
    played: Arc<Mutex<Vec<(Handedness, HapticEffect)>>>,
}

impl RecordingHapticDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<(Handedness, HapticEffect)> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }

    pub fn played_count(&self) -> usize {
        self.played.lock().map(|played| played.len()).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        if let Ok(mut played) = self.played.lock() {
            played.clear();
        }
    }
}

impl HapticDevice for RecordingHapticDevice {
    fn play_haptic_effect(&mut self, hand: Handedness, effect: &HapticEffect) {
        if let Ok(mut played) = self.played.lock() {
            played.push((hand, *effect));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_device_shares_log() {
        let observer = RecordingHapticDevice::new();
        let mut device: Box<dyn HapticDevice> = Box::new(observer.clone());

        device.play_haptic_effect(Handedness::Left, &HapticEffect::default());
        assert_eq!(observer.played_count(), 1);
        assert_eq!(observer.played()[0].0, Handedness::Left);
    }
}
