// Comfort options for smooth locomotion

pub mod blinkers;

pub use blinkers::{BlinkerConfig, Blinkers};
