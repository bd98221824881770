use std::time::Duration;

/// Frame timing handed to every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct Time {
    // Time since the previous frame
    pub elapsed: Duration,
    // Time since the game started
    pub total: Duration,
}

impl Time {
    pub fn from_delta(elapsed: Duration, previous: &Time) -> Time {
        Time {
            elapsed,
            total: previous.total + elapsed,
        }
    }
}
