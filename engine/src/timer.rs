use std::time::Duration;

/// Handle to a scheduled timer, usable for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct PendingTimer<T> {
    handle: TimerHandle,
    remaining: Duration,
    payload: T,
}

/// Fire-once delayed callbacks, advanced by the frame loop.
///
/// Timers never fire early: a timer armed with delay `d` fires during the
/// first `advance` call that brings its accumulated time to at least `d`.
/// Expired payloads are returned in deadline order; timers due at the
/// same moment come back in the order they were scheduled.
pub struct TimerManager<T> {
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> TimerManager<T> {
    pub fn new() -> Self {
        TimerManager {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn set_timer(&mut self, payload: T, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            handle,
            remaining: delay,
            payload,
        });
        handle
    }

    /// Returns true if the timer was still pending.
    pub fn clear_timer(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.handle != handle);
        before != self.pending.len()
    }

    pub fn is_timer_active(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|timer| timer.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        let mut fired = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut timer in self.pending.drain(..) {
            if timer.remaining <= elapsed {
                fired.push((timer.remaining, timer.handle.0, timer.payload));
            } else {
                timer.remaining -= elapsed;
                still_pending.push(timer);
            }
        }

        self.pending = still_pending;
        fired.sort_by_key(|(due, id, _)| (*due, *id));
        fired.into_iter().map(|(_, _, payload)| payload).collect()
    }
}

impl<T> Default for TimerManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_once_after_delay() {
        let mut timers = TimerManager::new();
        timers.set_timer("finish", Duration::from_millis(100));

        assert!(timers.advance(Duration::from_millis(60)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(40)), vec!["finish"]);
        assert!(timers.advance(Duration::from_millis(500)).is_empty());
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_large_frame_fires_late_not_early() {
        let mut timers = TimerManager::new();
        timers.set_timer(1, Duration::from_millis(10));
        timers.set_timer(2, Duration::from_millis(30));

        assert!(timers.advance(Duration::from_millis(9)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(50)), vec![1, 2]);
    }

    #[test]
    fn test_cleared_timer_never_fires() {
        let mut timers = TimerManager::new();
        let handle = timers.set_timer((), Duration::from_millis(10));

        assert!(timers.is_timer_active(handle));
        assert!(timers.clear_timer(handle));
        assert!(!timers.is_timer_active(handle));
        assert!(!timers.clear_timer(handle));
        assert!(timers.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_expired_timers_come_back_in_deadline_order() {
        let mut timers = TimerManager::new();
        timers.set_timer("late", Duration::from_millis(90));
        timers.set_timer("early", Duration::from_millis(10));
        timers.set_timer("also_late", Duration::from_millis(90));

        assert_eq!(
            timers.advance(Duration::from_millis(100)),
            vec!["early", "late", "also_late"]
        );
    }
}
