use parking_lot::Mutex;
use std::collections::HashMap;
use std::mem;
use std::time::Duration;
use web_time::Instant;

#[macro_export]
macro_rules! debug_panic {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            panic!($($arg)*);
        } else {
            $crate::tracing::error!($($arg)*);
        }
    };
}

/// Emits a log message through a [`LogThrottle`], at most once per interval and category.
///
/// The number of messages swallowed since the last emission is attached as the
/// `suppressed` field.
#[macro_export]
macro_rules! throttled {
    ($throttle:expr, $category:expr, $level:ident, $($arg:tt)*) => {
        if let Some(suppressed) = $throttle.admit($category) {
            $crate::tracing::$level!(suppressed, $($arg)*);
        }
    };
}

#[derive(Debug, Clone, Copy)]
struct CategoryState {
    last_emit: Instant,
    suppressed: u64,
}

/// Rate limiter for steady-state diagnostics.
///
/// Failures that repeat every frame (a rejected draw, a missing camera) would otherwise
/// flood the log. Each category is admitted at most once per `interval`.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    categories: Mutex<HashMap<&'static str, CategoryState>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            categories: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `Some(suppressed)` if a message of this category may be emitted now.
    pub fn admit(&self, category: &'static str) -> Option<u64> {
        let now = Instant::now();
        let mut categories = self.categories.lock();

        let Some(state) = categories.get_mut(category) else {
            categories.insert(
                category,
                CategoryState {
                    last_emit: now,
                    suppressed: 0,
                },
            );
            return Some(0);
        };

        if now.duration_since(state.last_emit) >= self.interval {
            state.last_emit = now;
            Some(mem::take(&mut state.suppressed))
        } else {
            state.suppressed += 1;
            None
        }
    }

    pub fn suppressed(&self, category: &'static str) -> u64 {
        self.categories
            .lock()
            .get(category)
            .map_or(0, |state| state.suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_is_always_admitted() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        assert_eq!(throttle.admit("draw"), Some(0));
    }

    #[test]
    fn repeats_inside_interval_are_counted() {
        let throttle = LogThrottle::new(Duration::from_secs(60));
        assert!(throttle.admit("present").is_some());
        assert!(throttle.admit("present").is_none());
        assert!(throttle.admit("present").is_none());
        assert_eq!(throttle.suppressed("present"), 2);

        // other categories are independent
        assert_eq!(throttle.admit("camera"), Some(0));
    }

    #[test]
    fn zero_interval_admits_everything() {
        let throttle = LogThrottle::new(Duration::ZERO);
        for _ in 0..5 {
            assert_eq!(throttle.admit("draw"), Some(0));
        }
    }

    #[test]
    fn suppressed_count_is_reported_once_interval_passes() {
        let throttle = LogThrottle::new(Duration::from_millis(10));
        throttle.admit("draw");
        throttle.admit("draw");
        throttle.admit("draw");
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(throttle.admit("draw"), Some(2));
        assert_eq!(throttle.suppressed("draw"), 0);
    }
}
