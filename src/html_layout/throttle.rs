//! Render request coalescing

/// Outcome of a render request
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Schedule {
    /// Render now
    Now,
    /// A single forced render will run at `at` (ms)
    Deferred { at: f64 },
}

/// Coalesces render requests arriving faster than the throttle interval.
///
/// A request inside the interval replaces any pending one; the pending
/// deadline moves to `request time + interval`.
#[derive(Clone, Debug)]
pub struct RenderThrottle {
    interval_ms: f64,
    last_render: Option<f64>,
    pending: Option<f64>,
}

impl RenderThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_render: None,
            pending: None,
        }
    }

    /// Ask for a render at `now`. Forced requests always run immediately.
    pub fn request(&mut self, now: f64, force: bool) -> Schedule {
        let throttled = self
            .last_render
            .map(|last| now - last < self.interval_ms)
            .unwrap_or(false);

        if throttled && !force {
            let at = now + self.interval_ms;
            self.pending = Some(at);
            return Schedule::Deferred { at };
        }

        self.last_render = Some(now);
        self.pending = None;
        Schedule::Now
    }

    /// True when the pending render is due; the pending slot is consumed
    pub fn poll(&mut self, now: f64) -> bool {
        match self.pending {
            Some(at) if now >= at => {
                self.pending = None;
                self.last_render = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Deadline of the pending render, if any
    pub fn deadline(&self) -> Option<f64> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_runs() {
        let mut throttle = RenderThrottle::new(16.0);
        assert_eq!(throttle.request(0.0, false), Schedule::Now);
        assert_eq!(throttle.deadline(), None);
    }

    #[test]
    fn test_burst_coalesces_into_one() {
        let mut throttle = RenderThrottle::new(16.0);
        throttle.request(100.0, false);
        assert_eq!(throttle.request(105.0, false), Schedule::Deferred { at: 121.0 });
        assert_eq!(throttle.request(110.0, false), Schedule::Deferred { at: 126.0 });

        assert!(!throttle.poll(121.0));
        assert!(throttle.poll(126.0));
        assert!(!throttle.poll(200.0));
    }

    #[test]
    fn test_forced_request_bypasses_interval() {
        let mut throttle = RenderThrottle::new(16.0);
        throttle.request(0.0, false);
        throttle.request(4.0, false);
        assert_eq!(throttle.request(8.0, true), Schedule::Now);
        assert_eq!(throttle.deadline(), None);
    }
}
