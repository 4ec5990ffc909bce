// Animation time derived from host timestamps.

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the host clock's origin.
    pub elapsed: f32,
    /// Seconds since the previous tick. Zero on the first tick.
    pub dt: f32,
    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Turns millisecond timestamps from the host into [`FrameTime`]s.
///
/// Timestamps are clamped so the reported time never goes backwards. A
/// non-finite timestamp repeats the last accepted one, or zero before any.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    last_ms: Option<f64>,
    frame_index: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTime {
        let now = match self.last_ms {
            _ if !timestamp_ms.is_finite() => {
                log::debug!("ignoring non-finite timestamp {timestamp_ms}");
                self.last_ms.unwrap_or(0.0)
            }
            Some(last) if timestamp_ms < last => {
                log::debug!("timestamp went backwards ({timestamp_ms} < {last}), clamping");
                last
            }
            _ => timestamp_ms,
        };
        let dt = self.last_ms.map_or(0.0, |last| now - last);
        self.last_ms = Some(now);

        let time = FrameTime {
            elapsed: (now * 0.001) as f32,
            dt: (dt * 0.001) as f32,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }

    /// Last timestamp accepted, in milliseconds.
    pub fn last_ms(&self) -> Option<f64> {
        self.last_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn converts_milliseconds_to_seconds() {
        let mut clock = AnimationClock::new();
        let first = clock.tick(1000.0);
        assert_abs_diff_eq!(first.elapsed, 1.0);
        assert_eq!(first.dt, 0.0);
        assert_eq!(first.frame_index, 0);

        let second = clock.tick(1016.0);
        assert_abs_diff_eq!(second.dt, 0.016, epsilon = 1e-6);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn never_goes_backwards() {
        let mut clock = AnimationClock::new();
        clock.tick(500.0);
        let t = clock.tick(200.0);
        assert_abs_diff_eq!(t.elapsed, 0.5);
        assert_eq!(t.dt, 0.0);
        assert_eq!(clock.last_ms(), Some(500.0));
    }

    #[test]
    fn non_finite_timestamps_are_ignored() {
        let mut clock = AnimationClock::new();
        let first = clock.tick(f64::NAN);
        assert_eq!(first.elapsed, 0.0);
        assert_eq!(clock.last_ms(), Some(0.0));

        let t = clock.tick(250.0);
        assert_abs_diff_eq!(t.elapsed, 0.25);
        assert_abs_diff_eq!(t.dt, 0.25);

        let t = clock.tick(f64::INFINITY);
        assert_abs_diff_eq!(t.elapsed, 0.25);
        assert_eq!(t.dt, 0.0);
        assert!(clock.tick(f64::NAN).dt.is_finite());
    }
}
