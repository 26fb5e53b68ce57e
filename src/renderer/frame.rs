use web_time::{Duration, Instant};

/// Timing of the frame being drawn, passed to everything that animates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameContext {
    /// Time since the clock was started.
    pub elapsed: Duration,
    /// Time since the previous frame.
    pub delta: Duration,
    pub frame: u64,
}

impl FrameContext {
    /// Period of the selection highlight pulse.
    const PULSE_PERIOD_SECS: f32 = 1.6;

    /// Smooth 0..1 oscillation used to animate selected elements.
    pub fn pulse(&self) -> f32 {
        let phase = self.elapsed.as_secs_f32() / Self::PULSE_PERIOD_SECS * std::f32::consts::TAU;
        0.5 - 0.5 * phase.cos()
    }
}

/// Owned by the engine; produces one [`FrameContext`] per frame.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame: u64,
    fps_counter: u32,
    last_fps_time: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame: 0,
            fps_counter: 0,
            last_fps_time: now,
        }
    }

    pub fn tick(&mut self) -> FrameContext {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameContext {
        let context = FrameContext {
            elapsed: now.saturating_duration_since(self.start),
            delta: now.saturating_duration_since(self.last),
            frame: self.frame,
        };
        self.last = now;
        self.frame += 1;

        self.fps_counter += 1;
        let since = now.saturating_duration_since(self.last_fps_time);
        if since.as_secs_f32() >= 1.0 {
            log::trace!("FPS: {:.2}", self.fps_counter as f32 / since.as_secs_f32());
            self.last_fps_time = now;
            self.fps_counter = 0;
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_count_up_and_time_advances() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        let first = clock.tick_at(start + Duration::from_millis(16));
        let second = clock.tick_at(start + Duration::from_millis(40));

        assert_eq!((first.frame, second.frame), (0, 1));
        assert_eq!(second.elapsed, Duration::from_millis(40));
        assert_eq!(second.delta, Duration::from_millis(24));
    }

    #[test]
    fn pulse_stays_in_unit_range() {
        for ms in (0..4000).step_by(37) {
            let context = FrameContext {
                elapsed: Duration::from_millis(ms),
                delta: Duration::ZERO,
                frame: 0,
            };
            assert!((0.0..=1.0).contains(&context.pulse()));
        }
    }
}
