//! Frame timing
//!
//! [`FrameClock`] is the engine's metronome: it is ticked exactly once per
//! presented frame and reports the last frame's delta plus the number of
//! frames completed during the last full second.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Per-frame timing tracker producing delta time and frames-per-second.
#[derive(Debug, Clone)]
pub struct FrameClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: Instant,
    start: f64,
    last_frame: f64,
    elapsed: f64,
    frames: u64,
    total_frames: u64,
    fps: f64,
    delta: f64,
}

impl FrameClock {
    /// Slack applied when deciding whether a full second has accumulated.
    ///
    /// Summing sixty `1/60` deltas lands a hair below `1.0` in binary floating
    /// point; without the slack that second would close one frame late.
    pub const SECOND_EPSILON: f64 = 1e-9;

    /// Create a clock whose time origin is `now` (seconds, monotonic).
    pub fn starting_at(now: f64) -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: Instant::now(),
            start: now,
            last_frame: now,
            elapsed: 0.0,
            frames: 0,
            total_frames: 0,
            fps: 0.0,
            delta: 0.0,
        }
    }

    /// Create a clock backed by [`std::time::Instant`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Tick using the process monotonic clock.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn tick(&mut self) {
        let now = self.origin.elapsed().as_secs_f64();
        self.tick_at(now);
    }

    /// Tick with a timestamp from an external monotonic source.
    ///
    /// Timestamps that go backwards are treated as a zero delta.
    pub fn tick_at(&mut self, now: f64) {
        let now = now.max(self.last_frame);
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Tick with an explicit delta in seconds.
    pub fn advance(&mut self, delta: f64) {
        let delta = delta.max(0.0);
        self.frames += 1;
        self.total_frames += 1;
        self.delta = delta;
        self.elapsed += delta;

        if self.elapsed + Self::SECOND_EPSILON >= 1.0 {
            self.fps = self.frames as f64;
            self.frames = 0;
            self.elapsed %= 1.0;
            // Accumulation error can leave us just shy of a whole second
            if 1.0 - self.elapsed <= Self::SECOND_EPSILON {
                self.elapsed = 0.0;
            }
        }
    }

    /// Seconds between the last two ticks.
    pub fn delta(&self) -> f32 {
        self.delta as f32
    }

    /// Frames counted during the last completed second.
    pub fn fps(&self) -> f32 {
        self.fps as f32
    }

    /// Seconds since the clock started, as of the last tick.
    pub fn time(&self) -> f32 {
        (self.last_frame - self.start) as f32
    }

    /// Total number of ticks since the clock started.
    pub fn frames(&self) -> u64 {
        self.total_frames
    }

    /// Fraction of the current second accumulated so far.
    pub fn elapsed_in_second(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sixty_ticks_report_sixty_fps() {
        let mut clock = FrameClock::starting_at(0.0);
        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
        }

        assert_relative_eq!(clock.fps(), 60.0);
        assert!(clock.elapsed_in_second().abs() < 1e-6);
        assert_eq!(clock.frames(), 60);
    }

    #[test]
    fn test_fps_holds_until_next_second() {
        let mut clock = FrameClock::starting_at(0.0);
        for _ in 0..30 {
            clock.advance(1.0 / 30.0);
        }
        assert_relative_eq!(clock.fps(), 30.0);

        for _ in 0..10 {
            clock.advance(1.0 / 60.0);
        }
        assert_relative_eq!(clock.fps(), 30.0);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = FrameClock::starting_at(0.0);
        clock.advance(0.75);
        clock.advance(0.5);

        assert_relative_eq!(clock.fps(), 2.0);
        assert_relative_eq!(clock.elapsed_in_second(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_tick_at_uses_timestamp_difference() {
        let mut clock = FrameClock::starting_at(10.0);
        clock.tick_at(10.25);

        assert_relative_eq!(clock.delta(), 0.25);
        assert_relative_eq!(clock.time(), 0.25);
    }

    #[test]
    fn test_backwards_timestamp_is_zero_delta() {
        let mut clock = FrameClock::starting_at(5.0);
        clock.tick_at(4.0);

        assert_eq!(clock.delta(), 0.0);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_monotonic_tick() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.tick();

        assert!(clock.delta() >= 0.0);
        assert_eq!(clock.frames(), 2);
    }
}
