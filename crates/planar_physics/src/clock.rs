//! Simulation clock

use crate::error::{PhysicsError, PhysicsResult};

/// Reject negative or non-finite step durations
pub fn check_elapsed(elapsed_seconds: f32) -> PhysicsResult<f32> {
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(PhysicsError::Validation(format!(
            "elapsed time must be a non-negative number of seconds, got {}",
            elapsed_seconds
        )));
    }
    Ok(elapsed_seconds)
}

/// Current and previous simulation timestamps, in milliseconds
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimClock {
    current_ms: f64,
    previous_ms: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the latest step
    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    /// Timestamp of the step before the latest one
    pub fn previous_ms(&self) -> f64 {
        self.previous_ms
    }

    /// Milliseconds between the previous and current timestamps
    pub fn delta_ms(&self) -> f64 {
        self.current_ms - self.previous_ms
    }

    /// Advance by an elapsed duration in seconds
    pub fn advance(&mut self, elapsed_seconds: f32) -> PhysicsResult<()> {
        check_elapsed(elapsed_seconds)?;
        self.previous_ms = self.current_ms;
        self.current_ms += elapsed_seconds as f64 * 1000.0;
        Ok(())
    }

    /// Advance one host frame
    ///
    /// Jumps to the host timestamp when it is ahead. When explicit steps have
    /// carried the clock past host time, it moves on by the frame duration
    /// instead, so the clock never runs backwards.
    pub fn advance_frame(&mut self, now_ms: f64, frame_seconds: f32) -> PhysicsResult<()> {
        check_elapsed(frame_seconds)?;
        if !now_ms.is_finite() {
            return Err(PhysicsError::Validation(format!("host time must be finite, got {}", now_ms)));
        }
        let next = if now_ms >= self.current_ms {
            now_ms
        } else {
            self.current_ms + frame_seconds as f64 * 1000.0
        };
        self.previous_ms = self.current_ms;
        self.current_ms = next;
        Ok(())
    }

    /// Rewind both timestamps to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = SimClock::new();
        clock.advance(0.5).unwrap();
        clock.advance(0.25).unwrap();
        assert_eq!(clock.previous_ms(), 500.0);
        assert_eq!(clock.current_ms(), 750.0);
        assert_eq!(clock.delta_ms(), 250.0);
    }

    #[test]
    fn test_zero_elapsed_is_valid() {
        let mut clock = SimClock::new();
        clock.advance(1.0).unwrap();
        clock.advance(0.0).unwrap();
        assert_eq!(clock.current_ms(), 1000.0);
        assert_eq!(clock.delta_ms(), 0.0);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let mut clock = SimClock::new();
        assert!(clock.advance(-0.1).is_err());
        assert!(clock.advance(f32::NAN).is_err());
        assert_eq!(clock, SimClock::new());
    }

    #[test]
    fn test_advance_frame_follows_host_time() {
        let mut clock = SimClock::new();
        clock.advance_frame(100.0, 0.016).unwrap();
        clock.advance_frame(116.0, 0.016).unwrap();
        assert_eq!(clock.previous_ms(), 100.0);
        assert_eq!(clock.current_ms(), 116.0);
    }

    #[test]
    fn test_advance_frame_behind_host_uses_frame_duration() {
        let mut clock = SimClock::new();
        clock.advance(1.0).unwrap();
        clock.advance_frame(16.0, 0.5).unwrap();
        assert_eq!(clock.previous_ms(), 1000.0);
        assert_eq!(clock.current_ms(), 1500.0);

        // Host time catches up and takes over again
        clock.advance_frame(2000.0, 0.5).unwrap();
        assert_eq!(clock.current_ms(), 2000.0);
    }

    #[test]
    fn test_advance_frame_rejects_bad_input() {
        let mut clock = SimClock::new();
        assert!(clock.advance_frame(f64::NAN, 0.016).is_err());
        assert!(clock.advance_frame(16.0, -1.0).is_err());
        assert_eq!(clock, SimClock::new());
    }

    #[test]
    fn test_reset() {
        let mut clock = SimClock::new();
        clock.advance(2.0).unwrap();
        clock.reset();
        assert_eq!(clock.current_ms(), 0.0);
        assert_eq!(clock.previous_ms(), 0.0);
    }
}
