//! Host simulation clock
//!
//! Produces the `(now_ms, frame_seconds)` pair the physics update expects:
//! - Wall-clock mode measures real frame time from an `Instant`
//! - Fixed mode advances by a constant frame duration (headless runs, tests)

use std::time::Instant;

use planar_core::Stage;
use planar_physics::PhysicsResult;

use crate::config::SimulationConfig;

/// Timing of one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the system started
    pub now_ms: f64,
    /// Duration of this frame in seconds
    pub frame_seconds: f32,
}

enum Clock {
    Wall { start: Instant, last_frame: Instant },
    Fixed { now_ms: f64 },
}

/// Drives every World on a stage once per frame
pub struct SimulationSystem {
    clock: Clock,
    frame_seconds: f32,
    max_frame_seconds: f32,
    frames: u64,
}

impl SimulationSystem {
    /// Create a system that measures real frame time
    pub fn new(config: &SimulationConfig) -> Self {
        let now = Instant::now();
        Self {
            clock: Clock::Wall {
                start: now,
                last_frame: now,
            },
            frame_seconds: config.frame_seconds,
            max_frame_seconds: config.max_frame_seconds,
            frames: 0,
        }
    }

    /// Create a system that advances by `config.frame_seconds` every frame
    pub fn fixed(config: &SimulationConfig) -> Self {
        Self {
            clock: Clock::Fixed { now_ms: 0.0 },
            frame_seconds: config.frame_seconds,
            max_frame_seconds: config.max_frame_seconds,
            frames: 0,
        }
    }

    /// Frames produced so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance the clock by one frame
    pub fn next_frame(&mut self) -> FrameTime {
        self.frames += 1;
        match &mut self.clock {
            Clock::Wall { start, last_frame } => {
                let now = Instant::now();
                // Cap dt so a stall (first frame, debugger) doesn't explode the step
                let frame_seconds = (now - *last_frame).as_secs_f32().min(self.max_frame_seconds);
                *last_frame = now;
                FrameTime {
                    now_ms: (now - *start).as_secs_f64() * 1000.0,
                    frame_seconds,
                }
            }
            Clock::Fixed { now_ms } => {
                let frame_seconds = self.frame_seconds.min(self.max_frame_seconds);
                *now_ms += frame_seconds as f64 * 1000.0;
                FrameTime {
                    now_ms: *now_ms,
                    frame_seconds,
                }
            }
        }
    }

    /// Run one frame: advance the clock and update every World on the stage
    pub fn update(&mut self, stage: &mut Stage) -> PhysicsResult<FrameTime> {
        let frame = self.next_frame();
        stage.update(frame.now_ms, frame.frame_seconds)?;
        Ok(frame)
    }
}
