use crate::foundation::core::{Fps, FrameIndex};

/// What the driver does with one parsed timestep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    /// Draw the timestep as video frame `index`, showing `collisions` in the overlay.
    Render {
        /// Output frame index.
        index: FrameIndex,
        /// Rewinds seen so far.
        collisions: u64,
    },
    /// The timestep is earlier than the video clock: count it, do not draw it.
    Rewind {
        /// Rewinds seen so far, including this one.
        collisions: u64,
    },
}

/// Running video clock with rewind counting.
///
/// The clock starts at 0 and advances by `1/fps` for every rendered frame. A timestep strictly
/// earlier than the clock is a rewind: it increments the collision counter and leaves the clock
/// unchanged. Forward timesteps never touch the counter.
#[derive(Clone, Copy, Debug)]
pub struct RewindClock {
    fps: Fps,
    rendered: u64,
    collisions: u64,
}

impl RewindClock {
    /// Clock at time 0 with no frames rendered.
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            rendered: 0,
            collisions: 0,
        }
    }

    /// Current video time. Computed from the rendered frame count so it does not drift.
    pub fn current_time(&self) -> f64 {
        self.fps.frames_to_secs(self.rendered)
    }

    /// Decide on a timestep at `time` and advance the clock accordingly.
    pub fn admit(&mut self, time: f64) -> FrameDecision {
        if time < self.current_time() {
            self.collisions += 1;
            return FrameDecision::Rewind {
                collisions: self.collisions,
            };
        }
        let index = FrameIndex(self.rendered);
        self.rendered += 1;
        FrameDecision::Render {
            index,
            collisions: self.collisions,
        }
    }

    /// Frames rendered so far.
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    /// Rewinds counted so far.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }
}
