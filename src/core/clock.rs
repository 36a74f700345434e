//! Pause-aware playback clock. Playback time is wall clock minus an epoch;
//! while paused the epoch is re-based every frame so that resuming continues
//! from the frozen time without a jump. Time never decreases while running,
//! which the scheduler's one-shot trigger window relies on.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct PlaybackClock {
    epoch: Instant,
    paused: bool,
    /// Playback second captured when the pause began.
    frozen: f32,
}

impl PlaybackClock {
    /// Starts paused at time zero; call [`toggle_pause`](Self::toggle_pause)
    /// to begin playback.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            paused: true,
            frozen: 0.0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.epoch = Instant::now() - Duration::from_secs_f32(self.frozen.max(0.0));
        } else {
            self.frozen = self.epoch.elapsed().as_secs_f32();
        }
        self.paused = !self.paused;
    }

    /// Advance one frame. While paused this slides the epoch forward so the
    /// frozen second keeps pointing at "now minus epoch".
    pub fn tick(&mut self) {
        if self.paused {
            self.epoch = Instant::now() - Duration::from_secs_f32(self.frozen.max(0.0));
        }
    }

    /// Current playback time in seconds.
    pub fn seconds(&self) -> f32 {
        if self.paused {
            self.frozen
        } else {
            self.epoch.elapsed().as_secs_f32()
        }
    }

}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
