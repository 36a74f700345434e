//! Per-line event evaluation: beat/second conversion, interval lookup,
//! interpolation, and cumulative scroll distance.

use crate::game::BEAT_UNIT;
use crate::game::chart::{JudgeLine, LineEvent, MoveEvent, SpeedEvent};

/// Instantaneous state of a judge line. The defaults double as the neutral
/// values returned whenever a query time falls outside an event list's span
/// (missing lists behave the same way); out-of-range queries never clamp to
/// the nearest boundary value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePose {
    /// Degrees, counter-clockwise.
    pub rotate: f32,
    /// Normalized anchor position, x right, y up.
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
    /// Current scroll speed in scroll units per beat tick.
    pub speed: f32,
}

impl Default for LinePose {
    fn default() -> Self {
        Self {
            rotate: 0.0,
            x: 0.0,
            y: 0.0,
            alpha: 1.0,
            speed: 0.0,
        }
    }
}

pub trait TimedRange {
    fn start_time(&self) -> f32;
    fn end_time(&self) -> f32;
}

impl TimedRange for LineEvent {
    fn start_time(&self) -> f32 {
        self.start_time
    }
    fn end_time(&self) -> f32 {
        self.end_time
    }
}

impl TimedRange for MoveEvent {
    fn start_time(&self) -> f32 {
        self.start_time
    }
    fn end_time(&self) -> f32 {
        self.end_time
    }
}

impl TimedRange for SpeedEvent {
    fn start_time(&self) -> f32 {
        self.start_time
    }
    fn end_time(&self) -> f32 {
        self.end_time
    }
}

#[inline(always)]
pub fn beat2sec(bpm: f32, beat: f32) -> f32 {
    beat * (BEAT_UNIT / bpm)
}

#[inline(always)]
pub fn sec2beat(bpm: f32, sec: f32) -> f32 {
    sec / (BEAT_UNIT / bpm)
}

/// Binary search for the unique interval with `start_time <= t <= end_time`.
/// Returns None before the first interval, after the last, or inside an
/// authoring gap.
pub fn find_interval<E: TimedRange>(t: f32, events: &[E]) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = events.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        let e = &events[mid];
        if t < e.start_time() {
            hi = mid;
        } else if t > e.end_time() {
            lo = mid + 1;
        } else {
            return Some(mid);
        }
    }
    None
}

/// Linear interpolation over an interval. Zero-length intervals are
/// instantaneous jumps to `end`.
#[inline(always)]
pub fn interpolate(t: f32, start_time: f32, end_time: f32, start: f32, end: f32) -> f32 {
    if end_time <= start_time {
        return end;
    }
    (t - start_time) / (end_time - start_time) * (end - start) + start
}

fn scalar_at(t: f32, events: &[LineEvent], default: f32) -> f32 {
    match find_interval(t, events) {
        Some(i) => {
            let e = &events[i];
            interpolate(t, e.start_time, e.end_time, e.start, e.end)
        }
        None => default,
    }
}

/// Evaluate all four event lists at a playback second.
pub fn pose_at(line: &JudgeLine, t_sec: f32) -> LinePose {
    let beat = sec2beat(line.bpm, t_sec);
    let neutral = LinePose::default();

    let (x, y) = match find_interval(beat, &line.move_events) {
        Some(i) => {
            let e = &line.move_events[i];
            (
                interpolate(beat, e.start_time, e.end_time, e.start_x, e.end_x),
                interpolate(beat, e.start_time, e.end_time, e.start_y, e.end_y),
            )
        }
        None => (neutral.x, neutral.y),
    };

    let speed = match find_interval(beat, &line.speed_events) {
        Some(i) => line.speed_events[i].value,
        None => neutral.speed,
    };

    LinePose {
        rotate: scalar_at(beat, &line.rotate_events, neutral.rotate),
        x,
        y,
        alpha: scalar_at(beat, &line.disappear_events, neutral.alpha),
        speed,
    }
}

/// Cumulative scroll distance at a beat tick. Monotone non-decreasing as long
/// as every speed value is >= 0. Outside the covered span this is 0, like
/// every other out-of-range query.
pub fn floor_position_at(line: &JudgeLine, beat: f32) -> f32 {
    match find_interval(beat, &line.speed_events) {
        Some(i) => {
            let e = &line.speed_events[i];
            (beat - e.start_time).mul_add(e.value, e.floor_position)
        }
        None => 0.0,
    }
}
