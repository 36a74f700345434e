//! Note scheduling: one-time chart finalization (merging, derived timing,
//! morebets detection, click-effect collection) and the per-frame queries the
//! renderer consumes.

use log::debug;
use rand::{Rng, RngExt};
use rustc_hash::FxHashMap;

use crate::game::SCROLL_UNIT;
use crate::game::chart::{ChartData, NoteKind};
use crate::game::timeline::{self, beat2sec, sec2beat};

/// Trigger bookkeeping lives here, in the scheduler's arena, rather than as a
/// flag mutated through the shared note list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    Pending,
    Triggered,
}

/// Random seed for one burst particle, fixed at build time so the effect
/// animation is stable across frames.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Launch direction in degrees.
    pub angle: f32,
    /// Travel distance at full extension, in 1080p reference pixels.
    pub radius: f32,
}

/// One transient hit cue. Head effects mark note consumption and advance the
/// combo counter; hold-tick effects only replay the visual.
#[derive(Clone, Debug)]
pub struct ClickEffect {
    pub line: usize,
    /// Trigger second.
    pub time: f32,
    /// Lane offset of the owning note, in lane units.
    pub position_x: f32,
    pub above: bool,
    pub head: bool,
    pub state: TriggerState,
    pub particles: [Particle; 4],
}

/// Screen-space placement request for one visible note, produced fresh every
/// frame. Distances are in pixels along the owning line's normal.
#[derive(Clone, Copy, Debug)]
pub struct NotePlacement {
    pub line: usize,
    pub note: usize,
    pub distance: f32,
    /// Remaining hold body length, zero for non-holds.
    pub hold_body: f32,
}

/// Owns the time-sorted effect collection and the active window over it. The
/// window only moves forward; playback time must be non-decreasing while the
/// clock runs, which the pause rebasing in [`crate::core::clock`] guarantees.
#[derive(Debug, Default)]
pub struct NoteScheduler {
    effects: Vec<ClickEffect>,
    lo: usize,
    hi: usize,
    combo: u32,
}

fn burst_particles<R: Rng>(rng: &mut R) -> [Particle; 4] {
    std::array::from_fn(|_| Particle {
        angle: rng.random_range(0.0..360.0),
        radius: rng.random_range(185.0..265.0),
    })
}

/// Finalize a freshly loaded chart and build its scheduler. Fills speed-event
/// prefix sums, merges per-orientation note lists, derives per-note timing,
/// marks morebets, and assembles the sorted click-effect collection.
///
/// `hold_tick_factor` is the numerator of the hold re-trigger interval
/// (`factor / bpm` seconds between ticks).
pub fn build(chart: &mut ChartData, hold_tick_factor: f32) -> NoteScheduler {
    let mut rng = rand::rng();
    let mut effects: Vec<ClickEffect> = Vec::new();
    let mut sect_counts: FxHashMap<u32, u32> = FxHashMap::default();
    let mut note_count = 0usize;

    for line in &mut chart.lines {
        let mut fp = 0.0f32;
        for ev in &mut line.speed_events {
            ev.floor_position = fp;
            fp += (ev.end_time - ev.start_time) * ev.value;
        }

        let mut notes = Vec::with_capacity(line.notes_above.len() + line.notes_below.len());
        for mut note in line.notes_above.drain(..) {
            note.above = true;
            notes.push(note);
        }
        for mut note in line.notes_below.drain(..) {
            note.above = false;
            notes.push(note);
        }
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));

        for note in &mut notes {
            note.sect = beat2sec(line.bpm, note.time);
            note.hold_end_sec = beat2sec(line.bpm, note.time + note.hold_time);
            note.hold_length = (note.hold_end_sec - note.sect) * note.speed * SCROLL_UNIT;
            note.floor_position = timeline::floor_position_at(line, note.time);
            *sect_counts.entry(note.sect.to_bits()).or_insert(0) += 1;
        }

        note_count += notes.len();
        line.notes = notes;
    }
    chart.note_count = note_count;

    for (li, line) in chart.lines.iter_mut().enumerate() {
        let bpm = line.bpm;
        for note in &mut line.notes {
            note.morebets = sect_counts.get(&note.sect.to_bits()).copied().unwrap_or(0) > 1;

            effects.push(ClickEffect {
                line: li,
                time: note.sect,
                position_x: note.position_x,
                above: note.above,
                head: true,
                state: TriggerState::Pending,
                particles: burst_particles(&mut rng),
            });
            if note.kind == NoteKind::Hold {
                let tick = hold_tick_factor / bpm;
                let mut t = note.sect + tick;
                while t < note.hold_end_sec {
                    effects.push(ClickEffect {
                        line: li,
                        time: t,
                        position_x: note.position_x,
                        above: note.above,
                        head: false,
                        state: TriggerState::Pending,
                        particles: burst_particles(&mut rng),
                    });
                    t += tick;
                }
            }
        }
    }

    effects.sort_by(|a, b| a.time.total_cmp(&b.time));
    debug!(
        "scheduler built: {} notes, {} click effects across {} lines",
        note_count,
        effects.len(),
        chart.lines.len()
    );

    NoteScheduler {
        effects,
        lo: 0,
        hi: 0,
        combo: 0,
    }
}

impl NoteScheduler {
    /// Slide the active window up to playback second `t`. Effects entering
    /// the window flip to Triggered exactly once; head effects advance the
    /// combo on that same frame. Effects older than `effect_duration` fall
    /// out of the window and stop rendering.
    pub fn advance(&mut self, t: f32, effect_duration: f32) {
        while self.hi < self.effects.len() && self.effects[self.hi].time <= t {
            let eff = &mut self.effects[self.hi];
            if eff.state == TriggerState::Pending {
                eff.state = TriggerState::Triggered;
                if eff.head {
                    self.combo += 1;
                }
            }
            self.hi += 1;
        }
        while self.lo < self.hi && self.effects[self.lo].time + effect_duration < t {
            self.lo += 1;
        }
    }

    /// Effects currently within their animation window.
    pub fn active_effects(&self) -> &[ClickEffect] {
        &self.effects[self.lo..self.hi]
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }
}

/// Compute the placement of every still-visible note at playback second `t`.
/// `height` is the framebuffer height in pixels, `scroll_scale` the user's
/// scroll-speed multiplier. Results are appended to `out` so the caller can
/// reuse one allocation across frames.
pub fn placements(chart: &ChartData, t: f32, height: f32, scroll_scale: f32, out: &mut Vec<NotePlacement>) {
    let px = SCROLL_UNIT * height * scroll_scale;
    for (li, line) in chart.lines.iter().enumerate() {
        let beat = sec2beat(line.bpm, t);
        let line_fp = timeline::floor_position_at(line, beat);
        for (ni, note) in line.notes.iter().enumerate() {
            let consumed = match note.kind {
                NoteKind::Hold => note.hold_end_sec < t,
                _ => note.sect < t,
            };
            if consumed {
                continue;
            }

            if note.kind == NoteKind::Hold && t >= note.sect {
                // Head has reached the line; pin it there and shrink the body.
                let body = ((note.hold_end_sec - t) * note.speed * px).max(0.0);
                out.push(NotePlacement {
                    line: li,
                    note: ni,
                    distance: 0.0,
                    hold_body: body,
                });
                continue;
            }

            let distance = (note.floor_position - line_fp) * note.speed * px;
            if distance < 0.0 {
                // Behind the line before its time, usually a speed trick.
                continue;
            }
            let hold_body = if note.kind == NoteKind::Hold {
                note.hold_length * height * scroll_scale
            } else {
                0.0
            };
            out.push(NotePlacement {
                line: li,
                note: ni,
                distance,
                hold_body,
            });
        }
    }
}
