//! In-memory chart structures. Everything here is built once by the loader
//! and `scheduler::build`, then read-only for the rest of the session.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Tap,
    Drag,
    Hold,
    Flick,
}

impl NoteKind {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::Tap => 0,
            Self::Drag => 1,
            Self::Hold => 2,
            Self::Flick => 3,
        }
    }
}

/// Rotate/disappear event: one linearly interpolated scalar over a beat-tick
/// interval. Lists are sorted by `start_time`, contiguous and non-overlapping
/// (guaranteed by the chart author/loader, not re-validated here).
#[derive(Clone, Copy, Debug, Default)]
pub struct LineEvent {
    pub start_time: f32,
    pub end_time: f32,
    pub start: f32,
    pub end: f32,
}

/// Move event: interpolates both axes of the line anchor.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveEvent {
    pub start_time: f32,
    pub end_time: f32,
    pub start_x: f32,
    pub end_x: f32,
    pub start_y: f32,
    pub end_y: f32,
}

/// Speed event. `floor_position` is the scroll distance accumulated by all
/// earlier speed events, filled in by `scheduler::build` as a running sum of
/// `(end_time - start_time) * value`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedEvent {
    pub start_time: f32,
    pub end_time: f32,
    pub value: f32,
    pub floor_position: f32,
}

#[derive(Clone, Debug)]
pub struct Note {
    pub kind: NoteKind,
    /// Head time in beat ticks.
    pub time: f32,
    /// Lane offset in lane units, signed, relative to the line center.
    pub position_x: f32,
    /// Hold duration in beat ticks (zero for non-holds).
    pub hold_time: f32,
    /// Per-note scroll multiplier.
    pub speed: f32,
    pub above: bool,

    // Derived once by scheduler::build.
    /// Head time in seconds.
    pub sect: f32,
    /// Hold end in seconds (== sect for non-holds).
    pub hold_end_sec: f32,
    /// Hold body length in scroll units.
    pub hold_length: f32,
    /// Scroll distance of the owning line at `time`.
    pub floor_position: f32,
    /// True when at least one other note in the whole chart shares this
    /// note's exact trigger second; selects the highlighted skin.
    pub morebets: bool,
}

impl Note {
    pub fn new(kind: NoteKind, time: f32, position_x: f32, hold_time: f32, speed: f32) -> Self {
        Self {
            kind,
            time,
            position_x,
            hold_time,
            speed,
            above: false,
            sect: 0.0,
            hold_end_sec: 0.0,
            hold_length: 0.0,
            floor_position: 0.0,
            morebets: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct JudgeLine {
    /// Always > 0; the loader rejects charts with non-positive bpm.
    pub bpm: f32,
    pub move_events: Vec<MoveEvent>,
    pub rotate_events: Vec<LineEvent>,
    pub disappear_events: Vec<LineEvent>,
    pub speed_events: Vec<SpeedEvent>,

    /// Raw note lists as loaded; drained into `notes` by `scheduler::build`.
    pub notes_above: Vec<Note>,
    pub notes_below: Vec<Note>,
    /// Merged, orientation-tagged, sorted by `time`.
    pub notes: Vec<Note>,
}

#[derive(Clone, Debug, Default)]
pub struct ChartData {
    /// Playback offset in seconds from the chart document.
    pub offset: f32,
    pub lines: Vec<JudgeLine>,
    pub note_count: usize,
}
