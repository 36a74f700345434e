//! Loader for the official chart JSON document. Deserializes into mirror
//! structs, validates the parts playback cannot default, and converts into
//! the in-memory model from [`crate::game::chart`].
//!
//! Format v1 packs both move axes into one number per endpoint
//! (`x = floor(v / 1000) / 880`, `y = (v % 1000) / 520`); v3 carries them as
//! separate `start2`/`end2` fields. Everything else is shared.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::game::chart::{ChartData, JudgeLine, LineEvent, MoveEvent, Note, NoteKind, SpeedEvent};

// --- SERIALIZABLE MIRROR STRUCTS ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartDoc {
    #[serde(default)]
    format_version: u32,
    #[serde(default)]
    offset: f32,
    judge_line_list: Vec<JudgeLineDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgeLineDoc {
    bpm: f32,
    #[serde(default)]
    judge_line_move_events: Vec<EventDoc>,
    #[serde(default)]
    judge_line_rotate_events: Vec<EventDoc>,
    #[serde(default)]
    judge_line_disappear_events: Vec<EventDoc>,
    #[serde(default)]
    speed_events: Vec<SpeedEventDoc>,
    #[serde(default)]
    notes_above: Vec<NoteDoc>,
    #[serde(default)]
    notes_below: Vec<NoteDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDoc {
    start_time: f32,
    end_time: f32,
    #[serde(default)]
    start: f32,
    #[serde(default)]
    end: f32,
    #[serde(default)]
    start2: Option<f32>,
    #[serde(default)]
    end2: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedEventDoc {
    start_time: f32,
    end_time: f32,
    value: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteDoc {
    #[serde(rename = "type")]
    kind: u32,
    time: f32,
    #[serde(default)]
    position_x: f32,
    #[serde(default)]
    hold_time: f32,
    #[serde(default = "default_speed")]
    speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

// --- CONVERSION ---

#[inline(always)]
fn unpack_v1(v: f32) -> (f32, f32) {
    ((v / 1000.0).floor() / 880.0, (v % 1000.0) / 520.0)
}

fn convert_move_event(doc: &EventDoc, format_version: u32) -> MoveEvent {
    let (start_x, start_y, end_x, end_y) = match (doc.start2, doc.end2) {
        (Some(s2), Some(e2)) => (doc.start, s2, doc.end, e2),
        _ if format_version < 3 => {
            let (sx, sy) = unpack_v1(doc.start);
            let (ex, ey) = unpack_v1(doc.end);
            (sx, sy, ex, ey)
        }
        _ => (doc.start, 0.0, doc.end, 0.0),
    };
    MoveEvent {
        start_time: doc.start_time,
        end_time: doc.end_time,
        start_x,
        end_x,
        start_y,
        end_y,
    }
}

fn convert_line_event(doc: &EventDoc) -> LineEvent {
    LineEvent {
        start_time: doc.start_time,
        end_time: doc.end_time,
        start: doc.start,
        end: doc.end,
    }
}

fn convert_note(doc: &NoteDoc) -> Option<Note> {
    let kind = match doc.kind {
        1 => NoteKind::Tap,
        2 => NoteKind::Drag,
        3 => NoteKind::Hold,
        4 => NoteKind::Flick,
        other => {
            warn!("skipping note with unknown type code {other}");
            return None;
        }
    };
    Some(Note::new(kind, doc.time, doc.position_x, doc.hold_time, doc.speed))
}

fn convert(doc: ChartDoc) -> Result<ChartData, String> {
    let mut lines = Vec::with_capacity(doc.judge_line_list.len());
    for (i, line) in doc.judge_line_list.iter().enumerate() {
        if line.bpm <= 0.0 {
            return Err(format!(
                "judge line {i} has non-positive bpm {}; beat conversion is undefined",
                line.bpm
            ));
        }
        lines.push(JudgeLine {
            bpm: line.bpm,
            move_events: line
                .judge_line_move_events
                .iter()
                .map(|e| convert_move_event(e, doc.format_version))
                .collect(),
            rotate_events: line.judge_line_rotate_events.iter().map(convert_line_event).collect(),
            disappear_events: line
                .judge_line_disappear_events
                .iter()
                .map(convert_line_event)
                .collect(),
            speed_events: line
                .speed_events
                .iter()
                .map(|e| SpeedEvent {
                    start_time: e.start_time,
                    end_time: e.end_time,
                    value: e.value,
                    floor_position: 0.0,
                })
                .collect(),
            notes_above: line.notes_above.iter().filter_map(convert_note).collect(),
            notes_below: line.notes_below.iter().filter_map(convert_note).collect(),
            notes: Vec::new(),
        });
    }
    Ok(ChartData {
        offset: doc.offset,
        lines,
        note_count: 0,
    })
}

/// Load and convert a chart document. The result still needs
/// [`crate::game::scheduler::build`] before playback.
pub fn load_chart(path: &Path) -> Result<ChartData, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read chart '{}': {}", path.display(), e))?;
    let doc: ChartDoc = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse chart '{}': {}", path.display(), e))?;
    info!(
        "chart '{}': format v{}, {} judge lines",
        path.display(),
        doc.format_version,
        doc.judge_line_list.len()
    );
    convert(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ChartData, String> {
        let doc: ChartDoc = serde_json::from_str(text).map_err(|e| e.to_string())?;
        convert(doc)
    }

    #[test]
    fn parses_a_minimal_v3_chart() {
        let chart = parse(
            r#"{
                "formatVersion": 3,
                "offset": -0.25,
                "judgeLineList": [{
                    "bpm": 174.0,
                    "judgeLineMoveEvents": [
                        {"startTime": 0, "endTime": 8, "start": 0.1, "end": 0.9, "start2": 0.5, "end2": 0.5}
                    ],
                    "speedEvents": [{"startTime": 0, "endTime": 32, "value": 1.5}],
                    "notesAbove": [{"type": 1, "time": 16, "positionX": -2.0, "holdTime": 0, "speed": 1.0}],
                    "notesBelow": [{"type": 3, "time": 16, "positionX": 0.0, "holdTime": 8}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(chart.offset, -0.25);
        assert_eq!(chart.lines.len(), 1);
        let line = &chart.lines[0];
        assert_eq!(line.bpm, 174.0);
        assert_eq!(line.move_events[0].start_y, 0.5);
        assert_eq!(line.notes_above[0].kind, NoteKind::Tap);
        assert_eq!(line.notes_below[0].kind, NoteKind::Hold);
        assert_eq!(line.notes_below[0].hold_time, 8.0);
    }

    #[test]
    fn v1_move_events_unpack_both_axes() {
        let chart = parse(
            r#"{
                "formatVersion": 1,
                "judgeLineList": [{
                    "bpm": 120.0,
                    "judgeLineMoveEvents": [
                        {"startTime": 0, "endTime": 4, "start": 440260.0, "end": 880520.0}
                    ]
                }]
            }"#,
        )
        .unwrap();
        let e = &chart.lines[0].move_events[0];
        assert!((e.start_x - 0.5).abs() < 1e-4, "start_x was {}", e.start_x);
        assert!((e.start_y - 0.5).abs() < 1e-4, "start_y was {}", e.start_y);
        assert!((e.end_x - 1.0).abs() < 1e-4);
        assert!((e.end_y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn missing_speed_defaults_to_one() {
        let chart = parse(
            r#"{
                "formatVersion": 3,
                "judgeLineList": [{
                    "bpm": 120.0,
                    "notesAbove": [{"type": 2, "time": 4, "positionX": 1.0, "holdTime": 0}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(chart.lines[0].notes_above[0].speed, 1.0);
    }

    #[test]
    fn non_positive_bpm_is_a_load_error() {
        let err = parse(
            r#"{"formatVersion": 3, "judgeLineList": [{"bpm": 0.0}]}"#,
        )
        .unwrap_err();
        assert!(err.contains("bpm"), "error should name the bad field: {err}");
    }

    #[test]
    fn unknown_note_type_is_skipped() {
        let chart = parse(
            r#"{
                "formatVersion": 3,
                "judgeLineList": [{
                    "bpm": 120.0,
                    "notesAbove": [
                        {"type": 9, "time": 4, "positionX": 0.0, "holdTime": 0},
                        {"type": 4, "time": 8, "positionX": 0.0, "holdTime": 0}
                    ]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(chart.lines[0].notes_above.len(), 1);
        assert_eq!(chart.lines[0].notes_above[0].kind, NoteKind::Flick);
    }

    #[test]
    fn missing_event_lists_become_empty() {
        let chart = parse(r#"{"judgeLineList": [{"bpm": 60.0}]}"#).unwrap();
        let line = &chart.lines[0];
        assert!(line.move_events.is_empty());
        assert!(line.rotate_events.is_empty());
        assert!(line.disappear_events.is_empty());
        assert!(line.speed_events.is_empty());
    }
}
