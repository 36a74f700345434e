//! Playback session: input handling, per-frame update, and rendering of
//! lines, notes, hold bodies, and hit effects into the framebuffer.

use glam::{Vec2, Vec4};
use log::info;
use winit::keyboard::KeyCode;

use crate::assets::AssetManager;
use crate::config::Config;
use crate::core::clock::PlaybackClock;
use crate::core::input::InputState;
use crate::game::chart::{ChartData, NoteKind};
use crate::game::scheduler::{self, NotePlacement, NoteScheduler, TriggerState};
use crate::game::timeline::{self, LinePose};
use crate::game::{LANE_UNIT, LINE_ALPHA, LINE_COLOR, LINE_LENGTH, LINE_THICKNESS, NOTE_SIZE};
use crate::gfx::sprite::{self, SCALE_Y_AS_X};
use crate::gfx::{Framebuffer, Texture};

const ZOOM_STEP: f32 = 1.1;
const ZOOM_MIN: f32 = 0.2;
const ZOOM_MAX: f32 = 5.0;

/// Particle size and travel distances are authored against a 1080 px tall
/// screen and rescaled from there.
const REFERENCE_HEIGHT: f32 = 1080.0;
const PARTICLE_SIZE: f32 = 33.0 * 0.75;

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// Pan offset in screen pixels.
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

pub struct State {
    pub chart: ChartData,
    pub scheduler: NoteScheduler,
    pub clock: PlaybackClock,
    pub camera: Camera,
    pub show_overlay: bool,
    pub selected_line: usize,
    pub scroll_scale: f32,
    pub effect_duration: f32,
    /// Mouse position and camera offset captured when a drag began.
    drag_anchor: Option<(Vec2, Vec2)>,
    /// Line and particle tint, baked into a 1x1 texture once.
    flat_tex: Texture,
    /// Placement scratch buffer, reused across frames.
    placements: Vec<NotePlacement>,
}

pub fn init(mut chart: ChartData, config: &Config) -> State {
    info!(
        "starting playback session: {} judge lines, offset {:.3}s",
        chart.lines.len(),
        chart.offset
    );
    let scheduler = scheduler::build(&mut chart, config.hold_tick_factor);
    State {
        chart,
        scheduler,
        clock: PlaybackClock::new(),
        camera: Camera::default(),
        show_overlay: config.show_overlay,
        selected_line: 0,
        scroll_scale: config.scroll_scale,
        effect_duration: config.effect_duration,
        drag_anchor: None,
        flat_tex: Texture::solid(Vec4::new(LINE_COLOR[0], LINE_COLOR[1], LINE_COLOR[2], 1.0)),
        placements: Vec::new(),
    }
}

pub fn handle_input(state: &mut State, input: &InputState) {
    if input.was_pressed(KeyCode::Space) {
        state.clock.toggle_pause();
    }
    if input.was_pressed(KeyCode::F3) {
        state.show_overlay = !state.show_overlay;
    }
    if input.was_pressed(KeyCode::ArrowUp) && state.selected_line > 0 {
        state.selected_line -= 1;
    }
    if input.was_pressed(KeyCode::ArrowDown)
        && state.selected_line + 1 < state.chart.lines.len()
    {
        state.selected_line += 1;
    }

    if input.wheel != 0.0 {
        let zoom = state.camera.zoom * ZOOM_STEP.powf(input.wheel);
        state.camera.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    let mouse = Vec2::new(input.mouse_x, input.mouse_y);
    if input.left_down {
        match state.drag_anchor {
            Some((origin, cam)) => {
                state.camera.x = cam.x + (mouse.x - origin.x);
                state.camera.y = cam.y + (mouse.y - origin.y);
            }
            None => {
                state.drag_anchor = Some((mouse, Vec2::new(state.camera.x, state.camera.y)));
            }
        }
    } else {
        state.drag_anchor = None;
    }
}

pub fn update(state: &mut State) {
    state.clock.tick();
    let t = playback_second(state);
    state.scheduler.advance(t, state.effect_duration);
}

/// Chart-relative playback second; the document offset shifts every event.
#[inline(always)]
fn playback_second(state: &State) -> f32 {
    state.clock.seconds() + state.chart.offset
}

/// Map a normalized chart position (x right, y up) to screen pixels through
/// the camera. Zoom pivots on the screen center.
#[inline(always)]
fn to_screen(cam: &Camera, w: f32, h: f32, x: f32, y: f32) -> Vec2 {
    let sx = x * w;
    let sy = (1.0 - y) * h;
    Vec2::new(
        (sx - w * 0.5) * cam.zoom + w * 0.5 + cam.x,
        (sy - h * 0.5) * cam.zoom + h * 0.5 + cam.y,
    )
}

/// Screen-space direction along a line (rotation is counter-clockwise in
/// chart space, which is y-up).
#[inline(always)]
fn line_axes(rotate_deg: f32) -> (Vec2, Vec2) {
    let rad = rotate_deg.to_radians();
    let dir = Vec2::new(rad.cos(), -rad.sin());
    // 90 degrees counter-clockwise from dir, the "above" side on screen.
    let normal = Vec2::new(-rad.sin(), -rad.cos());
    (dir, normal)
}

fn draw_background(fb: &mut Framebuffer, assets: &AssetManager) {
    fb.clear(glam::Vec3::ZERO);
    if let Some(bg) = assets.background() {
        let (w, h) = (fb.width() as f32, fb.height() as f32);
        sprite::draw_sprite(
            fb,
            bg,
            w * 0.5,
            h * 0.5,
            w / bg.width() as f32,
            h / bg.height() as f32,
            0.0,
            1.0,
        );
    }
}

fn draw_lines(state: &State, fb: &mut Framebuffer, t: f32, poses: &mut Vec<LinePose>) {
    let (w, h) = (fb.width() as f32, fb.height() as f32);
    poses.clear();
    for line in &state.chart.lines {
        let pose = timeline::pose_at(line, t);
        poses.push(pose);
        if pose.alpha <= 0.0 {
            continue;
        }
        let anchor = to_screen(&state.camera, w, h, pose.x, pose.y);
        sprite::draw_sprite(
            fb,
            &state.flat_tex,
            anchor.x,
            anchor.y,
            LINE_LENGTH * h * state.camera.zoom,
            LINE_THICKNESS * h * state.camera.zoom,
            pose.rotate,
            pose.alpha * LINE_ALPHA,
        );
    }
}

/// Pixel-per-texel scale that renders a note head `NOTE_SIZE * w` wide. The
/// normal skin defines the scale so the wider highlighted variant actually
/// draws wider.
fn head_scale(assets: &AssetManager, kind: NoteKind, w: f32, zoom: f32) -> Option<f32> {
    let base = assets.note_texture(kind, false)?;
    Some(NOTE_SIZE * w * zoom / base.width() as f32)
}

fn draw_notes(state: &State, fb: &mut Framebuffer, assets: &AssetManager, poses: &[LinePose]) {
    let (w, h) = (fb.width() as f32, fb.height() as f32);
    for p in &state.placements {
        let line = &state.chart.lines[p.line];
        let note = &line.notes[p.note];
        let pose = &poses[p.line];
        let anchor = to_screen(&state.camera, w, h, pose.x, pose.y);
        let (dir, normal) = line_axes(pose.rotate);

        let side = if note.above { 1.0 } else { -1.0 };
        let lane = anchor + dir * (note.position_x * LANE_UNIT * w * state.camera.zoom);
        let head_pos = lane + normal * (p.distance * side);
        let angle = if note.above {
            pose.rotate
        } else {
            pose.rotate + 180.0
        };

        let Some(scale) = head_scale(assets, note.kind, w, state.camera.zoom) else {
            continue;
        };

        if note.kind == NoteKind::Hold {
            let Some(parts) = assets.hold_parts(note.morebets) else {
                continue;
            };
            let body_len = p.hold_body;
            if body_len > 0.0 {
                let center = lane + normal * (side * (p.distance + body_len * 0.5));
                sprite::draw_sprite(
                    fb,
                    &parts.body,
                    center.x,
                    center.y,
                    scale,
                    body_len / parts.body.height() as f32,
                    angle,
                    1.0,
                );
                let tail_off = p.distance + body_len + parts.tail.height() as f32 * scale * 0.5;
                let tail_center = lane + normal * (side * tail_off);
                sprite::draw_sprite(
                    fb,
                    &parts.tail,
                    tail_center.x,
                    tail_center.y,
                    scale,
                    SCALE_Y_AS_X,
                    angle,
                    1.0,
                );
            }
            sprite::draw_sprite(
                fb,
                &parts.head,
                head_pos.x,
                head_pos.y,
                scale,
                SCALE_Y_AS_X,
                angle,
                1.0,
            );
        } else if let Some(tex) = assets.note_texture(note.kind, note.morebets) {
            sprite::draw_sprite(fb, tex, head_pos.x, head_pos.y, scale, SCALE_Y_AS_X, angle, 1.0);
        }
    }
}

/// Ease for particle travel, fast out then settling.
#[inline(always)]
fn particle_ease(p: f32) -> f32 {
    9.0 * p / (8.0 * p + 1.0)
}

fn draw_effects(state: &State, fb: &mut Framebuffer, assets: &AssetManager, t: f32) {
    let (w, h) = (fb.width() as f32, fb.height() as f32);
    let px_scale = h / REFERENCE_HEIGHT * state.camera.zoom;

    for eff in state.scheduler.active_effects() {
        if eff.state != TriggerState::Triggered {
            continue;
        }
        let progress = ((t - eff.time) / state.effect_duration).clamp(0.0, 1.0);
        // The effect stays where the note was consumed.
        let pose = timeline::pose_at(&state.chart.lines[eff.line], eff.time);
        let anchor = to_screen(&state.camera, w, h, pose.x, pose.y);
        let (dir, _) = line_axes(pose.rotate);
        let center = anchor + dir * (eff.position_x * LANE_UNIT * w * state.camera.zoom);
        let alpha = 1.0 - progress;

        if let Some(frame) = assets.hit_fx_frame(progress) {
            let scale = NOTE_SIZE * 1.375 * w * state.camera.zoom / frame.width() as f32;
            sprite::draw_sprite(fb, frame, center.x, center.y, scale, SCALE_Y_AS_X, 0.0, alpha);
        }

        let reach = particle_ease(progress);
        for particle in &eff.particles {
            let rad = particle.angle.to_radians();
            let offset = Vec2::new(rad.cos(), -rad.sin()) * (particle.radius * reach * px_scale);
            let pos = center + offset;
            sprite::draw_sprite(
                fb,
                &state.flat_tex,
                pos.x,
                pos.y,
                PARTICLE_SIZE * px_scale,
                SCALE_Y_AS_X,
                particle.angle,
                alpha,
            );
        }
    }
}

fn draw_overlay(state: &State, fb: &mut Framebuffer, poses: &[LinePose]) {
    let (w, h) = (fb.width() as f32, fb.height() as f32);
    for (i, pose) in poses.iter().enumerate() {
        let anchor = to_screen(&state.camera, w, h, pose.x, pose.y);
        let selected = i == state.selected_line;
        let color = if selected {
            Vec4::new(1.0, 0.2, 0.2, 1.0)
        } else {
            Vec4::new(0.2, 1.0, 0.2, 0.8)
        };
        let r = if selected { 12 } else { 6 };
        let (x, y) = (anchor.x as i32, anchor.y as i32);
        fb.draw_line(x - r, y, x + r, y, 1.0, color);
        fb.draw_line(x, y - r, x, y + r, 1.0, color);
        if selected {
            // Extend the selected line's axis so its rotation reads clearly.
            let (dir, _) = line_axes(pose.rotate);
            let a = anchor - dir * 200.0;
            let b = anchor + dir * 200.0;
            fb.draw_line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, 1.0, color);
        }
    }
}

pub fn render(state: &mut State, fb: &mut Framebuffer, assets: &AssetManager) {
    let t = playback_second(state);
    let h = fb.height() as f32 * state.camera.zoom;

    state.placements.clear();
    scheduler::placements(&state.chart, t, h, state.scroll_scale, &mut state.placements);

    draw_background(fb, assets);
    let mut poses = Vec::with_capacity(state.chart.lines.len());
    draw_lines(state, fb, t, &mut poses);
    draw_notes(state, fb, assets, &poses);
    draw_effects(state, fb, assets, t);
    if state.show_overlay {
        draw_overlay(state, fb, &poses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::{JudgeLine, Note};

    fn test_config() -> Config {
        Config::default()
    }

    fn minimal_chart() -> ChartData {
        ChartData {
            offset: 0.0,
            lines: vec![
                JudgeLine {
                    bpm: 120.0,
                    notes_above: vec![Note::new(NoteKind::Tap, 32.0, 0.0, 0.0, 1.0)],
                    ..JudgeLine::default()
                },
                JudgeLine {
                    bpm: 120.0,
                    ..JudgeLine::default()
                },
            ],
            note_count: 0,
        }
    }

    #[test]
    fn init_finalizes_the_chart() {
        let state = init(minimal_chart(), &test_config());
        assert_eq!(state.chart.note_count, 1);
        assert!(state.clock.is_paused(), "session starts paused");
        assert_eq!(state.scheduler.combo(), 0);
    }

    #[test]
    fn line_selection_is_clamped_to_the_chart() {
        let mut state = init(minimal_chart(), &test_config());
        let mut input = crate::core::input::init_state();

        input.apply_key(KeyCode::ArrowUp, true);
        handle_input(&mut state, &input);
        assert_eq!(state.selected_line, 0, "up at the first line stays put");

        input.begin_frame();
        input.apply_key(KeyCode::ArrowUp, false);
        for _ in 0..5 {
            input.apply_key(KeyCode::ArrowDown, true);
            handle_input(&mut state, &input);
            input.begin_frame();
            input.apply_key(KeyCode::ArrowDown, false);
        }
        assert_eq!(state.selected_line, state.chart.lines.len() - 1);
    }

    #[test]
    fn space_toggles_pause_on_the_press_edge_only() {
        let mut state = init(minimal_chart(), &test_config());
        let mut input = crate::core::input::init_state();

        input.apply_key(KeyCode::Space, true);
        handle_input(&mut state, &input);
        assert!(!state.clock.is_paused());

        input.begin_frame();
        handle_input(&mut state, &input);
        assert!(!state.clock.is_paused(), "held key must not toggle again");
    }

    #[test]
    fn to_screen_flips_y_and_applies_pan() {
        let cam = Camera {
            x: 10.0,
            y: 0.0,
            zoom: 1.0,
        };
        let p = to_screen(&cam, 1280.0, 720.0, 0.5, 1.0);
        assert_eq!(p.x, 650.0);
        assert_eq!(p.y, 0.0, "chart y=1 is the top of the screen");
    }

    #[test]
    fn to_screen_zoom_pivots_on_the_center() {
        let cam = Camera {
            x: 0.0,
            y: 0.0,
            zoom: 2.0,
        };
        let center = to_screen(&cam, 1280.0, 720.0, 0.5, 0.5);
        assert_eq!(center, Vec2::new(640.0, 360.0));
        let corner = to_screen(&cam, 1280.0, 720.0, 0.0, 1.0);
        assert_eq!(corner, Vec2::new(-640.0, -360.0));
    }

    #[test]
    fn line_axes_match_screen_orientation() {
        let (dir, normal) = line_axes(0.0);
        assert!((dir - Vec2::new(1.0, 0.0)).length() < 1e-6);
        assert!((normal - Vec2::new(0.0, -1.0)).length() < 1e-6, "above is up on screen");

        let (dir, _) = line_axes(90.0);
        assert!((dir - Vec2::new(0.0, -1.0)).length() < 1e-6, "rotation is counter-clockwise");
    }

    #[test]
    fn particle_ease_spans_zero_to_one() {
        assert_eq!(particle_ease(0.0), 0.0);
        assert!((particle_ease(1.0) - 1.0).abs() < 1e-6);
        assert!(particle_ease(0.2) > 0.2, "front-loaded travel");
    }
}
