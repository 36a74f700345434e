pub mod chart;
pub mod gameplay;
pub mod parsing;
pub mod scheduler;
pub mod timeline;

// Playfield geometry of the reference resource pack, as fractions of the
// window. Chart time values are in 1/32-beat ticks, so one tick lasts
// `BEAT_UNIT / bpm` seconds.
pub const BEAT_UNIT: f32 = 60.0 / 32.0;
pub const LANE_UNIT: f32 = 0.05625;
pub const SCROLL_UNIT: f32 = 0.6;
pub const NOTE_SIZE: f32 = 0.1134375;
pub const LINE_LENGTH: f32 = 5.76;
pub const LINE_THICKNESS: f32 = 0.0075;

pub const LINE_COLOR: [f32; 3] = [
    0xFF as f32 / 255.0,
    0xEC as f32 / 255.0,
    0x9F as f32 / 255.0,
];
pub const LINE_ALPHA: f32 = 0xE1 as f32 / 255.0;
