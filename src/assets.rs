//! Resource pack loading and one-time atlas pre-processing: note skins and
//! their highlighted variants, the hold atlas split into head/body/tail, the
//! hit-effect sheet cut into frames, and the blurred background illustration.
//!
//! Every texture is optional. A missing or unreadable file logs a warning and
//! the draw site skips or substitutes, so a partial pack still plays.

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::game::chart::NoteKind;
use crate::gfx::Texture;

/// Per-pack layout metadata, read from `info.json` inside the pack. The
/// atlas pairs are pixel row counts cut off the top (tail) and bottom (head)
/// of the hold image; `hit_fx` is the sheet's column/row grid.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RespackInfo {
    hit_fx: (u32, u32),
    hold_atlas: (u32, u32),
    hold_atlas_mh: (u32, u32),
}

impl Default for RespackInfo {
    fn default() -> Self {
        Self {
            hit_fx: (5, 6),
            hold_atlas: (50, 50),
            hold_atlas_mh: (50, 110),
        }
    }
}

pub struct HoldParts {
    pub head: Texture,
    pub body: Texture,
    pub tail: Texture,
}

pub struct AssetManager {
    note: [Option<Texture>; 4],
    note_mh: [Option<Texture>; 4],
    hold: Option<HoldParts>,
    hold_mh: Option<HoldParts>,
    hit_fx: Vec<Texture>,
    background: Option<Texture>,
}

fn load_optional(dir: &Path, name: &str) -> Option<Texture> {
    let path = dir.join(name);
    match Texture::from_path(&path) {
        Ok(tex) => Some(tex),
        Err(e) => {
            warn!("missing resource '{}': {}", path.display(), e);
            None
        }
    }
}

fn load_info(dir: &Path) -> RespackInfo {
    let path = dir.join("info.json");
    match std::fs::read_to_string(&path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(info) => info,
            Err(e) => {
                warn!("bad respack info '{}': {}", path.display(), e);
                RespackInfo::default()
            }
        },
        Err(_) => RespackInfo::default(),
    }
}

/// Cut a hold atlas into parts. The tail occupies the top `tail_rows` of the
/// image and the head the bottom `head_rows`; whatever is left in between
/// tiles as the body.
fn split_hold_atlas(atlas: &Texture, tail_rows: u32, head_rows: u32) -> Option<HoldParts> {
    let h = atlas.height();
    let (tail_rows, head_rows) = (tail_rows as usize, head_rows as usize);
    if tail_rows + head_rows >= h {
        warn!("hold atlas of height {h} cannot fit tail {tail_rows} + head {head_rows}");
        return None;
    }
    Some(HoldParts {
        tail: atlas.clip_rows(0, tail_rows),
        body: atlas.clip_rows(tail_rows, h - head_rows),
        head: atlas.clip_rows(h - head_rows, h),
    })
}

fn cut_hit_fx(sheet: &Texture, cols: u32, rows: u32) -> Vec<Texture> {
    let (cols, rows) = (cols as usize, rows as usize);
    if cols == 0 || rows == 0 || sheet.width() < cols || sheet.height() < rows {
        warn!("hit effect sheet {}x{} cannot be cut {cols}x{rows}", sheet.width(), sheet.height());
        return Vec::new();
    }
    let fw = sheet.width() / cols;
    let fh = sheet.height() / rows;
    let mut frames = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            frames.push(sheet.clip_block(col * fw, row * fh, (col + 1) * fw, (row + 1) * fh));
        }
    }
    frames
}

impl AssetManager {
    /// Load the whole pack plus the chart illustration. `blur_radius` is
    /// applied to the illustration once, here, never per frame.
    pub fn load(assets_dir: &Path, illustration: &Path, blur_radius: u32) -> Self {
        let info = load_info(assets_dir);

        let note = [
            load_optional(assets_dir, "click.png"),
            load_optional(assets_dir, "drag.png"),
            load_optional(assets_dir, "hold.png"),
            load_optional(assets_dir, "flick.png"),
        ];
        let note_mh = [
            load_optional(assets_dir, "clickMH.png"),
            load_optional(assets_dir, "dragMH.png"),
            load_optional(assets_dir, "holdMH.png"),
            load_optional(assets_dir, "flickMH.png"),
        ];

        let hold = note[NoteKind::Hold.index()]
            .as_ref()
            .and_then(|atlas| split_hold_atlas(atlas, info.hold_atlas.0, info.hold_atlas.1));
        let hold_mh = note_mh[NoteKind::Hold.index()]
            .as_ref()
            .and_then(|atlas| split_hold_atlas(atlas, info.hold_atlas_mh.0, info.hold_atlas_mh.1));

        let hit_fx = match load_optional(assets_dir, "hitFx.png") {
            Some(sheet) => cut_hit_fx(&sheet, info.hit_fx.0, info.hit_fx.1),
            None => Vec::new(),
        };

        let background = match Texture::from_path(illustration) {
            Ok(img) => Some(img.blurred(blur_radius as i32)),
            Err(e) => {
                warn!("no illustration '{}': {}", illustration.display(), e);
                None
            }
        };

        info!(
            "assets loaded from '{}': {} hit effect frames, hold atlas {}",
            assets_dir.display(),
            hit_fx.len(),
            if hold.is_some() { "ok" } else { "missing" }
        );

        Self {
            note,
            note_mh,
            hold,
            hold_mh,
            hit_fx,
            background,
        }
    }

    /// Skin for a note head. Highlighted notes fall back to the normal skin
    /// when the pack has no MH variant.
    pub fn note_texture(&self, kind: NoteKind, morebets: bool) -> Option<&Texture> {
        let i = kind.index();
        if morebets {
            self.note_mh[i].as_ref().or(self.note[i].as_ref())
        } else {
            self.note[i].as_ref()
        }
    }

    pub fn hold_parts(&self, morebets: bool) -> Option<&HoldParts> {
        if morebets {
            self.hold_mh.as_ref().or(self.hold.as_ref())
        } else {
            self.hold.as_ref()
        }
    }

    /// Frame for a normalized effect progress in `[0, 1)`.
    pub fn hit_fx_frame(&self, progress: f32) -> Option<&Texture> {
        if self.hit_fx.is_empty() {
            return None;
        }
        let idx = ((progress * self.hit_fx.len() as f32) as usize).min(self.hit_fx.len() - 1);
        self.hit_fx.get(idx)
    }

    pub fn background(&self) -> Option<&Texture> {
        self.background.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn flat(width: usize, height: usize, color: Vec4) -> Texture {
        Texture::from_texels(width, height, vec![color; width * height])
    }

    #[test]
    fn hold_atlas_splits_into_tail_body_head() {
        let atlas = flat(10, 200, Vec4::ONE);
        let parts = split_hold_atlas(&atlas, 50, 30).unwrap();
        assert_eq!(parts.tail.height(), 50);
        assert_eq!(parts.body.height(), 120);
        assert_eq!(parts.head.height(), 30);
        assert_eq!(parts.body.width(), 10);
    }

    #[test]
    fn degenerate_hold_atlas_is_rejected() {
        let atlas = flat(10, 60, Vec4::ONE);
        assert!(split_hold_atlas(&atlas, 50, 50).is_none());
    }

    #[test]
    fn hit_fx_sheet_cuts_row_major() {
        let mut texels = Vec::new();
        // 2x2 grid of 2x2 frames, each frame a distinct red level.
        for y in 0..4 {
            for x in 0..4 {
                let frame = (y / 2) * 2 + (x / 2);
                texels.push(Vec4::new(frame as f32 * 0.25, 0.0, 0.0, 1.0));
            }
        }
        let frames = cut_hit_fx(&Texture::from_texels(4, 4, texels), 2, 2);
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.width(), 2);
            let expected = i as f32 * 0.25;
            assert!((frame.get_color(0, 0).x - expected).abs() < 1e-6, "frame {i}");
        }
    }

    #[test]
    fn frame_selection_covers_the_progress_range() {
        let sheet = flat(4, 4, Vec4::ONE);
        let frames = cut_hit_fx(&sheet, 2, 2);
        let mgr = AssetManager {
            note: [None, None, None, None],
            note_mh: [None, None, None, None],
            hold: None,
            hold_mh: None,
            hit_fx: frames,
            background: None,
        };
        assert!(mgr.hit_fx_frame(0.0).is_some());
        assert!(mgr.hit_fx_frame(0.999).is_some());
        assert!(mgr.hit_fx_frame(1.0).is_some(), "clamped to the last frame");
    }
}
