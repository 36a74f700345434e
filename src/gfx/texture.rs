use glam::Vec4;
use log::warn;
use std::error::Error;
use std::path::Path;

/// Immutable RGBA texture, texels in [0, 1]. Derived-image operations
/// (clipping, tinting, blurring) build new textures at load time; nothing
/// here runs per frame except `get_color`.
#[derive(Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<Vec4>,
}

impl Texture {
    pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let image = image::open(path)?.to_rgba8();
        let width = image.width() as usize;
        let height = image.height() as usize;
        let texels = image
            .pixels()
            .map(|p| {
                Vec4::new(
                    f32::from(p.0[0]) / 255.0,
                    f32::from(p.0[1]) / 255.0,
                    f32::from(p.0[2]) / 255.0,
                    f32::from(p.0[3]) / 255.0,
                )
            })
            .collect();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// 1x1 flat-color texture.
    pub fn solid(color: Vec4) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// Build a texture from raw texels in row-major order.
    pub fn from_texels(width: usize, height: usize, texels: Vec<Vec4>) -> Self {
        debug_assert_eq!(texels.len(), width * height);
        Self {
            width,
            height,
            texels,
        }
    }

    #[inline(always)]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Out-of-bounds reads yield transparent black; the rasterizer relies on
    /// this never panicking.
    #[inline(always)]
    pub fn get_color(&self, x: i32, y: i32) -> Vec4 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Vec4::ZERO;
        }
        self.texels[x as usize + y as usize * self.width]
    }

    /// Horizontal band `[y0, y1)`, full width. Degenerate ranges collapse to
    /// a 1x1 transparent texture rather than erroring.
    pub fn clip_rows(&self, y0: usize, y1: usize) -> Self {
        if y1 <= y0 || y1 > self.height {
            warn!(
                "clip_rows [{y0}, {y1}) out of range for {}x{} texture",
                self.width, self.height
            );
            return Self::solid(Vec4::ZERO);
        }
        let texels = self.texels[y0 * self.width..y1 * self.width].to_vec();
        Self {
            width: self.width,
            height: y1 - y0,
            texels,
        }
    }

    /// Rectangular region `[x0, x1) x [y0, y1)`.
    pub fn clip_block(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        if x1 <= x0 || y1 <= y0 || x1 > self.width || y1 > self.height {
            warn!(
                "clip_block [{x0},{y0})..[{x1},{y1}) out of range for {}x{} texture",
                self.width, self.height
            );
            return Self::solid(Vec4::ZERO);
        }
        let width = x1 - x0;
        let height = y1 - y0;
        let mut texels = Vec::with_capacity(width * height);
        for y in y0..y1 {
            let row = y * self.width;
            texels.extend_from_slice(&self.texels[row + x0..row + x1]);
        }
        Self {
            width,
            height,
            texels,
        }
    }

    /// Component-wise multiply by a flat color (used for line recoloring).
    pub fn tinted(&self, color: Vec4) -> Self {
        let texels = self.texels.iter().map(|t| *t * color).collect();
        Self {
            width: self.width,
            height: self.height,
            texels,
        }
    }

    /// Separable gaussian blur. `radius <= 0` returns an unblurred copy.
    pub fn blurred(&self, radius: i32) -> Self {
        if radius <= 0 || self.width == 0 || self.height == 0 {
            return self.clone();
        }

        let mut weights = vec![0.0f32; (radius * 2 + 1) as usize];
        let sigma = radius as f32 / 2.0;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut sum = 0.0;
        for i in -radius..=radius {
            let w = (-((i * i) as f32) / two_sigma_sq).exp();
            weights[(i + radius) as usize] = w;
            sum += w;
        }
        for w in &mut weights {
            *w /= sum;
        }

        let w = self.width as i32;
        let h = self.height as i32;

        // Horizontal pass into a scratch buffer, then vertical.
        let mut temp = vec![Vec4::ZERO; self.texels.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = Vec4::ZERO;
                for i in -radius..=radius {
                    let nx = x + i;
                    if nx >= 0 && nx < w {
                        acc += self.texels[(nx + y * w) as usize] * weights[(i + radius) as usize];
                    }
                }
                temp[(x + y * w) as usize] = acc;
            }
        }

        let mut texels = vec![Vec4::ZERO; self.texels.len()];
        for x in 0..w {
            for y in 0..h {
                let mut acc = Vec4::ZERO;
                for j in -radius..=radius {
                    let ny = y + j;
                    if ny >= 0 && ny < h {
                        acc += temp[(x + ny * w) as usize] * weights[(j + radius) as usize];
                    }
                }
                texels[(x + y * w) as usize] = acc;
            }
        }

        Self {
            width: self.width,
            height: self.height,
            texels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(n: usize) -> Texture {
        let texels = (0..n * n)
            .map(|i| {
                let (x, y) = (i % n, i / n);
                if (x + y) % 2 == 0 {
                    Vec4::ONE
                } else {
                    Vec4::new(0.0, 0.0, 0.0, 1.0)
                }
            })
            .collect();
        Texture::from_texels(n, n, texels)
    }

    #[test]
    fn clip_block_copies_the_requested_region() {
        let tex = checkerboard(4);
        let clip = tex.clip_block(1, 1, 3, 3);
        assert_eq!(clip.width(), 2);
        assert_eq!(clip.height(), 2);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(clip.get_color(x, y), tex.get_color(x + 1, y + 1));
            }
        }
    }

    #[test]
    fn invalid_clip_collapses_to_transparent() {
        let tex = checkerboard(4);
        let clip = tex.clip_rows(3, 2);
        assert_eq!(clip.width(), 1);
        assert_eq!(clip.height(), 1);
        assert_eq!(clip.get_color(0, 0), Vec4::ZERO);
    }

    #[test]
    fn tint_multiplies_componentwise() {
        let tex = Texture::solid(Vec4::new(1.0, 0.5, 1.0, 1.0));
        let tinted = tex.tinted(Vec4::new(0.5, 0.5, 1.0, 0.8));
        assert_eq!(tinted.get_color(0, 0), Vec4::new(0.5, 0.25, 1.0, 0.8));
    }

    #[test]
    fn out_of_bounds_read_is_transparent() {
        let tex = checkerboard(2);
        assert_eq!(tex.get_color(-1, 0), Vec4::ZERO);
        assert_eq!(tex.get_color(0, 5), Vec4::ZERO);
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let tex = Texture::from_texels(8, 8, vec![Vec4::splat(0.5); 64]);
        let blurred = tex.blurred(2);
        // Interior pixels see the full kernel, so a flat image stays flat.
        let got = blurred.get_color(4, 4);
        assert!(
            (got - Vec4::splat(0.5)).abs().max_element() < 1e-4,
            "flat region changed under blur: {got:?}"
        );
    }
}
