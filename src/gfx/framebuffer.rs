use glam::{Vec3, Vec4};

/// CPU color target. Stores linear RGB per pixel; alpha only exists on the
/// way in, during compositing.
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Vec3>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixels = vec![Vec3::ZERO; width * height];
        Self {
            width,
            height,
            pixels,
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

    pub fn clear(&mut self, color: Vec3) {
        for px in &mut self.pixels {
            *px = color;
        }
    }

    /// Composite one pixel. Fully opaque sources replace the destination,
    /// partially transparent sources blend, and alpha <= 0 never touches the
    /// destination at all. Out-of-bounds writes are clipped, not errors.
    #[inline(always)]
    pub fn set_color(&mut self, x: i32, y: i32, color: Vec4) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let index = x as usize + y as usize * self.width;
        let alpha = color.w;
        if alpha >= 1.0 {
            self.pixels[index] = color.truncate();
        } else if alpha > 0.0 {
            let dst = self.pixels[index];
            self.pixels[index] = color.truncate() * alpha + dst * (1.0 - alpha);
        }
    }

    #[inline(always)]
    pub fn get_color(&self, x: i32, y: i32) -> Vec3 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Vec3::ZERO;
        }
        self.pixels[x as usize + y as usize * self.width]
    }

    /// Inclusive corners, any orientation.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Vec4) {
        let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set_color(x, y, color);
            }
        }
    }

    /// Bresenham with a circular brush of diameter `w` pixels.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, w: f32, color: Vec4) {
        let mut x0 = x0;
        let mut y0 = y0;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let half_w = w * 0.5;
        let reach = half_w as i32;
        loop {
            for wx in -reach..=reach {
                for wy in -reach..=reach {
                    let dist = ((wx * wx + wy * wy) as f32).sqrt();
                    if dist <= half_w + 0.5 {
                        self.set_color(x0 + wx, y0 + wy, color);
                    }
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Vec3::ZERO; width * height];
    }

    /// Pack the color buffer into a `0xAARRGGBB` present buffer. The slice
    /// must hold exactly `width * height` pixels.
    pub fn pack_into(&self, out: &mut [u32]) {
        debug_assert_eq!(out.len(), self.pixels.len());
        for (dst, src) in out.iter_mut().zip(&self.pixels) {
            *dst = pack_rgb(*src);
        }
    }
}

#[inline(always)]
fn pack_rgb(c: Vec3) -> u32 {
    fn clamp01(x: f32) -> f32 {
        if x <= 0.0 {
            0.0
        } else if x >= 1.0 {
            1.0
        } else {
            x
        }
    }

    let r = clamp01(c.x).mul_add(255.0, 0.5) as u32;
    let g = clamp01(c.y).mul_add(255.0, 0.5) as u32;
    let b = clamp01(c.z).mul_add(255.0, 0.5) as u32;

    (0xFF << 24) | (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_write_replaces_destination() {
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Vec3::new(0.2, 0.2, 0.2));
        fb.set_color(1, 1, Vec4::new(0.9, 0.1, 0.3, 1.0));
        assert_eq!(fb.get_color(1, 1), Vec3::new(0.9, 0.1, 0.3));
    }

    #[test]
    fn transparent_write_is_a_no_op() {
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Vec3::new(0.2, 0.4, 0.6));
        fb.set_color(2, 2, Vec4::new(1.0, 1.0, 1.0, 0.0));
        fb.set_color(2, 2, Vec4::new(1.0, 1.0, 1.0, -0.5));
        assert_eq!(fb.get_color(2, 2), Vec3::new(0.2, 0.4, 0.6));
    }

    #[test]
    fn partial_alpha_blends_linearly() {
        let mut fb = Framebuffer::new(2, 2);
        fb.clear(Vec3::ZERO);
        fb.set_color(0, 0, Vec4::new(1.0, 1.0, 1.0, 0.5));
        let got = fb.get_color(0, 0);
        assert!(
            (got - Vec3::splat(0.5)).abs().max_element() < 1e-6,
            "expected 50% grey, got {got:?}"
        );
    }

    #[test]
    fn out_of_bounds_writes_are_clipped() {
        let mut fb = Framebuffer::new(2, 2);
        fb.set_color(-1, 0, Vec4::ONE);
        fb.set_color(0, -1, Vec4::ONE);
        fb.set_color(2, 0, Vec4::ONE);
        fb.set_color(0, 2, Vec4::ONE);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(fb.get_color(x, y), Vec3::ZERO);
            }
        }
    }

    #[test]
    fn fill_rect_accepts_swapped_corners() {
        let mut fb = Framebuffer::new(4, 4);
        fb.fill_rect(2, 2, 1, 1, Vec4::ONE);
        assert_eq!(fb.get_color(1, 1), Vec3::ONE);
        assert_eq!(fb.get_color(2, 2), Vec3::ONE);
        assert_eq!(fb.get_color(3, 3), Vec3::ZERO);
    }

    #[test]
    fn pack_rounds_to_nearest_byte() {
        let mut fb = Framebuffer::new(1, 1);
        fb.clear(Vec3::new(1.0, 0.5, 0.0));
        let mut out = [0u32; 1];
        fb.pack_into(&mut out);
        assert_eq!(out[0], 0xFF_FF_80_00);
    }
}
