use crate::gfx::{Framebuffer, Texture};

/// `scale_y` passed negative means "same as scale_x".
pub const SCALE_Y_AS_X: f32 = -1.0;

/// Blit `tex` centered on `(dst_x, dst_y)`, scaled then rotated by
/// `angle_deg` (positive = counter-clockwise). Works backwards: walks the
/// destination bounding box and inverse-transforms each pixel center into
/// texel space, nearest-neighbor sampling when it lands inside the source.
/// `alpha` multiplies the sampled alpha before compositing.
pub fn draw_sprite(
    fb: &mut Framebuffer,
    tex: &Texture,
    dst_x: f32,
    dst_y: f32,
    scale_x: f32,
    scale_y: f32,
    angle_deg: f32,
    alpha: f32,
) {
    if alpha <= 0.0 || scale_x == 0.0 {
        return;
    }
    let scale_y = if scale_y < 0.0 { scale_x } else { scale_y };
    if scale_y == 0.0 {
        return;
    }

    let src_w = tex.width() as f32;
    let src_h = tex.height() as f32;
    let half_w = src_w * scale_x * 0.5;
    let half_h = src_h * scale_y * 0.5;

    let rad = angle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();

    // Screen space is y-down, so a visually counter-clockwise rotation of the
    // corner offsets is (x cos + y sin, -x sin + y cos).
    let corners = [
        (-half_w, -half_h),
        (half_w, -half_h),
        (half_w, half_h),
        (-half_w, half_h),
    ];
    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;
    for (cx, cy) in corners {
        let rx = cx.mul_add(cos, cy * sin) + dst_x;
        let ry = (-cx).mul_add(sin, cy * cos) + dst_y;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let x0 = (min_x.floor() as i32).max(0);
    let x1 = (max_x.ceil() as i32).min(fb.width() as i32 - 1);
    let y0 = (min_y.floor() as i32).max(0);
    let y1 = (max_y.ceil() as i32).min(fb.height() as i32 - 1);

    let inv_sx = 1.0 / scale_x;
    let inv_sy = 1.0 / scale_y;

    for py in y0..=y1 {
        let dy = py as f32 + 0.5 - dst_y;
        for px in x0..=x1 {
            let dx = px as f32 + 0.5 - dst_x;

            // Inverse rotation back into the unrotated, scaled rectangle.
            let u = dx.mul_add(cos, -(dy * sin));
            let v = dx.mul_add(sin, dy * cos);

            let src_x = u.mul_add(inv_sx, src_w * 0.5);
            let src_y = v.mul_add(inv_sy, src_h * 0.5);
            if src_x < 0.0 || src_x >= src_w || src_y < 0.0 || src_y >= src_h {
                continue;
            }

            let mut color = tex.get_color(src_x as i32, src_y as i32);
            color.w *= alpha;
            fb.set_color(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    /// Each texel uniquely encodes its own coordinates.
    fn gradient(n: usize) -> Texture {
        let texels: Vec<Vec4> = (0..n * n)
            .map(|i| {
                let (x, y) = (i % n, i / n);
                Vec4::new(x as f32 / n as f32, y as f32 / n as f32, 0.0, 1.0)
            })
            .collect();
        Texture::from_texels(n, n, texels)
    }

    #[test]
    fn identity_blit_reproduces_the_source() {
        let n = 8;
        let tex = gradient(n);
        let mut fb = Framebuffer::new(16, 16);
        fb.clear(Vec3::ZERO);
        // Top-left corner at (4, 4).
        let c = 4.0 + n as f32 * 0.5;
        draw_sprite(&mut fb, &tex, c, c, 1.0, SCALE_Y_AS_X, 0.0, 1.0);

        for y in 0..n {
            for x in 0..n {
                let want = tex.get_color(x as i32, y as i32).truncate();
                let got = fb.get_color(x as i32 + 4, y as i32 + 4);
                assert_eq!(got, want, "mismatch at texel ({x}, {y})");
            }
        }
        // One pixel outside the sprite stays untouched.
        assert_eq!(fb.get_color(3, 3), Vec3::ZERO);
        assert_eq!(fb.get_color(4 + n as i32, 4), Vec3::ZERO);
    }

    #[test]
    fn quarter_turn_moves_texels_counter_clockwise() {
        // 2x1 texture: left texel red, right texel green.
        let tex = Texture::from_texels(
            2,
            1,
            vec![
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                Vec4::new(0.0, 1.0, 0.0, 1.0),
            ],
        );
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Vec3::ZERO);
        draw_sprite(&mut fb, &tex, 4.0, 4.0, 1.0, SCALE_Y_AS_X, 90.0, 1.0);

        // CCW by 90 degrees: the texel that was to the right of center ends
        // up above it (screen y decreases upwards).
        assert_eq!(fb.get_color(3, 3), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(fb.get_color(3, 4), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn offscreen_destination_is_clipped_silently() {
        let tex = Texture::from_texels(4, 4, vec![Vec4::ONE; 16]);
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Vec3::ZERO);
        draw_sprite(&mut fb, &tex, -10.0, -10.0, 1.0, SCALE_Y_AS_X, 33.0, 1.0);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(fb.get_color(x, y), Vec3::ZERO);
            }
        }
    }

    #[test]
    fn alpha_multiplier_suppresses_the_blit_entirely_at_zero() {
        let tex = Texture::from_texels(2, 2, vec![Vec4::ONE; 4]);
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Vec3::ZERO);
        draw_sprite(&mut fb, &tex, 2.0, 2.0, 1.0, SCALE_Y_AS_X, 0.0, 0.0);
        assert_eq!(fb.get_color(2, 2), Vec3::ZERO);
    }

    #[test]
    fn uniform_scale_doubles_coverage() {
        let tex = Texture::from_texels(2, 2, vec![Vec4::ONE; 4]);
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Vec3::ZERO);
        draw_sprite(&mut fb, &tex, 4.0, 4.0, 2.0, SCALE_Y_AS_X, 0.0, 1.0);
        let lit: usize = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.get_color(x, y) == Vec3::ONE)
            .count();
        assert_eq!(lit, 16, "2x2 sprite at 2x scale should cover 16 pixels");
    }
}
