// src/imageops.rs
//
// Pixel-level primitives over raw 8-bit RGB frames: color-space
// conversions, blur/gradient filters, binary masks and connected
// components. Everything operates on plain byte buffers so the
// detection code stays free of heavyweight image dependencies.

use crate::types::Frame;

/// Single-channel 8-bit image.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl GrayFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }
}

/// Convert an RGB frame to grayscale with BT.601 luma weights.
pub fn rgb_to_gray(frame: &Frame) -> GrayFrame {
    let mut gray = GrayFrame::new(frame.width, frame.height);
    for (i, chunk) in frame.data.chunks_exact(3).enumerate() {
        let luma = 0.299 * chunk[0] as f32 + 0.587 * chunk[1] as f32 + 0.114 * chunk[2] as f32;
        gray.data[i] = luma.round().min(255.0) as u8;
    }
    gray
}

/// Separable Gaussian blur with an odd square kernel and replicated borders.
pub fn gaussian_blur(src: &GrayFrame, ksize: usize, sigma: f32) -> GrayFrame {
    debug_assert!(ksize % 2 == 1);
    let half = (ksize / 2) as isize;

    // 1D kernel
    let mut kernel = Vec::with_capacity(ksize);
    let mut sum = 0.0f32;
    for i in 0..ksize {
        let d = i as f32 - half as f32;
        let w = (-d * d / (2.0 * sigma * sigma)).exp();
        kernel.push(w);
        sum += w;
    }
    for w in &mut kernel {
        *w /= sum;
    }

    let (w, h) = (src.width, src.height);
    let clamp_x = |x: isize| x.clamp(0, w as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, h as isize - 1) as usize;

    // Horizontal pass
    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &kw) in kernel.iter().enumerate() {
                let sx = clamp_x(x as isize + i as isize - half);
                acc += kw * src.get(sx, y) as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    // Vertical pass
    let mut dst = GrayFrame::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &kw) in kernel.iter().enumerate() {
                let sy = clamp_y(y as isize + i as isize - half);
                acc += kw * tmp[sy * w + x];
            }
            dst.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    dst
}

/// Sobel gradient planes (3x3 kernels). Border pixels are left at zero.
#[derive(Debug)]
pub struct Gradients {
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Gradients {
    #[inline]
    pub fn magnitude(&self, x: usize, y: usize) -> f32 {
        let idx = y * self.width + x;
        (self.gx[idx] * self.gx[idx] + self.gy[idx] * self.gy[idx]).sqrt()
    }
}

pub fn sobel(src: &GrayFrame) -> Gradients {
    let (w, h) = (src.width, src.height);
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let p = |dx: isize, dy: isize| {
                src.get((x as isize + dx) as usize, (y as isize + dy) as usize) as f32
            };
            gx[y * w + x] = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1))
                - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            gy[y * w + x] = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1))
                - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
        }
    }

    Gradients {
        gx,
        gy,
        width: w,
        height: h,
    }
}

/// Grayscale 5x5 max filter (dilation), used for the local-maxima ball mask.
pub fn max_filter_5x5(src: &GrayFrame) -> GrayFrame {
    let (w, h) = (src.width, src.height);
    let mut dst = GrayFrame::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(2);
        let y1 = (y + 2).min(h - 1);
        for x in 0..w {
            let x0 = x.saturating_sub(2);
            let x1 = (x + 2).min(w - 1);
            let mut m = 0u8;
            for sy in y0..=y1 {
                for sx in x0..=x1 {
                    m = m.max(src.get(sx, sy));
                }
            }
            dst.set(x, y, m);
        }
    }
    dst
}

/// Convert RGB to HSV. Returns (H: 0-360, S: 0-100, V: 0-255).
#[inline]
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let r_n = r / 255.0;
    let g_n = g / 255.0;
    let b_n = b / 255.0;

    let max = r_n.max(g_n).max(b_n);
    let min = r_n.min(g_n).min(b_n);
    let delta = max - min;

    let h = if delta < 1e-6 {
        0.0
    } else if (max - r_n).abs() < 1e-6 {
        60.0 * (((g_n - b_n) / delta) % 6.0)
    } else if (max - g_n).abs() < 1e-6 {
        60.0 * (((b_n - r_n) / delta) + 2.0)
    } else {
        60.0 * (((r_n - g_n) / delta) + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let s = if max < 1e-6 {
        0.0
    } else {
        (delta / max) * 100.0
    };

    let v = max * 255.0;

    (h, s, v)
}

/// CIELAB b* channel of an sRGB pixel in the 8-bit encoding (b* + 128).
/// Values above 128 shift toward yellow, below toward blue.
pub fn rgb_to_lab_b(r: u8, g: u8, b: u8) -> u8 {
    #[inline]
    fn srgb_to_linear(c: u8) -> f32 {
        let c = c as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    #[inline]
    fn lab_f(t: f32) -> f32 {
        if t > 0.008856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    }

    let rl = srgb_to_linear(r);
    let gl = srgb_to_linear(g);
    let bl = srgb_to_linear(b);

    // D65 white point; only Y and Z are needed for b*
    let y = 0.212671 * rl + 0.715160 * gl + 0.072169 * bl;
    let z = 0.019334 * rl + 0.119193 * gl + 0.950227 * bl;

    let b_star = 200.0 * (lab_f(y) - lab_f(z / 1.088754));
    (b_star + 128.0).round().clamp(0.0, 255.0) as u8
}

/// Binary mask: 0 or 255 per pixel.
#[derive(Debug, Clone)]
pub struct Mask {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.width + x] = if on { 255 } else { 0 };
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Binary erosion with a k x k square kernel. Out-of-bounds counts as off.
pub fn erode(mask: &Mask, k: usize) -> Mask {
    morph(mask, k, false)
}

/// Binary dilation with a k x k square kernel.
pub fn dilate(mask: &Mask, k: usize) -> Mask {
    morph(mask, k, true)
}

fn morph(mask: &Mask, k: usize, dilating: bool) -> Mask {
    let (w, h) = (mask.width, mask.height);
    let anchor = (k / 2) as isize;
    let mut dst = Mask::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut hit = !dilating;
            'scan: for dy in 0..k as isize {
                for dx in 0..k as isize {
                    let sx = x as isize + dx - anchor;
                    let sy = y as isize + dy - anchor;
                    let on = sx >= 0
                        && sy >= 0
                        && (sx as usize) < w
                        && (sy as usize) < h
                        && mask.get(sx as usize, sy as usize);
                    if dilating && on {
                        hit = true;
                        break 'scan;
                    }
                    if !dilating && !on {
                        hit = false;
                        break 'scan;
                    }
                }
            }
            dst.set(x, y, hit);
        }
    }
    dst
}

/// Morphological opening (erode then dilate): removes speckle noise.
pub fn open(mask: &Mask, k: usize) -> Mask {
    dilate(&erode(mask, k), k)
}

/// Morphological closing (dilate then erode): fills small holes.
pub fn close(mask: &Mask, k: usize) -> Mask {
    erode(&dilate(mask, k), k)
}

/// A connected component of a binary mask with the contour statistics
/// the ball detector ranks on.
#[derive(Debug, Clone, Copy)]
pub struct Blob {
    /// Pixel count (the zeroth image moment)
    pub area: f64,
    /// Count of component pixels with an off 4-neighbor (contour length)
    pub perimeter: f64,
    /// Moment centroid, truncated to integer pixel coordinates
    pub centroid: (i32, i32),
}

/// Extract 8-connected components with area, perimeter and moment centroid.
pub fn connected_components(mask: &Mask) -> Vec<Blob> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut blobs = Vec::new();
    let mut stack = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            let start = sy * w + sx;
            if visited[start] || !mask.get(sx, sy) {
                continue;
            }

            let mut count = 0u64;
            let mut boundary = 0u64;
            let mut sum_x = 0u64;
            let mut sum_y = 0u64;

            visited[start] = true;
            stack.push((sx, sy));

            while let Some((x, y)) = stack.pop() {
                count += 1;
                sum_x += x as u64;
                sum_y += y as u64;

                let mut on_boundary = false;
                for (dx, dy) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                        on_boundary = true;
                    } else if !mask.get(nx as usize, ny as usize) {
                        on_boundary = true;
                    }
                }
                if on_boundary {
                    boundary += 1;
                }

                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as isize + dx;
                        let ny = y as isize + dy;
                        if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                            continue;
                        }
                        let idx = ny as usize * w + nx as usize;
                        if !visited[idx] && mask.get(nx as usize, ny as usize) {
                            visited[idx] = true;
                            stack.push((nx as usize, ny as usize));
                        }
                    }
                }
            }

            blobs.push(Blob {
                area: count as f64,
                perimeter: boundary as f64,
                centroid: ((sum_x / count) as i32, (sum_y / count) as i32),
            });
        }
    }

    blobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: usize, h: usize, rgb: (u8, u8, u8)) -> Frame {
        let mut data = Vec::with_capacity(w * h * 3);
        for _ in 0..w * h {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Frame::new(data, w, h, 0.0)
    }

    #[test]
    fn test_gray_conversion_weights() {
        let frame = solid_frame(4, 4, (255, 0, 0));
        let gray = rgb_to_gray(&frame);
        assert_eq!(gray.get(0, 0), 76); // 0.299 * 255
    }

    #[test]
    fn test_hsv_white_and_green() {
        let (_, s, v) = rgb_to_hsv(230.0, 230.0, 230.0);
        assert!(s < 1.0);
        assert!((v - 230.0).abs() < 1.0);

        let (h, s, _) = rgb_to_hsv(20.0, 200.0, 40.0);
        assert!(h > 70.0 && h < 170.0, "green hue was {h}");
        assert!(s > 50.0);
    }

    #[test]
    fn test_lab_b_neutral_gray_is_midscale() {
        // Neutral colors have b* near 0, i.e. near 128 in 8-bit encoding
        let b = rgb_to_lab_b(128, 128, 128);
        assert!((b as i32 - 128).abs() <= 2, "got {b}");
        // Yellow pushes b* strongly positive
        assert!(rgb_to_lab_b(255, 255, 0) > 180);
    }

    #[test]
    fn test_gaussian_blur_preserves_flat_region() {
        let mut gray = GrayFrame::new(16, 16);
        gray.data.fill(100);
        let blurred = gaussian_blur(&gray, 9, 2.0);
        assert!(blurred.data.iter().all(|&v| (v as i32 - 100).abs() <= 1));
    }

    #[test]
    fn test_sobel_vertical_edge() {
        let mut gray = GrayFrame::new(8, 8);
        for y in 0..8 {
            for x in 4..8 {
                gray.set(x, y, 255);
            }
        }
        let grads = sobel(&gray);
        assert!(grads.magnitude(4, 4) > 500.0);
        assert!(grads.magnitude(1, 4) < 1.0);
    }

    #[test]
    fn test_open_removes_speckle() {
        let mut mask = Mask::new(10, 10);
        mask.set(5, 5, true); // single-pixel noise
        let cleaned = open(&mask, 2);
        assert_eq!(cleaned.count_nonzero(), 0);
    }

    #[test]
    fn test_close_fills_hole() {
        let mut mask = Mask::new(12, 12);
        for y in 3..9 {
            for x in 3..9 {
                mask.set(x, y, true);
            }
        }
        mask.set(5, 5, false); // one-pixel hole
        let closed = close(&mask, 3);
        assert!(closed.get(5, 5));
    }

    #[test]
    fn test_connected_components_disk() {
        let mut mask = Mask::new(20, 20);
        for y in 0..20usize {
            for x in 0..20usize {
                let dx = x as f64 - 10.0;
                let dy = y as f64 - 10.0;
                if (dx * dx + dy * dy).sqrt() <= 4.0 {
                    mask.set(x, y, true);
                }
            }
        }
        let blobs = connected_components(&mask);
        assert_eq!(blobs.len(), 1);
        let blob = &blobs[0];
        assert!(blob.area > 40.0 && blob.area < 60.0);
        assert_eq!(blob.centroid, (10, 10));
        // Roughly circular: 4*pi*A/P^2 near 1
        let circularity = 4.0 * std::f64::consts::PI * blob.area / (blob.perimeter * blob.perimeter);
        assert!(circularity > 0.5, "circularity {circularity}");
    }
}
