// src/hough.rs
//
// Gradient-voting circle transform (the classical two-stage Hough
// gradient method). Edge pixels vote along their gradient direction
// into a downscaled 2D center accumulator; radii are then recovered
// per center from the edge-distance histogram.

use crate::imageops::{sobel, GrayFrame};

/// One parameterization of the circle search. Live streams vary too much
/// in lighting and zoom for a single setting, so the wheel detector runs
/// several passes and scores all candidates.
#[derive(Debug, Clone, Copy)]
pub struct HoughPass {
    /// Accumulator downscale factor
    pub dp: u32,
    /// Minimum distance between returned circle centers, in pixels
    pub min_dist: f32,
    /// Gradient magnitude threshold for edge pixels
    pub edge_threshold: f32,
    /// Minimum accumulator votes for a center peak
    pub accumulator_threshold: f32,
    pub min_radius: u32,
    pub max_radius: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

/// How many circles a single pass may return.
const MAX_CIRCLES_PER_PASS: usize = 5;

struct EdgePixel {
    x: f32,
    y: f32,
    // unit gradient direction
    dx: f32,
    dy: f32,
}

/// Detect circles in a (pre-blurred) grayscale image.
pub fn hough_circles(gray: &GrayFrame, pass: &HoughPass) -> Vec<Circle> {
    let (w, h) = (gray.width, gray.height);
    if w < 4 || h < 4 || pass.min_radius == 0 || pass.min_radius > pass.max_radius {
        return Vec::new();
    }

    let grads = sobel(gray);

    // Collect edge pixels with their normalized gradient direction
    let mut edges = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            let gx = grads.gx[idx];
            let gy = grads.gy[idx];
            let mag = (gx * gx + gy * gy).sqrt();
            if mag < pass.edge_threshold {
                continue;
            }
            edges.push(EdgePixel {
                x: x as f32,
                y: y as f32,
                dx: gx / mag,
                dy: gy / mag,
            });
        }
    }
    if edges.is_empty() {
        return Vec::new();
    }

    // Center voting into a dp-downscaled accumulator. Each edge pixel
    // votes along both gradient directions across the radius range.
    let dp = pass.dp.max(1) as f32;
    let aw = (w as f32 / dp).ceil() as usize;
    let ah = (h as f32 / dp).ceil() as usize;
    let mut accum = vec![0.0f32; aw * ah];

    for e in &edges {
        for sign in [-1.0f32, 1.0] {
            let mut r = pass.min_radius as f32;
            while r <= pass.max_radius as f32 {
                let vx = e.x + sign * e.dx * r;
                let vy = e.y + sign * e.dy * r;
                if vx >= 0.0 && vx < w as f32 && vy >= 0.0 && vy < h as f32 {
                    let bx = (vx / dp) as usize;
                    let by = (vy / dp) as usize;
                    accum[by * aw + bx] += 1.0;
                }
                r += dp;
            }
        }
    }

    // Peak extraction: all bins over threshold, strongest first, greedily
    // suppressed within min_dist of an already accepted center.
    let mut peaks: Vec<(f32, usize, usize)> = Vec::new();
    for by in 0..ah {
        for bx in 0..aw {
            let v = accum[by * aw + bx];
            if v >= pass.accumulator_threshold {
                peaks.push((v, bx, by));
            }
        }
    }
    peaks.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut centers: Vec<(f32, f32)> = Vec::new();
    for &(_, bx, by) in &peaks {
        if centers.len() >= MAX_CIRCLES_PER_PASS {
            break;
        }
        let cx = bx as f32 * dp + dp / 2.0;
        let cy = by as f32 * dp + dp / 2.0;
        let far_enough = centers.iter().all(|&(kx, ky)| {
            let dx = cx - kx;
            let dy = cy - ky;
            (dx * dx + dy * dy).sqrt() >= pass.min_dist
        });
        if far_enough {
            centers.push((cx, cy));
        }
    }

    // Radius recovery: mode of the edge-pixel distance histogram, with the
    // same support requirement as the center vote.
    let mut circles = Vec::new();
    for &(cx, cy) in &centers {
        if let Some(radius) = estimate_radius(&edges, cx, cy, pass) {
            circles.push(Circle {
                x: cx.round() as i32,
                y: cy.round() as i32,
                radius,
            });
        }
    }
    circles
}

fn estimate_radius(edges: &[EdgePixel], cx: f32, cy: f32, pass: &HoughPass) -> Option<i32> {
    let bin_width = pass.dp.max(1) as f32;
    let bins = ((pass.max_radius - pass.min_radius) as f32 / bin_width) as usize + 1;
    let mut hist = vec![0u32; bins];

    for e in edges {
        let dx = e.x - cx;
        let dy = e.y - cy;
        let d = (dx * dx + dy * dy).sqrt();
        if d < pass.min_radius as f32 || d > pass.max_radius as f32 {
            continue;
        }
        let bin = ((d - pass.min_radius as f32) / bin_width) as usize;
        hist[bin.min(bins - 1)] += 1;
    }

    let (best_bin, &support) = hist
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)?;
    if (support as f32) < pass.accumulator_threshold {
        return None;
    }

    let radius = pass.min_radius as f32 + best_bin as f32 * bin_width + bin_width / 2.0;
    Some(radius.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bright ring of the given radius on a dark background.
    fn make_ring(w: usize, h: usize, cx: f32, cy: f32, radius: f32) -> GrayFrame {
        let mut img = GrayFrame::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                img.set(x, y, if (d - radius).abs() < 2.0 { 220 } else { 30 });
            }
        }
        img
    }

    #[test]
    fn test_finds_single_ring() {
        let img = make_ring(160, 160, 80.0, 80.0, 50.0);
        let pass = HoughPass {
            dp: 1,
            min_dist: 60.0,
            edge_threshold: 50.0,
            accumulator_threshold: 30.0,
            min_radius: 30,
            max_radius: 80,
        };
        let circles = hough_circles(&img, &pass);
        assert!(!circles.is_empty());
        let c = circles[0];
        assert!((c.x - 80).abs() <= 3, "center x {}", c.x);
        assert!((c.y - 80).abs() <= 3, "center y {}", c.y);
        assert!((c.radius - 50).abs() <= 4, "radius {}", c.radius);
    }

    #[test]
    fn test_blank_image_yields_nothing() {
        let img = GrayFrame::new(100, 100);
        let pass = HoughPass {
            dp: 1,
            min_dist: 50.0,
            edge_threshold: 50.0,
            accumulator_threshold: 20.0,
            min_radius: 20,
            max_radius: 50,
        };
        assert!(hough_circles(&img, &pass).is_empty());
    }

    #[test]
    fn test_min_dist_suppresses_duplicate_peaks() {
        let img = make_ring(160, 160, 80.0, 80.0, 50.0);
        let pass = HoughPass {
            dp: 1,
            min_dist: 100.0,
            edge_threshold: 50.0,
            accumulator_threshold: 20.0,
            min_radius: 30,
            max_radius: 80,
        };
        let circles = hough_circles(&img, &pass);
        assert_eq!(circles.len(), 1);
    }
}
