// src/ball_detection.rs
//
// Ball localization inside a known wheel. The ball's apparent color and
// brightness vary a lot with stream compression and lighting, so four
// independent masks are OR-ed together, cleaned up morphologically,
// restricted to the ball track annulus, and the surviving blobs are
// ranked by a weighted score.

use crate::imageops::{
    close, connected_components, max_filter_5x5, open, rgb_to_gray, rgb_to_hsv, rgb_to_lab_b,
    GrayFrame, Mask,
};
use crate::types::{DetectionConfig, Frame, WheelCircle};

/// A surviving ball candidate with its ranking features.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BallCandidate {
    pub x: i32,
    pub y: i32,
    pub area: f64,
    pub circularity: f64,
    /// Gray value at the centroid, 0-255
    pub brightness: f64,
    /// Centroid distance from the wheel center, pixels
    pub dist_from_center: f64,
}

/// Weighted ranking score. Brightness dominates; the remaining terms
/// reward round, reasonably sized blobs near the typical track radius.
pub(crate) fn candidate_score(candidate: &BallCandidate, wheel_radius: f64) -> f64 {
    candidate.brightness * 0.4
        + candidate.circularity * 0.3
        + (candidate.area / 100.0).min(1.0) * 0.2
        + (1.0 - (candidate.dist_from_center - wheel_radius * 0.7).abs() / (wheel_radius * 0.3))
            * 0.1
}

/// Find all plausible ball blobs in the frame, unranked.
pub(crate) fn find_ball_candidates(
    frame: &Frame,
    wheel: &WheelCircle,
    config: &DetectionConfig,
) -> Vec<BallCandidate> {
    let gray = rgb_to_gray(frame);
    let mask = build_candidate_mask(frame, &gray, wheel, config);
    let (cx, cy) = wheel.center;
    let radius = wheel.radius as f64;

    let mut candidates = Vec::new();
    for blob in connected_components(&mask) {
        if blob.area <= config.min_ball_area || blob.area >= config.max_ball_area {
            continue;
        }
        if blob.perimeter <= 0.0 {
            continue;
        }
        let circularity =
            4.0 * std::f64::consts::PI * blob.area / (blob.perimeter * blob.perimeter);
        if circularity <= config.min_circularity {
            continue;
        }

        let (bx, by) = blob.centroid;
        let dx = (bx - cx) as f64;
        let dy = (by - cy) as f64;
        let dist = (dx * dx + dy * dy).sqrt();

        // Centroid must sit on the ball track
        if dist <= radius * config.track_gate_inner_frac
            || dist >= radius * config.track_gate_outer_frac
        {
            continue;
        }

        let brightness = if bx >= 0
            && by >= 0
            && (bx as usize) < gray.width
            && (by as usize) < gray.height
        {
            gray.get(bx as usize, by as usize) as f64
        } else {
            0.0
        };

        candidates.push(BallCandidate {
            x: bx,
            y: by,
            area: blob.area,
            circularity,
            brightness,
            dist_from_center: dist,
        });
    }
    candidates
}

/// OR of the four per-pixel detectors, cleaned and cut to the track annulus.
fn build_candidate_mask(
    frame: &Frame,
    gray: &GrayFrame,
    wheel: &WheelCircle,
    config: &DetectionConfig,
) -> Mask {
    let (w, h) = (frame.width, frame.height);
    let dilated = max_filter_5x5(gray);
    let mut mask = Mask::new(w, h);

    for y in 0..h {
        for x in 0..w {
            let (r, g, b) = frame.pixel(x, y);
            let gv = gray.get(x, y);

            // 1. HSV white threshold
            let (_, s, v) = rgb_to_hsv(r as f32, g as f32, b as f32);
            let white = s <= 21.6 && v >= 180.0;

            // 2. Bright in the LAB b channel
            let lab_bright = rgb_to_lab_b(r, g, b) > 140;

            // 3. Plain grayscale brightness
            let gray_bright = gv > 200;

            // 4. Local maxima (top-hat response for a shiny ball)
            let top_hat = dilated.get(x, y).saturating_sub(gv) > 10;

            mask.set(x, y, white || lab_bright || gray_bright || top_hat);
        }
    }

    // Remove speckle, then fill pinholes
    let mask = open(&mask, 2);
    let mut mask = close(&mask, 3);

    // Restrict to the annulus where the ball physically travels
    let (cx, cy) = wheel.center;
    let inner = wheel.radius as f64 * config.track_mask_inner_frac;
    let outer = wheel.radius as f64 * config.track_mask_outer_frac;
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - cx as f64;
            let dy = y as f64 - cy as f64;
            let d = (dx * dx + dy * dy).sqrt();
            if d < inner || d > outer {
                mask.set(x, y, false);
            }
        }
    }
    mask
}
