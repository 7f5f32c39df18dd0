// src/wheel_detection.rs
//
// Wheel localization: several Hough passes with different sensitivity,
// every candidate scored on edge strength, felt color, radial segment
// structure and size. The best candidate wins if it clears the
// configured confidence floor.

use crate::hough::{hough_circles, Circle, HoughPass};
use crate::imageops::{gaussian_blur, rgb_to_gray, rgb_to_hsv, sobel, GrayFrame};
use crate::types::{DetectionConfig, Frame, WheelCircle};
use tracing::debug;

/// Hough parameter sets tried in order. No single configuration is robust
/// across the lighting and zoom conditions of live streams.
fn detection_passes(width: usize, height: usize) -> [HoughPass; 4] {
    let min_dim = width.min(height) as u32;
    [
        // Standard detection
        HoughPass {
            dp: 1,
            min_dist: 100.0,
            edge_threshold: 50.0,
            accumulator_threshold: 30.0,
            min_radius: 50,
            max_radius: min_dim / 2,
        },
        // More sensitive
        HoughPass {
            dp: 1,
            min_dist: 80.0,
            edge_threshold: 40.0,
            accumulator_threshold: 25.0,
            min_radius: 40,
            max_radius: min_dim / 2,
        },
        // Less sensitive but more robust
        HoughPass {
            dp: 2,
            min_dist: 120.0,
            edge_threshold: 60.0,
            accumulator_threshold: 35.0,
            min_radius: 60,
            max_radius: min_dim / 3,
        },
        // Very sensitive, for small wheels
        HoughPass {
            dp: 1,
            min_dist: 60.0,
            edge_threshold: 30.0,
            accumulator_threshold: 20.0,
            min_radius: 30,
            max_radius: min_dim / 2,
        },
    ]
}

/// Locate the most plausible wheel circle in a frame.
///
/// Returns the winning circle and its score, or `None` when nothing
/// clears `config.min_wheel_score`.
pub(crate) fn detect_wheel(frame: &Frame, config: &DetectionConfig) -> Option<(WheelCircle, f64)> {
    let gray = rgb_to_gray(frame);
    let blurred = gaussian_blur(&gray, 9, 2.0);

    let mut best: Option<(Circle, f64)> = None;

    for pass in detection_passes(frame.width, frame.height) {
        for circle in hough_circles(&blurred, &pass) {
            // The full circle must sit inside the frame
            let (x, y, r) = (circle.x, circle.y, circle.radius);
            if x - r < 0
                || y - r < 0
                || x + r >= frame.width as i32
                || y + r >= frame.height as i32
            {
                continue;
            }

            let score = score_wheel_candidate(frame, &gray, &circle, config);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((circle, score));
            }
        }
    }

    let (circle, score) = best?;
    if score <= config.min_wheel_score {
        return None;
    }

    debug!(
        "🎯 wheel candidate accepted: center=({}, {}), radius={}, score={:.2}",
        circle.x, circle.y, circle.radius, score
    );
    Some((
        WheelCircle {
            center: (circle.x, circle.y),
            radius: circle.radius,
        },
        score,
    ))
}

/// Weighted score of a wheel candidate from its surrounding region.
fn score_wheel_candidate(
    frame: &Frame,
    gray: &GrayFrame,
    circle: &Circle,
    config: &DetectionConfig,
) -> f64 {
    let roi_size = (circle.radius as f64 * 2.2) as i32;
    let x0 = (circle.x - roi_size / 2).max(0) as usize;
    let y0 = (circle.y - roi_size / 2).max(0) as usize;
    let x1 = (x0 as i32 + roi_size).min(frame.width as i32) as usize;
    let y1 = (y0 as i32 + roi_size).min(frame.height as i32) as usize;
    if x1 <= x0 || y1 <= y0 {
        return 0.0;
    }
    let roi_area = ((x1 - x0) * (y1 - y0)) as f64;

    let mut score = 0.0;

    // 1. Circular edge strength in the region
    let grads = sobel(gray);
    let mut edge_count = 0u64;
    for y in y0.max(1)..y1.min(frame.height - 1) {
        for x in x0.max(1)..x1.min(frame.width - 1) {
            if grads.magnitude(x, y) >= 150.0 {
                edge_count += 1;
            }
        }
    }
    let edge_density = edge_count as f64 * 255.0 / roi_area;
    score += (edge_density * 1000.0).min(0.3);

    // 2. Green felt around the wheel
    let mut green_count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            let (r, g, b) = frame.pixel(x, y);
            let (h, s, v) = rgb_to_hsv(r as f32, g as f32, b as f32);
            if (70.0..=170.0).contains(&h) && s > 15.7 && v > 40.0 {
                green_count += 1;
            }
        }
    }
    let green_ratio = green_count as f64 / roi_area;
    score += (green_ratio * 2.0).min(0.3);

    // 3. Radial intensity pattern (pocket segment boundaries)
    score += radial_pattern_score(gray, circle) * 0.2;

    // 4. Size preference around the nominal wheel radius
    let nominal = config.nominal_wheel_radius_px;
    let size_score = 1.0 - (circle.radius as f64 - nominal).abs() / (2.0 * nominal);
    score += size_score.max(0.0) * 0.2;

    score
}

/// Probe horizontal intensity gradients on two concentric sample rings;
/// wheel segment boundaries show up as repeated sharp transitions.
fn radial_pattern_score(gray: &GrayFrame, circle: &Circle) -> f64 {
    let mut pattern_score = 0.0f64;
    let num_angles = 36; // every 10 degrees

    for step in 0..num_angles {
        let angle = (step as f64) * 10.0f64.to_radians();
        for r_factor in [0.6, 0.8] {
            let sample_r = circle.radius as f64 * r_factor;
            let sx = circle.x + (sample_r * angle.cos()).round() as i32;
            let sy = circle.y + (sample_r * angle.sin()).round() as i32;

            if sx > 0 && (sx as usize) < gray.width - 1 && sy >= 0 && (sy as usize) < gray.height {
                let left = gray.get(sx as usize - 1, sy as usize) as i32;
                let right = gray.get(sx as usize + 1, sy as usize) as i32;
                pattern_score += (right - left).abs() as f64;
            }
        }
    }

    (pattern_score / (num_angles as f64 * 2.0 * 255.0)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_wheel_frame;
    use crate::types::DetectionConfig;

    #[test]
    fn test_detect_wheel_round_trip() {
        let frame = make_wheel_frame(240, 240, 120, 120, 80);
        let config = DetectionConfig::default();

        let (wheel, score) = detect_wheel(&frame, &config).expect("wheel should be found");
        assert!((wheel.center.0 - 120).abs() <= 5, "center x {}", wheel.center.0);
        assert!((wheel.center.1 - 120).abs() <= 5, "center y {}", wheel.center.1);
        assert!((wheel.radius - 80).abs() <= 6, "radius {}", wheel.radius);
        assert!(score > config.min_wheel_score);
    }

    #[test]
    fn test_detect_wheel_rejects_blank_frame() {
        let frame = Frame::new(vec![30u8; 200 * 200 * 3], 200, 200, 0.0);
        assert!(detect_wheel(&frame, &DetectionConfig::default()).is_none());
    }

    #[test]
    fn test_circle_touching_border_is_rejected() {
        // Wheel centered near the edge: bounding box leaves the frame
        let frame = make_wheel_frame(200, 200, 30, 100, 80);
        let result = detect_wheel(&frame, &DetectionConfig::default());
        if let Some((wheel, _)) = result {
            // Anything accepted must still be fully inside the frame
            assert!(wheel.center.0 - wheel.radius >= 0);
            assert!(wheel.center.0 + wheel.radius < 200);
        }
    }
}
