// src/testutil.rs
//
// Synthetic frame fixtures shared across module tests.

use crate::types::Frame;

/// Uniform dark frame, RGB (30, 30, 30).
pub(crate) fn dark_frame(w: usize, h: usize) -> Frame {
    Frame::new(vec![30u8; w * h * 3], w, h, 0.0)
}

/// Paint a filled gray disk onto an existing frame.
pub(crate) fn paint_disk(frame: &mut Frame, cx: i32, cy: i32, radius: f64, value: u8) {
    for y in 0..frame.height {
        for x in 0..frame.width {
            let dx = x as f64 - cx as f64;
            let dy = y as f64 - cy as f64;
            if (dx * dx + dy * dy).sqrt() <= radius {
                let idx = (y * frame.width + x) * 3;
                frame.data[idx] = value;
                frame.data[idx + 1] = value;
                frame.data[idx + 2] = value;
            }
        }
    }
}

/// Synthetic table: dark background, bright wheel rim ring, faint
/// alternating pocket sectors inside so the radial pattern probe has
/// something to see.
pub(crate) fn make_wheel_frame(w: usize, h: usize, cx: i32, cy: i32, radius: i32) -> Frame {
    let mut frame = dark_frame(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - cx as f64;
            let dy = y as f64 - cy as f64;
            let d = (dx * dx + dy * dy).sqrt();
            let mut v = 30u8;
            if (d - radius as f64).abs() < 2.0 {
                v = 200;
            } else if d < radius as f64 * 0.9 && d > radius as f64 * 0.4 {
                let angle = dy.atan2(dx).rem_euclid(2.0 * std::f64::consts::PI);
                let sector = (angle / (2.0 * std::f64::consts::PI / 37.0)) as usize;
                v = if sector % 2 == 0 { 60 } else { 45 };
            }
            let idx = (y * w + x) * 3;
            frame.data[idx] = v;
            frame.data[idx + 1] = v;
            frame.data[idx + 2] = v;
        }
    }
    frame
}
