// src/detector.rs
//
// Per-stream detection session. Owns the wheel calibration and the
// rolling ball-position history; one session per video stream, calls
// serialized by the owner. Every failure degrades to `None` so the
// caller just retries on the next frame.

use crate::ball_detection::{candidate_score, find_ball_candidates};
use crate::types::{DetectionConfig, Frame, WheelCircle};
use crate::wheel_detection;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

pub struct DetectorSession {
    config: DetectionConfig,
    wheel: Option<WheelCircle>,
    last_ball_position: Option<(i32, i32)>,
    ball_history: VecDeque<(i32, i32)>,
}

impl DetectorSession {
    pub fn new(config: DetectionConfig) -> Self {
        let cap = config.history_cap;
        Self {
            config,
            wheel: None,
            last_ball_position: None,
            ball_history: VecDeque::with_capacity(cap),
        }
    }

    /// Current wheel calibration, if any.
    pub fn wheel(&self) -> Option<WheelCircle> {
        self.wheel
    }

    /// Override the wheel calibration (e.g. from an operator-supplied
    /// region) instead of detecting it.
    pub fn set_wheel(&mut self, wheel: WheelCircle) {
        self.wheel = Some(wheel);
    }

    /// Most recent ball observation.
    pub fn last_ball_position(&self) -> Option<(i32, i32)> {
        self.last_ball_position
    }

    /// Rolling ball observation history, oldest first.
    pub fn ball_history(&self) -> &VecDeque<(i32, i32)> {
        &self.ball_history
    }

    /// Drop all session state (e.g. when the stream changes).
    pub fn reset(&mut self) {
        self.wheel = None;
        self.last_ball_position = None;
        self.ball_history.clear();
    }

    /// Locate the wheel in a frame. On success the session calibration is
    /// updated; on failure prior calibration is left untouched.
    pub fn detect_wheel(&mut self, frame: &Frame) -> Option<WheelCircle> {
        let (wheel, score) = wheel_detection::detect_wheel(frame, &self.config)?;
        info!(
            "🎯 wheel calibrated: center=({}, {}), radius={}, confidence={:.2}",
            wheel.center.0, wheel.center.1, wheel.radius, score
        );
        self.wheel = Some(wheel);
        Some(wheel)
    }

    /// Locate the ball in a frame. Requires a calibrated wheel (detection
    /// is attempted once if absent). On success the observation is
    /// appended to the bounded history.
    pub fn detect_ball(&mut self, frame: &Frame) -> Option<(i32, i32)> {
        if self.wheel.is_none() {
            self.detect_wheel(frame);
        }
        let wheel = self.wheel?;

        let candidates = find_ball_candidates(frame, &wheel, &self.config);
        if candidates.is_empty() {
            return None;
        }

        let radius = wheel.radius as f64;
        let mut ranked = candidates;
        ranked.sort_by(|a, b| {
            candidate_score(b, radius)
                .partial_cmp(&candidate_score(a, radius))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut ball_pos = (ranked[0].x, ranked[0].y);

        // Motion consistency: a single-frame jump beyond the configured
        // fraction of the wheel radius is suspect. Fall back to the best
        // alternative substantially closer to the previous observation.
        if let Some(prev) = self.last_ball_position {
            let jump = pixel_distance(ball_pos, prev);
            if jump > radius * self.config.max_jump_frac {
                for alt in ranked.iter().skip(1) {
                    let alt_pos = (alt.x, alt.y);
                    if pixel_distance(alt_pos, prev) < jump * 0.7 {
                        warn!(
                            "ball jumped {:.0}px in one frame, using closer candidate at ({}, {})",
                            jump, alt_pos.0, alt_pos.1
                        );
                        ball_pos = alt_pos;
                        break;
                    }
                }
            }
        }

        self.last_ball_position = Some(ball_pos);
        if self.ball_history.len() >= self.config.history_cap {
            self.ball_history.pop_front();
        }
        self.ball_history.push_back(ball_pos);

        debug!("ball at ({}, {})", ball_pos.0, ball_pos.1);
        Some(ball_pos)
    }

    /// Pixel speed from the two most recent observations.
    pub fn calculate_ball_speed(&self, time_interval: f64) -> Option<f64> {
        if self.ball_history.len() < 2 {
            return None;
        }
        let prev = self.ball_history[self.ball_history.len() - 2];
        let last = self.ball_history[self.ball_history.len() - 1];
        Some(pixel_distance(last, prev) / time_interval)
    }

    /// Angle of the most recent ball position about the wheel center.
    pub fn ball_angle(&self) -> Option<f64> {
        let (bx, by) = self.last_ball_position?;
        let (cx, cy) = self.wheel?.center;
        Some(((by - cy) as f64).atan2((bx - cx) as f64))
    }

    /// Evenly spaced segment angles for an n-pocket wheel. Empty without
    /// a wheel calibration.
    pub fn wheel_segment_angles(&self, num_segments: usize) -> Vec<f64> {
        if self.wheel.is_none() {
            return Vec::new();
        }
        (0..num_segments)
            .map(|i| 2.0 * std::f64::consts::PI * i as f64 / num_segments as f64)
            .collect()
    }
}

fn pixel_distance(a: (i32, i32), b: (i32, i32)) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}
