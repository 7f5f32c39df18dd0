// src/prediction.rs
//
// Reduce a simulated trajectory to a pocket number and a confidence
// heuristic.

use crate::simulation::RouletteState;
use std::f64::consts::PI;

/// European wheel pocket numbers in physical wheel order. Index is the
/// angular segment, value is the pocket number.
pub const WHEEL_NUMBERS: [u8; 37] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

pub const SEGMENT_COUNT: usize = WHEEL_NUMBERS.len();

/// Minimum trajectory length before the confidence heuristic trusts the
/// early-motion variance at all.
const MIN_TRUSTED_STATES: usize = 10;
const FLOOR_CONFIDENCE: f64 = 0.1;

/// Predict the landing pocket from a completed trajectory.
///
/// The wheel rotation during the ball's flight is backed out using the
/// trajectory's *initial* wheel velocity even though the simulator decays
/// it over time; the prediction's statistical behavior is defined by this
/// mismatch, so it stays.
///
/// Returns `(relative_angle in [0, 2*pi), pocket number)`; an empty
/// trajectory yields the degenerate `(0.0, 0)`, which callers should
/// treat as "no prediction".
pub fn predict_landing_position(trajectory: &[RouletteState]) -> (f64, u8) {
    let (first, last) = match (trajectory.first(), trajectory.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (0.0, 0),
    };

    let time_traveled = last.time - first.time;
    let wheel_rotation = first.wheel_velocity * time_traveled;

    let relative_angle = (last.ball_angle - wheel_rotation).rem_euclid(2.0 * PI);

    let segment_angle = 2.0 * PI / SEGMENT_COUNT as f64;
    let segment_index = (relative_angle / segment_angle) as usize % SEGMENT_COUNT;

    (relative_angle, WHEEL_NUMBERS[segment_index])
}

/// Heuristic trust in a prediction, in [0.1, 1.0].
///
/// Short trajectories get the floor value; otherwise confidence falls
/// with the variance of the angular velocity across the first few
/// states — smoother observed motion means a better-conditioned fit.
pub fn prediction_confidence(trajectory: &[RouletteState]) -> f64 {
    if trajectory.len() < MIN_TRUSTED_STATES {
        return FLOOR_CONFIDENCE;
    }

    let velocities: Vec<f64> = trajectory[..MIN_TRUSTED_STATES]
        .iter()
        .map(|s| s.angular_velocity)
        .collect();
    let mean = velocities.iter().sum::<f64>() / velocities.len() as f64;
    let variance = velocities
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / velocities.len() as f64;

    (1.0 - variance / 10.0).clamp(FLOOR_CONFIDENCE, 1.0)
}
