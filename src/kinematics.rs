// src/kinematics.rs
//
// Pixel-space observations to polar physical coordinates, and velocity
// estimation from short position histories.

use crate::simulation::RouletteState;
use crate::types::PhysicsConfig;
use std::f64::consts::PI;

/// Mean angular velocity over a polar position history.
///
/// Successive angle differences are wraparound-corrected at the -pi/pi
/// boundary before averaging; raw subtraction there would read as a
/// spurious near-2pi jump.
pub fn angular_velocity(positions: &[(f64, f64)], time_interval: f64) -> Option<f64> {
    if positions.len() < 2 {
        return None;
    }

    let mut sum = 0.0;
    for pair in positions.windows(2) {
        let mut diff = pair[1].0 - pair[0].0;
        if diff > PI {
            diff -= 2.0 * PI;
        } else if diff < -PI {
            diff += 2.0 * PI;
        }
        sum += diff;
    }

    Some(sum / ((positions.len() - 1) as f64 * time_interval))
}

/// Mean radial velocity over a polar position history. Radius is not
/// periodic, so plain differences suffice.
pub fn radial_velocity(positions: &[(f64, f64)], time_interval: f64) -> Option<f64> {
    if positions.len() < 2 {
        return None;
    }

    let sum: f64 = positions.windows(2).map(|p| p[1].1 - p[0].1).sum();
    Some(sum / ((positions.len() - 1) as f64 * time_interval))
}

/// Maps pixel observations into the physical polar frame used by the
/// simulator.
pub struct KinematicsConverter {
    pixels_per_meter: f64,
    default_wheel_velocity: f64,
}

impl KinematicsConverter {
    pub fn new(physics: &PhysicsConfig) -> Self {
        Self {
            pixels_per_meter: physics.pixels_per_meter,
            default_wheel_velocity: physics.default_wheel_velocity,
        }
    }

    /// Convert a pixel position to (angle in radians, radius in meters)
    /// about the wheel center.
    pub fn pixel_to_polar(&self, x: i32, y: i32, center: (i32, i32)) -> (f64, f64) {
        let dx = (x - center.0) as f64;
        let dy = (y - center.1) as f64;

        let angle = dy.atan2(dx);
        let radius = (dx * dx + dy * dy).sqrt() / self.pixels_per_meter;

        (angle, radius)
    }

    /// Build the initial simulation state from recent ball observations.
    ///
    /// The wheel angular velocity is caller-supplied, not measured; when
    /// absent the configured default is assumed. Returns `None` with
    /// fewer than two observations.
    pub fn state_from_vision(
        &self,
        ball_positions: &[(i32, i32)],
        wheel_center: (i32, i32),
        time_interval: f64,
        wheel_angular_velocity: Option<f64>,
    ) -> Option<RouletteState> {
        if ball_positions.len() < 2 {
            return None;
        }

        let polar: Vec<(f64, f64)> = ball_positions
            .iter()
            .map(|&(x, y)| self.pixel_to_polar(x, y, wheel_center))
            .collect();

        let angular = angular_velocity(&polar, time_interval)?;
        let radial = radial_velocity(&polar, time_interval)?;
        let (angle, radius) = *polar.last()?;

        Some(RouletteState {
            ball_angle: angle,
            ball_radius: radius,
            angular_velocity: angular,
            radial_velocity: radial,
            wheel_velocity: wheel_angular_velocity.unwrap_or(self.default_wheel_velocity),
            time: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> KinematicsConverter {
        KinematicsConverter::new(&PhysicsConfig::default())
    }

    #[test]
    fn test_pixel_to_polar_on_positive_x_axis() {
        let (angle, radius) = converter().pixel_to_polar(500, 300, (400, 300));
        assert_eq!(angle, 0.0);
        assert!((radius - 100.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_angular_velocity_wraparound() {
        // 3.0 -> -3.0 crosses the -pi/pi boundary: the true rotation is
        // ~0.283 rad, not ~-6 rad
        let positions = vec![(3.0, 0.2), (-3.0, 0.2)];
        let v = angular_velocity(&positions, 0.1).unwrap();
        let expected = (2.0 * PI - 6.0) / 0.1;
        assert!((v - expected).abs() < 1e-9, "velocity {v}");
        assert!(v.abs() < 3.0, "wraparound not applied: {v}");
    }

    #[test]
    fn test_angular_velocity_plain() {
        let positions = vec![(0.0, 0.2), (0.1, 0.2), (0.2, 0.2)];
        let v = angular_velocity(&positions, 0.1).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocities_need_two_positions() {
        assert!(angular_velocity(&[(1.0, 0.2)], 0.1).is_none());
        assert!(radial_velocity(&[(1.0, 0.2)], 0.1).is_none());
        assert!(angular_velocity(&[], 0.1).is_none());
    }

    #[test]
    fn test_radial_velocity() {
        let positions = vec![(0.0, 0.30), (0.0, 0.28), (0.0, 0.26)];
        let v = radial_velocity(&positions, 0.1).unwrap();
        assert!((v + 0.2).abs() < 1e-9, "velocity {v}");
    }

    #[test]
    fn test_state_from_vision() {
        // Ball rotating counterclockwise at constant pixel radius 90
        let center = (200, 200);
        let positions: Vec<(i32, i32)> = (0..4)
            .map(|i| {
                let angle = i as f64 * 0.3;
                (
                    center.0 + (90.0 * angle.cos()).round() as i32,
                    center.1 + (90.0 * angle.sin()).round() as i32,
                )
            })
            .collect();

        let state = converter()
            .state_from_vision(&positions, center, 0.1, None)
            .expect("state should be built");

        assert!((state.angular_velocity - 3.0).abs() < 0.2);
        assert!(state.radial_velocity.abs() < 0.05);
        assert!((state.ball_radius - 0.3).abs() < 0.01);
        assert_eq!(state.wheel_velocity, 5.0);
        assert_eq!(state.time, 0.0);
    }

    #[test]
    fn test_state_from_vision_insufficient_history() {
        let state = converter().state_from_vision(&[(10, 10)], (0, 0), 0.1, None);
        assert!(state.is_none());
    }
}
