// src/simulation.rs
//
// Forward-Euler integration of a simplified ball model: centrifugal
// effect, rolling friction, quadratic air drag, a slight inward bowl
// tilt and linear wheel spin-down. Deliberately a smooth decay model
// with no deflector collisions; downstream prediction behavior is
// defined by this exact approximation, so keep it as-is.

use crate::types::PhysicsConfig;
use std::f64::consts::PI;

/// Ball radius never drops below this, in meters; keeps the ball from
/// collapsing into the wheel center.
const MIN_BALL_RADIUS_M: f64 = 0.05;

/// Settling thresholds: below both, the ball is considered stopped.
const MIN_ANGULAR_SPEED: f64 = 0.1;
const MIN_RADIAL_SPEED: f64 = 0.01;

/// One instant of the ball/wheel system in polar physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouletteState {
    /// Ball angle in radians, [-pi, pi]
    pub ball_angle: f64,
    /// Ball distance from the wheel center, meters
    pub ball_radius: f64,
    /// Ball angular velocity, rad/s
    pub angular_velocity: f64,
    /// Ball radial velocity, m/s
    pub radial_velocity: f64,
    /// Wheel angular velocity, rad/s
    pub wheel_velocity: f64,
    /// Simulated time, seconds
    pub time: f64,
}

pub struct TrajectorySimulator {
    physics: PhysicsConfig,
}

impl TrajectorySimulator {
    pub fn new(physics: PhysicsConfig) -> Self {
        Self { physics }
    }

    /// Integrate forward from `initial` until the time budget runs out or
    /// the ball settles. The returned trajectory always starts with the
    /// initial state.
    pub fn simulate(
        &self,
        initial: RouletteState,
        simulation_time: f64,
        dt: f64,
    ) -> Vec<RouletteState> {
        let p = &self.physics;
        let mut states = vec![initial];
        let mut current = initial;

        while current.time < initial.time + simulation_time {
            let angle = current.ball_angle;
            let radius = current.ball_radius;
            let angular_vel = current.angular_velocity;
            let radial_vel = current.radial_velocity;

            // Centrifugal force, outward
            let centrifugal_force = p.ball_mass_kg * angular_vel * angular_vel * radius;

            // Rolling friction, opposes the spin
            let friction_force = p.friction_coefficient * p.ball_mass_kg * p.gravity;

            // Quadratic air drag on both velocity components
            let drag_angular = p.air_resistance * angular_vel * angular_vel.abs();
            let drag_radial = p.air_resistance * radial_vel * radial_vel.abs();

            let angular_acceleration =
                -friction_force / (p.ball_mass_kg * radius) - drag_angular / p.ball_mass_kg;
            let new_angular_vel = angular_vel + angular_acceleration * dt;

            // Slight inward bowl tilt: a constant fraction of gravity
            // pulls the ball toward the hub
            let radial_acceleration = centrifugal_force / p.ball_mass_kg
                - drag_radial / p.ball_mass_kg
                - 0.1 * p.gravity;
            let new_radial_vel = radial_vel + radial_acceleration * dt;

            let mut new_angle = angle + new_angular_vel * dt;
            while new_angle > PI {
                new_angle -= 2.0 * PI;
            }
            while new_angle < -PI {
                new_angle += 2.0 * PI;
            }
            let new_radius = MIN_BALL_RADIUS_M.max(radius + new_radial_vel * dt);

            // The wheel spins down linearly, floored at rest
            let new_wheel_vel = (current.wheel_velocity - p.wheel_deceleration * dt).max(0.0);

            let new_state = RouletteState {
                ball_angle: new_angle,
                ball_radius: new_radius,
                angular_velocity: new_angular_vel,
                radial_velocity: new_radial_vel,
                wheel_velocity: new_wheel_vel,
                time: current.time + dt,
            };

            states.push(new_state);
            current = new_state;

            if new_angular_vel.abs() < MIN_ANGULAR_SPEED && new_radial_vel.abs() < MIN_RADIAL_SPEED
            {
                break;
            }
        }

        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spinning_state() -> RouletteState {
        RouletteState {
            ball_angle: 0.0,
            ball_radius: 0.3,
            angular_velocity: 5.0,
            radial_velocity: 0.0,
            wheel_velocity: 2.0,
            time: 0.0,
        }
    }

    fn simulator() -> TrajectorySimulator {
        TrajectorySimulator::new(PhysicsConfig::default())
    }

    #[test]
    fn test_trajectory_starts_with_initial_state() {
        let initial = spinning_state();
        let trajectory = simulator().simulate(initial, 1.0, 0.01);
        assert!(!trajectory.is_empty());
        assert_eq!(trajectory[0], initial);
    }

    #[test]
    fn test_step_count_is_bounded() {
        let trajectory = simulator().simulate(spinning_state(), 2.0, 0.01);
        // +2: initial state, plus one step of float-accumulation slack
        let max_states = (2.0f64 / 0.01).ceil() as usize + 2;
        assert!(
            trajectory.len() <= max_states,
            "{} states > {}",
            trajectory.len(),
            max_states
        );
    }

    #[test]
    fn test_radius_never_below_floor() {
        // Strong inward motion with weak spin drives the radius down fast
        let initial = RouletteState {
            ball_angle: 0.0,
            ball_radius: 0.3,
            angular_velocity: 1.0,
            radial_velocity: -1.0,
            wheel_velocity: 2.0,
            time: 0.0,
        };
        let trajectory = simulator().simulate(initial, 5.0, 0.01);
        assert!(trajectory.iter().all(|s| s.ball_radius >= 0.05));
        let min = trajectory
            .iter()
            .map(|s| s.ball_radius)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(min, 0.05, "floor should actually be hit");
    }

    #[test]
    fn test_angle_stays_normalized() {
        let trajectory = simulator().simulate(spinning_state(), 3.0, 0.01);
        assert!(trajectory
            .iter()
            .all(|s| s.ball_angle >= -PI && s.ball_angle <= PI));
    }

    #[test]
    fn test_ball_decelerates() {
        let trajectory = simulator().simulate(spinning_state(), 5.0, 0.01);
        let first = trajectory.first().unwrap().angular_velocity;
        let last = trajectory.last().unwrap().angular_velocity;
        assert!(last < first, "spin should decay: {first} -> {last}");
    }

    #[test]
    fn test_wheel_velocity_decays_linearly_and_floors_at_zero() {
        let mut initial = spinning_state();
        initial.wheel_velocity = 0.005;
        let trajectory = simulator().simulate(initial, 2.0, 0.01);
        // 0.005 rad/s at 0.01 rad/s^2 reaches zero within half a second
        assert_eq!(trajectory.last().unwrap().wheel_velocity, 0.0);
        assert!(trajectory.iter().all(|s| s.wheel_velocity >= 0.0));
    }

    #[test]
    fn test_settled_ball_terminates_early() {
        // Nearly stopped already: both speeds drop under the settling
        // thresholds on the first step
        let initial = RouletteState {
            ball_angle: 0.0,
            ball_radius: 0.3,
            angular_velocity: 0.09,
            radial_velocity: 0.005,
            wheel_velocity: 2.0,
            time: 0.0,
        };
        let trajectory = simulator().simulate(initial, 10.0, 0.01);
        assert!(
            trajectory.len() <= 3,
            "settled ball should stop immediately, got {} states",
            trajectory.len()
        );
        let last = trajectory.last().unwrap();
        assert!(last.angular_velocity.abs() < 0.1);
        assert!(last.radial_velocity.abs() < 0.01);
    }
}
