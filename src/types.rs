// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub detection: DetectionConfig,
    pub physics: PhysicsConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum wheel candidate score to accept a detection
    pub min_wheel_score: f64,
    /// Preferred wheel radius in pixels (size-preference scoring term)
    pub nominal_wheel_radius_px: f64,
    /// Maximum ball observations kept in history
    pub history_cap: usize,
    /// Ball blob area bounds in px^2
    pub min_ball_area: f64,
    pub max_ball_area: f64,
    /// Minimum blob circularity (4*pi*area/perimeter^2)
    pub min_circularity: f64,
    /// Ball track annulus applied to the candidate mask, as wheel-radius fractions
    pub track_mask_inner_frac: f64,
    pub track_mask_outer_frac: f64,
    /// Centroid distance gate, as wheel-radius fractions
    pub track_gate_inner_frac: f64,
    pub track_gate_outer_frac: f64,
    /// Single-frame ball jump above this fraction of the wheel radius
    /// triggers the motion-consistency lookback
    pub max_jump_frac: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_wheel_score: 0.3,
            nominal_wheel_radius_px: 100.0,
            history_cap: 15,
            min_ball_area: 5.0,
            max_ball_area: 500.0,
            min_circularity: 0.3,
            track_mask_inner_frac: 0.3,
            track_mask_outer_frac: 0.95,
            track_gate_inner_frac: 0.2,
            track_gate_outer_frac: 0.95,
            max_jump_frac: 0.3,
        }
    }
}

/// Physical and calibration constants for the trajectory model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Pixel-space to physical-space scale, needs per-stream calibration
    pub pixels_per_meter: f64,
    /// Ball-wheel rolling friction coefficient
    pub friction_coefficient: f64,
    /// Quadratic air drag coefficient
    pub air_resistance: f64,
    /// Physical wheel radius in meters
    pub wheel_radius_m: f64,
    /// Ball mass in kg
    pub ball_mass_kg: f64,
    pub gravity: f64,
    /// Linear wheel spin-down rate in rad/s^2
    pub wheel_deceleration: f64,
    /// Assumed wheel angular velocity when the caller supplies none
    pub default_wheel_velocity: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 300.0,
            friction_coefficient: 0.02,
            air_resistance: 0.001,
            wheel_radius_m: 0.3,
            ball_mass_kg: 0.005,
            gravity: 9.81,
            wheel_deceleration: 0.01,
            default_wheel_velocity: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Integration time step in seconds
    pub dt: f64,
    /// Simulated time budget in seconds
    pub simulation_time: f64,
    /// Assumed time between frame captures in seconds
    pub time_interval: f64,
    /// Minimum ball observations before attempting a prediction
    pub min_history_for_prediction: usize,
    /// Number of most recent observations fed into the state estimate
    pub state_window: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            simulation_time: 12.0,
            time_interval: 0.1,
            min_history_for_prediction: 3,
            state_window: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One raw video frame: 8-bit RGB, row-major HWC layout.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize, timestamp: f64) -> Self {
        debug_assert_eq!(data.len(), width * height * 3);
        Self {
            data,
            width,
            height,
            timestamp,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let idx = (y * self.width + x) * 3;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

/// Detected wheel geometry in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WheelCircle {
    pub center: (i32, i32),
    pub radius: i32,
}

/// One completed landing prediction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Prediction {
    /// Predicted pocket number, 0..=36
    pub number: u8,
    /// Final ball angle relative to the wheel face, [0, 2*pi)
    pub relative_angle: f64,
    /// Heuristic trust in the prediction, [0.1, 1.0]
    pub confidence: f64,
}
