// src/lib.rs
//
// Vision-to-physics roulette prediction pipeline.
//
// Data flow:
//   Frame → detector (wheel circle, ball pixel history)
//         → kinematics (polar state estimate)
//         → simulation (forward-Euler trajectory)
//         → prediction (pocket number + confidence)
//
// Stream capture, browser automation and UI surfaces are external
// collaborators: they feed `Frame`s in and consume `Prediction`s.

mod ball_detection;
pub mod config;
pub mod detector;
pub mod hough;
pub mod imageops;
pub mod kinematics;
pub mod pipeline;
pub mod prediction;
pub mod simulation;
pub mod types;
mod wheel_detection;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for ergonomic access by orchestrators
pub use detector::DetectorSession;
pub use kinematics::{angular_velocity, radial_velocity, KinematicsConverter};
pub use pipeline::PredictionPipeline;
pub use prediction::{
    predict_landing_position, prediction_confidence, SEGMENT_COUNT, WHEEL_NUMBERS,
};
pub use simulation::{RouletteState, TrajectorySimulator};
pub use types::{
    Config, DetectionConfig, Frame, LoggingConfig, PhysicsConfig, Prediction, SimulationConfig,
    WheelCircle,
};
