// src/pipeline.rs
//
// Per-frame orchestration over the detection, kinematics, simulation and
// prediction stages. The stream/capture layer lives outside this crate;
// it hands frames in, this hands predictions back.
//
// Signal flow:
//   Frame → DetectorSession → ball history
//         → KinematicsConverter → initial RouletteState
//         → TrajectorySimulator → trajectory
//         → predict_landing_position / prediction_confidence → Prediction

use crate::detector::DetectorSession;
use crate::kinematics::KinematicsConverter;
use crate::prediction::{predict_landing_position, prediction_confidence};
use crate::simulation::TrajectorySimulator;
use crate::types::{Config, Frame, Prediction};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Wheel detections needed before the pipeline considers itself calibrated.
const CALIBRATION_HITS: u32 = 3;

/// Recent predictions kept for diagnostic consumers.
const PREDICTION_BACKLOG: usize = 50;

/// Confidence above which a prediction is worth announcing.
const ANNOUNCE_CONFIDENCE: f64 = 0.4;

pub struct PredictionPipeline {
    config: Config,
    detector: DetectorSession,
    converter: KinematicsConverter,
    simulator: TrajectorySimulator,
    predictions: VecDeque<Prediction>,
    frames_seen: u64,
    successful_detections: u64,
    calibration_hits: u32,
}

impl PredictionPipeline {
    pub fn new(config: Config) -> Self {
        let detector = DetectorSession::new(config.detection.clone());
        let converter = KinematicsConverter::new(&config.physics);
        let simulator = TrajectorySimulator::new(config.physics.clone());
        Self {
            config,
            detector,
            converter,
            simulator,
            predictions: VecDeque::with_capacity(PREDICTION_BACKLOG),
            frames_seen: 0,
            successful_detections: 0,
            calibration_hits: 0,
        }
    }

    /// Run one wheel-detection attempt on a calibration frame. Returns
    /// `true` once enough frames have confirmed the wheel.
    pub fn calibrate(&mut self, frame: &Frame) -> bool {
        if self.detector.detect_wheel(frame).is_some() {
            self.calibration_hits += 1;
            debug!("calibration frame {}: wheel detected", self.calibration_hits);
        }
        self.is_calibrated()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration_hits >= CALIBRATION_HITS
    }

    /// Process one live frame: detect the ball and, once enough history
    /// has accumulated, simulate and predict the landing pocket.
    ///
    /// `None` means no prediction this frame — detection failed or the
    /// history is still too short. Both are normal; feed the next frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<Prediction> {
        self.frames_seen += 1;

        self.detector.detect_ball(frame)?;
        self.successful_detections += 1;

        let sim = &self.config.simulation;
        let history = self.detector.ball_history();
        if history.len() < sim.min_history_for_prediction {
            return None;
        }

        // Most recent observations only; older ones may predate the spin
        let skip = history.len().saturating_sub(sim.state_window);
        let positions: Vec<(i32, i32)> = history.iter().skip(skip).copied().collect();
        let wheel_center = self.detector.wheel()?.center;

        let state =
            self.converter
                .state_from_vision(&positions, wheel_center, sim.time_interval, None)?;

        let trajectory = self.simulator.simulate(state, sim.simulation_time, sim.dt);
        if trajectory.is_empty() {
            return None;
        }

        let (relative_angle, number) = predict_landing_position(&trajectory);
        let confidence = prediction_confidence(&trajectory);
        let prediction = Prediction {
            number,
            relative_angle,
            confidence,
        };

        if self.predictions.len() >= PREDICTION_BACKLOG {
            self.predictions.pop_front();
        }
        self.predictions.push_back(prediction);

        if confidence > ANNOUNCE_CONFIDENCE {
            info!(
                "🎯 prediction: number {} (confidence {:.2}, ball speed {:.1} px/s)",
                number,
                confidence,
                self.detector
                    .calculate_ball_speed(sim.time_interval)
                    .unwrap_or(0.0)
            );
        }

        Some(prediction)
    }

    /// Detector session, for diagnostic overlays.
    pub fn detector(&self) -> &DetectorSession {
        &self.detector
    }

    /// Recent predictions, oldest first.
    pub fn recent_predictions(&self) -> &VecDeque<Prediction> {
        &self.predictions
    }

    /// Fraction of processed frames with a successful ball detection.
    pub fn detection_rate(&self) -> f64 {
        if self.frames_seen == 0 {
            return 0.0;
        }
        self.successful_detections as f64 / self.frames_seen as f64
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}
