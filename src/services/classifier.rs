//! Anomaly classifier contract and the bundled threshold model
//!
//! The coordinator depends only on the [`AnomalyClassifier`] trait; the
//! concrete model is swappable. The bundled implementation scores the
//! feature vector against movement-plausibility thresholds loaded from a
//! JSON parameter file at startup.

use serde::Deserialize;
use thiserror::Error;

use super::features::FeatureVector;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to load model parameters: {0}")]
    ModelLoad(String),

    #[error("scoring failed: {0}")]
    Scoring(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub is_anomaly: bool,
}

/// Narrow contract the verification coordinator consumes.
pub trait AnomalyClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<Classification, ClassifierError>;
}

/// Movement-plausibility model. Parameters come from a JSON file so the
/// thresholds can be retuned without a rebuild.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdModel {
    /// Implied speeds above this are anomalous outright.
    pub max_speed_kmh: f64,

    /// Jumps longer than this within `suspicious_window_seconds` are
    /// anomalous even below the speed ceiling.
    pub max_jump_km: f64,

    pub suspicious_window_seconds: f64,
}

impl ThresholdModel {
    /// Load model parameters from disk. Called once at startup; the server
    /// refuses to start without a usable model.
    pub fn load(path: &str) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", path, e)))?;

        let model: ThresholdModel = serde_json::from_str(&raw)
            .map_err(|e| ClassifierError::ModelLoad(format!("{}: {}", path, e)))?;

        if model.max_speed_kmh <= 0.0 || model.max_jump_km <= 0.0 {
            return Err(ClassifierError::ModelLoad(
                "thresholds must be positive".to_string(),
            ));
        }

        tracing::info!("Anomaly model loaded from {}", path);
        Ok(model)
    }
}

impl AnomalyClassifier for ThresholdModel {
    fn classify(&self, features: &FeatureVector) -> Result<Classification, ClassifierError> {
        if !features.speed_kmh.is_finite() || !features.distance_km.is_finite() {
            return Err(ClassifierError::Scoring(
                "non-finite feature value".to_string(),
            ));
        }

        let impossible_speed = features.speed_kmh > self.max_speed_kmh;
        let suspicious_jump = features.distance_km > self.max_jump_km
            && features.time_diff_seconds < self.suspicious_window_seconds;

        Ok(Classification {
            is_anomaly: impossible_speed || suspicious_jump,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ThresholdModel {
        ThresholdModel {
            max_speed_kmh: 900.0,
            max_jump_km: 500.0,
            suspicious_window_seconds: 3600.0,
        }
    }

    fn features(time_diff: f64, distance: f64, speed: f64) -> FeatureVector {
        FeatureVector {
            latitude: 0.0,
            longitude: 0.0,
            time_diff_seconds: time_diff,
            distance_km: distance,
            speed_kmh: speed,
        }
    }

    #[test]
    fn test_cold_start_is_not_anomalous() {
        let verdict = model().classify(&features(0.0, 0.0, 0.0)).unwrap();
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn test_impossible_speed_is_anomalous() {
        let verdict = model().classify(&features(600.0, 2000.0, 12000.0)).unwrap();
        assert!(verdict.is_anomaly);
    }

    #[test]
    fn test_plausible_movement_is_normal() {
        // 80 km in two hours
        let verdict = model().classify(&features(7200.0, 80.0, 40.0)).unwrap();
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn test_long_jump_in_short_window_is_anomalous() {
        // 600 km in 50 minutes: under the speed ceiling, over the jump limit
        let verdict = model().classify(&features(3000.0, 600.0, 720.0)).unwrap();
        assert!(verdict.is_anomaly);
    }

    #[test]
    fn test_non_finite_features_error() {
        let result = model().classify(&features(0.0, f64::NAN, f64::INFINITY));
        assert!(result.is_err());
    }

    #[test]
    fn test_parameters_parse_from_json() {
        let raw = r#"{"max_speed_kmh": 900.0, "max_jump_km": 500.0, "suspicious_window_seconds": 3600.0}"#;
        let model: ThresholdModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.max_speed_kmh, 900.0);
        assert_eq!(model.max_jump_km, 500.0);
    }
}
