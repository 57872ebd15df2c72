//! Feature projection and scaling
//!
//! The projector defines the one canonical feature vector shape shared by
//! training and inference. The order below is a versioned contract: the
//! persisted bundle records it and the registry refuses to load a bundle
//! that disagrees, so ordering drift is caught at load time rather than
//! surfacing as silently wrong probabilities.

use serde::{Deserialize, Serialize};

use super::form::{FormWindow, TrainingRow};

/// Number of features fed to the classifier.
pub const FEATURE_DIM: usize = 4;

/// Bump when FEATURE_ORDER or the projection semantics change.
pub const FEATURE_VERSION: u32 = 1;

/// Canonical feature order.
pub const FEATURE_ORDER: [&str; FEATURE_DIM] = [
    "home_avg_goals",
    "away_avg_goals",
    "home_avg_points",
    "away_avg_points",
];

/// Project a pair of form windows into the classifier's feature vector.
/// Pure function; the only place feature order is defined.
pub fn project(home: &FormWindow, away: &FormWindow) -> [f32; FEATURE_DIM] {
    [
        home.avg_goals(),
        away.avg_goals(),
        home.avg_points(),
        away.avg_points(),
    ]
}

/// Per-feature z-score parameters, fit on training rows and applied
/// identically at inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: [f32; FEATURE_DIM],
    pub std: [f32; FEATURE_DIM],
}

impl FeatureScaler {
    /// No-op scaler (zero mean, unit variance).
    pub fn identity() -> Self {
        FeatureScaler {
            mean: [0.0; FEATURE_DIM],
            std: [1.0; FEATURE_DIM],
        }
    }

    /// Fit mean and std per feature. Std is floored to keep constant
    /// features from dividing by zero.
    pub fn fit(rows: &[TrainingRow]) -> Self {
        if rows.is_empty() {
            return Self::identity();
        }

        let n = rows.len() as f32;
        let mut mean = [0.0f32; FEATURE_DIM];
        let mut sum_sq = [0.0f32; FEATURE_DIM];
        for row in rows {
            for j in 0..FEATURE_DIM {
                mean[j] += row.features[j];
                sum_sq[j] += row.features[j] * row.features[j];
            }
        }
        for j in 0..FEATURE_DIM {
            mean[j] /= n;
        }

        let mut std = [0.0f32; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            std[j] = (sum_sq[j] / n - mean[j] * mean[j]).max(0.0).sqrt().max(1e-3);
        }

        FeatureScaler { mean, std }
    }

    /// z-score: (x - mean) / std
    pub fn apply(&self, features: [f32; FEATURE_DIM]) -> [f32; FEATURE_DIM] {
        let mut out = [0.0f32; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            out[j] = (features[j] - self.mean[j]) / self.std[j];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::form::{FormEntry, NEUTRAL_AVG_POINTS};
    use crate::MatchResult;

    #[test]
    fn test_projection_order() {
        let mut home = FormWindow::new(5);
        home.push(FormEntry { goals_for: 2, points: 3 });
        home.push(FormEntry { goals_for: 0, points: 0 });
        let away = FormWindow::new(5);

        let v = project(&home, &away);
        assert_eq!(v[0], 1.0); // home_avg_goals
        assert_eq!(v[1], 0.0); // away_avg_goals (unseen)
        assert_eq!(v[2], 1.5); // home_avg_points
        assert_eq!(v[3], NEUTRAL_AVG_POINTS); // away_avg_points (unseen)
    }

    #[test]
    fn test_scaler_fit_and_apply() {
        let rows = vec![
            TrainingRow { features: [0.0, 0.0, 0.0, 0.0], target: MatchResult::Draw },
            TrainingRow { features: [2.0, 4.0, 2.0, 2.0], target: MatchResult::Home },
        ];
        let scaler = FeatureScaler::fit(&rows);
        assert_eq!(scaler.mean, [1.0, 2.0, 1.0, 1.0]);

        let scaled = scaler.apply([1.0, 2.0, 1.0, 1.0]);
        for v in scaled {
            assert!(v.abs() < 1e-6);
        }
    }

    #[test]
    fn test_scaler_constant_feature() {
        let rows = vec![
            TrainingRow { features: [1.0, 1.0, 1.0, 1.0], target: MatchResult::Draw };
            4
        ];
        let scaler = FeatureScaler::fit(&rows);
        // Constant feature: std floored, apply stays finite
        let scaled = scaler.apply([1.0, 1.0, 1.0, 1.0]);
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_contract_constants() {
        assert_eq!(FEATURE_ORDER.len(), FEATURE_DIM);
        assert_eq!(FEATURE_ORDER[0], "home_avg_goals");
        assert_eq!(FEATURE_ORDER[3], "away_avg_points");
    }
}
