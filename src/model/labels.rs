//! Label decoding
//!
//! Maps the classifier's class indices to outcome labels. Stored as data in
//! the persisted bundle rather than assumed by convention, so a model
//! trained against a different class order cannot be decoded silently
//! wrong.

use serde::{Deserialize, Serialize};

use crate::model::classifier::N_CLASSES;
use crate::{FootyError, MatchResult, Result};

/// Ordered label table: `labels[i]` names class index `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelDecoder {
    labels: Vec<String>,
}

impl LabelDecoder {
    /// The class order used by the trainer: home, draw, away. Matches
    /// [`MatchResult::class_index`].
    pub fn canonical() -> Self {
        LabelDecoder {
            labels: vec![
                MatchResult::Home.as_str().to_string(),
                MatchResult::Draw.as_str().to_string(),
                MatchResult::Away.as_str().to_string(),
            ],
        }
    }

    /// Check the table names exactly the three known outcomes.
    pub fn validate(&self) -> Result<()> {
        if self.labels.len() != N_CLASSES {
            return Err(FootyError::FeatureContract(format!(
                "label decoder has {} entries, expected {}",
                self.labels.len(),
                N_CLASSES
            )));
        }
        for expected in ["home", "draw", "away"] {
            if !self.labels.iter().any(|l| l == expected) {
                return Err(FootyError::FeatureContract(format!(
                    "label decoder is missing '{}'",
                    expected
                )));
            }
        }
        Ok(())
    }

    /// Pair each class probability with its label.
    pub fn decode<'a>(&'a self, probs: &[f32; N_CLASSES]) -> Vec<(&'a str, f32)> {
        self.labels
            .iter()
            .zip(probs.iter())
            .map(|(label, p)| (label.as_str(), *p))
            .collect()
    }

    /// Probability for one label, 0.0 if the table lacks it.
    pub fn probability_of(&self, probs: &[f32; N_CLASSES], label: &str) -> f32 {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| probs[i])
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let decoder = LabelDecoder::canonical();
        decoder.validate().unwrap();
        let decoded = decoder.decode(&[0.5, 0.3, 0.2]);
        assert_eq!(decoded[0], ("home", 0.5));
        assert_eq!(decoded[1], ("draw", 0.3));
        assert_eq!(decoded[2], ("away", 0.2));
    }

    #[test]
    fn test_noncanonical_order_still_decodes() {
        // A decoder persisted with a different class order maps correctly
        let decoder = LabelDecoder {
            labels: vec!["away".into(), "draw".into(), "home".into()],
        };
        decoder.validate().unwrap();
        assert_eq!(decoder.probability_of(&[0.7, 0.2, 0.1], "away"), 0.7);
        assert_eq!(decoder.probability_of(&[0.7, 0.2, 0.1], "home"), 0.1);
    }

    #[test]
    fn test_validate_rejects_bad_table() {
        let decoder = LabelDecoder {
            labels: vec!["home".into(), "draw".into(), "tie".into()],
        };
        assert!(decoder.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let decoder = LabelDecoder::canonical();
        let json = serde_json::to_string(&decoder).unwrap();
        let back: LabelDecoder = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back.probability_of(&[0.1, 0.2, 0.7], "away"), 0.7);
    }
}
