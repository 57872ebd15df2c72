//! Softmax regression classifier
//!
//! A single linear layer over the projected form features; softmax of the
//! logits gives the {home, draw, away} distribution. Deliberately small:
//! the predictor sits behind the feature contract and can be swapped for a
//! deeper net without touching the serving layer.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::projector::FEATURE_DIM;
use crate::{FootyError, Result};

/// Number of outcome classes: home, draw, away.
pub const N_CLASSES: usize = 3;

/// Linear(4 -> 3) outcome classifier.
#[derive(Module, Debug)]
pub struct OutcomeNet<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> OutcomeNet<B> {
    pub fn new(device: &B::Device) -> Self {
        OutcomeNet {
            linear: LinearConfig::new(FEATURE_DIM, N_CLASSES).init(device),
        }
    }

    /// Forward pass: [batch, FEATURE_DIM] -> logits [batch, N_CLASSES]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(features)
    }

    /// Extract the fitted weights into a plain-array serving classifier.
    pub fn export(&self) -> Result<ServingClassifier> {
        let weight: Vec<f32> = self
            .linear
            .weight
            .val()
            .into_data()
            .to_vec()
            .map_err(|e| FootyError::Parse(format!("weight readback failed: {:?}", e)))?;
        let bias: Vec<f32> = match &self.linear.bias {
            Some(b) => b
                .val()
                .into_data()
                .to_vec()
                .map_err(|e| FootyError::Parse(format!("bias readback failed: {:?}", e)))?,
            None => vec![0.0; N_CLASSES],
        };
        if weight.len() != FEATURE_DIM * N_CLASSES || bias.len() != N_CLASSES {
            return Err(FootyError::Parse(format!(
                "unexpected layer shape: {} weights, {} biases",
                weight.len(),
                bias.len()
            )));
        }

        let mut weights = [[0.0f32; N_CLASSES]; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            for k in 0..N_CLASSES {
                weights[j][k] = weight[j * N_CLASSES + k];
            }
        }
        Ok(ServingClassifier {
            weights,
            bias: [bias[0], bias[1], bias[2]],
        })
    }

    /// Save model weights to file
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| FootyError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load model weights from file
    pub fn load(device: &B::Device, path: &str) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| FootyError::Io(std::io::Error::other(e.to_string())))?;

        let model = Self::new(device);
        Ok(model.load_record(record))
    }
}

/// Fitted weights flattened to plain arrays for serving.
///
/// Inference is a 4x3 affine map plus softmax, so request handlers can hold
/// this in shared state without any tensor machinery. Burn's lazy tensor
/// internals are not `Sync`; this type is.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingClassifier {
    /// `weights[j][k]`: contribution of feature `j` to class `k`
    pub weights: [[f32; N_CLASSES]; FEATURE_DIM],
    pub bias: [f32; N_CLASSES],
}

impl ServingClassifier {
    /// Zero-weight classifier: every input maps to the uniform distribution.
    pub fn uniform() -> Self {
        ServingClassifier {
            weights: [[0.0; N_CLASSES]; FEATURE_DIM],
            bias: [0.0; N_CLASSES],
        }
    }

    /// Class probabilities for one (already scaled) feature vector.
    pub fn probabilities(&self, features: [f32; FEATURE_DIM]) -> [f32; N_CLASSES] {
        let mut logits = self.bias;
        for (j, row) in self.weights.iter().enumerate() {
            for (k, w) in row.iter().enumerate() {
                logits[k] += features[j] * w;
            }
        }

        // Max-shifted softmax for numerical stability
        let max = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let mut probs = [0.0f32; N_CLASSES];
        let mut sum = 0.0f32;
        for (k, &logit) in logits.iter().enumerate() {
            let e = (logit - max).exp();
            probs[k] = e;
            sum += e;
        }
        for p in probs.iter_mut() {
            *p /= sum;
        }
        probs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::activation::softmax;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device);
        let input = Tensor::random(
            [4, FEATURE_DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [4, N_CLASSES]);
    }

    #[test]
    fn test_export_matches_forward() {
        let device = Default::default();
        let model = OutcomeNet::<TestBackend>::new(&device);
        let serving = model.export().unwrap();

        let features = [1.2f32, 0.8, 1.6, 1.0];
        let input = Tensor::<TestBackend, 1>::from_floats(features.as_slice(), &device)
            .reshape([1, FEATURE_DIM]);
        let expected: Vec<f32> = softmax(model.forward(input), 1)
            .into_data()
            .to_vec()
            .unwrap();

        let got = serving.probabilities(features);
        for (g, e) in got.iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-5, "{} vs {}", g, e);
        }
    }

    #[test]
    fn test_serving_probabilities_sum_to_one() {
        let serving = ServingClassifier {
            weights: [[0.4, -0.2, 0.1]; FEATURE_DIM],
            bias: [0.1, 0.0, -0.3],
        };
        let probs = serving.probabilities([1.2, 0.8, 1.6, 1.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum = {}", sum);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_serving_uniform_on_zero_weights() {
        let serving = ServingClassifier::uniform();
        let probs = serving.probabilities([3.0, 0.0, 2.5, 1.3]);
        for p in probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_serving_deterministic() {
        let device = Default::default();
        let serving = OutcomeNet::<TestBackend>::new(&device).export().unwrap();
        let a = serving.probabilities([0.5, 0.5, 1.3, 1.3]);
        let b = serving.probabilities([0.5, 0.5, 1.3, 1.3]);
        assert_eq!(a, b);
    }
}
