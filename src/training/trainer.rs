//! Classifier training
//!
//! Full-batch SGD softmax regression over the form feature rows, with a
//! chronological train/validation split so validation always post-dates
//! training.

use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use crate::features::form::TrainingRow;
use crate::features::projector::{FeatureScaler, FEATURE_DIM};
use crate::model::classifier::N_CLASSES;
use crate::model::{LabelDecoder, OutcomeNet};
use crate::training::metrics::{self, Metrics};
use crate::{FootyError, Result, TrainingConfig};

/// Fewest feature rows worth fitting a classifier on.
const MIN_TRAINING_ROWS: usize = 10;

/// Summary of one training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub train_samples: usize,
    pub val_samples: usize,
    pub final_loss: f32,
    pub train_metrics: Metrics,
    pub val_metrics: Metrics,
}

/// Train the outcome classifier on chronological feature rows.
///
/// Returns the fitted model together with the scaler and label decoder that
/// must travel with it in the persisted bundle.
pub fn train_classifier<B: AutodiffBackend>(
    device: &B::Device,
    rows: &[TrainingRow],
    config: &TrainingConfig,
) -> Result<(OutcomeNet<B>, FeatureScaler, LabelDecoder, TrainReport)> {
    if rows.len() < MIN_TRAINING_ROWS {
        return Err(FootyError::Config(format!(
            "Not enough training data: {} rows, need at least {}",
            rows.len(),
            MIN_TRAINING_ROWS
        )));
    }

    // Chronological split: the tail is validation
    let n_val = ((rows.len() as f32) * config.validation_split).round() as usize;
    let n_val = n_val.min(rows.len() / 2);
    let (train_rows, val_rows) = rows.split_at(rows.len() - n_val);

    // Scaler is fit on the training portion only
    let scaler = FeatureScaler::fit(train_rows);

    let (x_train, y_train, train_targets) = to_tensors::<B>(train_rows, &scaler, device);
    let (x_val, _, val_targets) = to_tensors::<B>(val_rows, &scaler, device);

    let mut model = OutcomeNet::<B>::new(device);
    let mut optimizer = SgdConfig::new().init();

    log::info!(
        "Training on {} samples ({} validation) for {} epochs, lr={}",
        train_rows.len(),
        val_rows.len(),
        config.epochs,
        config.learning_rate
    );

    let mut final_loss = 0.0f32;
    for epoch in 0..config.epochs {
        let logits = model.forward(x_train.clone());
        let probs = softmax(logits, 1);

        let loss = cross_entropy(probs.clone(), y_train.clone());
        final_loss = loss.clone().into_scalar().elem();

        let grads = loss.backward();
        let grads_params = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(config.learning_rate, model, grads_params);

        if epoch % 10 == 0 || epoch == config.epochs - 1 {
            let train_acc = accuracy_of(&probs_to_vec(probs), &train_targets);
            log::info!(
                "Epoch {}/{}: loss={:.4}, train_acc={:.1}%",
                epoch + 1,
                config.epochs,
                final_loss,
                train_acc * 100.0
            );
        }
    }

    // Final evaluation on both splits
    let train_probs = probs_to_vec(softmax(model.forward(x_train), 1));
    let train_metrics = metrics::evaluate(&train_probs, &train_targets, N_CLASSES);
    let val_probs = probs_to_vec(softmax(model.forward(x_val), 1));
    let val_metrics = metrics::evaluate(&val_probs, &val_targets, N_CLASSES);

    let report = TrainReport {
        train_samples: train_rows.len(),
        val_samples: val_rows.len(),
        final_loss,
        train_metrics,
        val_metrics,
    };

    Ok((model, scaler, LabelDecoder::canonical(), report))
}

/// Multi-class cross-entropy over clamped probabilities.
fn cross_entropy<B: AutodiffBackend>(
    probs: Tensor<B, 2>,
    targets_one_hot: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let clamped = probs.clamp(eps, 1.0 - eps);
    (targets_one_hot * clamped.log()).sum_dim(1).mean().neg()
}

/// Build scaled feature and one-hot target tensors plus raw class indices.
fn to_tensors<B: AutodiffBackend>(
    rows: &[TrainingRow],
    scaler: &FeatureScaler,
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 2>, Vec<usize>) {
    let n = rows.len().max(1);
    let mut x = Vec::with_capacity(n * FEATURE_DIM);
    let mut y = vec![0.0f32; n * N_CLASSES];
    let mut targets = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        x.extend_from_slice(&scaler.apply(row.features));
        let class = row.target.class_index();
        y[i * N_CLASSES + class] = 1.0;
        targets.push(class);
    }
    // Keep tensor shapes valid for an empty validation split
    if rows.is_empty() {
        x = vec![0.0; FEATURE_DIM];
    }

    let x_tensor = Tensor::<B, 1>::from_floats(x.as_slice(), device).reshape([n, FEATURE_DIM]);
    let y_tensor = Tensor::<B, 1>::from_floats(y.as_slice(), device).reshape([n, N_CLASSES]);
    (x_tensor, y_tensor, targets)
}

fn probs_to_vec<B: AutodiffBackend>(probs: Tensor<B, 2>) -> Vec<f32> {
    probs.into_data().to_vec().unwrap_or_default()
}

fn accuracy_of(probs: &[f32], targets: &[usize]) -> f32 {
    if targets.is_empty() {
        return 0.0;
    }
    let correct = targets
        .iter()
        .enumerate()
        .filter(|(i, &t)| metrics::argmax(&probs[i * N_CLASSES..(i + 1) * N_CLASSES]) == t)
        .count();
    correct as f32 / targets.len() as f32
}
