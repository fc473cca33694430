//! Optional feature-importance artifact exported by the offline training job.
//!
//! The directory holds three JSON files: the fitted estimator's importances,
//! the ordered feature names, and the categorical encoders. Nothing here
//! trains or scores; the artifact is only displayed.

use crate::error::{CampaignError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ESTIMATOR_FILE: &str = "campaign_model.json";
pub const FEATURES_FILE: &str = "features.json";
pub const ENCODERS_FILE: &str = "encoders.json";

#[derive(Debug, Clone, Deserialize)]
struct Estimator {
    feature_importances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub weights: Vec<FeatureWeight>,
    pub encoders: BTreeMap<String, Vec<String>>,
}

impl ModelArtifact {
    /// The `n` most important features, least important first.
    pub fn top_features(&self, n: usize) -> Vec<FeatureWeight> {
        let mut w = self.weights.clone();
        w.sort_by(|a, b| {
            a.importance
                .partial_cmp(&b.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let skip = w.len().saturating_sub(n);
        w.split_off(skip)
    }
}

fn unavailable(path: &Path, reason: impl ToString) -> CampaignError {
    CampaignError::ModelUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path: PathBuf = dir.join(name);
    let text = std::fs::read_to_string(&path).map_err(|e| unavailable(&path, e))?;
    serde_json::from_str(&text).map_err(|e| unavailable(&path, e))
}

/// Load the artifact from `dir`. Every failure maps to
/// [`CampaignError::ModelUnavailable`] so callers can degrade gracefully.
pub fn load_model(dir: &Path) -> Result<ModelArtifact> {
    let estimator: Estimator = read_json(dir, ESTIMATOR_FILE)?;
    let features: Vec<String> = read_json(dir, FEATURES_FILE)?;
    let encoders: BTreeMap<String, Vec<String>> = read_json(dir, ENCODERS_FILE)?;

    if features.len() != estimator.feature_importances.len() {
        return Err(unavailable(
            dir,
            format!(
                "{} feature names for {} importances",
                features.len(),
                estimator.feature_importances.len()
            ),
        ));
    }
    if let Some(bad) = estimator.feature_importances.iter().find(|v| !v.is_finite()) {
        return Err(unavailable(dir, format!("non-finite importance {bad}")));
    }

    let weights = features
        .into_iter()
        .zip(estimator.feature_importances)
        .map(|(feature, importance)| FeatureWeight { feature, importance })
        .collect();
    Ok(ModelArtifact { weights, encoders })
}
