use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::score::PlattCalibration;

/// One model endpoint the verifier can talk to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub name: String,
    pub display_name: String,
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding models take the classifier path; everything else is
    /// treated as a generative verifier.
    #[serde(default)]
    pub is_embedding_model: bool,
    /// Optional Platt scaling for the classifier path.
    #[serde(default)]
    pub calibration: Option<PlattCalibration>,
}

/// The model registry, usually loaded from a JSON file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Models {
    pub models: Vec<ModelConfig>,
}

impl Models {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model config {}", path.display()))?;
        let models: Models = serde_json::from_str(&raw)
            .with_context(|| format!("parsing model config {}", path.display()))?;
        Ok(models)
    }

    /// Resolves a model by name; `None` selects the first configured model.
    pub fn get(&self, name: Option<&str>) -> Option<&ModelConfig> {
        match name {
            Some(name) => self.models.iter().find(|m| m.name == name),
            None => self.models.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_parses_and_resolves() {
        let raw = r#"{
            "models": [
                {"name": "verifier-8b", "displayName": "Verifier 8B",
                 "apiUrl": "https://example.test/v1/chat/completions"},
                {"name": "verifier-classifier", "displayName": "Verifier Classifier",
                 "apiUrl": "https://example.test/v1/embeddings",
                 "isEmbeddingModel": true,
                 "calibration": {"a": 1.5, "b": -0.25}}
            ]
        }"#;
        let models: Models = serde_json::from_str(raw).unwrap();
        assert_eq!(models.get(None).unwrap().name, "verifier-8b");
        let classifier = models.get(Some("verifier-classifier")).unwrap();
        assert!(classifier.is_embedding_model);
        assert!(classifier.api_key.is_none());
        assert_eq!(classifier.calibration.unwrap().a, 1.5);
        assert!(models.get(Some("missing")).is_none());
    }
}
