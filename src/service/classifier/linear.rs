//! TF-IDF + logistic regression classifier loaded from JSON artifacts.
//!
//! The artifacts are produced offline by the training pipeline. This module
//! only knows how to turn text into a sparse TF-IDF vector and how to turn
//! that vector into class probabilities.

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use serde::{Deserialize, de::DeserializeOwned};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    error::TriageError,
    types::{ClassScore, TriageResult},
};

use super::{ClassifierClient, GenericClassifier};

// Extra methods on `ClassifierClient` applied by the linear implementation.

impl ClassifierClient {
    /// Loads the vectorizer and model artifacts named in the configuration.
    pub fn linear(config: &Config) -> TriageResult<Self> {
        let classifier = LinearClassifier::load(&config.vectorizer_path, &config.model_path)?;
        Ok(Self { inner: Arc::new(classifier) })
    }
}

impl From<LinearClassifier> for ClassifierClient {
    fn from(classifier: LinearClassifier) -> Self {
        Self { inner: Arc::new(classifier) }
    }
}

// Artifacts.

/// Vector normalization applied after TF-IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_lowercase() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// A fitted TF-IDF vectorizer.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfVectorizer {
    /// Term (or space-joined n-gram) to column index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

/// How per-class decision values become probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    #[default]
    Multinomial,
    Ovr,
}

/// A fitted logistic regression.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    /// Class labels in the model's stable ordering.
    pub classes: Vec<String>,
    /// One row per class (a single row for binary models).
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub multi_class: MultiClass,
}

/// Sparse feature vector: (column, weight).
type SparseVector = Vec<(usize, f64)>;

impl TfidfVectorizer {
    /// Number of feature columns.
    pub fn width(&self) -> usize {
        self.idf.len()
    }

    fn validate(&self) -> TriageResult<()> {
        let (min_n, max_n) = self.ngram_range;

        if min_n == 0 || min_n > max_n {
            return Err(TriageError::model_unavailable(format!("invalid ngram range ({min_n}, {max_n})")));
        }

        if let Some((term, column)) = self.vocabulary.iter().find(|(_, column)| **column >= self.width()) {
            return Err(TriageError::model_unavailable(format!("vocabulary term `{term}` maps to column {column} beyond idf width {}", self.width())));
        }

        Ok(())
    }

    /// Splits text into word tokens of two or more characters.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase { text.to_lowercase() } else { text.to_string() };

        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .map(str::to_string)
            .collect()
    }

    /// Produces the weighted, normalized sparse vector for `text`.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;

        let mut counts: HashMap<usize, f64> = HashMap::new();

        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                if let Some(column) = self.vocabulary.get(&window.join(" ")) {
                    *counts.entry(*column).or_default() += 1.0;
                }
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(column, count)| {
                let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
                (column, tf * self.idf[column])
            })
            .collect();

        vector.sort_by_key(|(column, _)| *column);

        let length = match self.norm {
            Some(Norm::L2) => vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Some(Norm::L1) => vector.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            None => 0.0,
        };

        if length > 0.0 {
            for (_, weight) in vector.iter_mut() {
                *weight /= length;
            }
        }

        vector
    }
}

impl LogisticRegression {
    fn validate(&self, width: usize) -> TriageResult<()> {
        if self.classes.len() < 2 {
            return Err(TriageError::model_unavailable("classifier must know at least two classes"));
        }

        let expected_rows = if self.classes.len() == 2 { 1 } else { self.classes.len() };

        if self.coef.len() != expected_rows && self.coef.len() != self.classes.len() {
            return Err(TriageError::model_unavailable(format!("expected {expected_rows} coefficient rows, found {}", self.coef.len())));
        }

        if self.intercept.len() != self.coef.len() {
            return Err(TriageError::model_unavailable(format!("expected {} intercepts, found {}", self.coef.len(), self.intercept.len())));
        }

        if let Some(row) = self.coef.iter().find(|row| row.len() != width) {
            return Err(TriageError::model_unavailable(format!("coefficient row has {} columns, vectorizer has {width}", row.len())));
        }

        Ok(())
    }

    /// Per-row linear decision values.
    fn decision_function(&self, x: &[(usize, f64)]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, intercept)| intercept + x.iter().map(|(column, weight)| row[*column] * weight).sum::<f64>())
            .collect()
    }

    /// Class probabilities in `classes` order.
    pub fn predict_proba(&self, x: &[(usize, f64)]) -> Vec<f64> {
        let decision = self.decision_function(x);

        if decision.len() == 1 {
            let positive = sigmoid(decision[0]);
            return vec![1.0 - positive, positive];
        }

        match self.multi_class {
            MultiClass::Multinomial => softmax(&decision),
            MultiClass::Ovr => {
                let raw: Vec<f64> = decision.iter().copied().map(sigmoid).collect();
                let total: f64 = raw.iter().sum();
                raw.iter().map(|p| p / total).collect()
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();

    exps.iter().map(|e| e / total).collect()
}

// Specific implementations.

/// Linear text classifier backed by a vectorizer and a logistic regression.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    vectorizer: TfidfVectorizer,
    model: LogisticRegression,
}

impl LinearClassifier {
    /// Pairs a vectorizer with a model after checking their shapes agree.
    pub fn new(vectorizer: TfidfVectorizer, model: LogisticRegression) -> TriageResult<Self> {
        vectorizer.validate()?;
        model.validate(vectorizer.width())?;

        Ok(Self { vectorizer, model })
    }

    /// Load both artifacts from disk.
    #[instrument(name = "LinearClassifier::load", skip_all, fields(vectorizer = %vectorizer_path.display(), model = %model_path.display()))]
    pub fn load(vectorizer_path: &Path, model_path: &Path) -> TriageResult<Self> {
        let vectorizer: TfidfVectorizer = read_artifact(vectorizer_path)?;
        let model: LogisticRegression = read_artifact(model_path)?;

        let classifier = Self::new(vectorizer, model)?;

        info!("Loaded classifier with {} features and classes {:?}.", classifier.vectorizer.width(), classifier.model.classes);

        Ok(classifier)
    }

    pub fn classes(&self) -> &[String] {
        &self.model.classes
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> TriageResult<T> {
    let raw = fs::read_to_string(path).map_err(|e| TriageError::model_unavailable(format!("cannot read `{}`: {e}", path.display())))?;

    serde_json::from_str(&raw).map_err(|e| TriageError::model_unavailable(format!("cannot parse `{}`: {e}", path.display())))
}

impl GenericClassifier for LinearClassifier {
    fn score(&self, text: &str) -> TriageResult<Vec<ClassScore>> {
        let x = self.vectorizer.transform(text);
        let probabilities = self.model.predict_proba(&x);

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(TriageError::inference("model produced non-finite probabilities"));
        }

        Ok(self.model.classes.iter().zip(probabilities).map(|(label, p)| ClassScore::new(label.clone(), p)).collect())
    }
}

// Tests.
