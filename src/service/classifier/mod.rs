//! Intent classification and the triage decision.
//!
//! The `GenericClassifier` trait is the seam between the service and whatever
//! produced the model artifacts. The default implementation is a TF-IDF
//! vectorizer feeding a logistic regression, loaded from JSON artifacts.

pub mod linear;

use std::{ops::Deref, sync::Arc};

use tracing::{debug, instrument};

use crate::base::{
    error::TriageError,
    types::{ClassScore, Triage, TriageResult},
};

// Traits.

/// Generic classifier trait that scorers must implement.
///
/// Implementations are immutable once constructed and are shared across all
/// request handlers without locking.
pub trait GenericClassifier: Send + Sync + 'static {
    /// Score `text` against every known class.
    ///
    /// The returned scores follow the classifier's stable class ordering and
    /// are probabilities that sum to one.
    fn score(&self, text: &str) -> TriageResult<Vec<ClassScore>>;
}

// Structs.

/// Classifier client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ClassifierClient {
    inner: Arc<dyn GenericClassifier>,
}

impl Deref for ClassifierClient {
    type Target = dyn GenericClassifier;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ClassifierClient {
    pub fn new(inner: Arc<dyn GenericClassifier>) -> Self {
        Self { inner }
    }

    /// Score `text` and decide whether it needs human review.
    #[instrument(name = "ClassifierClient::triage", skip(self, text))]
    pub fn triage(&self, text: &str, threshold: f64) -> TriageResult<Triage> {
        let scores = self.score(text)?;
        let triage = decide(&scores, threshold)?;

        debug!("Classified as `{}` ({:.3}), triage required: {}.", triage.label, triage.confidence, triage.triage_required);

        Ok(triage)
    }
}

/// Pick the most probable class and apply the confidence threshold.
///
/// Ties go to the first class in scoring order.
pub fn decide(scores: &[ClassScore], threshold: f64) -> TriageResult<Triage> {
    let mut best: Option<&ClassScore> = None;

    for score in scores {
        if !score.probability.is_finite() || !(0.0..=1.0).contains(&score.probability) {
            return Err(TriageError::inference(format!("invalid probability {} for class `{}`", score.probability, score.label)));
        }

        if best.is_none_or(|b| score.probability > b.probability) {
            best = Some(score);
        }
    }

    let best = best.ok_or_else(|| TriageError::inference("classifier returned no classes"))?;

    Ok(Triage {
        label: best.label.clone(),
        confidence: best.probability,
        triage_required: best.probability < threshold,
    })
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(&str, f64)]) -> Vec<ClassScore> {
        values.iter().map(|(l, p)| ClassScore::new(*l, *p)).collect()
    }

    struct FixedClassifier(Vec<ClassScore>);

    impl GenericClassifier for FixedClassifier {
        fn score(&self, _text: &str) -> TriageResult<Vec<ClassScore>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_decide_picks_max_probability() {
        let triage = decide(&scores(&[("billing", 0.05), ("booking", 0.92), ("other", 0.03)]), 0.7).unwrap();

        assert_eq!(triage.label, "booking");
        assert_eq!(triage.confidence, 0.92);
        assert!(!triage.triage_required);
    }

    #[test]
    fn test_decide_threshold_boundary_is_exclusive() {
        let at = decide(&scores(&[("a", 0.7), ("b", 0.3)]), 0.7).unwrap();
        let below = decide(&scores(&[("a", 0.6999), ("b", 0.3001)]), 0.7).unwrap();

        assert!(!at.triage_required);
        assert!(below.triage_required);
    }

    #[test]
    fn test_decide_uses_unrounded_confidence_for_threshold() {
        let triage = decide(&scores(&[("a", 0.6996), ("b", 0.3004)]), 0.7).unwrap();

        assert!(triage.triage_required);
        assert_eq!(triage.reported_confidence(), 0.7);
    }

    #[test]
    fn test_decide_breaks_ties_by_class_order() {
        let triage = decide(&scores(&[("complaint", 0.4), ("refund", 0.4), ("other", 0.2)]), 0.7).unwrap();

        assert_eq!(triage.label, "complaint");
    }

    #[test]
    fn test_decide_rejects_empty_scores() {
        let result = decide(&[], 0.7);

        assert!(matches!(result, Err(TriageError::Inference(_))));
    }

    #[test]
    fn test_decide_rejects_non_finite_probability() {
        let result = decide(&scores(&[("a", f64::NAN), ("b", 0.5)]), 0.7);

        assert!(matches!(result, Err(TriageError::Inference(_))));
    }

    #[test]
    fn test_client_triage_delegates_to_classifier() {
        let client = ClassifierClient::new(Arc::new(FixedClassifier(scores(&[("booking", 0.41), ("billing", 0.59)]))));

        let triage = client.triage("where is my invoice", 0.7).unwrap();

        assert_eq!(triage.label, "billing");
        assert!(triage.triage_required);
    }
}
