/**
The evaluator is the engine instance of one evaluation run. It parses the gold lines once, owns the
resulting record store and answers every metric query against it. Two evaluators never share any
state, so two runs can be evaluated side by side.
*/
use crate::align::{align, check_consistent_length, Aligned, PredictionRecord, SizeMismatchError};
use crate::config::EvalConfig;
use crate::metrics::{accuracy, analyse_f1, PrecisionRecallF1};
use crate::predictor::{collect_predictions, Predictor};
use crate::reporter::{format_prediction_line, McNemarResult, MetricsReport};
use crate::stats::mcnemar;
use crate::store::RecordStore;
use std::error::Error;
use std::fmt::{self, Display};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing the failures of an evaluation run.
pub enum EvalError {
    /// The number of predictions differs from the number of gold records.
    SizeMismatch(SizeMismatchError),
    /// The normal quantile of the interval is not a finite positive number.
    InvalidConfidence(f64),
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch(size_err) => Display::fmt(size_err, f),
            Self::InvalidConfidence(z) => write!(
                f,
                "Invalid interval quantile {}: it must be finite and positive",
                z
            ),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SizeMismatch(size_err) => Some(size_err),
            Self::InvalidConfidence(_) => None,
        }
    }
}

impl From<SizeMismatchError> for EvalError {
    fn from(value: SizeMismatchError) -> Self {
        Self::SizeMismatch(value)
    }
}

/// Engine instance of one evaluation run.
///
/// ```rust
/// use nereval::{Category, EvalConfig, Evaluator, PredictionRecord};
///
/// let evaluator = Evaluator::new(
///     ["The capital of [Paris_{LOC}] is nice.", "Nothing here."],
///     EvalConfig::default(),
/// )
/// .unwrap();
/// let predictions = vec![
///     PredictionRecord::new(0, vec![Category::LOCATION]),
///     PredictionRecord::new(1, vec![]),
/// ];
/// assert_eq!(evaluator.accuracy(&predictions).unwrap(), 1.0);
/// assert!(evaluator.accuracy(&predictions[..1]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    config: EvalConfig,
    store: RecordStore,
}

impl Evaluator {
    /// Parses the gold lines (in LLM mode if the config asks for it) and builds the evaluator.
    pub fn new<I, S>(lines: I, config: EvalConfig) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = RecordStore::from_lines(lines, config.llm_mode);
        Self::from_store(store, config)
    }

    /// Builds the evaluator around an already parsed store.
    pub fn from_store(store: RecordStore, config: EvalConfig) -> Result<Self, EvalError> {
        if !config.z.is_finite() || config.z <= 0.0 {
            return Err(EvalError::InvalidConfidence(config.z));
        }
        debug!(records = store.len(), %config, "built evaluator");
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// The gold records of the run.
    pub fn records(&self) -> &RecordStore {
        &self.store
    }

    /// Aligns a full prediction list. `None` means there is nothing to score.
    fn aligned<'a>(
        &'a self,
        predictions: &'a [PredictionRecord],
    ) -> Result<Option<Aligned<'a>>, EvalError> {
        if predictions.is_empty() {
            debug!("no prediction given, returning degenerate metrics");
            return Ok(None);
        }
        check_consistent_length(&self.store, predictions)?;
        Ok(Some(align(&self.store, predictions)))
    }

    /// Exact set-equality accuracy. An empty prediction list gives 0; otherwise there must be one
    /// prediction per gold record.
    pub fn accuracy(&self, predictions: &[PredictionRecord]) -> Result<f64, EvalError> {
        Ok(self
            .aligned(predictions)?
            .map(|aligned| accuracy(&aligned))
            .unwrap_or(0.0))
    }

    /// Micro precision, recall and F1 computed on the label sets. Same length rules as `accuracy`.
    pub fn metrics(&self, predictions: &[PredictionRecord]) -> Result<PrecisionRecallF1, EvalError> {
        Ok(self
            .aligned(predictions)?
            .map(|aligned| analyse_f1(&aligned))
            .unwrap_or_default())
    }

    /// Every metric of the run. Same length rules as `accuracy`: an empty prediction list gives
    /// a report where every value is 0.
    pub fn advanced_report(
        &self,
        predictions: &[PredictionRecord],
    ) -> Result<MetricsReport, EvalError> {
        let aligned = self.aligned(predictions)?.unwrap_or_default();
        Ok(MetricsReport::compute(&aligned, self.config.z))
    }

    /// McNemar's test between two predictors. Both lists must hold one prediction per gold record.
    pub fn compare(
        &self,
        predictions_a: &[PredictionRecord],
        predictions_b: &[PredictionRecord],
    ) -> Result<McNemarResult, EvalError> {
        Ok(mcnemar(&self.store, predictions_a, predictions_b)?)
    }

    /// Whether a comparison is significant at the configured level.
    pub fn is_significant(&self, result: &McNemarResult) -> bool {
        result.is_significant(self.config.alpha)
    }

    /// Runs the predictor on every gold record.
    pub fn predict<P>(&self, predictor: &P) -> Vec<PredictionRecord>
    where
        P: Predictor + Sync + ?Sized,
    {
        collect_predictions(&self.store, predictor, self.config.parallel)
    }

    /// Renders one `LABEL,LABEL: sentence` line per gold record, in id order. Records without a
    /// prediction are rendered as `NONE`.
    pub fn format_predictions(&self, predictions: &[PredictionRecord]) -> Vec<String> {
        let aligned = align(&self.store, predictions);
        self.store
            .iter()
            .zip(aligned.iter())
            .map(|(record, aligned)| format_prediction_line(&record, aligned.predicted))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfigBuilder;
    use crate::label::Category::{self, *};
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn build_lines() -> Vec<&'static str> {
        vec![
            "The capital of [Paris_{LOC}] is nice.",
            "[Bob_{PER}] works at [Acme_{ORG}].",
            "Nothing to see here.",
            "[Alice_{PERSON}] lives in [Rome_{GPE}].",
        ]
    }

    fn build_evaluator() -> Evaluator {
        Evaluator::new(build_lines(), EvalConfig::default()).unwrap()
    }

    fn predictions(labels: Vec<Vec<Category>>) -> Vec<PredictionRecord> {
        labels
            .into_iter()
            .enumerate()
            .map(|(id, l)| PredictionRecord::new(id, l))
            .collect()
    }

    #[test]
    fn test_records_are_parsed_once() {
        let evaluator = build_evaluator();
        let records = evaluator.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records.get(1).unwrap().labels, &[PERSON, ORGANIZATION]);
        assert_eq!(records.get(1).unwrap().sentence, "Bob works at Acme.");
    }

    #[test]
    fn test_llm_mode_from_config() {
        let config = EvalConfigBuilder::new().llm_mode(true).build();
        let evaluator = Evaluator::new(build_lines(), config).unwrap();
        assert_eq!(
            evaluator.records().get(0).unwrap().sentence,
            "The capital of [[Paris]] is nice."
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_confidence(#[case] z: f64) {
        let config = EvalConfigBuilder::new().z(z).build();
        let err = Evaluator::new(build_lines(), config).unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfidence(_)));
    }

    #[test]
    fn test_accuracy() {
        let evaluator = build_evaluator();
        let preds = predictions(vec![
            vec![LOCATION],
            vec![ORGANIZATION, PERSON],
            vec![],
            vec![PERSON],
        ]);
        assert!((evaluator.accuracy(&preds).unwrap() - 0.75).abs() < EPS);
    }

    #[test]
    fn test_accuracy_empty_predictions_is_zero() {
        let evaluator = build_evaluator();
        assert_eq!(evaluator.accuracy(&[]).unwrap(), 0.0);
        assert_eq!(
            evaluator.metrics(&[]).unwrap(),
            PrecisionRecallF1::default()
        );
        assert_eq!(evaluator.advanced_report(&[]).unwrap().n, 0);
    }

    #[test]
    fn test_size_mismatch() {
        let evaluator = build_evaluator();
        let preds = predictions(vec![vec![LOCATION]]);
        let expected = EvalError::SizeMismatch(SizeMismatchError {
            expected: 4,
            actual: 1,
        });
        assert_eq!(evaluator.accuracy(&preds), Err(expected.clone()));
        assert_eq!(evaluator.metrics(&preds), Err(expected.clone()));
        assert_eq!(evaluator.advanced_report(&preds), Err(expected.clone()));
        let full = predictions(vec![vec![]; 4]);
        assert_eq!(evaluator.compare(&full, &preds), Err(expected));
    }

    #[test]
    fn test_metrics() {
        let evaluator = build_evaluator();
        let preds = predictions(vec![vec![LOCATION], vec![PERSON], vec![], vec![PERSON, NONE]]);
        let metrics = evaluator.metrics(&preds).unwrap();
        assert_eq!(
            (
                metrics.true_positives,
                metrics.false_positives,
                metrics.false_negatives
            ),
            (3, 1, 2)
        );
        assert!((metrics.precision - 0.75).abs() < EPS);
        assert!((metrics.recall - 0.6).abs() < EPS);
    }

    #[test]
    fn test_advanced_report() {
        let evaluator = build_evaluator();
        let preds = predictions(vec![vec![LOCATION], vec![PERSON], vec![NONE], vec![LOCATION]]);
        let report = evaluator.advanced_report(&preds).unwrap();
        assert_eq!(report.n, 4);
        assert_eq!(report.exact_matches, 3);
        assert_eq!(report.confusion_matrix.get(PERSON, LOCATION), 1);
        // the empty gold set of record 2 differs from the predicted {NONE}
        assert!((report.set_accuracy - 0.25).abs() < EPS);
    }

    #[test]
    fn test_compare() {
        let evaluator = build_evaluator();
        let a = predictions(vec![vec![LOCATION], vec![PERSON], vec![], vec![PERSON]]);
        let b = predictions(vec![vec![NONE], vec![NONE], vec![], vec![LOCATION]]);
        let result = evaluator.compare(&a, &b).unwrap();
        assert_eq!((result.n01, result.n10), (3, 0));
        assert!((result.p_value - 0.25).abs() < EPS);
        assert!(!evaluator.is_significant(&result));
    }

    #[test]
    fn test_predict_and_format() {
        let evaluator = build_evaluator();
        let predictor = |_id: usize, _sentence: &str, target: &str| -> Vec<String> {
            if target.is_empty() {
                vec![]
            } else {
                vec![String::from("PER")]
            }
        };
        let preds = evaluator.predict(&predictor);
        assert_eq!(preds.len(), 4);
        let lines = evaluator.format_predictions(&preds);
        assert_eq!(
            lines,
            vec![
                "PERSON: The capital of Paris is nice.",
                "PERSON: Bob works at Acme.",
                "NONE: Nothing to see here.",
                "PERSON: Alice lives in Rome.",
            ]
        );
    }

    #[test]
    fn test_independent_sessions() {
        let first = build_evaluator();
        let second = Evaluator::new(["[Paris_{LOC}]"], EvalConfig::default()).unwrap();
        assert_eq!(first.records().len(), 4);
        assert_eq!(second.records().len(), 1);
    }
}
