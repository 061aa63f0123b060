/*!
This library evaluates named entity predictions against hand-annotated gold sentences and compares
predictors statistically. It is built with a focus on performance and soundness.

# Annotation format
Gold sentences are annotated inline. Every annotated span looks like `[target text_{LABEL}]`:
```text
The capital of [Paris_{LOC}] is nice.
```
Parsing removes the annotation syntax and keeps the target words, giving the plain sentence
`The capital of Paris is nice.` and the gold labels `[LOCATION]`. In LLM mode the target is kept
highlighted as `[[Paris]]`, which is how a language model prompt marks the span to classify.

# Terminology
* A category is one of `PERSON`, `ORGANIZATION`, `LOCATION` and `NONE`. Any free-text tag is
    normalized into a category; unknown tags become `NONE`.
* A gold record is a plain sentence with its ordered gold labels. Its id is its line number,
    starting at 0.
* A prediction is the list of labels a tagger returned for one gold record.
* The representative label of a label list is its first label, or `NONE` when the list is empty.
    The confusion matrix and the metrics derived from it (per class metrics, micro and macro F1,
    balanced accuracy, kappa and McNemar's test) work on representative labels. The accuracy and
    `analyse_f1` compare the full label sets instead.

# Metrics
* Exact set-equality accuracy and its Wilson score interval.
* Confusion matrix of the representative labels.
* Per class precision, recall and F1, micro and macro F1 with and without `NONE`, balanced
    accuracy.
* Micro precision, recall and F1 computed from set intersections (`analyse_f1`).
* Cohen's kappa.
* McNemar's exact test between two predictors.
*/

mod align;
mod config;
mod datastructure;
mod label;
mod metrics;
mod parser;
mod predictor;
mod reporter;
mod response;
mod session;
mod stats;
mod store;

// The public api starts here
pub use label::{normalize, normalize_all, representative, Category};

pub use parser::{parse_line, parse_lines, ParsedLine};

pub use store::{GoldRecord, RecordStore};

pub use align::{
    align, check_consistent_length, Aligned, AlignedRecord, PredictionRecord, SizeMismatchError,
};

pub use metrics::{
    accuracy, analyse_f1, balanced_accuracy, confusion_matrix, macro_f1, micro, micro_f1,
    per_class, representative_matches, ConfusionMatrix, PrecisionRecallF1,
};

pub use stats::{
    cohen_kappa, log_choose, log_sum_exp, mcnemar, mcnemar_p_value, wilson_interval,
};

pub use reporter::{format_prediction_line, ClassMetrics, McNemarResult, MetricsReport};

pub use response::{extract_between_double_brackets, labels_from_response};

pub use predictor::{collect_predictions, Predictor};

pub use config::{ConfidenceLevel, ConfidenceLevelParsingError, EvalConfig, EvalConfigBuilder};

pub use session::{EvalError, Evaluator};

/// Main entrypoint of the library. This function parses the gold lines, aligns the predictions
/// and computes every metric of the run. The returned report can be used to prettyprint the
/// results. Instead of taking in the raw parameters, this function takes an `EvalConfig` struct
/// and uses sensible defaults.
///
/// * `lines`: Annotated gold lines, one record per line.
/// * `predictions`: One prediction per gold record.
/// * `config`: Parameters of the run.
///
/// # Example
/// ```rust
/// use nereval::{evaluate, Category, EvalConfigBuilder, ConfidenceLevel, PredictionRecord};
///
/// let lines = ["The capital of [Paris_{LOC}] is nice.", "[Bob_{PER}] sings."];
/// let predictions = vec![
///     PredictionRecord::from_raw(0, ["GPE"]),
///     PredictionRecord::new(1, vec![Category::ORGANIZATION]),
/// ];
/// let config = EvalConfigBuilder::default()
///     .confidence_level(ConfidenceLevel::P99)
///     .build();
///
/// let report = evaluate(lines, &predictions, config).unwrap();
/// assert_eq!(report.n, 2);
/// assert_eq!(report.exact_matches, 1);
/// assert_eq!(report.set_accuracy, 0.5);
/// assert_eq!(report.confusion_matrix.get(Category::PERSON, Category::ORGANIZATION), 1);
/// ```
pub fn evaluate<I, S>(
    lines: I,
    predictions: &[PredictionRecord],
    config: EvalConfig,
) -> Result<MetricsReport, EvalError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Evaluator::new(lines, config)?.advanced_report(predictions)
}
