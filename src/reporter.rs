/**
This modules gives a few tools to prettyprint the results of an evaluation: the metrics of every
category, the overall metrics and the result of a paired comparison.
*/
use crate::align::Aligned;
use crate::label::Category;
use crate::metrics::{
    accuracy, analyse_f1, balanced_accuracy, confusion_matrix, f_score, macro_f1, micro,
    per_class, prf_divide, representative_matches, ConfusionMatrix, PrecisionRecallF1,
};
use crate::stats::{cohen_kappa, wilson_interval};
use crate::store::GoldRecord;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Datastructure holding metrics about a given category.
pub struct ClassMetrics {
    pub category: Category,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Precision metric
    pub precision: f64,
    /// Recall metric
    pub recall: f64,
    /// F1 metric
    pub f1: f64,
    /// Number of records whose representative gold label is this category.
    pub support: usize,
}

impl ClassMetrics {
    pub(crate) fn new(
        category: Category,
        true_positives: usize,
        false_positives: usize,
        false_negatives: usize,
    ) -> Self {
        let precision = prf_divide(true_positives, true_positives + false_positives);
        let recall = prf_divide(true_positives, true_positives + false_negatives);
        Self {
            category,
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1: f_score(precision, recall),
            support: true_positives + false_negatives,
        }
    }
}

/// The ClassMetrics struct acts as a line in a dataframe when displayed.
impl Display for ClassMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.category, self.precision, self.recall, self.f1, self.support
        )
    }
}

/// Every metric of one evaluation run. The matrix based values reduce each record to its
/// representative label; `set_accuracy` and `set_metrics` compare the full label sets instead.
///
/// # Example
///
/// ```rust
/// use nereval::{align, Category, MetricsReport, PredictionRecord, RecordStore};
///
/// let store = RecordStore::from_lines(["[Paris_{LOC}] is nice.", "[Bob_{PER}] sings."], false);
/// let predictions = vec![
///     PredictionRecord::new(0, vec![Category::LOCATION]),
///     PredictionRecord::new(1, vec![Category::NONE]),
/// ];
/// let report = MetricsReport::compute(&align(&store, &predictions), 1.96);
///
/// assert_eq!(report.n, 2);
/// assert_eq!(report.exact_matches, 1);
/// assert_eq!(report.accuracy, 0.5);
/// assert_eq!(report.per_class[&Category::LOCATION].f1, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Share of records whose representative labels match.
    pub accuracy: f64,
    /// Wilson score interval of `accuracy`.
    pub confidence_interval: [f64; 2],
    pub confusion_matrix: ConfusionMatrix,
    pub per_class: BTreeMap<Category, ClassMetrics>,
    pub micro: PrecisionRecallF1,
    pub macro_f1: f64,
    pub micro_entities: PrecisionRecallF1,
    pub macro_f1_entities: f64,
    pub balanced_accuracy: f64,
    pub balanced_accuracy_entities: f64,
    pub kappa: f64,
    pub n: usize,
    pub exact_matches: usize,
    pub set_accuracy: f64,
    pub set_metrics: PrecisionRecallF1,
}

impl MetricsReport {
    /// Computes every metric of the aligned records. The interval uses the normal quantile `z`.
    /// An empty input gives a report where every value is 0.
    pub fn compute(aligned: &Aligned, z: f64) -> Self {
        let matrix = confusion_matrix(aligned);
        let n = aligned.len();
        let exact_matches = representative_matches(aligned);
        let representative_accuracy = prf_divide(exact_matches, n);
        let report = Self {
            accuracy: representative_accuracy,
            confidence_interval: wilson_interval(representative_accuracy, n, z),
            per_class: per_class(&matrix),
            micro: micro(&matrix, false),
            macro_f1: macro_f1(&matrix, false),
            micro_entities: micro(&matrix, true),
            macro_f1_entities: macro_f1(&matrix, true),
            balanced_accuracy: balanced_accuracy(&matrix, false),
            balanced_accuracy_entities: balanced_accuracy(&matrix, true),
            kappa: cohen_kappa(&matrix),
            n,
            exact_matches,
            set_accuracy: accuracy(aligned),
            set_metrics: analyse_f1(aligned),
            confusion_matrix: matrix,
        };
        debug!(
            n,
            exact_matches,
            kappa = report.kappa,
            "computed metrics report"
        );
        report
    }

    pub fn micro_f1(&self) -> f64 {
        self.micro.f1
    }

    pub fn micro_f1_entities(&self) -> f64 {
        self.micro_entities.f1
    }
}

fn overall_row(
    f: &mut std::fmt::Formatter<'_>,
    name: &str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
) -> std::fmt::Result {
    writeln!(f, "{}, {}, {}, {}, {}", name, precision, recall, f1, support)
}

/// The MetricsReport struct acts as a dataframe when displayed, followed by the scalar metrics.
impl Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        let micro = &self.micro;
        overall_row(f, "Overall_Micro", micro.precision, micro.recall, micro.f1, self.n)?;
        let entities = &self.micro_entities;
        let entities_support = Category::entities()
            .filter_map(|c| self.per_class.get(&c))
            .map(|m| m.support)
            .sum::<usize>();
        overall_row(
            f,
            "Overall_Micro_Entities",
            entities.precision,
            entities.recall,
            entities.f1,
            entities_support,
        )?;
        for metrics in self.per_class.values() {
            writeln!(f, "{}", metrics)?;
        }
        let [lo, hi] = self.confidence_interval;
        writeln!(f, "Accuracy: {} [{}, {}]", self.accuracy, lo, hi)?;
        writeln!(
            f,
            "Macro_F1: {}, Macro_F1_Entities: {}",
            self.macro_f1, self.macro_f1_entities
        )?;
        writeln!(
            f,
            "Balanced_Accuracy: {}, Balanced_Accuracy_Entities: {}",
            self.balanced_accuracy, self.balanced_accuracy_entities
        )?;
        writeln!(f, "Kappa: {}", self.kappa)?;
        writeln!(f, "Set_Accuracy: {}, Set_{}", self.set_accuracy, self.set_metrics)?;
        writeln!(f, "N: {}, Exact_Matches: {}", self.n, self.exact_matches)
    }
}

/// Result of McNemar's test between two predictors A and B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McNemarResult {
    /// Records where only A is right.
    pub n01: u64,
    /// Records where only B is right.
    pub n10: u64,
    /// Two-sided exact p-value.
    pub p_value: f64,
}

impl McNemarResult {
    /// Whether the two predictors differ at the significance level `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

impl Display for McNemarResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n01={}, n10={}, p-value={}",
            self.n01, self.n10, self.p_value
        )
    }
}

/// Renders a prediction the way prediction dumps are written: `LABEL,LABEL: sentence`. An empty
/// prediction is written as `NONE`.
pub fn format_prediction_line(record: &GoldRecord, prediction: &[Category]) -> String {
    let labels = if prediction.is_empty() {
        Category::NONE.to_string()
    } else {
        prediction.iter().join(",")
    };
    format!("{}: {}", labels, record.sentence)
}
