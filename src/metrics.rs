/**
This module computes the classification metrics of aligned gold and predicted labels. Two views of
a record coexist:
* the set view, where the gold and predicted labels are compared as sets. It is exact for records
  with many labels and is used by `accuracy` and `analyse_f1`;
* the representative view, where each side is reduced to its first label (or `NONE`). It feeds
  the confusion matrix and every metric derived from it.
*/
use crate::align::{Aligned, AlignedRecord};
use crate::label::{representative, Category};
use crate::reporter::ClassMetrics;
use ahash::HashSet as AHashSet;
use itertools::multizip;
use ndarray::prelude::*;
use num::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Division returning 0 when the denominator is 0.
pub(crate) fn prf_divide<N: ToPrimitive>(numerator: N, denominator: N) -> f64 {
    let denominator = denominator.to_f64().unwrap_or(0.0);
    if denominator == 0.0 {
        return 0.0;
    }
    numerator.to_f64().unwrap_or(0.0) / denominator
}

/// Harmonic mean of the precision and the recall, 0 when both are 0.
pub(crate) fn f_score(precision: f64, recall: f64) -> f64 {
    prf_divide(2.0 * precision * recall, precision + recall)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
/// Precision, recall and F1 computed from pooled counts.
pub struct PrecisionRecallF1 {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl PrecisionRecallF1 {
    pub fn from_counts(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        let precision = prf_divide(true_positives, true_positives + false_positives);
        let recall = prf_divide(true_positives, true_positives + false_negatives);
        Self {
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1: f_score(precision, recall),
        }
    }
}

impl Display for PrecisionRecallF1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Precision: {}, Recall: {}, F1: {}",
            self.precision, self.recall, self.f1
        )
    }
}

fn label_set(labels: &[Category]) -> AHashSet<Category> {
    labels.iter().copied().collect()
}

fn sets_match(record: &AlignedRecord) -> bool {
    label_set(record.gold) == label_set(record.predicted)
}

/// Exact-match accuracy: the share of records whose predicted label set equals the gold label set
/// (two empty sets match). Returns 0 when there is no record.
pub fn accuracy(aligned: &Aligned) -> f64 {
    let matches = aligned.iter().filter(|r| sets_match(r)).count();
    prf_divide(matches, aligned.len())
}

/// Number of records whose representative gold and predicted labels are equal.
pub fn representative_matches(aligned: &Aligned) -> usize {
    aligned
        .iter()
        .filter(|r| representative(r.gold) == representative(r.predicted))
        .count()
}

/// Micro precision, recall and F1 computed directly on the label sets of every record: a label
/// present on both sides is a true positive, a predicted label absent from the gold set a false
/// positive, and a gold label absent from the predictions a false negative.
pub fn analyse_f1(aligned: &Aligned) -> PrecisionRecallF1 {
    let (mut tp, mut fp, mut fn_) = (0, 0, 0);
    for record in aligned {
        let gold = label_set(record.gold);
        let predicted = label_set(record.predicted);
        tp += gold.intersection(&predicted).count();
        fp += predicted.difference(&gold).count();
        fn_ += gold.difference(&predicted).count();
    }
    PrecisionRecallF1::from_counts(tp, fp, fn_)
}

/// Square matrix of counts, indexed by `Category::index`. `counts[[g, p]]` is the number of
/// records whose representative gold label is `g` and representative predicted label is `p`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: Array2<usize>,
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfusionMatrix {
    /// Empty matrix over the whole label space.
    pub fn new() -> Self {
        let size = Category::count();
        Self {
            counts: Array::zeros((size, size)),
        }
    }

    /// Wraps raw counts. Returns `None` unless the matrix is `|labels| x |labels|`.
    pub fn from_counts(counts: Array2<usize>) -> Option<Self> {
        let size = Category::count();
        (counts.dim() == (size, size)).then_some(Self { counts })
    }

    pub fn add(&mut self, gold: Category, predicted: Category) {
        self.counts[[gold.index(), predicted.index()]] += 1;
    }

    pub fn get(&self, gold: Category, predicted: Category) -> usize {
        self.counts[[gold.index(), predicted.index()]]
    }

    pub fn counts(&self) -> ArrayView2<'_, usize> {
        self.counts.view()
    }

    /// Number of records counted.
    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Number of records on the diagonal.
    pub fn trace(&self) -> usize {
        self.counts.diag().sum()
    }

    /// Row sums: number of records per gold label.
    pub fn gold_totals(&self) -> Array1<usize> {
        self.counts.sum_axis(Axis(1))
    }

    /// Column sums: number of records per predicted label.
    pub fn predicted_totals(&self) -> Array1<usize> {
        self.counts.sum_axis(Axis(0))
    }

    pub fn true_positives(&self, category: Category) -> usize {
        self.get(category, category)
    }

    pub fn false_positives(&self, category: Category) -> usize {
        let i = category.index();
        self.counts.column(i).sum() - self.counts[[i, i]]
    }

    pub fn false_negatives(&self, category: Category) -> usize {
        let i = category.index();
        self.counts.row(i).sum() - self.counts[[i, i]]
    }
}

impl<'a, 'b> FromIterator<&'b AlignedRecord<'a>> for ConfusionMatrix {
    fn from_iter<I: IntoIterator<Item = &'b AlignedRecord<'a>>>(iter: I) -> Self {
        let mut matrix = Self::new();
        for record in iter {
            matrix.add(representative(record.gold), representative(record.predicted));
        }
        matrix
    }
}

/// Builds the confusion matrix of the representative labels.
pub fn confusion_matrix(aligned: &Aligned) -> ConfusionMatrix {
    aligned.iter().collect()
}

/// The Confusion matrix is displayed with the gold labels as rows and the predicted labels as
/// columns.
impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = Category::all()
            .map(|c| c.as_str().len())
            .chain(self.counts.iter().map(|n| n.to_string().len()))
            .max()
            .unwrap_or(0);
        write!(f, "{:>width$}", "gold\\pred")?;
        for category in Category::all() {
            write!(f, " {:>width$}", category.as_str())?;
        }
        writeln!(f)?;
        for (category, row) in Category::all().zip(self.counts.rows()) {
            write!(f, "{:>width$}", category.as_str())?;
            for count in row.iter() {
                write!(f, " {:>width$}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn kept_classes(exclude_none: bool) -> Vec<Category> {
    if exclude_none {
        Category::entities().collect()
    } else {
        Category::all().collect()
    }
}

/// Precision, recall, F1 and support of every category of the label space.
pub fn per_class(matrix: &ConfusionMatrix) -> BTreeMap<Category, ClassMetrics> {
    let classes: Vec<_> = Category::all().collect();
    let true_positives = classes.iter().map(|c| matrix.true_positives(*c));
    let false_positives = classes.iter().map(|c| matrix.false_positives(*c));
    let false_negatives = classes.iter().map(|c| matrix.false_negatives(*c));
    multizip((
        classes.iter(),
        true_positives,
        false_positives,
        false_negatives,
    ))
    .map(|(category, tp, fp, fn_)| (*category, ClassMetrics::new(*category, tp, fp, fn_)))
    .collect()
}

/// Pooled precision, recall and F1 over the kept classes. Without exclusion the three values are
/// the share of records on the diagonal.
pub fn micro(matrix: &ConfusionMatrix, exclude_none: bool) -> PrecisionRecallF1 {
    let (tp, fp, fn_) = kept_classes(exclude_none)
        .into_iter()
        .fold((0, 0, 0), |(tp, fp, fn_), c| {
            (
                tp + matrix.true_positives(c),
                fp + matrix.false_positives(c),
                fn_ + matrix.false_negatives(c),
            )
        });
    PrecisionRecallF1::from_counts(tp, fp, fn_)
}

pub fn micro_f1(matrix: &ConfusionMatrix, exclude_none: bool) -> f64 {
    micro(matrix, exclude_none).f1
}

fn mean_over_kept<F>(matrix: &ConfusionMatrix, exclude_none: bool, metric: F) -> f64
where
    F: Fn(&ClassMetrics) -> f64,
{
    let classes = per_class(matrix);
    let values: Array1<f64> = kept_classes(exclude_none)
        .iter()
        .filter_map(|c| classes.get(c))
        .map(metric)
        .collect();
    values.mean().unwrap_or(0.0)
}

/// Unweighted mean of the F1 of the kept classes.
pub fn macro_f1(matrix: &ConfusionMatrix, exclude_none: bool) -> f64 {
    mean_over_kept(matrix, exclude_none, |m| m.f1)
}

/// Unweighted mean of the recall of the kept classes.
pub fn balanced_accuracy(matrix: &ConfusionMatrix, exclude_none: bool) -> f64 {
    mean_over_kept(matrix, exclude_none, |m| m.recall)
}
