/**
This module joins the predictions made by an external tagger against the gold records, by id.
*/
use crate::label::{normalize_all, Category};
use crate::store::RecordStore;
use ahash::{random_state::RandomState, HashMap as AHashMap};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use tracing::{debug, warn};

/// Labels predicted for one gold record. Order and duplicates are only meaningful for the
/// representative label (the first one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: usize,
    pub labels: Vec<Category>,
}

impl PredictionRecord {
    pub fn new(id: usize, labels: Vec<Category>) -> Self {
        Self { id, labels }
    }

    /// Builds a prediction from the raw tokens returned by a tagger, normalizing each of them.
    pub fn from_raw<I, S>(id: usize, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(id, normalize_all(raw))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Error type to represent a prediction list whose length differs from the number of gold
/// records.
pub struct SizeMismatchError {
    pub expected: usize,
    pub actual: usize,
}

impl Display for SizeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inconsistent number of predictions. Expected {} (one per gold record), got {}",
            self.expected, self.actual
        )
    }
}
impl Error for SizeMismatchError {}

/// Checks that there is exactly one prediction per gold record.
pub fn check_consistent_length(
    store: &RecordStore,
    predictions: &[PredictionRecord],
) -> Result<(), SizeMismatchError> {
    if store.len() != predictions.len() {
        return Err(SizeMismatchError {
            expected: store.len(),
            actual: predictions.len(),
        });
    }
    Ok(())
}

/// Gold and predicted labels of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedRecord<'a> {
    pub id: usize,
    pub gold: &'a [Category],
    pub predicted: &'a [Category],
}

/// Every gold record with its prediction, in id order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aligned<'a> {
    records: Vec<AlignedRecord<'a>>,
}

impl<'a> Aligned<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlignedRecord<'a>> {
        self.records.iter()
    }

    pub fn get(&self, id: usize) -> Option<&AlignedRecord<'a>> {
        self.records.get(id)
    }
}

impl<'a> FromIterator<AlignedRecord<'a>> for Aligned<'a> {
    fn from_iter<I: IntoIterator<Item = AlignedRecord<'a>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a, 'b> IntoIterator for &'b Aligned<'a> {
    type Item = &'b AlignedRecord<'a>;
    type IntoIter = std::slice::Iter<'b, AlignedRecord<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Associates each gold record with its prediction. A gold id without prediction is aligned with
/// an empty label list. Predictions for unknown ids are ignored, and on duplicated ids the last
/// prediction wins. This function does not check the number of predictions: callers needing one
/// prediction per record use `check_consistent_length` first.
pub fn align<'a>(store: &'a RecordStore, predictions: &'a [PredictionRecord]) -> Aligned<'a> {
    let mut by_id: AHashMap<usize, &'a [Category]> =
        AHashMap::with_capacity_and_hasher(predictions.len(), RandomState::new());
    let mut duplicates = 0usize;
    for prediction in predictions {
        if by_id
            .insert(prediction.id, prediction.labels.as_slice())
            .is_some()
        {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "duplicated prediction ids, keeping the last one");
    }
    let mut missing = 0usize;
    let aligned: Aligned<'a> = store
        .iter()
        .map(|record| {
            let predicted = by_id.get(&record.id).copied().unwrap_or_else(|| {
                missing += 1;
                &[][..]
            });
            AlignedRecord {
                id: record.id,
                gold: record.labels,
                predicted,
            }
        })
        .collect();
    debug!(records = aligned.len(), missing, "aligned predictions");
    aligned
}
