/**
This module defines how an external tagger is plugged into an evaluation run. A tagger only has to
answer one question: given a sentence (and the annotated target inside it), which labels does it
predict? The raw tokens it returns are normalized before reaching the metrics.
*/
use crate::align::PredictionRecord;
use crate::store::{GoldRecord, RecordStore};
use rayon::prelude::*;
use tracing::debug;

/// An external entity tagger. It may return zero, one or many raw label tokens per sentence;
/// unknown tokens become `NONE`.
pub trait Predictor {
    fn predict(&self, id: usize, sentence: &str, target: &str) -> Vec<String>;
}

impl<F> Predictor for F
where
    F: Fn(usize, &str, &str) -> Vec<String>,
{
    fn predict(&self, id: usize, sentence: &str, target: &str) -> Vec<String> {
        self(id, sentence, target)
    }
}

fn predict_record<P: Predictor + ?Sized>(predictor: &P, record: &GoldRecord) -> PredictionRecord {
    let raw = predictor.predict(record.id, record.sentence, &record.target_span());
    PredictionRecord::from_raw(record.id, raw)
}

/// Calls the predictor once per gold record and returns exactly one prediction per id, in id
/// order. When `parallel` is true, the records are dispatched on the rayon thread pool.
pub fn collect_predictions<P>(
    store: &RecordStore,
    predictor: &P,
    parallel: bool,
) -> Vec<PredictionRecord>
where
    P: Predictor + Sync + ?Sized,
{
    let predictions: Vec<PredictionRecord> = if parallel {
        let records: Vec<GoldRecord> = store.iter().collect();
        records
            .par_iter()
            .map(|record| predict_record(predictor, record))
            .collect()
    } else {
        store
            .iter()
            .map(|record| predict_record(predictor, &record))
            .collect()
    };
    debug!(
        predictions = predictions.len(),
        parallel, "collected predictions"
    );
    predictions
}
