/**
The record store holds the gold records of one evaluation run. It is built once from the parsed
lines and only read afterwards; ids are the position of the line in the input.
*/
use crate::datastructure::FlatVecs;
use crate::label::Category;
use crate::parser::{parse_lines, ParsedLine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A gold record, borrowed from its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoldRecord<'a> {
    pub id: usize,
    /// The sentence without its annotation syntax.
    pub sentence: &'a str,
    /// Target text of every annotation span of the line.
    pub targets: &'a [String],
    /// Gold labels, in annotation order.
    pub labels: &'a [Category],
}

impl<'a> GoldRecord<'a> {
    /// All the targets of the record as a single span, separated by a space.
    pub fn target_span(&self) -> String {
        self.targets.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordStore {
    sentences: Box<[String]>,
    targets: FlatVecs<String>,
    labels: FlatVecs<Category>,
}

impl RecordStore {
    /// Parses the annotated lines and builds the store. Ids are assigned from 0 in input order.
    pub fn from_lines<I, S>(lines: I, llm_mode: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from(parse_lines(lines, llm_mode))
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<GoldRecord<'_>> {
        Some(GoldRecord {
            id,
            sentence: self.sentences.get(id)?.as_str(),
            targets: self.targets.get(id)?,
            labels: self.labels.get(id)?,
        })
    }

    /// Gold labels of the record `id`.
    pub fn labels(&self, id: usize) -> Option<&[Category]> {
        self.labels.get(id)
    }

    /// Iterates over the records in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = GoldRecord<'_>> {
        self.sentences
            .iter()
            .zip(self.targets.iter_vec())
            .zip(self.labels.iter_vec())
            .enumerate()
            .map(|(id, ((sentence, targets), labels))| GoldRecord {
                id,
                sentence: sentence.as_str(),
                targets,
                labels,
            })
    }

    /// Number of records with at least one gold label.
    pub fn annotated_count(&self) -> usize {
        self.labels.iter_vec().filter(|l| !l.is_empty()).count()
    }
}

impl From<Vec<ParsedLine>> for RecordStore {
    fn from(value: Vec<ParsedLine>) -> Self {
        let mut sentences = Vec::with_capacity(value.len());
        let mut targets = Vec::with_capacity(value.len());
        let mut labels = Vec::with_capacity(value.len());
        for parsed in value {
            sentences.push(parsed.sentence);
            targets.push(parsed.targets);
            labels.push(parsed.labels);
        }
        let store = Self {
            sentences: sentences.into_boxed_slice(),
            targets: FlatVecs::new(targets),
            labels: FlatVecs::new(labels),
        };
        debug!(
            records = store.len(),
            annotated = store.annotated_count(),
            "built gold record store"
        );
        store
    }
}

impl FromIterator<ParsedLine> for RecordStore {
    fn from_iter<I: IntoIterator<Item = ParsedLine>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_store() -> RecordStore {
        RecordStore::from_lines(
            [
                "The capital of [Paris_{LOC}] is nice.",
                "Nothing here.",
                "Meet [Alice_{PERSON}] at [Montreal_{LOC}].",
            ],
            false,
        )
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = build_store();
        let ids: Vec<_> = store.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.iter().len(), 3);
    }

    #[test]
    fn test_get_record() {
        let store = build_store();
        let record = store.get(2).unwrap();
        assert_eq!(record.sentence, "Meet Alice at Montreal.");
        assert_eq!(record.labels, &[Category::PERSON, Category::LOCATION]);
        assert_eq!(record.target_span(), "Alice Montreal");
        assert_eq!(store.get(1).unwrap().labels, &[] as &[Category]);
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_annotated_count() {
        assert_eq!(build_store().annotated_count(), 2);
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::from_lines(Vec::<String>::new(), false);
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
        assert_eq!(store, RecordStore::default());
    }
}
