/**
This module holds the closed label space used for gold annotations and predictions, and the total
normalization function mapping any free-text tag onto it.
*/
use enum_iterator::{all, cardinality, Sequence};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
/// Category of a named entity. The declaration order is the indexing order of the confusion
/// matrix, and `NONE` must stay the last variant.
pub enum Category {
    PERSON,
    ORGANIZATION,
    LOCATION,
    /// No entity, or an entity the label space does not know about.
    NONE,
}

impl Category {
    /// Number of categories in the label space.
    pub fn count() -> usize {
        cardinality::<Category>()
    }

    /// Iterates over the label space in matrix order (`NONE` last).
    pub fn all() -> impl Iterator<Item = Category> {
        all::<Category>()
    }

    /// Iterates over the entity categories, i.e. every category except `NONE`.
    pub fn entities() -> impl Iterator<Item = Category> {
        Self::all().filter(|c| *c != Category::NONE)
    }

    /// Row/column of this category in a confusion matrix.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Category> {
        Self::all().nth(index)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PERSON => "PERSON",
            Category::ORGANIZATION => "ORGANIZATION",
            Category::LOCATION => "LOCATION",
            Category::NONE => "NONE",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::NONE
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsing a category never fails: unknown tags become `NONE`.
impl FromStr for Category {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(normalize(s))
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        normalize(value)
    }
}

/// Maps an arbitrary tag onto the label space. Every character that is not a letter is dropped,
/// the rest is upper-cased and the usual aliases are resolved (`PER`, `ORG`, `ORGANISATION`,
/// `LOC`, `GPE`). Anything else, the empty string included, is `NONE`.
///
/// ```rust
/// use nereval::{normalize, Category};
///
/// assert_eq!(normalize("loc"), Category::LOCATION);
/// assert_eq!(normalize(" Per. "), Category::PERSON);
/// assert_eq!(normalize("PRODUCT"), Category::NONE);
/// assert_eq!(normalize(""), Category::NONE);
/// ```
pub fn normalize<S: AsRef<str>>(raw: S) -> Category {
    let cleaned: String = raw
        .as_ref()
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect();
    match cleaned.as_str() {
        "PERSON" | "PER" => Category::PERSON,
        "ORGANIZATION" | "ORGANISATION" | "ORG" => Category::ORGANIZATION,
        "LOCATION" | "LOC" | "GPE" => Category::LOCATION,
        _ => Category::NONE,
    }
}

/// Normalizes every token of a predictor or annotation output.
pub fn normalize_all<I, S>(raw: I) -> Vec<Category>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(normalize).collect()
}

/// Single-label reduction used by the matrix based metrics: the first label of the sequence, or
/// `NONE` when the sequence is empty.
pub fn representative(labels: &[Category]) -> Category {
    labels.first().copied().unwrap_or(Category::NONE)
}
