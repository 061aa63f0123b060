/**
Helpers turning the free-form reply of a language model into labels of the label space. The model
is asked to answer with the category wrapped in double brackets (`[[LOCATION]]`), but replies are
not always well-formed.
*/
use crate::label::{normalize, Category};

/// Returns the trimmed content found between the first `[[` and the next `]]`, if any.
pub fn extract_between_double_brackets(reply: &str) -> Option<&str> {
    let open = reply.find("[[")?;
    let content_start = open + 2;
    let close = reply[content_start..].find("]]")?;
    Some(reply[content_start..content_start + close].trim())
}

/// Extracts exactly one category from a model reply. The double-bracketed token is used when it
/// exists and is not blank, otherwise the whole reply is. The word `ANSWER` is discarded before
/// normalization.
pub fn labels_from_response(reply: &str) -> Vec<Category> {
    let token = match extract_between_double_brackets(reply) {
        Some(inner) if !inner.trim().is_empty() => inner,
        _ => reply.trim(),
    };
    let cleaned = token.replace("ANSWER", "").replace("answer", "");
    vec![normalize(cleaned)]
}
