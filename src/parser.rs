/**
This module parses annotated lines into plain sentences and their gold labels. An annotation span
looks like `[target text_{LABEL}]`. The target text is kept in the output sentence, everything
else of the span is removed. In LLM mode the target stays wrapped in double brackets
(`[[target text]]`), which is how the prompt of a language model highlights the span to classify.
*/
use crate::label::{normalize, Category};
use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::Chars;

const ANNOTATION_OPEN: char = '[';
const ANNOTATION_CLOSE: char = ']';
const SEPARATOR: char = '_';
const LABEL_OPEN: char = '{';
const LABEL_CLOSE: char = '}';

/// Result of parsing one annotated line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedLine {
    /// The line with its annotation syntax removed.
    pub sentence: String,
    /// Target text of every annotation span, in order.
    pub targets: Vec<String>,
    /// Normalized label of every annotation span, in order.
    pub labels: Vec<Category>,
}

/// Left to right scanner over a single line.
#[derive(Debug, Default)]
struct AnnotationScanner {
    llm_mode: bool,
    in_annotation: bool,
    in_target: bool,
    in_label: bool,
    current_target: String,
    current_label: String,
    output: ParsedLine,
}

impl AnnotationScanner {
    fn new(llm_mode: bool, capacity: usize) -> Self {
        Self {
            llm_mode,
            output: ParsedLine {
                sentence: String::with_capacity(capacity),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn push_marker(&mut self, marker: char) {
        if self.llm_mode {
            self.output.sentence.push(marker);
            self.output.sentence.push(marker);
        }
    }

    fn open_annotation(&mut self) {
        self.in_annotation = true;
        self.in_target = true;
        self.push_marker(ANNOTATION_OPEN);
    }

    fn end_target(&mut self) {
        self.in_target = false;
        let target = std::mem::take(&mut self.current_target);
        self.output.targets.push(target);
    }

    fn close_annotation(&mut self) {
        if self.in_target {
            self.end_target();
        }
        self.in_annotation = false;
        self.push_marker(ANNOTATION_CLOSE);
    }

    fn close_label(&mut self) {
        self.in_label = false;
        let label = std::mem::take(&mut self.current_label);
        self.output.labels.push(normalize(label));
    }

    fn step(&mut self, c: char, rest: &mut Peekable<Chars>) {
        if !self.in_annotation {
            if c == ANNOTATION_OPEN {
                self.open_annotation();
            } else {
                self.output.sentence.push(c);
            }
            return;
        }
        if self.in_label {
            if c == LABEL_CLOSE {
                self.close_label();
            } else {
                self.current_label.push(c);
            }
            return;
        }
        if self.in_target {
            match c {
                SEPARATOR if rest.peek() == Some(&LABEL_OPEN) => self.end_target(),
                LABEL_OPEN => {
                    self.end_target();
                    self.in_label = true;
                }
                ANNOTATION_CLOSE => self.close_annotation(),
                _ => {
                    self.current_target.push(c);
                    self.output.sentence.push(c);
                }
            }
            return;
        }
        // Between the end of the target and the closing bracket only the label braces are
        // meaningful.
        match c {
            LABEL_OPEN => self.in_label = true,
            ANNOTATION_CLOSE => self.close_annotation(),
            _ => {}
        }
    }

    fn finish(mut self) -> ParsedLine {
        // An unterminated span keeps its target text but an unterminated label is dropped.
        if self.in_target {
            self.end_target();
        }
        self.output
    }
}

/// Parses a single annotated line.
///
/// ```rust
/// use nereval::{parse_line, Category};
///
/// let parsed = parse_line("The capital of [Paris_{LOC}] is nice.", false);
/// assert_eq!(parsed.sentence, "The capital of Paris is nice.");
/// assert_eq!(parsed.labels, vec![Category::LOCATION]);
///
/// let parsed = parse_line("Target [Bob_{PERSON}] is here.", true);
/// assert_eq!(parsed.sentence, "Target [[Bob]] is here.");
/// ```
pub fn parse_line(line: &str, llm_mode: bool) -> ParsedLine {
    let mut scanner = AnnotationScanner::new(llm_mode, line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        scanner.step(c, &mut chars);
    }
    scanner.finish()
}

/// Parses every line, preserving the input order.
pub fn parse_lines<I, S>(lines: I, llm_mode: bool) -> Vec<ParsedLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|l| parse_line(l.as_ref(), llm_mode))
        .collect()
}
