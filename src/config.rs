/*
 * This modules contains the `EvalConfig` struct, which implements the default trait, and the
 * builder used to customize it. The config is passed to the `Evaluator` (or to the `evaluate`
 * function) to simplify their arguments.
*/
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// Confidence level of the interval estimated around the accuracy. `&str` can be parsed to create
/// a `ConfidenceLevel`, either as a percentage (`"95"`, `"95%"`, `"p95"`) or as a proportion
/// (`"0.95"`).
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    P90,
    #[default]
    P95,
    P99,
}

impl ConfidenceLevel {
    /// Two-sided quantile of the standard normal distribution.
    pub fn z(&self) -> f64 {
        match self {
            Self::P90 => 1.6449,
            Self::P95 => 1.96,
            Self::P99 => 2.5758,
        }
    }

    fn percent(&self) -> f64 {
        match self {
            Self::P90 => 90.0,
            Self::P95 => 95.0,
            Self::P99 => 99.0,
        }
    }
}

impl Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = ConfidenceLevelParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowercase = s.trim().to_lowercase();
        let cleaned = lowercase.trim_start_matches('p').trim_end_matches('%').trim();
        let value: f64 = cleaned
            .parse()
            .map_err(|_| ConfidenceLevelParsingError(String::from(s)))?;
        let percent = if value < 1.0 { value * 100.0 } else { value };
        [Self::P90, Self::P95, Self::P99]
            .into_iter()
            .find(|level| (level.percent() - percent).abs() < 1e-6)
            .ok_or_else(|| ConfidenceLevelParsingError(String::from(s)))
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct ConfidenceLevelParsingError(pub String);

impl Display for ConfidenceLevelParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a ConfidenceLevel. Supported levels are 90%, 95% and 99%",
            self.0
        )
    }
}
impl Error for ConfidenceLevelParsingError {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of an evaluation run. It implements the default
/// trait.
pub struct EvalConfig {
    /// Are the annotation spans kept as `[[target]]` in the parsed sentences? This is needed when
    /// the sentences are sent to a language model prompt.
    pub(crate) llm_mode: bool,
    /// Normal quantile used by the Wilson interval of the accuracy.
    pub(crate) z: f64,
    /// Significance level used when comparing two predictors.
    pub(crate) alpha: f64,
    /// Are the predictions collected on multiple cores?
    pub(crate) parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            llm_mode: false,
            z: ConfidenceLevel::default().z(),
            alpha: 0.05,
            parallel: false,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn llm_mode(&self) -> bool {
        self.llm_mode
    }
    pub fn z(&self) -> f64 {
        self.z
    }
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl From<EvalConfigBuilder> for EvalConfig {
    fn from(value: EvalConfigBuilder) -> Self {
        Self {
            llm_mode: value.llm_mode,
            z: value.confidence.either(|z| z, |level| level.z()),
            alpha: value.alpha,
            parallel: value.parallel,
        }
    }
}

impl Display for EvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LLM mode: {}\n Interval quantile (z): {}\n Significance level: {}\n Using parallel predictions: {}",
            self.llm_mode, self.z, self.alpha, self.parallel
        )
    }
}

/// This builder can be used to build and customize an `EvalConfig` structure. The confidence is
/// either a raw normal quantile or one of the supported `ConfidenceLevel`.
#[derive(Clone, Debug)]
pub struct EvalConfigBuilder {
    llm_mode: bool,
    confidence: LeftOrRight<f64, ConfidenceLevel>,
    alpha: f64,
    parallel: bool,
}

impl Default for EvalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalConfigBuilder {
    pub fn llm_mode(mut self, llm_mode: bool) -> Self {
        self.llm_mode = llm_mode;
        self
    }
    pub fn confidence_level(mut self, level: ConfidenceLevel) -> Self {
        self.confidence = LeftOrRight::Right(level);
        self
    }
    /// Uses a custom normal quantile for the interval. It must be finite and positive, which is
    /// checked when the `Evaluator` is built.
    pub fn z(mut self, z: f64) -> Self {
        self.confidence = LeftOrRight::Left(z);
        self
    }
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        Self {
            llm_mode: false,
            confidence: LeftOrRight::Right(ConfidenceLevel::default()),
            alpha: 0.05,
            parallel: false,
        }
    }
    pub fn build(self) -> EvalConfig {
        EvalConfig::from(self)
    }
}
