//! Pluggable success predicates for command results.
//!
//! The exit code is the primary signal. Output keyword matching is an
//! opt-in secondary check because it can misclassify legitimate output.

use crate::config::ClassifierConfig;
use crate::error::JobResult;
use crate::executor::ExecutionOutput;
use crate::retry::Outcome;
use std::sync::Arc;

/// Classifies a finished command as success or failure.
pub trait OutcomeClassifier: Send + Sync {
    /// Classify the captured output of one execution.
    fn classify(&self, output: &ExecutionOutput) -> Outcome;
}

/// Success if and only if the process exited with status 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCodeClassifier;

impl OutcomeClassifier for ExitCodeClassifier {
    fn classify(&self, output: &ExecutionOutput) -> Outcome {
        if output.exited_successfully() {
            return Outcome::Success;
        }

        let stderr = output.stderr.trim();
        let reason = match output.exit_code {
            Some(code) if stderr.is_empty() => format!("exit code {code}"),
            Some(code) => format!("exit code {code}: {stderr}"),
            None => "terminated by signal".to_string(),
        };
        Outcome::Failure(reason)
    }
}

/// Failure if stdout contains any of the configured keywords,
/// compared case-insensitively.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Create a classifier for the given keywords.
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .map(|k: String| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl OutcomeClassifier for KeywordClassifier {
    fn classify(&self, output: &ExecutionOutput) -> Outcome {
        let stdout = output.stdout.to_lowercase();
        match self.keywords.iter().find(|k| stdout.contains(k.as_str())) {
            Some(keyword) => Outcome::Failure(format!("output matched failure keyword '{keyword}'")),
            None => Outcome::Success,
        }
    }
}

/// Succeeds only if every inner classifier succeeds; the first failure wins.
pub struct AllOf {
    classifiers: Vec<Arc<dyn OutcomeClassifier>>,
}

impl AllOf {
    /// Combine classifiers in evaluation order.
    pub fn new(classifiers: Vec<Arc<dyn OutcomeClassifier>>) -> Self {
        Self { classifiers }
    }
}

impl OutcomeClassifier for AllOf {
    fn classify(&self, output: &ExecutionOutput) -> Outcome {
        self.classifiers
            .iter()
            .map(|c| c.classify(output))
            .find(|outcome| !outcome.is_success())
            .unwrap_or(Outcome::Success)
    }
}

/// Builds the classifier described by the configuration: exit code only,
/// or exit code followed by keyword matching when keywords are configured.
pub fn from_config(config: &ClassifierConfig) -> Arc<dyn OutcomeClassifier> {
    if config.failure_keywords.is_empty() {
        return Arc::new(ExitCodeClassifier);
    }

    Arc::new(AllOf::new(vec![
        Arc::new(ExitCodeClassifier),
        Arc::new(KeywordClassifier::new(config.failure_keywords.iter().cloned())),
    ]))
}

/// Turns an executor result into an outcome. Executor errors (timeout,
/// launch failure) are always failures.
pub fn classify_result(
    classifier: &dyn OutcomeClassifier,
    result: &JobResult<ExecutionOutput>,
) -> Outcome {
    match result {
        Ok(output) => classifier.classify(output),
        Err(e) => Outcome::Failure(e.to_string()),
    }
}
