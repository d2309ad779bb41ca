// Recorded algorithm steps and captured console output

use serde::Serialize;
use thiserror::Error;

/// Most console lines kept per run; later lines are counted but not stored.
pub const MAX_LOG_LINES: usize = 1_000;

/// Severity of a captured console line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Text put in front of every line of this level
    pub fn prefix(self) -> &'static str {
        match self {
            LogLevel::Log | LogLevel::Info => "",
            LogLevel::Warn => "WARN: ",
            LogLevel::Error => "ERROR: ",
        }
    }
}

/// One line of console output, already prefixed for its level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

/// Mock console capturing `console.*` output of a sandboxed run
#[derive(Debug, Clone)]
pub struct Console {
    lines: Vec<LogLine>,
    max_lines: usize,
    dropped: usize,
}

impl Console {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_LINES)
    }

    pub fn with_capacity(max_lines: usize) -> Self {
        Console {
            lines: Vec::new(),
            max_lines,
            dropped: 0,
        }
    }

    /// Record one console call
    pub fn push(&mut self, level: LogLevel, message: &str) {
        if self.lines.len() >= self.max_lines {
            self.dropped += 1;
            return;
        }
        self.lines.push(LogLine {
            level,
            text: format!("{}{}", level.prefix(), message),
        });
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Most lines this console stores
    pub fn capacity(&self) -> usize {
        self.max_lines
    }

    /// Number of lines discarded after the capacity was reached
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Get all lines as a vector of strings
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded state of the working array.
///
/// Owns its data: nothing the sandbox does after recording can change it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub array: Vec<f64>,
    pub highlights: Vec<usize>,
    pub description: String,
}

impl Step {
    /// Build a step; repeated highlight indices keep their first occurrence.
    pub fn new(
        array: Vec<f64>,
        highlights: Vec<usize>,
        description: impl Into<String>,
    ) -> Self {
        let mut unique = Vec::with_capacity(highlights.len());
        for index in highlights {
            if !unique.contains(&index) {
                unique.push(index);
            }
        }
        Step {
            array,
            highlights: unique,
            description: description.into(),
        }
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlights.contains(&index)
    }
}

/// Ordered steps produced by one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StepSequence {
    steps: Vec<Step>,
}

impl StepSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a step by index
    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl From<Vec<Step>> for StepSequence {
    fn from(steps: Vec<Step>) -> Self {
        StepSequence { steps }
    }
}

impl<'a> IntoIterator for &'a StepSequence {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Raised by [`StepRecorder::push`] once the ceiling is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Step limit exceeded (infinite loop protection)")]
pub struct StepLimitExceeded {
    pub limit: usize,
}

/// Collects steps for one run, enforcing the step ceiling
#[derive(Debug)]
pub struct StepRecorder {
    steps: Vec<Step>,
    limit: usize,
}

impl StepRecorder {
    pub fn new(limit: usize) -> Self {
        StepRecorder {
            steps: Vec::new(),
            limit,
        }
    }

    /// Append a step; fails without recording when `limit` steps exist
    pub fn push(&mut self, step: Step) -> Result<(), StepLimitExceeded> {
        if self.steps.len() >= self.limit {
            return Err(StepLimitExceeded { limit: self.limit });
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn finish(self) -> StepSequence {
        StepSequence { steps: self.steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_prefixes_levels() {
        let mut console = Console::new();
        console.push(LogLevel::Log, "plain");
        console.push(LogLevel::Info, "info");
        console.push(LogLevel::Warn, "careful");
        console.push(LogLevel::Error, "broken");

        assert_eq!(
            console.get_output(),
            vec!["plain", "info", "WARN: careful", "ERROR: broken"]
        );
    }

    #[test]
    fn test_console_capacity() {
        let mut console = Console::with_capacity(2);
        for i in 0..5 {
            console.push(LogLevel::Log, &i.to_string());
        }
        assert_eq!(console.get_output(), vec!["0", "1"]);
        assert_eq!(console.dropped(), 3);
    }

    #[test]
    fn test_step_dedupes_highlights() {
        let step = Step::new(vec![3.0, 1.0, 2.0], vec![2, 0, 2, 1, 0], "");
        assert_eq!(step.highlights, vec![2, 0, 1]);
        assert!(step.is_highlighted(1));
        assert!(!step.is_highlighted(3));
    }

    #[test]
    fn test_recorder_enforces_limit() {
        let mut recorder = StepRecorder::new(2);
        recorder.push(Step::new(vec![1.0], vec![], "a")).unwrap();
        recorder.push(Step::new(vec![1.0], vec![], "b")).unwrap();

        let err = recorder.push(Step::new(vec![1.0], vec![], "c")).unwrap_err();
        assert_eq!(err.limit, 2);
        assert_eq!(
            err.to_string(),
            "Step limit exceeded (infinite loop protection)"
        );

        let sequence = recorder.finish();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.last().map(|s| s.description.as_str()), Some("b"));
    }

    #[test]
    fn test_sequence_serializes_as_list() {
        let sequence =
            StepSequence::from(vec![Step::new(vec![2.0, 1.0], vec![0], "swap")]);
        let json = serde_json::to_string(&sequence).unwrap();
        assert_eq!(
            json,
            r#"[{"array":[2.0,1.0],"highlights":[0],"description":"swap"}]"#
        );
    }
}
