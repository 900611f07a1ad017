use crate::error::EvalError;
use crate::evaluation::PromptEvaluator;
use crate::models::EvaluationResult;
use crate::report::Report;
use crate::scenarios::{self, ScenarioEntry};
use chrono::Local;
use tracing::{debug, warn};

/// Overall scores of every successful evaluation, in call order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLog {
    attempts: Vec<i64>,
}

impl ScoreLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, score: i64) {
        self.attempts.push(score);
    }

    pub fn values(&self) -> &[i64] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// A trend needs at least two points
    pub fn has_trend(&self) -> bool {
        self.attempts.len() >= 2
    }
}

/// One user's interactive session.
///
/// Owns the evaluator, the selected scenario, the score log and the most
/// recent report. Dropping the session discards all of it.
pub struct Session<E> {
    evaluator: E,
    scenario: &'static ScenarioEntry,
    log: ScoreLog,
    latest: Option<Report>,
}

impl<E: PromptEvaluator> Session<E> {
    /// Start a session on the first scenario with an empty score log
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            scenario: scenarios::default_scenario(),
            log: ScoreLog::new(),
            latest: None,
        }
    }

    pub fn scenario(&self) -> &'static ScenarioEntry {
        self.scenario
    }

    /// Switch the active scenario. The score log is kept across scenarios.
    pub fn select_scenario(&mut self, input: &str) -> Result<&'static ScenarioEntry, EvalError> {
        let entry = scenarios::select(input)?;
        debug!(scenario = entry.name, "scenario selected");
        self.scenario = entry;
        Ok(entry)
    }

    pub fn log(&self) -> &ScoreLog {
        &self.log
    }

    /// Report for the last successful evaluation
    pub fn latest_report(&self) -> Option<&Report> {
        self.latest.as_ref()
    }

    /// Evaluate `prompt` and record its Overall score.
    ///
    /// Blank prompts are rejected before the evaluator is called. The log and
    /// the latest report only change when the evaluator returns a parsed result.
    pub async fn submit(&mut self, prompt: &str) -> Result<&EvaluationResult, EvalError> {
        if prompt.trim().is_empty() {
            return Err(EvalError::EmptyInput);
        }

        let result = match self.evaluator.evaluate(prompt).await {
            Ok(result) => result,
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "evaluation failed");
                return Err(err);
            }
        };

        self.log.append(result.overall);
        debug!(attempts = self.log.len(), overall = result.overall, "score recorded");

        let report = self.latest.insert(Report {
            generated_at: Local::now(),
            scenario: self.scenario.name.to_string(),
            prompt: prompt.to_string(),
            result,
        });
        Ok(&report.result)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::fixtures::result_with_overall;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Evaluator that replays queued outcomes and counts calls
    pub struct ScriptedEvaluator {
        outcomes: RefCell<VecDeque<Result<EvaluationResult, EvalError>>>,
        pub calls: Cell<usize>,
    }

    impl ScriptedEvaluator {
        pub fn new(outcomes: Vec<Result<EvaluationResult, EvalError>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                calls: Cell::new(0),
            }
        }

        pub fn with_overalls(overalls: &[i64]) -> Self {
            Self::new(overalls.iter().map(|o| Ok(result_with_overall(*o))).collect())
        }
    }

    impl PromptEvaluator for ScriptedEvaluator {
        async fn evaluate(&self, _prompt: &str) -> Result<EvaluationResult, EvalError> {
            self.calls.set(self.calls.get() + 1);
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(EvalError::ServiceUnavailable("no scripted outcome".into())))
        }
    }

    impl<E> Session<E> {
        pub fn evaluator(&self) -> &E {
            &self.evaluator
        }
    }
}
