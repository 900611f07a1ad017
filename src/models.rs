use serde::{Deserialize, Deserializer, Serialize, de};

/// Structured verdict returned by the evaluator model.
///
/// Field names match the JSON the model is instructed to return. Every field
/// is required; `Issues` and `Suggestions` may be empty but never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(rename = "Role", deserialize_with = "whole_score")]
    pub role: i64,
    #[serde(rename = "Context", deserialize_with = "whole_score")]
    pub context: i64,
    #[serde(rename = "ClearTask", deserialize_with = "whole_score")]
    pub clear_task: i64,
    #[serde(rename = "OutputFormat", deserialize_with = "whole_score")]
    pub output_format: i64,
    #[serde(rename = "Constraints", deserialize_with = "whole_score")]
    pub constraints: i64,
    #[serde(rename = "Structure", deserialize_with = "whole_score")]
    pub structure: i64,
    #[serde(rename = "Examples", deserialize_with = "whole_score")]
    pub examples: i64,
    #[serde(rename = "Tone", deserialize_with = "whole_score")]
    pub tone: i64,
    #[serde(rename = "Completeness", deserialize_with = "whole_score")]
    pub completeness: i64,
    #[serde(rename = "Effectiveness", deserialize_with = "whole_score")]
    pub effectiveness: i64,
    /// Aggregate score
    #[serde(rename = "Overall", deserialize_with = "whole_score")]
    pub overall: i64,
    #[serde(rename = "Issues")]
    pub issues: Vec<String>,
    #[serde(rename = "Suggestions")]
    pub suggestions: Vec<String>,
    #[serde(rename = "ImprovedPrompt")]
    pub improved_prompt: String,
}

/// Accept a score written as an integer or as a float with no fractional part
fn whole_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(score) = number.as_i64() {
        return Ok(score);
    }
    match number.as_f64() {
        Some(score) if score.fract() == 0.0 && score.abs() < i64::MAX as f64 => Ok(score as i64),
        _ => Err(de::Error::custom(format!("score {} is not a whole number", number))),
    }
}

impl EvaluationResult {
    /// Score for one rubric element
    pub fn score(&self, element: RubricElement) -> i64 {
        match element {
            RubricElement::Role => self.role,
            RubricElement::Context => self.context,
            RubricElement::ClearTask => self.clear_task,
            RubricElement::OutputFormat => self.output_format,
            RubricElement::Constraints => self.constraints,
            RubricElement::Structure => self.structure,
            RubricElement::Examples => self.examples,
            RubricElement::Tone => self.tone,
            RubricElement::Completeness => self.completeness,
            RubricElement::Effectiveness => self.effectiveness,
        }
    }

    /// Rubric elements (and Overall) whose score falls outside 0..=10
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = RubricElement::ALL
            .iter()
            .filter(|e| !SCORE_RANGE.contains(&self.score(**e)))
            .map(|e| e.key())
            .collect();
        if !SCORE_RANGE.contains(&self.overall) {
            keys.push("Overall");
        }
        keys
    }
}

pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=10;

/// The ten dimensions a prompt is scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RubricElement {
    Role,
    Context,
    ClearTask,
    OutputFormat,
    Constraints,
    Structure,
    Examples,
    Tone,
    Completeness,
    Effectiveness,
}

impl RubricElement {
    pub const ALL: [RubricElement; 10] = [
        RubricElement::Role,
        RubricElement::Context,
        RubricElement::ClearTask,
        RubricElement::OutputFormat,
        RubricElement::Constraints,
        RubricElement::Structure,
        RubricElement::Examples,
        RubricElement::Tone,
        RubricElement::Completeness,
        RubricElement::Effectiveness,
    ];

    /// JSON key used by the evaluator
    pub fn key(&self) -> &'static str {
        match self {
            RubricElement::Role => "Role",
            RubricElement::Context => "Context",
            RubricElement::ClearTask => "ClearTask",
            RubricElement::OutputFormat => "OutputFormat",
            RubricElement::Constraints => "Constraints",
            RubricElement::Structure => "Structure",
            RubricElement::Examples => "Examples",
            RubricElement::Tone => "Tone",
            RubricElement::Completeness => "Completeness",
            RubricElement::Effectiveness => "Effectiveness",
        }
    }
}

/// Severity band of a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    /// Band a score: below 4 is low, below 7 is medium, anything else high.
    /// Out-of-range values fall into the nearest band.
    pub fn from_score(score: i64) -> Self {
        if score < 4 {
            ScoreBand::Low
        } else if score < 7 {
            ScoreBand::Medium
        } else {
            ScoreBand::High
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreBand::Low => "low",
            ScoreBand::Medium => "medium",
            ScoreBand::High => "high",
        }
    }

    /// Glyph drawn in front of a score tile
    pub fn marker(&self) -> &'static str {
        match self {
            ScoreBand::Low => "✖",
            ScoreBand::Medium => "▲",
            ScoreBand::High => "✔",
        }
    }
}
