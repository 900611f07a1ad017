use crate::models::EvaluationResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the downloadable report
pub const REPORT_FILE_NAME: &str = "prompt_report.txt";

/// Plain-text record of one evaluation
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub scenario: String,
    pub prompt: String,
    pub result: EvaluationResult,
}

impl Report {
    /// Render the report body. The result is pretty-printed with two-space
    /// indentation; the prompt is copied verbatim.
    pub fn render(&self) -> Result<String> {
        let scores = serde_json::to_string_pretty(&self.result)
            .context("Failed to serialize evaluation result")?;

        Ok(format!(
            "\nPROMPT EVALUATION REPORT\nDate: {}\nScenario: {}\n\nPrompt:\n{}\n\nScores:\n{}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.scenario,
            self.prompt,
            scores
        ))
    }

    /// Write the report as `prompt_report.txt` inside `dir`, returning the path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let content = self.render()?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let path = dir.join(REPORT_FILE_NAME);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write report to: {}", path.display()))?;

        info!(path = %path.display(), "report written");
        Ok(path)
    }
}
