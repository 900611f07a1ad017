use crate::models::{EvaluationResult, RubricElement, ScoreBand};
use crate::error::EvalError;
use crate::scenarios;
use crate::session::ScoreLog;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use std::fmt::Write as _;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Rendering options for one terminal
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub format: OutputFormat,
    pub color: bool,
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub const NO_ISSUES: &str = "✅ No issues detected. Great prompt!";
pub const TRY_AGAIN: &str = "Edit your prompt and evaluate again to see your progress!";

/// Heading and question for a scenario
pub fn render_question(scenario: &str, style: Style) -> Result<String, EvalError> {
    let question = scenarios::lookup(scenario)?;
    let title = format!("🟣 {} - Prompt Evaluator", scenario);
    let title = if style.color {
        title.magenta().bold().to_string()
    } else {
        title
    };
    Ok(format!("{}\n\n📝 Question\n{}\n", title, question))
}

/// Numbered scenario listing for the selector, marking `current`
pub fn render_scenario_list(current: &str) -> String {
    let mut out = String::from("Activities\n");
    for (i, name) in scenarios::names().enumerate() {
        let marker = if name == current { '*' } else { ' ' };
        let _ = writeln!(out, "{} {:>2}. {}", marker, i + 1, name);
    }
    out
}

/// Render one evaluation in the requested format
pub fn render_result(result: &EvaluationResult, style: Style) -> String {
    match style.format {
        OutputFormat::Plain => render_dashboard(result, style.color),
        OutputFormat::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => format!("{}\n", json),
            Err(e) => format!("Error serializing result to JSON: {}\n", e),
        },
    }
}

/// Score tiles, overall banner, issues, tips and the improved prompt
pub fn render_dashboard(result: &EvaluationResult, color: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 Score Dashboard");
    let _ = writeln!(out, "------------------");
    for element in RubricElement::ALL {
        let _ = writeln!(out, "{}", render_tile(element, result.score(element), color));
    }
    out.push('\n');

    let banner = format!("Overall Score: {}/10", result.overall);
    let _ = writeln!(out, "{}", paint(&banner, ScoreBand::from_score(result.overall), color));
    out.push('\n');

    let _ = writeln!(out, "❌ What went wrong / missing");
    if result.issues.is_empty() {
        let _ = writeln!(out, "  {}", NO_ISSUES);
    } else {
        for issue in &result.issues {
            let _ = writeln!(out, "  • {}", issue);
        }
    }
    out.push('\n');

    let _ = writeln!(out, "💡 Tips to Improve");
    for tip in &result.suggestions {
        let _ = writeln!(out, "  • {}", tip);
    }
    out.push('\n');

    let _ = writeln!(out, "✨ Example Improved Prompt");
    let _ = writeln!(out, "```");
    let _ = writeln!(out, "{}", result.improved_prompt);
    let _ = writeln!(out, "```");

    out
}

/// One score tile: band marker, element name, score and band label
fn render_tile(element: RubricElement, score: i64, color: bool) -> String {
    let band = ScoreBand::from_score(score);
    let tile = format!("{} {:<14} {:>3}/10  {}", band.marker(), element.key(), score, band.name());
    format!("  {}", paint(&tile, band, color))
}

fn paint(text: &str, band: ScoreBand, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match band {
        ScoreBand::Low => text.red().to_string(),
        ScoreBand::Medium => text.yellow().to_string(),
        ScoreBand::High => text.green().to_string(),
    }
}

/// Progress chart of Overall scores; `None` until two attempts exist
pub fn render_trend(log: &ScoreLog) -> Option<String> {
    if !log.has_trend() {
        return None;
    }

    let spark: String = log.values().iter().map(|score| spark_char(*score)).collect();
    let sequence = log
        .values()
        .iter()
        .map(|score| score.to_string())
        .collect::<Vec<_>>()
        .join(" → ");

    Some(format!("📈 Progress Tracker\n  {}  {}\n", spark, sequence))
}

fn spark_char(score: i64) -> char {
    let clamped = score.clamp(0, 10) as usize;
    SPARK_LEVELS[clamped * (SPARK_LEVELS.len() - 1) / 10]
}

/// An evaluation followed by the trend so far and the try-again hint
pub fn render_evaluation(result: &EvaluationResult, log: &ScoreLog, style: Style) -> String {
    let mut out = render_result(result, style);
    if let OutputFormat::Plain = style.format {
        if let Some(trend) = render_trend(log) {
            out.push('\n');
            out.push_str(&trend);
        }
        out.push('\n');
        let _ = writeln!(out, "{}", TRY_AGAIN);
    }
    out
}
