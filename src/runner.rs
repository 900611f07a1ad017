use crate::error::EvalError;
use crate::evaluation::PromptEvaluator;
use crate::output::{self, Style};
use crate::session::Session;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error};

const HELP: &str = "\
Type your prompt, then a line containing only '.' to evaluate it.
Commands (at the start of a prompt):
  :list              show all activities
  :scenario <name|n> switch activity
  :question          show the current question again
  :report            download the latest report
  :history           show Overall scores so far
  :help              show this help
  :quit              end the session";

/// A line typed while no prompt is being composed
#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Scenario(String),
    Question,
    Report,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse `:command args`; `None` when the line is prompt text
    fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(':')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let command = match name {
            "list" | "ls" => Command::List,
            "scenario" | "s" => Command::Scenario(arg.to_string()),
            "question" => Command::Question,
            "report" | "download" => Command::Report,
            "history" => Command::History,
            "help" | "h" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Drives one interactive session over a line-oriented terminal
pub struct Runner<E, R, W> {
    session: Session<E>,
    input: R,
    out: W,
    style: Style,
    report_dir: PathBuf,
}

impl<E: PromptEvaluator, R: BufRead, W: Write> Runner<E, R, W> {
    pub fn new(session: Session<E>, input: R, out: W, style: Style, report_dir: PathBuf) -> Self {
        Self {
            session,
            input,
            out,
            style,
            report_dir,
        }
    }

    /// Run until `:quit` or end of input. A prompt still being composed at end
    /// of input is evaluated before returning.
    pub async fn run(&mut self) -> Result<()> {
        self.show_question()?;
        writeln!(self.out, "\n{}\n", HELP)?;

        let mut prompt = String::new();
        loop {
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("Failed to read from input")?;
            if read == 0 {
                if !prompt.trim().is_empty() {
                    self.evaluate(&prompt).await?;
                }
                break;
            }
            let line = line.trim_end_matches(['\n', '\r']);

            if prompt.trim().is_empty() {
                if let Some(command) = Command::parse(line) {
                    prompt.clear();
                    if !self.handle_command(command)? {
                        break;
                    }
                    continue;
                }
            }

            if line == "." {
                self.evaluate(&prompt).await?;
                prompt.clear();
            } else if prompt.is_empty() && line.trim().is_empty() {
                // blank lines before any prompt text are not part of the prompt
            } else {
                prompt.push_str(line);
                prompt.push('\n');
            }
        }

        debug!(attempts = self.session.log().len(), "session ended");
        Ok(())
    }

    /// Evaluate once and optionally write the report, as the one-shot CLI does
    pub async fn run_once(&mut self, prompt: &str, write_report: bool) -> Result<()> {
        self.show_question()?;
        writeln!(self.out)?;

        self.session.submit(prompt).await?;
        self.show_latest()?;

        if write_report {
            self.download_report()?;
        }
        Ok(())
    }

    /// Returns `false` when the session should end
    fn handle_command(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::List => {
                let listing = output::render_scenario_list(self.session.scenario().name);
                write!(self.out, "{}", listing)?;
            }
            Command::Scenario(input) => match self.session.select_scenario(&input) {
                Ok(_) => self.show_question()?,
                Err(err) => writeln!(self.out, "⚠ {}", err)?,
            },
            Command::Question => self.show_question()?,
            Command::Report => self.download_report()?,
            Command::History => {
                let log = self.session.log();
                if log.is_empty() {
                    writeln!(self.out, "No attempts yet.")?;
                } else {
                    writeln!(self.out, "Attempts: {:?}", log.values())?;
                    if let Some(trend) = output::render_trend(log) {
                        write!(self.out, "{}", trend)?;
                    }
                }
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(false),
            Command::Unknown(name) => {
                writeln!(self.out, "Unknown command ':{}'. Type :help for commands.", name)?
            }
        }
        Ok(true)
    }

    /// Submit a prompt; evaluation failures are reported and the session goes on
    async fn evaluate(&mut self, prompt: &str) -> Result<()> {
        let prompt = prompt.trim_end_matches('\n');
        let outcome = self.session.submit(prompt).await.map(|_| ());
        match outcome {
            Ok(()) => self.show_latest()?,
            Err(EvalError::EmptyInput) => writeln!(self.out, "⚠ {}", EvalError::EmptyInput)?,
            Err(err) => writeln!(self.out, "✖ Evaluation failed: {}", err)?,
        }
        Ok(())
    }

    fn show_question(&mut self) -> Result<()> {
        let text = output::render_question(self.session.scenario().name, self.style)?;
        write!(self.out, "{}", text)?;
        Ok(())
    }

    fn show_latest(&mut self) -> Result<()> {
        if let Some(report) = self.session.latest_report() {
            let text = output::render_evaluation(&report.result, self.session.log(), self.style);
            writeln!(self.out)?;
            write!(self.out, "{}", text)?;
        }
        Ok(())
    }

    fn download_report(&mut self) -> Result<()> {
        let Some(report) = self.session.latest_report() else {
            writeln!(self.out, "Nothing to download yet. Evaluate a prompt first.")?;
            return Ok(());
        };
        match report.write_to(&self.report_dir) {
            Ok(path) => writeln!(self.out, "⬇ Report saved to {}", path.display())?,
            Err(err) => {
                error!(error = %format!("{err:#}"), "report download failed");
                writeln!(self.out, "✖ Could not save report: {:#}", err)?;
            }
        }
        Ok(())
    }
}
