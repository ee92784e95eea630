//! Result artifact of a finished investigation.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::{AgentAction, Evaluation, InvestigatorAnswers};
use crate::error::{SleuthError, SleuthResult};
use crate::memory::NewspaperClue;

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_TEXT: &str = "report.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The investigator asked to provide a solution.
    Solved,
    /// `max_iterations` ran out first.
    IterationLimit,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Solved => "solved",
            Termination::IterationLimit => "iteration_limit",
        }
    }
}

/// What happened in one iteration of the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub action: AgentAction,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationReport {
    pub case: String,
    pub generated_at: DateTime<Utc>,
    pub termination: Termination,
    pub iterations: u32,
    pub max_iterations: u32,
    pub history: Vec<IterationRecord>,
    pub clue_path: Vec<String>,
    pub newspaper_clues: Vec<NewspaperClue>,
    pub answers: InvestigatorAnswers,
    pub evaluation: Evaluation,
    pub final_theory: String,
    pub solution: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub text: PathBuf,
}

impl InvestigationReport {
    pub fn score_line(&self) -> String {
        format!(
            "Total Score: {}/{}",
            self.evaluation.total_score, self.evaluation.max_score
        )
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Case: {}", self.case);
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "Termination: {} after {} iteration(s) (limit {})",
            self.termination.as_str(),
            self.iterations,
            self.max_iterations
        );
        let _ = writeln!(out, "\n{}\n", self.score_line());

        for q in &self.evaluation.per_question {
            let _ = writeln!(out, "Question: {}", q.question);
            let _ = writeln!(out, "Answer: {}", q.answer);
            let _ = writeln!(out, "Evaluation: {}", q.evaluation);
            let _ = writeln!(out, "Score: {}/{} (accuracy {}%)", q.score, q.points, q.accuracy);
            let _ = writeln!(out, "---");
        }

        let _ = writeln!(out, "\nClue path:");
        if self.clue_path.is_empty() {
            let _ = writeln!(out, "(none)");
        }
        for step in &self.clue_path {
            let _ = writeln!(out, "- {}", step);
        }

        let _ = writeln!(out, "\nNewspaper clues:");
        if self.newspaper_clues.is_empty() {
            let _ = writeln!(out, "(none)");
        }
        for clue in &self.newspaper_clues {
            let _ = writeln!(out, "- {} ({})", clue.description, clue.explanation);
        }

        let _ = writeln!(out, "\nFinal theory:\n{}", self.final_theory.trim());
        let solution = match &self.solution {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        };
        let _ = writeln!(out, "\nTrue solution:\n{}", solution);
        out
    }

    /// Write `report.json` and `report.txt` into `dir`, creating it if needed.
    pub fn write(&self, dir: &Path) -> SleuthResult<ReportPaths> {
        std::fs::create_dir_all(dir).map_err(|e| SleuthError::Report {
            message: format!("failed to create {}: {}", dir.display(), e),
        })?;

        let paths = ReportPaths {
            json: dir.join(REPORT_JSON),
            text: dir.join(REPORT_TEXT),
        };
        let json = serde_json::to_string_pretty(self)?;
        for (path, body) in [(&paths.json, json), (&paths.text, self.render_text())] {
            std::fs::write(path, body).map_err(|e| SleuthError::Report {
                message: format!("failed to write {}: {}", path.display(), e),
            })?;
        }
        tracing::info!(dir = %dir.display(), "report written");
        Ok(paths)
    }
}
