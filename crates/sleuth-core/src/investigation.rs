//! The investigation loop.
//!
//! ```text
//! Initializing -> Iterating -> Evaluating -> Done
//! ```
//!
//! Iterating runs at most `max_iterations` rounds of analyze, classify and
//! dispatch. Reaching the limit forces Evaluating; a `provide_solution`
//! classification enters it immediately. Any error aborts the run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::agents::{AgentAction, Investigator, Referee};
use crate::case::CaseBundle;
use crate::config::SleuthConfig;
use crate::error::{SleuthError, SleuthResult};
use crate::providers::llm::LlmClient;
use crate::report::{InvestigationReport, IterationRecord, Termination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Iterating,
    Evaluating,
    Done,
}

#[derive(Debug)]
pub struct Investigation {
    case: Arc<CaseBundle>,
    referee: Referee,
    investigator: Investigator,
    max_iterations: u32,
    output_dir: Option<PathBuf>,
    phase: Phase,
    iterations: u32,
    termination: Option<Termination>,
    history: Vec<IterationRecord>,
    report: Option<InvestigationReport>,
}

impl Investigation {
    pub fn new(case: CaseBundle, client: Arc<dyn LlmClient>, config: &SleuthConfig) -> Self {
        let case = Arc::new(case);
        Self {
            referee: Referee::new(Arc::clone(&case), Arc::clone(&client), config),
            investigator: Investigator::new(Arc::clone(&case), client, config),
            case,
            max_iterations: config.max_iterations,
            output_dir: None,
            phase: Phase::Initializing,
            iterations: 0,
            termination: None,
            history: Vec::new(),
            report: None,
        }
    }

    /// Persist `report.json` / `report.txt` here when the run finishes.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn referee(&self) -> &Referee {
        &self.referee
    }

    pub fn investigator(&self) -> &Investigator {
        &self.investigator
    }

    /// Drive the state machine to Done.
    pub async fn run(mut self) -> SleuthResult<InvestigationReport> {
        loop {
            match self.phase {
                Phase::Initializing => self.initialize().await?,
                Phase::Iterating => self.iterate().await?,
                Phase::Evaluating => self.evaluate().await?,
                Phase::Done => {
                    return self.report.take().ok_or_else(|| SleuthError::Report {
                        message: "investigation finished without a report".to_string(),
                    });
                }
            }
        }
    }

    async fn initialize(&mut self) -> SleuthResult<()> {
        info!(case = %self.case.name, max_iterations = self.max_iterations, "starting investigation");
        self.referee.brief().await?;
        self.investigator.brief().await?;
        self.phase = Phase::Iterating;
        Ok(())
    }

    async fn iterate(&mut self) -> SleuthResult<()> {
        if self.iterations >= self.max_iterations {
            warn!(iterations = self.iterations, "maximum iterations reached, evaluating");
            self.enter_evaluation(Termination::IterationLimit);
            return Ok(());
        }
        self.iterations += 1;
        let iteration = self.iterations;
        info!(iteration, "investigation iteration");

        let statement = self.investigator.analyze_case().await?;
        let action = self
            .referee
            .rank_or_choose_next_action(&statement.text)
            .await?;

        let outcome = match action {
            AgentAction::ProvideSolution => {
                self.enter_evaluation(Termination::Solved);
                "ready to provide a solution".to_string()
            }
            AgentAction::ReviewNewspapers => {
                let articles = self.referee.provide_newspapers();
                info!(articles = articles.len(), "providing newspaper articles");
                match self
                    .investigator
                    .process_newspapers(&articles, &mut self.referee)
                    .await?
                {
                    Some(clue) => format!("newspaper clue: {}", clue.description),
                    None => "no new newspaper clue".to_string(),
                }
            }
            AgentAction::VisitInformant | AgentAction::VisitLocation => {
                let issued = self.referee.provide_best_clue(&statement.text).await?;
                self.investigator.process_clue(&statement, &issued);
                self.investigator
                    .acknowledge_referee(&issued.message())
                    .await?;
                match issued.index {
                    Some(index) => format!("clue {}: {}", index, issued.clue.location),
                    None => "dead end".to_string(),
                }
            }
        };

        self.history.push(IterationRecord {
            iteration,
            action,
            outcome,
        });
        Ok(())
    }

    fn enter_evaluation(&mut self, termination: Termination) {
        self.termination = Some(termination);
        self.phase = Phase::Evaluating;
    }

    async fn evaluate(&mut self) -> SleuthResult<()> {
        let prompt = self.referee.ask_for_solution();
        let answers = self.investigator.answer_questions(&prompt).await?;
        let evaluation = self.referee.evaluate_answer(&answers).await?;
        let final_theory = self.investigator.final_theory().await?;

        let report = InvestigationReport {
            case: self.case.name.clone(),
            generated_at: Utc::now(),
            termination: self.termination.unwrap_or(Termination::IterationLimit),
            iterations: self.iterations,
            max_iterations: self.max_iterations,
            history: std::mem::take(&mut self.history),
            clue_path: self.investigator.memory().clue_path().to_vec(),
            newspaper_clues: self.investigator.memory().newspaper_clues().to_vec(),
            answers,
            evaluation,
            final_theory,
            solution: self.case.solution.clone(),
        };
        info!(
            total_score = report.evaluation.total_score,
            max_score = report.evaluation.max_score,
            "investigation evaluated"
        );

        if let Some(dir) = &self.output_dir {
            report.write(dir)?;
        }
        self.report = Some(report);
        self.phase = Phase::Done;
        Ok(())
    }
}
