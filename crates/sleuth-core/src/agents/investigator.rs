//! The investigator: gathers evidence into its case memory and answers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{percent, Agent, IssuedClue, Referee};
use crate::case::CaseBundle;
use crate::config::SleuthConfig;
use crate::error::SleuthResult;
use crate::extract::{extract, extract_as};
use crate::memory::{CaseMemory, NewspaperClue};
use crate::prompts;
use crate::providers::llm::LlmClient;

/// Newspaper clues at least this similar to a stored one are discarded.
pub const NEWSPAPER_SIMILARITY_THRESHOLD: f64 = 0.7;

/// One analysis turn: the full reply plus the action record it ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigatorStatement {
    pub text: String,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub question: String,
    pub answer: String,
    /// Self-reported, 0-100.
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigatorAnswers {
    pub answers: Vec<Answer>,
}

fn parse_statement(text: &str) -> Option<InvestigatorStatement> {
    let record = extract(text, "action").parsed?;
    let action = record.get("action")?.as_str()?.trim().to_string();
    if action.is_empty() {
        return None;
    }
    let reason = record
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(InvestigatorStatement {
        text: text.to_string(),
        action,
        reason,
    })
}

/// Answers are only accepted when there is exactly one per question.
fn parse_answers(text: &str, expected: usize) -> Option<InvestigatorAnswers> {
    let record = extract(text, "answers").parsed?;
    let items = record.get("answers")?.as_array()?;
    if items.len() != expected {
        return None;
    }
    let answers = items
        .iter()
        .map(|item| {
            let answer = match item.get("answer")? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(Answer {
                question: item
                    .get("question")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                answer,
                confidence: percent(item.get("confidence")?)?,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(InvestigatorAnswers { answers })
}

fn parse_newspaper_clue(text: &str) -> Option<NewspaperClue> {
    let clue: NewspaperClue = extract_as(text, "description")?;
    (!clue.description.trim().is_empty()).then_some(clue)
}

pub struct Investigator {
    agent: Agent,
    case: Arc<CaseBundle>,
    memory: CaseMemory,
}

impl Investigator {
    pub fn new(case: Arc<CaseBundle>, client: Arc<dyn LlmClient>, config: &SleuthConfig) -> Self {
        Self {
            agent: Agent::new(
                "investigator",
                prompts::INVESTIGATOR_SYSTEM,
                client,
                config.window_size,
                config.validation,
            ),
            case,
            memory: CaseMemory::new(config.memory_capacity),
        }
    }

    /// Send setup, questions and informants as the opening turn.
    pub async fn brief(&mut self) -> SleuthResult<String> {
        let briefing = prompts::investigator_briefing(&self.case);
        self.agent.respond(&briefing).await
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn memory(&self) -> &CaseMemory {
        &self.memory
    }

    pub async fn analyze_case(&mut self) -> SleuthResult<InvestigatorStatement> {
        let prompt = prompts::analysis(&self.case, &self.memory);
        let validated = self
            .agent
            .query(
                &prompt,
                "investigator analysis",
                |t| parse_statement(t).is_some(),
                parse_statement,
                true,
            )
            .await?;
        let statement = validated.value;
        info!(action = %statement.action, reason = %statement.reason, "investigator analysis");
        Ok(statement)
    }

    /// File an issued clue in case memory. Dead ends carry no evidence.
    pub fn process_clue(&mut self, statement: &InvestigatorStatement, issued: &IssuedClue) {
        if issued.is_dead_end() {
            debug!("dead end, nothing to remember");
            return;
        }
        self.memory.record_clue(statement.text.as_str(), issued.clue.clone());
        debug!(path = ?self.memory.clue_path(), "clue path");
    }

    /// Relay the referee's words so the exchange stays in the transcript.
    pub async fn acknowledge_referee(&mut self, referee_said: &str) -> SleuthResult<String> {
        self.agent.respond(&prompts::clue_handoff(referee_said)).await
    }

    /// Extract at most one clue from the articles, dropping it when the
    /// referee judges it a repeat of a clue already stored.
    pub async fn process_newspapers(
        &mut self,
        articles: &[String],
        referee: &mut Referee,
    ) -> SleuthResult<Option<NewspaperClue>> {
        let validated = self
            .agent
            .query(
                &prompts::newspapers(articles),
                "newspaper clue",
                |t| parse_newspaper_clue(t).is_some(),
                parse_newspaper_clue,
                true,
            )
            .await?;
        let candidate = validated.value;

        for known in self.memory.newspaper_clues() {
            let similarity = referee
                .similarity(&known.description, &candidate.description)
                .await?;
            if similarity >= NEWSPAPER_SIMILARITY_THRESHOLD {
                info!(similarity, "newspaper clue already known, discarded");
                return Ok(None);
            }
        }

        info!(description = %candidate.description, "newspaper clue recorded");
        self.memory.record_newspaper_clue(candidate.clone());
        Ok(Some(candidate))
    }

    pub async fn answer_questions(&mut self, prompt: &str) -> SleuthResult<InvestigatorAnswers> {
        let expected = self.case.questions.len();
        let validated = self
            .agent
            .query(
                prompt,
                "answers",
                |t| parse_answers(t, expected).is_some(),
                |t| parse_answers(t, expected),
                true,
            )
            .await?;
        Ok(validated.value)
    }

    pub async fn final_theory(&mut self) -> SleuthResult<String> {
        self.agent.respond(prompts::FINAL_THEORY).await
    }
}

impl std::fmt::Debug for Investigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Investigator")
            .field("case", &self.case.name)
            .field("memory", &self.memory)
            .finish()
    }
}
