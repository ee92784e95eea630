//! The referee: holds the case truth, hands out clues and scores answers.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{percent_field, Agent, AgentAction, InvestigatorAnswers};
use crate::case::{CaseBundle, Clue};
use crate::config::SleuthConfig;
use crate::error::SleuthResult;
use crate::extract::extract;
use crate::prompts;
use crate::providers::llm::LlmClient;

/// A clue handed to the investigator, or the dead-end marker (`index: None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedClue {
    pub index: Option<usize>,
    pub clue: Clue,
    /// Why the referee picked it, in the model's words.
    pub relevance: String,
}

impl IssuedClue {
    fn dead_end() -> Self {
        Self {
            index: None,
            clue: Clue::dead_end(),
            relevance: String::new(),
        }
    }

    pub fn is_dead_end(&self) -> bool {
        self.index.is_none()
    }

    /// What the referee tells the investigator.
    pub fn message(&self) -> String {
        if self.is_dead_end() {
            return self.clue.description.clone();
        }
        let mut text = format!(
            "Based on your current line of inquiry, I think you should investigate {}. \
             Here's what you find:\n\n{}",
            self.clue.location, self.clue.description
        );
        if !self.relevance.is_empty() {
            text.push_str(&format!("\n\nRelevance: {}", self.relevance));
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEvaluation {
    pub question: String,
    pub points: u32,
    pub answer: String,
    pub evaluation: String,
    /// Referee-assigned accuracy, 0-100.
    pub accuracy: u8,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub per_question: Vec<QuestionEvaluation>,
    pub total_score: u32,
    pub max_score: u32,
}

/// `floor(accuracy / 100 * points)`, never above `points`.
pub fn question_score(points: u32, accuracy: u8) -> u32 {
    let accuracy = u64::from(accuracy.min(100));
    (u64::from(points) * accuracy / 100) as u32
}

struct Ranked {
    index: usize,
    score: u8,
    exact: bool,
    explanation: String,
}

pub struct Referee {
    agent: Agent,
    case: Arc<CaseBundle>,
    returned: BTreeSet<usize>,
    min_relevance: u8,
}

impl Referee {
    pub fn new(case: Arc<CaseBundle>, client: Arc<dyn LlmClient>, config: &SleuthConfig) -> Self {
        Self {
            agent: Agent::new(
                "referee",
                prompts::REFEREE_SYSTEM,
                client,
                config.window_size,
                config.validation,
            ),
            case,
            returned: BTreeSet::new(),
            min_relevance: config.min_clue_relevance,
        }
    }

    /// Send the full case truth as the opening turn.
    pub async fn brief(&mut self) -> SleuthResult<String> {
        let briefing = prompts::referee_briefing(&self.case);
        self.agent.respond(&briefing).await
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn returned_clues(&self) -> &BTreeSet<usize> {
        &self.returned
    }

    async fn score(&mut self, prompt: &str, what: &str) -> SleuthResult<(u8, String)> {
        let validated = self
            .agent
            .query(
                prompt,
                what,
                |t| percent_field(t, "score").is_some(),
                |t| {
                    let score = percent_field(t, "score")?;
                    let explanation = extract(t, "score")
                        .parsed
                        .and_then(|v| v.get("explanation")?.as_str().map(str::to_string))
                        .unwrap_or_default();
                    Some((score, explanation))
                },
                false,
            )
            .await?;
        Ok(validated.value)
    }

    /// Classify a statement by scoring every candidate action separately.
    pub async fn rank_or_choose_next_action(&mut self, statement: &str) -> SleuthResult<AgentAction> {
        let mut best: Option<(AgentAction, u8)> = None;
        for action in AgentAction::ALL {
            let (score, _) = self
                .score(&prompts::classification(statement, action), "action classification")
                .await?;
            debug!(action = %action, score, "candidate action scored");
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((action, score)),
            }
        }
        let (action, score) = best.unwrap_or((AgentAction::VisitLocation, 0));
        info!(action = %action, score, "next action chosen");
        Ok(action)
    }

    /// Rank every clue not yet handed out and issue the best one.
    ///
    /// A clue whose location the statement names verbatim scores 100 and wins
    /// ties. Nothing left, or nothing at least `min_clue_relevance`, is a dead end.
    pub async fn provide_best_clue(&mut self, statement: &str) -> SleuthResult<IssuedClue> {
        let case = Arc::clone(&self.case);
        let lowered = statement.to_lowercase();
        let mut ranked = Vec::new();

        for (index, clue) in case.clues.iter().enumerate() {
            if self.returned.contains(&index) {
                continue;
            }
            let (score, explanation) = self
                .score(&prompts::ranking(statement, clue, index), "clue ranking")
                .await?;
            let location = clue.location.to_lowercase();
            let exact = !location.is_empty() && lowered.contains(&location);
            ranked.push(Ranked {
                index,
                score: if exact { 100 } else { score },
                exact,
                explanation,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.exact.cmp(&a.exact))
                .then(a.index.cmp(&b.index))
        });

        let Some(best) = ranked.into_iter().next() else {
            info!("every clue already returned, dead end");
            return Ok(IssuedClue::dead_end());
        };
        if best.score < self.min_relevance {
            info!(best = best.score, "no relevant clue left, dead end");
            return Ok(IssuedClue::dead_end());
        }

        self.returned.insert(best.index);
        let clue = case.clues[best.index].clone();
        info!(index = best.index, location = %clue.location, score = best.score, "clue issued");
        Ok(IssuedClue {
            index: Some(best.index),
            clue,
            relevance: best.explanation,
        })
    }

    pub fn provide_newspapers(&self) -> Vec<String> {
        self.case.newspapers.clone()
    }

    pub fn ask_for_solution(&self) -> String {
        prompts::solution_request(&self.case.questions)
    }

    /// Similarity of two texts, normalized to 0.0..=1.0.
    pub async fn similarity(&mut self, first: &str, second: &str) -> SleuthResult<f64> {
        let validated = self
            .agent
            .query(
                &prompts::similarity(first, second),
                "similarity score",
                |t| percent_field(t, "similarity").is_some(),
                |t| percent_field(t, "similarity"),
                false,
            )
            .await?;
        Ok(f64::from(validated.value) / 100.0)
    }

    pub async fn evaluate_answer(&mut self, answers: &InvestigatorAnswers) -> SleuthResult<Evaluation> {
        let case = Arc::clone(&self.case);
        let mut per_question = Vec::with_capacity(case.questions.len());

        for (i, (question, correct)) in case.questions.iter().zip(&case.answers).enumerate() {
            let Some(answer) = answers.answers.get(i) else {
                warn!(question = i + 1, "no answer given, scoring zero");
                per_question.push(QuestionEvaluation {
                    question: question.question.clone(),
                    points: question.points,
                    answer: String::new(),
                    evaluation: "No answer was given.".to_string(),
                    accuracy: 0,
                    score: 0,
                });
                continue;
            };

            let validated = self
                .agent
                .query(
                    &prompts::evaluation(question, correct, answer),
                    "answer evaluation",
                    |t| percent_field(t, "accuracy").is_some(),
                    |t| {
                        let accuracy = percent_field(t, "accuracy")?;
                        let evaluation = extract(t, "accuracy")
                            .parsed
                            .and_then(|v| v.get("evaluation")?.as_str().map(str::to_string))
                            .unwrap_or_default();
                        Some((accuracy, evaluation))
                    },
                    false,
                )
                .await?;
            let (accuracy, evaluation) = validated.value;
            let score = question_score(question.points, accuracy);
            debug!(question = i + 1, accuracy, score, points = question.points, "answer scored");

            per_question.push(QuestionEvaluation {
                question: question.question.clone(),
                points: question.points,
                answer: answer.answer.clone(),
                evaluation,
                accuracy,
                score,
            });
        }

        let max_score = case.max_score();
        let total_score = per_question
            .iter()
            .fold(0u32, |acc, q| acc.saturating_add(q.score))
            .min(max_score);
        info!(total_score, max_score, "answers evaluated");
        Ok(Evaluation {
            per_question,
            total_score,
            max_score,
        })
    }
}

impl std::fmt::Debug for Referee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Referee")
            .field("case", &self.case.name)
            .field("returned", &self.returned)
            .finish()
    }
}
