//! The two roles of an investigation and the plumbing they share.
//!
//! An [`Agent`] owns a system context and a [`Transcript`]; free-text
//! exchanges go through [`Agent::respond`], structured ones through
//! [`Agent::query`], which always runs the retry-until-valid controller.

pub mod investigator;
pub mod referee;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::SleuthResult;
use crate::extract::extract;
use crate::providers::llm::{CompletionRequest, LlmClient};
use crate::retry::{get_validated, RetryPolicy, Validated};
use crate::transcript::{Transcript, Turn};

pub use investigator::{Answer, Investigator, InvestigatorAnswers, InvestigatorStatement};
pub use referee::{Evaluation, IssuedClue, QuestionEvaluation, Referee};

/// What the investigator wants to do next, as classified by the referee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    ProvideSolution,
    ReviewNewspapers,
    VisitInformant,
    VisitLocation,
}

impl AgentAction {
    /// Candidate order for classification. Ties keep the earlier entry.
    pub const ALL: [AgentAction; 4] = [
        AgentAction::ProvideSolution,
        AgentAction::ReviewNewspapers,
        AgentAction::VisitInformant,
        AgentAction::VisitLocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::ProvideSolution => "provide_solution",
            AgentAction::ReviewNewspapers => "review_newspapers",
            AgentAction::VisitInformant => "visit_informant",
            AgentAction::VisitLocation => "visit_location",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentAction::ProvideSolution => {
                "The investigator is confident about every question and is ready to provide a solution."
            }
            AgentAction::ReviewNewspapers => {
                "The investigator wants to review the newspapers surrounding the case."
            }
            AgentAction::VisitInformant => {
                "The investigator wants to talk to one of the known informants."
            }
            AgentAction::VisitLocation => {
                "The investigator wants to visit a person or place mentioned in the case."
            }
        }
    }

    pub fn is_clue_request(&self) -> bool {
        matches!(self, AgentAction::VisitInformant | AgentAction::VisitLocation)
    }
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 0-100 score as models tend to write it: integer, float, or a string
/// such as `"85%"`. Anything outside the range is rejected.
pub(crate) fn percent(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && (0.0..=100.0).contains(&n) {
        Some(n.round() as u8)
    } else {
        None
    }
}

/// [`percent`] of `key` in the last fragment of `text` that owns it.
pub(crate) fn percent_field(text: &str, key: &str) -> Option<u8> {
    percent(extract(text, key).parsed?.get(key)?)
}

pub struct Agent {
    role: &'static str,
    system: String,
    transcript: Transcript,
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl Agent {
    pub fn new(
        role: &'static str,
        system: impl Into<String>,
        client: Arc<dyn LlmClient>,
        window_size: usize,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            role,
            system: system.into(),
            transcript: Transcript::new(window_size),
            client,
            policy,
        }
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest::new(self.system.clone(), self.transcript.window_with(prompt))
    }

    fn record(&mut self, prompt: &str, reply: &str) {
        self.transcript.push(Turn::user(prompt));
        self.transcript.push(Turn::assistant(reply));
    }

    /// Free-text exchange. Both turns are appended once the reply arrives.
    pub async fn respond(&mut self, prompt: &str) -> SleuthResult<String> {
        let request = self.request(prompt);
        let response = self.client.complete(&request).await?;
        debug!(
            role = self.role,
            attempts = response.attempts,
            chars = response.text.len(),
            "reply received"
        );
        self.record(prompt, &response.text);
        Ok(response.text)
    }

    /// Structured exchange through the retry-until-valid controller.
    ///
    /// Only the accepted reply is ever recorded, and only when `record` is set.
    pub async fn query<T, A, F>(
        &mut self,
        prompt: &str,
        what: &str,
        accept: A,
        transform: F,
        record: bool,
    ) -> SleuthResult<Validated<T>>
    where
        A: Fn(&str) -> bool,
        F: Fn(&str) -> Option<T>,
    {
        let request = self.request(prompt);
        let validated = get_validated(
            self.client.as_ref(),
            &request,
            what,
            accept,
            transform,
            &self.policy,
        )
        .await?;
        if record {
            self.record(prompt, &validated.raw);
        }
        Ok(validated)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("provider", &self.client.provider_name())
            .field("turns", &self.transcript.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::FakeClient;
    use crate::transcript::Role;

    fn agent(client: Arc<FakeClient>) -> Agent {
        Agent::new("tester", "be brief", client, 10, RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn respond_records_both_turns() {
        let client = Arc::new(FakeClient::new("fake").with_response("noted"));
        let mut a = agent(client.clone());

        let reply = a.respond("hello").await.unwrap();
        assert_eq!(reply, "noted");
        assert_eq!(a.transcript().len(), 2);
        assert_eq!(a.transcript().turns()[0].role, Role::User);
        assert_eq!(a.transcript().turns()[1].content, "noted");

        let requests = client.requests();
        let sent = &requests[0];
        assert_eq!(sent.system, "be brief");
        assert_eq!(sent.prompt(), "hello");
    }

    #[tokio::test]
    async fn query_records_only_accepted_reply() {
        let client = Arc::new(
            FakeClient::new("fake").with_responses(["nope", r#"{"score": 40}"#]),
        );
        let mut a = agent(client.clone());

        let v = a
            .query(
                "score it",
                "score",
                |t| extract(t, "score").is_valid,
                |t| extract(t, "score").parsed?.get("score")?.as_u64(),
                true,
            )
            .await
            .unwrap();
        assert_eq!(v.value, 40);
        let turns = a.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, r#"{"score": 40}"#);
    }

    #[tokio::test]
    async fn unrecorded_query_leaves_transcript_alone() {
        let client = Arc::new(FakeClient::new("fake").with_response(r#"{"score": 1}"#));
        let mut a = agent(client);
        a.query(
            "score it",
            "score",
            |t| extract(t, "score").is_valid,
            |t| extract(t, "score").parsed?.get("score")?.as_u64(),
            false,
        )
        .await
        .unwrap();
        assert!(a.transcript().is_empty());
    }

    #[test]
    fn percent_accepts_common_spellings() {
        assert_eq!(percent_field(r#"{"score": 85}"#, "score"), Some(85));
        assert_eq!(percent_field(r#"{"score": 72.6}"#, "score"), Some(73));
        assert_eq!(percent_field(r#"{"score": "90%"}"#, "score"), Some(90));
        assert_eq!(percent_field(r#"{"score": 101}"#, "score"), None);
        assert_eq!(percent_field(r#"{"score": -1}"#, "score"), None);
        assert_eq!(percent_field(r#"{"score": "high"}"#, "score"), None);
        assert_eq!(percent_field("no json", "score"), None);
    }

    #[test]
    fn action_labels() {
        assert_eq!(AgentAction::ALL[0], AgentAction::ProvideSolution);
        assert_eq!(AgentAction::ReviewNewspapers.to_string(), "review_newspapers");
        assert!(AgentAction::VisitLocation.is_clue_request());
        assert!(!AgentAction::ProvideSolution.is_clue_request());
        let json = serde_json::to_string(&AgentAction::VisitInformant).unwrap();
        assert_eq!(json, "\"visit_informant\"");
    }
}
