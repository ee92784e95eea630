//! Prompt templates for both roles.
//!
//! Every structured prompt ends with the JSON shape the reply must contain;
//! the key named there is the one the extractor looks for.

use serde::Serialize;

use crate::agents::{AgentAction, Answer};
use crate::case::{CaseBundle, Clue, Question};
use crate::memory::CaseMemory;

pub(crate) const REFEREE_SYSTEM: &str = "You are a referee in a detective case. You know all the details of the case and will guide an investigator by providing relevant clues and newspaper information based on their current thoughts and questions.";

pub(crate) const INVESTIGATOR_SYSTEM: &str = "You are an investigator trying to solve a case. You will receive information about the case, including textual clues. You should formulate theories, ask questions, and try to solve the case. You can also request to review newspapers in bulk at any time.";

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub(crate) fn referee_briefing(case: &CaseBundle) -> String {
    format!(
        "Here's the case information:\n\n\
         Setup: {}\n\n\
         Clues: {}\n\n\
         Questions to solve: {}\n\n\
         Case Solution: {}\n\n\
         Informants: {}\n",
        pretty(&case.setup),
        pretty(&case.clues),
        pretty(&case.questions),
        pretty(&case.solution),
        pretty(&case.informants),
    )
}

pub(crate) fn investigator_briefing(case: &CaseBundle) -> String {
    format!(
        "Here's the initial case information:\n\n\
         Setup: {}\n\n\
         Questions to solve: {}\n\n\
         You also have knowledge of these informants:\n{}\n\n\
         You can request to review newspapers at any time by stating \"I would like to review the newspapers.\"\n\n\
         Based on this information, what are your initial thoughts? Consider if any of the informants \
         might be relevant to contact first, or if you'd like to review the newspapers.",
        pretty(&case.setup),
        pretty(&case.questions),
        pretty(&case.informants),
    )
}

pub(crate) fn analysis(case: &CaseBundle, memory: &CaseMemory) -> String {
    format!(
        "Here's a summary of all the information you have gathered so far about the case:\n\n\
         Setup: {}\n\n\
         Questions to solve: {}\n\n\
         Informants: {}\n\n\
         {}\n\
         Based on all this information, what are your current thoughts on the case?\n\n\
         Where would you like to investigate next?\n\n\
         Choose exactly one of these options:\n\
         1. If you are confident you know the answer to every question, say you want to provide a solution.\n\
         2. If visiting a person or place mentioned so far would help most, name that person or place.\n\
         3. If talking to one of your informants would help most, name the informant and say why.\n\
         4. If the newspapers surrounding the case would help most, say you want to review the newspapers.\n\n\
         End your reply with a JSON object, where <action> is one of 'provide solution', \
         'visit informant', 'review newspapers' or 'visit person or place' (name the person or place \
         in the action), and <reason> explains why:\n\
         {{\n    \"action\": \"<action>\",\n    \"reason\": \"<reason>\"\n}}",
        pretty(&case.setup),
        pretty(&case.questions),
        pretty(&case.informants),
        memory.render(),
    )
}

pub(crate) fn classification(statement: &str, action: AgentAction) -> String {
    format!(
        "Here is the investigator's latest statement:\n<statement>\n{}\n</statement>\n\n\
         Candidate action: {}\n{}\n\n\
         On a scale of 0-100, how well does this candidate action match what the investigator \
         asked to do next? Score 100 for an explicit request, 0 when it is clearly not what they want.\n\n\
         Format your response as a JSON object:\n\
         {{\n    \"score\": <score>,\n    \"explanation\": \"<explanation>\"\n}}",
        statement,
        action.as_str(),
        action.description(),
    )
}

pub(crate) fn ranking(statement: &str, clue: &Clue, index: usize) -> String {
    format!(
        "Based on the investigator's statement:\n<statement>\n{}\n</statement>\n\n\
         rank the following clue on a scale of 1-100 based on how relevant and helpful it would be \
         to the investigator right now. Higher scores mean more relevant. Provide the score and a \
         brief explanation of why you gave that score.\n\n\
         If the investigator's statement mentions a location or informant that matches this clue's \
         location exactly, give it a score of 100.\n\n\
         Clue to rank:\n{}\n\n\
         Format your response as a JSON object with the following structure:\n\
         {{\n    \"index\": {},\n    \"score\": <score>,\n    \"explanation\": \"<explanation>\"\n}}",
        statement,
        pretty(clue),
        index,
    )
}

pub(crate) fn evaluation(question: &Question, correct: &str, answer: &Answer) -> String {
    format!(
        "Evaluate the following answer:\n\n\
         Question: {} (Points: {})\n\
         Correct answer: {}\n\
         Investigator's answer: {}\n\
         Investigator's confidence: {}%\n\n\
         Provide a detailed evaluation, highlighting what the investigator got right and what they \
         missed. Give an accuracy score from 0 to 100 for this answer, taking into account the \
         confidence level provided by the investigator.\n\n\
         Format your response as a JSON object with the following structure:\n\
         {{\n    \"evaluation\": \"<your detailed evaluation>\",\n    \"accuracy\": <accuracy score 0-100>\n}}",
        question.question, question.points, correct, answer.answer, answer.confidence,
    )
}

pub(crate) fn solution_request(questions: &[Question]) -> String {
    format!(
        "The investigation is now complete. Based on all the evidence you've gathered, please \
         provide your final answers to the following questions:\n\n{}\n\n\
         For each question, in the same order, provide your answer and your confidence level (0-100).\n\
         Format your response as a JSON object with the following structure:\n\
         {{\n    \"answers\": [\n        {{\n            \"question\": \"<question text>\",\n            \
         \"answer\": \"<your answer>\",\n            \"confidence\": <confidence level>\n        }}\n    ]\n}}",
        pretty(questions),
    )
}

pub(crate) fn newspapers(articles: &[String]) -> String {
    format!(
        "You have received the following newspaper articles in bulk:\n\n======\n{}\n======\n\n\
         Please review these articles carefully and identify any information that might be \
         relevant to the case. Consider how it relates to the clues you've already gathered and the \
         questions you need to answer.\n\n\
         Summarize your findings, then end with a JSON object where <description> describes the \
         clue you found and <explanation> says why it matters:\n\
         {{\n    \"description\": \"<description>\",\n    \"explanation\": \"<explanation>\"\n}}",
        articles.join("\n\n------\n\n"),
    )
}

pub(crate) fn similarity(first: &str, second: &str) -> String {
    format!(
        "Compare these two newspaper clues and say how much they describe the same information.\n\n\
         First:\n<clue>\n{}\n</clue>\n\n\
         Second:\n<clue>\n{}\n</clue>\n\n\
         Give a similarity score from 0 (unrelated) to 100 (the same information).\n\
         Format your response as a JSON object:\n\
         {{\n    \"similarity\": <score>\n}}",
        first, second,
    )
}

pub(crate) fn clue_handoff(referee_said: &str) -> String {
    format!(
        "The referee said: {}\nBased on this information, what are your next thoughts or actions?",
        referee_said
    )
}

pub(crate) const FINAL_THEORY: &str = "Before the case is closed, state your final theory: what happened, who is responsible, and which evidence supports it.";
