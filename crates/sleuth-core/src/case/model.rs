use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opening scenario handed to both roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    /// Any further keys of `setup.json`, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueCategory {
    Location,
    Informant,
    DeadEnd,
}

impl ClueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClueCategory::Location => "location",
            ClueCategory::Informant => "informant",
            ClueCategory::DeadEnd => "dead_end",
        }
    }
}

/// A discoverable unit of evidence. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    /// Location or informant identity; unique within a case.
    pub location: String,
    pub category: ClueCategory,
    pub description: String,
}

impl Clue {
    pub fn dead_end() -> Self {
        Self {
            location: "nowhere new".to_string(),
            category: ClueCategory::DeadEnd,
            description: "Think of a different way around the case. You have already seen the most relevant clues here.".to_string(),
        }
    }

    pub fn is_dead_end(&self) -> bool {
        self.category == ClueCategory::DeadEnd
    }
}

/// `clues.json` entry as written by case authors.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClueEntry {
    pub location: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<ClueCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub points: u32,
}

/// `questions.json`: a bare list or `{"questions": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum QuestionsFile {
    List(Vec<Question>),
    Wrapped { questions: Vec<Question> },
}

impl QuestionsFile {
    pub fn into_questions(self) -> Vec<Question> {
        match self {
            QuestionsFile::List(list) | QuestionsFile::Wrapped { questions: list } => list,
        }
    }
}

/// `answers.json`: a bare list or `{"answers": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AnswersFile {
    List(Vec<AnswerEntry>),
    Wrapped { answers: Vec<AnswerEntry> },
}

impl AnswersFile {
    pub fn into_entries(self) -> Vec<AnswerEntry> {
        match self {
            AnswersFile::List(list) | AnswersFile::Wrapped { answers: list } => list,
        }
    }
}

/// A plain string or `{"answer": ..}`; other keys such as `points` are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum AnswerEntry {
    Text(String),
    Object { answer: String },
}

impl AnswerEntry {
    pub fn into_text(self) -> String {
        match self {
            AnswerEntry::Text(s) => s,
            AnswerEntry::Object { answer } => answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Informant {
    pub informant: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ArticleEntry {
    Text(String),
    Object {
        #[serde(default)]
        title: Option<String>,
        description: String,
    },
}

impl ArticleEntry {
    pub fn into_text(self) -> String {
        match self {
            ArticleEntry::Text(s) => s,
            ArticleEntry::Object {
                title: Some(title),
                description,
            } => format!("{}\n\n{}", title, description),
            ArticleEntry::Object {
                title: None,
                description,
            } => description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NewspapersFile {
    Bulk { description: String },
    Articles(Vec<ArticleEntry>),
}

impl NewspapersFile {
    pub fn into_articles(self) -> Vec<String> {
        match self {
            NewspapersFile::Bulk { description } => vec![description],
            NewspapersFile::Articles(list) => list.into_iter().map(ArticleEntry::into_text).collect(),
        }
    }
}
