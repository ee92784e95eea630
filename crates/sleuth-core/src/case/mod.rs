//! Case bundle: the directory of JSON files describing one mystery.
//!
//! Loaded once at session start and treated as immutable ground truth. Any
//! missing file or schema violation is a [`SleuthError::Case`] naming the
//! file; nothing here is retried.

mod model;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SleuthError, SleuthResult};

pub use model::{Clue, ClueCategory, Informant, Question, Setup};
use model::{AnswerEntry, AnswersFile, ClueEntry, NewspapersFile, QuestionsFile};

pub const REQUIRED_FILES: &[&str] = &[
    "setup.json",
    "clues.json",
    "questions.json",
    "answers.json",
    "solution.json",
    "informants.json",
    "newspapers.json",
];

#[derive(Debug, Clone)]
pub struct CaseBundle {
    pub name: String,
    pub dir: PathBuf,
    pub setup: Setup,
    pub clues: Vec<Clue>,
    pub questions: Vec<Question>,
    /// Correct answers, index-aligned with `questions`. Referee only.
    pub answers: Vec<String>,
    pub solution: Value,
    pub informants: Vec<Informant>,
    pub newspapers: Vec<String>,
}

fn load_json_file<T: DeserializeOwned>(dir: &Path, filename: &str) -> SleuthResult<T> {
    let path = dir.join(filename);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| SleuthError::case(&path, format!("failed to read: {}", e)))?;
    serde_json::from_str(&raw).map_err(|e| SleuthError::case(&path, format!("invalid JSON: {}", e)))
}

impl CaseBundle {
    pub fn load(dir: impl AsRef<Path>) -> SleuthResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SleuthError::case(dir, "not a case directory"));
        }

        for file in REQUIRED_FILES {
            let path = dir.join(file);
            if !path.exists() {
                return Err(SleuthError::case(
                    path,
                    format!("required file '{}' is missing from the case directory", file),
                ));
            }
        }

        let setup: Setup = load_json_file(dir, "setup.json")?;
        let clue_entries: Vec<ClueEntry> = load_json_file(dir, "clues.json")?;
        let questions = load_json_file::<QuestionsFile>(dir, "questions.json")?.into_questions();
        let answers = load_json_file::<AnswersFile>(dir, "answers.json")?.into_entries();
        let solution: Value = load_json_file(dir, "solution.json")?;
        let informants: Vec<Informant> = load_json_file(dir, "informants.json")?;
        let newspapers: NewspapersFile = load_json_file(dir, "newspapers.json")?;

        if questions.is_empty() {
            return Err(SleuthError::case(
                dir.join("questions.json"),
                "case has no questions",
            ));
        }
        if questions
            .iter()
            .try_fold(0u32, |acc, q| acc.checked_add(q.points))
            .is_none()
        {
            return Err(SleuthError::case(
                dir.join("questions.json"),
                format!("total points exceed {}", u32::MAX),
            ));
        }
        if answers.len() != questions.len() {
            return Err(SleuthError::case(
                dir.join("answers.json"),
                format!(
                    "{} answer(s) for {} question(s)",
                    answers.len(),
                    questions.len()
                ),
            ));
        }

        let mut clues: Vec<Clue> = Vec::with_capacity(clue_entries.len());
        for entry in clue_entries {
            if clues.iter().any(|c| c.location == entry.location) {
                return Err(SleuthError::case(
                    dir.join("clues.json"),
                    format!("duplicate clue location '{}'", entry.location),
                ));
            }
            let category = entry
                .kind
                .unwrap_or_else(|| infer_category(&entry.location, &informants));
            clues.push(Clue {
                location: entry.location,
                category,
                description: entry.description,
            });
        }
        if clues.is_empty() {
            warn!(dir = %dir.display(), "case has no clues; every lead will be a dead end");
        }

        let name = setup
            .title
            .clone()
            .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "case".to_string());

        let bundle = Self {
            name,
            dir: dir.to_path_buf(),
            setup,
            clues,
            questions,
            answers: answers.into_iter().map(AnswerEntry::into_text).collect(),
            solution,
            informants,
            newspapers: newspapers.into_articles(),
        };
        debug!(case = %bundle.name, clues = bundle.clues.len(), "case loaded");
        Ok(bundle)
    }

    /// Sum of all question points. `load` rejects bundles where this overflows.
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |acc, q| acc.saturating_add(q.points))
    }

    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            name: self.name.clone(),
            clues: self.clues.len(),
            informants: self.informants.len(),
            questions: self.questions.len(),
            max_score: self.max_score(),
            newspaper_articles: self.newspapers.len(),
        }
    }
}

fn infer_category(location: &str, informants: &[Informant]) -> ClueCategory {
    let loc = location.to_lowercase();
    let is_informant = informants.iter().any(|i| {
        let name = i.informant.to_lowercase();
        !name.is_empty() && !loc.is_empty() && (loc.contains(&name) || name.contains(&loc))
    });
    if is_informant {
        ClueCategory::Informant
    } else {
        ClueCategory::Location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseSummary {
    pub name: String,
    pub clues: usize,
    pub informants: usize,
    pub questions: usize,
    pub max_score: u32,
    pub newspaper_articles: usize,
}

impl fmt::Display for CaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "case: {}", self.name)?;
        writeln!(f, "  clues:      {}", self.clues)?;
        writeln!(f, "  informants: {}", self.informants)?;
        writeln!(f, "  questions:  {} ({} points)", self.questions, self.max_score)?;
        write!(f, "  newspapers: {} article(s)", self.newspaper_articles)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    pub(crate) fn write_case(dir: &Path) {
        let files = [
            (
                "setup.json",
                json!({"title": "The Lambeth Poisoner", "description": "A chemist is found dead."}),
            ),
            (
                "clues.json",
                json!([
                    {"location": "Scotland Yard", "description": "Lestrade has the autopsy."},
                    {"location": "Wiggins", "description": "The boy saw a cab at midnight."},
                    {"location": "Lambeth Chemist", "description": "A bottle of arsenic is missing."}
                ]),
            ),
            (
                "questions.json",
                json!([
                    {"question": "Who poisoned the chemist?", "points": 20},
                    {"question": "What was the motive?", "points": 15}
                ]),
            ),
            (
                "answers.json",
                json!([{"answer": "His apprentice"}, "Inheritance"]),
            ),
            ("solution.json", json!({"summary": "The apprentice did it."})),
            (
                "informants.json",
                json!([{"informant": "Wiggins", "description": "Street urchin"}]),
            ),
            ("newspapers.json", json!({"description": "TIMES: Chemist found dead."})),
        ];
        for (name, value) in files {
            std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
        }
    }

    #[test]
    fn loads_complete_bundle() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        let case = CaseBundle::load(tmp.path()).unwrap();

        assert_eq!(case.name, "The Lambeth Poisoner");
        assert_eq!(case.clues.len(), 3);
        assert_eq!(case.answers, vec!["His apprentice", "Inheritance"]);
        assert_eq!(case.newspapers, vec!["TIMES: Chemist found dead."]);
        assert_eq!(case.max_score(), 35);
        assert_eq!(case.clues[0].category, ClueCategory::Location);
        assert_eq!(case.clues[1].category, ClueCategory::Informant);
    }

    #[test]
    fn missing_file_is_a_case_error() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::remove_file(tmp.path().join("informants.json")).unwrap();

        let err = CaseBundle::load(tmp.path()).unwrap_err();
        match err {
            SleuthError::Case { path, message } => {
                assert!(path.ends_with("informants.json"));
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn schema_violation_names_the_file() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::write(
            tmp.path().join("questions.json"),
            r#"[{"question": "Who?", "points": -5}]"#,
        )
        .unwrap();

        let err = CaseBundle::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("questions.json"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn answer_count_must_match_questions() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::write(tmp.path().join("answers.json"), r#"["only one"]"#).unwrap();

        let err = CaseBundle::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("1 answer(s) for 2 question(s)"));
    }

    #[test]
    fn article_list_newspapers() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::write(
            tmp.path().join("newspapers.json"),
            r#"[{"title": "TIMES", "description": "Fog again."}, "Plain article"]"#,
        )
        .unwrap();

        let case = CaseBundle::load(tmp.path()).unwrap();
        assert_eq!(case.newspapers, vec!["TIMES\n\nFog again.", "Plain article"]);
    }

    #[test]
    fn converter_wrapped_questions_and_answers() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::write(
            tmp.path().join("questions.json"),
            r#"{"questions": [{"question": "Who poisoned the chemist?", "points": 20}]}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("answers.json"),
            r#"{"answers": [{"answer": "His apprentice", "points": 20}]}"#,
        )
        .unwrap();

        let case = CaseBundle::load(tmp.path()).unwrap();
        assert_eq!(case.questions.len(), 1);
        assert_eq!(case.answers, vec!["His apprentice"]);
        assert_eq!(case.max_score(), 20);
    }

    #[test]
    fn overflowing_point_total_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        std::fs::write(
            tmp.path().join("questions.json"),
            r#"[{"question": "Who?", "points": 4294967295}, {"question": "Why?", "points": 1}]"#,
        )
        .unwrap();

        let err = CaseBundle::load(tmp.path()).unwrap_err();
        match err {
            SleuthError::Case { path, message } => {
                assert!(path.ends_with("questions.json"));
                assert!(message.contains("total points"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn summary_display() {
        let tmp = TempDir::new().unwrap();
        write_case(tmp.path());
        let s = CaseBundle::load(tmp.path()).unwrap().summary();
        let text = s.to_string();
        assert!(text.contains("questions:  2 (35 points)"));
        assert!(text.contains("clues:      3"));
    }
}
