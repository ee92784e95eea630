//! End-to-end runs of the investigation state machine against a scripted
//! model.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use sleuth_core::agents::AgentAction;
use sleuth_core::providers::llm::{CompletionRequest, FakeClient};
use sleuth_core::retry::RetryPolicy;
use sleuth_core::{CaseBundle, Investigation, SleuthConfig, SleuthError, Termination};
use tempfile::TempDir;

fn write_case(dir: &Path) {
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
        ("answers.json", json!(["His apprentice", "Inheritance"])),
        ("solution.json", json!("The apprentice poisoned him for the shop.")),
        (
            "informants.json",
            json!([{"informant": "Wiggins", "description": "Street urchin"}]),
        ),
        (
            "newspapers.json",
            json!([
                {"title": "TIMES", "description": "Chemist found dead in Lambeth."},
                {"title": "GAZETTE", "description": "Apprentice to inherit the shop."}
            ]),
        ),
    ];
    for (name, value) in files {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }
}

fn load_case() -> (TempDir, CaseBundle) {
    let tmp = TempDir::new().unwrap();
    write_case(tmp.path());
    let case = CaseBundle::load(tmp.path()).unwrap();
    (tmp, case)
}

fn config(max_iterations: u32) -> SleuthConfig {
    SleuthConfig::default()
        .with_max_iterations(max_iterations)
        .with_validation(RetryPolicy::immediate(3))
}

const VISIT: &str = r#"The chemist's shop is the obvious start.
{"action": "visit person or place: Lambeth Chemist", "reason": "the poison came from somewhere"}"#;
const PAPERS: &str = r#"The press may know more.
{"action": "review newspapers", "reason": "background"}"#;
const SOLVE: &str = r#"I have it.
{"action": "provide solution", "reason": "every question is answered"}"#;

/// A model that plays both roles. Analysis replies follow `plan`, the last
/// entry repeating once the plan runs out.
fn scripted(plan: Vec<&'static str>) -> FakeClient {
    let analyses = AtomicUsize::new(0);
    FakeClient::new("scripted").with_responder(move |req: &CompletionRequest| {
        let p = req.prompt();
        if p.contains("Candidate action:") {
            let wants = if p.contains("provide solution") {
                "provide_solution"
            } else if p.contains("review newspapers") {
                "review_newspapers"
            } else {
                "visit_location"
            };
            let score = if p.contains(&format!("Candidate action: {}", wants)) { 95 } else { 10 };
            return format!(r#"{{"score": {}, "explanation": "as stated"}}"#, score);
        }
        if p.contains("Clue to rank:") {
            return r#"{"score": 50, "explanation": "could help"}"#.to_string();
        }
        if p.contains("Correct answer:") {
            return r#"Mostly right. {"evaluation": "close", "accuracy": 80}"#.to_string();
        }
        if p.contains("final answers to the following questions") {
            return json!({"answers": [
                {"question": "Who poisoned the chemist?", "answer": "The apprentice", "confidence": 85},
                {"question": "What was the motive?", "answer": "The shop", "confidence": 60}
            ]})
            .to_string();
        }
        if p.contains("newspaper articles in bulk") {
            return r#"{"description": "The apprentice inherits the shop.", "explanation": "motive"}"#
                .to_string();
        }
        if p.contains("Compare these two") {
            return r#"{"similarity": 90}"#.to_string();
        }
        if p.contains("Where would you like to investigate next?") {
            let n = analyses.fetch_add(1, Ordering::SeqCst);
            return plan[n.min(plan.len() - 1)].to_string();
        }
        "Noted.".to_string()
    })
}

#[tokio::test]
async fn iteration_limit_forces_evaluation() {
    let (_tmp, case) = load_case();
    let client = Arc::new(scripted(vec![VISIT]));

    let report = Investigation::new(case, client.clone(), &config(3))
        .run()
        .await
        .expect("run failed");

    assert_eq!(report.termination, Termination::IterationLimit);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.history.len(), 3);
    assert!(report
        .history
        .iter()
        .all(|r| r.action == AgentAction::VisitLocation));

    // named location first, then the rest in index order
    assert_eq!(
        report.clue_path,
        vec![
            "location - Lambeth Chemist, type - location",
            "location - Scotland Yard, type - location",
            "location - Wiggins, type - informant",
        ]
    );

    // 80% of 20 and 80% of 15
    assert_eq!(report.evaluation.per_question[0].score, 16);
    assert_eq!(report.evaluation.per_question[1].score, 12);
    assert_eq!(report.evaluation.total_score, 28);
    assert_eq!(report.evaluation.max_score, 35);
    assert_eq!(report.final_theory, "Noted.");
    assert_eq!(report.solution, json!("The apprentice poisoned him for the shop."));
}

#[tokio::test]
async fn provide_solution_evaluates_immediately() {
    let (_tmp, case) = load_case();
    let client = Arc::new(scripted(vec![SOLVE]));

    let report = Investigation::new(case, client, &config(100))
        .run()
        .await
        .expect("run failed");

    assert_eq!(report.termination, Termination::Solved);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.history[0].action, AgentAction::ProvideSolution);
    assert!(report.clue_path.is_empty());
    assert_eq!(report.answers.answers.len(), 2);
}

#[tokio::test]
async fn repeated_newspaper_clue_is_discarded() {
    let (_tmp, case) = load_case();
    let client = Arc::new(scripted(vec![PAPERS, PAPERS, SOLVE]));

    let report = Investigation::new(case, client, &config(10))
        .run()
        .await
        .expect("run failed");

    assert_eq!(report.termination, Termination::Solved);
    assert_eq!(report.iterations, 3);
    assert_eq!(report.newspaper_clues.len(), 1);
    assert_eq!(report.history[0].outcome, "newspaper clue: The apprentice inherits the shop.");
    assert_eq!(report.history[1].outcome, "no new newspaper clue");
}

#[tokio::test]
async fn dead_end_after_all_clues() {
    let (_tmp, case) = load_case();
    let client = Arc::new(scripted(vec![VISIT, VISIT, VISIT, VISIT, SOLVE]));

    let report = Investigation::new(case, client, &config(10))
        .run()
        .await
        .expect("run failed");

    assert_eq!(report.clue_path.len(), 3);
    assert_eq!(report.history[3].outcome, "dead end");
}

#[tokio::test]
async fn report_is_written_to_output_dir() {
    let (tmp, case) = load_case();
    let out = tmp.path().join("results");
    let client = Arc::new(scripted(vec![SOLVE]));

    Investigation::new(case, client, &config(5))
        .with_output_dir(&out)
        .run()
        .await
        .expect("run failed");

    let raw = std::fs::read_to_string(out.join("report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["termination"], "solved");
    assert_eq!(json["evaluation"]["total_score"], 28);
    let text = std::fs::read_to_string(out.join("report.txt")).unwrap();
    assert!(text.contains("Total Score: 28/35"));
}

#[tokio::test]
async fn malformed_analysis_aborts_the_run() {
    let (_tmp, case) = load_case();
    let client = Arc::new(FakeClient::new("fake").with_response("I refuse to use JSON."));

    let err = Investigation::new(case, client.clone(), &config(5))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SleuthError::ValidationExhausted { .. }));
    // two briefings, then three analysis attempts
    assert_eq!(client.calls(), 5);
    assert_eq!(err.exit_code(), 1);
}
