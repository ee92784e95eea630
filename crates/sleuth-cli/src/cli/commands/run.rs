use anyhow::Context;
use sleuth_core::providers::llm::client_from_config;
use sleuth_core::{CaseBundle, Investigation, SleuthConfig};

use crate::cli::args::RunArgs;
use crate::exit_codes;

pub async fn run(args: RunArgs, config: SleuthConfig) -> anyhow::Result<i32> {
    let config = apply_overrides(config, &args);
    config.validate()?;

    let case = CaseBundle::load(&args.case_dir)?;
    tracing::info!(
        case = %case.name,
        clues = case.clues.len(),
        questions = case.questions.len(),
        model = %config.model,
        "case loaded"
    );

    let client = client_from_config(&config)?;
    let report = Investigation::new(case, client, &config)
        .with_output_dir(&args.output)
        .run()
        .await
        .with_context(|| format!("investigation of {} failed", args.case_dir.display()))?;

    println!("case:        {}", report.case);
    println!(
        "termination: {} after {} iteration(s)",
        report.termination.as_str(),
        report.iterations
    );
    for q in &report.evaluation.per_question {
        println!("  {}/{}  {}", q.score, q.points, q.question);
    }
    println!("{}", report.score_line());
    println!("report:      {}", args.output.display());

    Ok(exit_codes::SUCCESS)
}

fn apply_overrides(mut config: SleuthConfig, args: &RunArgs) -> SleuthConfig {
    if let Some(n) = args.max_iterations {
        config = config.with_max_iterations(n);
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(dir) = &args.exchange_dir {
        config = config.with_exchange_dir(dir);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn flags_override_environment() {
        let args = RunArgs {
            case_dir: PathBuf::from("case"),
            output: PathBuf::from("out"),
            max_iterations: Some(7),
            model: Some("other-model".into()),
            exchange_dir: Some(PathBuf::from("xchg")),
        };
        let config = apply_overrides(SleuthConfig::default(), &args);
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.model, "other-model");
        assert_eq!(config.exchange_dir, Some(PathBuf::from("xchg")));
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = RunArgs {
            case_dir: PathBuf::from("case"),
            output: PathBuf::from("out"),
            max_iterations: None,
            model: None,
            exchange_dir: None,
        };
        let config = apply_overrides(SleuthConfig::default().with_max_iterations(12), &args);
        assert_eq!(config.max_iterations, 12);
        assert!(config.exchange_dir.is_none());
    }
}
