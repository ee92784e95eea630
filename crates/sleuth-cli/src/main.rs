use clap::Parser;

mod cli;
pub mod exit_codes;
mod logging;

use cli::args::Cli;
use cli::commands::dispatch;
use sleuth_core::{SleuthConfig, SleuthError};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match SleuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(e.exit_code());
        }
    };
    if cli.verbose {
        config = config.with_debug(true);
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir);
    }

    let code = match logging::init(config.debug, config.log_dir.as_deref()) {
        Ok(run_dir) => {
            if let Some(dir) = run_dir {
                tracing::info!(dir = %dir.display(), "capturing logs");
            }
            match dispatch(cli, config).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("fatal: {e:?}");
                    exit_code_for(&e)
                }
            }
        }
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<SleuthError>()
        .map(SleuthError::exit_code)
        .unwrap_or(exit_codes::RUN_FAILED)
}
