use sleuth_core::SleuthConfig;

use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli, config: SleuthConfig) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => super::run::run(args, config).await,
        Command::Validate(args) => super::validate::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
