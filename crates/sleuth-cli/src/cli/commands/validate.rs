use sleuth_core::CaseBundle;

use crate::cli::args::{ValidateArgs, ValidateOutputFormat};
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let case = match CaseBundle::load(&args.case_dir) {
        Ok(case) => case,
        Err(e) => {
            match args.format {
                ValidateOutputFormat::Text => eprintln!("error: {}", e),
                ValidateOutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "valid": false, "error": e.to_string() })
                ),
            }
            return Ok(e.exit_code());
        }
    };

    let summary = case.summary();
    match args.format {
        ValidateOutputFormat::Text => println!("{}", summary),
        ValidateOutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "valid": true, "case": summary }))?
        ),
    }
    Ok(exit_codes::SUCCESS)
}
