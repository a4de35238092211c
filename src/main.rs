//! file-cleaner - rule-driven duplicate cleanup
//!
//! Entry point for the file-cleaner CLI application.

use clap::Parser;
use file_cleaner::{
    cli::Cli,
    error::{exit_code_for, exit_code_for_parse_error, StructuredError},
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(exit_code_for_parse_error(&err).as_i32());
        }
    };
    let json_errors = cli.json_errors;

    match file_cleaner::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = exit_code_for(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
