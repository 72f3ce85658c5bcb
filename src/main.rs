//! proposer binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match proposer::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
