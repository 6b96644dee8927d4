//! vdb binary entry point.

use std::process::ExitCode;

use verdant::ui::output;

fn main() -> ExitCode {
    match verdant::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
