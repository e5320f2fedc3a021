use std::process::ExitCode;

use targetlock::ui::output;

fn main() -> ExitCode {
    match targetlock::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
