//! mirrorsync binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match mirrorsync::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            mirrorsync::ui::output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
