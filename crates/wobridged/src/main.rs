//! Binary entry point for the work order bridge daemon.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match wobridged::run_daemon().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
