use std::process::ExitCode;

use switchyard::cli::run_cli;
use switchyard::logging::{init_logging, LogConfig};
use switchyard::middleware::RecoveryMiddleware;

fn main() -> ExitCode {
    if let Err(err) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: {err:#}");
    }
    RecoveryMiddleware::install_quiet_panic_hook();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
