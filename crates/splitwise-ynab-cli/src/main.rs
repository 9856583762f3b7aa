use std::process::ExitCode;

fn main() -> ExitCode {
    match splitwise_ynab_cli::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let code = error.exit_code();
            let error = anyhow::Error::from(error);
            tracing::error!(target: splitwise_ynab_cli::ABORT_TARGET, "Run aborted: {error:#}");
            eprintln!("Error: {error:#}");
            ExitCode::from(code)
        }
    }
}
