//! ticketctl entry point.

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use domain::ServiceConfig;

/// Exit code for a command the ticket rules rejected.
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServiceConfig::from_env();
    cli::init_tracing(&config);

    let args = Cli::parse();
    match cli::run(args.action, &config).await {
        Ok(output) => {
            println!("{}", output.body);
            if output.rejected {
                ExitCode::from(EXIT_REJECTED)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "ticketctl failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
