use std::process::ExitCode;

use clap::Parser;

use autocov::cli::{run, Cli};
use autocov::observability::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("autocov: {e}");
            ExitCode::FAILURE
        }
    }
}
