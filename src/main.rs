use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_spider::cli::commands::{cmd_check, cmd_run, cmd_show};
use app_spider::cli::config::{Cli, Commands};
use app_spider::spider::cancel::CancelToken;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "app_spider=info",
        1 => "app_spider=debug",
        _ => "app_spider=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    match cli.command {
        Commands::Run { config, overrides } => {
            let cancel = CancelToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || handler_token.cancel())?;

            let outcome = cmd_run(&config, &overrides, cancel)?;
            if outcome.is_failure() {
                std::process::exit(1);
            }
        }
        Commands::Check { config } => cmd_check(&config)?,
        Commands::Show { path, top } => cmd_show(&path, top)?,
    }

    Ok(())
}
