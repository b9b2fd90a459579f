use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;

use bangler_cli::{App, Cli, Commands, commands, display};
use bangler_infra::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env().map_err(|e| anyhow!(display::domain_error(&e)))?;
    cli.apply_overrides(&mut config);
    bangler_observability::init(&config.log);

    let app = App::load(config)?;
    let mut stdout = std::io::stdout();
    match cli.command.unwrap_or(Commands::Quote) {
        Commands::Quote => commands::quote(&app, cli.unit_price).await,
        Commands::Price(args) => commands::price(&app, &args, cli.unit_price, &mut stdout)
            .await
            .map(|_| ()),
        Commands::Options { prefix } => commands::options(&app, &prefix, &mut stdout),
        Commands::Check => {
            commands::check(&app, &mut stdout)?;
            println!("ok");
            Ok(())
        }
    }
}
