use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scoreline::app::AppContext;
use scoreline::cli::{commands, Cli, Commands, GroupAction, ThresholdAction};
use scoreline::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(&config, cli.roster)?;

    match cli.command {
        Commands::Status { no_fetch } => {
            commands::status(&ctx, no_fetch).await?;
        }
        Commands::Refresh { id } => {
            commands::refresh_item(&ctx, &id).await?;
        }
        Commands::Threshold { action } => match action {
            ThresholdAction::Set { date } => commands::threshold_set(&ctx, &date)?,
            ThresholdAction::Clear => commands::threshold_clear(&ctx)?,
            ThresholdAction::Show => commands::threshold_show(&ctx)?,
        },
        Commands::Group { action } => match action {
            GroupAction::Exclude { name } => commands::group_set_excluded(&ctx, &name, true)?,
            GroupAction::Include { name } => commands::group_set_excluded(&ctx, &name, false)?,
            GroupAction::List => commands::group_list(&ctx)?,
        },
        Commands::Watch { interval } => {
            commands::watch(&ctx, &interval).await?;
        }
    }

    Ok(())
}
