use anyhow::Result;
use clap::Parser;
use console::style;
use tasklane_cli::app::App;
use tasklane_cli::cli::Cli;
use tasklane_cli::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is the normal case.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    let token_path = config.token_path(&config_path);

    let app = App::new(&config, &token_path)?;

    if let Err(e) = app.run(cli.command).await {
        if !e.already_reported() {
            eprintln!("{} {}", style("Error:").red().bold(), e);
        }
        std::process::exit(1);
    }

    Ok(())
}
