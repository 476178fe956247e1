use clap::Parser;
use meetscribe::cli::{Cli, Commands};
use meetscribe::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meetscribe=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Handle { payload: None }) {
        Commands::Handle { payload } => meetscribe::commands::handle(&config, payload.as_deref()),
        Commands::Validate { payload } => meetscribe::commands::validate(payload.as_deref()),
        Commands::InitConfig { path } => meetscribe::commands::init_config(path.as_deref()),
    }
}
