mod cli;

use anonsignals_client::ClientConfig;
use clap::Parser;
use cli::{
    cancel_on_ctrl_c, handle_action, handle_group, handle_hash, handle_identity, handle_job,
    handle_keys, handle_leaf, handle_vk, init_logging, Cli, Commands,
};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(anonsignals_client::config::default_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));

    let mut config = ClientConfig::load(&config_path)?;
    if cli.data_dir.is_some() {
        config.storage.path = data_dir.join("identities.db");
    }

    init_logging(&cli, &config.logging)?;
    debug!("Loaded configuration from {:?}\n{}", config_path, config.redacted());

    let cancel = cancel_on_ctrl_c();

    match cli.command {
        Commands::Identity { action } => handle_identity(action, &config, &cli.format).await?,
        Commands::Hash { action } => handle_hash(action, &cli.format)?,
        Commands::Group { action } => handle_group(action, &cli.format)?,
        Commands::Keys { action } => handle_keys(action, &cli.format).await?,
        Commands::Vk { action } => handle_vk(action, &config, &cli.format).await?,
        Commands::Job { action } => handle_job(action, &config, &cli.format, &cancel).await?,
        Commands::Leaf { signals, vk_hash, reported } => {
            handle_leaf(&signals, &vk_hash, reported.as_deref(), &cli.format)?
        }
        Commands::Action(args) => handle_action(args, &config, &cli.format, &cancel).await?,
    }

    Ok(())
}
