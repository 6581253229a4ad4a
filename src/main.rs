use clap::Parser;
use incident_tracker::cli::{
    handle_add, handle_archive, handle_get, handle_import, handle_list, handle_reopen,
    handle_serve, handle_status, Cli, Commands,
};
use incident_tracker::Config;
use tracing_subscriber::EnvFilter;

fn init_tracing(serving: bool) {
    let default = if serving { "incident_tracker=info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    let result = match cli.command {
        Commands::Serve { port } => handle_serve(&config, port).await,
        Commands::List { all, json } => handle_list(&config, all, json).await,
        Commands::Get { id, json } => handle_get(&config, id, json).await,
        Commands::Add {
            title,
            description,
            category,
            severity,
            json,
        } => handle_add(&config, title, description, category, severity, json).await,
        Commands::Status { id, status, json } => handle_status(&config, id, status, json).await,
        Commands::Archive { id } => handle_archive(&config, id).await,
        Commands::Reopen { id } => handle_reopen(&config, id).await,
        Commands::Import { file, json } => handle_import(&config, &file, json).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
