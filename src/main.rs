use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use showcase::config::GatewayConfig;
use showcase::graphql::build_schema;
use showcase::server;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// YAML settings file, overridden by GATEWAY_* variables and flags
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
        #[clap(long)]
        shows_api_url: Option<String>,
        /// Serve the GraphQL Playground at /playground
        #[clap(long)]
        playground: Option<bool>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Print the composed schema
    Sdl {
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long)]
        database: Option<String>,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let mut config = GatewayConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve {
            port,
            database,
            cors_origin,
            shows_api_url,
            playground,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database_url = database;
            }
            if let Some(cors_origin) = cors_origin {
                config.cors_origin = Some(cors_origin);
            }
            if let Some(shows_api_url) = shows_api_url {
                config.shows_api_url = shows_api_url;
            }
            if let Some(playground) = playground {
                config.playground = playground;
            }

            info!("Starting server on port {}", config.port);
            server::start_server(&config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                let database = database.unwrap_or(config.database_url);
                info!("Initializing database: {}", database);
                server::migrate_database(&database, server::MigrateDirection::Up).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                let database = database.unwrap_or(config.database_url);
                info!("Running database migration: {:?}", direction);
                server::migrate_database(&database, direction).await?;
            }
        },
        Commands::Sdl { output } => {
            let sdl = build_schema()?.sdl();
            match output {
                Some(path) => {
                    std::fs::write(&path, sdl)?;
                    info!("Schema written to {}", path.display());
                }
                None => println!("{}", sdl),
            }
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
