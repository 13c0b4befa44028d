use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod banter;
mod commands;
mod config;
mod controllers;
mod error;
mod models;
mod response;
mod storage;
mod types;

pub(crate) use error::AppResult;

use banter::Banter;
use commands::lambda::HandlerKind;
use config::{Config, StorageKind};
use storage::file::FileStorage;
use storage::memory::MemoryStorage;
use storage::{AnyStorage, RecordStore};

#[derive(Parser)]
#[command(version, about = "Store text pastes and fetch them back by id")]
struct Cli {
    /// Configuration file (defaults to ./pasteportal.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run as an HTTP server
    Serve,
    /// Run under the Lambda runtime, one request per invocation
    Lambda {
        #[arg(long, value_enum, default_value_t = HandlerKind::Auto)]
        handler: HandlerKind,
    },
}

/// Everything a handler needs. Cheap to clone; the store handle is shared.
#[derive(Clone)]
pub struct App<S = AnyStorage> {
    pub config: Config,
    pub store: RecordStore<S>,
}

impl<S> App<S> {
    pub fn banter(&self) -> Banter {
        Banter::new(self.config.banter)
    }
}

impl App {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let storage: AnyStorage = match config.storage.kind {
            #[cfg(feature = "dynamodb")]
            StorageKind::DynamoDb => {
                storage::dynamodb::DynamoDbStorage::new(&config.storage.dynamodb).into()
            }
            StorageKind::File => FileStorage::new(&config.storage.file.dir)
                .await
                .context("failed to open file storage")?
                .into(),
            StorageKind::Memory => MemoryStorage::new().into(),
        };

        Ok(App {
            config,
            store: RecordStore::new(storage),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    info!(storage = ?config.storage.kind, "loaded configuration");

    let app = App::new(config).await?;

    match cli.command {
        Command::Serve => commands::serve::run(app).await,
        Command::Lambda { handler } => commands::lambda::run(app, handler).await,
    }
}
