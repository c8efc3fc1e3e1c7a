use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use todo_store::{MemoryStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "todo-store", about = "Todo HTTP store")]
struct Cli {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,
    /// SQLite database file; the store is in-memory when omitted.
    #[arg(long, env = "DATABASE_URL")]
    database: Option<PathBuf>,
    /// `pretty` or `json`.
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cli.log_format.as_str() {
        "json" => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        _ => tracing_subscriber::fmt().pretty().with_env_filter(filter).init(),
    }

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    match cli.database {
        Some(path) => {
            let store = SqliteStore::open(&path)
                .with_context(|| format!("failed to open database {}", path.display()))?;
            todo_store::run(listener, store).await?;
        }
        None => {
            tracing::info!("no database configured, using in-memory store");
            todo_store::run(listener, MemoryStore::new()).await?;
        }
    }
    Ok(())
}
