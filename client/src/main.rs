//! Headless client: runs a session against the store and logs what the UI
//! would render after every update.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use todo_client::{ClientConfig, Filter, Session, Update, UreqTransport};

#[derive(Parser, Debug)]
#[command(name = "todo-client", about = "Headless todo store client")]
struct Cli {
    #[arg(long, env = "BACKEND_URL", default_value = todo_client::config::DEFAULT_BACKEND_URL)]
    backend_url: String,
    /// Length of one backoff/timeout unit in milliseconds.
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,
    /// Titles to create once the first resync lands.
    #[arg(long = "add")]
    add: Vec<String>,
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

    let config = ClientConfig::new(&cli.backend_url)
        .with_time_unit(Duration::from_millis(cli.time_unit_ms));
    let transport = UreqTransport::new(config.units(config.request_timeout));
    let mut session = Session::new(config, transport);
    session.start_monitor();
    tracing::info!(backend = %cli.backend_url, "client started");

    let mut pending_adds = cli.add;
    loop {
        tokio::select! {
            update = session.next_update() => {
                let Some(update) = update else { break };
                if matches!(update, Update::Resynced { .. }) {
                    for title in pending_adds.drain(..) {
                        if let Err(e) = session.create(&title) {
                            tracing::warn!(%title, error = %e, "skipping title");
                        }
                    }
                }
                let view = session.view(Filter::All);
                tracing::info!(
                    status = session.status(),
                    items = view.visible.len(),
                    left = %view.items_left_label(),
                    ?update,
                    "update"
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
