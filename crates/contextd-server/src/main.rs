use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use contextd_core::config::Config;
use contextd_server::state::AppState;

/// contextd -- personal context engine API server.
#[derive(Parser, Debug)]
#[command(name = "contextd", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "BIND_ADDR")]
    bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "PORT")]
    port: u16,

    /// Log level for contextd targets (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,contextd_core={level},contextd_server={level}",
            level = args.log_level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %config.app_env,
        tz = %config.default_tz,
        "starting contextd"
    );

    let state = Arc::new(AppState::from_config(config));
    for (source, provider) in &state.providers {
        info!(source = %source, provider = provider.name(), "provider registered");
    }

    let router = contextd_server::build_router(state);

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let listener = tokio::net::TcpListener::bind((args.bind.as_str(), args.port)).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("shutdown complete");
    Ok(())
}

/// Cancel the token on ctrl-c or SIGTERM.
fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let sigterm = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(_) => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let sigterm = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received ctrl-c, shutting down"),
            _ = sigterm => info!("received SIGTERM, shutting down"),
        }
        token.cancel();
    });
}
