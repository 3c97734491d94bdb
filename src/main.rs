use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blogify_mailer::config::Config;
use blogify_mailer::mail::{Mailer, Readiness};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    tracing::info!("Starting Blogify mailer...");

    // Load configuration
    let config = Config::from_env()?;
    let mailer = Mailer::init(&config)?;
    tracing::info!(
        provider = %mailer.profile(),
        configured = mailer.is_configured(),
        "Configuration loaded"
    );

    let readiness = tokio::select! {
        state = mailer.wait_ready() => state,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown requested before verification finished");
            return Ok(());
        }
    };

    match readiness {
        Readiness::Ready => {
            tracing::info!(provider = %mailer.profile(), "Mailer ready");
            Ok(())
        }
        Readiness::Unconfigured => anyhow::bail!("no email provider configured"),
        Readiness::Failed(reason) => {
            anyhow::bail!("transport verification failed for {}: {}", mailer.profile(), reason)
        }
        Readiness::Pending => anyhow::bail!("verification ended without a result"),
    }
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
