use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use jobportal_api::config::ApiConfig;
use jobportal_api::mailer::{EmailConfig, LogNotifier, Notifier, SmtpNotifier};
use jobportal_api::session::run_cleanup_loop;
use jobportal_api::storage::Storage;
use jobportal_api::{AppState, AppStateInner, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobportal=debug,jobportal_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}.");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    let db = jobportal_db::Database::open(&config.db_path)?;
    let storage = Storage::new(config.upload_dir.clone()).await?;
    let notifier = select_notifier();

    let cleanup_secs = config.session_cleanup_secs;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Status policy: {:?}", config.status_policy);

    let state: AppState = Arc::new(AppStateInner {
        db,
        config,
        notifier,
        storage,
    });

    tokio::spawn(run_cleanup_loop(state.clone(), cleanup_secs));

    let app = build_router(state);

    info!("Job portal listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn select_notifier() -> Arc<dyn Notifier> {
    let Some(email) = EmailConfig::from_env() else {
        info!("SMTP_HOST not set; emails will only be logged");
        return Arc::new(LogNotifier);
    };

    let host = email.smtp_host.clone();
    match SmtpNotifier::new(email) {
        Ok(notifier) => {
            info!("Sending email through {}", host);
            Arc::new(notifier)
        }
        Err(e) => {
            warn!("SMTP setup for {} failed, falling back to logging: {}", host, e);
            Arc::new(LogNotifier)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
