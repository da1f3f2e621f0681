use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use takvimi_core::{DataManager, FsStore, PdfBackend, PdfLibrary};
use takvimi_parsing::YearAssembler;
use takvimi_pdf_mupdf::MupdfBackend;
use takvimi_web::{AppState, Config, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "takvimi_web=info,takvimi_core=info,takvimi_parsing=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();
    tracing::info!("Starting Takvimi API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("PDF directory: {}", config.pdf_dir.display());
    tracing::info!("JSON directory: {}", config.json_dir.display());

    let parsing = config.parsing_config()?;
    let backend: Arc<dyn PdfBackend> = Arc::new(MupdfBackend);
    let manager = DataManager::new(
        Arc::new(FsStore::new(&config.json_dir)),
        Arc::new(YearAssembler::with_config(backend.clone(), parsing.clone())),
        PdfLibrary::new(&config.pdf_dir),
        config.manager_options(),
    );

    let state = Arc::new(AppState {
        manager,
        backend,
        parsing,
    });

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Takvimi API listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
