use actix_web::web;
use equipviz::application::{HistoryUseCase, UploadUseCase};
use equipviz::domain::error::AppError;
use equipviz::infrastructure::config::AppConfig;
use equipviz::infrastructure::db::HistoryRepository;
use equipviz::infrastructure::report::PdfReportRenderer;
use equipviz::infrastructure::storage::{ensure_data_dir, ensure_reports_dir};
use equipviz::interfaces::http::{start_server, HttpState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let config = AppConfig::load().map_err(to_io_err)?;

    ensure_data_dir(&config.data_dir)?;
    let reports_dir = ensure_reports_dir(&config.data_dir)?;

    let db_path = config.db_path();
    info!(db = %db_path.display(), "Initializing history database");
    let repository = Arc::new(
        HistoryRepository::connect(&db_path, config.history_limit)
            .await
            .map_err(to_io_err)?,
    );

    let renderer = PdfReportRenderer::new(&config.data_dir).map_err(to_io_err)?;

    let state = web::Data::new(HttpState {
        upload_use_case: UploadUseCase::new(renderer, repository.clone(), config.max_upload_bytes),
        history_use_case: HistoryUseCase::new(repository),
        reports_dir,
    });

    let server = start_server(&config, state)?;
    info!(host = %config.host, port = config.port, "HTTP server started");
    server.await
}

fn to_io_err(err: AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
