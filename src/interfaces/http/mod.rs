use crate::application::{HistoryUseCase, UploadUseCase};
use crate::domain::error::AppError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage::is_safe_artifact_name;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::error;

pub struct HttpState {
    pub upload_use_case: UploadUseCase,
    pub history_use_case: HistoryUseCase,
    pub reports_dir: PathBuf,
}

/// Identity is delegated to the surrounding frontends; the API only insists
/// that some caller identity accompanies every request.
fn caller_identity(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("X-User")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "error": "Missing caller identity." }))
}

/// Map domain errors onto response payloads. Storage and rendering failures
/// come back as a generic message; the detail only goes to the logs.
fn error_response(err: AppError) -> HttpResponse {
    match err {
        AppError::InvalidColumns(missing) => HttpResponse::BadRequest().json(json!({
            "error": "CSV is missing required column(s).",
            "missing_columns": missing,
        })),
        AppError::MissingFile | AppError::ParseError(_) | AppError::ValidationError(_) => {
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
        AppError::NotFound(_) => {
            HttpResponse::NotFound().json(json!({ "error": err.to_string() }))
        }
        AppError::DatabaseError(_) | AppError::IoError(_) | AppError::Internal(_) => {
            error!(error = %err, "Upload processing failed");
            HttpResponse::InternalServerError().json(json!({
                "error": "Unexpected error while processing CSV on the server.",
            }))
        }
    }
}

#[derive(Deserialize)]
struct UploadQuery {
    #[serde(default)]
    filename: Option<String>,
}

#[post("/equipment/upload")]
async fn upload_csv(
    data: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let caller = match caller_identity(&req) {
        Some(caller) => caller,
        None => return unauthorized(),
    };

    let filename = query
        .filename
        .clone()
        .or_else(|| {
            req.headers()
                .get("X-Filename")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "upload.csv".to_string());

    match data.upload_use_case.execute(&caller, &filename, &body).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "message": "CSV processed successfully.",
            "stats": outcome.stats,
            "pdf_report": outcome.pdf_report,
            "skipped_rows": outcome.skipped_rows,
        })),
        Err(err) => error_response(err),
    }
}

#[get("/history")]
async fn history(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    if caller_identity(&req).is_none() {
        return unauthorized();
    }

    match data.history_use_case.list_recent().await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(err) => error_response(err),
    }
}

#[get("/reports/{filename}")]
async fn report_file(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if caller_identity(&req).is_none() {
        return unauthorized();
    }

    let filename = path.into_inner();
    if !is_safe_artifact_name(&filename) {
        return HttpResponse::BadRequest().json(json!({ "error": "Invalid report filename." }));
    }

    match std::fs::read(data.reports_dir.join(&filename)) {
        Ok(bytes) => HttpResponse::Ok().content_type("application/pdf").body(bytes),
        Err(_) => HttpResponse::NotFound().json(json!({ "error": "Report not found." })),
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn start_server(config: &AppConfig, state: web::Data<HttpState>) -> std::io::Result<Server> {
    let payload_limit = config.max_upload_bytes;

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // local single-user tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .service(
                web::scope("/api")
                    .service(upload_csv)
                    .service(history)
                    .service(report_file)
                    .service(health),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run();

    Ok(server)
}
