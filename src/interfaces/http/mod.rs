pub mod dto;
pub mod errors;

use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::{AuthUseCase, SalesPipeline, DEFAULT_PART_ROWS};
use crate::domain::error::AppError;
use crate::domain::sales::Upload;

use dto::{
    CredentialsRequest, DashboardQuery, HistoryQuery, LogoutResponse, PartQuery, UploadQuery,
};

/// Header carrying the session id returned by login
pub const SESSION_HEADER: &str = "X-Session-Id";

const MAX_LOG_ENTRIES: usize = 100;
const DEFAULT_HISTORY_LIMIT: i64 = 50;

type HandlerResult = Result<HttpResponse, AppError>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub auth: AuthUseCase,
    pub pipeline: SalesPipeline,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    /// Resolve the caller's session from the request header.
    fn session(&self, req: &HttpRequest) -> Result<Uuid, AppError> {
        let raw = req
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", SESSION_HEADER)))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Unauthorized("malformed session id".to_string()))?;
        self.auth.authenticate(id)?;
        Ok(id)
    }

    /// Record a failed request in the log buffer and hand the error back.
    fn fail(&self, source: &str, err: AppError) -> AppError {
        add_log(&self.logs, "ERROR", source, &err.to_string());
        err
    }
}

#[post("/auth/register")]
async fn register(data: web::Data<HttpState>, req: web::Json<CredentialsRequest>) -> HandlerResult {
    req.validate()?;
    let user = data
        .auth
        .register(&req.username, &req.password)
        .await
        .map_err(|e| data.fail("Auth", e))?;
    add_log(
        &data.logs,
        "INFO",
        "Auth",
        &format!("Registered user {}", user.username),
    );
    Ok(HttpResponse::Created().json(user))
}

#[post("/auth/login")]
async fn login(data: web::Data<HttpState>, req: web::Json<CredentialsRequest>) -> HandlerResult {
    req.validate()?;
    let session = data
        .auth
        .login(&req.username, &req.password)
        .await
        .map_err(|e| data.fail("Auth", e))?;
    add_log(
        &data.logs,
        "INFO",
        "Auth",
        &format!("{} logged in", session.username),
    );
    Ok(HttpResponse::Ok().json(session))
}

#[post("/auth/logout")]
async fn logout(data: web::Data<HttpState>, http: HttpRequest) -> HandlerResult {
    let session = data.session(&http)?;
    data.auth.logout(session)?;
    Ok(HttpResponse::Ok().json(LogoutResponse { logged_out: true }))
}

#[post("/uploads")]
async fn upload(
    data: web::Data<HttpState>,
    http: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> HandlerResult {
    let session = data.session(&http)?;
    query.validate()?;
    let query = query.into_inner();

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Received {} ({} bytes)", query.filename, body.len()),
    );

    let outcome = data
        .pipeline
        .upload(session, Upload::new(query.filename, body.to_vec()))
        .await
        .map_err(|e| data.fail("Upload", e))?;

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!(
            "Cleaned {}: {} of {} rows kept",
            outcome.filename, outcome.cleaning.output_rows, outcome.cleaning.input_rows
        ),
    );
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/dashboard")]
async fn dashboard(
    data: web::Data<HttpState>,
    http: HttpRequest,
    query: web::Query<DashboardQuery>,
) -> HandlerResult {
    let session = data.session(&http)?;
    query.validate()?;
    let view = data
        .pipeline
        .dashboard(session, query.into_inner().into())
        .map_err(|e| data.fail("Dashboard", e))?;
    Ok(HttpResponse::Ok().json(view))
}

#[get("/anomalies")]
async fn anomalies(data: web::Data<HttpState>, http: HttpRequest) -> HandlerResult {
    let session = data.session(&http)?;
    let report = data
        .pipeline
        .anomalies(session)
        .map_err(|e| data.fail("Anomalies", e))?;
    add_log(
        &data.logs,
        "INFO",
        "Anomalies",
        &format!("{} anomalous rows flagged", report.anomaly_count()),
    );
    Ok(HttpResponse::Ok().json(report))
}

#[get("/anomalies.csv")]
async fn anomalies_csv(data: web::Data<HttpState>, http: HttpRequest) -> HandlerResult {
    let session = data.session(&http)?;
    let bytes = data
        .pipeline
        .anomalies_csv(session)
        .map_err(|e| data.fail("Anomalies", e))?;
    Ok(csv_download("anomalies.csv", bytes))
}

#[get("/export/parts/{index}")]
async fn export_part(
    data: web::Data<HttpState>,
    http: HttpRequest,
    path: web::Path<usize>,
    query: web::Query<PartQuery>,
) -> HandlerResult {
    let session = data.session(&http)?;
    query.validate()?;
    let index = path.into_inner();
    let rows = query.rows.unwrap_or(DEFAULT_PART_ROWS);

    let bytes = data
        .pipeline
        .export_part(session, index, rows)
        .map_err(|e| data.fail("Export", e))?;
    Ok(csv_download(&format!("part_{}.csv", index + 1), bytes))
}

#[get("/history")]
async fn history(
    data: web::Data<HttpState>,
    http: HttpRequest,
    query: web::Query<HistoryQuery>,
) -> HandlerResult {
    let session = data.session(&http)?;
    query.validate()?;
    let records = data
        .pipeline
        .history(session, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await
        .map_err(|e| data.fail("History", e))?;
    Ok(HttpResponse::Ok().json(records))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>, http: HttpRequest) -> HandlerResult {
    data.session(&http)?;
    let logs = data
        .logs
        .lock()
        .map_err(|e| AppError::Internal(format!("Log buffer lock poisoned: {}", e)))?;
    Ok(HttpResponse::Ok().json(&*logs))
}

fn csv_download(filename: &str, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Register every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(register)
            .service(login)
            .service(logout)
            .service(upload)
            .service(dashboard)
            .service(anomalies_csv)
            .service(anomalies)
            .service(export_part)
            .service(history)
            .service(get_logs),
    );
}

pub fn start_server(
    state: web::Data<HttpState>,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for the local UI

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
