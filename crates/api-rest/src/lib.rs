//! # API REST
//!
//! REST API implementation for letterpdf.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (password gate, temporary files, CORS, static files)
//!
//! Rendering itself is delegated to `letterpdf-core`.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::{validate_access_password, ACCESS_PASSWORD_HEADER};
use api_shared::{
    ErrorRes, GeneratePdfReq, HealthRes, HealthService, VerifyPasswordReq, VerifyPasswordRes,
};
use letterpdf_core::{
    derive_filename, BodyFormat, ErrorKind, LetterData, LetterGenerator, Letterhead,
    RenderOptions,
};

/// Server configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub access_password: String,
    /// Root under which each request gets its own temporary directory.
    pub temp_dir: PathBuf,
    /// Directory served for every path not matched by an API route.
    pub public_dir: PathBuf,
    pub letterhead: Letterhead,
}

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    generator: Arc<LetterGenerator>,
    letterhead: Arc<Letterhead>,
    access_password: Arc<str>,
    temp_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        generator: LetterGenerator,
        letterhead: Letterhead,
        access_password: impl Into<Arc<str>>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            letterhead: Arc::new(letterhead),
            access_password: access_password.into(),
            temp_dir: Arc::new(temp_dir),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorRes>);

#[derive(OpenApi)]
#[openapi(
    paths(health, verify_password, generate_pdf),
    components(schemas(
        HealthRes,
        VerifyPasswordReq,
        VerifyPasswordRes,
        GeneratePdfReq,
        ErrorRes,
    ))
)]
struct ApiDoc;

/// Builds the application router.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/verify-password", post(verify_password))
        .route("/api/generate-pdf", post(generate_pdf))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `cfg.addr` and serves the API until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(cfg: ServerConfig, generator: LetterGenerator) -> anyhow::Result<()> {
    let state = AppState::new(
        generator,
        cfg.letterhead,
        cfg.access_password,
        cfg.temp_dir,
    );
    let app = router(state, &cfg.public_dir);

    tracing::info!("++ Starting letterpdf REST on {}", cfg.addr);
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/verify-password",
    request_body = VerifyPasswordReq,
    responses(
        (status = 200, description = "Password accepted", body = VerifyPasswordRes),
        (status = 401, description = "Invalid password", body = ErrorRes)
    )
)]
/// Lets the form check a password before the user writes a letter.
#[axum::debug_handler]
async fn verify_password(
    State(state): State<AppState>,
    Json(req): Json<VerifyPasswordReq>,
) -> Result<Json<VerifyPasswordRes>, ApiError> {
    validate_access_password(req.password.as_deref(), &state.access_password)
        .map_err(|e| unauthorized(&e))?;
    Ok(Json(VerifyPasswordRes { success: true }))
}

#[utoipa::path(
    post,
    path = "/api/generate-pdf",
    request_body = GeneratePdfReq,
    params(
        ("x-access-password" = Option<String>, Header, description = "Access password (alternative to the body field)")
    ),
    responses(
        (status = 200, description = "The rendered letter as application/pdf"),
        (status = 400, description = "Invalid body or missing required fields", body = ErrorRes),
        (status = 401, description = "Invalid password", body = ErrorRes),
        (status = 500, description = "Rendering failed", body = ErrorRes)
    )
)]
/// Render a letter to PDF and return it as a download.
///
/// The letter uses the server's letterhead (logo, signature, default sender) and treats the
/// body as HTML. The PDF is written into a per-request temporary directory that is removed
/// before this handler returns, whether rendering succeeded or not.
///
/// # Errors
/// - `401 Unauthorized` if the password is wrong or absent. This is checked before the
///   body is validated.
/// - `400 Bad Request` if the body is not a valid letter or patientName, date or body is
///   missing.
/// - `500 Internal Server Error` if the template or renderer fails.
#[axum::debug_handler]
async fn generate_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GeneratePdfReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = payload.map(|Json(req)| req);
    let provided = headers
        .get(ACCESS_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| body.as_ref().ok().and_then(|req| req.password.as_deref()));
    validate_access_password(provided, &state.access_password).map_err(|e| unauthorized(&e))?;

    let req = body.map_err(|rejection| {
        tracing::warn!("rejected letter body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new("Invalid request body").with_details(rejection.body_text())),
        )
    })?;

    let letter = letter_from_request(req, &state.letterhead);
    let missing = letter.missing_fields();
    if !missing.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(
                ErrorRes::new(format!("Missing required fields: {}", missing.join(", ")))
                    .with_missing_fields(missing),
            ),
        ));
    }

    let filename = derive_filename(&letter);
    let workdir = request_dir(&state.temp_dir).map_err(|e| {
        tracing::error!("Temporary directory error: {:?}", e);
        internal_error(e.to_string())
    })?;
    let output = workdir.path().join(&filename);

    if let Err(e) = state
        .generator
        .render(&letter, &output, &RenderOptions::default())
        .await
    {
        tracing::error!("Error generating PDF: {:?}", e);
        return Err(match e.kind() {
            ErrorKind::InputMalformed => (
                StatusCode::BAD_REQUEST,
                Json(ErrorRes::new("Invalid letter data").with_details(e.to_string())),
            ),
            ErrorKind::ConfigurationFatal | ErrorKind::RenderEngineFailure => {
                internal_error(e.to_string())
            }
        });
    }

    let bytes = tokio::fs::read(&output).await.map_err(|e| {
        tracing::error!("Error reading generated PDF: {:?}", e);
        internal_error(e.to_string())
    })?;
    if let Err(e) = workdir.close() {
        tracing::warn!("failed to remove temporary directory: {}", e);
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    )
        .into_response())
}

/// Builds the letter for a form submission, filling in the server letterhead.
fn letter_from_request(req: GeneratePdfReq, letterhead: &Letterhead) -> LetterData {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    LetterData {
        patient_name: req.patient_name,
        patient_dob: Some(req.patient_dob.unwrap_or_default()),
        date: req.date,
        language: Some(non_blank(req.language).unwrap_or_else(|| "en".into())),
        body: req.body,
        body_format: Some(BodyFormat::Html),
        logo_path: Some(letterhead.logo_path.display().to_string()),
        signature_image_path: Some(letterhead.signature_path.display().to_string()),
        sender_name: Some(
            non_blank(req.sender_name).unwrap_or_else(|| letterhead.sender_name.clone()),
        ),
        sender_title: Some(
            non_blank(req.sender_title).unwrap_or_else(|| letterhead.sender_title.clone()),
        ),
        extra: Default::default(),
    }
}

fn request_dir(root: &Path) -> std::io::Result<tempfile::TempDir> {
    std::fs::create_dir_all(root)?;
    tempfile::Builder::new().prefix("letter-").tempdir_in(root)
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    if fallback == filename {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn unauthorized(e: &api_shared::auth::AuthError) -> ApiError {
    tracing::warn!("rejected request: {}", e);
    (StatusCode::UNAUTHORIZED, Json(ErrorRes::new(e.to_string())))
}

fn internal_error(details: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::new("Failed to generate PDF").with_details(details)),
    )
}
