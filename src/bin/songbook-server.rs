use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use songbook::convert::extract_audio;
use songbook::model_tier::ModelTier;
use songbook::opts::Opts;
use songbook::output_type::OutputType;
use songbook::songbook::Songbook;

#[derive(Parser, Debug)]
#[command(name = "songbook-server")]
#[command(about = "HTTP server for chord and lyric recovery from uploaded recordings")]
struct Params {
    /// Directory containing ggml model files.
    #[arg(short = 'm', long = "models-dir", required = true)]
    models_dir: String,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8080)]
    port: u16,

    /// Maximum request body size (bytes).
    #[arg(long = "max-bytes", default_value_t = 100 * 1024 * 1024)]
    max_bytes: usize,
}

#[derive(Clone)]
struct AppState {
    songbook: Arc<Mutex<Songbook>>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeQuery {
    #[serde(default, alias = "output_type")]
    output: Option<String>,
    #[serde(default)]
    tier: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    translate: Option<bool>,
}

#[derive(Debug, Serialize)]
struct TiersResponse {
    default_tier: String,
    available_tiers: Vec<String>,
    models_dir: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    songbook::logging::init();

    let params = Params::parse();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let songbook =
        Songbook::new(&params.models_dir).context("failed to initialize Songbook backend")?;

    let state = AppState {
        songbook: Arc::new(Mutex::new(songbook)),
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/v1/tiers", get(tiers))
        .route("/v1/analyze", post(analyze))
        .route("/v1/convert", post(convert))
        .with_state(state)
        .layer(DefaultBodyLimit::max(params.max_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn root() -> &'static str {
    "songbook-server: POST /v1/analyze or /v1/convert (multipart field: file)"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn tiers(State(state): State<AppState>) -> std::result::Result<Json<TiersResponse>, AppError> {
    let songbook = state.songbook.lock().await;
    let models = songbook.models();

    Ok(Json(TiersResponse {
        default_tier: ModelTier::default().to_string(),
        available_tiers: models
            .available_tiers()
            .iter()
            .map(ModelTier::to_string)
            .collect(),
        models_dir: models.model_dir().display().to_string(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    mut multipart: Multipart,
) -> std::result::Result<Response, AppError> {
    let file_bytes = read_file_field(&mut multipart)
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let output_type = parse_output_type(query.output.as_deref())
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let model_tier = parse_tier(query.tier.as_deref())
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let opts = Opts {
        model_tier,
        language: query.language,
        translate_to_english: query.translate.unwrap_or(false),
        output_type,
    };

    let mut songbook = state.songbook.lock().await;
    let mut output = Vec::new();
    songbook
        .analyze(Cursor::new(file_bytes), &mut output, &opts)
        .map_err(|err| AppError::internal(err.to_string()))?;

    let content_type = match opts.output_type {
        OutputType::Json => HeaderValue::from_static("application/json; charset=utf-8"),
        OutputType::Sheet => HeaderValue::from_static("text/markdown; charset=utf-8"),
    };

    Ok(([(header::CONTENT_TYPE, content_type)], output).into_response())
}

async fn convert(mut multipart: Multipart) -> std::result::Result<Response, AppError> {
    let file_bytes = read_file_field(&mut multipart)
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let mut output = Cursor::new(Vec::new());
    extract_audio(Cursor::new(file_bytes), None, &mut output)
        .map_err(|err| AppError::internal(err.to_string()))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("audio/wav"),
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"extracted.wav\""),
        ),
    ];

    Ok((headers, output.into_inner()).into_response())
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "file" || name == "media" {
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                return Err(anyhow!("multipart field '{name}' was empty"));
            }
            return Ok(bytes.to_vec());
        }
    }

    Err(anyhow!(
        "missing multipart field 'file' (or 'media') with the input container bytes"
    ))
}

fn parse_output_type(output: Option<&str>) -> Result<OutputType> {
    match output {
        None => Ok(OutputType::Sheet),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputType::Json),
            "sheet" => Ok(OutputType::Sheet),
            other => Err(anyhow!(
                "unknown output type '{other}' (expected 'json' or 'sheet')"
            )),
        },
    }
}

fn parse_tier(tier: Option<&str>) -> Result<ModelTier> {
    match tier {
        None => Ok(ModelTier::default()),
        Some(raw) => ModelTier::parse(raw)
            .ok_or_else(|| anyhow!("unknown model tier '{raw}' (expected 'tiny', 'base', or 'small')")),
    }
}
