use anyhow::Context;
use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tokio::signal;
use toy_store::{SurrealToyStore, Toy};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::field::Empty;
use tracing::{Span, error, info, instrument};

pub mod error;
pub mod metrics;
pub mod open_telemetry;
pub mod service;

pub use error::ApiError;
use metrics::Metrics;
pub use service::ToyService;

/// Shared database connection wrapped in Arc for zero-copy sharing across tasks
pub type SharedDb = Arc<Surreal<Client>>;

#[derive(Clone)]
pub struct AppState {
    pub service: ToyService,
    pub metrics: Arc<Metrics>,
}

// --- Request DTOs ---

#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    pub email: Option<String>,
    pub sort: Option<String>,
}

// --- Configuration ---

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub db_addr: String,
    pub db_user: String,
    pub db_pass: String,
    pub db_ns: String,
    pub db_db: String,
}

const DEFAULT_PORT: u16 = 5000;

fn env_or(keys: &[&str], default: &str) -> String {
    keys.iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| default.to_string())
}

pub fn load_config() -> Config {
    let host = env_or(&["BIND_HOST"], "0.0.0.0");
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    Config {
        listen_addr: format!("{host}:{port}"),
        db_addr: env_or(&["SURREALDB_ADDR"], "127.0.0.1:8000"),
        db_user: env_or(&["SURREALDB_USER", "DB_USER"], "root"),
        db_pass: env_or(&["SURREALDB_PASS", "DB_PASS"], "root"),
        db_ns: env_or(&["SURREALDB_NS"], "magical_toyland"),
        db_db: env_or(&["SURREALDB_DB"], "toyland"),
    }
}

// --- Database Connection ---

pub async fn connect_database(config: &Config) -> anyhow::Result<SharedDb> {
    info!(addr = %config.db_addr, "Connecting to SurrealDB");

    let db = Surreal::new::<Ws>(&config.db_addr)
        .await
        .context("Failed to connect to SurrealDB")?;

    db.signin(Root {
        username: config.db_user.clone(),
        password: config.db_pass.clone(),
    })
    .await
    .context("Failed to signin")?;

    db.use_ns(&config.db_ns)
        .use_db(&config.db_db)
        .await
        .context("Failed to select namespace/database")?;

    info!("Connected to SurrealDB successfully");
    Ok(Arc::new(db))
}

// --- Router Setup ---

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/toys", get(list_toys_handler).post(create_toy_handler))
        .route(
            "/toys/:id",
            get(get_toy_handler)
                .put(update_toy_handler)
                .delete(delete_toy_handler),
        )
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// --- Server Lifecycle ---

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    open_telemetry::init_tracing().context("Failed to initialize OpenTelemetry tracing")?;
    let (meter_provider, metrics) =
        metrics::init_metrics().context("Failed to initialize metrics")?;
    let metrics = Arc::new(metrics);

    info!("Starting Magical ToyLand server...");

    let config = load_config();
    let db = connect_database(&config).await?;

    let store = SurrealToyStore::new(db);
    store.init().await.context("Failed to initialize toy store")?;
    info!("Pinged the database, toy store is reachable");

    let service = ToyService::new(Arc::new(store));
    service.log_catalog_snapshot().await;

    let app = create_app(AppState { service, metrics });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .context("Failed to bind port")?;

    info!(addr = %config.listen_addr, "Magical ToyLand server is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(meter_provider))
        .await
        .context("Server error")?;

    opentelemetry::global::shutdown_tracer_provider();

    Ok(())
}

async fn shutdown_signal(meter_provider: opentelemetry_sdk::metrics::SdkMeterProvider) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");

    if let Err(e) = meter_provider.shutdown() {
        error!(error = %e, "Failed to shutdown meter provider");
    }
}

// --- Request Handlers ---

fn outcome<T>(result: &Result<T, ApiError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

/// Body must be a JSON object; anything else is a client error.
fn into_toy(body: Result<Json<Value>, JsonRejection>) -> Result<Toy, ApiError> {
    match body? {
        Json(Value::Object(map)) => Ok(map),
        Json(other) => Err(ApiError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn root_handler() -> &'static str {
    "Magical ToyLand Is Running"
}

#[instrument(skip(state, params), fields(result_count = Empty))]
async fn list_toys_handler(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Toy>>, ApiError> {
    let start = Instant::now();

    let result = match params {
        Ok(Query(params)) => state
            .service
            .list(params.email.as_deref(), params.sort.as_deref())
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(ApiError::from(rejection)),
    };

    state.metrics.record("list", outcome(&result), start);
    let toys = result?;
    Span::current().record("result_count", toys.len());
    Ok(Json(toys))
}

#[instrument(skip(state), fields(found = Empty))]
async fn get_toy_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Toy>>, ApiError> {
    let start = Instant::now();

    let result = state.service.get(&id).await.map_err(ApiError::from);

    state.metrics.record("get", outcome(&result), start);
    let toy = result?;
    Span::current().record("found", toy.is_some());
    Ok(Json(toy))
}

#[instrument(skip(state, body), fields(toy_id = Empty))]
async fn create_toy_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();

    let result = match into_toy(body) {
        Ok(toy) => state.service.create(toy).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };

    state.metrics.record("create", outcome(&result), start);
    let ack = result?;
    Span::current().record("toy_id", ack.inserted_id.as_str());
    info!("Toy created");
    Ok(Json(ack))
}

#[instrument(skip(state, body), fields(matched = Empty))]
async fn update_toy_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();

    let result = match into_toy(body) {
        Ok(fields) => state
            .service
            .replace_fields(&id, fields)
            .await
            .map_err(ApiError::from),
        Err(e) => Err(e),
    };

    state.metrics.record("update", outcome(&result), start);
    let ack = result?;
    Span::current().record("matched", ack.matched_count);
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state), fields(deleted = Empty))]
async fn delete_toy_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();

    let result = state.service.delete(&id).await.map_err(ApiError::from);

    state.metrics.record("delete", outcome(&result), start);
    let ack = result?;
    Span::current().record("deleted", ack.deleted_count);
    Ok(Json(ack))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
        }
    }
}

async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
