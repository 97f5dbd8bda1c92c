//! HTTP surface: `POST /api/eligibility` runs the pipeline, `GET` explains how.

use std::any::Any;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::entities::patient::{Age, PatientInput, is_truthy, loose_string};
use crate::pipeline::{OrchestrationResult, Orchestrator};

pub const ELIGIBILITY_PATH: &str = "/api/eligibility";

pub const USAGE_MESSAGE: &str = "Use POST to check eligibility";
pub const MISSING_FIELDS_MESSAGE: &str = "Invalid input: 'age' and 'condition' are required";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process request";

#[derive(Debug, Clone)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: PROCESSING_FAILED_MESSAGE.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(orchestrator: Orchestrator) -> Router {
    with_layers(
        Router::new()
            .route("/healthz", get(healthz))
            .route(ELIGIBILITY_PATH, get(usage).post(check_eligibility))
            .with_state(orchestrator),
    )
}

fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("eligibility request panicked");
    ApiFailure::internal().into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

async fn usage() -> Json<Value> {
    Json(json!({ "message": USAGE_MESSAGE }))
}

async fn check_eligibility(
    State(orchestrator): State<Orchestrator>,
    body: Bytes,
) -> Result<Json<OrchestrationResult>, ApiFailure> {
    let body: Value = serde_json::from_slice(&body).map_err(|err| {
        error!(error = %err, "POST {ELIGIBILITY_PATH}: unreadable request body");
        ApiFailure::internal()
    })?;
    let patient = patient_from_body(&body)?;
    Ok(Json(orchestrator.run(&patient).await))
}

/// Keeps `age` and `condition` from the request body and drops everything else.
///
/// Both must be truthy. Past that gate any value is accepted: `age` keeps its
/// raw form and `condition` is taken as text.
fn patient_from_body(body: &Value) -> Result<PatientInput, ApiFailure> {
    if body.is_null() {
        error!("POST {ELIGIBILITY_PATH}: request body is null");
        return Err(ApiFailure::internal());
    }
    let field = |name: &str| body.get(name).filter(|v| is_truthy(v));
    let (Some(age), Some(condition)) = (field("age"), field("condition")) else {
        return Err(ApiFailure::bad_request(MISSING_FIELDS_MESSAGE));
    };

    Ok(PatientInput::with_age(
        Age::from_json(age.clone()),
        loose_string(condition),
    ))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, orchestrator: Orchestrator) -> anyhow::Result<()> {
    let reasoning = if orchestrator.reasoning_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, reasoning, "trialmatch listening");
    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
