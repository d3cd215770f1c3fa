use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jobmon_core::CoreError;
use jobmon_model::{InstanceId, JobName, JobState, JobView, Params};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::ApiError,
    handler::ApiHandler,
    record::{Phase, StatusRecord},
};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /                       - Banner
    /// - GET /jobs                   - List job templates
    /// - GET|POST|DELETE /jobs/{name} - Latest status, register, unregister
    /// - GET /jobs/{name}/{id}       - Instance status
    /// - POST /jobs/{name}/start     - Start a new instance
    /// - POST /jobs/{name}/{id}/stop - Stop an instance
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(banner))
            .route("/jobs", get(list_jobs::<H>))
            .route(
                "/jobs/{name}",
                get(job_status::<H>)
                    .post(register_job::<H>)
                    .delete(unregister_job::<H>),
            )
            .route("/jobs/{name}/start", post(start_job::<H>))
            .route("/jobs/{name}/{id}", get(instance_status::<H>))
            .route("/jobs/{name}/{id}/stop", post(stop_instance::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ListJobsResponse {
    jobs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct StartRequest {
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

impl StartRequest {
    /// Flatten JSON scalars into template parameters; `null` values are dropped.
    fn into_params(self) -> Result<Params, ApiError> {
        let mut params = Params::new();
        for (key, value) in self.parameters.unwrap_or_default() {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ApiError::InvalidRequest(format!(
                        "parameter '{key}' must be a scalar"
                    )));
                }
            };
            params.insert(key, text);
        }
        Ok(params)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
async fn banner() -> String {
    format!("Job Monitor (v {})", env!("CARGO_PKG_VERSION"))
}

/// GET /jobs
async fn list_jobs<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let jobs = handler.list_jobs().await?;
    let response = ListJobsResponse {
        jobs: jobs.into_iter().map(|j| j.to_string()).collect(),
    };
    Ok(Json(response))
}

/// GET /jobs/{name}
async fn job_status<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    let view = handler.job_status(&job).await?;

    match view.state {
        JobState::NoTemplate => Err(CoreError::TemplateNotFound(job).into()),
        JobState::NoInstance => {
            let response = MessageResponse {
                message: format!("no job instance found for '{job}'"),
            };
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        _ => Ok(record_response(StatusCode::OK, &view, Phase::Query, None)),
    }
}

/// POST /jobs/{name}
async fn register_job<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    handler.register_job(&job, &body).await?;
    Ok((StatusCode::CREATED, [(header::LINK, format!("/jobs/{job}"))]))
}

/// DELETE /jobs/{name}
async fn unregister_job<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    handler.unregister_job(&job).await?;
    Ok(StatusCode::OK)
}

/// GET /jobs/{name}/{id}
async fn instance_status<H>(
    State(handler): State<Arc<H>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    let id = parse_id(&id)?;
    let view = handler.instance_status(&job, &id).await?;
    Ok(record_response(StatusCode::OK, &view, Phase::Query, None))
}

/// POST /jobs/{name}/start
async fn start_job<H>(
    State(handler): State<Arc<H>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    require_json(&headers)?;
    let request: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed JSON body: {e}")))?
    };
    let params = request.into_params()?;

    let view = handler.start_job(&job, params).await?;
    let (code, link) = match &view.state {
        JobState::Started { id, .. } => (StatusCode::CREATED, Some(format!("/jobs/{job}/{id}"))),
        JobState::Running { id, .. } => (StatusCode::SEE_OTHER, Some(format!("/jobs/{job}/{id}"))),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, None),
    };
    Ok(record_response(code, &view, Phase::Start, link))
}

/// POST /jobs/{name}/{id}/stop
async fn stop_instance<H>(
    State(handler): State<Arc<H>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let job = parse_job(&name)?;
    let id = parse_id(&id)?;
    let view = handler.stop_instance(&job, &id).await?;
    let code = match view.state {
        JobState::Finished { .. } => StatusCode::OK,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Ok(record_response(code, &view, Phase::Stop, None))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_job(name: &str) -> Result<JobName, ApiError> {
    JobName::new(name).map_err(|e| ApiError::Core(e.into()))
}

fn parse_id(id: &str) -> Result<InstanceId, ApiError> {
    InstanceId::parse(id).map_err(|e| ApiError::Core(e.into()))
}

fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType(format!(
            "expected content type application/json, got '{content_type}'"
        )))
    }
}

fn record_response(
    code: StatusCode,
    view: &JobView,
    phase: Phase,
    link: Option<String>,
) -> Response {
    let Some(record) = StatusRecord::new(view, phase) else {
        let response = MessageResponse {
            message: format!("no job instance found for '{}'", view.job),
        };
        return (StatusCode::NOT_FOUND, Json(response)).into_response();
    };

    let mut response = (code, Json(record)).into_response();
    if let Some(value) = link.and_then(|l| l.parse().ok()) {
        response.headers_mut().insert(header::LINK, value);
    }
    response
}
