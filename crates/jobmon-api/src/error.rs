use jobmon_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(feature = "http")]
mod http {
    use axum::{
        Json,
        http::{StatusCode, header},
        response::{IntoResponse, Response},
    };
    use jobmon_core::CoreError;
    use jobmon_model::ModelError;
    use serde_json::json;
    use tracing::{debug, error};

    use super::ApiError;

    impl ApiError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ApiError::Core(e) => match e {
                    CoreError::TemplateNotFound(_)
                    | CoreError::InstanceNotFound { .. }
                    | CoreError::Model(ModelError::InvalidInstanceId(_)) => StatusCode::NOT_FOUND,
                    CoreError::TemplateExists(_) => StatusCode::SEE_OTHER,
                    CoreError::AlreadyFinished { .. } => StatusCode::FORBIDDEN,
                    CoreError::Model(ModelError::InvalidJobName(_)) => StatusCode::BAD_REQUEST,
                    CoreError::UnrecognizedInstance { .. }
                    | CoreError::Control(_)
                    | CoreError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                },
            }
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let code = self.status_code();
            if code.is_server_error() {
                error!(target: "jobmon.api", error = %self, "request failed");
            } else {
                debug!(target: "jobmon.api", error = %self, status = code.as_u16(), "request rejected");
            }

            match self {
                ApiError::UnsupportedMediaType(msg) => (code, msg).into_response(),
                ApiError::Core(CoreError::TemplateExists(job)) => {
                    let body = json!({ "message": format!("job '{job}' does already exist") });
                    (code, [(header::LINK, format!("/jobs/{job}"))], Json(body)).into_response()
                }
                ApiError::Core(CoreError::AlreadyFinished { .. }) => {
                    let body = json!({ "status": "FINISHED", "message": "job has already finished" });
                    (code, Json(body)).into_response()
                }
                ApiError::Core(CoreError::Control(e)) => {
                    let body = json!({ "status": "ERROR", "message": e.to_string() });
                    (code, Json(body)).into_response()
                }
                other => {
                    let body = json!({ "message": other.to_string() });
                    (code, Json(body)).into_response()
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use std::time::Duration;

        use jobmon_core::ControlError;
        use jobmon_model::{InstanceId, JobName};

        use super::*;

        fn job() -> JobName {
            JobName::new("backup").unwrap()
        }

        #[test]
        fn status_codes() {
            let cases = [
                (ApiError::InvalidRequest("x".into()), 400),
                (ApiError::UnsupportedMediaType("x".into()), 415),
                (CoreError::TemplateNotFound(job()).into(), 404),
                (
                    CoreError::InstanceNotFound {
                        job: job(),
                        id: "nope".into(),
                    }
                    .into(),
                    404,
                ),
                (CoreError::TemplateExists(job()).into(), 303),
                (
                    CoreError::AlreadyFinished {
                        job: job(),
                        id: InstanceId::parse("0123456789ab").unwrap(),
                    }
                    .into(),
                    403,
                ),
                (
                    CoreError::Model(ModelError::InvalidJobName("a/b".into())).into(),
                    400,
                ),
                (
                    CoreError::Control(ControlError::Timeout(Duration::from_secs(1))).into(),
                    500,
                ),
            ];
            for (err, code) in cases {
                assert_eq!(err.status_code().as_u16(), code, "{err}");
            }
        }

        async fn body_json(resp: Response) -> serde_json::Value {
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        #[test]
        fn conflict_links_to_job() {
            let resp = ApiError::from(CoreError::TemplateExists(job())).into_response();
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(resp.headers()[header::LINK], "/jobs/backup");
        }

        #[tokio::test]
        async fn supervisor_timeout_reads_as_error() {
            let err = CoreError::Control(ControlError::Timeout(Duration::from_secs(30)));
            let resp = ApiError::from(err).into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(resp).await,
                json!({
                    "status": "ERROR",
                    "message": "remote command timed out after 30s",
                })
            );
        }

        #[tokio::test]
        async fn not_found_carries_domain_message() {
            let err = ApiError::from(CoreError::TemplateNotFound(
                JobName::new("ghost").unwrap(),
            ));
            assert_eq!(err.to_string(), "no job template exists for 'ghost'");

            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            assert_eq!(
                body_json(resp).await,
                json!({ "message": "no job template exists for 'ghost'" })
            );
        }
    }
}
