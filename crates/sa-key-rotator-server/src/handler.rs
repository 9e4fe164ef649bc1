//! The rotation endpoint.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use sa_key_rotator::Rotator;

use crate::message::{parse_body, RotationRequest};
use crate::AppState;

/// Body of every 400 response.
pub const BAD_REQUEST_BODY: &str = "Bad Request (body)";

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, BAD_REQUEST_BODY).into_response()
}

/// `POST /`: rotate every service account in the body concurrently.
///
/// Answers once all rotations have finished: 200 when every request was
/// valid and rotated, 400 otherwise.
pub async fn rotate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(err = %err, "error reading request-body");
            return bad_request();
        }
    };
    let requests = match parse_body(&body) {
        Ok(requests) => requests,
        Err(err) => {
            tracing::error!(err = %err, "error reading request-body");
            return bad_request();
        }
    };

    let mut tasks = JoinSet::new();
    for request in requests {
        let rotator = state.rotator.clone();
        let cancel = state.cancel.child_token();
        tasks.spawn(process(rotator, request, cancel));
    }

    let mut ok = true;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(success) => ok &= success,
            Err(err) => {
                tracing::error!(err = %err, "rotation task failed");
                ok = false;
            }
        }
    }

    if ok {
        StatusCode::OK.into_response()
    } else {
        bad_request()
    }
}

/// Validate and rotate one request. Returns whether it succeeded.
async fn process(rotator: Rotator, request: RotationRequest, cancel: CancellationToken) -> bool {
    let problems = request.problems();
    if !problems.is_empty() {
        for problem in problems {
            tracing::warn!("invalid request, {problem}");
        }
        return false;
    }

    match rotator.rotate(&request.to_config(), &cancel).await {
        Ok(_) => true,
        Err(err) => {
            tracing::error!(
                service_account = %request.service_account,
                err = %err,
                "error rotating service account key"
            );
            false
        }
    }
}
