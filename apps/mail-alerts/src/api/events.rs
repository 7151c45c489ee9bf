//! Host mail lifecycle events.
//!
//! An out-of-process host reports `initiated` before transmitting, then exactly one of
//! `succeeded` or `failed`. Responses never depend on whether the log write or the
//! alert worked; those run in the background.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use domain_mail_alerts::{FailureMetadata, OutgoingMail, SendFailure, SendId, SendReceipt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct InitiatedResponse {
    pub send_id: SendId,
}

#[derive(Debug, Deserialize)]
pub struct FailedRequest {
    pub send_id: Option<SendId>,
    pub message: String,
    pub recipients: Option<Vec<String>>,
    pub subject: Option<String>,
}

impl From<FailedRequest> for SendFailure {
    fn from(request: FailedRequest) -> Self {
        let failure = SendFailure::new(request.message);
        if request.recipients.is_none() && request.subject.is_none() {
            return failure;
        }

        failure.with_metadata(FailureMetadata {
            recipients: request.recipients.unwrap_or_default(),
            subject: request.subject,
        })
    }
}

/// Whether the signal produced a log record.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventAccepted {
    pub recorded: bool,
}

pub async fn send_initiated(
    State(state): State<AppState>,
    payload: Result<Json<OutgoingMail>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InitiatedResponse>)> {
    let Json(mail) = payload?;
    let send_id = state.pipeline.send_initiated(mail).await;

    Ok((StatusCode::CREATED, Json(InitiatedResponse { send_id })))
}

pub async fn send_succeeded(
    State(state): State<AppState>,
    Path(send_id): Path<Uuid>,
    payload: Result<Json<SendReceipt>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventAccepted>)> {
    let Json(receipt) = payload?;
    let recorded = state
        .pipeline
        .send_succeeded(SendId::from(send_id), receipt)
        .await
        .is_some();

    Ok((StatusCode::ACCEPTED, Json(EventAccepted { recorded })))
}

pub async fn send_failed(
    State(state): State<AppState>,
    payload: Result<Json<FailedRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventAccepted>)> {
    let Json(request) = payload?;
    let send_id = request.send_id;
    state.pipeline.send_failed(send_id, request.into()).await;

    Ok((StatusCode::ACCEPTED, Json(EventAccepted { recorded: true })))
}
