//! Administrative endpoints: log browsing, webhook settings and test sends.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use domain_mail_alerts::{AdminNotice, MailAttempt};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookSetting {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveWebhookRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub address: String,
}

/// `GET /api/logs?limit=N`, newest first, 100 by default.
pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MailAttempt>>> {
    let Query(query) = query?;
    Ok(Json(state.admin.recent_logs(query.limit).await?))
}

pub async fn clear_logs(State(state): State<AppState>) -> ApiResult<Json<AdminNotice>> {
    Ok(Json(state.admin.clear_logs().await?))
}

pub async fn get_webhook(State(state): State<AppState>) -> ApiResult<Json<WebhookSetting>> {
    let url = state.admin.webhook_url().await?;
    Ok(Json(WebhookSetting { url }))
}

pub async fn save_webhook(
    State(state): State<AppState>,
    payload: Result<Json<SaveWebhookRequest>, JsonRejection>,
) -> ApiResult<Json<AdminNotice>> {
    let Json(request) = payload?;
    Ok(Json(state.admin.save_webhook_url(&request.url).await?))
}

pub async fn send_test_email(
    State(state): State<AppState>,
    payload: Result<Json<TestEmailRequest>, JsonRejection>,
) -> ApiResult<Json<AdminNotice>> {
    let Json(request) = payload?;
    Ok(Json(state.admin.send_test_email(&request.address).await?))
}

pub async fn send_test_alert(State(state): State<AppState>) -> ApiResult<Json<AdminNotice>> {
    Ok(Json(state.admin.send_test_alert().await?))
}
