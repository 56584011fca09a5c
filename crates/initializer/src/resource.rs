use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::telemetry::trace_http_call;
use shared::AppError;

use infrastructure::error_for_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// CloudFormation カスタムリソースのリクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
}

/// ResponseURL に PUT する応答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl CustomResourceResponse {
    /// プロビジョニングの失敗でスタックをロールバックさせないため、常に SUCCESS を返す
    pub fn success(request: &CustomResourceRequest, physical_resource_id: &str, reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: reason.into(),
            physical_resource_id: request
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| physical_resource_id.to_string()),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
        }
    }
}

#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), AppError>;
}

/// 署名付き S3 URL への PUT
pub struct HttpResponseSender {
    http: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, response_url: &str, response: &CustomResourceResponse) -> Result<(), AppError> {
        let body = serde_json::to_vec(response)?;

        trace_http_call("cloudformation", "PUT", "ResponseURL", || async move {
            // 署名付き URL のため Content-Type は空にする
            let result = self
                .http
                .put(response_url)
                .header(reqwest::header::CONTENT_TYPE, "")
                .body(body)
                .send()
                .await?;
            error_for_status("cloudformation", result).await.map(|_| ())
        })
        .await
    }
}
