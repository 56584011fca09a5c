use async_trait::async_trait;
use domain::{
    Attachment, Carrier, Context, DataExtension, EventMessage, Seller, Shipment, WorkStatus,
};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::telemetry::trace_http_call;
use shared::{AccessToken, AppError, Config, RetryExecutor, TokenCache, TokenResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::http::{error_for_status, join_url, read_json};

const SERVICE: &str = "ims";
const TOKEN_KEY: &str = "ims";

/// IMS REST API のうち連携処理が使う操作
#[async_trait]
pub trait ImsApi: Send + Sync {
    /// 出荷レコードを生の JSON のまま取得（パターン照合の対象）
    async fn get_shipment_json(&self, shipment_id: i64) -> Result<Value, AppError>;

    async fn get_seller(&self, seller_id: i64) -> Result<Seller, AppError>;

    async fn get_context(&self, context_id: i64) -> Result<Context, AppError>;

    async fn get_carriers(&self) -> Result<Vec<Carrier>, AppError>;

    async fn create_carrier(&self, carrier: &Carrier) -> Result<(), AppError>;

    async fn get_data_extensions(&self) -> Result<Vec<DataExtension>, AppError>;

    async fn create_data_extension(&self, data_extension: &DataExtension) -> Result<(), AppError>;

    async fn update_data_schema(&self, data_extension_id: i64, data_schema: &str) -> Result<(), AppError>;

    async fn set_work_status(&self, document_id: i64, status: WorkStatus) -> Result<(), AppError>;

    async fn attach_to_document(&self, document_id: i64, attachment: &Attachment) -> Result<(), AppError>;

    async fn post_event_message(&self, event_id: i64, message: &EventMessage) -> Result<(), AppError>;

    async fn update_tracking(
        &self,
        shipping_container_id: i64,
        tracking_number: &str,
        tracking_url: &str,
    ) -> Result<(), AppError>;

    async fn set_carriers_shipment_number(&self, shipment_id: i64, number: &str) -> Result<(), AppError>;

    /// 出荷レコードを生の JSON と型付きの両方で取得
    async fn get_shipment(&self, shipment_id: i64) -> Result<(Value, Shipment), AppError> {
        let raw = self.get_shipment_json(shipment_id).await?;
        let shipment = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Deserialization(format!("shipments/{shipment_id}: {e}")))?;
        Ok((raw, shipment))
    }
}

/// reqwest による IMS クライアント
///
/// アクセストークンは `TokenCache` に保持し、期限が近づいたら再取得する。
/// 読み取り（GET）のみリトライ対象。
pub struct ImsClient {
    http: reqwest::Client,
    api_url: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
    api_key: String,
    tokens: Arc<TokenCache>,
    retry: RetryExecutor,
}

impl ImsClient {
    pub fn new(config: &Config, http: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self {
            http,
            api_url: config.ims_api_url.clone(),
            auth_url: config.ims_auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_key: config.api_key.clone(),
            tokens,
            retry: RetryExecutor::exponential_backoff(
                config.retry_max_attempts,
                Duration::from_millis(config.retry_initial_delay_ms),
            ),
        }
    }

    async fn authorization(&self) -> Result<String, AppError> {
        self.tokens
            .get_or_fetch(TOKEN_KEY, || self.fetch_token())
            .await
    }

    /// client_credentials でアクセストークンを取得
    async fn fetch_token(&self) -> Result<AccessToken, AppError> {
        debug!("Fetching IMS access token");
        let url = join_url(&self.auth_url, "token");

        trace_http_call(SERVICE, "POST", "token", || async {
            let response = self
                .http
                .post(&url)
                .basic_auth(&self.client_id, Some(&self.client_secret))
                .form(&[("grant_type", "client_credentials")])
                .send()
                .await?;
            let response = error_for_status(SERVICE, response).await.map_err(|e| match e {
                AppError::Upstream { status: 400, body, .. } => AppError::Authentication(body),
                other => other,
            })?;
            let token: TokenResponse = read_json(SERVICE, response).await?;
            Ok(token.into_access_token("Bearer"))
        })
        .await
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response, AppError> {
        let authorization = self.authorization().await?;
        let url = join_url(&self.api_url, path);

        let result = trace_http_call(SERVICE, method.as_str(), path, || async {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(AUTHORIZATION, authorization)
                .header("x-api-key", &self.api_key);
            if let Some(body) = body {
                request = request.json(body);
            }
            error_for_status(SERVICE, request.send().await?).await
        })
        .await;

        if let Err(AppError::Authentication(_)) = &result {
            self.tokens.invalidate(TOKEN_KEY).await;
        }
        result
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.retry
            .execute(|| async {
                let response = self.send(Method::GET, path, None).await?;
                read_json(SERVICE, response).await
            })
            .await
            .into_result()
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), AppError> {
        self.send(Method::POST, path, Some(body)).await.map(|_| ())
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<(), AppError> {
        self.send(Method::PATCH, path, Some(body)).await.map(|_| ())
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Serialization(e.to_string()))
}

#[async_trait]
impl ImsApi for ImsClient {
    async fn get_shipment_json(&self, shipment_id: i64) -> Result<Value, AppError> {
        self.get(&format!("shipments/{shipment_id}")).await
    }

    async fn get_seller(&self, seller_id: i64) -> Result<Seller, AppError> {
        self.get(&format!("sellers/{seller_id}")).await
    }

    async fn get_context(&self, context_id: i64) -> Result<Context, AppError> {
        self.get(&format!("contexts/{context_id}")).await
    }

    async fn get_carriers(&self) -> Result<Vec<Carrier>, AppError> {
        self.get("carriers").await
    }

    async fn create_carrier(&self, carrier: &Carrier) -> Result<(), AppError> {
        self.post("carriers", &to_body(carrier)?).await
    }

    async fn get_data_extensions(&self) -> Result<Vec<DataExtension>, AppError> {
        self.get("dataExtensions").await
    }

    async fn create_data_extension(&self, data_extension: &DataExtension) -> Result<(), AppError> {
        self.post("dataExtensions", &to_body(data_extension)?).await
    }

    async fn update_data_schema(&self, data_extension_id: i64, data_schema: &str) -> Result<(), AppError> {
        self.patch(
            &format!("dataExtensions/{data_extension_id}"),
            &json!({ "dataSchema": data_schema }),
        )
        .await
    }

    async fn set_work_status(&self, document_id: i64, status: WorkStatus) -> Result<(), AppError> {
        self.patch(&format!("documents/{document_id}"), &json!({ "workStatus": status }))
            .await
    }

    async fn attach_to_document(&self, document_id: i64, attachment: &Attachment) -> Result<(), AppError> {
        self.post(&format!("documents/{document_id}/attachments"), &to_body(attachment)?)
            .await
    }

    async fn post_event_message(&self, event_id: i64, message: &EventMessage) -> Result<(), AppError> {
        self.post(&format!("events/{event_id}/messages"), &to_body(message)?)
            .await
    }

    async fn update_tracking(
        &self,
        shipping_container_id: i64,
        tracking_number: &str,
        tracking_url: &str,
    ) -> Result<(), AppError> {
        self.patch(
            &format!("shippingContainers/{shipping_container_id}"),
            &json!({ "trackingNumber": tracking_number, "trackingUrl": tracking_url }),
        )
        .await
    }

    async fn set_carriers_shipment_number(&self, shipment_id: i64, number: &str) -> Result<(), AppError> {
        self.patch(
            &format!("shipments/{shipment_id}"),
            &json!({ "carriersShipmentNumber": number }),
        )
        .await
    }
}
