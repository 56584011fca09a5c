use async_trait::async_trait;
use domain::{Attributes, DfSetup};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use shared::telemetry::trace_http_call;
use shared::{AccessToken, AppError, TokenCache, TokenResponse};
use std::sync::Arc;
use tracing::debug;

use crate::http::{error_for_status, join_url, read_json, CarrierResponse};

const SERVICE: &str = "df";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfParty {
    pub name: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfParcel {
    pub reference: String,
    pub weight: Option<f64>,
}

/// DF 貨物登録リクエスト
///
/// 出荷指示の属性のうち既知の3項目以外は `extra` としてそのまま送る。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfConsignment {
    pub reference: String,
    pub shipping_type: String,
    pub product_code: String,
    pub who_pays: String,
    pub sender: DfParty,
    pub receiver: DfParty,
    pub parcels: Vec<DfParcel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_up_point_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfParcelResult {
    pub parcel_number: String,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfConsignmentResponse {
    pub consignment_number: String,
    #[serde(default)]
    pub parcels: Vec<DfParcelResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DfLabel {
    /// Base64 エンコードされた PDF
    content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl DfErrorResponse {
    pub fn describe(&self) -> String {
        self.message
            .iter()
            .chain(self.errors.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait DfApi: Send + Sync {
    async fn create_consignment(
        &self,
        setup: &DfSetup,
        consignment: &DfConsignment,
    ) -> Result<CarrierResponse<DfConsignmentResponse>, AppError>;

    /// ラベル PDF（Base64）を取得
    async fn fetch_label(&self, setup: &DfSetup, consignment_number: &str) -> Result<String, AppError>;
}

/// DF API クライアント
///
/// 接続先と認証情報はセラーごとのセットアップから取るため、
/// トークンは「トークン URL + クライアント ID」単位でキャッシュする。
pub struct DfClient {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
}

impl DfClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self { http, tokens }
    }

    fn token_key(setup: &DfSetup) -> String {
        format!("df|{}|{}", setup.token_url(), setup.client_id)
    }

    async fn authorization(&self, setup: &DfSetup) -> Result<String, AppError> {
        self.tokens
            .get_or_fetch(&Self::token_key(setup), || self.fetch_token(setup))
            .await
    }

    async fn fetch_token(&self, setup: &DfSetup) -> Result<AccessToken, AppError> {
        debug!(host = %setup.host, "Fetching DF access token");
        let url = setup.token_url();

        trace_http_call(SERVICE, "GET", "oauth/v2/token", || async {
            let response = self
                .http
                .get(&url)
                .query(&[
                    ("_format", "json"),
                    ("client_id", setup.client_id.as_str()),
                    ("client_secret", setup.client_secret.as_str()),
                    ("grant_type", "client_credentials"),
                ])
                .send()
                .await?;
            let response = error_for_status(SERVICE, response).await.map_err(|e| match e {
                AppError::Upstream { status: 400, body, .. } => AppError::Authentication(body),
                other => other,
            })?;
            let token: TokenResponse = read_json(SERVICE, response).await?;
            // DF は token_type を返すが常に Bearer として扱う
            Ok(TokenResponse {
                token_type: None,
                ..token
            }
            .into_access_token("Bearer"))
        })
        .await
    }

    async fn invalidate_on_auth_error<T>(&self, setup: &DfSetup, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(AppError::Authentication(_)) = &result {
            self.tokens.invalidate(&Self::token_key(setup)).await;
        }
        result
    }
}

#[async_trait]
impl DfApi for DfClient {
    async fn create_consignment(
        &self,
        setup: &DfSetup,
        consignment: &DfConsignment,
    ) -> Result<CarrierResponse<DfConsignmentResponse>, AppError> {
        let authorization = self.authorization(setup).await?;
        let url = join_url(&setup.api_url(), "consignments");

        let result = trace_http_call(SERVICE, "POST", "consignments", || async {
            let response = self
                .http
                .post(&url)
                .header(AUTHORIZATION, authorization)
                .json(consignment)
                .send()
                .await?;
            let status = response.status().as_u16();
            match status {
                200..=299 => Ok(CarrierResponse::Accepted(read_json(SERVICE, response).await?)),
                400 | 422 => {
                    let error: DfErrorResponse = read_json(SERVICE, response).await.unwrap_or_default();
                    Ok(CarrierResponse::Rejected(error.describe()))
                }
                500..=599 => Ok(CarrierResponse::ServerError(status)),
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    Err(AppError::from_status(SERVICE, status, body))
                }
            }
        })
        .await;

        self.invalidate_on_auth_error(setup, result).await
    }

    async fn fetch_label(&self, setup: &DfSetup, consignment_number: &str) -> Result<String, AppError> {
        let authorization = self.authorization(setup).await?;
        let path = format!("consignments/{consignment_number}/label");
        let url = join_url(&setup.api_url(), &path);

        let result = trace_http_call(SERVICE, "GET", &path, || async {
            let response = self
                .http
                .get(&url)
                .header(AUTHORIZATION, authorization)
                .query(&[("format", "pdf")])
                .send()
                .await?;
            let response = error_for_status(SERVICE, response).await?;
            let label: DfLabel = read_json(SERVICE, response).await?;
            Ok(label.content)
        })
        .await;

        self.invalidate_on_auth_error(setup, result).await
    }
}
