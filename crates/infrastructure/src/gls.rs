use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::telemetry::trace_http_call;
use shared::{AppError, Config};
use std::collections::BTreeMap;

use crate::http::{join_url, read_json, CarrierResponse};

const SERVICE: &str = "gls";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlsAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub name1: Option<String>,
    pub street1: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_num: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlsAddresses {
    pub delivery: GlsAddress,
    pub alternative_shipper: GlsAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlsParcel {
    pub reference: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlsServices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_notification_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_shop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_delivery: Option<String>,
}

/// GLS CreateShipment リクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlsShipment {
    pub user_name: String,
    pub password: String,
    pub customer_id: String,
    #[serde(rename = "contactid")]
    pub contact_id: String,
    /// yyyyMMdd
    pub shipment_date: String,
    pub reference: String,
    pub parcels: Vec<GlsParcel>,
    pub addresses: GlsAddresses,
    pub services: GlsServices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlsParcelResult {
    pub parcel_number: String,
}

/// GLS CreateShipment 成功レスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlsShipmentResponse {
    pub consignment_id: String,
    #[serde(default)]
    pub parcels: Vec<GlsParcelResult>,
    /// Base64 エンコードされたラベル PDF
    #[serde(rename = "PDF")]
    pub pdf: String,
}

/// GLS 400 レスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlsErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_state: BTreeMap<String, Value>,
}

impl GlsErrorResponse {
    /// Message と全 ModelState を連結したメッセージ
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        for value in self.model_state.values() {
            match value {
                Value::Array(items) => parts.extend(items.iter().map(value_text)),
                other => parts.push(value_text(other)),
            }
        }
        parts.join(" ")
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
pub trait GlsApi: Send + Sync {
    async fn create_shipment(
        &self,
        shipment: &GlsShipment,
    ) -> Result<CarrierResponse<GlsShipmentResponse>, AppError>;
}

pub struct GlsClient {
    http: reqwest::Client,
    base_url: String,
}

impl GlsClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.gls_api_url.clone(),
        }
    }
}

#[async_trait]
impl GlsApi for GlsClient {
    async fn create_shipment(
        &self,
        shipment: &GlsShipment,
    ) -> Result<CarrierResponse<GlsShipmentResponse>, AppError> {
        let url = join_url(&self.base_url, "CreateShipment");

        trace_http_call(SERVICE, "POST", "CreateShipment", || async {
            let response = self.http.post(&url).json(shipment).send().await?;
            let status = response.status().as_u16();
            match status {
                200..=299 => Ok(CarrierResponse::Accepted(read_json(SERVICE, response).await?)),
                400 => {
                    let error: GlsErrorResponse = read_json(SERVICE, response).await.unwrap_or_default();
                    Ok(CarrierResponse::Rejected(error.describe()))
                }
                500 => Ok(CarrierResponse::ServerError(status)),
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    Err(AppError::from_status(SERVICE, status, body))
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_response_description() {
        let error: GlsErrorResponse = serde_json::from_value(json!({
            "Message": "The request is invalid.",
            "ModelState": {
                "shipment.Addresses.Delivery.ZipCode": ["Invalid zip code"],
                "shipment.Parcels": ["At least one parcel", "Weight missing"]
            }
        }))
        .unwrap();

        assert_eq!(
            error.describe(),
            "The request is invalid. Invalid zip code At least one parcel Weight missing"
        );
    }

    #[test]
    fn test_shipment_wire_names() {
        let shipment = GlsShipment {
            user_name: "u".to_string(),
            password: "p".to_string(),
            customer_id: "c".to_string(),
            contact_id: "k".to_string(),
            shipment_date: "20231001".to_string(),
            reference: "S1".to_string(),
            parcels: vec![GlsParcel {
                reference: "S1 #1".to_string(),
                weight: Some(1.5),
            }],
            addresses: GlsAddresses {
                delivery: GlsAddress::default(),
                alternative_shipper: GlsAddress::default(),
            },
            services: GlsServices {
                flex_delivery: Some("Y".to_string()),
                ..GlsServices::default()
            },
        };
        let value = serde_json::to_value(&shipment).unwrap();

        assert_eq!(value["contactid"], "k");
        assert_eq!(value["userName"], "u");
        assert_eq!(value["shipmentDate"], "20231001");
        assert_eq!(value["addresses"]["alternativeShipper"]["name1"], Value::Null);
        assert_eq!(value["services"], json!({"flexDelivery": "Y"}));
    }

    #[test]
    fn test_response_decoding() {
        let response: GlsShipmentResponse = serde_json::from_value(json!({
            "ConsignmentId": "C-1",
            "Parcels": [{"ParcelNumber": "0001"}, {"ParcelNumber": "0002"}],
            "PDF": "JVBERi0xLjQ="
        }))
        .unwrap();

        assert_eq!(response.consignment_id, "C-1");
        assert_eq!(response.parcels[1].parcel_number, "0002");
        assert_eq!(response.pdf, "JVBERi0xLjQ=");
    }
}
