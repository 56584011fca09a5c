use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 出荷予約イベントの detail 部
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    pub document_id: i64,
    pub shipment_id: i64,
    pub context_id: i64,
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub addressee: Option<String>,
    #[serde(default)]
    pub street_name_and_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city_town_or_village: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContainer {
    pub id: i64,
    #[serde(default)]
    pub gross_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: i64,
    pub shipment_number: String,
    #[serde(default)]
    pub seller_id: Option<i64>,
    #[serde(default)]
    pub delivery_address: Address,
    #[serde(default)]
    pub contact_person: Option<ContactPerson>,
    #[serde(default)]
    pub shipping_containers: Vec<ShippingContainer>,
    #[serde(default)]
    pub pick_up_point_id: Option<String>,
    #[serde(default)]
    pub notes_on_delivery: Option<String>,
    #[serde(default)]
    pub terms_of_delivery: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: i64,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact_person: Option<ContactPerson>,
    #[serde(default)]
    pub data_document: Option<String>,
}

/// IMS のテナント（セラーを持たない出荷の差出人）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub id: i64,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact_person: Option<ContactPerson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExtension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub entity_name: String,
    pub data_extension_name: String,
    pub data_schema: String,
}

/// ドキュメントの作業状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    OnGoing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Info,
    Error,
}

/// IMS イベントに添付されるユーザー向けメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// エポックミリ秒
    pub time: i64,
    pub source: String,
    pub message_type: MessageType,
    pub message_text: String,
    pub device_name: Option<String>,
    pub user_id: Option<String>,
}

impl EventMessage {
    /// 予約イベントに紐づくエラーメッセージを作成
    pub fn error(source: &str, text: String, detail: &BookingDetail) -> Self {
        Self {
            time: Utc::now().timestamp_millis(),
            source: source.to_string(),
            message_type: MessageType::Error,
            message_text: text,
            device_name: detail.device_name.clone(),
            user_id: detail.user_id.clone(),
        }
    }
}

/// ドキュメント添付ファイル（配送ラベル）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub base64_encoded_content: String,
    pub file_name: String,
}

impl Attachment {
    /// 配送ラベル PDF の添付を作成
    pub fn shipping_label(document_id: i64, base64_pdf: String) -> Self {
        Self {
            base64_encoded_content: base64_pdf,
            file_name: format!("SHIPPING_LABEL_{document_id}.pdf"),
        }
    }
}
