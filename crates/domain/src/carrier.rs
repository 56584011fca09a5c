use crate::errors::DomainError;
use crate::instruction::Instruction;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// IMS に登録された運送会社
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub carrier_name: String,
    #[serde(default)]
    pub data_document: Option<String>,
}

/// 名前で運送会社を検索
pub fn lookup_carrier<'a>(carriers: &'a [Carrier], name: &str) -> Result<&'a Carrier, DomainError> {
    carriers
        .iter()
        .find(|carrier| carrier.carrier_name == name)
        .ok_or_else(|| DomainError::CarrierNotFound(name.to_string()))
}

/// 連携対象の運送会社ごとの固定情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierProfile {
    Gls,
    Df,
}

impl CarrierProfile {
    pub fn from_string(name: &str) -> Result<Self, DomainError> {
        match name.to_uppercase().as_str() {
            "GLS" => Ok(CarrierProfile::Gls),
            "DF" => Ok(CarrierProfile::Df),
            _ => Err(DomainError::Validation(format!("Unknown carrier: {name}"))),
        }
    }

    /// IMS 上の運送会社名
    pub fn carrier_name(&self) -> &'static str {
        match self {
            CarrierProfile::Gls => "GLS",
            CarrierProfile::Df => "DF",
        }
    }

    /// データドキュメント内のキー兼データ拡張名
    pub fn data_extension_name(&self) -> &'static str {
        match self {
            CarrierProfile::Gls => "GLSTransport",
            CarrierProfile::Df => "DFTransport",
        }
    }

    /// セラーエンティティに追加するセットアップ項目のスキーマ
    pub fn data_schema(&self) -> Value {
        match self {
            CarrierProfile::Gls => json!({
                "type": "object",
                "properties": {
                    "userName": {"type": "string"},
                    "password": {"type": "string"},
                    "contactId": {"type": "string"},
                    "customerId": {"type": "string"}
                }
            }),
            CarrierProfile::Df => json!({
                "type": "object",
                "properties": {
                    "clientId": {"type": "string"},
                    "clientSecret": {"type": "string"},
                    "host": {"type": "string"},
                    "protocol": {"type": "string"},
                    "instructions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "pattern": {"type": "object"},
                                "attributes": {"type": "object"}
                            }
                        }
                    }
                }
            }),
        }
    }

    /// データドキュメント文字列からこの運送会社のセットアップを取り出す
    pub fn read_setup<T: DeserializeOwned>(&self, data_document: Option<&str>) -> Result<T, DomainError> {
        let key = self.data_extension_name();
        let document = data_document.ok_or_else(|| DomainError::MissingSetup(key.to_string()))?;
        let mut document: Value = serde_json::from_str(document)
            .map_err(|e| DomainError::InvalidDataDocument(e.to_string()))?;
        let setup = document
            .get_mut(key)
            .map(Value::take)
            .filter(|setup| !setup.is_null())
            .ok_or_else(|| DomainError::MissingSetup(key.to_string()))?;
        serde_json::from_value(setup).map_err(|e| DomainError::InvalidDataDocument(format!("{key}: {e}")))
    }

    /// セットアップをデータドキュメント文字列に包む
    pub fn wrap_setup(&self, setup: &Value) -> String {
        let mut document = serde_json::Map::new();
        document.insert(self.data_extension_name().to_string(), setup.clone());
        Value::Object(document).to_string()
    }
}

impl std::fmt::Display for CarrierProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.carrier_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlsSetup {
    pub user_name: String,
    pub password: String,
    pub customer_id: String,
    pub contact_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DfSetup {
    pub client_id: String,
    pub client_secret: String,
    pub host: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

fn default_protocol() -> String {
    "https".to_string()
}

impl DfSetup {
    pub fn api_url(&self) -> String {
        format!("{}://{}/api/v3/", self.protocol, self.host)
    }

    pub fn token_url(&self) -> String {
        format!("{}://{}/oauth/v2/token", self.protocol, self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carriers() -> Vec<Carrier> {
        vec![
            Carrier {
                id: Some(1),
                carrier_name: "GLS".to_string(),
                data_document: None,
            },
            Carrier {
                id: Some(2),
                carrier_name: "DF".to_string(),
                data_document: None,
            },
        ]
    }

    #[test]
    fn test_lookup_carrier_by_name() {
        let carriers = carriers();
        assert_eq!(lookup_carrier(&carriers, "DF").unwrap().id, Some(2));
    }

    #[test]
    fn test_lookup_unknown_carrier() {
        let error = lookup_carrier(&carriers(), "PostNord").unwrap_err();
        assert!(matches!(error, DomainError::CarrierNotFound(name) if name == "PostNord"));
    }

    #[test]
    fn test_read_gls_setup() {
        let document = r#"{"GLSTransport":{"userName":"u","password":"p","customerId":"c","contactId":"k"},"Other":1}"#;
        let setup: GlsSetup = CarrierProfile::Gls.read_setup(Some(document)).unwrap();
        assert_eq!(setup.customer_id, "c");
        assert_eq!(setup.contact_id, "k");
    }

    #[test]
    fn test_read_df_setup_with_instructions() {
        let document = r#"{"DFTransport":{"clientId":"id","clientSecret":"s","host":"api.dfragt.dk",
            "instructions":[{"pattern":{"deliveryAddress":{"countryCode":"DK"}},"attributes":{"ProductCode":"100"}}]}}"#;
        let setup: DfSetup = CarrierProfile::Df.read_setup(Some(document)).unwrap();
        assert_eq!(setup.protocol, "https");
        assert_eq!(setup.api_url(), "https://api.dfragt.dk/api/v3/");
        assert_eq!(setup.token_url(), "https://api.dfragt.dk/oauth/v2/token");
        assert_eq!(setup.instructions.len(), 1);
    }

    #[test]
    fn test_read_setup_missing_key() {
        let result: Result<GlsSetup, _> = CarrierProfile::Gls.read_setup(Some(r#"{"DFTransport":{}}"#));
        assert!(matches!(result, Err(DomainError::MissingSetup(_))));

        let result: Result<GlsSetup, _> = CarrierProfile::Gls.read_setup(None);
        assert!(matches!(result, Err(DomainError::MissingSetup(_))));
    }

    #[test]
    fn test_read_setup_invalid_json() {
        let result: Result<GlsSetup, _> = CarrierProfile::Gls.read_setup(Some("not json"));
        assert!(matches!(result, Err(DomainError::InvalidDataDocument(_))));
    }

    #[test]
    fn test_wrap_setup_round_trips_through_read() {
        let document = CarrierProfile::Df.wrap_setup(&json!({"clientId": "a", "clientSecret": "b", "host": "h"}));
        let setup: DfSetup = CarrierProfile::Df.read_setup(Some(&document)).unwrap();
        assert_eq!(setup.host, "h");
    }

    #[test]
    fn test_profile_from_string() {
        assert_eq!(CarrierProfile::from_string("gls").unwrap(), CarrierProfile::Gls);
        assert_eq!(CarrierProfile::from_string("DF").unwrap().data_extension_name(), "DFTransport");
        assert!(CarrierProfile::from_string("UPS").is_err());
    }
}
