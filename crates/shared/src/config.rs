use crate::errors::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_IMS_AUTH_URL: &str = "https://auth.thetis-ims.com/oauth2/";
const DEFAULT_IMS_API_URL: &str = "https://api.thetis-ims.com/2/";
const DEFAULT_GLS_API_URL: &str = "https://api.gls.dk/ws/DK/V1/";

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub api_key: String,
    pub ims_auth_url: String,
    pub ims_api_url: String,
    pub gls_api_url: String,
    pub environment: String,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の取得関数から設定を構築（テストでは環境変数を汚さずに使う）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::Configuration(format!("{key} is not set")))
        };
        let number = |key: &str, default: u64| -> Result<u64, AppError> {
            match lookup(key) {
                Some(value) => value
                    .parse()
                    .map_err(|_| AppError::Configuration(format!("{key} must be a number: {value}"))),
                None => Ok(default),
            }
        };

        Ok(Config {
            client_id: required("ClientId")?,
            client_secret: required("ClientSecret")?,
            api_key: required("ApiKey")?,
            ims_auth_url: lookup("IMS_AUTH_URL").unwrap_or_else(|| DEFAULT_IMS_AUTH_URL.to_string()),
            ims_api_url: lookup("IMS_API_URL").unwrap_or_else(|| DEFAULT_IMS_API_URL.to_string()),
            gls_api_url: lookup("GLS_API_URL").unwrap_or_else(|| DEFAULT_GLS_API_URL.to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),
            retry_max_attempts: number("RETRY_MAX_ATTEMPTS", 3)? as u32,
            retry_initial_delay_ms: number("RETRY_INITIAL_DELAY_MS", 100)?,
            http_timeout_secs: number("HTTP_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            ("ClientId", "id"),
            ("ClientSecret", "secret"),
            ("ApiKey", "key"),
        ]))
        .unwrap();

        assert_eq!(config.ims_api_url, DEFAULT_IMS_API_URL);
        assert_eq!(config.ims_auth_url, DEFAULT_IMS_AUTH_URL);
        assert_eq!(config.gls_api_url, DEFAULT_GLS_API_URL);
        assert_eq!(config.environment, "dev");
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_credentials() {
        let error = Config::from_lookup(lookup(&[("ClientId", "id"), ("ApiKey", "key")])).unwrap_err();
        assert!(matches!(error, AppError::Configuration(msg) if msg.contains("ClientSecret")));
    }

    #[test]
    fn test_empty_credential_is_missing() {
        let result = Config::from_lookup(lookup(&[
            ("ClientId", ""),
            ("ClientSecret", "secret"),
            ("ApiKey", "key"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_lookup(lookup(&[
            ("ClientId", "id"),
            ("ClientSecret", "secret"),
            ("ApiKey", "key"),
            ("RETRY_MAX_ATTEMPTS", "many"),
        ]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
