use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::AppError;

/// expires_in が返されない場合のトークン有効期間（秒）
const DEFAULT_LIFETIME_SECS: i64 = 3600;
/// 期限切れ直前のトークンを使わないための余裕（秒）
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth2 client_credentials のトークンレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub fn into_access_token(self, default_type: &str) -> AccessToken {
        let token_type = self.token_type.unwrap_or_else(|| default_type.to_string());
        let lifetime = self.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        AccessToken::new(
            format!("{token_type} {}", self.access_token),
            Utc::now() + Duration::seconds(lifetime),
        )
    }
}

/// Authorization ヘッダー値と有効期限
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub authorization: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(authorization: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            authorization,
            expires_at,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// キーごとにアクセストークンを保持するキャッシュ
///
/// Lambda のウォームスタート間で共有される。期限切れ（または期限間近）の
/// エントリは次の取得時に再発行される。
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 有効なトークンを返す。なければ `fetch` で取得して保存する
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<String, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, AppError>>,
    {
        let mut entries = self.entries.lock().await;

        if let Some(token) = entries.get(key) {
            if token.is_fresh_at(Utc::now()) {
                return Ok(token.authorization.clone());
            }
            debug!(key, expires_at = %token.expires_at, "Cached token expired, fetching a new one");
        }

        let token = fetch().await?;
        let authorization = token.authorization.clone();
        entries.insert(key.to_string(), token);
        Ok(authorization)
    }

    /// 401 を受けた場合などにエントリを破棄
    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}
