use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// アプリケーション全体で使用される包括的なエラー型
#[derive(Debug, Clone, Error)]
pub enum AppError {
    // ドメインエラー
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    // 外部 API エラー
    #[error("Upstream {service} responded {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // 認証エラー
    #[error("Authentication failed: {0}")]
    Authentication(String),

    // データエラー
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // システムエラー
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// エラーの分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 入力・業務データ起因
    Client,
    /// 自システム起因
    Server,
    /// 一時的なエラー（リトライ可能）
    Transient,
    /// 外部 API が拒否した（リトライ不可）
    Permanent,
}

/// エラーの重要度
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// リトライ戦略（`RetryExecutor` の設定）
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// 最大試行回数
    pub max_attempts: u32,
    /// 初期遅延時間
    pub initial_delay: Duration,
    /// 最大遅延時間
    pub max_delay: Duration,
    /// バックオフ倍率
    pub backoff_multiplier: f64,
    /// ジッター追加フラグ
    pub add_jitter: bool,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

/// エラーメタデータ
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub retryable: bool,
}

impl ErrorMetadata {
    fn new(code: &str, category: ErrorCategory, severity: ErrorSeverity) -> Self {
        Self {
            code: code.to_string(),
            category,
            severity,
            retryable: false,
        }
    }

    fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl AppError {
    /// エラーメタデータを取得
    pub fn metadata(&self) -> ErrorMetadata {
        match self {
            AppError::Domain(error) if error.is_business_failure() => {
                ErrorMetadata::new("BUSINESS_FAILURE", ErrorCategory::Client, ErrorSeverity::Warning)
            }
            AppError::Domain(_) => {
                ErrorMetadata::new("DOMAIN_ERROR", ErrorCategory::Client, ErrorSeverity::Error)
            }

            AppError::Upstream { status, .. } => match status {
                502..=504 => ErrorMetadata::new("UPSTREAM_UNAVAILABLE", ErrorCategory::Transient, ErrorSeverity::Error)
                    .retryable(),
                400..=499 => {
                    ErrorMetadata::new("UPSTREAM_REJECTED", ErrorCategory::Permanent, ErrorSeverity::Error)
                }
                _ => ErrorMetadata::new("UPSTREAM_ERROR", ErrorCategory::Server, ErrorSeverity::Error),
            },

            AppError::Network(_) => {
                ErrorMetadata::new("NETWORK_ERROR", ErrorCategory::Transient, ErrorSeverity::Error)
                    .retryable()
            }
            AppError::Timeout(_) => {
                ErrorMetadata::new("TIMEOUT", ErrorCategory::Transient, ErrorSeverity::Error).retryable()
            }
            AppError::RateLimitExceeded => {
                ErrorMetadata::new("RATE_LIMIT_EXCEEDED", ErrorCategory::Transient, ErrorSeverity::Warning)
                    .retryable()
            }

            AppError::Authentication(_) => {
                ErrorMetadata::new("AUTHENTICATION_ERROR", ErrorCategory::Permanent, ErrorSeverity::Critical)
            }
            AppError::NotFound(_) => {
                ErrorMetadata::new("NOT_FOUND", ErrorCategory::Client, ErrorSeverity::Warning)
            }
            AppError::Validation(_) => {
                ErrorMetadata::new("VALIDATION_ERROR", ErrorCategory::Client, ErrorSeverity::Info)
            }
            AppError::Serialization(_) | AppError::Deserialization(_) => {
                ErrorMetadata::new("SERIALIZATION_ERROR", ErrorCategory::Server, ErrorSeverity::Error)
            }
            AppError::Configuration(_) => {
                ErrorMetadata::new("CONFIGURATION_ERROR", ErrorCategory::Server, ErrorSeverity::Critical)
            }
        }
    }

    /// HTTP ステータスから外部 API エラーを作成
    pub fn from_status(service: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => AppError::Authentication(format!("{service} responded {status}: {body}")),
            404 => AppError::NotFound(format!("{service}: {body}")),
            429 => AppError::RateLimitExceeded,
            _ => AppError::Upstream {
                service: service.to_string(),
                status,
                body,
            },
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AppError::Timeout(error.to_string())
        } else if error.is_decode() {
            AppError::Deserialization(error.to_string())
        } else if let Some(status) = error.status() {
            AppError::from_status("http", status.as_u16(), error.to_string())
        } else {
            AppError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() || error.is_syntax() || error.is_eof() {
            AppError::Deserialization(error.to_string())
        } else {
            AppError::Serialization(error.to_string())
        }
    }
}

/// 標準化されたエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub context: HashMap<String, String>,
}

impl ErrorResponse {
    /// AppError から ErrorResponse を作成
    pub fn from_app_error(error: &AppError, request_id: String) -> Self {
        Self {
            code: error.metadata().code,
            message: error.to_string(),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self).map_err(|e| AppError::Serialization(e.to_string()))
    }
}
