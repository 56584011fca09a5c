use lambda_runtime::LambdaEvent;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{AppError, ErrorResponse, ErrorSeverity};

/// Lambda 関数用のエラーハンドリングユーティリティ
pub struct LambdaErrorHandler;

impl LambdaErrorHandler {
    /// EventBridge 用のエラーハンドリング
    ///
    /// EventBridge の非同期呼び出しでは戻り値が参照されないため、
    /// 詳細を含めた JSON を Lambda エラーとして返し、ログと DLQ で追跡する。
    pub fn handle_eventbridge_error(error: &AppError, request_id: Option<String>) -> lambda_runtime::Error {
        let request_id = request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let error_response = ErrorResponse::from_app_error(error, request_id);

        lambda_runtime::Error::from(
            error_response
                .to_json()
                .unwrap_or_else(|_| error.to_string()),
        )
    }

    /// リクエストIDを抽出
    pub fn extract_request_id<T>(event: &LambdaEvent<T>) -> Option<String> {
        Some(event.context.request_id.clone())
    }

    /// エラーを重要度に応じたレベルでログに記録
    pub fn log_error(error: &AppError, context: Option<HashMap<String, String>>) {
        let metadata = error.metadata();

        match metadata.severity {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(
                    error = %error,
                    code = %metadata.code,
                    category = ?metadata.category,
                    retryable = metadata.retryable,
                    context = ?context,
                    "Error occurred"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error = %error,
                    code = %metadata.code,
                    category = ?metadata.category,
                    retryable = metadata.retryable,
                    context = ?context,
                    "Warning occurred"
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error = %error,
                    code = %metadata.code,
                    category = ?metadata.category,
                    context = ?context,
                    "Info level error occurred"
                );
            }
        }
    }
}

/// EventBridge 用のエラーハンドリングマクロ
#[macro_export]
macro_rules! handle_eventbridge_error {
    ($result:expr, $request_id:expr) => {
        match $result {
            Ok(value) => value,
            Err(error) => {
                $crate::lambda_error::LambdaErrorHandler::log_error(&error, None);

                return Err(
                    $crate::lambda_error::LambdaErrorHandler::handle_eventbridge_error(
                        &error,
                        $request_id,
                    ),
                );
            }
        }
    };
}
