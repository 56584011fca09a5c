use lambda_runtime::Context;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::errors::AppError;

/// Lambda 関数のトレーシング情報
#[derive(Debug)]
pub struct LambdaTraceContext {
    pub function_name: String,
    pub function_version: String,
    pub request_id: String,
    pub trace_id: Option<String>,
}

impl LambdaTraceContext {
    /// Lambda Context からトレーシング情報を抽出
    pub fn from_lambda_context(context: &Context) -> Self {
        Self {
            function_name: context.env_config.function_name.clone(),
            function_version: context.env_config.version.clone(),
            request_id: context.request_id.clone(),
            trace_id: std::env::var("_X_AMZN_TRACE_ID").ok(),
        }
    }
}

/// Lambda 関数実行をトレースするマクロ
#[macro_export]
macro_rules! trace_lambda_handler {
    ($handler_name:expr, $event:expr, $context:expr, $handler_fn:expr) => {{
        use tracing::Instrument;
        use $crate::telemetry::{create_lambda_span, LambdaTraceContext};

        let trace_context = LambdaTraceContext::from_lambda_context(&$context);
        let span = create_lambda_span($handler_name, &trace_context);

        async move {
            tracing::info!(
                function_name = %trace_context.function_name,
                request_id = %trace_context.request_id,
                "Lambda function started"
            );

            let result = $handler_fn($event, $context).await;

            match &result {
                Ok(_) => {
                    tracing::info!("Lambda function completed successfully");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Lambda function failed");
                }
            }

            result
        }
        .instrument(span)
        .await
    }};
}

/// Lambda 関数用のスパンを作成
pub fn create_lambda_span(handler_name: &str, trace_context: &LambdaTraceContext) -> tracing::Span {
    tracing::span!(
        tracing::Level::INFO,
        "lambda_handler",
        handler = handler_name,
        function_name = %trace_context.function_name,
        function_version = %trace_context.function_version,
        request_id = %trace_context.request_id,
        trace_id = %trace_context.trace_id.as_deref().unwrap_or("none")
    )
}

/// 外部 HTTP 呼び出しをトレース
pub async fn trace_http_call<T, F, Fut>(
    service: &str,
    method: &str,
    path: &str,
    operation: F,
) -> Result<T, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let start_time = Instant::now();
    let result = operation().await;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            info!(service, method, path, duration_ms, "HTTP call completed");
        }
        Err(e) if e.metadata().retryable => {
            warn!(service, method, path, duration_ms, error = %e, "HTTP call failed (retryable)");
        }
        Err(e) => {
            error!(service, method, path, duration_ms, error = %e, "HTTP call failed");
        }
    }

    result
}
