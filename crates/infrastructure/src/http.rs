use reqwest::Response;
use serde::de::DeserializeOwned;
use shared::{AppError, Config};

/// 運送会社 API のレスポンス分類
///
/// 400 系の拒否と 500 系のサーバーエラーは業務上の失敗として扱い、
/// 呼び出し側がユーザー向けメッセージを投稿する。
#[derive(Debug, Clone, PartialEq)]
pub enum CarrierResponse<T> {
    Accepted(T),
    Rejected(String),
    ServerError(u16),
}

/// 全クライアント共通の reqwest クライアントを作成
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .map_err(|e| AppError::Configuration(format!("HTTP client: {e}")))
}

/// 2xx 以外を AppError に変換
pub async fn error_for_status(service: &str, response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::from_status(service, status.as_u16(), body))
}

/// レスポンスボディを JSON としてデコード
pub async fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> Result<T, AppError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Deserialization(format!("{service} response: {e}")))
}

/// ベース URL とパスを結合（どちらのスラッシュ有無も許容）
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.thetis-ims.com/2/", "/documents/1"),
            "https://api.thetis-ims.com/2/documents/1"
        );
        assert_eq!(join_url("https://h/api/v3", "consignments"), "https://h/api/v3/consignments");
    }
}
