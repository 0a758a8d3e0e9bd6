use crate::adapter::database_config::ConfigError;
use crate::domain::port::GatewayError;
use reqwest::{Response, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 連携サービスのエンドポイント群
/// 呼び出しごとにラウンドロビンでベースURLを選択する
#[derive(Debug)]
pub struct EndpointPool {
    base_urls: Vec<String>,
    next: AtomicUsize,
}

impl EndpointPool {
    pub fn new(base_urls: Vec<String>) -> Result<Self, ConfigError> {
        if base_urls.is_empty() {
            return Err(ConfigError::InvalidValue(
                "endpoint pool requires at least one base URL".to_string(),
            ));
        }
        Ok(Self {
            base_urls,
            next: AtomicUsize::new(0),
        })
    }

    /// 次のエンドポイントのURLを組み立てる
    pub fn url(&self, path: &str) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.base_urls.len();
        format!("{}{}", self.base_urls[index], path)
    }
}

/// reqwestのエラーをGatewayErrorに変換
pub(crate) fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(e.to_string())
    } else if e.is_decode() {
        GatewayError::InvalidResponse(e.to_string())
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// 成功以外のステータスをGatewayErrorに変換
pub(crate) async fn ensure_success(
    response: Response,
    resource: &str,
) -> Result<Response, GatewayError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(resource.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
