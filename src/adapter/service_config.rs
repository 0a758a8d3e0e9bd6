use crate::adapter::database_config::ConfigError;
use std::env;
use std::time::Duration;

/// サービス全体の接続設定
/// 待ち受けアドレスと連携サービスのエンドポイント
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub accommodation_service_urls: Vec<String>,
    pub user_service_urls: Vec<String>,
    pub outbound_timeout_ms: u64,
}

impl ServiceConfig {
    /// 環境変数から設定を読み取る
    /// エンドポイントはカンマ区切りで複数指定できる
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_address = env::var("SERVICE_PATH").unwrap_or_else(|_| "0.0.0.0:8083".to_string());

        let accommodation_service_urls = parse_endpoints(
            "ACCOMMODATION_SERVICE_PATH",
            &env::var("ACCOMMODATION_SERVICE_PATH")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
        )?;

        let user_service_urls = parse_endpoints(
            "USER_SERVICE_PATH",
            &env::var("USER_SERVICE_PATH").unwrap_or_else(|_| "http://localhost:8081".to_string()),
        )?;

        let outbound_timeout_ms = env::var("OUTBOUND_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid OUTBOUND_TIMEOUT_MS: {}", e)))?;

        Ok(Self {
            bind_address,
            accommodation_service_urls,
            user_service_urls,
            outbound_timeout_ms,
        })
    }

    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_millis(self.outbound_timeout_ms)
    }
}

fn parse_endpoints(name: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let urls: Vec<String> = raw
        .split(',')
        .map(|url| url.trim().trim_end_matches('/'))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(ConfigError::InvalidValue(format!("{} has no endpoints", name)));
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_parse_endpoints_splits_and_trims() {
        let urls = parse_endpoints("X", " http://a:1/ ,http://b:2,, ").unwrap();
        assert_eq!(urls, vec!["http://a:1", "http://b:2"]);
    }

    #[test]
    fn test_parse_endpoints_rejects_empty_list() {
        assert!(parse_endpoints("X", " , ").is_err());
    }

    #[test]
    fn test_from_env_with_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        for var in [
            "SERVICE_PATH",
            "ACCOMMODATION_SERVICE_PATH",
            "USER_SERVICE_PATH",
            "OUTBOUND_TIMEOUT_MS",
        ] {
            env::remove_var(var);
        }

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8083");
        assert_eq!(config.accommodation_service_urls, vec!["http://localhost:8082"]);
        assert_eq!(config.user_service_urls, vec!["http://localhost:8081"]);
        assert_eq!(config.outbound_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("OUTBOUND_TIMEOUT_MS", "soon");
        assert!(ServiceConfig::from_env().is_err());
        env::remove_var("OUTBOUND_TIMEOUT_MS");
    }
}
