use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openrouter: OpenRouterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传请求体上限 (字节)
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub referer: String,
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            timeout_secs: 30,
            referer: "http://localhost:8501".to_string(),
            title: "Invoice Analyzer".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

impl AppConfig {
    /// 默认值 + 环境变量 (NF_SERVER__PORT, NF_OPENROUTER__BASE_URL ...)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(
                Environment::with_prefix("NF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 从环境变量加载配置，失败时回退默认值
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Invalid configuration ({}), using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    // 环境变量是进程级的，相关测试串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (key, _) in env::vars() {
            if key.starts_with("NF_") {
                env::remove_var(key);
            }
        }
        guard
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.openrouter.timeout_secs, 30);
        assert_eq!(config.openrouter.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_load_without_overrides_matches_defaults() {
        let _guard = clean_env();
        let config = AppConfig::load().unwrap();
        let defaults = AppConfig::default();

        assert_eq!(config.server.host, defaults.server.host);
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.openrouter.base_url, defaults.openrouter.base_url);
        assert_eq!(config.openrouter.title, defaults.openrouter.title);
    }

    #[test]
    fn test_env_overrides_defaults() {
        let _guard = clean_env();
        env::set_var("NF_SERVER__PORT", "9090");
        env::set_var("NF_OPENROUTER__BASE_URL", "http://localhost:1234/v1");
        env::set_var("NF_OPENROUTER__TIMEOUT_SECS", "5");

        let config = AppConfig::load();
        env::remove_var("NF_SERVER__PORT");
        env::remove_var("NF_OPENROUTER__BASE_URL");
        env::remove_var("NF_OPENROUTER__TIMEOUT_SECS");

        let config = config.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.openrouter.base_url, "http://localhost:1234/v1");
        assert_eq!(config.openrouter.timeout_secs, 5);
        assert_eq!(config.openrouter.title, "Invoice Analyzer");
    }

    #[test]
    fn test_invalid_env_falls_back_to_defaults() {
        let _guard = clean_env();
        env::set_var("NF_SERVER__PORT", "not-a-port");

        let loaded = AppConfig::load();
        let config = AppConfig::from_env();
        env::remove_var("NF_SERVER__PORT");

        assert!(loaded.is_err());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.openrouter.base_url, "https://openrouter.ai/api/v1");
    }
}
