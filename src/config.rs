use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, AppResult, FileError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（否则连接到已运行的浏览器）
    pub headless: bool,
    /// 无头模式下使用的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 默认的目标域名
    pub domain: String,
    /// PDF 输出目录
    pub output_dir: String,
    /// 许可证密钥文件
    pub license_file: String,
    // --- 额度服务配置 ---
    pub ledger_base_url: String,
    /// 额度服务请求超时（秒）
    pub ledger_timeout_secs: u64,
    /// 事件通道容量
    pub event_channel_capacity: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            domain: "www.airbnb.com".to_string(),
            output_dir: "downloads".to_string(),
            license_file: "license.json".to_string(),
            ledger_base_url: "https://europe-west1-getbnbinvoice.cloudfunctions.net".to_string(),
            ledger_timeout_secs: 30,
            event_channel_capacity: 64,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，环境变量优先
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            domain: std::env::var("TARGET_DOMAIN").unwrap_or(self.domain),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            license_file: std::env::var("LICENSE_FILE").unwrap_or(self.license_file),
            ledger_base_url: std::env::var("LEDGER_BASE_URL").unwrap_or(self.ledger_base_url),
            ledger_timeout_secs: env_parse("LEDGER_TIMEOUT_SECS")
                .unwrap_or(self.ledger_timeout_secs),
            event_channel_capacity: env_parse("EVENT_CHANNEL_CAPACITY")
                .unwrap_or(self.event_channel_capacity),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }
}

/// 读取并解析环境变量，缺失或无法解析时返回 `None`
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
