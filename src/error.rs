use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 页面渲染错误
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
    /// 额度账本错误
    #[error("额度错误: {0}")]
    Ledger(#[from] LedgerError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
}

/// 页面渲染错误
///
/// 单个预订处理流程中每一步都有独立的失败域，
/// 这里的变体与之一一对应。
#[derive(Debug, Error)]
pub enum RenderError {
    /// 页面加载超时
    #[error("页面加载超时 ({}ms): {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },
    /// 创建页面失败
    #[error("创建页面失败 ({url}): {message}")]
    PageCreation { url: String, message: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },
    /// PDF 捕获失败
    #[error("PDF 捕获失败: {0}")]
    Capture(String),
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),
    /// 关闭页面失败
    #[error("关闭页面失败: {0}")]
    Close(String),
}

/// 单个预订处理失败
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Render(#[from] RenderError),
    /// 写入 PDF 失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 额度账本错误
///
/// 注意 `NoCredits` 会让整个批次停止，其余变体只记录日志。
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 本地没有保存许可证密钥
    #[error("未激活许可证")]
    NoLicense,
    /// 额度已用完
    #[error("额度已用完")]
    NoCredits,
    /// 密钥不存在
    #[error("许可证密钥无效")]
    InvalidKey,
    /// 服务端 5xx
    #[error("额度服务异常 (HTTP {status})")]
    ServerError { status: u16 },
    /// 服务端返回的其他结构化错误
    #[error("额度服务返回错误: {0}")]
    Other(String),
    /// 网络请求失败
    #[error("额度服务请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    /// 本地密钥存储读写失败
    #[error("密钥存储错误: {0}")]
    Store(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 预订代码格式错误
    #[error("预订代码格式错误: {0}")]
    InvalidReservationCode(String),
    /// 许可证密钥格式错误
    #[error("许可证密钥格式错误 (GBNB-XXXX-XXXX-XXXX): {0}")]
    InvalidLicenseKey(String),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        RenderError::Script(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Script(format!("无法解析脚本返回值: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(port: u16, source: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed { port, source })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }
}

impl ItemError {
    /// 创建写入错误
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ItemError::Persist {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 渲染操作结果类型
pub type RenderResult<T> = Result<T, RenderError>;

/// 额度操作结果类型
pub type LedgerResult<T> = Result<T, LedgerError>;
