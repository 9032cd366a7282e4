//! 许可证密钥存储
//!
//! 只有 get / set / clear 三个操作

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LedgerError, LedgerResult};

/// 许可证密钥前缀
pub const LICENSE_KEY_PREFIX: &str = "GBNB-";

/// 校验并规范化许可证密钥
pub fn normalize_license_key(raw: &str) -> Result<String, ConfigError> {
    let key = raw.trim().to_uppercase();
    if key.starts_with(LICENSE_KEY_PREFIX) {
        Ok(key)
    } else {
        Err(ConfigError::InvalidLicenseKey(raw.to_string()))
    }
}

/// 许可证密钥存储
pub trait KeyStore: Send + Sync {
    fn get(&self) -> LedgerResult<Option<String>>;
    fn set(&self, key: &str) -> LedgerResult<()>;
    fn clear(&self) -> LedgerResult<()>;
}

/// 内存存储（测试与一次性运行）
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    key: RwLock<Option<String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: RwLock::new(Some(key.into())),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self) -> LedgerResult<Option<String>> {
        let guard = self
            .key
            .read()
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        Ok(guard.clone())
    }

    fn set(&self, key: &str) -> LedgerResult<()> {
        let mut guard = self
            .key
            .write()
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        *guard = Some(key.to_string());
        Ok(())
    }

    fn clear(&self) -> LedgerResult<()> {
        let mut guard = self
            .key
            .write()
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LicenseFile {
    #[serde(rename = "licenseKey")]
    license_key: String,
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self) -> LedgerResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| LedgerError::Store(format!("{}: {}", self.path.display(), e)))?;
        let file: LicenseFile = serde_json::from_str(&content)
            .map_err(|e| LedgerError::Store(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(file.license_key))
    }

    fn set(&self, key: &str) -> LedgerResult<()> {
        let content = serde_json::to_string_pretty(&LicenseFile {
            license_key: key.to_string(),
        })
        .map_err(|e| LedgerError::Store(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| LedgerError::Store(format!("{}: {}", self.path.display(), e)))
    }

    fn clear(&self) -> LedgerResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| LedgerError::Store(format!("{}: {}", self.path.display(), e)))?;
        }
        Ok(())
    }
}
