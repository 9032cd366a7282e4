//! 文档写入服务 - 业务能力层
//!
//! 只负责"把 PDF 写到输出目录"能力，不关心流程

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::ItemError;

/// 文档写入服务
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    output_dir: PathBuf,
}

impl DocumentWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 写入 PDF，已存在的同名文件会被覆盖
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ItemError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ItemError::persist(&self.output_dir, e))?;

        let path = self.output_dir.join(filename);
        fs::write(&path, bytes)
            .await
            .map_err(|e| ItemError::persist(&path, e))?;

        debug!("已写入 {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DocumentWriter::new(dir.path().join("nested"));

        let path = writer
            .save("Reservation_HM123ABCDE.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4");
    }
}
