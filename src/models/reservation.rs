//! 预订相关的数据模型
//!
//! 单个预订 → `ItemResult`，整个批次 → `BatchSummary`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 单批最多处理的预订数量，超出部分直接截断
pub const MAX_BATCH_SIZE: usize = 25;

/// 预订列表页上的确认码格式
#[allow(clippy::expect_used)]
static RESERVATION_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HM[A-Z0-9]{6,}$").expect("确认码正则无效"));

/// 预订确认码
///
/// 批处理核心把它当作不透明字符串；格式校验只发生在入口处（CLI）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationCode(String);

impl ReservationCode {
    /// 不做校验，直接包装
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// 按确认码格式校验后创建
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let code = raw.trim().to_uppercase();
        if RESERVATION_CODE_PATTERN.is_match(&code) {
            Ok(Self(code))
        } else {
            Err(ConfigError::InvalidReservationCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 预订收据文件名
    pub fn receipt_filename(&self) -> String {
        format!("Reservation_{}.pdf", self.0)
    }

    /// 增值税发票文件名
    ///
    /// 只有一张发票时不带序号，多张时使用从 1 开始的序号。
    pub fn invoice_filename(&self, index: usize, count: usize) -> String {
        if count > 1 {
            format!("VAT_Invoice_{}_{}.pdf", self.0, index + 1)
        } else {
            format!("VAT_Invoice_{}.pdf", self.0)
        }
    }
}

impl fmt::Display for ReservationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReservationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// 批量下载请求
#[derive(Debug, Clone)]
pub struct BatchRequest {
    codes: Vec<ReservationCode>,
    domain: String,
}

impl BatchRequest {
    /// 创建请求，超过 [`MAX_BATCH_SIZE`] 的部分被静默截断
    pub fn new(mut codes: Vec<ReservationCode>, domain: impl Into<String>) -> Self {
        codes.truncate(MAX_BATCH_SIZE);
        Self {
            codes,
            domain: domain.into(),
        }
    }

    pub fn codes(&self) -> &[ReservationCode] {
        &self.codes
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// 单个预订下载成功后的文件集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedItem {
    /// 收据在前，发票按页面顺序排列
    pub files: Vec<String>,
    pub invoice_count: usize,
}

/// 单个预订的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub code: ReservationCode,
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    pub invoice_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemResult {
    pub fn succeeded(code: ReservationCode, item: DownloadedItem) -> Self {
        Self {
            code,
            success: true,
            files: item.files,
            invoice_count: item.invoice_count,
            error: None,
        }
    }

    pub fn failed(code: ReservationCode, error: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            files: Vec::new(),
            invoice_count: 0,
            error: Some(error.into()),
        }
    }

    /// 汇总中使用的错误描述: `code: reason`
    pub fn error_line(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|reason| format!("{}: {}", self.code, reason))
    }
}

/// 批次的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchOutcome {
    /// 所有预订都已尝试
    Completed,
    /// 用户取消
    Cancelled,
    /// 额度用完，提前停止
    OutOfCredits,
}

/// 批次汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub outcome: BatchOutcome,
    pub results: Vec<ItemResult>,
}

impl BatchSummary {
    /// 根据已累计的结果计算汇总
    pub fn from_results(
        results: Vec<ItemResult>,
        outcome: BatchOutcome,
        stop_reason: Option<String>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let errors: Vec<String> = results.iter().filter_map(ItemResult::error_line).collect();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            errors,
            stop_reason,
            outcome,
            results,
        }
    }
}
