//! 预订处理上下文
//!
//! 封装"我正在处理第几个预订、在哪个域名下"这一信息

use std::fmt::Display;

use crate::models::ReservationCode;

/// 预订处理上下文
#[derive(Debug, Clone)]
pub struct ReservationCtx {
    pub code: ReservationCode,

    /// 目标域名，例如 `www.airbnb.com`
    pub domain: String,

    /// 在批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    pub total: usize,
}

impl ReservationCtx {
    pub fn new(
        code: ReservationCode,
        domain: impl Into<String>,
        index: usize,
        total: usize,
    ) -> Self {
        Self {
            code,
            domain: domain.into(),
            index,
            total,
        }
    }

    /// 单个下载（不属于批次）
    pub fn single(code: ReservationCode, domain: impl Into<String>) -> Self {
        Self::new(code, domain, 1, 1)
    }

    /// 预订详情页地址
    pub fn detail_url(&self) -> String {
        format!(
            "https://{}/hosting/reservations/details/{}",
            self.domain, self.code
        )
    }
}

impl Display for ReservationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[预订 {}/{} {}]", self.index, self.total, self.code)
    }
}
