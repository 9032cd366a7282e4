//! 额度账户模型（归账本所有）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 新账户默认赠送的额度
pub const FREE_CREDITS: u32 = 15;

/// 额度余额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub remaining: u32,
    pub total: u32,
}

/// 一次扣费的审计记录，只追加不修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub reservation_code: Option<String>,
    pub balance_after: u32,
    pub used_at: DateTime<Utc>,
}

/// 额度账户
#[derive(Debug, Clone)]
pub struct CreditAccount {
    pub key: String,
    pub credits_remaining: u32,
    pub credits_total: u32,
    pub last_used_at: Option<DateTime<Utc>>,
    pub usage: Vec<UsageRecord>,
}

impl CreditAccount {
    pub fn new(key: impl Into<String>, credits: u32) -> Self {
        Self {
            key: key.into(),
            credits_remaining: credits,
            credits_total: credits,
            last_used_at: None,
            usage: Vec::new(),
        }
    }

    pub fn balance(&self) -> CreditBalance {
        CreditBalance {
            remaining: self.credits_remaining,
            total: self.credits_total,
        }
    }
}
