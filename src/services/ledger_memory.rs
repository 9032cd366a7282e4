//! 进程内额度账本
//!
//! 实现服务端扣费事务：读余额、判断、扣减、写审计记录在同一把锁内完成，
//! 并发扣费不会看到也不会产生负余额。

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{CreditAccount, CreditBalance, UsageRecord, FREE_CREDITS};
use crate::services::credit_ledger::CreditLedger;

/// 进程内账本
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<String, CreditAccount>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开户，已存在的密钥会被重置
    pub async fn open_account(&self, key: impl Into<String>, credits: u32) {
        let key = key.into();
        let mut accounts = self.accounts.lock().await;
        accounts.insert(key.clone(), CreditAccount::new(key, credits));
    }

    /// 以默认赠送额度开户
    pub async fn open_free_account(&self, key: impl Into<String>) {
        self.open_account(key, FREE_CREDITS).await;
    }

    /// 账户快照
    pub async fn account(&self, key: &str) -> Option<CreditAccount> {
        self.accounts.lock().await.get(key).cloned()
    }

    /// 审计记录
    pub async fn usage(&self, key: &str) -> Vec<UsageRecord> {
        self.accounts
            .lock()
            .await
            .get(key)
            .map(|a| a.usage.clone())
            .unwrap_or_default()
    }
}

impl CreditLedger for InMemoryLedger {
    async fn consume(&self, key: &str, reservation_code: Option<&str>) -> LedgerResult<u32> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.get_mut(key).ok_or(LedgerError::InvalidKey)?;

        if account.credits_remaining == 0 {
            return Err(LedgerError::NoCredits);
        }

        let now = Utc::now();
        account.credits_remaining -= 1;
        account.last_used_at = Some(now);
        account.usage.push(UsageRecord {
            reservation_code: reservation_code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            balance_after: account.credits_remaining,
            used_at: now,
        });

        debug!("账户 {} 剩余额度 {}", key, account.credits_remaining);
        Ok(account.credits_remaining)
    }

    async fn check(&self, key: &str) -> LedgerResult<CreditBalance> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(key)
            .map(CreditAccount::balance)
            .ok_or(LedgerError::InvalidKey)
    }
}
