//! 额度服务 - 业务能力层
//!
//! 每成功下载一个预订扣除一个额度。
//!
//! - [`CreditLedger`]：账本契约，远程 HTTP 与进程内实现都遵守它
//! - [`CreditClient`]：读取本地密钥后调用账本
//!
//! 扣费请求不带幂等键，重复发送会重复扣费，所以这里从不自动重试。

use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{CreditBalance, ReservationCode};
use crate::services::key_store::KeyStore;

/// 额度账本
pub trait CreditLedger: Send + Sync {
    /// 扣除一个额度并返回剩余额度
    ///
    /// 余额为 0 时返回 [`LedgerError::NoCredits`] 且不做任何修改。
    fn consume(
        &self,
        key: &str,
        reservation_code: Option<&str>,
    ) -> impl Future<Output = LedgerResult<u32>> + Send;

    /// 查询余额
    fn check(&self, key: &str) -> impl Future<Output = LedgerResult<CreditBalance>> + Send;
}

/// 批次开始前的额度检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    /// 额度足够
    Ready { remaining: u32 },
    /// 额度不足，不应开始
    Insufficient { remaining: u32, requested: usize },
    /// 检查本身失败，按原计划继续，扣费时再处理
    Unchecked,
}

/// 额度客户端
pub struct CreditClient<L, K> {
    ledger: L,
    keys: K,
}

impl<L: CreditLedger, K: KeyStore> CreditClient<L, K> {
    pub fn new(ledger: L, keys: K) -> Self {
        Self { ledger, keys }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    fn license_key(&self) -> LedgerResult<String> {
        self.keys.get()?.ok_or(LedgerError::NoLicense)
    }

    /// 为一个预订扣除额度
    ///
    /// 没有保存密钥时直接返回 [`LedgerError::NoLicense`]，不发起网络请求。
    pub async fn consume(&self, code: &ReservationCode) -> LedgerResult<u32> {
        let key = self.license_key()?;
        debug!("扣除额度: {}", code);
        self.ledger.consume(&key, Some(code.as_str())).await
    }

    /// 查询当前密钥的余额
    pub async fn balance(&self) -> LedgerResult<CreditBalance> {
        let key = self.license_key()?;
        self.ledger.check(&key).await
    }

    /// 激活密钥：先确认账本认识它，再保存到本地
    pub async fn activate(&self, key: &str) -> LedgerResult<CreditBalance> {
        let balance = self.ledger.check(key).await?;
        self.keys.set(key)?;
        info!("✓ 许可证已激活，剩余额度 {}/{}", balance.remaining, balance.total);
        Ok(balance)
    }

    /// 批次开始前检查额度是否覆盖整批
    pub async fn preflight(&self, requested: usize) -> Preflight {
        match self.balance().await {
            Ok(balance) if balance.remaining == 0 || (balance.remaining as usize) < requested => {
                Preflight::Insufficient {
                    remaining: balance.remaining,
                    requested,
                }
            }
            Ok(balance) => Preflight::Ready {
                remaining: balance.remaining,
            },
            Err(e) => {
                warn!("额度检查失败，继续执行: {}", e);
                Preflight::Unchecked
            }
        }
    }
}
