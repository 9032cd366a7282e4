//! 重试包装
//!
//! 失败后固定等待一段时间，从头重新执行整个操作（不做断点续传）

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// 单个预订的额外重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// 两次尝试之间的等待时间
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败后还能再试几次
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// 执行 `op`，失败时按策略重试，返回最后一次的结果
    ///
    /// `label` 只用于日志。
    pub async fn run<T, E, F, Fut>(&self, label: impl Display, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} 第 {} 次重试 ({}ms 后): {}",
                        label,
                        attempt,
                        self.delay.as_millis(),
                        e
                    );
                    sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
