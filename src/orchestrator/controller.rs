//! 命令入口
//!
//! 对外暴露 `start_single` / `start_batch` / `abort` 三个命令。
//! 每次 `start_batch` 都会换上新的取消令牌，上一次的取消请求不会影响新批次。

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::infrastructure::PageRenderer;
use crate::models::{BatchRequest, BatchSummary, ItemResult, ReservationCode};
use crate::orchestrator::batch_processor::BatchProcessor;
use crate::orchestrator::events::EventSink;
use crate::services::{CreditLedger, KeyStore, Preflight};
use crate::workflow::ReservationCtx;

/// 取消命令的应答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbortAck {
    pub success: bool,
}

/// 命令入口
pub struct Controller<R, L, K> {
    processor: BatchProcessor<R, L, K>,
    active: Mutex<CancellationToken>,
}

impl<R, L, K> Controller<R, L, K>
where
    R: PageRenderer,
    L: CreditLedger,
    K: KeyStore,
{
    pub fn new(processor: BatchProcessor<R, L, K>) -> Self {
        Self {
            processor,
            active: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn processor(&self) -> &BatchProcessor<R, L, K> {
        &self.processor
    }

    fn active_token(&self) -> MutexGuard<'_, CancellationToken> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 下载单个预订（不扣费、不重试）
    pub async fn start_single(&self, code: ReservationCode, domain: &str) -> ItemResult {
        let ctx = ReservationCtx::single(code, domain);
        match self.processor.flow().run(&ctx).await {
            Ok(item) => ItemResult::succeeded(ctx.code, item),
            Err(e) => ItemResult::failed(ctx.code, e.to_string()),
        }
    }

    /// 运行一个批次，超过上限的预订被静默截断
    pub async fn start_batch(
        &self,
        codes: Vec<ReservationCode>,
        domain: &str,
        events: &EventSink,
    ) -> BatchSummary {
        let token = CancellationToken::new();
        *self.active_token() = token.clone();

        let request = BatchRequest::new(codes, domain);
        self.processor.run(&request, &token, events).await
    }

    /// 请求取消当前批次，在下一个预订开始前生效
    pub fn abort(&self) -> AbortAck {
        info!("收到取消请求");
        self.active_token().cancel();
        AbortAck { success: true }
    }

    /// 批次开始前检查额度
    pub async fn preflight(&self, requested: usize) -> Preflight {
        self.processor.credits().preflight(requested).await
    }
}
