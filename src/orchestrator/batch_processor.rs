//! 批量预订处理器 - 编排层
//!
//! ## 职责
//!
//! 按输入顺序逐个处理预订，是整个批次的"指挥中心"。
//!
//! ## 核心流程（每个预订）
//!
//! 1. **进度通知**：发送 `downloading` 进度
//! 2. **取消检查**：只在每轮开始时检查，进行中的预订总会跑完
//! 3. **下载**：重试包装 + 单个预订流程
//! 4. **扣费**：下载成功后扣一个额度；额度用完立即停止整批，
//!    其他扣费错误只记日志，预订仍计为成功
//! 5. **间隔**：非最后一个预订时等待 2 秒（取消时提前结束等待）
//!
//! ## 设计特点
//!
//! - **严格串行**：同一时间只占用一个渲染页面
//! - **单个失败不影响整批**：只有取消和额度用完会提前结束
//! - **事件尽力发送**：通知失败从不影响批次

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::LedgerError;
use crate::infrastructure::PageRenderer;
use crate::models::{BatchOutcome, BatchRequest, BatchSummary, ItemResult};
use crate::orchestrator::events::{BatchEvent, EventSink, ProgressStatus};
use crate::services::{CreditClient, CreditLedger, KeyStore};
use crate::utils::logging;
use crate::workflow::{ReservationCtx, ReservationFlow, RetryPolicy};

/// 两个预订之间的间隔
pub const DELAY_BETWEEN_RESERVATIONS: Duration = Duration::from_millis(2000);

/// 批量预订处理器
pub struct BatchProcessor<R, L, K> {
    flow: ReservationFlow<R>,
    credits: CreditClient<L, K>,
    retry: RetryPolicy,
    item_delay: Duration,
}

impl<R, L, K> BatchProcessor<R, L, K>
where
    R: PageRenderer,
    L: CreditLedger,
    K: KeyStore,
{
    pub fn new(flow: ReservationFlow<R>, credits: CreditClient<L, K>) -> Self {
        Self {
            flow,
            credits,
            retry: RetryPolicy::default(),
            item_delay: DELAY_BETWEEN_RESERVATIONS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn flow(&self) -> &ReservationFlow<R> {
        &self.flow
    }

    pub fn credits(&self) -> &CreditClient<L, K> {
        &self.credits
    }

    /// 带重试地下载一个预订，失败被降级为 `ItemResult`
    pub async fn download_one(&self, ctx: &ReservationCtx) -> ItemResult {
        match self.retry.run(ctx, || self.flow.run(ctx)).await {
            Ok(item) => ItemResult::succeeded(ctx.code.clone(), item),
            Err(e) => {
                error!("{} ❌ 重试后仍然失败: {}", ctx, e);
                ItemResult::failed(ctx.code.clone(), e.to_string())
            }
        }
    }

    /// 运行一个批次
    ///
    /// 从不返回错误：单个预订的失败记录在汇总里，
    /// 取消和额度用完体现在 [`BatchSummary::outcome`]。
    pub async fn run(
        &self,
        request: &BatchRequest,
        cancel: &CancellationToken,
        events: &EventSink,
    ) -> BatchSummary {
        let total = request.len();
        let mut results: Vec<ItemResult> = Vec::with_capacity(total);
        let mut outcome = BatchOutcome::Completed;

        logging::log_batch_start(total, request.domain());

        for (i, code) in request.codes().iter().enumerate() {
            let ctx = ReservationCtx::new(code.clone(), request.domain(), i + 1, total);

            events.emit(BatchEvent::progress(
                i + 1,
                total,
                code,
                ProgressStatus::Downloading,
            ));

            if cancel.is_cancelled() {
                info!("⏹ 批次在第 {}/{} 个预订处取消", i + 1, total);
                events.emit(BatchEvent::progress(i, total, code, ProgressStatus::Cancelled));
                outcome = BatchOutcome::Cancelled;
                break;
            }

            let result = self.download_one(&ctx).await;

            // 只有下载成功才扣费
            if result.success {
                match self.credits.consume(code).await {
                    Ok(remaining) => {
                        info!("{} 💳 剩余额度: {}", ctx, remaining);
                        events.emit(BatchEvent::CreditUpdate { remaining });
                    }
                    Err(LedgerError::NoCredits) => {
                        // 文件已经下载，本预订仍计为成功
                        results.push(result);
                        let message =
                            format!("Out of credits after {} of {} reservations", i + 1, total);
                        warn!("{} ⚠️ 额度已用完，停止批次: {}", ctx, message);

                        let summary = BatchSummary::from_results(
                            results,
                            BatchOutcome::OutOfCredits,
                            Some(message),
                        );
                        events.emit(BatchEvent::complete(total, &summary));
                        logging::log_batch_complete(&summary);
                        return summary;
                    }
                    Err(e) => {
                        warn!("{} ⚠️ 扣除额度失败，仍计为成功: {}", ctx, e);
                    }
                }
            }

            results.push(result);

            if i + 1 < total && !cancel.is_cancelled() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("{} 等待期间收到取消请求", ctx);
                    }
                    _ = sleep(self.item_delay) => {}
                }
            }
        }

        let summary = BatchSummary::from_results(results, outcome, None);
        events.emit(BatchEvent::complete(summary.total, &summary));
        logging::log_batch_complete(&summary);
        summary
    }
}
