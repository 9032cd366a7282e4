//! 批次事件
//!
//! 进度、额度变化、批次完成三类通知。发送是尽力而为的：
//! 没有监听方、通道已满、监听方已断开都不会影响批次本身，
//! 但 [`Delivery`] 会区分这几种情况，方便排查。

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::models::{BatchSummary, ReservationCode};

/// 进度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Cancelled,
}

/// 批次事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchEvent {
    Progress {
        current: usize,
        total: usize,
        code: ReservationCode,
        status: ProgressStatus,
    },
    CreditUpdate {
        remaining: u32,
    },
    BatchComplete {
        total: usize,
        succeeded: usize,
        failed: usize,
        errors: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl BatchEvent {
    pub fn progress(
        current: usize,
        total: usize,
        code: &ReservationCode,
        status: ProgressStatus,
    ) -> Self {
        BatchEvent::Progress {
            current,
            total,
            code: code.clone(),
            status,
        }
    }

    /// 由汇总生成完成事件，`total` 由调用方决定
    pub fn complete(total: usize, summary: &BatchSummary) -> Self {
        BatchEvent::BatchComplete {
            total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            errors: summary.errors.clone(),
            error: summary.stop_reason.clone(),
        }
    }
}

/// 一次发送的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// 没有挂接监听方
    NoListener,
    /// 通道已满，事件被丢弃
    Dropped,
    /// 监听方已断开
    Closed,
}

/// 事件出口
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<BatchEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<BatchEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// 不接收任何事件
    pub fn detached() -> Self {
        Self::default()
    }

    /// 创建有界通道
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BatchEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// 发送事件，从不失败
    pub fn emit(&self, event: BatchEvent) -> Delivery {
        let Some(tx) = &self.tx else {
            return Delivery::NoListener;
        };

        match tx.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(event)) => {
                warn!("事件通道已满，丢弃事件: {:?}", event);
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!("事件监听方已断开");
                Delivery::Closed
            }
        }
    }
}
