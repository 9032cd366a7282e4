//! 页面加载跟踪 - 基础设施层
//!
//! `open` / `navigate` 只发起加载，返回一个 [`PendingLoad`]；
//! `wait_for_load` 在超时限制内等待它完成。
//! 加载在后台任务里进行，超时后任务被中止，页面交给调用方清理。

use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// 已发起、尚未等待的一次页面加载
#[derive(Debug)]
pub struct PendingLoad {
    url: String,
    task: JoinHandle<Result<(), String>>,
}

impl PendingLoad {
    /// 在后台开始加载 `url`
    pub fn spawn<F, E>(url: impl Into<String>, load: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        Self {
            url: url.into(),
            task: tokio::spawn(async move { load.await.map_err(|e| e.to_string()) }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 放弃这次加载
    pub fn abort(self) {
        self.task.abort();
    }

    /// 等待加载完成，超过 `timeout` 返回 [`RenderError::Timeout`]
    pub async fn wait(self, timeout: Duration) -> RenderResult<()> {
        let PendingLoad { url, mut task } = self;
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(message))) => Err(RenderError::Navigation { url, message }),
            Ok(Err(join_error)) => Err(RenderError::Navigation {
                url,
                message: join_error.to_string(),
            }),
            Err(_) => {
                task.abort();
                debug!("页面加载超时，已中止: {}", url);
                Err(RenderError::Timeout { url, timeout })
            }
        }
    }
}

/// 每个页面最多一个进行中的加载
#[derive(Debug, Default)]
pub struct LoadSlot {
    pending: Mutex<Option<PendingLoad>>,
}

impl LoadSlot {
    /// 记录新的加载，之前未等待的加载被中止
    pub fn begin(&self, load: PendingLoad) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.replace(load) {
            previous.abort();
        }
    }

    pub fn take(&self) -> Option<PendingLoad> {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }
}
