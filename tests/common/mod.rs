//! 测试用的假渲染器和装配辅助函数
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bnb_invoice_batch::error::{RenderError, RenderResult};
use bnb_invoice_batch::infrastructure::{PageRenderer, PendingLoad};
use bnb_invoice_batch::orchestrator::{BatchEvent, BatchProcessor, Controller};
use bnb_invoice_batch::services::{
    CreditClient, DocumentWriter, InMemoryLedger, InvoiceDiscovery, MemoryKeyStore,
};
use bnb_invoice_batch::workflow::ReservationFlow;
use bnb_invoice_batch::ReservationCode;
use tokio::sync::mpsc;

pub const DOMAIN: &str = "www.airbnb.com";
pub const KEY: &str = "GBNB-TEST-TEST-TEST";

/// 脚本化加载失败时的错误信息
pub const LOAD_FAILURE: &str = "net::ERR_CONNECTION_RESET";
/// 脚本化捕获失败时的错误信息
pub const CAPTURE_FAILURE: &str = "Printing failed";

pub type TestProcessor = BatchProcessor<FakeRenderer, InMemoryLedger, MemoryKeyStore>;
pub type TestController = Controller<FakeRenderer, InMemoryLedger, MemoryKeyStore>;

pub fn detail_url(code: &str) -> String {
    format!("https://{}/hosting/reservations/details/{}", DOMAIN, code)
}

pub fn invoice_url(code: &str, n: usize) -> String {
    format!("https://{}/invoice/{}/{}", DOMAIN, code, n)
}

/// 计数器为正时减一并返回 true
fn take_failure(counters: &mut HashMap<String, u32>, url: &str) -> bool {
    match counters.get_mut(url) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

#[derive(Default)]
struct FakeState {
    next_page: u64,
    /// 页面 → 当前地址
    pages: HashMap<u64, String>,
    /// 页面 → 尚未等待的加载
    pending: HashMap<u64, PendingLoad>,
    /// 详情页地址 → 页面上的发票链接
    links: HashMap<String, Vec<String>>,
    /// 地址 → 还要失败几次
    load_failures: HashMap<String, u32>,
    navigate_failures: HashMap<String, u32>,
    capture_failures: HashMap<String, u32>,
    close_failures: u32,
    /// 地址 → 加载耗时
    load_delays: HashMap<String, Duration>,
    opened: Vec<String>,
    navigated: Vec<String>,
    captured: Vec<String>,
    detached: usize,
    closed: usize,
}

impl FakeState {
    fn begin_load(&mut self, page: u64, url: &str) {
        let delay = self.load_delays.get(url).copied();
        let fails = take_failure(&mut self.load_failures, url);
        let load = PendingLoad::spawn(url, async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fails {
                Err(LOAD_FAILURE)
            } else {
                Ok(())
            }
        });
        self.pages.insert(page, url.to_string());
        self.pending.insert(page, load);
    }
}

/// 按脚本工作的渲染器，记录所有调用
#[derive(Default)]
pub struct FakeRenderer {
    state: Mutex<FakeState>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// 给某个预订配置 `count` 张发票
    pub fn with_invoices(self, code: &str, count: usize) -> Self {
        let links = (1..=count).map(|n| invoice_url(code, n)).collect();
        self.with_links(code, links)
    }

    /// 原样指定详情页上的发票链接（可重复）
    pub fn with_links(self, code: &str, links: Vec<String>) -> Self {
        self.script(|s| {
            s.links.insert(detail_url(code), links);
        })
    }

    /// 让某个预订的详情页前 `times` 次加载失败
    pub fn failing_loads(self, code: &str, times: u32) -> Self {
        self.failing_url_loads(&detail_url(code), times)
    }

    pub fn failing_url_loads(self, url: &str, times: u32) -> Self {
        self.script(|s| {
            s.load_failures.insert(url.to_string(), times);
        })
    }

    /// 让某个地址每次加载都耗时 `delay`
    pub fn slow_load(self, url: &str, delay: Duration) -> Self {
        self.script(|s| {
            s.load_delays.insert(url.to_string(), delay);
        })
    }

    pub fn failing_navigations(self, url: &str, times: u32) -> Self {
        self.script(|s| {
            s.navigate_failures.insert(url.to_string(), times);
        })
    }

    pub fn failing_captures(self, url: &str, times: u32) -> Self {
        self.script(|s| {
            s.capture_failures.insert(url.to_string(), times);
        })
    }

    /// 前 `times` 次关闭页面失败（页面保持打开）
    pub fn failing_closes(self, times: u32) -> Self {
        self.script(|s| s.close_failures = times)
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn navigated(&self) -> Vec<String> {
        self.state.lock().unwrap().navigated.clone()
    }

    /// 每次捕获时页面所在的地址
    pub fn captured(&self) -> Vec<String> {
        self.state.lock().unwrap().captured.clone()
    }

    pub fn captures(&self) -> usize {
        self.state.lock().unwrap().captured.len()
    }

    pub fn detached(&self) -> usize {
        self.state.lock().unwrap().detached
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn open_pages(&self) -> usize {
        self.state.lock().unwrap().pages.len()
    }

    fn url_of(&self, page: u64) -> RenderResult<String> {
        self.state
            .lock()
            .unwrap()
            .pages
            .get(&page)
            .cloned()
            .ok_or_else(|| RenderError::Close(format!("页面 {} 已关闭", page)))
    }
}

impl PageRenderer for FakeRenderer {
    type Handle = u64;

    async fn open(&self, url: &str) -> RenderResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.next_page += 1;
        let page = state.next_page;
        state.opened.push(url.to_string());
        state.begin_load(page, url);
        Ok(page)
    }

    async fn navigate(&self, handle: &u64, url: &str) -> RenderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.navigated.push(url.to_string());
        if take_failure(&mut state.navigate_failures, url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: "导航被拒绝".to_string(),
            });
        }
        state.begin_load(*handle, url);
        Ok(())
    }

    async fn wait_for_load(&self, handle: &u64, timeout: Duration) -> RenderResult<()> {
        let pending = self.state.lock().unwrap().pending.remove(handle);
        match pending {
            Some(load) => load.wait(timeout).await,
            None => Ok(()),
        }
    }

    async fn capture(&self, handle: &u64) -> RenderResult<Vec<u8>> {
        let url = self.url_of(*handle)?;
        let mut state = self.state.lock().unwrap();
        state.captured.push(url.clone());
        if take_failure(&mut state.capture_failures, &url) {
            return Err(RenderError::Capture(CAPTURE_FAILURE.to_string()));
        }
        Ok(format!("%PDF-1.4 {}", url).into_bytes())
    }

    async fn anchor_hrefs(&self, handle: &u64, _selector: &str) -> RenderResult<Vec<String>> {
        let url = self.url_of(*handle)?;
        let state = self.state.lock().unwrap();
        Ok(state.links.get(&url).cloned().unwrap_or_default())
    }

    async fn detach(&self, _handle: &u64) -> RenderResult<()> {
        self.state.lock().unwrap().detached += 1;
        Ok(())
    }

    async fn close(&self, handle: &u64) -> RenderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.closed += 1;
        if state.close_failures > 0 {
            state.close_failures -= 1;
            return Err(RenderError::Close("目标已失去响应".to_string()));
        }
        if let Some(load) = state.pending.remove(handle) {
            load.abort();
        }
        state
            .pages
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| RenderError::Close(format!("页面 {} 已关闭", handle)))
    }
}

pub fn codes(raw: &[&str]) -> Vec<ReservationCode> {
    raw.iter().map(|c| ReservationCode::new(*c)).collect()
}

/// 装配一个批量处理器：账户里有 `credits` 个额度
pub async fn processor(
    renderer: Arc<FakeRenderer>,
    output_dir: &Path,
    credits: u32,
) -> TestProcessor {
    let ledger = InMemoryLedger::new();
    ledger.open_account(KEY, credits).await;
    processor_with(renderer, output_dir, ledger, MemoryKeyStore::with_key(KEY))
}

pub fn processor_with(
    renderer: Arc<FakeRenderer>,
    output_dir: &Path,
    ledger: InMemoryLedger,
    keys: MemoryKeyStore,
) -> TestProcessor {
    BatchProcessor::new(flow(renderer, output_dir), CreditClient::new(ledger, keys))
}

pub fn flow(renderer: Arc<FakeRenderer>, output_dir: &Path) -> ReservationFlow<FakeRenderer> {
    ReservationFlow::new(
        renderer,
        InvoiceDiscovery::new(),
        DocumentWriter::new(output_dir),
    )
}

/// 取出通道里已有的全部事件
pub fn drain(rx: &mut mpsc::Receiver<BatchEvent>) -> Vec<BatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
