//! 页面渲染适配器 - 基础设施层
//!
//! 批处理核心只依赖 [`PageRenderer`] 这个契约：
//! 打开页面、导航、等待加载、捕获 PDF、查询链接、关闭。
//! 打开和导航只发起加载，页面加载的超时完全由 `wait_for_load` 负责。
//! [`ChromiumRenderer`] 是基于 chromiumoxide 的生产实现。

use std::future::Future;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::{NavigateParams, PrintToPdfParams};
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::infrastructure::page_load::{LoadSlot, PendingLoad};
use crate::infrastructure::JsExecutor;

/// PDF 页边距（英寸）
const PDF_MARGIN_INCHES: f64 = 0.4;

/// 新建页面时的初始地址
const BLANK_PAGE: &str = "about:blank";

/// 页面渲染能力
///
/// 所有方法都以同一个 `Handle` 为操作对象，
/// 一个 handle 在同一时刻只被一个预订使用。
pub trait PageRenderer: Send + Sync {
    type Handle: Send + Sync;

    /// 在后台打开一个新页面并开始加载 `url`
    ///
    /// 不等待加载完成，加载时间由随后的 [`wait_for_load`](Self::wait_for_load) 限制。
    fn open(&self, url: &str) -> impl Future<Output = RenderResult<Self::Handle>> + Send;

    /// 让已有页面开始导航到新地址
    fn navigate(
        &self,
        handle: &Self::Handle,
        url: &str,
    ) -> impl Future<Output = RenderResult<()>> + Send;

    /// 等待页面加载完成，超过 `timeout` 返回 [`RenderError::Timeout`]
    fn wait_for_load(
        &self,
        handle: &Self::Handle,
        timeout: Duration,
    ) -> impl Future<Output = RenderResult<()>> + Send;

    /// 把当前页面打印成 PDF
    ///
    /// 每次调用内部独占一个捕获会话：获取、打印、释放。
    fn capture(&self, handle: &Self::Handle) -> impl Future<Output = RenderResult<Vec<u8>>> + Send;

    /// 按 CSS 选择器读取 `<a>` 的绝对 href，保持 DOM 顺序
    fn anchor_hrefs(
        &self,
        handle: &Self::Handle,
        selector: &str,
    ) -> impl Future<Output = RenderResult<Vec<String>>> + Send;

    /// 释放可能残留的捕获会话
    ///
    /// 默认什么都不做：捕获会话在 [`capture`](Self::capture) 返回前就已释放。
    /// 只有跨调用持有调试会话的实现才需要覆盖它。
    fn detach(&self, _handle: &Self::Handle) -> impl Future<Output = RenderResult<()>> + Send {
        async { Ok(()) }
    }

    /// 关闭页面
    fn close(&self, handle: &Self::Handle) -> impl Future<Output = RenderResult<()>> + Send;
}

/// [`ChromiumRenderer`] 打开的页面，连同它正在进行的加载
pub struct ChromiumPage {
    page: Page,
    load: LoadSlot,
}

impl ChromiumPage {
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 在后台发起导航
    ///
    /// chromiumoxide 的导航命令要等到页面加载完成才返回，
    /// 所以放进 [`PendingLoad`] 里，由 `wait_for_load` 计时。
    fn begin_load(&self, url: &str) {
        let page = self.page.clone();
        let target = url.to_string();
        self.load.begin(PendingLoad::spawn(url, async move {
            page.execute(NavigateParams::new(target)).await.map(|_| ())
        }));
    }
}

/// 基于 chromiumoxide 的渲染器
///
/// 持有 Browser；所有页面共用一把捕获锁，保证同一时间只有一个打印会话。
pub struct ChromiumRenderer {
    browser: Browser,
    capture_session: Mutex<()>,
}

impl ChromiumRenderer {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            capture_session: Mutex::new(()),
        }
    }

    fn pdf_params() -> PrintToPdfParams {
        PrintToPdfParams {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            margin_top: Some(PDF_MARGIN_INCHES),
            margin_bottom: Some(PDF_MARGIN_INCHES),
            margin_left: Some(PDF_MARGIN_INCHES),
            margin_right: Some(PDF_MARGIN_INCHES),
            ..Default::default()
        }
    }
}

impl PageRenderer for ChromiumRenderer {
    type Handle = ChromiumPage;

    async fn open(&self, url: &str) -> RenderResult<ChromiumPage> {
        debug!("创建后台页面: {}", url);
        let page_creation = |message: String| RenderError::PageCreation {
            url: url.to_string(),
            message,
        };

        // 空白页立即加载完成，真正的目标页交给 wait_for_load 计时
        let params = CreateTargetParams::builder()
            .url(BLANK_PAGE)
            .background(true)
            .build()
            .map_err(page_creation)?;
        let page = self
            .browser
            .new_page(params)
            .await
            .map_err(|e| page_creation(e.to_string()))?;

        let handle = ChromiumPage {
            page,
            load: LoadSlot::default(),
        };
        handle.begin_load(url);
        Ok(handle)
    }

    async fn navigate(&self, handle: &ChromiumPage, url: &str) -> RenderResult<()> {
        debug!("页面导航到: {}", url);
        handle.begin_load(url);
        Ok(())
    }

    async fn wait_for_load(&self, handle: &ChromiumPage, timeout: Duration) -> RenderResult<()> {
        if let Some(pending) = handle.load.take() {
            return pending.wait(timeout).await;
        }

        let url = handle.page.url().await.ok().flatten().unwrap_or_default();
        match tokio::time::timeout(timeout, handle.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url,
                message: e.to_string(),
            }),
            Err(_) => Err(RenderError::Timeout { url, timeout }),
        }
    }

    async fn capture(&self, handle: &ChromiumPage) -> RenderResult<Vec<u8>> {
        let _session = self.capture_session.lock().await;
        let bytes = handle
            .page
            .pdf(Self::pdf_params())
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))?;
        debug!("PDF 捕获完成: {} 字节", bytes.len());
        Ok(bytes)
    }

    async fn anchor_hrefs(
        &self,
        handle: &ChromiumPage,
        selector: &str,
    ) -> RenderResult<Vec<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const links = document.querySelectorAll({});
                return Array.from(links).map(a => a.href);
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        JsExecutor::new(&handle.page).eval_as(js_code).await
    }

    async fn close(&self, handle: &ChromiumPage) -> RenderResult<()> {
        if let Some(pending) = handle.load.take() {
            pending.abort();
        }
        handle
            .page
            .clone()
            .close()
            .await
            .map_err(|e| RenderError::Close(e.to_string()))
    }
}
