//! 预订处理流程 - 流程层
//!
//! 核心职责：定义"一个预订"的完整下载流程
//!
//! 流程顺序：
//! 1. 后台打开详情页 → 等待加载 → 稳定等待 → 打印收据
//! 2. 查找发票链接
//! 3. 逐个导航到发票 → 等待加载 → 稳定等待 → 打印发票
//! 4. 关闭页面
//!
//! 任何一步失败都会尽力清理页面，然后原样返回错误。
//! 流程内部不重试，重试由上层从第 1 步重新开始。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::ItemError;
use crate::infrastructure::PageRenderer;
use crate::models::DownloadedItem;
use crate::services::{DocumentWriter, InvoiceDiscovery};
use crate::workflow::reservation_ctx::ReservationCtx;

/// 页面加载超时
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// 详情页加载后等待前端渲染的时间
pub const RECEIPT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// 发票页加载后的等待时间
pub const INVOICE_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// 预订处理流程
///
/// - 编排单个预订的打开、捕获、保存
/// - 只持有渲染能力，不关心批次、额度和取消
pub struct ReservationFlow<R> {
    renderer: Arc<R>,
    discovery: InvoiceDiscovery,
    writer: DocumentWriter,
}

impl<R: PageRenderer> ReservationFlow<R> {
    pub fn new(renderer: Arc<R>, discovery: InvoiceDiscovery, writer: DocumentWriter) -> Self {
        Self {
            renderer,
            discovery,
            writer,
        }
    }

    pub fn renderer(&self) -> &Arc<R> {
        &self.renderer
    }

    pub fn writer(&self) -> &DocumentWriter {
        &self.writer
    }

    /// 下载一个预订的收据和全部发票
    pub async fn run(&self, ctx: &ReservationCtx) -> Result<DownloadedItem, ItemError> {
        let url = ctx.detail_url();
        info!("{} 📄 打开预订详情页: {}", ctx, url);

        let page = self.renderer.open(&url).await?;

        match self.download_documents(&page, ctx).await {
            Ok(item) => match self.renderer.close(&page).await {
                Ok(()) => Ok(item),
                Err(e) => {
                    error!("{} ❌ 关闭页面失败: {}", ctx, e);
                    self.cleanup(&page).await;
                    Err(e.into())
                }
            },
            Err(e) => {
                error!("{} ❌ 处理失败: {}", ctx, e);
                self.cleanup(&page).await;
                Err(e)
            }
        }
    }

    async fn download_documents(
        &self,
        page: &R::Handle,
        ctx: &ReservationCtx,
    ) -> Result<DownloadedItem, ItemError> {
        self.renderer.wait_for_load(page, PAGE_LOAD_TIMEOUT).await?;
        sleep(RECEIPT_SETTLE_DELAY).await;

        // 1. 预订收据
        let receipt = self.renderer.capture(page).await?;
        let receipt_filename = ctx.code.receipt_filename();
        self.writer.save(&receipt_filename, &receipt).await?;
        info!("{} ✓ 已下载: {}", ctx, receipt_filename);

        // 2. 详情页上的发票链接
        let invoice_links = self
            .discovery
            .find_invoice_links(self.renderer.as_ref(), page)
            .await?;
        if invoice_links.is_empty() {
            info!("{} 未找到增值税发票", ctx);
        }

        let mut files = Vec::with_capacity(invoice_links.len() + 1);
        files.push(receipt_filename);

        for (i, invoice_url) in invoice_links.iter().enumerate() {
            info!("{} 🧾 打开发票: {}", ctx, invoice_url);

            self.renderer.navigate(page, invoice_url).await?;
            self.renderer.wait_for_load(page, PAGE_LOAD_TIMEOUT).await?;
            sleep(INVOICE_SETTLE_DELAY).await;

            let invoice = self.renderer.capture(page).await?;
            let invoice_filename = ctx.code.invoice_filename(i, invoice_links.len());
            self.writer.save(&invoice_filename, &invoice).await?;
            info!("{} ✓ 已下载: {}", ctx, invoice_filename);
            files.push(invoice_filename);
        }

        Ok(DownloadedItem {
            files,
            invoice_count: invoice_links.len(),
        })
    }

    /// 尽力清理：解除捕获会话、关闭页面，忽略清理本身的错误
    async fn cleanup(&self, page: &R::Handle) {
        if let Err(e) = self.renderer.detach(page).await {
            debug!("解除捕获会话失败（忽略）: {}", e);
        }
        if let Err(e) = self.renderer.close(page).await {
            debug!("关闭页面失败（忽略）: {}", e);
        }
    }
}
