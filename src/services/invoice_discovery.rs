//! 发票发现服务 - 业务能力层
//!
//! 只负责"从已加载的详情页找出发票链接"，不做导航、不做去重

use tracing::debug;

use crate::error::RenderResult;
use crate::infrastructure::PageRenderer;

/// 详情页上指向增值税发票的链接
const INVOICE_LINK_SELECTOR: &str = r#"a[href*="/invoice/"]"#;

/// 发票发现服务
#[derive(Debug, Clone)]
pub struct InvoiceDiscovery {
    selector: String,
}

impl InvoiceDiscovery {
    pub fn new() -> Self {
        Self::with_selector(INVOICE_LINK_SELECTOR)
    }

    /// 使用自定义选择器
    pub fn with_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// 查找当前页面上的发票地址
    ///
    /// 返回 DOM 顺序的绝对地址；重复链接原样保留。
    pub async fn find_invoice_links<R: PageRenderer>(
        &self,
        renderer: &R,
        handle: &R::Handle,
    ) -> RenderResult<Vec<String>> {
        let links = renderer.anchor_hrefs(handle, &self.selector).await?;
        debug!("找到 {} 个发票链接", links.len());
        Ok(links)
    }
}

impl Default for InvoiceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}
