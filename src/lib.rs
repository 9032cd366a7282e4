//! # BnB Invoice Batch
//!
//! 把一组预订确认码批量下载为 PDF（预订收据 + 增值税发票），
//! 每成功一个预订扣除一个预付额度。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器页面），只暴露能力
//! - `PageRenderer` - 打开 / 导航 / 等待加载 / 打印 PDF / 关闭
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个预订
//! - `InvoiceDiscovery` - 查找发票链接
//! - `DocumentWriter` - 写 PDF
//! - `CreditClient` - 扣除 / 查询额度
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个预订"的完整下载流程
//! - `ReservationCtx` - 上下文封装（确认码 + 域名 + 序号）
//! - `ReservationFlow` - 流程编排（收据 → 发票 → 关闭）
//! - `RetryPolicy` - 失败后整体重试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器：取消、扣费、进度
//! - `orchestrator/controller` - 命令入口
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ItemError, LedgerError, RenderError};
pub use infrastructure::{ChromiumRenderer, PageRenderer};
pub use models::{BatchOutcome, BatchRequest, BatchSummary, ItemResult, ReservationCode};
pub use orchestrator::{BatchEvent, BatchProcessor, Controller, EventSink, ProgressStatus};
pub use services::{CreditClient, CreditLedger, HttpLedger, InMemoryLedger};
pub use workflow::{ReservationCtx, ReservationFlow, RetryPolicy};
