//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量预订处理器
//! - 串行遍历预订（Vec<ReservationCode>）
//! - 取消检查、重试、扣费、间隔等待
//! - 汇总批次结果
//!
//! ### `controller` - 命令入口
//! - `start_single` / `start_batch` / `abort`
//! - 管理每个批次的取消令牌
//!
//! ### `events` - 批次事件
//! - progress / creditUpdate / batchComplete
//!
//! ## 层次关系
//!
//! ```text
//! controller (命令)
//!     ↓
//! batch_processor (处理 Vec<ReservationCode>)
//!     ↓
//! workflow::ReservationFlow (处理单个预订)
//!     ↓
//! services (能力层：discovery / writer / credits)
//!     ↓
//! infrastructure (基础设施：PageRenderer)
//! ```

pub mod batch_processor;
pub mod controller;
pub mod events;

pub use batch_processor::{BatchProcessor, DELAY_BETWEEN_RESERVATIONS};
pub use controller::{AbortAck, Controller};
pub use events::{BatchEvent, Delivery, EventSink, ProgressStatus};
