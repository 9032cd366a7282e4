//! 基础设施层：持有稀缺资源（浏览器页面），只暴露能力

pub mod js_executor;
pub mod page_load;
pub mod renderer;

pub use js_executor::JsExecutor;
pub use page_load::{LoadSlot, PendingLoad};
pub use renderer::{ChromiumPage, ChromiumRenderer, PageRenderer};
