pub mod reservation_ctx;
pub mod reservation_flow;
pub mod retry;

pub use reservation_ctx::ReservationCtx;
pub use reservation_flow::ReservationFlow;
pub use retry::RetryPolicy;
