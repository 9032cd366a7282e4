pub mod credit;
pub mod reservation;

pub use credit::{CreditAccount, CreditBalance, UsageRecord, FREE_CREDITS};
pub use reservation::{
    BatchOutcome, BatchRequest, BatchSummary, DownloadedItem, ItemResult, ReservationCode,
    MAX_BATCH_SIZE,
};
