pub mod credit_ledger;
pub mod document_writer;
pub mod invoice_discovery;
pub mod key_store;
pub mod ledger_http;
pub mod ledger_memory;

pub use credit_ledger::{CreditClient, CreditLedger, Preflight};
pub use document_writer::DocumentWriter;
pub use invoice_discovery::InvoiceDiscovery;
pub use key_store::{normalize_license_key, FileKeyStore, KeyStore, MemoryKeyStore};
pub use ledger_http::HttpLedger;
pub use ledger_memory::InMemoryLedger;
