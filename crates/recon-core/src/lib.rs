//! Matching engine for the bank-transaction-to-invoice reconciliation
//! pipeline: name normalization (C1), similarity scoring (C2), the matcher
//! (C3), and the invoice cache (C4). Pure and synchronous — no I/O, no
//! async runtime dependency. Callers (`recon-worker`) own persistence.

pub mod cache;
pub mod config;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod similarity;

pub use cache::InvoiceCache;
pub use config::MatcherConfig;
pub use matcher::match_row;
pub use model::{
    AmbiguityDetail, AmountDetail, Bucket, DateDetail, Invoice, InvoiceCandidate, InvoiceId,
    InvoiceStatus, MatchDecision, MatchDetails, NameDetail, TopCandidate, TransactionRow,
};
