//! Shared domain types for the matching engine: invoices, candidates, match
//! decisions, and the versioned `match_details` record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InvoiceId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

/// An invoice as read from storage, before it is indexed into the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub customer_name: String,
    /// Canonical two-digit decimal string, e.g. `"1250.00"`.
    pub amount: String,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Invoice {
    /// Eligibility for matching: `status ∈ {sent, overdue}` AND `paid_at` absent.
    pub fn is_eligible(&self) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::Overdue) && self.paid_at.is_none()
    }
}

/// A cached, pre-normalized invoice available as a match candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceCandidate {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub normalized_name: String,
    pub amount: String,
    pub due_date: NaiveDate,
}

impl From<&Invoice> for InvoiceCandidate {
    fn from(inv: &Invoice) -> Self {
        InvoiceCandidate {
            id: inv.id,
            invoice_number: inv.invoice_number.clone(),
            normalized_name: crate::normalize::normalize_customer_name(&inv.customer_name),
            amount: inv.amount.clone(),
            due_date: inv.due_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    AutoMatched,
    NeedsReview,
    Unmatched,
}

/// Output of the matcher (C3) for a single transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDecision {
    pub invoice_id: Option<InvoiceId>,
    /// 0..100, two fractional digits of precision.
    pub confidence: f64,
    pub status: Bucket,
    pub details: MatchDetails,
}

/// Versioned, typed `match_details` record. Serializes to the exact §6
/// schema via `#[serde(tag = "version")]`-equivalent manual shaping (the
/// `version` field is a plain `"v1"` literal rather than an enum tag because
/// there is, at present, only one schema version).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetails {
    pub version: &'static str,
    pub amount: AmountDetail,
    pub name: NameDetail,
    pub date: DateDetail,
    pub ambiguity: AmbiguityDetail,
    #[serde(rename = "finalScore")]
    pub final_score: f64,
    pub bucket: Bucket,
    #[serde(rename = "topCandidates")]
    pub top_candidates: Vec<TopCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountDetail {
    pub transaction: String,
    pub invoice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameDetail {
    pub extracted: String,
    #[serde(rename = "invoiceName")]
    pub invoice_name: Option<String>,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateDetail {
    #[serde(rename = "transactionDate")]
    pub transaction_date: NaiveDate,
    #[serde(rename = "invoiceDueDate")]
    pub invoice_due_date: Option<NaiveDate>,
    #[serde(rename = "deltaDays")]
    pub delta_days: i64,
    pub adjustment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguityDetail {
    #[serde(rename = "candidateCount")]
    pub candidate_count: usize,
    pub penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCandidate {
    #[serde(rename = "invoiceId")]
    pub invoice_id: InvoiceId,
    #[serde(rename = "invoiceNumber")]
    pub invoice_number: String,
    pub score: f64,
    #[serde(rename = "nameScore")]
    pub name_score: f64,
    #[serde(rename = "deltaDays")]
    pub delta_days: i64,
}

/// A row produced by the CSV ingester (C5), prior to matching.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: String,
    pub reference_number: Option<String>,
}
