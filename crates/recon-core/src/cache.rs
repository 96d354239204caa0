//! Invoice cache (C4): a one-time, eagerly materialized, amount-indexed view
//! of eligible invoices, plus the in-process reservation set for a batch.

use std::collections::{HashMap, HashSet};

use crate::model::{Invoice, InvoiceCandidate, InvoiceId};

/// Read-only after construction, except for `reserved`, which tracks
/// invoices already assigned to a row earlier in the same batch.
pub struct InvoiceCache {
    by_amount: HashMap<String, Vec<InvoiceCandidate>>,
    by_id: HashMap<InvoiceId, InvoiceCandidate>,
    reserved: HashSet<InvoiceId>,
}

impl InvoiceCache {
    /// Builds the cache from a full invoice list, keeping only eligible
    /// invoices and sorting each amount bucket by `(due_date, id)` ascending.
    pub fn build(invoices: &[Invoice]) -> Self {
        let mut by_amount: HashMap<String, Vec<InvoiceCandidate>> = HashMap::new();
        let mut by_id = HashMap::new();

        for invoice in invoices.iter().filter(|inv| inv.is_eligible()) {
            let candidate = InvoiceCandidate::from(invoice);
            by_id.insert(candidate.id, candidate.clone());
            by_amount.entry(invoice.amount.clone()).or_default().push(candidate);
        }

        for bucket in by_amount.values_mut() {
            bucket.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        }

        tracing::debug!(eligible = by_id.len(), amount_buckets = by_amount.len(), "invoice cache built");

        Self {
            by_amount,
            by_id,
            reserved: HashSet::new(),
        }
    }

    /// Candidates for `amount`, excluding already-reserved invoices, in
    /// canonical `(due_date, id)` order.
    pub fn candidates_for(&self, amount: &str) -> Vec<InvoiceCandidate> {
        self.by_amount
            .get(amount)
            .into_iter()
            .flatten()
            .filter(|c| !self.reserved.contains(&c.id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &InvoiceId) -> Option<&InvoiceCandidate> {
        self.by_id.get(id)
    }

    /// Removes `invoice_id` from future candidate lists within this batch.
    /// Idempotent; reserving an already-reserved id is a no-op.
    pub fn reserve(&mut self, invoice_id: InvoiceId) {
        self.reserved.insert(invoice_id);
    }

    pub fn is_reserved(&self, invoice_id: &InvoiceId) -> bool {
        self.reserved.contains(invoice_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceStatus;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn invoice(name: &str, amount: &str, due: &str, status: InvoiceStatus, paid: bool) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-{name}"),
            customer_name: name.to_string(),
            amount: amount.to_string(),
            due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
            status,
            paid_at: if paid { Some(chrono::Utc::now()) } else { None },
        }
    }

    #[test]
    fn excludes_ineligible_invoices() {
        let invoices = vec![
            invoice("Paid Co", "10.00", "2024-01-01", InvoiceStatus::Sent, true),
            invoice("Draft Co", "10.00", "2024-01-01", InvoiceStatus::Draft, false),
            invoice("Eligible Co", "10.00", "2024-01-01", InvoiceStatus::Overdue, false),
        ];
        let cache = InvoiceCache::build(&invoices);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.candidates_for("10.00").len(), 1);
    }

    #[test]
    fn sorts_bucket_by_due_date_then_id() {
        let invoices = vec![
            invoice("Later", "10.00", "2024-03-01", InvoiceStatus::Sent, false),
            invoice("Earlier", "10.00", "2024-01-01", InvoiceStatus::Sent, false),
        ];
        let cache = InvoiceCache::build(&invoices);
        let candidates = cache.candidates_for("10.00");
        assert_eq!(candidates[0].invoice_number, "INV-Earlier");
        assert_eq!(candidates[1].invoice_number, "INV-Later");
    }

    #[test]
    fn reservation_excludes_from_future_lookups() {
        let invoices = vec![invoice("Only", "10.00", "2024-01-01", InvoiceStatus::Sent, false)];
        let mut cache = InvoiceCache::build(&invoices);
        let id = cache.candidates_for("10.00")[0].id;
        cache.reserve(id);
        assert!(cache.candidates_for("10.00").is_empty());
        assert!(cache.is_reserved(&id));
    }
}
