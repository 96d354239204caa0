//! End-to-end coverage of the spec's worked scenarios over the in-memory
//! matching path (no database): C4 cache → matcher, exercised the way
//! `pipeline::process_job` drives them.

use recon_core::{Bucket, InvoiceCache, MatcherConfig};
use recon_testsupport::InvoiceBuilder;

fn extract_amount_candidates(cache: &InvoiceCache, amount: &str) -> Vec<recon_core::InvoiceCandidate> {
    cache.candidates_for(amount)
}

#[test]
fn scenario_3_bank_noise_and_initial() {
    let invoice = InvoiceBuilder::new("Sarah Adams", "1250.00", "2024-12-10").build();
    let cache = InvoiceCache::build(&[invoice]);
    let candidates = extract_amount_candidates(&cache, "1250.00");

    let decision = recon_core::match_row(
        "DEPOSIT S ADAMS",
        "1250.00",
        chrono::NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        &candidates,
        &MatcherConfig::default(),
    );

    assert!(matches!(decision.status, Bucket::AutoMatched | Bucket::NeedsReview));
    assert!(decision.invoice_id.is_some());
}

#[test]
fn reservation_prevents_double_assignment_within_a_batch() {
    let invoice = InvoiceBuilder::new("John Smith", "450.00", "2024-12-10").build();
    let invoice_id = invoice.id;
    let mut cache = InvoiceCache::build(&[invoice]);

    let candidates = extract_amount_candidates(&cache, "450.00");
    let first = recon_core::match_row(
        "JOHN SMITH",
        "450.00",
        chrono::NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        &candidates,
        &MatcherConfig::default(),
    );
    assert_eq!(first.invoice_id, Some(invoice_id));
    cache.reserve(invoice_id);

    let second_candidates = extract_amount_candidates(&cache, "450.00");
    assert!(second_candidates.is_empty());
    let second = recon_core::match_row(
        "JOHN SMITH",
        "450.00",
        chrono::NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        &second_candidates,
        &MatcherConfig::default(),
    );
    assert_eq!(second.status, Bucket::Unmatched);
}

#[test]
fn eligibility_excludes_paid_invoices_from_candidates() {
    let invoice = InvoiceBuilder::new("Paid Customer", "75.00", "2024-12-01").paid().build();
    let cache = InvoiceCache::build(&[invoice]);
    assert!(extract_amount_candidates(&cache, "75.00").is_empty());
}
