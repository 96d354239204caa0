//! Matcher (C3): scores same-amount candidates against a transaction row and
//! derives a deterministic `MatchDecision`.

use chrono::NaiveDate;

use crate::config::MatcherConfig;
use crate::model::{
    AmbiguityDetail, AmountDetail, Bucket, DateDetail, InvoiceCandidate, MatchDecision,
    MatchDetails, NameDetail, TopCandidate,
};
use crate::normalize::normalize_description;
use crate::similarity::similarity;

struct Scored<'a> {
    candidate: &'a InvoiceCandidate,
    name_score: f64,
    date_delta: i64,
    date_adj: f64,
    penalty: f64,
    final_score: f64,
}

/// Runs the matcher for one transaction row against its candidate pool.
/// `candidates` must already be amount-filtered and reservation-filtered by
/// the caller (the worker loop, consulting the invoice cache).
pub fn match_row(
    description: &str,
    amount: &str,
    transaction_date: NaiveDate,
    candidates: &[InvoiceCandidate],
    config: &MatcherConfig,
) -> MatchDecision {
    let extracted = normalize_description(description);

    if candidates.is_empty() {
        return MatchDecision {
            invoice_id: None,
            confidence: 0.0,
            status: Bucket::Unmatched,
            details: MatchDetails {
                version: "v1",
                amount: AmountDetail {
                    transaction: amount.to_string(),
                    invoice: None,
                },
                name: NameDetail {
                    extracted,
                    invoice_name: None,
                    similarity: 0.0,
                },
                date: DateDetail {
                    transaction_date,
                    invoice_due_date: None,
                    delta_days: 0,
                    adjustment: 0.0,
                },
                ambiguity: AmbiguityDetail {
                    candidate_count: 0,
                    penalty: 0.0,
                },
                final_score: 0.0,
                bucket: Bucket::Unmatched,
                top_candidates: Vec::new(),
                reason: Some("no_invoice_with_matching_amount".to_string()),
            },
        };
    }

    let weak = extracted.chars().count() < config.weak_len_threshold;
    let penalty = ambiguity_penalty(candidates.len(), config);

    let mut scored: Vec<Scored> = candidates
        .iter()
        .map(|candidate| {
            let mut name_score = similarity(&extracted, &candidate.normalized_name);
            if weak {
                name_score = name_score.min(config.weak_name_cap);
            }
            let date_delta = (transaction_date - candidate.due_date).num_days();
            let date_adj = date_adjustment(date_delta);
            let raw = name_score + date_adj - penalty;
            let final_score = round2(raw.clamp(0.0, 100.0));
            Scored {
                candidate,
                name_score,
                date_delta,
                date_adj,
                penalty,
                final_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        basis_points(b.final_score)
            .cmp(&basis_points(a.final_score))
            .then(a.date_delta.abs().cmp(&b.date_delta.abs()))
            .then(a.candidate.due_date.cmp(&b.candidate.due_date))
            .then(a.candidate.id.to_string().cmp(&b.candidate.id.to_string()))
    });

    let best = &scored[0];

    let best_bp = basis_points(best.final_score);
    let mut status = if best_bp >= basis_points(config.t_auto) {
        Bucket::AutoMatched
    } else if best_bp >= basis_points(config.t_review) {
        Bucket::NeedsReview
    } else {
        Bucket::Unmatched
    };

    if candidates.len() > 1 && weak && status == Bucket::AutoMatched {
        status = Bucket::NeedsReview;
    }

    let invoice_id = match status {
        Bucket::Unmatched => None,
        _ => Some(best.candidate.id),
    };

    let top_candidates = scored
        .iter()
        .take(3)
        .map(|s| TopCandidate {
            invoice_id: s.candidate.id,
            invoice_number: s.candidate.invoice_number.clone(),
            score: s.final_score,
            name_score: s.name_score,
            delta_days: s.date_delta,
        })
        .collect();

    tracing::debug!(
        candidate_count = candidates.len(),
        final_score = best.final_score,
        status = ?status,
        "matched transaction row"
    );

    MatchDecision {
        invoice_id,
        confidence: best.final_score,
        status,
        details: MatchDetails {
            version: "v1",
            amount: AmountDetail {
                transaction: amount.to_string(),
                invoice: Some(best.candidate.amount.clone()),
            },
            name: NameDetail {
                extracted,
                invoice_name: Some(best.candidate.normalized_name.clone()),
                similarity: best.name_score,
            },
            date: DateDetail {
                transaction_date,
                invoice_due_date: Some(best.candidate.due_date),
                delta_days: best.date_delta,
                adjustment: best.date_adj,
            },
            ambiguity: AmbiguityDetail {
                candidate_count: candidates.len(),
                penalty: best.penalty,
            },
            final_score: best.final_score,
            bucket: status,
            top_candidates,
            reason: None,
        },
    }
}

fn ambiguity_penalty(candidate_count: usize, config: &MatcherConfig) -> f64 {
    let excess = candidate_count as i64 - config.ambig_a as i64;
    if excess <= 0 {
        0.0
    } else {
        excess as f64 * config.ambig_p
    }
}

fn date_adjustment(delta_days: i64) -> f64 {
    if delta_days < 0 {
        5.0
    } else if delta_days <= 7 {
        2.0
    } else if delta_days <= 30 {
        0.0
    } else {
        -10.0
    }
}

/// Rounds half-away-from-zero to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Converts a score to integer basis points for comparison; never compare
/// raw floats for ordering (see SPEC_FULL §9 / spec.md §9).
fn basis_points(score: f64) -> i64 {
    (score * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceCandidate;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn candidate(id: Uuid, number: &str, name: &str, due: &str, amount: &str) -> InvoiceCandidate {
        InvoiceCandidate {
            id,
            invoice_number: number.to_string(),
            normalized_name: crate::normalize::normalize_customer_name(name),
            amount: amount.to_string(),
            due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn scenario_1_exact_match_single_candidate() {
        let i1 = Uuid::new_v4();
        let candidates = vec![candidate(i1, "INV-1", "Sarah Adams", "2024-12-10", "1250.00")];
        let decision = match_row(
            "SARAH ADAMS",
            "1250.00",
            date("2024-12-10"),
            &candidates,
            &MatcherConfig::default(),
        );
        assert_eq!(decision.confidence, 100.00);
        assert_eq!(decision.status, Bucket::AutoMatched);
        assert_eq!(decision.invoice_id, Some(i1));
        assert_eq!(decision.details.date.delta_days, 0);
        assert_eq!(decision.details.date.adjustment, 2.0);
    }

    #[test]
    fn scenario_2_reordered_name() {
        let i1 = Uuid::new_v4();
        let candidates = vec![candidate(i1, "INV-1", "Sarah Adams", "2024-12-10", "1250.00")];
        let decision = match_row(
            "ADAMS SARAH",
            "1250.00",
            date("2024-12-08"),
            &candidates,
            &MatcherConfig::default(),
        );
        assert_eq!(decision.confidence, 100.00);
        assert_eq!(decision.status, Bucket::AutoMatched);
        assert_eq!(decision.details.date.delta_days, -2);
        assert_eq!(decision.details.date.adjustment, 5.0);
    }

    #[test]
    fn scenario_4_ambiguous_pair_is_deterministic() {
        let i1 = Uuid::new_v4();
        let i2 = Uuid::new_v4();
        let candidates = vec![
            candidate(i1, "INV-1", "John Smith", "2024-12-10", "450.00"),
            candidate(i2, "INV-2", "Jane Smith", "2024-12-10", "450.00"),
        ];
        let config = MatcherConfig::default();
        let first = match_row("JOHN SMITH", "450.00", date("2024-12-10"), &candidates, &config);
        for _ in 0..100 {
            let repeat = match_row("JOHN SMITH", "450.00", date("2024-12-10"), &candidates, &config);
            assert_eq!(repeat.invoice_id, first.invoice_id);
            assert_eq!(repeat.confidence, first.confidence);
            assert_eq!(repeat.status, first.status);
        }
        assert_eq!(first.invoice_id, Some(i1));
    }

    #[test]
    fn scenario_5_no_candidates() {
        let decision = match_row("ANYONE", "77.77", date("2024-12-10"), &[], &MatcherConfig::default());
        assert_eq!(decision.status, Bucket::Unmatched);
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.invoice_id, None);
        assert_eq!(
            decision.details.reason.as_deref(),
            Some("no_invoice_with_matching_amount")
        );
    }

    #[test]
    fn scenario_6_late_payment_demotes_to_review() {
        let i1 = Uuid::new_v4();
        let candidates = vec![candidate(i1, "INV-1", "Jones", "2024-10-01", "99.00")];
        let decision = match_row("JONES", "99.00", date("2024-11-05"), &candidates, &MatcherConfig::default());
        assert_eq!(decision.details.date.delta_days, 35);
        assert_eq!(decision.details.date.adjustment, -10.0);
    }

    #[test]
    fn weak_extracted_name_caps_and_demotes_when_ambiguous() {
        let i1 = Uuid::new_v4();
        let i2 = Uuid::new_v4();
        let candidates = vec![
            candidate(i1, "INV-1", "A", "2024-12-10", "10.00"),
            candidate(i2, "INV-2", "B", "2024-12-10", "10.00"),
        ];
        let decision = match_row("A", "10.00", date("2024-12-10"), &candidates, &MatcherConfig::default());
        assert!(decision.confidence <= 50.0);
        assert_ne!(decision.status, Bucket::AutoMatched);
    }

    #[test]
    fn tie_break_prefers_smaller_date_delta_then_due_date_then_id() {
        let i1 = Uuid::new_v4();
        let i2 = Uuid::new_v4();
        let candidates = vec![
            candidate(i1, "INV-1", "Acme Corp", "2024-12-01", "500.00"),
            candidate(i2, "INV-2", "Acme Corp", "2024-12-05", "500.00"),
        ];
        let decision = match_row("ACME CORP", "500.00", date("2024-12-05"), &candidates, &MatcherConfig::default());
        assert_eq!(decision.invoice_id, Some(i2));
    }
}
