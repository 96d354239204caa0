//! Similarity scorer (C2): Jaro-Winkler, token-sorted Jaro-Winkler, and
//! greedy token overlap, combined by taking the maximum. Inputs are expected
//! to already be normalized (uppercase) by [`crate::normalize`].

/// Score two normalized strings on a 0..100 scale using the best of three
/// measures. Equal strings short-circuit to 100; either side empty → 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.eq_ignore_ascii_case(b) {
        return 100.0;
    }

    let direct = jaro_winkler_100(a, b);
    let sorted = token_sort_jaro_winkler(a, b);
    let overlap = token_overlap(a, b);

    direct.max(sorted).max(overlap)
}

fn jaro_winkler_100(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b) * 100.0
}

fn token_sort_jaro_winkler(a: &str, b: &str) -> f64 {
    jaro_winkler_100(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Greedy token-to-token matching: each token of `a` is matched against the
/// best unused token of `b`, scored by [`token_pair_score`]. The result is
/// the sum of per-token best scores divided by the larger token count, with
/// a floor of 90 when every token on the shorter side matched exactly.
fn token_overlap(a: &str, b: &str) -> f64 {
    let a_tokens: Vec<&str> = a.split_whitespace().collect();
    let b_tokens: Vec<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let mut b_used = vec![false; b_tokens.len()];
    let mut b_exact = vec![false; b_tokens.len()];
    let mut a_exact = vec![false; a_tokens.len()];
    let mut sum = 0.0f64;

    for (ai, &at) in a_tokens.iter().enumerate() {
        let mut best_score = 0.0f64;
        let mut best_bi: Option<usize> = None;
        let mut best_exact = false;

        for (bi, &bt) in b_tokens.iter().enumerate() {
            if b_used[bi] {
                continue;
            }
            let exact = at.eq_ignore_ascii_case(bt);
            let score = token_pair_score(at, bt);
            if score > best_score {
                best_score = score;
                best_bi = Some(bi);
                best_exact = exact;
            }
        }

        if let Some(bi) = best_bi {
            if best_score > 0.0 {
                b_used[bi] = true;
                if best_exact {
                    b_exact[bi] = true;
                    a_exact[ai] = true;
                }
            }
        }
        sum += best_score;
    }

    let denom = a_tokens.len().max(b_tokens.len()) as f64;
    let mut result = sum / denom;

    let shorter_all_exact = if a_tokens.len() <= b_tokens.len() {
        a_exact.iter().all(|&e| e)
    } else {
        b_exact.iter().all(|&e| e)
    };
    if shorter_all_exact {
        result = result.max(90.0);
    }
    result
}

/// Scores a single token pair: exact match → 100, a single-letter initial
/// matching the other token's first letter → 90, otherwise Jaro-Winkler if
/// it clears 80, otherwise 0 (no credit).
fn token_pair_score(a: &str, b: &str) -> f64 {
    if a.eq_ignore_ascii_case(b) {
        return 100.0;
    }
    if is_initial_of(a, b) || is_initial_of(b, a) {
        return 90.0;
    }
    let jw = jaro_winkler_100(a, b);
    if jw >= 80.0 {
        jw
    } else {
        0.0
    }
}

fn is_initial_of(short: &str, long: &str) -> bool {
    let mut chars = short.chars();
    let (Some(only), None) = (chars.next(), chars.next()) else {
        return false;
    };
    long.chars()
        .next()
        .map(|c| c.eq_ignore_ascii_case(&only))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equal_strings_are_100() {
        assert_eq!(similarity("SARAH ADAMS", "SARAH ADAMS"), 100.0);
    }

    #[test]
    fn empty_side_is_zero() {
        assert_eq!(similarity("", "SARAH ADAMS"), 0.0);
        assert_eq!(similarity("SARAH ADAMS", ""), 0.0);
    }

    #[test]
    fn reordered_tokens_score_100_via_token_sort() {
        assert_eq!(similarity("ADAMS SARAH", "SARAH ADAMS"), 100.0);
    }

    #[test]
    fn initial_plus_surname_scores_high_via_overlap() {
        let score = similarity("S ADAMS", "SARAH ADAMS");
        assert!(score >= 90.0, "expected >=90, got {score}");
    }

    #[test]
    fn unrelated_names_score_low() {
        let score = similarity("JOHN SMITH", "JANE DOE");
        assert!(score < 60.0, "expected low score, got {score}");
    }
}
