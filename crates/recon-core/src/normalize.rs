//! Name normalizer (C1): deterministic canonicalization of customer names
//! and bank-row descriptions.

/// Tokens a bank description might contain that carry no customer-identity
/// signal. Dropped during description normalization only.
const NOISE_TOKENS: &[&str] = &[
    "CHK", "DEP", "PMT", "PAYMENT", "ONLINE", "TRANSFER", "ACH", "DEPOSIT", "WIRE", "CHECK",
    "REF", "REFERENCE", "MISC", "DEBIT", "CREDIT", "TXN", "TRANSACTION", "FEE", "CHARGE", "FROM",
    "TO", "VIA", "ATM", "POS", "MOBILE", "WEB", "EXTERNAL", "INTERNAL", "INCOMING", "OUTGOING",
    "COUNTER", "VENDOR", "REBATE", "UNKNOWN", "BANK", "CASH", "PURCHASE",
];

fn is_noise_token(token: &str) -> bool {
    NOISE_TOKENS.contains(&token)
}

/// Upper-cases, turns `,`/`.`/`-` into spaces, and collapses whitespace runs.
/// Shared by both normalization flavors below.
fn base_normalize(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| match c {
            ',' | '.' | '-' => ' ',
            other => other,
        })
        .collect();
    replaced
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes an invoice customer name. Only the stated substitutions apply;
/// digits and other punctuation survive untouched.
pub fn normalize_customer_name(input: &str) -> String {
    base_normalize(input)
}

/// Normalizes a bank description: base normalization, then alpha-only
/// cleansing, then the noise-token filter, then the single-letter-token
/// retention rule. Empty or all-noise input normalizes to the empty string.
pub fn normalize_description(input: &str) -> String {
    let base = base_normalize(input);
    let alpha_only: String = base
        .chars()
        .map(|c| if c.is_ascii_alphabetic() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let tokens: Vec<&str> = alpha_only.split_whitespace().collect();
    let kept: Vec<&str> = tokens
        .into_iter()
        .filter(|t| !is_noise_token(t))
        .collect();

    let has_longer = kept.iter().any(|t| t.chars().count() > 1);
    let final_tokens: Vec<&str> = kept
        .into_iter()
        .filter(|t| t.chars().count() > 1 || has_longer)
        .collect();

    final_tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn customer_name_substitutions_only() {
        assert_eq!(normalize_customer_name("Sarah Adams"), "SARAH ADAMS");
        assert_eq!(normalize_customer_name("O'Brien, Liam-Jones"), "O'BRIEN LIAM JONES");
    }

    #[test]
    fn description_strips_digits_and_noise() {
        assert_eq!(normalize_description("DEPOSIT S ADAMS"), "S ADAMS");
        assert_eq!(normalize_description("ACH PAYMENT 4821 JOHN SMITH"), "JOHN SMITH");
    }

    #[test]
    fn description_keeps_initial_with_longer_token() {
        assert_eq!(normalize_description("S ADAMS"), "S ADAMS");
    }

    #[test]
    fn description_drops_lone_initial_with_no_longer_token() {
        assert_eq!(normalize_description("S"), "");
    }

    #[test]
    fn all_noise_normalizes_to_empty() {
        assert_eq!(normalize_description("ONLINE TRANSFER PMT"), "");
    }

    #[test]
    fn empty_input_normalizes_to_empty() {
        assert_eq!(normalize_description(""), "");
        assert_eq!(normalize_customer_name(""), "");
    }
}
