//! Matcher calibration. See `MatcherConfig::default` for the chosen calibration
//! (documented in DESIGN.md — the source's two historical calibrations are
//! not both implemented; this one matches the configuration defaults).

/// Tunable parameters for the matching algorithm (C3). All fields correspond
/// to the `T_AUTO` / `T_REVIEW` / `AMBIG_A` / `AMBIG_P` environment knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    /// Score (0..100) at or above which a decision is `auto_matched`.
    pub t_auto: f64,
    /// Score (0..100) at or above which a decision is `needs_review`.
    pub t_review: f64,
    /// Ambiguity penalty shape: `penalty = max(0, (candidate_count - a) * p)`.
    pub ambig_a: u32,
    pub ambig_p: f64,
    /// Name-similarity ceiling applied when the extracted name is "weak"
    /// (fewer than `weak_len_threshold` characters after normalization).
    pub weak_name_cap: f64,
    pub weak_len_threshold: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            t_auto: 95.0,
            t_review: 60.0,
            ambig_a: 2,
            ambig_p: 2.0,
            weak_name_cap: 50.0,
            weak_len_threshold: 3,
        }
    }
}

impl MatcherConfig {
    /// Reads overrides from the process environment, falling back to
    /// `Default::default()` for any variable that is absent or unparsable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            t_auto: env_f64("T_AUTO", d.t_auto),
            t_review: env_f64("T_REVIEW", d.t_review),
            ambig_a: env_u32("AMBIG_A", d.ambig_a),
            ambig_p: env_f64("AMBIG_P", d.ambig_p),
            weak_name_cap: d.weak_name_cap,
            weak_len_threshold: d.weak_len_threshold,
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
