const DEFAULT_MAX_PATHS: usize = 10_000;
const DEFAULT_MAX_STEPS: usize = 1_000_000;
const DEFAULT_GAIN_DIGITS: usize = 2;
const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings for a highlight session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Stop enumerating after this many source-to-target paths.
    pub max_paths: usize,
    /// Stop enumerating after examining this many edges.
    pub max_steps: usize,
    /// Fractional mantissa digits in the dominant/weak summary strings.
    pub gain_digits: usize,
    /// `tracing` filter directive used by the binary.
    pub log_filter: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            max_paths: DEFAULT_MAX_PATHS,
            max_steps: DEFAULT_MAX_STEPS,
            gain_digits: DEFAULT_GAIN_DIGITS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HighlightConfig {
    /// Read settings from `SFG_MAX_PATHS`, `SFG_MAX_STEPS`, `SFG_GAIN_DIGITS`
    /// and `SFG_LOG`.
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_paths = lookup("SFG_MAX_PATHS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAX_PATHS);

        let max_steps = lookup("SFG_MAX_STEPS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAX_STEPS);

        let gain_digits = lookup("SFG_GAIN_DIGITS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_GAIN_DIGITS);

        let log_filter = lookup("SFG_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            max_paths,
            max_steps,
            gain_digits,
            log_filter,
        }
    }
}
