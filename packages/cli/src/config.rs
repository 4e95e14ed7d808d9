//! CLI configuration, populated from environment variables.

use std::path::PathBuf;

/// Filter used when neither `SGRAPH_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "semantic_graphs=warn,sgraph=info";

/// Runtime configuration for `sgraph`.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SGRAPH_SCHEMA_DIR` | (absent) | Directory of schema JSON files preloaded into the registries |
/// | `SGRAPH_LOG` | `RUST_LOG`, then `semantic_graphs=warn,sgraph=info` | tracing filter directives |
/// | `SGRAPH_FIXED_CLOCK_MS` | (absent = wall clock) | Fixed `generated_at` for projections |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory scanned for `*.json` taxonomies, ontologies and rule sets.
    pub schema_dir: Option<PathBuf>,

    /// tracing filter directives.
    pub log_filter: String,

    /// Epoch milliseconds stamped on projections instead of the current time.
    pub fixed_clock_ms: Option<i64>,
}

impl CliConfig {
    /// Populate config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Populate config from `lookup`, applying defaults where absent.
    /// An unparseable `SGRAPH_FIXED_CLOCK_MS` is ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_filter = lookup("SGRAPH_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        let fixed_clock_ms = lookup("SGRAPH_FIXED_CLOCK_MS").and_then(|v| v.trim().parse::<i64>().ok());

        Self {
            schema_dir: lookup("SGRAPH_SCHEMA_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            log_filter,
            fixed_clock_ms,
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.schema_dir, None);
        assert_eq!(c.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(c.fixed_clock_ms, None);
    }

    #[test]
    fn sgraph_log_wins_over_rust_log() {
        let c = config(&[("RUST_LOG", "debug"), ("SGRAPH_LOG", "sgraph=trace")]);
        assert_eq!(c.log_filter, "sgraph=trace");
        let c = config(&[("RUST_LOG", "debug")]);
        assert_eq!(c.log_filter, "debug");
    }

    #[test]
    fn schema_dir_and_clock() {
        let c = config(&[("SGRAPH_SCHEMA_DIR", "/srv/schemas"), ("SGRAPH_FIXED_CLOCK_MS", "1700000000000")]);
        assert_eq!(c.schema_dir, Some(PathBuf::from("/srv/schemas")));
        assert_eq!(c.fixed_clock_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn bad_clock_is_ignored() {
        assert_eq!(config(&[("SGRAPH_FIXED_CLOCK_MS", "soon")]).fixed_clock_ms, None);
    }
}
