//! Coordinator configuration.

use std::time::Duration;

use serde::Deserialize;

use super::entry::StaleAfter;

/// Tuning for the query coordinator.
///
/// By default cached results never expire on their own; staleness is
/// driven by mutation invalidation. Set `default_stale_after_ms` to add a
/// time-based freshness window on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Freshness window applied to reads that do not override it.
    /// Absent means entries stay fresh until invalidated.
    pub default_stale_after_ms: Option<u64>,
    /// Emit an info event per fetch (in addition to debug-level detail).
    pub log_fetches: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_stale_after_ms: None,
            log_fetches: true,
        }
    }
}

impl QueryConfig {
    pub fn default_stale_after(&self) -> StaleAfter {
        match self.default_stale_after_ms {
            Some(ms) => StaleAfter::After(Duration::from_millis(ms)),
            None => StaleAfter::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = QueryConfig::default();
        assert_eq!(config.default_stale_after_ms, None);
        assert!(config.log_fetches);
        assert_eq!(config.default_stale_after(), StaleAfter::Never);
    }

    #[test]
    fn millis_map_to_duration_window() {
        let config = QueryConfig {
            default_stale_after_ms: Some(1500),
            ..Default::default()
        };
        assert_eq!(
            config.default_stale_after(),
            StaleAfter::After(Duration::from_millis(1500))
        );
    }
}
