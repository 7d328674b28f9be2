use crate::config::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for one deduplication call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DedupStats {
    /// Strategy used.
    pub method: Method,

    /// Entities considered (fact endpoints count twice per fact).
    pub entities_in: u64,

    /// Representatives kept.
    pub entities_out: u64,

    /// Entities folded into an earlier representative.
    pub duplicates_merged: u64,

    /// Facts passed through the rewriter. Zero for entity batches.
    pub facts: u64,

    /// Fact endpoints now pointing at a different instance.
    pub endpoints_rewired: u64,

    /// Representative signatures compared against candidates.
    pub comparisons: u64,

    /// Wall time for the call.
    #[serde(with = "duration_serializer")]
    pub duration: Duration,
}

impl DedupStats {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            entities_in: 0,
            entities_out: 0,
            duplicates_merged: 0,
            facts: 0,
            endpoints_rewired: 0,
            comparisons: 0,
            duration: Duration::ZERO,
        }
    }

    /// Ratio of merged entities to entities seen.
    pub fn merge_rate(&self) -> f64 {
        if self.entities_in == 0 {
            0.0
        } else {
            self.duplicates_merged as f64 / self.entities_in as f64
        }
    }

    /// Get a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "{}: {} entities -> {} ({} merged, {:.1}%), {} facts, {} endpoints rewired, \
             {} comparisons in {:?}",
            self.method,
            self.entities_in,
            self.entities_out,
            self.duplicates_merged,
            self.merge_rate() * 100.0,
            self.facts,
            self.endpoints_rewired,
            self.comparisons,
            self.duration
        )
    }
}

// Durations are serialized as whole milliseconds
mod duration_serializer {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut stats = DedupStats::new(Method::ExactMatch);
        stats.entities_in = 4;
        stats.entities_out = 3;
        stats.duplicates_merged = 1;

        let summary = stats.summary();
        assert!(summary.starts_with("exact_match: 4 entities -> 3"));
        assert!(summary.contains("25.0%"));
    }

    #[test]
    fn test_merge_rate_empty() {
        assert_eq!(DedupStats::new(Method::Fuzzy).merge_rate(), 0.0);
    }

    #[test]
    fn test_duration_as_millis() {
        let mut stats = DedupStats::new(Method::Embeddings);
        stats.duration = Duration::from_millis(1500);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["method"], "embeddings");

        let back: DedupStats = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
    }
}
